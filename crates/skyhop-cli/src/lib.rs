//! # Skyhop CLI
//!
//! Command-line interface for the Skyhop simulation loop.
//!
//! ## Commands
//! - `run` - Step the simulation headlessly, optionally replaying scripted input
//! - `config` - Print the effective configuration as JSON

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use skyhop_core::{DeltaTime, FrameClock};
use skyhop_game::{CharacterSnapshot, GameConfig, JumpOutcome, Simulation};
use skyhop_platform::InputEvent;

/// Skyhop headless runner
#[derive(Parser)]
#[command(name = "skyhop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Step the simulation
    Run {
        /// Number of frames to run
        #[arg(short, long, default_value = "600")]
        frames: u64,

        /// Frame time in seconds
        #[arg(long, default_value = "0.016666668")]
        dt: f32,

        /// JSON list of input events keyed by frame
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Record a character snapshot every N frames (0 = final only)
        #[arg(long, default_value = "60")]
        snapshot_every: u64,

        /// Write the run report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

/// Input event to inject before a given frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    pub frame: u64,
    pub event: InputEvent,
}

/// Options of a headless run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub frames: u64,
    pub dt: f32,
    pub snapshot_every: u64,
}

/// Summary of a headless run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub frames: u64,
    pub simulated_seconds: f64,
    pub jumps_granted: u32,
    pub jumps_denied: u32,
    pub snapshots: Vec<CharacterSnapshot>,
    #[serde(rename = "final")]
    pub final_state: CharacterSnapshot,
}

/// Read a scripted input file, ordered by frame
pub fn load_script(path: &Path) -> Result<Vec<ScriptedEvent>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    let mut script: Vec<ScriptedEvent> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse script {}", path.display()))?;
    script.sort_by_key(|entry| entry.frame);
    Ok(script)
}

/// Run the loop for `options.frames` frames, feeding `script` as it comes due
pub fn run_simulation(config: GameConfig, options: &RunOptions, script: &[ScriptedEvent]) -> Result<RunReport> {
    if !(options.dt.is_finite() && options.dt > 0.0) {
        bail!("Frame time must be positive, got {}", options.dt);
    }

    let mut sim = Simulation::initialize_world(config).context("Failed to initialize world")?;
    let mut clock = FrameClock::new();
    let mut pending = script.iter().peekable();
    let mut report = RunReport {
        frames: 0,
        simulated_seconds: 0.0,
        jumps_granted: 0,
        jumps_denied: 0,
        snapshots: Vec::new(),
        final_state: sim.snapshot(),
    };

    for frame in 0..options.frames {
        while let Some(entry) = pending.next_if(|entry| entry.frame <= frame) {
            sim.push_event(entry.event);
        }

        let (delta, elapsed) = clock.advance(DeltaTime::from_secs(options.dt as f64));
        let frame_report = sim.step_frame(delta.as_secs_f32(), elapsed);
        match frame_report.control.jump {
            Some(JumpOutcome::Granted { surface, distance }) => {
                log::info!("Frame {}: jumped off {} at {:.3}", frame, surface.as_str(), distance);
                report.jumps_granted += 1;
            }
            Some(JumpOutcome::Denied) => report.jumps_denied += 1,
            None => {}
        }

        if options.snapshot_every > 0 && (frame + 1) % options.snapshot_every == 0 {
            let snapshot = sim.snapshot();
            log::debug!(
                "Frame {}: character at {:?}, yaw {:.3}",
                snapshot.frame,
                snapshot.position,
                snapshot.yaw
            );
            report.snapshots.push(snapshot);
        }
    }

    report.frames = options.frames;
    report.simulated_seconds = clock.elapsed();
    report.final_state = sim.snapshot();
    Ok(report)
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    match path {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(GameConfig::default()),
    }
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            frames,
            dt,
            script,
            snapshot_every,
            output,
        } => {
            let script = match script {
                Some(path) => load_script(&path)?,
                None => Vec::new(),
            };
            log::info!("Running {} frames at {}s ({} scripted events)", frames, dt, script.len());

            let options = RunOptions {
                frames,
                dt,
                snapshot_every,
            };
            let report = run_simulation(config, &options, &script)?;
            let json = serde_json::to_string_pretty(&report)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write report {}", path.display()))?;
                    log::info!("Report written to {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
