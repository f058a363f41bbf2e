//! Frame driver
//!
//! [`Simulation`] owns the scene, the physics world and the input state, and
//! runs one frame at a time in a fixed order:
//!
//! 1. drain queued input events
//! 2. character commands and animation requests
//! 3. platform motion written to kinematic bodies
//! 4. physics step
//! 5. dynamic poses synced back to the scene
//! 6. animation mixer advanced
//! 7. follow camera eased
//!
//! Rendering happens outside, from the scene and camera.

use serde::Serialize;
use skyhop_core::{SceneGraph, Stopwatch};
use skyhop_physics::{sync_all, PhysicsWorld};
use skyhop_platform::{InputEvent, InputQueue, InputSender, InputState};

use crate::camera::FollowCamera;
use crate::character::{CharacterController, ControlOutput};
use crate::config::GameConfig;
use crate::environment::Environment;
use crate::platforms::PlatformDriver;
use crate::GameResult;

/// Frames slower than this are reported on the timing target
const SLOW_FRAME_US: u64 = 16_000;

/// What happened during one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    /// Input events drained
    pub events: usize,
    pub control: ControlOutput,
    /// Platform motion states written
    pub platforms_driven: usize,
    /// Dynamic bodies synced
    pub bodies_synced: usize,
}

/// Pose summary for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterSnapshot {
    pub frame: u64,
    pub position: [f32; 3],
    /// Heading in radians about +Y
    pub yaw: f32,
    pub animation: Option<String>,
}

/// The whole loop
pub struct Simulation {
    config: GameConfig,
    scene: SceneGraph,
    world: PhysicsWorld,
    queue: InputQueue,
    input: InputState,
    environment: Environment,
    platforms: PlatformDriver,
    character: CharacterController,
    camera: FollowCamera,
    frame: u64,
}

impl Simulation {
    /// Build the arena, the character and the camera
    pub fn initialize_world(config: GameConfig) -> GameResult<Self> {
        let mut scene = SceneGraph::new();
        let mut world = PhysicsWorld::initialize(config.physics.clone())?;

        let mut platforms = PlatformDriver::new();
        let environment = Environment::build(&mut scene, &mut world, &mut platforms)?;
        let character = CharacterController::spawn(
            &mut scene,
            &mut world,
            &config.character,
            config.controller.clone(),
        )?;
        let camera = FollowCamera::attach(&mut scene, character.node(), config.camera.clone())?;

        log::info!(
            "Simulation ready: {} nodes, {} bodies",
            scene.node_count(),
            world.body_count()
        );

        Ok(Self {
            input: InputState::new(config.viewport),
            config,
            scene,
            world,
            queue: InputQueue::new(),
            environment,
            platforms,
            character,
            camera,
            frame: 0,
        })
    }

    /// Handle for producers on other threads
    pub fn input_sender(&self) -> InputSender {
        self.queue.sender()
    }

    /// Queue an input event for the next frame
    pub fn push_event(&self, event: InputEvent) {
        self.queue.push(event);
    }

    /// Run one frame. `delta` is the frame time and `elapsed` the time since start, in seconds.
    pub fn step_frame(&mut self, delta: f32, elapsed: f64) -> FrameReport {
        let _span = tracing::trace_span!("step_frame", frame = self.frame).entered();
        let stopwatch = Stopwatch::new();

        let events = self.queue.drain_into(&mut self.input);

        let control = self
            .character
            .update(&mut self.input, &self.scene, &mut self.world)
            .expect("character body is registered with the world");

        let platforms_driven = self.platforms.update(elapsed, &mut self.scene, &mut self.world);

        self.world.step(delta);
        let bodies_synced = sync_all(&self.world, &mut self.scene);

        self.character.animate(delta);
        self.camera.update(&self.scene, self.character.node());

        self.input.end_frame();

        let report = FrameReport {
            frame: self.frame,
            events,
            control,
            platforms_driven,
            bodies_synced,
        };
        self.frame += 1;

        let duration_us = stopwatch.elapsed().as_micros() as u64;
        if duration_us > SLOW_FRAME_US {
            tracing::debug!(
                target: "timing",
                frame = report.frame,
                duration_us,
                "Slow frame"
            );
        }
        log::trace!("Frame {} done: {:?}", report.frame, report);
        report
    }

    /// Current pose of the character
    pub fn snapshot(&self) -> CharacterSnapshot {
        let transform = self
            .scene
            .get_node(self.character.node())
            .map(|node| node.local_transform)
            .unwrap_or_default();
        let (yaw, _, _) = transform.rotation.to_euler(glam::EulerRot::YXZ);

        CharacterSnapshot {
            frame: self.frame,
            position: transform.position.to_array(),
            yaw,
            animation: self.character.animation().current_action().map(str::to_string),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn platforms(&self) -> &PlatformDriver {
        &self.platforms
    }

    pub fn character(&self) -> &CharacterController {
        &self.character
    }

    pub fn camera(&self) -> &FollowCamera {
        &self.camera
    }

    /// Frames stepped so far
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
