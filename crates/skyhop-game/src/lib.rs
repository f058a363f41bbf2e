//! # Skyhop Game
//!
//! Gameplay layer of the Skyhop loop: a walled arena with moving platforms
//! and a physics-driven character.
//!
//! ## Features
//! - Arena setup (walls, floor, moving platforms)
//! - Kinematic platform driver
//! - Character controller with ground-checked jumping
//! - Follow camera
//! - Frame driver tying input, physics, sync and animation together

pub mod camera;
pub mod character;
pub mod config;
pub mod environment;
pub mod platforms;
pub mod simulation;

pub use camera::FollowCamera;
pub use character::{CharacterController, ControlOutput, JumpOutcome};
pub use config::{CameraConfig, CharacterConfig, ControllerConfig, GameConfig};
pub use environment::Environment;
pub use platforms::{PlatformAxis, PlatformDriver, PlatformState};
pub use simulation::{CharacterSnapshot, FrameReport, Simulation};

use skyhop_core::SceneError;
use skyhop_physics::PhysicsError;
use skyhop_platform::PlatformError;
use thiserror::Error;

/// Game errors
#[derive(Error, Debug)]
pub enum GameError {
    #[error(transparent)]
    Physics(#[from] PhysicsError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;
