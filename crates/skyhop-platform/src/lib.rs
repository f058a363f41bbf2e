//! # Skyhop Platform
//!
//! Platform abstraction layer (HAL) for the Skyhop simulation loop.
//!
//! This crate provides the raw-input side of the frame driver:
//! - **Input**: Keyboard and pointer events folded into an [`InputState`]
//! - **Queue**: Thread-safe event queue drained once per frame
//! - **Window**: Viewport size used to normalize pointer coordinates

pub mod input;
pub mod queue;
pub mod window;

pub use input::{InputEvent, InputState, KeyCode, KeyEdge, MovementKeys};
pub use queue::{InputQueue, InputSender};
pub use window::Viewport;

use thiserror::Error;

/// Platform-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("Invalid viewport size {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;
