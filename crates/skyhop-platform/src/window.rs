//! Window Viewport
//!
//! Tracks the drawable size so pointer coordinates can be normalized.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{PlatformError, PlatformResult};

/// Drawable area of the window, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels
    width: f32,
    /// Height in pixels
    height: f32,
}

impl Viewport {
    /// Create a viewport, rejecting empty or non-finite sizes
    pub fn new(width: f32, height: f32) -> PlatformResult<Self> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(PlatformError::InvalidViewport { width, height });
        }
        Ok(Self { width, height })
    }

    /// Get the width in pixels
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Get the height in pixels
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Aspect ratio (width / height)
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Map client coordinates to [-1, 1]², +Y up.
    ///
    /// The left edge maps to x = -1 and the top edge to y = +1. Points outside
    /// the window are clamped to the square.
    pub fn normalize(&self, client_x: f32, client_y: f32) -> Vec2 {
        let x = (client_x / self.width) * 2.0 - 1.0;
        let y = -(client_y / self.height) * 2.0 + 1.0;
        Vec2::new(x, y).clamp(Vec2::NEG_ONE, Vec2::ONE)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}
