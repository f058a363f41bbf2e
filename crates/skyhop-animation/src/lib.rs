//! # Skyhop Animation
//!
//! Animation system for the Skyhop character.
//!
//! ## Features
//! - Named animation clips
//! - Per-clip actions with repeat or play-once looping
//! - Weight cross-fades between actions
//! - Action selection with idempotent requests

pub mod controller;
pub mod mixer;

pub use controller::{AnimationController, AnimationState, Transition};
pub use mixer::{ActionId, AnimationAction, AnimationMixer};

use serde::{Deserialize, Serialize};

/// Animation clip
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// Length in seconds
    pub duration: f32,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

/// How an action behaves when it reaches the end of its clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopMode {
    /// Wrap back to the start
    #[default]
    Repeat,
    /// Play once, then hold the last frame
    Once,
}
