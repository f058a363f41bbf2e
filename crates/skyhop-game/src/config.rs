//! Game configuration
//!
//! Every tunable of the loop with its default. Configs are plain JSON; any
//! field left out keeps its default.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use skyhop_physics::PhysicsConfig;
use skyhop_platform::Viewport;

use crate::GameResult;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub character: CharacterConfig,
    pub controller: ControllerConfig,
    pub camera: CameraConfig,
    pub viewport: Viewport,
}

impl GameConfig {
    /// Parse a JSON config
    pub fn from_json(json: &str) -> GameResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> GameResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Player body and collision shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub spawn: Vec3,
    pub mass: f32,
    pub capsule_radius: f32,
    /// Height of the capsule's cylinder part
    pub capsule_height: f32,
    /// Size of the pickable box around the character
    pub box_size: Vec3,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            spawn: Vec3::ZERO,
            mass: 10.0,
            capsule_radius: 0.25,
            capsule_height: 0.4,
            box_size: Vec3::new(0.5, 0.6, 0.5),
        }
    }
}

/// Character controller tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Force per held movement axis
    pub movement_speed: f32,
    /// Yaw rate per unit of horizontal pointer offset
    pub rotation_speed: f32,
    pub jump_impulse: f32,
    /// A jump is granted when ground is closer than this
    pub ground_check_distance: f32,
    /// Seconds spent blending between animations
    pub cross_fade: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            movement_speed: 70.0,
            rotation_speed: 2.5,
            jump_impulse: 70.0,
            ground_check_distance: 0.5,
            cross_fade: 1.0,
        }
    }
}

/// Follow camera tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Rig offset in character space, also the initial camera position
    pub offset: Vec3,
    /// Fraction of the remaining distance covered each frame
    pub follow_factor: f32,
    /// Look-at height above the character origin
    pub look_height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, 2.0, -2.0),
            follow_factor: 0.085,
            look_height: 0.5,
        }
    }
}
