//! Kinematic Platform Driver
//!
//! Moving platforms are animated on the scene side: each frame the node is
//! nudged along one of its local axes by a sine of the elapsed time, then
//! its resulting world pose is written into the platform body's motion
//! state. The nudge is relative, so platforms accumulate it frame over frame.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use skyhop_core::{NodeId, SceneGraph};
use skyhop_physics::{BodyHandle, MotionState, PhysicsError, PhysicsWorld};

use crate::GameResult;

/// Axis a platform oscillates along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformAxis {
    Horizontal,
    #[default]
    Vertical,
}

impl PlatformAxis {
    /// Local axis the platform is moved along
    pub fn local_axis(&self) -> Vec3 {
        match self {
            PlatformAxis::Horizontal => Vec3::X,
            PlatformAxis::Vertical => Vec3::Y,
        }
    }
}

/// Motion parameters of one platform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformState {
    pub seed: f32,
    pub axis: PlatformAxis,
    /// Peak per-frame displacement
    pub amplitude: f32,
    /// Angular frequency in radians per second
    pub frequency: f32,
}

impl PlatformState {
    pub fn new(seed: f32, axis: PlatformAxis) -> Self {
        let (amplitude, frequency) = match axis {
            PlatformAxis::Horizontal => (0.02, 1.0),
            PlatformAxis::Vertical => (0.01, 2.0),
        };
        Self {
            seed,
            axis,
            amplitude,
            frequency,
        }
    }

    /// Displacement to apply this frame
    pub fn offset(&self, elapsed: f64) -> f32 {
        ((self.frequency as f64 * elapsed + self.seed as f64).sin() * self.amplitude as f64) as f32
    }
}

#[derive(Debug, Clone, Copy)]
struct DrivenPlatform {
    node: NodeId,
    body: BodyHandle,
    state: PlatformState,
}

/// Drives every moving platform
#[derive(Debug, Default)]
pub struct PlatformDriver {
    platforms: Vec<DrivenPlatform>,
}

impl PlatformDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a platform node and its kinematic body
    pub fn add(
        &mut self,
        world: &PhysicsWorld,
        node: NodeId,
        body: BodyHandle,
        state: PlatformState,
    ) -> GameResult<()> {
        if !world.is_kinematic(body) {
            return Err(PhysicsError::NotKinematic(body).into());
        }
        self.platforms.push(DrivenPlatform { node, body, state });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// Platforms as (node, body, state)
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, BodyHandle, &PlatformState)> {
        self.platforms
            .iter()
            .map(|platform| (platform.node, platform.body, &platform.state))
    }

    /// Move every platform for time `elapsed` and push the poses to physics.
    ///
    /// Returns the number of motion states written. Platforms whose body has
    /// no motion state are still moved visually but skipped on the physics side.
    ///
    /// # Panics
    /// If a platform node is missing from `scene`.
    pub fn update(&self, elapsed: f64, scene: &mut SceneGraph, world: &mut PhysicsWorld) -> usize {
        let mut written = 0;

        for platform in &self.platforms {
            let node = scene
                .get_node_mut(platform.node)
                .unwrap_or_else(|| panic!("Platform {} is not in the scene", platform.node));
            node.local_transform
                .translate_on_axis(platform.state.axis.local_axis(), platform.state.offset(elapsed));

            if world.motion_state(platform.body).is_none() {
                log::debug!("Skipping platform {}: no motion state", platform.body);
                continue;
            }
            let Some(pose) = scene.world_transform(platform.node) else {
                continue;
            };
            let state = MotionState::new(pose.position, pose.rotation);
            match world.set_motion_state(platform.body, state) {
                Ok(()) => written += 1,
                Err(err) => log::warn!("Failed to drive platform {}: {}", platform.body, err),
            }
        }

        written
    }
}
