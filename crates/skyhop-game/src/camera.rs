//! Follow camera
//!
//! A rig node parented to the character marks where the camera wants to be.
//! Each frame the camera covers a fixed fraction of the way to the rig and
//! turns to look just above the character.

use glam::{Mat4, Quat, Vec3};
use skyhop_core::{NodeId, NodeTag, SceneGraph};

use crate::config::CameraConfig;
use crate::GameResult;

#[derive(Debug, Clone)]
pub struct FollowCamera {
    rig: NodeId,
    position: Vec3,
    target: Vec3,
    config: CameraConfig,
}

impl FollowCamera {
    /// Attach a camera rig to `character`. The camera starts at the rig offset.
    pub fn attach(scene: &mut SceneGraph, character: NodeId, config: CameraConfig) -> GameResult<Self> {
        let rig = scene
            .add_node("follow_cam", NodeTag::Untagged)
            .with_pose(config.offset, Quat::IDENTITY)
            .id();
        scene.set_parent(rig, Some(character))?;

        Ok(Self {
            rig,
            position: config.offset,
            target: Vec3::ZERO,
            config,
        })
    }

    pub fn rig(&self) -> NodeId {
        self.rig
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Point the camera looks at
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Ease toward the rig and re-aim at the character
    pub fn update(&mut self, scene: &SceneGraph, character: NodeId) {
        let (Some(rig), Some(character)) = (scene.world_transform(self.rig), scene.world_transform(character))
        else {
            log::debug!("Follow camera lost its rig or character");
            return;
        };

        self.position = self.position.lerp(rig.position, self.config.follow_factor);
        self.target = character.position + Vec3::new(0.0, self.config.look_height, 0.0);
    }

    /// Right-handed view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }
}
