//! # Skyhop Physics
//!
//! Rigid-body simulation for the Skyhop loop, backed by rapier3d.
//!
//! ## Features
//! - Dynamic and position-based kinematic bodies built from a [`BodyDesc`]
//! - Fixed-substep stepping with per-frame forces
//! - Motion states for reading and driving body poses
//! - Body ↔ scene-node registry and post-step pose sync

pub mod convert;
pub mod registry;
pub mod sync;
pub mod world;

pub use registry::{BodyHandle, BodyRegistry};
pub use sync::sync_all;
pub use world::PhysicsWorld;

use bitflags::bitflags;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Physics errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("Physics initialization failed: {0}")]
    Initialization(String),

    #[error("Invalid body mass: {0}")]
    InvalidMass(f32),

    #[error("Invalid collider shape: {0}")]
    InvalidShape(String),

    #[error("Unknown body: {0}")]
    UnknownBody(BodyHandle),

    #[error("Body {0} is not kinematic")]
    NotKinematic(BodyHandle),
}

/// Result type for physics operations
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// Physics world configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    /// Substeps per frame; each advances the world by `delta / substeps`
    pub substeps: u32,
}

impl PhysicsConfig {
    /// Check the configuration before building a world
    pub fn validate(&self) -> PhysicsResult<()> {
        if !self.gravity.is_finite() {
            return Err(PhysicsError::Initialization(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        if self.substeps == 0 {
            return Err(PhysicsError::Initialization(
                "substep count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -10.0, 0.0),
            substeps: 10,
        }
    }
}

/// Rigid body type, derived from mass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RigidBodyType {
    #[default]
    Dynamic,
    /// Infinite mass, moved only through its motion state
    Kinematic,
}

bitflags! {
    /// Per-body collision flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CollisionFlags: u32 {
        /// Body is moved by writing its motion state
        const KINEMATIC = 1 << 0;
        /// Rotation is locked to the vertical axis
        const YAW_ONLY = 1 << 1;
    }
}

/// Collider shapes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    /// Y-aligned capsule; `half_height` is half the cylinder part
    Capsule { radius: f32, half_height: f32 },
}

impl ColliderShape {
    /// Box shape from full extents
    pub fn cuboid(size: Vec3) -> Self {
        ColliderShape::Box {
            half_extents: size * 0.5,
        }
    }

    /// Check that every dimension is positive and finite
    pub fn validate(&self) -> PhysicsResult<()> {
        let ok = match *self {
            ColliderShape::Sphere { radius } => radius.is_finite() && radius > 0.0,
            ColliderShape::Box { half_extents } => {
                half_extents.is_finite() && half_extents.min_element() > 0.0
            }
            ColliderShape::Capsule {
                radius,
                half_height,
            } => radius.is_finite() && radius > 0.0 && half_height.is_finite() && half_height >= 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(PhysicsError::InvalidShape(format!("{:?}", self)))
        }
    }
}

/// World pose of a body as exchanged with the scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub origin: Vec3,
    pub rotation: Quat,
}

impl MotionState {
    pub fn new(origin: Vec3, rotation: Quat) -> Self {
        Self { origin, rotation }
    }

    /// Interpolate origin linearly and rotation spherically
    pub fn lerp(&self, other: &MotionState, t: f32) -> MotionState {
        MotionState {
            origin: self.origin.lerp(other.origin, t),
            rotation: self.rotation.slerp(other.rotation, t),
        }
    }
}

impl Default for MotionState {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// Everything needed to create a rigid body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    pub shape: ColliderShape,
    /// 0 makes the body kinematic
    pub mass: f32,
    pub position: Vec3,
    pub orientation: Quat,
    pub friction: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub flags: CollisionFlags,
    /// Attach a motion state at creation
    pub motion_state: bool,
}

impl BodyDesc {
    pub fn new(shape: ColliderShape, mass: f32) -> Self {
        Self {
            shape,
            mass,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            friction: 0.5,
            linear_damping: 0.0,
            angular_damping: 0.0,
            flags: CollisionFlags::empty(),
            motion_state: true,
        }
    }

    pub fn at(mut self, position: Vec3, orientation: Quat) -> Self {
        self.position = position;
        self.orientation = orientation;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn with_flags(mut self, flags: CollisionFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Create the body with no motion state; sync and drivers skip it
    pub fn without_motion_state(mut self) -> Self {
        self.motion_state = false;
        self
    }

    /// Body type implied by the mass
    pub fn body_type(&self) -> RigidBodyType {
        if self.mass == 0.0 {
            RigidBodyType::Kinematic
        } else {
            RigidBodyType::Dynamic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PhysicsConfig::default();
        assert_eq!(config.gravity, Vec3::new(0.0, -10.0, 0.0));
        assert_eq!(config.substeps, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let config = PhysicsConfig {
            substeps: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PhysicsError::Initialization(_))));

        let config = PhysicsConfig {
            gravity: Vec3::new(0.0, f32::NAN, 0.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_body_type_from_mass() {
        let desc = BodyDesc::new(ColliderShape::Sphere { radius: 1.0 }, 0.0);
        assert_eq!(desc.body_type(), RigidBodyType::Kinematic);

        let desc = BodyDesc::new(ColliderShape::Sphere { radius: 1.0 }, 10.0);
        assert_eq!(desc.body_type(), RigidBodyType::Dynamic);
    }

    #[test]
    fn test_shape_validation() {
        assert!(ColliderShape::cuboid(Vec3::new(3.0, 0.25, 3.0)).validate().is_ok());
        assert!(ColliderShape::cuboid(Vec3::new(3.0, 0.0, 3.0)).validate().is_err());
        assert!(ColliderShape::Sphere { radius: -1.0 }.validate().is_err());
        assert!(
            ColliderShape::Capsule {
                radius: 0.25,
                half_height: 0.2
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn test_motion_state_lerp() {
        let a = MotionState::default();
        let b = MotionState::new(Vec3::new(2.0, 0.0, 0.0), Quat::from_rotation_y(1.0));
        let mid = a.lerp(&b, 0.5);
        assert!((mid.origin.x - 1.0).abs() < 1e-6);
        assert!(mid.rotation.angle_between(Quat::from_rotation_y(0.5)) < 1e-4);
    }
}
