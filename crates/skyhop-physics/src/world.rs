//! Physics World
//!
//! Owns the rapier pipeline and every body in the simulation. Bodies are
//! addressed by [`BodyHandle`]; each carries the collision flags and motion
//! state the rest of the loop works with.
//!
//! One call to [`PhysicsWorld::step`] advances the world by a whole frame as
//! a fixed number of equal substeps. Forces added during the frame act on
//! every substep and are cleared afterwards. Kinematic targets written
//! through [`PhysicsWorld::set_motion_state`] are reached at the end of the
//! frame, interpolated across the substeps so contacts see a smooth motion.

use ahash::AHashMap;
use glam::Vec3;
use rapier3d::prelude::*;
use skyhop_core::NodeId;

use crate::convert::{from_isometry, from_vector, to_isometry, to_vector};
use crate::{
    BodyDesc, BodyHandle, BodyRegistry, CollisionFlags, ColliderShape, MotionState, PhysicsConfig,
    PhysicsError, PhysicsResult, RigidBodyType,
};

/// Book-keeping for one body
#[derive(Debug)]
struct BodyEntry {
    rigid_body: RigidBodyHandle,
    flags: CollisionFlags,
    motion_state: Option<MotionState>,
    /// Kinematic pose to reach by the end of the next step
    kinematic_target: Option<MotionState>,
    /// Sum of forces applied since the last step
    applied_force: Vec3,
}

/// Physics world
pub struct PhysicsWorld {
    config: PhysicsConfig,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    rigid_bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    entries: AHashMap<BodyHandle, BodyEntry>,
    registry: BodyRegistry,
    next_handle: u32,
    step_count: u64,
}

impl PhysicsWorld {
    /// Build an empty world
    pub fn initialize(config: PhysicsConfig) -> PhysicsResult<Self> {
        config.validate()?;

        log::info!(
            "Physics world initialized: gravity {}, {} substeps per frame",
            config.gravity,
            config.substeps
        );

        Ok(Self {
            gravity: to_vector(config.gravity),
            config,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            entries: AHashMap::new(),
            registry: BodyRegistry::new(),
            next_handle: 0,
            step_count: 0,
        })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    /// Number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of completed frame steps
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Create a body for `node` and bind the two together.
    ///
    /// A mass of zero yields a kinematic body moved only through its motion
    /// state. Any positive mass yields a dynamic body that joins the sync set.
    ///
    /// # Panics
    /// If `node` is already bound to another body.
    pub fn create_rigid_body(&mut self, node: NodeId, desc: &BodyDesc) -> PhysicsResult<BodyHandle> {
        if !desc.mass.is_finite() || desc.mass < 0.0 {
            return Err(PhysicsError::InvalidMass(desc.mass));
        }
        desc.shape.validate()?;

        let initial = MotionState::new(desc.position, desc.orientation);
        let body_type = desc.body_type();

        let mut flags = desc.flags;
        let builder = match body_type {
            RigidBodyType::Kinematic => {
                flags |= CollisionFlags::KINEMATIC;
                RigidBodyBuilder::kinematic_position_based()
            }
            RigidBodyType::Dynamic => RigidBodyBuilder::dynamic()
                .linear_damping(desc.linear_damping)
                .angular_damping(desc.angular_damping),
        };
        let mut builder = builder.pose(to_isometry(&initial)).can_sleep(false);
        if flags.contains(CollisionFlags::YAW_ONLY) {
            builder = builder.enabled_rotations(false, true, false);
        }
        let rigid_body = self.rigid_bodies.insert(builder.build());

        // Contact friction is the product of both coefficients.
        let mut collider = collider_builder(&desc.shape)
            .friction(desc.friction)
            .friction_combine_rule(CoefficientCombineRule::Multiply);
        if body_type == RigidBodyType::Dynamic {
            // Inertia follows from the shape at the requested mass.
            collider = collider.mass(desc.mass);
        }
        self.colliders
            .insert_with_parent(collider.build(), rigid_body, &mut self.rigid_bodies);

        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;

        self.registry
            .bind(handle, node, body_type == RigidBodyType::Dynamic);
        self.entries.insert(
            handle,
            BodyEntry {
                rigid_body,
                flags,
                motion_state: desc.motion_state.then_some(initial),
                kinematic_target: None,
                applied_force: Vec3::ZERO,
            },
        );

        log::debug!(
            "Created {:?} body {} for {} (mass {})",
            body_type,
            handle,
            node,
            desc.mass
        );
        Ok(handle)
    }

    /// Collision flags of a body
    pub fn flags(&self, handle: BodyHandle) -> Option<CollisionFlags> {
        self.entries.get(&handle).map(|entry| entry.flags)
    }

    pub fn is_kinematic(&self, handle: BodyHandle) -> bool {
        self.flags(handle)
            .is_some_and(|flags| flags.contains(CollisionFlags::KINEMATIC))
    }

    /// Advance the world by one frame
    pub fn step(&mut self, delta_seconds: f32) {
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            log::trace!("Skipping physics step with delta {}", delta_seconds);
            self.clear_forces();
            return;
        }

        let substeps = self.config.substeps;
        self.integration_parameters.dt = delta_seconds / substeps as f32;

        let targets: Vec<(RigidBodyHandle, MotionState, MotionState)> = self
            .entries
            .values_mut()
            .filter_map(|entry| {
                let target = entry.kinematic_target.take()?;
                let start = from_isometry(self.rigid_bodies.get(entry.rigid_body)?.position());
                Some((entry.rigid_body, start, target))
            })
            .collect();

        for substep in 1..=substeps {
            let t = substep as f32 / substeps as f32;
            for (rigid_body, start, target) in &targets {
                if let Some(body) = self.rigid_bodies.get_mut(*rigid_body) {
                    body.set_next_kinematic_position(to_isometry(&start.lerp(target, t)));
                }
            }

            self.pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                &(),
                &(),
            );
        }

        self.clear_forces();
        for entry in self.entries.values_mut() {
            if entry.motion_state.is_none() || entry.flags.contains(CollisionFlags::KINEMATIC) {
                continue;
            }
            if let Some(body) = self.rigid_bodies.get(entry.rigid_body) {
                entry.motion_state = Some(from_isometry(body.position()));
            }
        }

        self.step_count += 1;
    }

    /// Forces only ever last for the frame they were applied in
    fn clear_forces(&mut self) {
        for entry in self.entries.values_mut() {
            if let Some(body) = self.rigid_bodies.get_mut(entry.rigid_body) {
                body.reset_forces(false);
            }
            entry.applied_force = Vec3::ZERO;
        }
    }

    /// Add a force through the center of mass for the current frame
    pub fn apply_central_force(&mut self, handle: BodyHandle, force: Vec3) -> PhysicsResult<()> {
        let (entry, body) = self.entry_body_mut(handle)?;
        body.add_force(to_vector(force), true);
        entry.applied_force += force;
        Ok(())
    }

    /// Apply an instantaneous impulse through the center of mass
    pub fn apply_central_impulse(&mut self, handle: BodyHandle, impulse: Vec3) -> PhysicsResult<()> {
        let (_, body) = self.entry_body_mut(handle)?;
        body.apply_impulse(to_vector(impulse), true);
        Ok(())
    }

    /// Overwrite the angular velocity
    pub fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: Vec3) -> PhysicsResult<()> {
        let (_, body) = self.entry_body_mut(handle)?;
        body.set_angvel(to_vector(angular_velocity), true);
        Ok(())
    }

    pub fn angular_velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.body(handle).map(|body| from_vector(body.angvel()))
    }

    pub fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.body(handle).map(|body| from_vector(body.linvel()))
    }

    /// Forces applied since the last step
    pub fn applied_force(&self, handle: BodyHandle) -> Option<Vec3> {
        self.entries.get(&handle).map(|entry| entry.applied_force)
    }

    /// Current motion state, `None` for bodies created without one
    pub fn motion_state(&self, handle: BodyHandle) -> Option<MotionState> {
        self.entries.get(&handle)?.motion_state
    }

    /// Drive a kinematic body; the pose is reached by the end of the next step
    pub fn set_motion_state(&mut self, handle: BodyHandle, state: MotionState) -> PhysicsResult<()> {
        let entry = self
            .entries
            .get_mut(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        if !entry.flags.contains(CollisionFlags::KINEMATIC) {
            return Err(PhysicsError::NotKinematic(handle));
        }
        entry.motion_state = Some(state);
        entry.kinematic_target = Some(state);
        Ok(())
    }

    /// Pose of the simulated body itself
    pub fn simulated_pose(&self, handle: BodyHandle) -> Option<MotionState> {
        self.body(handle).map(|body| from_isometry(body.position()))
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        let entry = self.entries.get(&handle)?;
        self.rigid_bodies.get(entry.rigid_body)
    }

    fn entry_body_mut(&mut self, handle: BodyHandle) -> PhysicsResult<(&mut BodyEntry, &mut RigidBody)> {
        let entry = self
            .entries
            .get_mut(&handle)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        let body = self
            .rigid_bodies
            .get_mut(entry.rigid_body)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        Ok((entry, body))
    }
}

fn collider_builder(shape: &ColliderShape) -> ColliderBuilder {
    match *shape {
        ColliderShape::Sphere { radius } => ColliderBuilder::ball(radius),
        ColliderShape::Box { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShape::Capsule {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(half_height, radius),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use skyhop_core::{NodeTag, SceneGraph};

    const DT: f32 = 1.0 / 60.0;

    fn node(scene: &mut SceneGraph, name: &str) -> NodeId {
        scene.add_node(name, NodeTag::Untagged).id()
    }

    fn ball(mass: f32, position: Vec3) -> BodyDesc {
        BodyDesc::new(ColliderShape::Sphere { radius: 0.5 }, mass).at(position, Quat::IDENTITY)
    }

    #[test]
    fn test_initialize_rejects_bad_config() {
        let config = PhysicsConfig {
            substeps: 0,
            ..Default::default()
        };
        assert!(PhysicsWorld::initialize(config).is_err());
    }

    #[test]
    fn test_create_rejects_bad_mass() {
        let mut scene = SceneGraph::new();
        let mut world = PhysicsWorld::initialize(PhysicsConfig::default()).unwrap();
        let n = node(&mut scene, "ball");

        let result = world.create_rigid_body(n, &ball(-1.0, Vec3::ZERO));
        assert_eq!(result, Err(PhysicsError::InvalidMass(-1.0)));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_zero_mass_is_kinematic() {
        let mut scene = SceneGraph::new();
        let mut world = PhysicsWorld::initialize(PhysicsConfig::default()).unwrap();
        let platform = world
            .create_rigid_body(node(&mut scene, "platform"), &ball(0.0, Vec3::ZERO))
            .unwrap();
        let crate_body = world
            .create_rigid_body(node(&mut scene, "crate"), &ball(1.0, Vec3::ZERO))
            .unwrap();

        assert!(world.is_kinematic(platform));
        assert!(!world.is_kinematic(crate_body));
        assert!(!world.registry().is_dynamic(platform));
        assert!(world.registry().is_dynamic(crate_body));
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut scene = SceneGraph::new();
        let mut world = PhysicsWorld::initialize(PhysicsConfig::default()).unwrap();
        let handle = world
            .create_rigid_body(node(&mut scene, "ball"), &ball(1.0, Vec3::new(0.0, 10.0, 0.0)))
            .unwrap();

        for _ in 0..30 {
            world.step(DT);
        }

        let state = world.motion_state(handle).unwrap();
        // Half a second of free fall at g = 10 covers about 1.25 m.
        assert!(state.origin.y < 9.0 && state.origin.y > 8.5, "y = {}", state.origin.y);
        assert_eq!(state, world.simulated_pose(handle).unwrap());
    }

    #[test]
    fn test_dynamic_body_rests_on_kinematic_floor() {
        let mut scene = SceneGraph::new();
        let mut world = PhysicsWorld::initialize(PhysicsConfig::default()).unwrap();
        let floor = BodyDesc::new(ColliderShape::cuboid(Vec3::new(10.0, 1.0, 10.0)), 0.0)
            .at(Vec3::new(0.0, -0.5, 0.0), Quat::IDENTITY);
        world.create_rigid_body(node(&mut scene, "floor"), &floor).unwrap();
        let handle = world
            .create_rigid_body(node(&mut scene, "ball"), &ball(1.0, Vec3::new(0.0, 2.0, 0.0)))
            .unwrap();

        for _ in 0..180 {
            world.step(DT);
        }

        let y = world.motion_state(handle).unwrap().origin.y;
        assert!((y - 0.5).abs() < 0.1, "y = {}", y);
    }

    #[test]
    fn test_kinematic_motion_state_is_reached_after_step() {
        let mut scene = SceneGraph::new();
        let mut world = PhysicsWorld::initialize(PhysicsConfig::default()).unwrap();
        let handle = world
            .create_rigid_body(node(&mut scene, "platform"), &ball(0.0, Vec3::ZERO))
            .unwrap();

        let target = MotionState::new(Vec3::new(0.0, 0.3, 0.0), Quat::from_rotation_y(0.1));
        world.set_motion_state(handle, target).unwrap();
        assert_eq!(world.motion_state(handle), Some(target));

        world.step(DT);

        let pose = world.simulated_pose(handle).unwrap();
        assert!((pose.origin - target.origin).length() < 1e-5);
        assert!(pose.rotation.angle_between(target.rotation) < 1e-3);
        assert_eq!(world.motion_state(handle), Some(target));
    }

    #[test]
    fn test_set_motion_state_on_dynamic_body_fails() {
        let mut scene = SceneGraph::new();
        let mut world = PhysicsWorld::initialize(PhysicsConfig::default()).unwrap();
        let handle = world
            .create_rigid_body(node(&mut scene, "ball"), &ball(1.0, Vec3::ZERO))
            .unwrap();

        let result = world.set_motion_state(handle, MotionState::default());
        assert_eq!(result, Err(PhysicsError::NotKinematic(handle)));
    }

    #[test]
    fn test_body_without_motion_state() {
        let mut scene = SceneGraph::new();
        let mut world = PhysicsWorld::initialize(PhysicsConfig::default()).unwrap();
        let handle = world
            .create_rigid_body(
                node(&mut scene, "ghost"),
                &ball(1.0, Vec3::new(0.0, 5.0, 0.0)).without_motion_state(),
            )
            .unwrap();

        world.step(DT);
        assert_eq!(world.motion_state(handle), None);
        assert!(world.simulated_pose(handle).is_some());
    }

    #[test]
    fn test_forces_last_one_frame() {
        let mut scene = SceneGraph::new();
        let config = PhysicsConfig {
            gravity: Vec3::ZERO,
            ..Default::default()
        };
        let mut world = PhysicsWorld::initialize(config).unwrap();
        let handle = world
            .create_rigid_body(node(&mut scene, "ball"), &ball(10.0, Vec3::ZERO))
            .unwrap();

        world.apply_central_force(handle, Vec3::new(0.0, 0.0, 70.0)).unwrap();
        assert_eq!(world.applied_force(handle), Some(Vec3::new(0.0, 0.0, 70.0)));

        world.step(0.1);
        let after_force = world.linear_velocity(handle).unwrap();
        // a = F / m = 7 m/s² for 0.1 s.
        assert!((after_force.z - 0.7).abs() < 1e-3, "vz = {}", after_force.z);
        assert_eq!(world.applied_force(handle), Some(Vec3::ZERO));

        world.step(0.1);
        let coasting = world.linear_velocity(handle).unwrap();
        assert!((coasting.z - after_force.z).abs() < 1e-5);
    }

    #[test]
    fn test_impulse_changes_velocity_immediately() {
        let mut scene = SceneGraph::new();
        let mut world = PhysicsWorld::initialize(PhysicsConfig::default()).unwrap();
        let handle = world
            .create_rigid_body(node(&mut scene, "ball"), &ball(10.0, Vec3::ZERO))
            .unwrap();

        world.apply_central_impulse(handle, Vec3::new(0.0, 70.0, 0.0)).unwrap();
        let v = world.linear_velocity(handle).unwrap();
        assert!((v.y - 7.0).abs() < 1e-4);
    }

    #[test]
    fn test_yaw_only_body_keeps_upright() {
        let mut scene = SceneGraph::new();
        let mut world = PhysicsWorld::initialize(PhysicsConfig::default()).unwrap();
        let desc = BodyDesc::new(
            ColliderShape::Capsule {
                radius: 0.25,
                half_height: 0.2,
            },
            10.0,
        )
        .with_flags(CollisionFlags::YAW_ONLY);
        let handle = world.create_rigid_body(node(&mut scene, "player"), &desc).unwrap();

        world.set_angular_velocity(handle, Vec3::new(0.0, 2.0, 0.0)).unwrap();
        world.step(DT);

        let rotation = world.motion_state(handle).unwrap().rotation;
        assert!(rotation.x.abs() < 1e-4 && rotation.z.abs() < 1e-4, "{:?}", rotation);
        let (_, yaw, _) = rotation.to_euler(glam::EulerRot::XYZ);
        assert!((yaw - 2.0 * DT).abs() < 1e-3, "yaw = {}", yaw);
    }

    #[test]
    fn test_unknown_body() {
        let mut world = PhysicsWorld::initialize(PhysicsConfig::default()).unwrap();
        let result = world.apply_central_force(BodyHandle(42), Vec3::X);
        assert_eq!(result, Err(PhysicsError::UnknownBody(BodyHandle(42))));
        assert_eq!(world.motion_state(BodyHandle(42)), None);
    }

    #[test]
    fn test_zero_delta_does_not_step() {
        let mut world = PhysicsWorld::initialize(PhysicsConfig::default()).unwrap();
        world.step(0.0);
        assert_eq!(world.step_count(), 0);
        world.step(DT);
        assert_eq!(world.step_count(), 1);
    }

    #[test]
    fn test_skipped_step_still_clears_forces() {
        let mut scene = SceneGraph::new();
        let config = PhysicsConfig {
            gravity: Vec3::ZERO,
            ..Default::default()
        };
        let mut world = PhysicsWorld::initialize(config).unwrap();
        let handle = world
            .create_rigid_body(node(&mut scene, "ball"), &ball(10.0, Vec3::ZERO))
            .unwrap();

        world.apply_central_force(handle, Vec3::new(0.0, 0.0, 70.0)).unwrap();
        world.step(0.0);
        assert_eq!(world.applied_force(handle), Some(Vec3::ZERO));
        assert_eq!(world.linear_velocity(handle), Some(Vec3::ZERO));

        // Only the second frame's force acts.
        world.apply_central_force(handle, Vec3::new(0.0, 0.0, 70.0)).unwrap();
        world.step(0.1);
        let v = world.linear_velocity(handle).unwrap();
        assert!((v.z - 0.7).abs() < 1e-3, "vz = {}", v.z);
    }
}
