//! Physics → Scene Sync
//!
//! After each step the simulated pose of every dynamic body is copied onto
//! the node that displays it. The player character only takes position and
//! yaw, so it never tips over visually even if the solver nudges it.

use skyhop_core::math::yaw_component;
use skyhop_core::{NodeTag, SceneGraph};

use crate::PhysicsWorld;

/// Copy dynamic body poses onto their nodes. Returns the number of nodes updated.
///
/// Bodies without a motion state are skipped.
///
/// # Panics
/// If a registered body's node is missing from `scene`.
pub fn sync_all(world: &PhysicsWorld, scene: &mut SceneGraph) -> usize {
    let registry = world.registry();
    let mut synced = 0;

    for body in registry.dynamic_bodies() {
        let Some(state) = world.motion_state(body) else {
            log::debug!("Skipping sync of {}: no motion state", body);
            continue;
        };
        let node_id = registry
            .node_of(body)
            .unwrap_or_else(|| panic!("{} is in the sync set without a node", body));
        let node = scene
            .get_node_mut(node_id)
            .unwrap_or_else(|| panic!("{} is bound to {}, which is not in the scene", body, node_id));

        node.local_transform.position = state.origin;
        node.local_transform.rotation = if node.tag == NodeTag::Character {
            yaw_component(state.rotation)
        } else {
            state.rotation
        };
        synced += 1;
    }

    log::trace!("Synced {} dynamic bodies", synced);
    synced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BodyDesc, ColliderShape, PhysicsConfig};
    use glam::{Quat, Vec3};

    fn world() -> PhysicsWorld {
        PhysicsWorld::initialize(PhysicsConfig::default()).unwrap()
    }

    #[test]
    fn test_sync_copies_dynamic_pose() {
        let mut scene = SceneGraph::new();
        let mut world = world();
        let rotation = Quat::from_rotation_x(0.4);
        let node = scene.add_node("crate", NodeTag::Untagged).id();
        let body = world
            .create_rigid_body(
                node,
                &BodyDesc::new(ColliderShape::Sphere { radius: 0.5 }, 1.0)
                    .at(Vec3::new(1.0, 5.0, 2.0), rotation),
            )
            .unwrap();

        world.step(1.0 / 60.0);
        assert_eq!(sync_all(&world, &mut scene), 1);

        let state = world.motion_state(body).unwrap();
        let transform = scene.get_node(node).unwrap().local_transform;
        assert_eq!(transform.position, state.origin);
        assert_eq!(transform.rotation, state.rotation);
    }

    #[test]
    fn test_character_keeps_only_yaw() {
        let mut scene = SceneGraph::new();
        let mut world = world();
        let node = scene.add_node("character", NodeTag::Character).id();
        let tilted = Quat::from_rotation_y(0.8) * Quat::from_rotation_x(0.3);
        world
            .create_rigid_body(
                node,
                &BodyDesc::new(ColliderShape::Sphere { radius: 0.5 }, 10.0)
                    .at(Vec3::ZERO, tilted),
            )
            .unwrap();

        sync_all(&world, &mut scene);

        let rotation = scene.get_node(node).unwrap().local_transform.rotation;
        assert_eq!(rotation.x, 0.0);
        assert_eq!(rotation.z, 0.0);
        assert!((rotation.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_kinematic_and_stateless_bodies_are_skipped() {
        let mut scene = SceneGraph::new();
        let mut world = world();
        let platform = scene.add_node("platform", NodeTag::Platform).id();
        let ghost = scene.add_node("ghost", NodeTag::Untagged).id();
        world
            .create_rigid_body(
                platform,
                &BodyDesc::new(ColliderShape::cuboid(Vec3::ONE), 0.0).at(Vec3::Y, Quat::IDENTITY),
            )
            .unwrap();
        world
            .create_rigid_body(
                ghost,
                &BodyDesc::new(ColliderShape::cuboid(Vec3::ONE), 1.0)
                    .at(Vec3::Y, Quat::IDENTITY)
                    .without_motion_state(),
            )
            .unwrap();

        assert_eq!(sync_all(&world, &mut scene), 0);
        assert_eq!(scene.get_node(platform).unwrap().local_transform.position, Vec3::ZERO);
        assert_eq!(scene.get_node(ghost).unwrap().local_transform.position, Vec3::ZERO);
    }

    #[test]
    #[should_panic(expected = "not in the scene")]
    fn test_missing_node_panics() {
        let mut scene = SceneGraph::new();
        let mut world = world();
        let node = scene.add_node("crate", NodeTag::Untagged).id();
        world
            .create_rigid_body(node, &BodyDesc::new(ColliderShape::Sphere { radius: 0.5 }, 1.0))
            .unwrap();
        scene.remove_node(node);

        sync_all(&world, &mut scene);
    }
}
