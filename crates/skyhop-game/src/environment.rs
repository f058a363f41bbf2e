//! Arena setup
//!
//! A 28 × 30 walled arena on a large floor, with seven moving platforms.
//! Every piece is a tagged scene node with box geometry backed by a
//! zero-mass body, so walls and floor are static and platforms are kinematic.

use glam::{Quat, Vec3};
use skyhop_core::{Geometry, NodeId, NodeTag, SceneGraph};
use skyhop_physics::{BodyDesc, BodyHandle, ColliderShape, PhysicsWorld};

use crate::platforms::{PlatformAxis, PlatformDriver, PlatformState};
use crate::GameResult;

/// Layout of one moving platform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformLayout {
    pub size: Vec3,
    pub position: Vec3,
    pub seed: f32,
    pub axis: PlatformAxis,
}

const fn platform(size: [f32; 3], position: [f32; 3], seed: f32, axis: PlatformAxis) -> PlatformLayout {
    PlatformLayout {
        size: Vec3::from_array(size),
        position: Vec3::from_array(position),
        seed,
        axis,
    }
}

/// Moving platforms of the arena
pub const PLATFORMS: [PlatformLayout; 7] = [
    platform([3.0, 0.25, 3.0], [2.0, 1.0, 2.0], 5.0, PlatformAxis::Vertical),
    platform([4.0, 0.25, 2.0], [3.0, 3.0, -1.0], 0.0, PlatformAxis::Vertical),
    platform([4.0, 0.25, 4.0], [5.0, 5.0, 3.0], 10.0, PlatformAxis::Vertical),
    platform([2.0, 0.25, 3.0], [8.0, 3.0, 7.0], 12.0, PlatformAxis::Vertical),
    platform([4.0, 0.25, 4.0], [4.0, 5.0, 10.0], 20.0, PlatformAxis::Vertical),
    platform([3.0, 0.25, 3.0], [0.0, 1.0, 10.0], 5.0, PlatformAxis::Vertical),
    platform([5.0, 0.25, 3.0], [2.0, 2.0, -3.0], 7.0, PlatformAxis::Horizontal),
];

/// Boundary walls as (size, position)
pub const WALLS: [(Vec3, Vec3); 4] = [
    (Vec3::new(0.5, 2.0, 30.5), Vec3::new(14.0, 0.0, 0.0)),
    (Vec3::new(0.5, 2.0, 30.5), Vec3::new(-14.0, 0.0, 0.0)),
    (Vec3::new(28.0, 2.0, 0.5), Vec3::new(0.0, 0.0, 15.0)),
    (Vec3::new(28.0, 2.0, 0.5), Vec3::new(0.0, 0.0, -15.0)),
];

const FLOOR_SIZE: Vec3 = Vec3::new(100.0, 1.0, 100.0);
const FLOOR_POSITION: Vec3 = Vec3::new(0.0, -0.65, 0.0);
const FLOOR_FRICTION: f32 = 1.0;
const WALL_FRICTION: f32 = 0.5;

/// Nodes and bodies of the arena
#[derive(Debug, Default)]
pub struct Environment {
    pub floor: Option<(NodeId, BodyHandle)>,
    pub walls: Vec<(NodeId, BodyHandle)>,
    pub platforms: Vec<(NodeId, BodyHandle)>,
}

impl Environment {
    /// Build the arena into `scene` and `world`, registering platforms with `driver`
    pub fn build(
        scene: &mut SceneGraph,
        world: &mut PhysicsWorld,
        driver: &mut PlatformDriver,
    ) -> GameResult<Self> {
        let mut environment = Environment::default();

        for (size, position) in WALLS {
            let wall = static_box(scene, world, "wall", NodeTag::Wall, size, position, WALL_FRICTION)?;
            environment.walls.push(wall);
        }

        environment.floor = Some(static_box(
            scene,
            world,
            "floor",
            NodeTag::Floor,
            FLOOR_SIZE,
            FLOOR_POSITION,
            FLOOR_FRICTION,
        )?);

        for layout in PLATFORMS {
            let friction = match layout.axis {
                PlatformAxis::Horizontal => 1.0,
                PlatformAxis::Vertical => 0.7,
            };
            let (node, body) = static_box(
                scene,
                world,
                "platform",
                NodeTag::Platform,
                layout.size,
                layout.position,
                friction,
            )?;
            driver.add(world, node, body, PlatformState::new(layout.seed, layout.axis))?;
            environment.platforms.push((node, body));
        }

        log::info!(
            "Environment built: {} walls, {} platforms",
            environment.walls.len(),
            environment.platforms.len()
        );
        Ok(environment)
    }
}

fn static_box(
    scene: &mut SceneGraph,
    world: &mut PhysicsWorld,
    name: &str,
    tag: NodeTag,
    size: Vec3,
    position: Vec3,
    friction: f32,
) -> GameResult<(NodeId, BodyHandle)> {
    let node = scene
        .add_node(name, tag)
        .with_geometry(Geometry::cuboid(size.x, size.y, size.z))
        .with_pose(position, Quat::IDENTITY)
        .id();
    let desc = BodyDesc::new(ColliderShape::cuboid(size), 0.0)
        .at(position, Quat::IDENTITY)
        .with_friction(friction);
    let body = world.create_rigid_body(node, &desc)?;
    Ok((node, body))
}
