//! Character Controller
//!
//! Turns the frame's input state into commands on the player body:
//! - a continuous force from the movement keys, in character space
//! - a yaw rate from the horizontal pointer offset
//! - a vertical impulse when a jump is requested and ground is close
//!
//! It also picks the Idle, Run or Jump animation from the key edges, replayed
//! in the order they arrived:
//! - a movement key going down requests Run
//! - Space going down requests Jump when the ground check passes
//! - any key going up ends a Jump in Idle, and otherwise requests Run while
//!   a movement key is still held and Idle once none is

use glam::{Quat, Vec2, Vec3};
use skyhop_animation::{AnimationClip, AnimationController, LoopMode, Transition};
use skyhop_core::math::Ray;
use skyhop_core::{Geometry, NodeId, NodeTag, RayHit, SceneGraph};
use skyhop_physics::{BodyDesc, BodyHandle, ColliderShape, CollisionFlags, PhysicsResult, PhysicsWorld};
use skyhop_platform::{InputState, KeyCode, MovementKeys};

use crate::config::{CharacterConfig, ControllerConfig};
use crate::GameResult;

pub const IDLE: &str = "Idle";
pub const RUN: &str = "Run";
pub const JUMP: &str = "Jump";

/// Result of a jump request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpOutcome {
    Granted { surface: NodeTag, distance: f32 },
    Denied,
}

/// Commands issued for one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControlOutput {
    /// World-space force applied to the body
    pub force: Option<Vec3>,
    /// Angular velocity written to the body
    pub angular_velocity: Option<Vec3>,
    /// Outcome of this frame's jump request, if there was one
    pub jump: Option<JumpOutcome>,
    /// Animation transitions requested this frame
    pub animations: Vec<Transition>,
}

/// Whether the pointer state drives rotation this frame.
///
/// The yaw rate comes from the horizontal offset, but it is only written
/// while the vertical offset is non-zero.
pub fn rotation_gate(mouse: Vec2) -> bool {
    mouse.y != 0.0
}

/// Force for the held movement keys, rotated into world space
pub fn movement_force(keys: MovementKeys, rotation: Quat, speed: f32) -> Option<Vec3> {
    let move_x = keys.left - keys.right;
    let move_z = keys.forward - keys.back;
    if move_x == 0.0 && move_z == 0.0 {
        return None;
    }
    Some(rotation * Vec3::new(move_x * speed, 0.0, move_z * speed))
}

/// First surface below `origin`, if it can be jumped from
pub fn ground_check(scene: &SceneGraph, origin: Vec3, max_distance: f32) -> Option<RayHit> {
    let hit = scene.raycast(&Ray::new(origin, Vec3::NEG_Y)).into_iter().next()?;
    let standable = matches!(hit.tag, NodeTag::Platform | NodeTag::Wall | NodeTag::Floor);
    (standable && hit.distance < max_distance).then_some(hit)
}

/// Player character
#[derive(Debug)]
pub struct CharacterController {
    node: NodeId,
    body: BodyHandle,
    config: ControllerConfig,
    animation: AnimationController,
}

impl CharacterController {
    /// Create the character node and body and start the Idle animation.
    ///
    /// Idle is playing from the first frame, so the first key edge already
    /// cross-fades out of it.
    pub fn spawn(
        scene: &mut SceneGraph,
        world: &mut PhysicsWorld,
        character: &CharacterConfig,
        config: ControllerConfig,
    ) -> GameResult<Self> {
        let size = character.box_size;
        let node = scene
            .add_node("character", NodeTag::Character)
            .with_geometry(Geometry::cuboid(size.x, size.y, size.z))
            .with_pose(character.spawn, Quat::IDENTITY)
            .id();

        let shape = ColliderShape::Capsule {
            radius: character.capsule_radius,
            half_height: character.capsule_height * 0.5,
        };
        let desc = BodyDesc::new(shape, character.mass)
            .at(character.spawn, Quat::IDENTITY)
            .with_flags(CollisionFlags::YAW_ONLY);
        let body = world.create_rigid_body(node, &desc)?;

        let mut animation = AnimationController::new(
            [
                AnimationClip::new(IDLE, 2.0),
                AnimationClip::new(RUN, 0.8),
                AnimationClip::new(JUMP, 1.0),
            ],
            config.cross_fade,
        );
        animation.request(IDLE, LoopMode::Repeat);

        log::info!("Character spawned at {} as {}", character.spawn, body);
        Ok(Self {
            node,
            body,
            config,
            animation,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn animation(&self) -> &AnimationController {
        &self.animation
    }

    /// Issue this frame's commands.
    ///
    /// Consumes the pending jump request. Fails only if the body is unknown
    /// to `world`.
    pub fn update(
        &mut self,
        input: &mut InputState,
        scene: &SceneGraph,
        world: &mut PhysicsWorld,
    ) -> PhysicsResult<ControlOutput> {
        let mut output = ControlOutput::default();

        let transform = scene
            .world_transform(self.node)
            .unwrap_or_else(|| panic!("Character {} is not in the scene", self.node));

        for edge in input.key_edges().to_vec() {
            if !edge.pressed {
                let next = if edge.movement_held && self.animation.current_action() != Some(JUMP) {
                    RUN
                } else {
                    IDLE
                };
                output.animations.push(self.animation.request(next, LoopMode::Repeat));
            } else if edge.key.is_movement() {
                output.animations.push(self.animation.request(RUN, LoopMode::Repeat));
            } else if edge.key == KeyCode::Space && input.take_jump_request() {
                output.jump = Some(self.jump(scene, world, transform.position, &mut output.animations)?);
            }
        }

        if let Some(force) = movement_force(input.movement(), transform.rotation, self.config.movement_speed) {
            world.apply_central_force(self.body, force)?;
            output.force = Some(force);
        }

        let mouse = input.mouse();
        if rotation_gate(mouse) {
            let angular_velocity = Vec3::new(0.0, -mouse.x * self.config.rotation_speed, 0.0);
            world.set_angular_velocity(self.body, angular_velocity)?;
            output.angular_velocity = Some(angular_velocity);
        }

        Ok(output)
    }

    fn jump(
        &mut self,
        scene: &SceneGraph,
        world: &mut PhysicsWorld,
        origin: Vec3,
        animations: &mut Vec<Transition>,
    ) -> PhysicsResult<JumpOutcome> {
        let max_distance = self.config.ground_check_distance;
        let Some(hit) = ground_check(scene, origin, max_distance) else {
            log::debug!("Jump denied: no ground within {}", max_distance);
            return Ok(JumpOutcome::Denied);
        };

        animations.push(self.animation.request(JUMP, LoopMode::Once));
        world.apply_central_impulse(self.body, Vec3::new(0.0, self.config.jump_impulse, 0.0))?;
        Ok(JumpOutcome::Granted {
            surface: hit.tag,
            distance: hit.distance,
        })
    }

    /// Advance the character's animations
    pub fn animate(&mut self, dt: f32) {
        self.animation.update(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyhop_physics::PhysicsConfig;
    use skyhop_platform::{InputEvent, KeyCode, Viewport};

    fn setup() -> (SceneGraph, PhysicsWorld, CharacterController) {
        let mut scene = SceneGraph::new();
        let mut world = PhysicsWorld::initialize(PhysicsConfig::default()).unwrap();
        let character = CharacterController::spawn(
            &mut scene,
            &mut world,
            &CharacterConfig::default(),
            ControllerConfig::default(),
        )
        .unwrap();
        (scene, world, character)
    }

    fn ground(scene: &mut SceneGraph, tag: NodeTag, top: f32) {
        scene
            .add_node("ground", tag)
            .with_geometry(Geometry::cuboid(4.0, 1.0, 4.0))
            .with_pose(Vec3::new(0.0, top - 0.5, 0.0), Quat::IDENTITY);
    }

    fn press(input: &mut InputState, key: KeyCode) {
        input.handle_event(&InputEvent::KeyPressed(key));
    }

    #[test]
    fn test_movement_force() {
        let keys = MovementKeys {
            forward: 1.0,
            ..Default::default()
        };
        assert_eq!(movement_force(keys, Quat::IDENTITY, 70.0), Some(Vec3::new(0.0, 0.0, 70.0)));
        assert_eq!(movement_force(MovementKeys::default(), Quat::IDENTITY, 70.0), None);

        let opposed = MovementKeys {
            left: 1.0,
            right: 1.0,
            ..Default::default()
        };
        assert_eq!(movement_force(opposed, Quat::IDENTITY, 70.0), None);

        let keys = MovementKeys {
            left: 1.0,
            ..Default::default()
        };
        let force = movement_force(keys, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2), 70.0).unwrap();
        assert!((force - Vec3::new(0.0, 0.0, -70.0)).length() < 1e-4);
    }

    #[test]
    fn test_rotation_gate() {
        assert!(!rotation_gate(Vec2::new(0.8, 0.0)));
        assert!(rotation_gate(Vec2::new(0.0, 0.1)));
    }

    #[test]
    fn test_idle_frame_issues_nothing() {
        let (scene, mut world, mut character) = setup();
        let mut input = InputState::default();

        let output = character.update(&mut input, &scene, &mut world).unwrap();
        assert_eq!(output, ControlOutput::default());
        assert_eq!(world.applied_force(character.body()), Some(Vec3::ZERO));
    }

    #[test]
    fn test_forward_key_pushes_and_runs() {
        let (scene, mut world, mut character) = setup();
        let mut input = InputState::default();
        press(&mut input, KeyCode::W);

        let output = character.update(&mut input, &scene, &mut world).unwrap();
        assert_eq!(output.force, Some(Vec3::new(0.0, 0.0, 70.0)));
        assert_eq!(world.applied_force(character.body()), Some(Vec3::new(0.0, 0.0, 70.0)));
        assert_eq!(character.animation().current_action(), Some(RUN));
    }

    #[test]
    fn test_pointer_rotation() {
        let (scene, mut world, mut character) = setup();
        let mut input = InputState::new(Viewport::new(100.0, 100.0).unwrap());
        input.handle_event(&InputEvent::PointerMoved { x: 75.0, y: 25.0 });

        let output = character.update(&mut input, &scene, &mut world).unwrap();
        assert_eq!(output.angular_velocity, Some(Vec3::new(0.0, -0.5 * 2.5, 0.0)));
    }

    #[test]
    fn test_pointer_on_horizontal_midline_does_not_rotate() {
        let (scene, mut world, mut character) = setup();
        let mut input = InputState::new(Viewport::new(100.0, 100.0).unwrap());
        input.handle_event(&InputEvent::PointerMoved { x: 90.0, y: 50.0 });

        let output = character.update(&mut input, &scene, &mut world).unwrap();
        assert_eq!(output.angular_velocity, None);
    }

    #[test]
    fn test_jump_granted_near_floor() {
        let (mut scene, mut world, mut character) = setup();
        ground(&mut scene, NodeTag::Floor, -0.49);
        let mut input = InputState::default();
        press(&mut input, KeyCode::Space);

        let output = character.update(&mut input, &scene, &mut world).unwrap();
        match output.jump {
            Some(JumpOutcome::Granted { surface, distance }) => {
                assert_eq!(surface, NodeTag::Floor);
                assert!((distance - 0.49).abs() < 1e-5);
            }
            other => panic!("expected a granted jump, got {:?}", other),
        }
        assert_eq!(character.animation().current_action(), Some(JUMP));
        let velocity = world.linear_velocity(character.body()).unwrap();
        assert!((velocity.y - 7.0).abs() < 1e-4);
        assert!(!input.jump_requested());
    }

    #[test]
    fn test_jump_denied_beyond_threshold() {
        let (mut scene, mut world, mut character) = setup();
        ground(&mut scene, NodeTag::Floor, -0.51);
        let mut input = InputState::default();
        press(&mut input, KeyCode::Space);

        let output = character.update(&mut input, &scene, &mut world).unwrap();
        assert_eq!(output.jump, Some(JumpOutcome::Denied));
        assert_eq!(character.animation().current_action(), Some(IDLE));
        assert_eq!(world.linear_velocity(character.body()), Some(Vec3::ZERO));
    }

    #[test]
    fn test_jump_from_wall_top() {
        let (mut scene, mut world, mut character) = setup();
        ground(&mut scene, NodeTag::Wall, -0.3);
        let mut input = InputState::default();
        press(&mut input, KeyCode::Space);

        let output = character.update(&mut input, &scene, &mut world).unwrap();
        assert!(matches!(output.jump, Some(JumpOutcome::Granted { surface: NodeTag::Wall, .. })));
    }

    #[test]
    fn test_jump_denied_on_untagged_surface() {
        let (mut scene, mut world, mut character) = setup();
        ground(&mut scene, NodeTag::Untagged, -0.1);
        let mut input = InputState::default();
        press(&mut input, KeyCode::Space);

        let output = character.update(&mut input, &scene, &mut world).unwrap();
        assert_eq!(output.jump, Some(JumpOutcome::Denied));
    }

    #[test]
    fn test_key_up_returns_to_idle() {
        let (scene, mut world, mut character) = setup();
        let mut input = InputState::default();
        press(&mut input, KeyCode::W);
        character.update(&mut input, &scene, &mut world).unwrap();
        input.end_frame();

        press(&mut input, KeyCode::D);
        input.handle_event(&InputEvent::KeyReleased(KeyCode::W));
        character.update(&mut input, &scene, &mut world).unwrap();
        assert_eq!(character.animation().current_action(), Some(RUN));
        input.end_frame();

        input.handle_event(&InputEvent::KeyReleased(KeyCode::D));
        let output = character.update(&mut input, &scene, &mut world).unwrap();
        assert_eq!(character.animation().current_action(), Some(IDLE));
        assert_eq!(output.animations, vec![Transition::CrossFaded { from: RUN.to_string() }]);
        assert_eq!(output.force, None);
    }

    #[test]
    fn test_tap_within_one_frame_ends_idle() {
        let (scene, mut world, mut character) = setup();
        let mut input = InputState::default();
        press(&mut input, KeyCode::W);
        input.handle_event(&InputEvent::KeyReleased(KeyCode::W));

        let output = character.update(&mut input, &scene, &mut world).unwrap();
        assert_eq!(character.animation().current_action(), Some(IDLE));
        assert_eq!(output.animations.len(), 2);
        assert_eq!(output.force, None);
    }

    #[test]
    fn test_release_after_running_jump_ends_idle() {
        let (mut scene, mut world, mut character) = setup();
        ground(&mut scene, NodeTag::Floor, -0.45);
        let mut input = InputState::default();
        press(&mut input, KeyCode::W);
        press(&mut input, KeyCode::Space);
        character.update(&mut input, &scene, &mut world).unwrap();
        assert_eq!(character.animation().current_action(), Some(JUMP));
        input.end_frame();

        input.handle_event(&InputEvent::KeyReleased(KeyCode::Space));
        character.update(&mut input, &scene, &mut world).unwrap();
        assert!(input.is_key_pressed(KeyCode::W));
        assert_eq!(character.animation().current_action(), Some(IDLE));
    }

    #[test]
    fn test_jump_then_release_in_one_frame() {
        let (mut scene, mut world, mut character) = setup();
        ground(&mut scene, NodeTag::Floor, -0.45);
        let mut input = InputState::default();
        press(&mut input, KeyCode::Space);
        input.handle_event(&InputEvent::KeyReleased(KeyCode::Space));

        let output = character.update(&mut input, &scene, &mut world).unwrap();
        assert!(matches!(output.jump, Some(JumpOutcome::Granted { .. })));
        assert_eq!(character.animation().current_action(), Some(IDLE));
    }

    #[test]
    fn test_repeated_run_request_is_unchanged() {
        let (scene, mut world, mut character) = setup();
        let mut input = InputState::default();
        press(&mut input, KeyCode::W);
        character.update(&mut input, &scene, &mut world).unwrap();
        input.end_frame();

        press(&mut input, KeyCode::A);
        let output = character.update(&mut input, &scene, &mut world).unwrap();
        assert_eq!(output.animations, vec![Transition::Unchanged]);
    }
}
