//! Fixed-step locomotion: the mode state machine and per-tick velocity
//! derivation.
//!
//! Grounded mode integrates the ambient gravity vector, launches jumps, and
//! writes the horizontal velocity directly from the wish direction — the
//! snap to full speed is instantaneous, and with no input the horizontal
//! components step toward zero by the target speed per tick. Freefly mode
//! displaces the transform along the head orientation with the collision
//! shape disabled. Exactly one mode's behavior executes on any tick.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::{CharacterController, config::CharacterConfig, input::CharacterInput};

// ============================================================================
// Constants
// ============================================================================

/// Maximum floor distance for the downward shape cast.
const GROUNDED_DISTANCE: f32 = 0.5;

/// Minimum alignment between a hit normal and +Y for the hit to count as
/// floor contact rather than a wall graze.
const FLOOR_NORMAL_CUTOFF: f32 = 0.7;

/// Lateral shrink factor for the floor-cast collider, so a controller pressed
/// against a wall does not read the wall as floor.
const SLIGHT_SCALE_DOWN: f32 = 0.9375;

/// Wish directions shorter than this are treated as no input.
const MIN_WISH_LENGTH: f32 = 1e-3;

// ============================================================================
// Mode
// ============================================================================

/// Locomotion mode. Exactly one is active per controller at any instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum LocomotionMode {
    /// Walking, sprinting, and jumping with gravity and collision response.
    #[default]
    Grounded,
    /// Unconstrained flight following the head orientation; the collision
    /// shape is disabled and gravity does not apply.
    Freefly,
}

// ============================================================================
// Fixed-step driver
// ============================================================================

/// Advance every controller by one fixed tick.
///
/// Processes the freefly toggle edge first, then runs the active mode's
/// step. Grounded mode submits velocity to the physics solver through
/// [`LinearVelocity`]; freefly mode moves the transform directly.
pub fn locomotion_step(
    time: Res<Time<Fixed>>,
    gravity: Res<Gravity>,
    spatial_query: Res<SpatialQueryPipeline>,
    mut commands: Commands,
    mut query: Query<(
        Entity,
        &CharacterConfig,
        &mut CharacterController,
        &mut CharacterInput,
        &mut Transform,
        &mut LinearVelocity,
        &Collider,
    )>,
) {
    let dt = time.delta_secs();

    for (entity, config, mut controller, mut input, mut transform, mut velocity, collider) in
        &mut query
    {
        // Edges are taken so that a held key fires once and a stale press
        // cannot leak into a later tick.
        let toggle_freefly = std::mem::take(&mut input.toggle_freefly);
        let jump_pressed = std::mem::take(&mut input.jump);

        if toggle_freefly && config.can_freefly {
            match controller.mode {
                LocomotionMode::Grounded => {
                    commands.entity(entity).insert(ColliderDisabled);
                    velocity.0 = Vec3::ZERO;
                    controller.mode = LocomotionMode::Freefly;
                    tracing::info!(?entity, "entered freefly mode");
                }
                LocomotionMode::Freefly => {
                    commands.entity(entity).remove::<ColliderDisabled>();
                    controller.mode = LocomotionMode::Grounded;
                    tracing::info!(?entity, "returned to grounded mode");
                }
            }
        }

        match controller.mode {
            LocomotionMode::Freefly => {
                transform.translation += freefly_displacement(
                    controller.yaw,
                    controller.pitch,
                    input.movement,
                    config.freefly_speed,
                    dt,
                );
            }
            LocomotionMode::Grounded => {
                let on_floor = on_floor(&spatial_query, entity, collider, &transform);
                velocity.0 = grounded_velocity(
                    config,
                    velocity.0,
                    controller.yaw,
                    input.movement,
                    input.sprint,
                    jump_pressed,
                    on_floor,
                    gravity.0,
                    dt,
                );
            }
        }
    }
}

// ============================================================================
// Grounded mode
// ============================================================================

/// Derive the grounded-mode velocity for one tick.
#[allow(clippy::too_many_arguments)]
pub(crate) fn grounded_velocity(
    config: &CharacterConfig,
    velocity: Vec3,
    yaw: f32,
    movement: Vec2,
    sprint_held: bool,
    jump_pressed: bool,
    on_floor: bool,
    gravity: Vec3,
    dt: f32,
) -> Vec3 {
    let mut velocity = velocity;

    if config.has_gravity && !on_floor {
        velocity += gravity * dt;
    }

    // Absolute set, overriding any residual vertical velocity.
    if config.can_jump && on_floor && jump_pressed {
        velocity.y = config.jump_speed;
    }

    let target_speed = if config.can_sprint && sprint_held {
        config.sprint_speed
    } else {
        config.base_speed
    };

    let wish_direction = horizontal_wish_direction(yaw, movement);
    if !config.can_move {
        velocity.x = 0.0;
        velocity.z = 0.0;
    } else if wish_direction.length_squared() > MIN_WISH_LENGTH * MIN_WISH_LENGTH {
        velocity.x = wish_direction.x * target_speed;
        velocity.z = wish_direction.z * target_speed;
    } else {
        // Decay rate is the target speed per tick, per component; never
        // overshoots past zero.
        velocity.x = move_toward(velocity.x, 0.0, target_speed);
        velocity.z = move_toward(velocity.z, 0.0, target_speed);
    }

    velocity
}

/// Rotate the 2-axis directional input into the body's horizontal basis.
///
/// Returns a normalized direction, or zero for degenerate input.
pub(crate) fn horizontal_wish_direction(yaw: f32, movement: Vec2) -> Vec3 {
    (Quat::from_rotation_y(yaw) * Vec3::new(movement.x, 0.0, -movement.y)).normalize_or_zero()
}

/// Move a value toward a target by a maximum delta.
pub(crate) fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Shape cast downwards to find floor contact.
///
/// Better than a ray cast as it handles standing near the edge of a surface.
/// The cast collider is slightly shrunk laterally so adjacent walls are not
/// detected, and the hit normal must point sufficiently upward.
fn on_floor(
    spatial_query: &SpatialQueryPipeline,
    entity: Entity,
    collider: &Collider,
    transform: &Transform,
) -> bool {
    let filter = SpatialQueryFilter::default().with_excluded_entities([entity]);
    spatial_query
        .cast_shape(
            &scaled_collider_laterally(collider, SLIGHT_SCALE_DOWN),
            transform.translation,
            transform.rotation,
            Dir3::NEG_Y,
            &ShapeCastConfig::from_max_distance(GROUNDED_DISTANCE),
            &filter,
        )
        .is_some_and(|hit| hit.normal1.y > FLOOR_NORMAL_CUTOFF)
}

/// Return a collider scaled laterally but not vertically.
///
/// Falls back to the unscaled collider for shapes other than capsules.
fn scaled_collider_laterally(collider: &Collider, scale: f32) -> Collider {
    if let Some(capsule) = collider.shape().as_capsule() {
        Collider::capsule(capsule.radius * scale, capsule.segment.length())
    } else {
        collider.clone()
    }
}

// ============================================================================
// Freefly mode
// ============================================================================

/// Derive the freefly displacement for one tick.
///
/// The input is rotated into the head's full 3D basis so flight follows the
/// look pitch, then scaled by the freefly speed and the tick duration.
pub(crate) fn freefly_displacement(
    yaw: f32,
    pitch: f32,
    movement: Vec2,
    speed: f32,
    dt: f32,
) -> Vec3 {
    let look = Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch);
    let wish_direction = (look * Vec3::new(movement.x, 0.0, -movement.y)).normalize_or_zero();
    wish_direction * speed * dt
}
