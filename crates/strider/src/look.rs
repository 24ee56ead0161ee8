//! Look model: accumulated pitch/yaw applied to the body and head transforms.
//!
//! Pitch is clamped to ±85° to prevent the camera flipping past vertical;
//! yaw is unbounded (wrapped into one turn to keep the float well
//! conditioned). Yaw is written to the body's rotation-Y and pitch to the
//! head's rotation-X, never both to the same transform, so roll stays zero.

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

use crate::{
    CharacterController, CharacterHead,
    config::CharacterConfig,
    input::CharacterAction,
};

/// Maximum pitch magnitude: 85° in radians.
pub const PITCH_LIMIT: f32 = 85.0 * (PI / 180.0);

/// Apply one pointer-motion delta to a pitch/yaw pair.
///
/// Positive `delta.y` (pointer moved down) lowers pitch; the result is
/// clamped to ±[`PITCH_LIMIT`]. Yaw is unclamped but wrapped into one turn.
pub(crate) fn apply_look_delta(pitch: f32, yaw: f32, delta: Vec2, sensitivity: f32) -> (f32, f32) {
    let pitch = (pitch - delta.y * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    let mut yaw = yaw - delta.x * sensitivity;
    if yaw.abs() > PI {
        yaw = yaw.rem_euclid(TAU);
    }
    (pitch, yaw)
}

/// Consume pointer-motion input and rotate the body and head.
///
/// Gated by pointer capture at the schedule level; when the cursor is not
/// grabbed this system does not run and the look state is untouched.
pub fn character_look(
    mut body_query: Query<
        (
            &CharacterConfig,
            &mut CharacterController,
            &ActionState<CharacterAction>,
            &mut Transform,
        ),
        Without<CharacterHead>,
    >,
    mut head_query: Query<&mut Transform, With<CharacterHead>>,
) {
    for (config, mut controller, action_state, mut transform) in &mut body_query {
        let delta = action_state.axis_pair(&CharacterAction::Look);
        if delta == Vec2::ZERO {
            continue;
        }

        let (pitch, yaw) =
            apply_look_delta(controller.pitch, controller.yaw, delta, config.look_sensitivity);
        controller.pitch = pitch;
        controller.yaw = yaw;

        transform.rotation = Quat::from_rotation_y(yaw);
        if let Ok(mut head_transform) = head_query.get_mut(controller.head) {
            head_transform.rotation = Quat::from_rotation_x(pitch);
        }
    }
}

/// Initialize look angles from the ambient transforms.
///
/// Runs once per controller (on add), reading yaw from the body and pitch
/// from the head so the look model matches however the surrounding
/// application oriented the character before handing it over.
pub fn init_look_from_transforms(
    mut body_query: Query<(&mut CharacterController, &Transform), Added<CharacterController>>,
    head_query: Query<&Transform, With<CharacterHead>>,
) {
    for (mut controller, transform) in &mut body_query {
        let (yaw, _, _) = transform.rotation.to_euler(EulerRot::YXZ);
        controller.yaw = yaw;

        if let Ok(head_transform) = head_query.get(controller.head) {
            let (_, pitch, _) = head_transform.rotation.to_euler(EulerRot::YXZ);
            controller.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENSITIVITY: f32 = 0.002;

    #[test]
    fn test_pitch_clamped_for_any_delta_sequence() {
        let deltas = [
            Vec2::new(3.0, -500.0),
            Vec2::new(-40.0, 12.5),
            Vec2::new(0.0, 100_000.0),
            Vec2::new(7.0, -0.25),
            Vec2::new(0.0, -100_000.0),
        ];

        let mut pitch = 0.3;
        let mut yaw = 0.0;
        for delta in deltas {
            (pitch, yaw) = apply_look_delta(pitch, yaw, delta, SENSITIVITY);
            assert!(pitch >= -PITCH_LIMIT && pitch <= PITCH_LIMIT);
        }
    }

    #[test]
    fn test_pointer_down_lowers_pitch() {
        let (pitch, _) = apply_look_delta(0.0, 0.0, Vec2::new(0.0, 10.0), SENSITIVITY);
        assert!(pitch < 0.0);
        assert!((pitch - (-10.0 * SENSITIVITY)).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_right_lowers_yaw() {
        let (_, yaw) = apply_look_delta(0.0, 0.0, Vec2::new(10.0, 0.0), SENSITIVITY);
        assert!((yaw - (-10.0 * SENSITIVITY)).abs() < 1e-6);
    }

    #[test]
    fn test_yaw_wraps_into_one_turn() {
        let mut yaw = 0.0;
        for _ in 0..10_000 {
            (_, yaw) = apply_look_delta(0.0, yaw, Vec2::new(-100.0, 0.0), SENSITIVITY);
        }
        assert!(yaw.abs() <= TAU);
    }

    #[test]
    fn test_zero_sensitivity_is_inert() {
        let (pitch, yaw) = apply_look_delta(0.1, 0.2, Vec2::new(500.0, -500.0), 0.0);
        assert_eq!(pitch, 0.1);
        assert_eq!(yaw, 0.2);
    }
}
