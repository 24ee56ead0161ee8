//! Input actions, bindings, and pointer-capture handling.
//!
//! Logical actions are defined with `leafwing-input-manager`; the per-entity
//! input map is built from [`CharacterConfig`] bindings so missing bindings
//! simply produce no input. Pointer capture is process-wide window state and
//! is queried and written through [`CursorOptions`] rather than cached on the
//! controller.

use bevy::{
    prelude::*,
    window::{CursorGrabMode, CursorOptions, PrimaryWindow},
};
use leafwing_input_manager::prelude::*;

use crate::{CharacterController, config::CharacterConfig};

// ============================================================================
// Actions
// ============================================================================

/// Logical actions for character control.
#[derive(Actionlike, PartialEq, Eq, Hash, Clone, Copy, Debug, Reflect)]
pub enum CharacterAction {
    /// Directional movement (forward/back/strafe).
    #[actionlike(DualAxis)]
    Move,
    /// Pointer look (yaw/pitch).
    #[actionlike(DualAxis)]
    Look,
    /// Jump (edge-triggered).
    Jump,
    /// Sprint (held).
    Sprint,
    /// Toggle freefly mode (edge-triggered).
    ToggleFreefly,
    /// Grab the pointer (left click when ungrabbed).
    GrabCursor,
    /// Release the pointer (Escape).
    ReleaseCursor,
}

/// Build an input map from the config's bindings.
///
/// The movement dual-axis is only mapped when all four directional bindings
/// exist; partial direction sets are treated as missing (the validation pass
/// disables movement for them anyway).
pub fn input_map_from_config(config: &CharacterConfig) -> InputMap<CharacterAction> {
    let bindings = &config.bindings;

    let mut map = InputMap::default()
        .with_dual_axis(CharacterAction::Look, MouseMove::default())
        .with(CharacterAction::GrabCursor, MouseButton::Left)
        .with(CharacterAction::ReleaseCursor, KeyCode::Escape);

    if let (Some(forward), Some(back), Some(left), Some(right)) = (
        bindings.forward,
        bindings.back,
        bindings.left,
        bindings.right,
    ) {
        map = map.with_dual_axis(
            CharacterAction::Move,
            VirtualDPad::new(forward, back, left, right),
        );
    }
    if let Some(jump) = bindings.jump {
        map = map.with(CharacterAction::Jump, jump);
    }
    if let Some(sprint) = bindings.sprint {
        map = map.with(CharacterAction::Sprint, sprint);
    }
    if let Some(freefly) = bindings.freefly {
        map = map.with(CharacterAction::ToggleFreefly, freefly);
    }
    map
}

// ============================================================================
// Per-tick input accumulation
// ============================================================================

/// Accumulated input for the next fixed tick.
///
/// Written at render rate immediately before the fixed main loop. Held state
/// (`movement`, `sprint`) is overwritten each frame; press edges accumulate
/// with `|=` so a press on a frame without a fixed tick is not lost. The
/// locomotion step takes the edges, so each press fires exactly once even
/// when several fixed ticks run in one frame.
#[derive(Component, Default)]
pub struct CharacterInput {
    /// Directional input: x strafes right, y moves forward.
    pub movement: Vec2,
    /// Sprint action held.
    pub sprint: bool,
    /// Pending jump press edge.
    pub jump: bool,
    /// Pending freefly toggle press edge.
    pub toggle_freefly: bool,
}

/// Gather action state into the per-tick input accumulator.
pub fn gather_input(mut query: Query<(&ActionState<CharacterAction>, &mut CharacterInput)>) {
    for (action_state, mut input) in &mut query {
        input.movement = action_state.clamped_axis_pair(&CharacterAction::Move);
        input.sprint = action_state.pressed(&CharacterAction::Sprint);
        input.jump |= action_state.just_pressed(&CharacterAction::Jump);
        input.toggle_freefly |= action_state.just_pressed(&CharacterAction::ToggleFreefly);
    }
}

// ============================================================================
// Pointer capture
// ============================================================================

/// Run condition: the pointer is captured.
pub fn cursor_is_grabbed(cursor: Single<&CursorOptions>) -> bool {
    matches!(
        cursor.grab_mode,
        CursorGrabMode::Locked | CursorGrabMode::Confined
    )
}

/// Set pointer capture, centering the cursor when grabbing.
pub fn set_cursor_grab(cursor: &mut CursorOptions, window: &mut Window, grabbed: bool) {
    if grabbed {
        // Native: Locked for true capture. WASM: Confined (Locked is not
        // supported in browsers).
        #[cfg(not(target_family = "wasm"))]
        {
            cursor.grab_mode = CursorGrabMode::Locked;
        }
        #[cfg(target_family = "wasm")]
        {
            cursor.grab_mode = CursorGrabMode::Confined;
        }
        cursor.visible = false;
        let center = Vec2::new(window.width() / 2.0, window.height() / 2.0);
        window.set_cursor_position(Some(center));
    } else {
        cursor.grab_mode = CursorGrabMode::None;
        cursor.visible = true;
    }
}

/// Handle pointer grab/release with left-click and Escape.
///
/// Grabbing and releasing are state-checked rather than toggled, so a click
/// while already captured or an Escape while already released is a no-op.
pub fn cursor_grab_system(
    action_query: Query<&ActionState<CharacterAction>>,
    mut cursor: Single<&mut CursorOptions>,
    mut window: Single<&mut Window, With<PrimaryWindow>>,
) {
    let grabbed = matches!(
        cursor.grab_mode,
        CursorGrabMode::Locked | CursorGrabMode::Confined
    );

    for action_state in &action_query {
        if grabbed && action_state.just_pressed(&CharacterAction::ReleaseCursor) {
            set_cursor_grab(&mut cursor, &mut window, false);
            return;
        }
        if !grabbed && action_state.just_pressed(&CharacterAction::GrabCursor) {
            set_cursor_grab(&mut cursor, &mut window, true);
            return;
        }
    }
}

/// Release the pointer when the last controller is removed.
///
/// Capture is process-wide state; tearing down the controller must not leave
/// the application with a hidden, locked cursor.
pub fn release_cursor_on_removal(
    mut removed: RemovedComponents<CharacterController>,
    remaining: Query<(), With<CharacterController>>,
    cursor: Option<Single<&mut CursorOptions>>,
    window: Option<Single<&mut Window, With<PrimaryWindow>>>,
) {
    if removed.read().next().is_none() || !remaining.is_empty() {
        return;
    }
    if let (Some(mut cursor), Some(mut window)) = (cursor, window) {
        set_cursor_grab(&mut cursor, &mut window, false);
    }
}
