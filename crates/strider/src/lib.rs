//! First-person character locomotion controller for Bevy with Avian physics.
//!
//! Translates pointer motion and action input into a character's orientation
//! and velocity each fixed simulation step. The controller drives a dynamic
//! Avian body and has two mutually exclusive locomotion modes:
//!
//! - **Grounded**: walking, sprinting, and jumping with gravity and collision
//!   response, driven through the body's [`LinearVelocity`].
//! - **Freefly**: unconstrained flight following the head orientation, with
//!   the collision shape disabled.
//!
//! Yaw lives on the body transform's rotation-Y and pitch on a child head
//! entity's rotation-X, so roll is always zero on both. Look input is gated
//! by pointer capture (left-click grabs, Escape releases); movement input is
//! not.
//!
//! ```no_run
//! use avian3d::prelude::*;
//! use bevy::prelude::*;
//! use strider::{CharacterConfig, CharacterControllerPlugin, spawn_character};
//!
//! fn setup(mut commands: Commands) {
//!     spawn_character(
//!         &mut commands,
//!         CharacterConfig::default(),
//!         Transform::from_xyz(0.0, 2.0, 0.0),
//!     );
//! }
//!
//! App::new()
//!     .add_plugins((
//!         DefaultPlugins,
//!         PhysicsPlugins::default(),
//!         CharacterControllerPlugin,
//!     ))
//!     .add_systems(Startup, setup)
//!     .run();
//! ```

use avian3d::prelude::*;
use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

pub mod config;
pub mod input;
pub mod look;
pub mod movement;

pub use config::{CharacterBindings, CharacterConfig};
pub use input::{
    CharacterAction, CharacterInput, cursor_is_grabbed, input_map_from_config, set_cursor_grab,
};
pub use movement::LocomotionMode;

// ============================================================================
// Constants
// ============================================================================

/// Radius of the character's capsule collider in meters.
pub const CAPSULE_RADIUS: f32 = 0.35;

/// Length of the capsule's cylindrical section in meters.
///
/// Total character height is `CAPSULE_LENGTH + 2.0 * CAPSULE_RADIUS`.
pub const CAPSULE_LENGTH: f32 = 1.1;

/// Head offset above the body center in meters.
pub const EYE_HEIGHT: f32 = 0.7;

// ============================================================================
// Components
// ============================================================================

/// First-person controller state.
///
/// Owns the accumulated look angles and the locomotion mode, and carries the
/// injected head entity whose rotation-X receives pitch (the body transform's
/// rotation-Y receives yaw).
#[derive(Component)]
pub struct CharacterController {
    /// Child entity carrying the head/camera transform.
    pub head: Entity,
    /// Accumulated look pitch in radians, clamped to ±85°.
    pub pitch: f32,
    /// Accumulated look yaw in radians. Wraps are acceptable.
    pub yaw: f32,
    /// Current locomotion mode. Transitions only on the freefly toggle edge.
    pub mode: LocomotionMode,
}

impl CharacterController {
    /// Create a controller driving the given head entity.
    ///
    /// Look angles start at zero and are re-read from the body and head
    /// transforms when the controller is first seen, so a body spawned with a
    /// pre-rotated transform keeps its orientation.
    #[must_use]
    pub fn new(head: Entity) -> Self {
        Self {
            head,
            pitch: 0.0,
            yaw: 0.0,
            mode: LocomotionMode::Grounded,
        }
    }
}

/// Marker component for a character's head entity.
#[derive(Component)]
pub struct CharacterHead;

// ============================================================================
// Plugin
// ============================================================================

/// Plugin wiring the controller systems into the Bevy schedule.
///
/// Input gathering and look rotation run at render rate immediately before
/// the fixed main loop, so every fixed tick computes movement from the latest
/// look orientation. The locomotion step runs in [`FixedPreUpdate`], ahead of
/// the Avian physics step that consumes the velocity it writes.
pub struct CharacterControllerPlugin;

impl Plugin for CharacterControllerPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(InputManagerPlugin::<CharacterAction>::default())
            .register_type::<CharacterConfig>()
            .add_systems(
                Update,
                (config::validate_bindings, input::cursor_grab_system),
            )
            .add_systems(
                RunFixedMainLoop,
                (
                    input::gather_input,
                    look::init_look_from_transforms,
                    look::character_look.run_if(cursor_is_grabbed),
                )
                    .chain()
                    .in_set(RunFixedMainLoopSystems::BeforeFixedMainLoop),
            )
            .add_systems(FixedPreUpdate, movement::locomotion_step)
            .add_systems(PostUpdate, input::release_cursor_on_removal);
    }
}

// ============================================================================
// Spawning
// ============================================================================

/// Spawn a character body with its head child and all physics components.
///
/// The body is a dynamic Avian rigid body with locked rotation and a capsule
/// collider. Gravity scale is zero: the controller integrates the ambient
/// [`Gravity`] vector itself, only while airborne. Returns the body entity;
/// the head entity is reachable through [`CharacterController::head`].
pub fn spawn_character(
    commands: &mut Commands,
    config: CharacterConfig,
    transform: Transform,
) -> Entity {
    let input_map = input::input_map_from_config(&config);

    let head = commands
        .spawn((
            CharacterHead,
            Transform::from_translation(Vec3::Y * EYE_HEIGHT),
        ))
        .id();

    let body = commands
        .spawn((
            config,
            CharacterController::new(head),
            CharacterInput::default(),
            input_map,
            ActionState::<CharacterAction>::default(),
            transform,
            RigidBody::Dynamic,
            Collider::capsule(CAPSULE_RADIUS, CAPSULE_LENGTH),
            LinearVelocity::default(),
            LockedAxes::ROTATION_LOCKED,
            GravityScale(0.0),
        ))
        .id();

    commands.entity(body).add_child(head);
    body
}
