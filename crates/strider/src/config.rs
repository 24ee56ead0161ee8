//! Controller configuration: capability flags, speeds, and input bindings.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// Bindings
// ============================================================================

/// Per-action key bindings for the controller.
///
/// `None` models a binding that is absent from the host application's input
/// table. [`validate_bindings`] disables any capability whose required
/// bindings are missing instead of failing; the look axis and the pointer
/// grab/release controls are fixed (mouse motion, left-click, Escape) and
/// are not part of this table.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterBindings {
    /// Move forward.
    pub forward: Option<KeyCode>,
    /// Move backward.
    pub back: Option<KeyCode>,
    /// Strafe left.
    pub left: Option<KeyCode>,
    /// Strafe right.
    pub right: Option<KeyCode>,
    /// Jump.
    pub jump: Option<KeyCode>,
    /// Sprint (held).
    pub sprint: Option<KeyCode>,
    /// Toggle freefly mode (edge).
    pub freefly: Option<KeyCode>,
}

impl Default for CharacterBindings {
    fn default() -> Self {
        Self {
            forward: Some(KeyCode::KeyW),
            back: Some(KeyCode::KeyS),
            left: Some(KeyCode::KeyA),
            right: Some(KeyCode::KeyD),
            jump: Some(KeyCode::Space),
            sprint: Some(KeyCode::ShiftLeft),
            freefly: Some(KeyCode::KeyF),
        }
    }
}

impl CharacterBindings {
    /// Names of the directional bindings that are missing, if any.
    pub(crate) fn missing_directional(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.forward.is_none() {
            missing.push("forward");
        }
        if self.back.is_none() {
            missing.push("back");
        }
        if self.left.is_none() {
            missing.push("left");
        }
        if self.right.is_none() {
            missing.push("right");
        }
        missing
    }
}

// ============================================================================
// Config
// ============================================================================

/// Character controller configuration.
///
/// Fixed at spawn and validated once by [`validate_bindings`]. Capability
/// flags are plain runtime switches read each step; disabling one makes the
/// corresponding input ignored regardless of binding validity.
#[derive(Component, Reflect, Clone, Debug, Serialize, Deserialize)]
#[reflect(Component)]
pub struct CharacterConfig {
    /// Respond to directional movement input.
    pub can_move: bool,
    /// Respond to the jump action.
    pub can_jump: bool,
    /// Respond to the sprint action.
    pub can_sprint: bool,
    /// Respond to the freefly toggle.
    pub can_freefly: bool,
    /// Integrate the ambient gravity vector while airborne.
    pub has_gravity: bool,
    /// Look rotation in radians per device unit of pointer motion.
    pub look_sensitivity: f32,
    /// Walking speed in m/s.
    pub base_speed: f32,
    /// Speed while sprint is held, in m/s.
    pub sprint_speed: f32,
    /// Flight speed in freefly mode, in m/s.
    pub freefly_speed: f32,
    /// Vertical launch speed of a jump, in m/s.
    pub jump_speed: f32,
    /// Key bindings for the logical movement actions.
    pub bindings: CharacterBindings,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            can_move: true,
            can_jump: true,
            can_sprint: true,
            can_freefly: true,
            has_gravity: true,
            look_sensitivity: 0.002,
            base_speed: 7.0,
            sprint_speed: 10.0,
            freefly_speed: 25.0,
            jump_speed: 4.5,
            bindings: CharacterBindings::default(),
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validate newly added controller configs.
///
/// For every enabled capability, checks that its required bindings exist and
/// disables the capability with a diagnostic when they do not. Non-finite or
/// negative scalar options are clamped to zero. Never aborts initialization.
pub fn validate_bindings(mut query: Query<(Entity, &mut CharacterConfig), Added<CharacterConfig>>) {
    for (entity, mut config) in &mut query {
        if config.can_move {
            let missing = config.bindings.missing_directional();
            if !missing.is_empty() {
                config.can_move = false;
                tracing::warn!(
                    ?entity,
                    ?missing,
                    "directional bindings missing; disabling movement"
                );
            }
        }
        if config.can_jump && config.bindings.jump.is_none() {
            config.can_jump = false;
            tracing::warn!(?entity, "jump binding missing; disabling jumping");
        }
        if config.can_sprint && config.bindings.sprint.is_none() {
            config.can_sprint = false;
            tracing::warn!(?entity, "sprint binding missing; disabling sprinting");
        }
        if config.can_freefly && config.bindings.freefly.is_none() {
            config.can_freefly = false;
            tracing::warn!(?entity, "freefly binding missing; disabling freefly");
        }

        sanitize_scalars(entity, &mut config);
    }
}

/// Clamp non-finite or negative scalar options to zero.
fn sanitize_scalars(entity: Entity, config: &mut CharacterConfig) {
    let scalars = [
        ("look_sensitivity", &mut config.look_sensitivity),
        ("base_speed", &mut config.base_speed),
        ("sprint_speed", &mut config.sprint_speed),
        ("freefly_speed", &mut config.freefly_speed),
        ("jump_speed", &mut config.jump_speed),
    ];
    for (name, value) in scalars {
        if !value.is_finite() || *value < 0.0 {
            tracing::warn!(
                ?entity,
                option = name,
                value = *value,
                "invalid option value; clamping to zero"
            );
            *value = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_validation(config: CharacterConfig) -> CharacterConfig {
        let mut app = App::new();
        app.add_systems(Update, validate_bindings);
        let entity = app.world_mut().spawn(config).id();
        app.update();
        app.world().get::<CharacterConfig>(entity).unwrap().clone()
    }

    #[test]
    fn test_missing_jump_binding_disables_jumping_only() {
        let config = run_validation(CharacterConfig {
            bindings: CharacterBindings {
                jump: None,
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!config.can_jump);
        assert!(config.can_move);
        assert!(config.can_sprint);
        assert!(config.can_freefly);
    }

    #[test]
    fn test_missing_directional_binding_disables_movement() {
        let config = run_validation(CharacterConfig {
            bindings: CharacterBindings {
                left: None,
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!config.can_move);
        assert!(config.can_jump);
    }

    #[test]
    fn test_disabled_capability_ignores_missing_binding() {
        let config = run_validation(CharacterConfig {
            can_freefly: false,
            bindings: CharacterBindings {
                freefly: None,
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!config.can_freefly);
        assert!(config.can_move);
    }

    #[test]
    fn test_negative_speed_clamped_to_zero() {
        let config = run_validation(CharacterConfig {
            base_speed: -3.0,
            jump_speed: f32::NAN,
            ..Default::default()
        });

        assert_eq!(config.base_speed, 0.0);
        assert_eq!(config.jump_speed, 0.0);
        assert_eq!(config.sprint_speed, 10.0);
    }

    #[test]
    fn test_valid_config_untouched() {
        let config = run_validation(CharacterConfig::default());

        assert!(config.can_move && config.can_jump && config.can_sprint && config.can_freefly);
        assert_eq!(config.base_speed, 7.0);
    }
}
