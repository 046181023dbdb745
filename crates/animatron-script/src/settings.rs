//! Typed view of the `[animation]` control section

use animatron_core::{ConfigStore, InputSettings};
use serde::{Deserialize, Serialize};

/// Name of the control section; every other section is `segment.mode`
pub const CONTROL_SECTION: &str = "animation";

/// Program-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Blocks whose custom data holds further configuration
    pub definitions: Vec<String>,
    /// Status surface block, the program's own surface if unset
    pub surface: Option<String>,
    /// Controller block, discovered if unset
    pub controller: Option<String>,
    pub input: InputSettings,
}

impl Settings {
    /// Read settings, falling back to defaults for anything missing
    pub fn from_config(config: &ConfigStore) -> Self {
        let defaults = InputSettings::default();
        let named = |key: &str| {
            config
                .get(CONTROL_SECTION, key)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        };

        Self {
            definitions: definitions(config),
            surface: named("surface"),
            controller: named("controller"),
            input: InputSettings {
                deadzone_percentage: config.get_f32(
                    CONTROL_SECTION,
                    "controllerDeadzonePercentage",
                    defaults.deadzone_percentage,
                ),
                automatic_sensitivity: config.get_bool(
                    CONTROL_SECTION,
                    "automaticallyDetermineInputSensitivity",
                    defaults.automatic_sensitivity,
                ),
                move_sensitivity: config.get_vec3(
                    CONTROL_SECTION,
                    "moveIndicatorSensitivity",
                    defaults.move_sensitivity,
                ),
                rotation_sensitivity: config.get_vec2(
                    CONTROL_SECTION,
                    "rotationSensitivity",
                    defaults.rotation_sensitivity,
                ),
                roll_sensitivity: config.get_f32(
                    CONTROL_SECTION,
                    "rollSensitivity",
                    defaults.roll_sensitivity,
                ),
            },
        }
    }
}

/// Block names listed under `definitions`, one per line
pub fn definitions(config: &ConfigStore) -> Vec<String> {
    config.get_list(CONTROL_SECTION, "definitions", '\n')
}
