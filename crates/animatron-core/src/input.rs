//! Controller input
//!
//! Raw controller indicators are signed, unbounded floats. They are turned
//! into one magnitude in `0..=1` per logical axis direction, after
//! sensitivity scaling and a deadzone.

use crate::Controller;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// A logical axis direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    RollClockwise,
    RollCounterclockwise,
    PitchUp,
    PitchDown,
    YawLeft,
    YawRight,
}

impl Axis {
    pub const ALL: [Axis; 12] = [
        Axis::Forward,
        Axis::Backward,
        Axis::Left,
        Axis::Right,
        Axis::Up,
        Axis::Down,
        Axis::RollClockwise,
        Axis::RollCounterclockwise,
        Axis::PitchUp,
        Axis::PitchDown,
        Axis::YawLeft,
        Axis::YawRight,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Indicators as reported by a controller for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    /// x = right, y = up, z = backward
    pub move_indicator: Vec3,
    /// x = pitch (positive down), y = yaw (positive right)
    pub rotation_indicator: Vec2,
    /// Positive clockwise
    pub roll_indicator: f32,
}

impl RawInput {
    /// Read the current indicators of a controller
    pub fn from_controller(controller: &dyn Controller) -> Self {
        Self {
            move_indicator: controller.move_indicator(),
            rotation_indicator: controller.rotation_indicator(),
            roll_indicator: controller.roll_indicator(),
        }
    }

    /// Signed raw component for an axis direction; positive means "towards `axis`"
    fn component(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Forward => -self.move_indicator.z,
            Axis::Backward => self.move_indicator.z,
            Axis::Left => -self.move_indicator.x,
            Axis::Right => self.move_indicator.x,
            Axis::Up => self.move_indicator.y,
            Axis::Down => -self.move_indicator.y,
            Axis::RollClockwise => self.roll_indicator,
            Axis::RollCounterclockwise => -self.roll_indicator,
            Axis::PitchUp => -self.rotation_indicator.x,
            Axis::PitchDown => self.rotation_indicator.x,
            Axis::YawLeft => -self.rotation_indicator.y,
            Axis::YawRight => self.rotation_indicator.y,
        }
    }
}

/// Input tuning read from the `[animation]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSettings {
    /// Magnitudes below this percentage read as zero
    pub deadzone_percentage: f32,
    /// Grow sensitivities to the largest raw value observed
    pub automatic_sensitivity: bool,
    pub move_sensitivity: Vec3,
    pub rotation_sensitivity: Vec2,
    pub roll_sensitivity: f32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            deadzone_percentage: 10.0,
            automatic_sensitivity: true,
            move_sensitivity: Vec3::ONE,
            rotation_sensitivity: Vec2::splat(9.0),
            roll_sensitivity: 1.0,
        }
    }
}

/// Per-axis magnitudes for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerInput {
    magnitudes: [f32; 12],
}

impl ControllerInput {
    /// No input on any axis
    pub fn idle() -> Self {
        Self::default()
    }

    /// Builder: set one axis magnitude, clamped to `0..=1`
    pub fn with(mut self, axis: Axis, magnitude: f32) -> Self {
        self.magnitudes[axis.index()] = magnitude.clamp(0.0, 1.0);
        self
    }

    pub fn magnitude(&self, axis: Axis) -> f32 {
        self.magnitudes[axis.index()]
    }

    /// Check if every axis reads zero
    pub fn is_idle(&self) -> bool {
        self.magnitudes.iter().all(|magnitude| *magnitude == 0.0)
    }
}

/// Turns raw indicators into magnitudes, remembering learned sensitivities
#[derive(Debug, Clone, PartialEq)]
pub struct InputCalibration {
    settings: InputSettings,
}

impl InputCalibration {
    /// Create a calibration starting from configured sensitivities
    pub fn new(settings: InputSettings) -> Self {
        Self { settings }
    }

    /// Current (possibly learned) settings
    pub fn settings(&self) -> &InputSettings {
        &self.settings
    }

    /// Derive this tick's magnitudes
    pub fn read(&mut self, raw: &RawInput) -> ControllerInput {
        if self.settings.automatic_sensitivity {
            let settings = &mut self.settings;
            settings.move_sensitivity = settings.move_sensitivity.max(raw.move_indicator.abs());
            settings.rotation_sensitivity =
                settings.rotation_sensitivity.max(raw.rotation_indicator.abs());
            settings.roll_sensitivity = settings.roll_sensitivity.max(raw.roll_indicator.abs());
        }

        let mut input = ControllerInput::idle();
        for axis in Axis::ALL {
            let sensitivity = self.sensitivity(axis);
            let component = raw.component(axis);
            if component <= 0.0 || sensitivity <= 0.0 {
                continue;
            }
            let magnitude = (component / sensitivity).clamp(0.0, 1.0);
            if magnitude * 100.0 >= self.settings.deadzone_percentage {
                input = input.with(axis, magnitude);
            }
        }
        input
    }

    fn sensitivity(&self, axis: Axis) -> f32 {
        let settings = &self.settings;
        match axis {
            Axis::Forward | Axis::Backward => settings.move_sensitivity.z,
            Axis::Left | Axis::Right => settings.move_sensitivity.x,
            Axis::Up | Axis::Down => settings.move_sensitivity.y,
            Axis::RollClockwise | Axis::RollCounterclockwise => settings.roll_sensitivity,
            Axis::PitchUp | Axis::PitchDown => settings.rotation_sensitivity.x,
            Axis::YawLeft | Axis::YawRight => settings.rotation_sensitivity.y,
        }
    }
}

impl Default for InputCalibration {
    fn default() -> Self {
        Self::new(InputSettings::default())
    }
}
