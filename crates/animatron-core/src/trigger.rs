//! Trigger evaluation
//!
//! Triggers are named predicates over the invocation argument and the
//! controller input. Each evaluates to a magnitude in `0..=1` rather than a
//! boolean, so a [`crate::step::ShiftStep`] can scale its velocity with how
//! hard the pilot pushes.

use crate::input::{Axis, ControllerInput};
use crate::{Error, Result};
use std::fmt;

const ARGUMENT_PREFIX: &str = "ARGUMENT_";

/// Single-direction triggers
const AXIS_TRIGGERS: &[(&str, Axis)] = &[
    ("CONTROLLER_FORWARD", Axis::Forward),
    ("CONTROLLER_BACKWARD", Axis::Backward),
    ("CONTROLLER_LEFT", Axis::Left),
    ("CONTROLLER_RIGHT", Axis::Right),
    ("CONTROLLER_UP", Axis::Up),
    ("CONTROLLER_DOWN", Axis::Down),
    ("CONTROLLER_ROLL_CLOCKWISE", Axis::RollClockwise),
    ("CONTROLLER_ROLL_COUNTERCLOCKWISE", Axis::RollCounterclockwise),
    ("CONTROLLER_PITCH_UP", Axis::PitchUp),
    ("CONTROLLER_PITCH_DOWN", Axis::PitchDown),
    ("CONTROLLER_YAW_LEFT", Axis::YawLeft),
    ("CONTROLLER_YAW_RIGHT", Axis::YawRight),
];

/// "No input on this axis" triggers
const NEITHER_TRIGGERS: &[(&str, Axis, Axis)] = &[
    (
        "CONTROLLER_NEITHER_FORWARD_NOR_BACKWARD",
        Axis::Forward,
        Axis::Backward,
    ),
    ("CONTROLLER_NEITHER_LEFT_NOR_RIGHT", Axis::Left, Axis::Right),
    ("CONTROLLER_NEITHER_UP_NOR_DOWN", Axis::Up, Axis::Down),
    (
        "CONTROLLER_NEITHER_ROLL_CLOCKWISE_NOR_COUNTERCLOCKWISE",
        Axis::RollClockwise,
        Axis::RollCounterclockwise,
    ),
    (
        "CONTROLLER_NEITHER_PITCH_UP_NOR_DOWN",
        Axis::PitchUp,
        Axis::PitchDown,
    ),
    (
        "CONTROLLER_NEITHER_YAW_LEFT_NOR_RIGHT",
        Axis::YawLeft,
        Axis::YawRight,
    ),
];

/// A compiled trigger
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// `NONE`: never fires
    Never,
    /// `ARGUMENT_<X>`: fires when the invocation argument is exactly X
    Argument(String),
    /// `CONTROLLER_NO_INPUT`: fires while every axis reads zero
    NoInput,
    /// Fires with the magnitude of one axis direction
    Axis(Axis),
    /// Fires while both directions of an axis read zero
    Neither(Axis, Axis),
}

impl Trigger {
    /// Compile a trigger name (case-sensitive)
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if let Some(argument) = name.strip_prefix(ARGUMENT_PREFIX) {
            return Ok(Trigger::Argument(argument.to_string()));
        }
        match name {
            "NONE" => return Ok(Trigger::Never),
            "CONTROLLER_NO_INPUT" => return Ok(Trigger::NoInput),
            _ => {}
        }
        if let Some((_, axis)) = AXIS_TRIGGERS.iter().find(|(token, _)| *token == name) {
            return Ok(Trigger::Axis(*axis));
        }
        if let Some((_, first, second)) =
            NEITHER_TRIGGERS.iter().find(|(token, _, _)| *token == name)
        {
            return Ok(Trigger::Neither(*first, *second));
        }
        Err(Error::UnknownTrigger(name.to_string()))
    }

    /// Evaluate to a magnitude in `0..=1`
    pub fn magnitude(&self, argument: &str, input: &ControllerInput) -> f32 {
        match self {
            Trigger::Never => 0.0,
            Trigger::Argument(expected) => flag(argument == expected),
            Trigger::NoInput => flag(input.is_idle()),
            Trigger::Axis(axis) => input.magnitude(*axis),
            Trigger::Neither(first, second) => {
                flag(input.magnitude(*first) == 0.0 && input.magnitude(*second) == 0.0)
            }
        }
    }

    pub fn is_active(&self, argument: &str, input: &ControllerInput) -> bool {
        self.magnitude(argument, input) > 0.0
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Never => f.write_str("NONE"),
            Trigger::Argument(argument) => write!(f, "{ARGUMENT_PREFIX}{argument}"),
            Trigger::NoInput => f.write_str("CONTROLLER_NO_INPUT"),
            Trigger::Axis(axis) => {
                let token = AXIS_TRIGGERS
                    .iter()
                    .find(|(_, candidate)| candidate == axis)
                    .map(|(token, _)| *token)
                    .unwrap_or_default();
                f.write_str(token)
            }
            Trigger::Neither(first, second) => {
                let token = NEITHER_TRIGGERS
                    .iter()
                    .find(|(_, a, b)| a == first && b == second)
                    .map(|(token, _, _)| *token)
                    .unwrap_or_default();
                f.write_str(token)
            }
        }
    }
}

/// AND-combined triggers of a mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerSet(Vec<Trigger>);

impl TriggerSet {
    /// Compile a comma-separated trigger list; empty entries are skipped
    pub fn parse(list: &str) -> Result<Self> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Trigger::parse)
            .collect::<Result<Vec<_>>>()
            .map(TriggerSet)
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every trigger fires at once
    pub fn is_satisfied(&self, argument: &str, input: &ControllerInput) -> bool {
        self.0
            .iter()
            .all(|trigger| trigger.is_active(argument, input))
    }
}
