//! Animation steps
//!
//! A step is one instruction within a mode. Step lines are parsed once at
//! setup: block references are resolved and inherited fields are filled in,
//! so the runtime only ever sees complete steps.
//!
//! Every step answers two questions each tick:
//! - [`Step::is_completed`]: may the sequencer move past this step?
//! - [`Step::apply`]: perform the step's effect when it becomes active.

use crate::input::ControllerInput;
use crate::search::{find_blocks, find_mechanical, SearchKind};
use crate::token::{parse_bool, parse_number, parse_token, split_fields, Token};
use crate::trigger::Trigger;
use crate::{BlockDirectory, BlockRef, Capability, Error, Mechanical, ProgressTable, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the sequencer waits for a step to physically finish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Continuity {
    /// Advance on the next tick regardless of progress
    Continue,
    /// Hold until the step reports completion
    Wait,
}

impl Token for Continuity {
    const KIND: &'static str = "continuity type";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("Continue", Continuity::Continue),
        ("Wait", Continuity::Wait),
    ];
}

impl fmt::Display for Continuity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Step type tag, the first field of a step line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    Move,
    Shift,
    Toggle,
    Lock,
    Trigger,
}

impl Token for StepKind {
    const KIND: &'static str = "step type";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("Move", StepKind::Move),
        ("Shift", StepKind::Shift),
        ("Toggle", StepKind::Toggle),
        ("Lock", StepKind::Lock),
        ("Trigger", StepKind::Trigger),
    ];
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// What a step can see while it is evaluated
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Invocation argument of the current tick
    pub argument: &'a str,
    /// Controller magnitudes of the current tick
    pub input: &'a ControllerInput,
}

impl<'a> StepContext<'a> {
    pub fn new(argument: &'a str, input: &'a ControllerInput) -> Self {
        Self { argument, input }
    }
}

/// One instruction within a mode
#[derive(Debug, Clone)]
pub enum Step {
    Move(MoveStep),
    Shift(ShiftStep),
    Toggle(ToggleStep),
    Lock(LockStep),
    Trigger(TriggerStep),
}

impl Step {
    /// Parse a step line, resolving its blocks through `directory`.
    ///
    /// `previous` is the step parsed just before this one in the same mode,
    /// used to fill in empty Move fields.
    pub fn parse(
        line: &str,
        directory: &dyn BlockDirectory,
        previous: Option<&Step>,
    ) -> Result<Self> {
        let tag = line.split(';').next().unwrap_or_default();
        let kind: StepKind = parse_token(tag, line)?;

        let step = match kind {
            StepKind::Move => {
                let previous = match previous {
                    Some(Step::Move(step)) => Some(step),
                    _ => None,
                };
                Step::Move(MoveStep::parse(line, directory, previous)?)
            }
            StepKind::Shift => Step::Shift(ShiftStep::parse(line, directory)?),
            StepKind::Toggle => Step::Toggle(ToggleStep::parse(line, directory)?),
            StepKind::Lock => Step::Lock(LockStep::parse(line, directory)?),
            StepKind::Trigger => Step::Trigger(TriggerStep::parse(line)?),
        };
        Ok(step)
    }

    /// Parse consecutive step lines, chaining each to the one before it
    pub fn parse_all<'l>(
        lines: impl IntoIterator<Item = &'l str>,
        directory: &dyn BlockDirectory,
    ) -> Result<Vec<Step>> {
        let mut steps: Vec<Step> = Vec::new();
        for line in lines {
            let step = Step::parse(line, directory, steps.last())?;
            steps.push(step);
        }
        Ok(steps)
    }

    pub fn kind(&self) -> StepKind {
        match self {
            Step::Move(_) => StepKind::Move,
            Step::Shift(_) => StepKind::Shift,
            Step::Toggle(_) => StepKind::Toggle,
            Step::Lock(_) => StepKind::Lock,
            Step::Trigger(_) => StepKind::Trigger,
        }
    }

    /// Whether the sequencer may advance past this step
    pub fn is_completed(&self, context: &StepContext) -> bool {
        match self {
            Step::Move(step) => step.is_completed(),
            Step::Shift(step) => step.is_completed(context),
            Step::Toggle(_) => true,
            Step::Lock(step) => step.is_completed(),
            Step::Trigger(_) => true,
        }
    }

    /// Perform the step's effect
    pub fn apply(&self, progress: &mut ProgressTable, context: &StepContext) {
        match self {
            Step::Move(step) => step.apply(),
            Step::Shift(step) => step.apply(context),
            Step::Toggle(step) => step.apply(),
            Step::Lock(step) => step.apply(),
            Step::Trigger(step) => step.apply(progress),
        }
    }
}

// === Move ===

/// Drive actuators towards a target value
#[derive(Debug, Clone)]
pub struct MoveStep {
    pub search: SearchKind,
    pub name: String,
    pub blocks: Vec<Mechanical>,
    pub target: f32,
    pub precision: f32,
    pub velocity: f32,
    pub continuity: Continuity,
}

impl MoveStep {
    /// `Move;<search>;<name>;<target>;<precision>;<velocity>;<continuity>`
    pub fn parse(
        line: &str,
        directory: &dyn BlockDirectory,
        previous: Option<&MoveStep>,
    ) -> Result<Self> {
        let fields = split_fields(line, 7)?;
        let inherited = || {
            previous.ok_or_else(|| Error::MissingInheritedValue {
                line: line.to_string(),
            })
        };

        let search = match fields[1].trim() {
            "" => inherited()?.search,
            value => parse_token(value, line)?,
        };
        let (name, blocks) = match fields[2] {
            "" => {
                let previous = inherited()?;
                (previous.name.clone(), previous.blocks.clone())
            }
            name => (name.to_string(), find_mechanical(directory, search, name)),
        };
        let target = match fields[3].trim() {
            "" => inherited()?.target,
            value => parse_number(value, line)?,
        };
        let precision = match fields[4].trim() {
            "" => inherited()?.precision,
            value => parse_number(value, line)?,
        };
        let velocity = match fields[5].trim() {
            "" => inherited()?.velocity,
            value => parse_number(value, line)?,
        };
        let continuity = match fields[6].trim() {
            "" => inherited()?.continuity,
            value => parse_token(value, line)?,
        };

        Ok(Self {
            search,
            name,
            blocks,
            target,
            precision,
            velocity,
            continuity,
        })
    }

    /// Every block lies within `target ± precision` (inclusive)
    pub fn is_completed(&self) -> bool {
        match self.continuity {
            Continuity::Continue => true,
            Continuity::Wait => {
                let lower = self.target - self.precision;
                let upper = self.target + self.precision;
                self.blocks.iter().all(|block| {
                    let value = block.value();
                    value >= lower && value <= upper
                })
            }
        }
    }

    pub fn apply(&self) {
        let speed = self.velocity.abs();
        for block in &self.blocks {
            let current = block.value();
            if current < self.target {
                block.set_limits(current, self.target);
                block.set_velocity(speed);
            } else {
                block.set_limits(self.target, current);
                block.set_velocity(-speed);
            }
        }
    }
}

// === Shift ===

/// Drive actuators within a range for as long as a trigger fires
#[derive(Debug, Clone)]
pub struct ShiftStep {
    pub blocks: Vec<Mechanical>,
    pub trigger: Trigger,
    pub min: f32,
    pub max: f32,
    pub velocity: f32,
    /// Multiply the velocity by the trigger's magnitude
    pub scale_with_input: bool,
}

impl ShiftStep {
    /// `Shift;<search>;<name>;<trigger>;<min>;<max>;<velocity>;<scaleWithInput>`
    pub fn parse(line: &str, directory: &dyn BlockDirectory) -> Result<Self> {
        let fields = split_fields(line, 8)?;
        let search: SearchKind = parse_token(fields[1], line)?;
        Ok(Self {
            blocks: find_mechanical(directory, search, fields[2]),
            trigger: Trigger::parse(fields[3])?,
            min: parse_number(fields[4], line)?,
            max: parse_number(fields[5], line)?,
            velocity: parse_number(fields[6], line)?,
            scale_with_input: parse_bool(fields[7], line)?,
        })
    }

    /// Completes once the trigger stops firing, freezing the blocks where they are.
    /// While it fires, the drive follows the current magnitude.
    pub fn is_completed(&self, context: &StepContext) -> bool {
        let magnitude = self.trigger.magnitude(context.argument, context.input);
        if magnitude == 0.0 {
            for block in &self.blocks {
                let current = block.value();
                block.set_limits(current, current);
                block.set_velocity(0.0);
            }
            return true;
        }
        self.drive(magnitude);
        false
    }

    pub fn apply(&self, context: &StepContext) {
        let magnitude = self.trigger.magnitude(context.argument, context.input);
        if magnitude > 0.0 {
            self.drive(magnitude);
        }
    }

    fn drive(&self, magnitude: f32) {
        let velocity = if self.scale_with_input {
            self.velocity * magnitude
        } else {
            self.velocity
        };
        for block in &self.blocks {
            block.set_limits(self.min, self.max);
            block.set_velocity(velocity);
        }
    }
}

// === Toggle ===

/// Switch blocks on or off
#[derive(Debug, Clone)]
pub struct ToggleStep {
    pub blocks: Vec<BlockRef>,
    pub enable: bool,
    /// Carried for recorded batches; toggles never wait
    pub continuity: Continuity,
}

impl ToggleStep {
    /// `Toggle;<search>;<name>;<enable>[;<continuity>]`
    pub fn parse(line: &str, directory: &dyn BlockDirectory) -> Result<Self> {
        let field_count = line.split(';').count();
        let fields = split_fields(line, if field_count == 5 { 5 } else { 4 })?;
        let search: SearchKind = parse_token(fields[1], line)?;
        let continuity = match fields.get(4) {
            Some(value) => parse_token(value, line)?,
            None => Continuity::Continue,
        };
        Ok(Self {
            blocks: find_blocks(directory, search, fields[2], Capability::Functional),
            enable: parse_bool(fields[3], line)?,
            continuity,
        })
    }

    pub fn apply(&self) {
        for block in &self.blocks {
            if let Some(functional) = block.functional() {
                functional.set_enabled(self.enable);
            }
        }
    }
}

// === Lock ===

/// Latch or release landing gear
#[derive(Debug, Clone)]
pub struct LockStep {
    pub blocks: Vec<BlockRef>,
    pub lock: bool,
    pub continuity: Continuity,
}

impl LockStep {
    /// `Lock;<search>;<name>;<lock>;<continuity>`
    pub fn parse(line: &str, directory: &dyn BlockDirectory) -> Result<Self> {
        let fields = split_fields(line, 5)?;
        let search: SearchKind = parse_token(fields[1], line)?;
        Ok(Self {
            blocks: find_blocks(directory, search, fields[2], Capability::Lockable),
            lock: parse_bool(fields[3], line)?,
            continuity: parse_token(fields[4], line)?,
        })
    }

    /// Locking waits for any block to latch, unlocking for all to release.
    /// Without any lockable block there is nothing to wait for.
    pub fn is_completed(&self) -> bool {
        if self.continuity == Continuity::Continue {
            return true;
        }
        let locked: Vec<bool> = self
            .blocks
            .iter()
            .filter_map(|block| block.lockable())
            .map(|lockable| lockable.is_locked())
            .collect();
        if locked.is_empty() {
            return true;
        }
        if self.lock {
            locked.contains(&true)
        } else {
            !locked.contains(&true)
        }
    }

    pub fn apply(&self) {
        for block in &self.blocks {
            if let Some(functional) = block.functional() {
                functional.set_enabled(true);
            }
            if let Some(lockable) = block.lockable() {
                lockable.set_auto_lock(self.lock);
                if self.lock {
                    lockable.lock();
                } else {
                    lockable.unlock();
                }
            }
        }
    }
}

// === Trigger ===

/// Force another segment into a mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerStep {
    pub segment: String,
    pub mode: String,
}

impl TriggerStep {
    /// `Trigger;<segment>;<mode>`
    pub fn parse(line: &str) -> Result<Self> {
        let fields = split_fields(line, 3)?;
        Ok(Self {
            segment: fields[1].to_string(),
            mode: fields[2].to_string(),
        })
    }

    pub fn apply(&self, progress: &mut ProgressTable) {
        progress.jump(&self.segment, &self.mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Axis;
    use crate::memory::{MemoryBlock, MemoryGrid};
    use crate::Functional;

    fn grid() -> MemoryGrid {
        let mut grid = MemoryGrid::new();
        grid.add(MemoryBlock::rotor("Hip"));
        grid.add(MemoryBlock::piston("Lift"));
        grid.add(MemoryBlock::light("Hazard Light"));
        grid.add(MemoryBlock::landing_gear("Foot Left"));
        grid.add(MemoryBlock::landing_gear("Foot Right"));
        grid.add_group("Feet", &["Foot Left", "Foot Right"]);
        grid
    }

    fn idle() -> ControllerInput {
        ControllerInput::idle()
    }

    #[test]
    fn test_unknown_step_type() {
        let grid = grid();
        let err = Step::parse("Spin;Block;Hip", &grid, None).unwrap_err();
        assert_eq!(err.to_string(), "invalid step type 'Spin' in Spin;Block;Hip");
    }

    #[test]
    fn test_move_field_count() {
        let grid = grid();
        let err = Step::parse("Move;Block;Hip;90", &grid, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "step requires 7 arguments, received 4 in Move;Block;Hip;90"
        );
    }

    #[test]
    fn test_move_inherits_from_previous_move() {
        let grid = grid();
        let steps = Step::parse_all(
            ["Move;Block;Hip;90;1;2;Wait", "Move;;;0;;;"],
            &grid,
        )
        .unwrap();

        let Step::Move(second) = &steps[1] else {
            panic!("expected a move step");
        };
        assert_eq!(second.name, "Hip");
        assert_eq!(second.blocks.len(), 1);
        assert_eq!(second.target, 0.0);
        assert_eq!(second.precision, 1.0);
        assert_eq!(second.velocity, 2.0);
        assert_eq!(second.continuity, Continuity::Wait);
    }

    #[test]
    fn test_move_inherit_without_previous_move() {
        let grid = grid();
        let err = Step::parse_all(["Toggle;Block;Hazard Light;true", "Move;;;0;;;"], &grid)
            .unwrap_err();
        assert_eq!(err.to_string(), "no previous value to fill in to Move;;;0;;;");
    }

    #[test]
    fn test_move_bad_number() {
        let grid = grid();
        let err = Step::parse("Move;Block;Hip;ninety;1;2;Wait", &grid, None).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { .. }));
    }

    #[test]
    fn test_move_wait_boundary_is_inclusive() {
        let grid = grid();
        let lift = grid.get("Lift").unwrap();
        let step = Step::parse("Move;Block;Lift;5;0.5;1;Wait", &grid, None).unwrap();
        let input = idle();
        let context = StepContext::new("", &input);

        lift.set_value(4.4);
        assert!(!step.is_completed(&context));
        lift.set_value(4.5);
        assert!(step.is_completed(&context));
        lift.set_value(5.5);
        assert!(step.is_completed(&context));
        lift.set_value(5.6);
        assert!(!step.is_completed(&context));
    }

    #[test]
    fn test_move_continue_always_completes() {
        let grid = grid();
        let step = Step::parse("Move;Block;Hip;90;1;2;Continue", &grid, None).unwrap();
        let input = idle();
        assert!(step.is_completed(&StepContext::new("", &input)));
    }

    #[test]
    fn test_move_apply_sets_direction() {
        let grid = grid();
        let lift = grid.get("Lift").unwrap();
        let mut progress = ProgressTable::new();
        let input = idle();
        let context = StepContext::new("", &input);

        lift.set_value(1.0);
        let up = Step::parse("Move;Block;Lift;4;0.1;0.5;Wait", &grid, None).unwrap();
        up.apply(&mut progress, &context);
        assert_eq!(lift.limits(), (1.0, 4.0));
        assert_eq!(lift.velocity(), 0.5);

        lift.set_value(4.0);
        let down = Step::parse("Move;Block;Lift;2;0.1;-0.5;Wait", &grid, None).unwrap();
        down.apply(&mut progress, &context);
        assert_eq!(lift.limits(), (2.0, 4.0));
        assert_eq!(lift.velocity(), -0.5);
    }

    #[test]
    fn test_shift_follows_trigger() {
        let grid = grid();
        let lift = grid.get("Lift").unwrap();
        let step = Step::parse(
            "Shift;Block;Lift;CONTROLLER_UP;0;8;2;true",
            &grid,
            None,
        )
        .unwrap();
        let mut progress = ProgressTable::new();

        let pushing = ControllerInput::idle().with(Axis::Up, 0.5);
        let context = StepContext::new("", &pushing);
        step.apply(&mut progress, &context);
        assert_eq!(lift.limits(), (0.0, 8.0));
        assert_eq!(lift.velocity(), 1.0);
        assert!(!step.is_completed(&context));

        lift.set_value(3.0);
        let released = idle();
        assert!(step.is_completed(&StepContext::new("", &released)));
        assert_eq!(lift.limits(), (3.0, 3.0));
        assert_eq!(lift.velocity(), 0.0);
    }

    #[test]
    fn test_shift_unknown_trigger() {
        let grid = grid();
        let err = Step::parse("Shift;Block;Lift;SIDEWAYS;0;8;2;true", &grid, None).unwrap_err();
        assert_eq!(err, Error::UnknownTrigger("SIDEWAYS".to_string()));
    }

    #[test]
    fn test_toggle_sets_enabled() {
        let grid = grid();
        let light = grid.get("Hazard Light").unwrap();
        let step = Step::parse("Toggle;Blocks;Hazard;false", &grid, None).unwrap();
        let mut progress = ProgressTable::new();
        let input = idle();
        let context = StepContext::new("", &input);

        assert!(step.is_completed(&context));
        step.apply(&mut progress, &context);
        assert!(!light.enabled());
    }

    #[test]
    fn test_toggle_optional_continuity() {
        let grid = grid();
        let Step::Toggle(step) = Step::parse("Toggle;Block;Hazard Light;true;Wait", &grid, None)
            .unwrap()
        else {
            panic!("expected a toggle step");
        };
        assert_eq!(step.continuity, Continuity::Wait);
        assert!(Step::parse("Toggle;Block;Hazard Light;true;Wait;x", &grid, None).is_err());
    }

    #[test]
    fn test_lock_wait_semantics() {
        let grid = grid();
        let left = grid.get("Foot Left").unwrap();
        let right = grid.get("Foot Right").unwrap();
        let mut progress = ProgressTable::new();
        let input = idle();
        let context = StepContext::new("", &input);

        let lock = Step::parse("Lock;Group;Feet;true;Wait", &grid, None).unwrap();
        assert!(!lock.is_completed(&context));
        right.set_locked(true);
        assert!(lock.is_completed(&context));

        let unlock = Step::parse("Lock;Group;Feet;false;Wait", &grid, None).unwrap();
        assert!(!unlock.is_completed(&context));
        unlock.apply(&mut progress, &context);
        assert!(unlock.is_completed(&context));
        assert!(!left.auto_lock_enabled());

        left.set_enabled(false);
        lock.apply(&mut progress, &context);
        assert!(left.enabled());
        assert!(left.auto_lock_enabled());
        assert!(left.locked() && right.locked());
    }

    #[test]
    fn test_lock_bad_continuity() {
        let grid = grid();
        let err = Step::parse("Lock;Group;Feet;true;Later", &grid, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid continuity type 'Later' in Lock;Group;Feet;true;Later"
        );
    }

    #[test]
    fn test_unresolved_reference_is_noop() {
        let grid = grid();
        let step = Step::parse("Move;Group;Nobody;90;1;2;Wait", &grid, None).unwrap();
        let input = idle();
        let context = StepContext::new("", &input);
        step.apply(&mut ProgressTable::new(), &context);
        assert!(step.is_completed(&context));
    }

    #[test]
    fn test_unresolved_lock_does_not_hold() {
        let grid = grid();
        let input = idle();
        let context = StepContext::new("", &input);

        let lock = Step::parse("Lock;Group;Nobody;true;Wait", &grid, None).unwrap();
        lock.apply(&mut ProgressTable::new(), &context);
        assert!(lock.is_completed(&context));

        let unlock = Step::parse("Lock;Block;Nobody;false;Wait", &grid, None).unwrap();
        assert!(unlock.is_completed(&context));
    }

    #[test]
    fn test_step_kind_tags_ignore_case() {
        let grid = grid();
        let step = Step::parse("trigger;legs;walk", &grid, None).unwrap();
        assert_eq!(step.kind(), StepKind::Trigger);
    }
}
