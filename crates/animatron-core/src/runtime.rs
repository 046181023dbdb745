//! Per-tick sequencer
//!
//! Each tick runs two passes over the segments:
//! 1. mode arbitration: the highest-priority satisfied mode is selected,
//!    rewinding the segment if it differs from the current one;
//! 2. step advance: the active step is held until complete, then the next
//!    step becomes active and its effect is applied.
//!
//! A segment jumped by a `Trigger` step sits before its new mode's first
//! step until the next tick, wherever it is declared.
//!
//! A tick never blocks and never fails.

use crate::input::ControllerInput;
use crate::step::StepContext;
use crate::{Animation, ProgressTable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of one segment after a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveStep {
    pub segment: String,
    pub mode: String,
    pub step: usize,
    pub state: StepState,
}

/// What happened to a segment's active step during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepState {
    /// The step became active this tick and its effect was applied
    Applied,
    /// The step is still waiting for completion
    Held,
    /// The mode finished and does not repeat
    Finished,
}

impl fmt::Display for ActiveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " > {}.{}.{}", self.segment, self.mode, self.step)
    }
}

/// Result of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Segments that switched mode during arbitration, as (segment, mode)
    pub switched: Vec<(String, String)>,
    /// Active step per segment, in segment order
    pub active: Vec<ActiveStep>,
}

impl TickReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Active step of a segment
    pub fn step_of(&self, segment: &str) -> Option<&ActiveStep> {
        self.active.iter().find(|active| active.segment == segment)
    }

    /// One trace line per active segment
    pub fn trace_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.active.iter().map(ActiveStep::to_string)
    }
}

/// Drives an [`Animation`] one tick at a time
#[derive(Debug, Clone)]
pub struct Sequencer {
    animation: Animation,
    progress: ProgressTable,
}

impl Sequencer {
    /// Create a sequencer with every segment idle
    pub fn new(animation: Animation) -> Self {
        let progress = ProgressTable::for_animation(&animation);
        Self {
            animation,
            progress,
        }
    }

    pub fn animation(&self) -> &Animation {
        &self.animation
    }

    pub fn progress(&self) -> &ProgressTable {
        &self.progress
    }

    /// Run one tick
    pub fn tick(&mut self, argument: &str, input: &ControllerInput) -> TickReport {
        let mut report = TickReport::new();
        self.arbitrate(argument, input, &mut report);
        self.advance(argument, input, &mut report);
        report
    }

    // === Arbitration ===

    fn arbitrate(&mut self, argument: &str, input: &ControllerInput, report: &mut TickReport) {
        for segment in self.animation.segments() {
            let Some(mode) = segment.select_mode(argument, input) else {
                continue;
            };
            if self.progress.switch(segment.name(), mode.name()) {
                report
                    .switched
                    .push((segment.name().to_string(), mode.name().to_string()));
            }
        }
    }

    // === Step advance ===

    fn advance(&mut self, argument: &str, input: &ControllerInput, report: &mut TickReport) {
        let context = StepContext::new(argument, input);
        self.progress.clear_jumps();

        for segment in self.animation.segments() {
            if self.progress.was_jumped(segment.name()) {
                log::trace!("{} jumped, starts next tick", segment.name());
                continue;
            }
            let Some(progress) = self.progress.get(segment.name()) else {
                continue;
            };
            let Some(mode) = progress
                .active_mode
                .as_deref()
                .and_then(|name| segment.mode(name))
            else {
                continue;
            };
            let current = progress.active_step;

            if let Some(index) = current {
                let completed = mode
                    .step(index)
                    .map(|step| step.is_completed(&context))
                    .unwrap_or(true);
                if !completed {
                    log::trace!("{}.{}.{index} held", segment.name(), mode.name());
                    report.active.push(ActiveStep {
                        segment: segment.name().to_string(),
                        mode: mode.name().to_string(),
                        step: index,
                        state: StepState::Held,
                    });
                    continue;
                }
            }

            let next = match current {
                None => Some(0),
                Some(index) if index < mode.last_step() => Some(index + 1),
                Some(_) if mode.repeat() => Some(0),
                Some(_) => None,
            };

            let Some(index) = next else {
                report.active.push(ActiveStep {
                    segment: segment.name().to_string(),
                    mode: mode.name().to_string(),
                    step: mode.last_step(),
                    state: StepState::Finished,
                });
                continue;
            };

            // Index first, so a jump applied by the step overrides it
            if let Some(progress) = self.progress.get_mut(segment.name()) {
                progress.active_step = Some(index);
            }
            log::debug!("{}.{}.{index} applied", segment.name(), mode.name());
            report.active.push(ActiveStep {
                segment: segment.name().to_string(),
                mode: mode.name().to_string(),
                step: index,
                state: StepState::Applied,
            });
            if let Some(step) = mode.step(index) {
                step.apply(&mut self.progress, &context);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Axis;
    use crate::memory::{MemoryBlock, MemoryGrid};
    use crate::step::Step;
    use crate::trigger::TriggerSet;
    use crate::{Mode, Segment};

    fn grid() -> MemoryGrid {
        let mut grid = MemoryGrid::new();
        grid.add(MemoryBlock::piston("Lift"));
        grid.add(MemoryBlock::light("Lamp"));
        grid
    }

    fn mode(grid: &MemoryGrid, name: &str, triggers: &str, repeat: bool, lines: &[&str]) -> Mode {
        let steps = Step::parse_all(lines.iter().copied(), grid).unwrap();
        Mode::new(name, TriggerSet::parse(triggers).unwrap(), repeat, 0, steps).unwrap()
    }

    fn forward() -> ControllerInput {
        ControllerInput::idle().with(Axis::Forward, 1.0)
    }

    #[test]
    fn test_wait_holds_then_advances() {
        let grid = grid();
        let lift = grid.get("Lift").unwrap();
        let animation: Animation = [Segment::new(
            "arm",
            vec![mode(
                &grid,
                "raise",
                "CONTROLLER_FORWARD",
                false,
                &["Move;Block;Lift;4;0.1;1;Wait", "Toggle;Block;Lamp;false"],
            )],
        )]
        .into_iter()
        .collect();
        let mut sequencer = Sequencer::new(animation);

        let report = sequencer.tick("", &forward());
        assert_eq!(report.switched, vec![("arm".to_string(), "raise".to_string())]);
        assert_eq!(report.step_of("arm").unwrap().state, StepState::Applied);
        assert_eq!(lift.velocity(), 1.0);

        let report = sequencer.tick("", &forward());
        assert_eq!(report.step_of("arm").unwrap().state, StepState::Held);

        lift.set_value(4.0);
        let report = sequencer.tick("", &forward());
        let active = report.step_of("arm").unwrap();
        assert_eq!((active.step, active.state), (1, StepState::Applied));
        assert!(!grid.get("Lamp").unwrap().enabled());

        let report = sequencer.tick("", &forward());
        assert_eq!(report.step_of("arm").unwrap().state, StepState::Finished);
        assert_eq!(sequencer.progress().get("arm").unwrap().active_step, Some(1));
    }

    #[test]
    fn test_repeat_wraps() {
        let grid = grid();
        let animation: Animation = [Segment::new(
            "lamp",
            vec![mode(
                &grid,
                "blink",
                "ARGUMENT_go",
                true,
                &["Toggle;Block;Lamp;false", "Toggle;Block;Lamp;true"],
            )],
        )]
        .into_iter()
        .collect();
        let mut sequencer = Sequencer::new(animation);
        let idle = ControllerInput::idle();

        let steps: Vec<usize> = (0..5)
            .map(|tick| {
                let argument = if tick == 0 { "go" } else { "" };
                sequencer.tick(argument, &idle).active[0].step
            })
            .collect();
        assert_eq!(steps, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_nothing_selected_nothing_reported() {
        let grid = grid();
        let animation: Animation = [Segment::new(
            "arm",
            vec![mode(&grid, "raise", "CONTROLLER_FORWARD", false, &["Toggle;Block;Lamp;false"])],
        )]
        .into_iter()
        .collect();
        let mut sequencer = Sequencer::new(animation);

        let report = sequencer.tick("", &ControllerInput::idle());
        assert!(report.active.is_empty());
        assert!(grid.get("Lamp").unwrap().enabled());
    }

    #[test]
    fn test_trigger_step_jumps_other_segment() {
        let grid = grid();
        let animation: Animation = [
            Segment::new(
                "lamp",
                vec![
                    mode(&grid, "off", "NONE", false, &["Toggle;Block;Lamp;false"]),
                ],
            ),
            Segment::new(
                "control",
                vec![mode(&grid, "start", "ARGUMENT_go", false, &["Trigger;lamp;off"])],
            ),
        ]
        .into_iter()
        .collect();
        let mut sequencer = Sequencer::new(animation);
        let idle = ControllerInput::idle();

        sequencer.tick("go", &idle);
        let lamp = sequencer.progress().get("lamp").unwrap();
        assert_eq!(lamp.active_mode.as_deref(), Some("off"));
        assert_eq!(lamp.active_step, None);

        let report = sequencer.tick("", &idle);
        assert_eq!(report.step_of("lamp").unwrap().step, 0);
        assert!(!grid.get("Lamp").unwrap().enabled());
    }

    #[test]
    fn test_jump_to_later_segment_waits_a_tick() {
        let grid = grid();
        let animation: Animation = [
            Segment::new(
                "control",
                vec![mode(&grid, "start", "ARGUMENT_go", false, &["Trigger;lamp;off"])],
            ),
            Segment::new(
                "lamp",
                vec![mode(&grid, "off", "NONE", false, &["Toggle;Block;Lamp;false"])],
            ),
        ]
        .into_iter()
        .collect();
        let mut sequencer = Sequencer::new(animation);
        let idle = ControllerInput::idle();

        let report = sequencer.tick("go", &idle);
        assert!(report.step_of("lamp").is_none());
        assert_eq!(sequencer.progress().get("lamp").unwrap().active_step, None);
        assert!(grid.get("Lamp").unwrap().enabled());

        let report = sequencer.tick("", &idle);
        assert_eq!(report.step_of("lamp").unwrap().state, StepState::Applied);
        assert!(!grid.get("Lamp").unwrap().enabled());
    }

    #[test]
    fn test_held_segment_does_not_block_others() {
        let grid = grid();
        let animation: Animation = [
            Segment::new(
                "arm",
                vec![mode(&grid, "raise", "CONTROLLER_FORWARD", false, &["Move;Block;Lift;4;0.1;1;Wait"])],
            ),
            Segment::new(
                "lamp",
                vec![mode(
                    &grid,
                    "blink",
                    "CONTROLLER_FORWARD",
                    true,
                    &["Toggle;Block;Lamp;false", "Toggle;Block;Lamp;true"],
                )],
            ),
        ]
        .into_iter()
        .collect();
        let mut sequencer = Sequencer::new(animation);

        sequencer.tick("", &forward());
        let report = sequencer.tick("", &forward());
        assert_eq!(report.step_of("arm").unwrap().state, StepState::Held);
        assert_eq!(report.step_of("lamp").unwrap().step, 1);
    }

    #[test]
    fn test_trace_line_format() {
        let active = ActiveStep {
            segment: "legs".to_string(),
            mode: "walk".to_string(),
            step: 3,
            state: StepState::Applied,
        };
        assert_eq!(active.to_string(), " > legs.walk.3");
    }
}
