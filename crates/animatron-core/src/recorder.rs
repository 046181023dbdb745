//! Step recorder
//!
//! Records a mode by watching the grid: a snapshot of every switchable,
//! lockable and mechanical block is taken when recording starts, and each
//! [`Recorder::record_steps`] call diffs the live state against it, emitting
//! one step line per change.

use crate::search::{blocks_of_type, SearchKind};
use crate::step::{Continuity, StepKind};
use crate::{BlockDirectory, BlockRef, Capability, ConfigStore, Mechanical};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value change below this is noise
pub const VALUE_TOLERANCE: f32 = 0.1;

/// A step line produced by the recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordedStep {
    Toggle {
        name: String,
        enable: bool,
        continuity: Continuity,
    },
    Lock {
        name: String,
        lock: bool,
        continuity: Continuity,
    },
    Move {
        name: String,
        target: f32,
        velocity: f32,
        continuity: Continuity,
    },
}

impl RecordedStep {
    fn set_continuity(&mut self, value: Continuity) {
        match self {
            RecordedStep::Toggle { continuity, .. }
            | RecordedStep::Lock { continuity, .. }
            | RecordedStep::Move { continuity, .. } => *continuity = value,
        }
    }
}

impl fmt::Display for RecordedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let search = SearchKind::Block;
        match self {
            RecordedStep::Toggle {
                name,
                enable,
                continuity,
            } => write!(f, "{};{search};{name};{enable};{continuity}", StepKind::Toggle),
            RecordedStep::Lock {
                name,
                lock,
                continuity,
            } => write!(f, "{};{search};{name};{lock};{continuity}", StepKind::Lock),
            RecordedStep::Move {
                name,
                target,
                velocity,
                continuity,
            } => write!(
                f,
                "{};{search};{name};{target};{VALUE_TOLERANCE};{velocity};{continuity}",
                StepKind::Move
            ),
        }
    }
}

/// Snapshot of one block, updated whenever a change is recorded
#[derive(Debug)]
struct Tracked<B, S> {
    block: B,
    state: S,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MechanicalState {
    value: f32,
    velocity: f32,
}

impl MechanicalState {
    fn read(block: &Mechanical) -> Self {
        Self {
            value: block.value(),
            velocity: block.velocity(),
        }
    }

    fn differs_from(&self, other: &MechanicalState) -> bool {
        (self.value - other.value).abs() > VALUE_TOLERANCE
            || (self.velocity - other.velocity).abs() > 0.0
    }
}

/// An active recording session
#[derive(Debug)]
pub struct Recorder {
    segment: String,
    mode: String,
    /// Enabled flag per switchable block
    switchables: Vec<Tracked<BlockRef, bool>>,
    /// Auto-lock flag per lockable block
    latches: Vec<Tracked<BlockRef, bool>>,
    mechanicals: Vec<Tracked<Mechanical, MechanicalState>>,
    recorded: Vec<RecordedStep>,
}

impl Recorder {
    /// Start recording `segment.mode`, snapshotting the grid
    pub fn start(
        segment: impl Into<String>,
        mode: impl Into<String>,
        directory: &dyn BlockDirectory,
    ) -> Self {
        let switchables = blocks_of_type(directory, Capability::Functional)
            .into_iter()
            .filter_map(|block| {
                let state = block.functional()?.is_enabled();
                Some(Tracked { block, state })
            })
            .collect();

        let latches = blocks_of_type(directory, Capability::Lockable)
            .into_iter()
            .filter_map(|block| {
                let state = block.lockable()?.auto_lock();
                Some(Tracked { block, state })
            })
            .collect();

        let mechanicals = blocks_of_type(directory, Capability::Mechanical)
            .into_iter()
            .map(Mechanical::wrap)
            .filter(Mechanical::is_supported)
            .map(|block| Tracked {
                state: MechanicalState::read(&block),
                block,
            })
            .collect();

        let recorder = Self {
            segment: segment.into(),
            mode: mode.into(),
            switchables,
            latches,
            mechanicals,
            recorded: Vec::new(),
        };
        log::info!(
            "recording {}.{}: tracking {} switchable, {} lockable, {} mechanical blocks",
            recorder.segment,
            recorder.mode,
            recorder.switchables.len(),
            recorder.latches.len(),
            recorder.mechanicals.len()
        );
        recorder
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Steps recorded so far
    pub fn recorded(&self) -> &[RecordedStep] {
        &self.recorded
    }

    /// Diff the grid against the snapshot, recording one step per change.
    /// The last step of the batch waits; the rest continue.
    pub fn record_steps(&mut self) -> usize {
        let mut batch = Vec::new();

        for tracked in &mut self.switchables {
            let Some(enabled) = tracked.block.functional().map(|f| f.is_enabled()) else {
                continue;
            };
            if enabled != tracked.state {
                tracked.state = enabled;
                batch.push(RecordedStep::Toggle {
                    name: tracked.block.name(),
                    enable: enabled,
                    continuity: Continuity::Continue,
                });
            }
        }

        for tracked in &mut self.latches {
            let Some(auto_lock) = tracked.block.lockable().map(|l| l.auto_lock()) else {
                continue;
            };
            if auto_lock != tracked.state {
                tracked.state = auto_lock;
                batch.push(RecordedStep::Lock {
                    name: tracked.block.name(),
                    lock: auto_lock,
                    continuity: Continuity::Continue,
                });
            }
        }

        for tracked in &mut self.mechanicals {
            let current = MechanicalState::read(&tracked.block);
            if current.differs_from(&tracked.state) {
                tracked.state = current;
                batch.push(RecordedStep::Move {
                    name: tracked.block.name(),
                    target: current.value,
                    velocity: current.velocity.abs(),
                    continuity: Continuity::Continue,
                });
            }
        }

        if let Some(last) = batch.last_mut() {
            last.set_continuity(Continuity::Wait);
        }
        let count = batch.len();
        log::debug!("recorded {count} steps for {}.{}", self.segment, self.mode);
        self.recorded.extend(batch);
        count
    }

    /// Recorded steps joined into a `steps` value
    pub fn steps_text(&self) -> String {
        self.recorded
            .iter()
            .map(RecordedStep::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the recorded steps into `segment.mode`, defaulting triggers and repeat
    pub fn write(&self, config: &mut ConfigStore) {
        let section = format!("{}.{}", self.segment, self.mode);
        config.set(&section, "steps", self.steps_text());
        if config.get(&section, "triggers").unwrap_or_default().is_empty() {
            config.set(&section, "triggers", "NONE");
        }
        if config.get(&section, "repeat").unwrap_or_default().is_empty() {
            config.set(&section, "repeat", "false");
        }
        log::info!("wrote {} recorded steps to [{section}]", self.recorded.len());
    }
}
