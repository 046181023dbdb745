//! Animation model: segments, their modes and the modes' steps
//!
//! Built once at setup and never mutated afterwards. Mutable progress lives
//! in [`crate::ProgressTable`].

use crate::input::ControllerInput;
use crate::step::Step;
use crate::trigger::TriggerSet;
use crate::{Error, Result};
use indexmap::IndexMap;

/// One named behaviour of a segment
#[derive(Debug, Clone)]
pub struct Mode {
    name: String,
    triggers: TriggerSet,
    repeat: bool,
    /// Higher wins
    priority: i32,
    steps: Vec<Step>,
}

impl Mode {
    /// Create a mode; a mode without steps is rejected
    pub fn new(
        name: impl Into<String>,
        triggers: TriggerSet,
        repeat: bool,
        priority: i32,
        steps: Vec<Step>,
    ) -> Result<Self> {
        let name = name.into();
        if steps.is_empty() {
            return Err(Error::EmptyMode(name));
        }
        Ok(Self {
            name,
            triggers,
            repeat,
            priority,
            steps,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triggers(&self) -> &TriggerSet {
        &self.triggers
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Index of the last step
    pub fn last_step(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}

/// A group of actuators animated together
#[derive(Debug, Clone)]
pub struct Segment {
    name: String,
    modes: IndexMap<String, Mode>,
    /// Mode names by descending priority, ties in declaration order
    arbitration_order: Vec<String>,
}

impl Segment {
    /// Create a segment from modes in declaration order
    pub fn new(name: impl Into<String>, modes: Vec<Mode>) -> Self {
        let modes: IndexMap<String, Mode> = modes
            .into_iter()
            .map(|mode| (mode.name.clone(), mode))
            .collect();

        let mut ordered: Vec<&Mode> = modes.values().collect();
        // Stable sort keeps declaration order among equal priorities
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
        let arbitration_order = ordered.iter().map(|mode| mode.name.clone()).collect();

        Self {
            name: name.into(),
            modes,
            arbitration_order,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self, name: &str) -> Option<&Mode> {
        self.modes.get(name)
    }

    /// Modes in declaration order
    pub fn modes(&self) -> impl Iterator<Item = &Mode> {
        self.modes.values()
    }

    pub fn mode_count(&self) -> usize {
        self.modes.len()
    }

    /// Highest-priority mode whose triggers are all satisfied
    pub fn select_mode(&self, argument: &str, input: &ControllerInput) -> Option<&Mode> {
        self.arbitration_order
            .iter()
            .filter_map(|name| self.modes.get(name))
            .find(|mode| mode.triggers.is_satisfied(argument, input))
    }
}

/// Every configured segment
#[derive(Debug, Clone, Default)]
pub struct Animation {
    segments: IndexMap<String, Segment>,
}

impl Animation {
    /// Create an empty animation
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a segment, replacing any segment of the same name
    pub fn add_segment(&mut self, segment: Segment) {
        self.segments.insert(segment.name.clone(), segment);
    }

    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.segments.get(name)
    }

    /// Segments in declaration order
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromIterator<Segment> for Animation {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        let mut animation = Animation::new();
        for segment in iter {
            animation.add_segment(segment);
        }
        animation
    }
}
