//! Mutable sequencer state
//!
//! One [`SegmentProgress`] per segment, carried from tick to tick. This is the
//! only state that survives between ticks apart from the recorder session.

use crate::Animation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Where a segment is in its animation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentProgress {
    /// Name of the selected mode, if any
    pub active_mode: Option<String>,
    /// Index of the active step; `None` means "before the first step"
    pub active_step: Option<usize>,
}

impl SegmentProgress {
    /// Select a mode and rewind to before its first step
    pub fn reset_to(&mut self, mode: &str) {
        self.active_mode = Some(mode.to_string());
        self.active_step = None;
    }

    /// Check if `mode` is the selected mode
    pub fn is_active(&self, mode: &str) -> bool {
        self.active_mode.as_deref() == Some(mode)
    }
}

/// Progress of every segment, keyed by segment name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressTable {
    segments: IndexMap<String, SegmentProgress>,
    /// Segments jumped since the last `clear_jumps`
    #[serde(skip)]
    jumped: Vec<String>,
}

impl ProgressTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh progress for every segment of an animation
    pub fn for_animation(animation: &Animation) -> Self {
        Self {
            segments: animation
                .segments()
                .map(|segment| (segment.name().to_string(), SegmentProgress::default()))
                .collect(),
            jumped: Vec::new(),
        }
    }

    pub fn get(&self, segment: &str) -> Option<&SegmentProgress> {
        self.segments.get(segment)
    }

    pub fn get_mut(&mut self, segment: &str) -> Option<&mut SegmentProgress> {
        self.segments.get_mut(segment)
    }

    /// Force a segment into a mode, rewinding it even if already selected.
    /// Returns `false` if the segment is unknown.
    pub fn jump(&mut self, segment: &str, mode: &str) -> bool {
        match self.segments.get_mut(segment) {
            Some(progress) => {
                progress.reset_to(mode);
                log::debug!("{segment} jumped to {mode}");
                if !self.jumped.iter().any(|name| name == segment) {
                    self.jumped.push(segment.to_string());
                }
                true
            }
            None => {
                log::warn!("cannot jump to unknown segment {segment}");
                false
            }
        }
    }

    /// Select a mode unless it is already selected. Returns `true` on a switch.
    pub fn switch(&mut self, segment: &str, mode: &str) -> bool {
        match self.segments.get_mut(segment) {
            Some(progress) if !progress.is_active(mode) => {
                progress.reset_to(mode);
                log::debug!("{segment} switched to {mode}");
                true
            }
            _ => false,
        }
    }

    /// Check if a `jump` hit `segment` since the last `clear_jumps`
    pub fn was_jumped(&self, segment: &str) -> bool {
        self.jumped.iter().any(|name| name == segment)
    }

    pub fn clear_jumps(&mut self) {
        self.jumped.clear();
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
