//! Animatron Core - tick-driven animation sequencer for mechanical blocks
//!
//! This crate provides the model and runtime of the sequencer:
//! - Host capability traits (`Block`, `BlockDirectory`) and the in-memory grid
//! - Actuator adapter (`Mechanical`) and component resolution
//! - Sectioned configuration store (`ConfigStore`)
//! - Controller input, triggers and the five step types
//! - Segment/mode model, per-segment progress and the `Sequencer`
//! - The `Recorder`, which derives step lines from observed changes
//!
//! ## Tick model
//!
//! Everything runs synchronously inside one call per tick:
//! ```text
//! argument + input -> mode arbitration -> step advance -> TickReport
//! ```
//! Only `ProgressTable` (and an active `Recorder`) carries state between ticks.

pub mod animation;
mod block;
pub mod config;
mod error;
pub mod input;
mod mechanical;
pub mod memory;
mod model;
pub mod recorder;
pub mod runtime;
pub mod search;
pub mod step;
pub mod token;
pub mod trigger;

pub use animation::{Animation, Mode, Segment};
pub use block::{
    Block, BlockDirectory, BlockRef, Capability, Controller, Functional, Lockable, Piston, Rotor,
    TextSurface,
};
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use input::{Axis, ControllerInput, InputCalibration, InputSettings, RawInput};
pub use mechanical::{Mechanical, UNSUPPORTED_NAME};
pub use model::{ProgressTable, SegmentProgress};
pub use recorder::{RecordedStep, Recorder};
pub use runtime::{ActiveStep, Sequencer, StepState, TickReport};
pub use search::SearchKind;
pub use step::{Continuity, Step, StepContext, StepKind};
pub use trigger::{Trigger, TriggerSet};
