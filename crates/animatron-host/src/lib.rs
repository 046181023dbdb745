//! Animatron Host - the per-tick program
//!
//! Binds the sequencer to a host grid:
//! - Setup from the program block's custom data (`SETUP`)
//! - Recording sessions (`RECORD;<segment>;<mode>`, `RECORD_STEPS`, `RECORDING_DONE`)
//! - Controller discovery and status text rendering

mod program;

pub use program::{
    header, Program, ACTIVE_STEPS, ALREADY_RECORDING, NO_SEGMENTS, RECORDING_DONE, RECORD_PREFIX,
    RECORD_STEPS, RECORD_USAGE, SETUP,
};
