//! Animatron Script - configuration loader
//!
//! Reads animation configuration from block custom data:
//! - The `[animation]` control section (`Settings`)
//! - `definitions` chains between configuration-defining blocks
//! - `segment.mode` sections with `INCLUDE` expansion

mod error;
mod loader;
mod settings;

pub use error::{Error, Result};
pub use loader::{Loader, Setup, INCLUDE_TAG};
pub use settings::{Settings, CONTROL_SECTION};
