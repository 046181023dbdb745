//! Uniform view over rotational and linear actuators
//!
//! The variant is picked once, when a block is wrapped. Mechanical blocks
//! without an adapter become [`Mechanical::Unsupported`], which reads as zero
//! and ignores writes, so a bad reference degrades into a no-op.

use crate::BlockRef;
use std::fmt;

/// Name reported by the inert placeholder
pub const UNSUPPORTED_NAME: &str = "Unsupported block type!";

/// A positionable actuator
#[derive(Clone)]
pub enum Mechanical {
    /// Value in degrees, velocity in RPM
    Rotor(BlockRef),
    /// Value in metres, velocity in m/s
    Piston(BlockRef),
    Unsupported,
}

impl Mechanical {
    /// Wrap a block, dispatching on the capabilities it exposes
    pub fn wrap(block: BlockRef) -> Self {
        if block.rotor().is_some() {
            Mechanical::Rotor(block)
        } else if block.piston().is_some() {
            Mechanical::Piston(block)
        } else {
            log::warn!("{} is not a rotor or piston", block.name());
            Mechanical::Unsupported
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Mechanical::Unsupported)
    }

    pub fn name(&self) -> String {
        match self {
            Mechanical::Rotor(block) | Mechanical::Piston(block) => block.name(),
            Mechanical::Unsupported => UNSUPPORTED_NAME.to_string(),
        }
    }

    /// Current value: rotor angle in degrees or piston position
    pub fn value(&self) -> f32 {
        match self {
            Mechanical::Rotor(block) => block
                .rotor()
                .map(|rotor| rotor.angle().to_degrees())
                .unwrap_or(0.0),
            Mechanical::Piston(block) => block
                .piston()
                .map(|piston| piston.position())
                .unwrap_or(0.0),
            Mechanical::Unsupported => 0.0,
        }
    }

    pub fn velocity(&self) -> f32 {
        match self {
            Mechanical::Rotor(block) => block
                .rotor()
                .map(|rotor| rotor.velocity_rpm())
                .unwrap_or(0.0),
            Mechanical::Piston(block) => block
                .piston()
                .map(|piston| piston.velocity())
                .unwrap_or(0.0),
            Mechanical::Unsupported => 0.0,
        }
    }

    pub fn set_velocity(&self, velocity: f32) {
        match self {
            Mechanical::Rotor(block) => {
                if let Some(rotor) = block.rotor() {
                    rotor.set_velocity_rpm(velocity);
                }
            }
            Mechanical::Piston(block) => {
                if let Some(piston) = block.piston() {
                    piston.set_velocity(velocity);
                }
            }
            Mechanical::Unsupported => {}
        }
    }

    /// Set the movement range
    pub fn set_limits(&self, lower: f32, upper: f32) {
        match self {
            Mechanical::Rotor(block) => {
                if let Some(rotor) = block.rotor() {
                    rotor.set_lower_limit_deg(lower);
                    rotor.set_upper_limit_deg(upper);
                }
            }
            Mechanical::Piston(block) => {
                if let Some(piston) = block.piston() {
                    piston.set_min_limit(lower);
                    piston.set_max_limit(upper);
                }
            }
            Mechanical::Unsupported => {}
        }
    }
}

impl fmt::Debug for Mechanical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mechanical::Rotor(block) => f.debug_tuple("Rotor").field(&block.name()).finish(),
            Mechanical::Piston(block) => f.debug_tuple("Piston").field(&block.name()).finish(),
            Mechanical::Unsupported => f.write_str("Unsupported"),
        }
    }
}
