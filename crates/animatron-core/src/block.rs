//! Host capability traits
//!
//! The sequencer never talks to a concrete host. Everything it touches is a
//! [`Block`] handed out by a [`BlockDirectory`], and each block exposes only
//! the capabilities it supports. Host objects are single-threaded and
//! interior-mutable, so every setter takes `&self`.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// A block on the host grid
pub trait Block {
    /// Display name, used for exact and substring searches
    fn name(&self) -> String;

    /// Free-form text attached to the block (configuration source)
    fn custom_data(&self) -> String {
        String::new()
    }

    /// Replace the block's free-form text
    fn set_custom_data(&self, _data: &str) {}

    /// Whether the block is a mechanical connection (rotor, hinge, piston, suspension...)
    ///
    /// Defaults to "has a rotor or piston capability". Hosts override this for
    /// mechanical blocks the sequencer has no adapter for.
    fn is_mechanical(&self) -> bool {
        self.rotor().is_some() || self.piston().is_some()
    }

    fn functional(&self) -> Option<&dyn Functional> {
        None
    }

    fn lockable(&self) -> Option<&dyn Lockable> {
        None
    }

    fn rotor(&self) -> Option<&dyn Rotor> {
        None
    }

    fn piston(&self) -> Option<&dyn Piston> {
        None
    }

    fn controller(&self) -> Option<&dyn Controller> {
        None
    }

    fn surface(&self) -> Option<&dyn TextSurface> {
        None
    }
}

/// A block that can be switched on and off
pub trait Functional {
    fn is_enabled(&self) -> bool;
    fn set_enabled(&self, enabled: bool);
}

/// A block that can latch onto surfaces (landing gear, magnetic plates)
pub trait Lockable {
    fn auto_lock(&self) -> bool;
    fn set_auto_lock(&self, auto_lock: bool);
    fn lock(&self);
    fn unlock(&self);
    fn is_locked(&self) -> bool;
}

/// A rotational actuator. Angles are radians, limits are degrees.
pub trait Rotor {
    fn angle(&self) -> f32;
    fn velocity_rpm(&self) -> f32;
    fn set_velocity_rpm(&self, velocity: f32);
    fn set_lower_limit_deg(&self, limit: f32);
    fn set_upper_limit_deg(&self, limit: f32);
}

/// A linear actuator. Positions and limits are metres.
pub trait Piston {
    fn position(&self) -> f32;
    fn velocity(&self) -> f32;
    fn set_velocity(&self, velocity: f32);
    fn set_min_limit(&self, limit: f32);
    fn set_max_limit(&self, limit: f32);
}

/// A seat or remote control reporting the pilot's analog input
pub trait Controller {
    /// Movement: x = right, y = up, z = backward
    fn move_indicator(&self) -> Vec3;
    /// Rotation: x = pitch (positive down), y = yaw (positive right)
    fn rotation_indicator(&self) -> Vec2;
    /// Roll: positive clockwise
    fn roll_indicator(&self) -> f32;
    /// Whether this controller is flagged as the main one on the grid
    fn is_main(&self) -> bool {
        false
    }
}

/// A text display
pub trait TextSurface {
    fn write_text(&self, text: &str);
}

/// Shared handle to a host block
#[derive(Clone)]
pub struct BlockRef(Rc<dyn Block>);

impl BlockRef {
    /// Wrap a host block
    pub fn new<B: Block + 'static>(block: Rc<B>) -> Self {
        Self(block)
    }

    /// Whether both handles point at the same block
    pub fn same_block(&self, other: &BlockRef) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl Deref for BlockRef {
    type Target = dyn Block;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl From<Rc<dyn Block>> for BlockRef {
    fn from(block: Rc<dyn Block>) -> Self {
        Self(block)
    }
}

impl fmt::Debug for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BlockRef").field(&self.0.name()).finish()
    }
}

/// Lookup service over the host grid
pub trait BlockDirectory {
    /// Exact name match
    fn block_with_name(&self, name: &str) -> Option<BlockRef>;
    /// Every block whose name contains `fragment`
    fn search_blocks_of_name(&self, fragment: &str) -> Vec<BlockRef>;
    /// Members of a named group, `None` if the group does not exist
    fn group_with_name(&self, name: &str) -> Option<Vec<BlockRef>>;
    /// Every block on the grid
    fn blocks(&self) -> Vec<BlockRef>;
}

/// A capability a resolved block must offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Any block at all
    Any,
    Functional,
    Lockable,
    /// Rotors, pistons and other mechanical connections
    Mechanical,
    Controller,
    Surface,
}

impl Capability {
    /// Check whether a block offers this capability
    pub fn supported_by(self, block: &dyn Block) -> bool {
        match self {
            Capability::Any => true,
            Capability::Functional => block.functional().is_some(),
            Capability::Lockable => block.lockable().is_some(),
            Capability::Mechanical => block.is_mechanical(),
            Capability::Controller => block.controller().is_some(),
            Capability::Surface => block.surface().is_some(),
        }
    }
}
