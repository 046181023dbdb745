//! In-memory grid
//!
//! A self-contained [`BlockDirectory`] for tests, demos and dry runs. Blocks
//! are plain cells; nothing moves unless the caller moves it (see
//! [`MemoryGrid::settle`]).

use crate::{
    Block, BlockDirectory, BlockRef, Controller, Functional, Lockable, Piston, Rotor, TextSurface,
};
use glam::{Vec2, Vec3};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// What a [`MemoryBlock`] pretends to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryKind {
    /// No capabilities at all (armour, conveyors...)
    Generic,
    /// Can be switched on and off (lights, thrusters...)
    Functional,
    LandingGear,
    Rotor,
    Piston,
    /// Mechanical connection without an adapter
    Suspension,
    Controller,
    Surface,
    /// The programmable block hosting the sequencer: custom data and a surface
    Program,
}

/// A block backed by plain cells
#[derive(Debug)]
pub struct MemoryBlock {
    name: String,
    kind: MemoryKind,
    custom_data: RefCell<String>,
    enabled: Cell<bool>,
    auto_lock: Cell<bool>,
    locked: Cell<bool>,
    /// Radians for rotors, metres for pistons
    value: Cell<f32>,
    velocity: Cell<f32>,
    /// Degrees for rotors, metres for pistons
    limits: Cell<(f32, f32)>,
    move_indicator: Cell<Vec3>,
    rotation_indicator: Cell<Vec2>,
    roll_indicator: Cell<f32>,
    main: Cell<bool>,
    text: RefCell<String>,
}

impl MemoryBlock {
    /// Create a block of the given kind
    pub fn new(name: impl Into<String>, kind: MemoryKind) -> Self {
        let limits = match kind {
            MemoryKind::Rotor => (-360.0, 360.0),
            MemoryKind::Piston => (0.0, 10.0),
            _ => (0.0, 0.0),
        };
        Self {
            name: name.into(),
            kind,
            custom_data: RefCell::new(String::new()),
            enabled: Cell::new(true),
            auto_lock: Cell::new(false),
            locked: Cell::new(false),
            value: Cell::new(0.0),
            velocity: Cell::new(0.0),
            limits: Cell::new(limits),
            move_indicator: Cell::new(Vec3::ZERO),
            rotation_indicator: Cell::new(Vec2::ZERO),
            roll_indicator: Cell::new(0.0),
            main: Cell::new(false),
            text: RefCell::new(String::new()),
        }
    }

    pub fn generic(name: impl Into<String>) -> Self {
        Self::new(name, MemoryKind::Generic)
    }

    pub fn light(name: impl Into<String>) -> Self {
        Self::new(name, MemoryKind::Functional)
    }

    pub fn landing_gear(name: impl Into<String>) -> Self {
        Self::new(name, MemoryKind::LandingGear)
    }

    pub fn rotor(name: impl Into<String>) -> Self {
        Self::new(name, MemoryKind::Rotor)
    }

    pub fn piston(name: impl Into<String>) -> Self {
        Self::new(name, MemoryKind::Piston)
    }

    pub fn suspension(name: impl Into<String>) -> Self {
        Self::new(name, MemoryKind::Suspension)
    }

    pub fn controller(name: impl Into<String>) -> Self {
        Self::new(name, MemoryKind::Controller)
    }

    pub fn surface(name: impl Into<String>) -> Self {
        Self::new(name, MemoryKind::Surface)
    }

    /// A programmable block carrying configuration text
    pub fn program(name: impl Into<String>, custom_data: impl Into<String>) -> Self {
        let block = Self::new(name, MemoryKind::Program);
        *block.custom_data.borrow_mut() = custom_data.into();
        block
    }

    /// Builder: attach configuration text
    pub fn with_custom_data(self, custom_data: impl Into<String>) -> Self {
        *self.custom_data.borrow_mut() = custom_data.into();
        self
    }

    // === Test-side accessors ===

    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn auto_lock_enabled(&self) -> bool {
        self.auto_lock.get()
    }

    pub fn locked(&self) -> bool {
        self.locked.get()
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.set(locked);
    }

    /// Raw value: radians for rotors, metres for pistons
    pub fn value(&self) -> f32 {
        self.value.get()
    }

    pub fn set_value(&self, value: f32) {
        self.value.set(value);
    }

    pub fn angle_deg(&self) -> f32 {
        self.value.get().to_degrees()
    }

    pub fn set_angle_deg(&self, degrees: f32) {
        self.value.set(degrees.to_radians());
    }

    pub fn velocity(&self) -> f32 {
        self.velocity.get()
    }

    pub fn limits(&self) -> (f32, f32) {
        self.limits.get()
    }

    pub fn set_move_indicator(&self, indicator: Vec3) {
        self.move_indicator.set(indicator);
    }

    pub fn set_rotation_indicator(&self, indicator: Vec2) {
        self.rotation_indicator.set(indicator);
    }

    pub fn set_roll_indicator(&self, indicator: f32) {
        self.roll_indicator.set(indicator);
    }

    pub fn set_main(&self, main: bool) {
        self.main.set(main);
    }

    /// Last text written to this block's surface
    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    /// Jump to the limit the current velocity points at
    pub fn settle(&self) {
        let (lower, upper) = self.limits.get();
        let velocity = self.velocity.get();
        let (lower, upper) = match self.kind {
            MemoryKind::Rotor => (lower.to_radians(), upper.to_radians()),
            MemoryKind::Piston => (lower, upper),
            _ => return,
        };
        if velocity > 0.0 {
            self.value.set(upper);
        } else if velocity < 0.0 {
            self.value.set(lower);
        }
    }
}

impl Block for MemoryBlock {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn custom_data(&self) -> String {
        self.custom_data.borrow().clone()
    }

    fn set_custom_data(&self, data: &str) {
        *self.custom_data.borrow_mut() = data.to_string();
    }

    fn is_mechanical(&self) -> bool {
        matches!(
            self.kind,
            MemoryKind::Rotor | MemoryKind::Piston | MemoryKind::Suspension
        )
    }

    fn functional(&self) -> Option<&dyn Functional> {
        match self.kind {
            MemoryKind::Generic => None,
            _ => Some(self),
        }
    }

    fn lockable(&self) -> Option<&dyn Lockable> {
        match self.kind {
            MemoryKind::LandingGear => Some(self),
            _ => None,
        }
    }

    fn rotor(&self) -> Option<&dyn Rotor> {
        match self.kind {
            MemoryKind::Rotor => Some(self),
            _ => None,
        }
    }

    fn piston(&self) -> Option<&dyn Piston> {
        match self.kind {
            MemoryKind::Piston => Some(self),
            _ => None,
        }
    }

    fn controller(&self) -> Option<&dyn Controller> {
        match self.kind {
            MemoryKind::Controller => Some(self),
            _ => None,
        }
    }

    fn surface(&self) -> Option<&dyn TextSurface> {
        match self.kind {
            MemoryKind::Surface | MemoryKind::Program => Some(self),
            _ => None,
        }
    }
}

impl Functional for MemoryBlock {
    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }
}

impl Lockable for MemoryBlock {
    fn auto_lock(&self) -> bool {
        self.auto_lock.get()
    }

    fn set_auto_lock(&self, auto_lock: bool) {
        self.auto_lock.set(auto_lock);
    }

    fn lock(&self) {
        self.locked.set(true);
    }

    fn unlock(&self) {
        self.locked.set(false);
    }

    fn is_locked(&self) -> bool {
        self.locked.get()
    }
}

impl Rotor for MemoryBlock {
    fn angle(&self) -> f32 {
        self.value.get()
    }

    fn velocity_rpm(&self) -> f32 {
        self.velocity.get()
    }

    fn set_velocity_rpm(&self, velocity: f32) {
        self.velocity.set(velocity);
    }

    fn set_lower_limit_deg(&self, limit: f32) {
        let (_, upper) = self.limits.get();
        self.limits.set((limit, upper));
    }

    fn set_upper_limit_deg(&self, limit: f32) {
        let (lower, _) = self.limits.get();
        self.limits.set((lower, limit));
    }
}

impl Piston for MemoryBlock {
    fn position(&self) -> f32 {
        self.value.get()
    }

    fn velocity(&self) -> f32 {
        self.velocity.get()
    }

    fn set_velocity(&self, velocity: f32) {
        self.velocity.set(velocity);
    }

    fn set_min_limit(&self, limit: f32) {
        let (_, upper) = self.limits.get();
        self.limits.set((limit, upper));
    }

    fn set_max_limit(&self, limit: f32) {
        let (lower, _) = self.limits.get();
        self.limits.set((lower, limit));
    }
}

impl Controller for MemoryBlock {
    fn move_indicator(&self) -> Vec3 {
        self.move_indicator.get()
    }

    fn rotation_indicator(&self) -> Vec2 {
        self.rotation_indicator.get()
    }

    fn roll_indicator(&self) -> f32 {
        self.roll_indicator.get()
    }

    fn is_main(&self) -> bool {
        self.main.get()
    }
}

impl TextSurface for MemoryBlock {
    fn write_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_string();
    }
}

/// A grid of [`MemoryBlock`]s with named groups
#[derive(Debug, Default)]
pub struct MemoryGrid {
    /// All blocks in insertion order
    blocks: Vec<Rc<MemoryBlock>>,
    /// Group name -> member block names
    groups: IndexMap<String, Vec<String>>,
}

impl MemoryGrid {
    /// Create an empty grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block, returning a handle for later inspection
    pub fn add(&mut self, block: MemoryBlock) -> Rc<MemoryBlock> {
        let block = Rc::new(block);
        self.blocks.push(block.clone());
        block
    }

    /// Define a named group by member names
    pub fn add_group(&mut self, name: impl Into<String>, members: &[&str]) {
        self.groups.insert(
            name.into(),
            members.iter().map(|member| member.to_string()).collect(),
        );
    }

    /// Find a block by exact name
    pub fn get(&self, name: &str) -> Option<Rc<MemoryBlock>> {
        self.blocks.iter().find(|block| block.name == name).cloned()
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the grid is empty
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Move every actuator to the limit its velocity points at
    pub fn settle(&self) {
        for block in &self.blocks {
            block.settle();
        }
    }
}

impl BlockDirectory for MemoryGrid {
    fn block_with_name(&self, name: &str) -> Option<BlockRef> {
        self.get(name).map(BlockRef::new)
    }

    fn search_blocks_of_name(&self, fragment: &str) -> Vec<BlockRef> {
        self.blocks
            .iter()
            .filter(|block| block.name.contains(fragment))
            .cloned()
            .map(BlockRef::new)
            .collect()
    }

    fn group_with_name(&self, name: &str) -> Option<Vec<BlockRef>> {
        self.groups.get(name).map(|members| {
            members
                .iter()
                .filter_map(|member| self.block_with_name(member))
                .collect()
        })
    }

    fn blocks(&self) -> Vec<BlockRef> {
        self.blocks.iter().cloned().map(BlockRef::new).collect()
    }
}
