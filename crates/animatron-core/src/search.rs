//! Component resolution
//!
//! Turns a textual reference from a step line into the blocks it names.
//! Nothing matching is not an error: the step simply drives no blocks.

use crate::token::Token;
use crate::{BlockDirectory, BlockRef, Capability, Mechanical};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a step line refers to its blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchKind {
    /// Exact block name
    Block,
    /// Every block whose name contains the search string
    Blocks,
    /// Members of a named group
    Group,
}

impl Token for SearchKind {
    const KIND: &'static str = "search type";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("Block", SearchKind::Block),
        ("Blocks", SearchKind::Blocks),
        ("Group", SearchKind::Group),
    ];
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Resolve a reference to the blocks that offer `capability`
pub fn find_blocks(
    directory: &dyn BlockDirectory,
    kind: SearchKind,
    search: &str,
    capability: Capability,
) -> Vec<BlockRef> {
    let found = match kind {
        SearchKind::Block => directory.block_with_name(search).into_iter().collect(),
        SearchKind::Blocks => directory.search_blocks_of_name(search),
        SearchKind::Group => directory.group_with_name(search).unwrap_or_default(),
    };

    let matching: Vec<BlockRef> = found
        .into_iter()
        .filter(|block| capability.supported_by(&**block))
        .collect();

    if matching.is_empty() {
        log::warn!("{kind} '{search}' matched no {capability:?} blocks");
    }
    matching
}

/// Resolve a reference to mechanical actuators, wrapping each one
pub fn find_mechanical(
    directory: &dyn BlockDirectory,
    kind: SearchKind,
    search: &str,
) -> Vec<Mechanical> {
    find_blocks(directory, kind, search, Capability::Mechanical)
        .into_iter()
        .map(Mechanical::wrap)
        .collect()
}

/// Every block on the grid offering `capability`
pub fn blocks_of_type(directory: &dyn BlockDirectory, capability: Capability) -> Vec<BlockRef> {
    directory
        .blocks()
        .into_iter()
        .filter(|block| capability.supported_by(&**block))
        .collect()
}
