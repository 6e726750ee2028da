//! Spatial keys: territory cells and exact block positions
//!
//! Deriving a cell from an actor's current position is the host
//! integration's job; the core only consumes the resulting keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete spatial unit eligible for exclusive ownership.
///
/// Identified by dimension plus cell coordinates; cells tile the world on
/// a fixed grid, so equality on the key is equality of territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    /// Dimension the cell belongs to
    pub dim: i32,
    /// Cell X coordinate
    pub x: i32,
    /// Cell Z coordinate
    pub z: i32,
}

impl CellPos {
    /// Create a cell key
    pub fn new(dim: i32, x: i32, z: i32) -> Self {
        Self { dim, x, z }
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell({}, {}, {})", self.dim, self.x, self.z)
    }
}

/// An exact block position, used for faction home points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// Dimension of the position
    pub dim: i32,
    /// Block X coordinate
    pub x: i32,
    /// Block Y coordinate
    pub y: i32,
    /// Block Z coordinate
    pub z: i32,
}

impl BlockPos {
    /// Create a block position
    pub fn new(dim: i32, x: i32, y: i32, z: i32) -> Self {
        Self { dim, x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}) in dim {}", self.x, self.y, self.z, self.dim)
    }
}
