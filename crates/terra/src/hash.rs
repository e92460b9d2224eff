//! Grid hashing for determinism verification.
//!
//! Two grids built from identical inputs must produce identical hashes. The
//! generator tests and the headless runner use this to check that a chapter
//! layout is reproducible across runs.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::grid::{Cell, GridMap};

/// Compute a deterministic hash of a grid's dimensions and cells.
#[must_use]
pub fn hash_grid(grid: &GridMap) -> u64 {
    let mut hasher = DefaultHasher::new();
    grid.width().hash(&mut hasher);
    grid.height().hash(&mut hasher);
    for cell in grid.cells() {
        // Explicit discriminants keep the hash independent of enum layout
        let byte: u8 = match cell {
            Cell::Blocked => 0,
            Cell::Walkable => 1,
        };
        byte.hash(&mut hasher);
    }
    hasher.finish()
}
