//! # Terra
//!
//! Isometric grid substrate for world simulation.
//!
//! Terra owns everything spatial and immutable about a loaded chapter:
//!
//! - **Coordinate transform**: grid cells to continuous world space and back
//! - **Grid maps**: rectangular Walkable/Blocked rasters
//! - **Walkability**: total collision queries with neighbourhood tolerance
//! - **Map generation**: the legacy seeded random-walk carver
//!
//! Nothing in this crate mutates after construction, so every type here can be
//! shared freely between the simulation and any collaborator that needs
//! spatial checks (spawn placement, debug overlays).
//!
//! ## Quick Start
//!
//! ```
//! use terra::{CoordinateTransform, GridMap, TileGeometry, Walkability, WalkabilityOracle};
//!
//! let grid = GridMap::from_rows(&["...", ".#.", "..."]).unwrap();
//! let transform = CoordinateTransform::new(TileGeometry::default()).unwrap();
//! let oracle = WalkabilityOracle::grid(transform, grid);
//!
//! let centre = transform.grid_to_world(1.0, 1.0);
//! assert!(!oracle.is_walkable_at_world(centre, 0));
//! assert!(oracle.is_walkable_at_world(centre, 1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod grid;
pub mod hash;
pub mod mapgen;
pub mod oracle;
pub mod transform;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-exports for convenience
pub use grid::{Cell, GridError, GridMap};
pub use hash::hash_grid;
pub use mapgen::{Lcg, RandomWalkConfig};
pub use oracle::{Walkability, WalkabilityOracle};
pub use transform::{CoordinateTransform, IsoBasis, TileGeometry, TileGeometryError};

/// Errors raised when a [`Boundary`] is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BoundaryError {
    /// One of the extents is NaN or infinite.
    #[error("boundary extents must be finite")]
    NonFinite,
    /// `min_x >= max_x` or `min_y >= max_y`.
    #[error("boundary is empty: x {min_x}..{max_x}, y {min_y}..{max_y}")]
    Empty {
        /// Left edge
        min_x: f32,
        /// Right edge
        max_x: f32,
        /// Top edge
        min_y: f32,
        /// Bottom edge
        max_y: f32,
    },
}

/// Axis-aligned world-space rectangle that overrides grid-index bounds checks.
///
/// When a chapter carries a boundary, containment is a plain rectangle test
/// and walkability is looked up through a flat raster mapping of the
/// rectangle onto the grid (see [`WalkabilityOracle::bounded`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    /// Left edge
    pub min_x: f32,
    /// Right edge
    pub max_x: f32,
    /// Top edge
    pub min_y: f32,
    /// Bottom edge
    pub max_y: f32,
}

impl Boundary {
    /// Create a validated boundary.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] if any extent is non-finite or the rectangle
    /// has zero or negative area.
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Result<Self, BoundaryError> {
        let boundary = Self {
            min_x,
            max_x,
            min_y,
            max_y,
        };
        boundary.validate()?;
        Ok(boundary)
    }

    /// Check the `min < max` invariant on both axes.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError`] when the invariant does not hold.
    pub fn validate(&self) -> Result<(), BoundaryError> {
        let extents = [self.min_x, self.max_x, self.min_y, self.max_y];
        if extents.iter().any(|v| !v.is_finite()) {
            return Err(BoundaryError::NonFinite);
        }
        if self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(BoundaryError::Empty {
                min_x: self.min_x,
                max_x: self.max_x,
                min_y: self.min_y,
                max_y: self.max_y,
            });
        }
        Ok(())
    }

    /// Width of the rectangle.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Height of the rectangle.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Centre of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    /// Check if a point is inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Map a point into `[0,1] x [0,1]` over the rectangle's extents.
    ///
    /// Points outside the rectangle map outside the unit square; callers
    /// check [`Boundary::contains`] first.
    #[must_use]
    pub fn normalize(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            (point.x - self.min_x) / self.width(),
            (point.y - self.min_y) / self.height(),
        )
    }

    /// Return the rectangle moved inward by `margin` on every side.
    ///
    /// An axis narrower than `2 * margin` collapses onto its centre line
    /// instead of inverting.
    #[must_use]
    pub fn shrink(&self, margin: f32) -> Self {
        let center = self.center();
        let (min_x, max_x) = if self.width() >= 2.0 * margin {
            (self.min_x + margin, self.max_x - margin)
        } else {
            (center.x, center.x)
        };
        let (min_y, max_y) = if self.height() >= 2.0 * margin {
            (self.min_y + margin, self.max_y - margin)
        } else {
            (center.y, center.y)
        };
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Clamp a point into the rectangle.
    #[must_use]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.min_x, self.max_x),
            point.y.clamp(self.min_y, self.max_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_rejects_empty() {
        assert!(matches!(
            Boundary::new(10.0, 10.0, 0.0, 5.0),
            Err(BoundaryError::Empty { .. })
        ));
        assert!(matches!(
            Boundary::new(0.0, 10.0, 5.0, -5.0),
            Err(BoundaryError::Empty { .. })
        ));
        assert_eq!(
            Boundary::new(0.0, f32::NAN, 0.0, 5.0),
            Err(BoundaryError::NonFinite)
        );
    }

    #[test]
    fn test_boundary_contains_is_inclusive() {
        let boundary = Boundary::new(-10.0, 10.0, 0.0, 20.0).unwrap();
        assert!(boundary.contains(Vec2::new(-10.0, 0.0)));
        assert!(boundary.contains(Vec2::new(10.0, 20.0)));
        assert!(!boundary.contains(Vec2::new(10.1, 5.0)));
        assert!(!boundary.contains(Vec2::new(0.0, -0.1)));
    }

    #[test]
    fn test_boundary_normalize() {
        let boundary = Boundary::new(100.0, 300.0, -50.0, 50.0).unwrap();
        assert_eq!(boundary.normalize(Vec2::new(100.0, -50.0)), Vec2::ZERO);
        assert_eq!(boundary.normalize(Vec2::new(300.0, 50.0)), Vec2::ONE);
        assert_eq!(boundary.normalize(Vec2::new(200.0, 0.0)), Vec2::splat(0.5));
    }

    #[test]
    fn test_boundary_shrink_and_clamp() {
        let boundary = Boundary::new(0.0, 100.0, 0.0, 40.0).unwrap();
        let inner = boundary.shrink(10.0);
        assert_eq!(inner, Boundary::new(10.0, 90.0, 10.0, 30.0).unwrap());
        assert_eq!(inner.clamp(Vec2::new(-5.0, 100.0)), Vec2::new(10.0, 30.0));
    }

    #[test]
    fn test_boundary_shrink_collapses_narrow_axis() {
        let boundary = Boundary::new(0.0, 10.0, 0.0, 100.0).unwrap();
        let inner = boundary.shrink(20.0);
        assert_eq!(inner.min_x, 5.0);
        assert_eq!(inner.max_x, 5.0);
        assert_eq!(inner.min_y, 20.0);
        assert_eq!(inner.max_y, 80.0);
    }

    #[test]
    fn test_boundary_serde_roundtrip() {
        let boundary = Boundary::new(-1.0, 1.0, -2.0, 2.0).unwrap();
        let json = serde_json::to_string(&boundary).unwrap();
        let back: Boundary = serde_json::from_str(&json).unwrap();
        assert_eq!(boundary, back);
    }
}
