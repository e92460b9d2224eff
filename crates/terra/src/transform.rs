//! Isometric grid <-> world coordinate transform.
//!
//! Grid cell `(gx, gy)` projects onto the world plane as a diamond:
//!
//! ```text
//! x = (gx - gy) * half_tile_width
//! y = (gx + gy) * y_spacing
//! ```
//!
//! where `y_spacing = tile_height / 2 * y_spacing_multiplier`. The multiplier
//! is a visual compression factor configured per chapter, not something
//! derived from the tile height alone. The inverse is exact, so
//! `world_to_grid(grid_to_world(g)) == g` up to floating-point rounding.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when tile geometry cannot produce an invertible transform.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TileGeometryError {
    /// A dimension is zero, negative, NaN or infinite.
    #[error("tile {field} must be finite and positive, got {value}")]
    NonPositive {
        /// Which dimension was rejected
        field: &'static str,
        /// The offending value
        value: f32,
    },
}

/// Tile dimensions for a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileGeometry {
    /// Full tile width in world units
    pub width: f32,
    /// Full tile height in world units
    pub height: f32,
    /// Vertical compression applied on top of the half tile height
    #[serde(default = "default_y_spacing_multiplier")]
    pub y_spacing_multiplier: f32,
}

fn default_y_spacing_multiplier() -> f32 {
    1.0
}

impl Default for TileGeometry {
    fn default() -> Self {
        Self {
            width: 64.0,
            height: 32.0,
            y_spacing_multiplier: default_y_spacing_multiplier(),
        }
    }
}

impl TileGeometry {
    /// Check that every dimension is finite and positive.
    ///
    /// # Errors
    ///
    /// Returns [`TileGeometryError::NonPositive`] naming the first bad field.
    pub fn validate(&self) -> Result<(), TileGeometryError> {
        for (field, value) in [
            ("width", self.width),
            ("height", self.height),
            ("y_spacing_multiplier", self.y_spacing_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TileGeometryError::NonPositive { field, value });
            }
        }
        Ok(())
    }
}

/// The four screen-space diagonals of the isometric grid, as unit vectors.
///
/// Each diagonal is the world-space direction of one grid axis, so they sit
/// at the isometric angle implied by the tile geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsoBasis {
    /// Direction of `-gy` (up and to the right on screen)
    pub top_right: Vec2,
    /// Direction of `+gx`
    pub bottom_right: Vec2,
    /// Direction of `+gy`
    pub bottom_left: Vec2,
    /// Direction of `-gx`
    pub top_left: Vec2,
}

impl IsoBasis {
    /// All four diagonals in clockwise order starting at top-right.
    #[must_use]
    pub fn all(&self) -> [Vec2; 4] {
        [
            self.top_right,
            self.bottom_right,
            self.bottom_left,
            self.top_left,
        ]
    }
}

/// Pure grid <-> world converter for one tile geometry.
///
/// # Example
///
/// ```
/// use terra::{CoordinateTransform, TileGeometry};
///
/// let transform = CoordinateTransform::new(TileGeometry::default()).unwrap();
/// let world = transform.grid_to_world(3.0, 1.0);
/// assert_eq!(world.x, 64.0);
/// assert_eq!(world.y, 64.0);
///
/// let grid = transform.world_to_grid(world);
/// assert!((grid.x - 3.0).abs() < 1e-5);
/// assert!((grid.y - 1.0).abs() < 1e-5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    half_tile_width: f32,
    y_spacing: f32,
}

impl CoordinateTransform {
    /// Build a transform from validated tile geometry.
    ///
    /// # Errors
    ///
    /// Returns [`TileGeometryError`] if the geometry would make the
    /// transform non-invertible.
    pub fn new(tile: TileGeometry) -> Result<Self, TileGeometryError> {
        tile.validate()?;
        Ok(Self {
            half_tile_width: tile.width / 2.0,
            y_spacing: tile.height / 2.0 * tile.y_spacing_multiplier,
        })
    }

    /// Half the tile width (world units per grid step along x).
    #[must_use]
    pub fn half_tile_width(&self) -> f32 {
        self.half_tile_width
    }

    /// Vertical world units per grid step.
    #[must_use]
    pub fn y_spacing(&self) -> f32 {
        self.y_spacing
    }

    /// Project a (possibly fractional) grid coordinate into world space.
    #[must_use]
    pub fn grid_to_world(&self, gx: f32, gy: f32) -> Vec2 {
        Vec2::new(
            (gx - gy) * self.half_tile_width,
            (gx + gy) * self.y_spacing,
        )
    }

    /// Project the centre of an integer cell into world space.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_to_world(&self, cell: IVec2) -> Vec2 {
        self.grid_to_world(cell.x as f32, cell.y as f32)
    }

    /// Unproject a world point into fractional grid coordinates.
    ///
    /// The result is not rounded; see [`CoordinateTransform::world_to_cell`].
    #[must_use]
    pub fn world_to_grid(&self, world: Vec2) -> Vec2 {
        let u = world.x / self.half_tile_width;
        let v = world.y / self.y_spacing;
        Vec2::new((u + v) / 2.0, (v - u) / 2.0)
    }

    /// Unproject a world point and round to the nearest cell.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn world_to_cell(&self, world: Vec2) -> IVec2 {
        let grid = self.world_to_grid(world).round();
        IVec2::new(grid.x as i32, grid.y as i32)
    }

    /// Unit vectors along the four isometric diagonals.
    #[must_use]
    pub fn iso_basis(&self) -> IsoBasis {
        let bottom_right = Vec2::new(self.half_tile_width, self.y_spacing).normalize();
        let bottom_left = Vec2::new(-self.half_tile_width, self.y_spacing).normalize();
        IsoBasis {
            top_right: -bottom_left,
            bottom_right,
            bottom_left,
            top_left: -bottom_right,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
