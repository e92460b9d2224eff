//! Walkability oracle: "can an entity stand at this world point?"
//!
//! The oracle runs in one of two modes, chosen when a chapter is loaded:
//!
//! - **Grid mode**: the world point is unprojected through the isometric
//!   transform, rounded to the nearest cell, and looked up in the grid.
//! - **Boundary mode**: containment is a plain rectangle test. The point is
//!   then normalized over the rectangle and mapped linearly onto the grid's
//!   index space, treating the grid as a flat raster mask rather than the
//!   isometric diamond. Without a mask, containment alone decides.
//!
//! Every query is total: points outside the world, NaN coordinates and
//! absurd tolerances all answer `false` or fall back to a bounded scan rather
//! than panicking.

use glam::{IVec2, Vec2};

use crate::grid::GridMap;
use crate::transform::CoordinateTransform;
use crate::Boundary;

/// Read-only collision queries over world space.
///
/// [`WalkabilityOracle`] is the production implementation; movement code is
/// generic over this trait so tests can substitute simple predicates.
pub trait Walkability {
    /// Returns `true` if the point lies inside the playable world.
    fn is_in_bounds(&self, point: Vec2) -> bool;

    /// Returns `true` if an entity may occupy `point`.
    ///
    /// With `tolerance > 0`, a blocked cell still passes when any cell in the
    /// Chebyshev neighbourhood of that radius is walkable. The set of passing
    /// points only grows as `tolerance` grows.
    fn is_walkable_at_world(&self, point: Vec2, tolerance: u32) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
enum OracleMode {
    Grid(GridMap),
    Bounded {
        boundary: Boundary,
        mask: Option<GridMap>,
    },
}

/// Collision oracle for one loaded chapter.
///
/// # Example
///
/// ```
/// use glam::Vec2;
/// use terra::{Boundary, CoordinateTransform, GridMap, TileGeometry, Walkability, WalkabilityOracle};
///
/// let transform = CoordinateTransform::new(TileGeometry::default()).unwrap();
/// let boundary = Boundary::new(0.0, 100.0, 0.0, 100.0).unwrap();
/// let mask = GridMap::from_rows(&["#.", ".."]).unwrap();
/// let oracle = WalkabilityOracle::bounded(transform, boundary, Some(mask));
///
/// assert!(!oracle.is_walkable_at_world(Vec2::new(10.0, 10.0), 0)); // top-left quadrant
/// assert!(oracle.is_walkable_at_world(Vec2::new(90.0, 10.0), 0));
/// assert!(!oracle.is_walkable_at_world(Vec2::new(150.0, 10.0), 5)); // outside
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WalkabilityOracle {
    transform: CoordinateTransform,
    mode: OracleMode,
}

impl WalkabilityOracle {
    /// Grid-mode oracle: lookups go through the isometric transform.
    #[must_use]
    pub fn grid(transform: CoordinateTransform, grid: GridMap) -> Self {
        Self {
            transform,
            mode: OracleMode::Grid(grid),
        }
    }

    /// Boundary-mode oracle with an optional raster mask.
    #[must_use]
    pub fn bounded(
        transform: CoordinateTransform,
        boundary: Boundary,
        mask: Option<GridMap>,
    ) -> Self {
        Self {
            transform,
            mode: OracleMode::Bounded { boundary, mask },
        }
    }

    /// The coordinate transform this oracle was built with.
    #[must_use]
    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    /// The boundary, when running in boundary mode.
    #[must_use]
    pub fn boundary(&self) -> Option<&Boundary> {
        match &self.mode {
            OracleMode::Grid(_) => None,
            OracleMode::Bounded { boundary, .. } => Some(boundary),
        }
    }

    /// The grid (grid mode) or raster mask (boundary mode), if any.
    #[must_use]
    pub fn grid_map(&self) -> Option<&GridMap> {
        match &self.mode {
            OracleMode::Grid(grid) => Some(grid),
            OracleMode::Bounded { mask, .. } => mask.as_ref(),
        }
    }

    /// Returns `true` if the cell exists and is walkable.
    ///
    /// Without an attached grid there are no cells, so this is `false`.
    #[must_use]
    pub fn is_walkable_cell(&self, gx: i32, gy: i32) -> bool {
        self.grid_map().is_some_and(|grid| grid.is_walkable(gx, gy))
    }

    /// The grid cell a world point falls in, or `None` when the point is out
    /// of bounds or there is no grid to index.
    #[must_use]
    pub fn cell_at_world(&self, point: Vec2) -> Option<IVec2> {
        match &self.mode {
            OracleMode::Grid(grid) => {
                if !point.is_finite() {
                    return None;
                }
                let cell = self.transform.world_to_cell(point);
                grid.contains(cell.x, cell.y).then_some(cell)
            }
            OracleMode::Bounded { boundary, mask } => {
                let grid = mask.as_ref()?;
                if !boundary.contains(point) {
                    return None;
                }
                Some(raster_cell(grid, boundary.normalize(point)))
            }
        }
    }

    fn neighbourhood_walkable(grid: &GridMap, center: IVec2, tolerance: u32) -> bool {
        // No neighbourhood wider than the grid can find anything new
        let limit = grid.width().max(grid.height());
        let radius = i32::try_from(tolerance.min(limit)).unwrap_or(i32::MAX);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if grid.is_walkable(center.x + dx, center.y + dy) {
                    return true;
                }
            }
        }
        false
    }
}

/// Map a normalized `[0,1]^2` point onto raster cell indices.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn raster_cell(grid: &GridMap, normalized: Vec2) -> IVec2 {
    let max_x = grid.width() as i32 - 1;
    let max_y = grid.height() as i32 - 1;
    let gx = (normalized.x * grid.width() as f32).floor() as i32;
    let gy = (normalized.y * grid.height() as f32).floor() as i32;
    IVec2::new(gx.clamp(0, max_x), gy.clamp(0, max_y))
}

impl Walkability for WalkabilityOracle {
    fn is_in_bounds(&self, point: Vec2) -> bool {
        match &self.mode {
            OracleMode::Grid(_) => self.cell_at_world(point).is_some(),
            OracleMode::Bounded { boundary, .. } => boundary.contains(point),
        }
    }

    fn is_walkable_at_world(&self, point: Vec2, tolerance: u32) -> bool {
        if !self.is_in_bounds(point) {
            return false;
        }
        let Some(grid) = self.grid_map() else {
            // Boundary mode without a mask: containment is the only signal
            return true;
        };
        let Some(cell) = self.cell_at_world(point) else {
            return false;
        };
        if grid.is_walkable(cell.x, cell.y) {
            return true;
        }
        tolerance > 0 && Self::neighbourhood_walkable(grid, cell, tolerance)
    }
}

// =============================================================================
// Tests
// =============================================================================
