//! Legacy random-walk map generator.
//!
//! Starts from an all-blocked grid and walks a single digger from the centre
//! cell, carving walkable cells until the requested share of the map is open.
//! Randomness comes from a linear-congruential generator with a fixed default
//! seed, so a given `(width, height, ratio, seed)` always yields the same grid.
//! The outer ring of cells is never carved.

use glam::IVec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::{Cell, GridError, GridMap};

/// Seed used when a chapter does not override it.
pub const LEGACY_SEED: u32 = 12_345;

const LCG_MULTIPLIER: u64 = 1_103_515_245;
const LCG_INCREMENT: u64 = 12_345;
const LCG_MASK: u64 = 0x7fff_ffff;

/// Upper bound on digger steps, per grid cell.
const MAX_STEPS_PER_CELL: usize = 400;

const STEPS: [IVec2; 4] = [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y];

/// Linear-congruential generator, modulus `2^31`.
///
/// # Example
///
/// ```
/// use terra::Lcg;
///
/// let mut a = Lcg::new(7);
/// let mut b = Lcg::new(7);
/// assert_eq!(a.next_u32(), b.next_u32());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Create a generator from a seed.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            state: u64::from(seed) & LCG_MASK,
        }
    }

    /// Advance and return the next 31-bit state.
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT)
            & LCG_MASK;
        self.state as u32
    }

    /// Draw an index in `0..bound` from the high bits of the state.
    ///
    /// The low bits of a power-of-two LCG have short periods, so they are
    /// discarded.
    pub fn next_index(&mut self, bound: u32) -> u32 {
        (self.next_u32() >> 16) % bound.max(1)
    }
}

/// Parameters for [`RandomWalkConfig::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomWalkConfig {
    /// Grid width in cells (at least 3)
    pub width: u32,
    /// Grid height in cells (at least 3)
    pub height: u32,
    /// Share of all cells to carve, in `(0, 1]`
    pub ratio: f32,
    /// LCG seed
    #[serde(default = "default_seed")]
    pub seed: u32,
}

fn default_seed() -> u32 {
    LEGACY_SEED
}

impl RandomWalkConfig {
    /// Legacy parameters with the default seed.
    #[must_use]
    pub fn new(width: u32, height: u32, ratio: f32) -> Self {
        Self {
            width,
            height,
            ratio,
            seed: LEGACY_SEED,
        }
    }

    /// Cell the digger starts from; always walkable in the result.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn start_cell(&self) -> IVec2 {
        IVec2::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    /// Carve a grid.
    ///
    /// The walk stops once `ratio * width * height` cells are open (capped at
    /// the interior size) or after a bounded number of steps, whichever comes
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidGenerator`] for grids smaller than 3x3 or a
    /// ratio outside `(0, 1]`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss
    )]
    pub fn generate(&self) -> Result<GridMap, GridError> {
        if self.width < 3 || self.height < 3 {
            return Err(GridError::InvalidGenerator(format!(
                "grid must be at least 3x3, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.ratio > 0.0 && self.ratio <= 1.0) {
            return Err(GridError::InvalidGenerator(format!(
                "ratio must be in (0, 1], got {}",
                self.ratio
            )));
        }

        let mut grid = GridMap::filled(self.width, self.height, Cell::Blocked)?;
        let total = self.width as usize * self.height as usize;
        let interior = (self.width as usize - 2) * (self.height as usize - 2);
        let target = ((total as f64 * f64::from(self.ratio)).ceil() as usize).clamp(1, interior);
        let max_steps = total * MAX_STEPS_PER_CELL;

        let (max_x, max_y) = (self.width as i32 - 2, self.height as i32 - 2);
        let mut rng = Lcg::new(self.seed);
        let mut digger = self.start_cell();
        grid.set(digger.x, digger.y, Cell::Walkable);
        let mut carved = 1usize;
        let mut steps = 0usize;

        while carved < target && steps < max_steps {
            steps += 1;
            let next = digger + STEPS[rng.next_index(4) as usize];
            if next.x < 1 || next.y < 1 || next.x > max_x || next.y > max_y {
                continue;
            }
            digger = next;
            if !grid.is_walkable(digger.x, digger.y) {
                grid.set(digger.x, digger.y, Cell::Walkable);
                carved += 1;
            }
        }

        debug!(
            width = self.width,
            height = self.height,
            seed = self.seed,
            carved,
            target,
            steps,
            "map_generated"
        );
        Ok(grid)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_grid;

    mod lcg_tests {
        use super::*;

        #[test]
        fn known_sequence() {
            let mut rng = Lcg::new(LEGACY_SEED);
            // 1103515245 * 12345 + 12345 mod 2^31
            assert_eq!(rng.next_u32(), 1_406_932_606);
        }

        #[test]
        fn state_stays_31_bit() {
            let mut rng = Lcg::new(u32::MAX);
            for _ in 0..1000 {
                assert!(rng.next_u32() <= 0x7fff_ffff);
            }
        }

        #[test]
        fn next_index_covers_range() {
            let mut rng = Lcg::new(1);
            let mut seen = [false; 4];
            for _ in 0..200 {
                seen[rng.next_index(4) as usize] = true;
            }
            assert!(seen.iter().all(|s| *s));
        }
    }

    mod generate_tests {
        use super::*;

        #[test]
        fn rejects_bad_parameters() {
            assert!(RandomWalkConfig::new(2, 10, 0.5).generate().is_err());
            assert!(RandomWalkConfig::new(10, 10, 0.0).generate().is_err());
            assert!(RandomWalkConfig::new(10, 10, 1.5).generate().is_err());
            assert!(RandomWalkConfig::new(10, 10, f32::NAN).generate().is_err());
        }

        #[test]
        fn legacy_map_is_reproducible() {
            let config = RandomWalkConfig::new(160, 160, 0.7);
            let first = config.generate().unwrap();
            let second = config.generate().unwrap();

            assert_eq!(first.cells(), second.cells());
            assert_eq!(hash_grid(&first), hash_grid(&second));
            assert_eq!(config.start_cell(), IVec2::new(80, 80));
            assert!(first.is_walkable(80, 80));
        }

        #[test]
        fn legacy_map_reaches_ratio() {
            let config = RandomWalkConfig::new(160, 160, 0.7);
            let grid = config.generate().unwrap();
            assert!(grid.walkable_count() >= 17_920);
        }

        #[test]
        fn border_ring_stays_blocked() {
            let grid = RandomWalkConfig::new(24, 16, 1.0).generate().unwrap();
            for x in 0..24 {
                assert!(!grid.is_walkable(x, 0));
                assert!(!grid.is_walkable(x, 15));
            }
            for y in 0..16 {
                assert!(!grid.is_walkable(0, y));
                assert!(!grid.is_walkable(23, y));
            }
            assert_eq!(grid.walkable_count(), 22 * 14);
        }

        #[test]
        fn different_seeds_differ() {
            let a = RandomWalkConfig::new(40, 40, 0.4).generate().unwrap();
            let b = RandomWalkConfig {
                seed: 99,
                ..RandomWalkConfig::new(40, 40, 0.4)
            }
            .generate()
            .unwrap();
            assert_ne!(a.cells(), b.cells());
        }
    }
}
