//! Isometric input blending.
//!
//! Raw directional input is projected onto the four screen-space isometric
//! diagonals. Each diagonal the input leans towards (dot product above
//! [`ISO_INPUT_THRESHOLD`]) is probed a short distance ahead of the foot
//! point; open diagonals contribute `basis * dot` to the steering vector. The
//! sum is not renormalized. When nothing contributes, the normalized raw input
//! is used unchanged.

use glam::Vec2;
use terra::{CoordinateTransform, Walkability};

/// Minimum alignment between input and a diagonal for it to be considered.
pub const ISO_INPUT_THRESHOLD: f32 = 0.2;

/// Lookahead along a diagonal when probing for open ground.
pub const ISO_PROBE_DISTANCE: f32 = 10.0;

/// Steers player input towards open isometric diagonals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsoInputBlender {
    basis: [Vec2; 4],
    probe_distance: f32,
    threshold: f32,
}

impl IsoInputBlender {
    /// Blender for the diagonals of `transform`'s tiles.
    #[must_use]
    pub fn new(transform: &CoordinateTransform) -> Self {
        Self {
            basis: transform.iso_basis().all(),
            probe_distance: ISO_PROBE_DISTANCE,
            threshold: ISO_INPUT_THRESHOLD,
        }
    }

    /// Steering direction for `input` at `foot`.
    ///
    /// # Arguments
    ///
    /// * `input` - Raw directional input, any magnitude
    /// * `foot` - Collision sampling point of the player
    /// * `oracle` - Collision queries
    /// * `tolerance` - Neighbourhood tolerance for the probes
    ///
    /// # Returns
    ///
    /// The blended vector, or the normalized input when no diagonal is open.
    /// Zero input stays zero.
    pub fn blend<W: Walkability + ?Sized>(
        &self,
        input: Vec2,
        foot: Vec2,
        oracle: &W,
        tolerance: u32,
    ) -> Vec2 {
        let direction = input.normalize_or_zero();
        if direction == Vec2::ZERO {
            return Vec2::ZERO;
        }

        let mut blended = Vec2::ZERO;
        let mut contributed = false;
        for basis in self.basis {
            let dot = direction.dot(basis);
            if dot > self.threshold
                && oracle.is_walkable_at_world(foot + basis * self.probe_distance, tolerance)
            {
                blended += basis * dot;
                contributed = true;
            }
        }

        if contributed {
            blended
        } else {
            direction
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra::TileGeometry;

    struct Predicate<F: Fn(Vec2) -> bool>(F);

    impl<F: Fn(Vec2) -> bool> Walkability for Predicate<F> {
        fn is_in_bounds(&self, _point: Vec2) -> bool {
            true
        }

        fn is_walkable_at_world(&self, point: Vec2, _tolerance: u32) -> bool {
            (self.0)(point)
        }
    }

    fn blender() -> IsoInputBlender {
        IsoInputBlender::new(&CoordinateTransform::new(TileGeometry::default()).unwrap())
    }

    #[test]
    fn zero_input_stays_zero() {
        let out = blender().blend(Vec2::ZERO, Vec2::ZERO, &Predicate(|_| true), 0);
        assert_eq!(out, Vec2::ZERO);
    }

    #[test]
    fn open_ground_sums_both_leaning_diagonals() {
        let out = blender().blend(Vec2::new(5.0, 0.0), Vec2::ZERO, &Predicate(|_| true), 0);
        // Symmetric diagonals cancel vertically and add horizontally
        assert!(out.y.abs() < 1e-5);
        assert!(out.x > 1.0);
    }

    #[test]
    fn wall_above_slides_down_the_open_diagonal() {
        let out = blender().blend(
            Vec2::new(1.0, 0.0),
            Vec2::ZERO,
            &Predicate(|p: Vec2| p.y >= 0.0),
            0,
        );
        let bottom_right = Vec2::new(32.0, 16.0).normalize();
        let expected = bottom_right * bottom_right.x;
        assert!((out - expected).length() < 1e-5);
    }

    #[test]
    fn all_blocked_falls_back_to_raw_direction() {
        let out = blender().blend(Vec2::new(3.0, 4.0), Vec2::ZERO, &Predicate(|_| false), 0);
        assert!((out - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn only_diagonals_above_threshold_contribute() {
        // Perpendicular to bottom-right: only bottom-left leans far enough
        let bottom_right = Vec2::new(32.0, 16.0).normalize();
        let bottom_left = Vec2::new(-32.0, 16.0).normalize();
        let input = bottom_right.perp();
        let out = blender().blend(input, Vec2::ZERO, &Predicate(|_| true), 0);
        let expected = bottom_left * input.dot(bottom_left);
        assert!((out - expected).length() < 1e-5);
    }
}
