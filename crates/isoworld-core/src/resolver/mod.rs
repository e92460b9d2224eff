//! Collision-aware movement.
//!
//! Movement is resolved one axis at a time against a [`Walkability`]
//! implementation, so an entity pushing diagonally into a wall keeps sliding
//! along the open axis. There is no path search: a move either fits per axis
//! or that axis stops.
//!
//! - [`MovementResolver`]: per-axis resolution plus boundary clamp
//! - [`IsoInputBlender`]: player-only steering towards open isometric
//!   diagonals near walls
//!
//! # Time scaling
//!
//! Speeds are tuned for a 60 Hz baseline. A tick of `dt` seconds moves an
//! entity by `velocity * dt * BASELINE_HZ`, so motion stays correct at other
//! refresh rates.
//!
//! [`Walkability`]: terra::Walkability

mod iso_input;
mod movement;

pub use iso_input::{IsoInputBlender, ISO_INPUT_THRESHOLD, ISO_PROBE_DISTANCE};
pub use movement::{MoveOutcome, MovementResolver, CLAMP_MARGIN};

use glam::Vec2;

/// Update rate the configured speeds are tuned for.
pub const BASELINE_HZ: f32 = 60.0;

/// World-space displacement for one tick.
///
/// # Example
///
/// ```
/// use glam::Vec2;
/// use isoworld_core::resolver::frame_delta;
///
/// // One baseline frame moves by exactly the velocity
/// assert_eq!(frame_delta(Vec2::new(3.0, 0.0), 1.0 / 60.0), Vec2::new(3.0, 0.0));
/// ```
#[must_use]
pub fn frame_delta(velocity: Vec2, dt: f32) -> Vec2 {
    velocity * (dt * BASELINE_HZ)
}
