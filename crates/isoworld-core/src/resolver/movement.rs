//! Per-axis movement resolution.

use glam::Vec2;
use terra::{Boundary, Walkability};
use tracing::trace;

use crate::config::ChapterWorld;
use crate::entity::AnimatedBody;

/// Inward margin applied when clamping positions into the boundary.
pub const CLAMP_MARGIN: f32 = 10.0;

/// Result of resolving one move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    /// Final position
    pub position: Vec2,
    /// Velocity with blocked or clamped axes zeroed
    pub velocity: Vec2,
    /// Displacement that was requested
    pub delta: Vec2,
    /// The X step hit a blocked point
    pub blocked_x: bool,
    /// The Y step hit a blocked point
    pub blocked_y: bool,
    /// X was pulled back inside the boundary
    pub clamped_x: bool,
    /// Y was pulled back inside the boundary
    pub clamped_y: bool,
}

impl MoveOutcome {
    /// Returns `true` if a move was requested and every axis it touched was
    /// blocked.
    #[must_use]
    pub fn is_stuck(&self) -> bool {
        self.delta != Vec2::ZERO
            && (self.delta.x == 0.0 || self.blocked_x)
            && (self.delta.y == 0.0 || self.blocked_y)
    }
}

/// Applies displacements under collision constraints.
///
/// Each axis is probed at the entity's foot point (its anchor shifted down
/// by `vertical_offset`). The X step is tried first; the Y step is then
/// probed from wherever X ended up. A blocked axis keeps its old coordinate
/// and has its velocity zeroed. With a boundary configured, the result is
/// finally clamped [`CLAMP_MARGIN`] inside it.
///
/// # Example
///
/// ```
/// use glam::Vec2;
/// use isoworld_core::resolver::MovementResolver;
/// use terra::Walkability;
///
/// // Everything left of x = 0 is a wall
/// struct HalfPlane;
///
/// impl Walkability for HalfPlane {
///     fn is_in_bounds(&self, _point: Vec2) -> bool {
///         true
///     }
///     fn is_walkable_at_world(&self, point: Vec2, _tolerance: u32) -> bool {
///         point.x >= 0.0
///     }
/// }
///
/// let resolver = MovementResolver::new(0.0, 0, None);
/// let outcome = resolver.resolve_point(
///     Vec2::new(1.0, 0.0),
///     Vec2::new(-3.0, 3.0),
///     Vec2::new(-3.0, 3.0),
///     &HalfPlane,
/// );
///
/// assert_eq!(outcome.position, Vec2::new(1.0, 3.0));
/// assert_eq!(outcome.velocity, Vec2::new(0.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementResolver {
    vertical_offset: f32,
    tolerance: u32,
    boundary: Option<Boundary>,
}

impl MovementResolver {
    /// Creates a resolver.
    ///
    /// # Arguments
    ///
    /// * `vertical_offset` - Distance from anchor down to the foot point
    /// * `tolerance` - Neighbourhood tolerance passed to every probe
    /// * `boundary` - Optional clamp rectangle
    #[must_use]
    pub fn new(vertical_offset: f32, tolerance: u32, boundary: Option<Boundary>) -> Self {
        Self {
            vertical_offset,
            tolerance,
            boundary,
        }
    }

    /// Resolver for the player: tolerance is the chapter's collision allowance.
    #[must_use]
    pub fn for_player(world: &ChapterWorld) -> Self {
        let collision = world.config().collision;
        Self::new(
            collision.y_offset,
            collision.allowance,
            world.boundary().copied(),
        )
    }

    /// Resolver for monsters: no tolerance.
    #[must_use]
    pub fn for_monster(world: &ChapterWorld) -> Self {
        Self::new(
            world.config().collision.y_offset,
            0,
            world.boundary().copied(),
        )
    }

    /// Neighbourhood tolerance used by this resolver.
    #[must_use]
    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    /// Collision sampling point for an anchor position.
    #[must_use]
    pub fn foot_point(&self, position: Vec2) -> Vec2 {
        Vec2::new(position.x, position.y + self.vertical_offset)
    }

    /// Resolve a displacement from `position`.
    ///
    /// # Arguments
    ///
    /// * `position` - Current anchor
    /// * `velocity` - Current velocity; blocked or clamped axes are zeroed
    /// * `delta` - Requested displacement for this tick
    /// * `oracle` - Collision queries
    pub fn resolve_point<W: Walkability + ?Sized>(
        &self,
        position: Vec2,
        velocity: Vec2,
        delta: Vec2,
        oracle: &W,
    ) -> MoveOutcome {
        let mut outcome = MoveOutcome {
            position,
            velocity,
            delta,
            blocked_x: false,
            blocked_y: false,
            clamped_x: false,
            clamped_y: false,
        };

        if delta.x != 0.0 {
            let candidate = Vec2::new(outcome.position.x + delta.x, outcome.position.y);
            if oracle.is_walkable_at_world(self.foot_point(candidate), self.tolerance) {
                outcome.position.x = candidate.x;
            } else {
                outcome.blocked_x = true;
                outcome.velocity.x = 0.0;
            }
        }

        if delta.y != 0.0 {
            let candidate = Vec2::new(outcome.position.x, outcome.position.y + delta.y);
            if oracle.is_walkable_at_world(self.foot_point(candidate), self.tolerance) {
                outcome.position.y = candidate.y;
            } else {
                outcome.blocked_y = true;
                outcome.velocity.y = 0.0;
            }
        }

        if let Some(boundary) = &self.boundary {
            let inner = boundary.shrink(CLAMP_MARGIN);
            let clamped = inner.clamp(outcome.position);
            if clamped.x != outcome.position.x {
                outcome.clamped_x = true;
                outcome.velocity.x = 0.0;
            }
            if clamped.y != outcome.position.y {
                outcome.clamped_y = true;
                outcome.velocity.y = 0.0;
            }
            outcome.position = clamped;
        }

        outcome
    }

    /// Move a body by `delta`, writing back its position and velocity.
    pub fn apply<W: Walkability + ?Sized>(
        &self,
        body: &mut AnimatedBody,
        delta: Vec2,
        oracle: &W,
    ) -> MoveOutcome {
        let outcome = self.resolve_point(body.position, body.velocity, delta, oracle);
        body.position = outcome.position;
        body.velocity = outcome.velocity;
        if outcome.blocked_x || outcome.blocked_y {
            trace!(
                blocked_x = outcome.blocked_x,
                blocked_y = outcome.blocked_y,
                x = outcome.position.x,
                y = outcome.position.y,
                "movement_blocked"
            );
        }
        outcome
    }
}

// =============================================================================
// Tests
// =============================================================================
