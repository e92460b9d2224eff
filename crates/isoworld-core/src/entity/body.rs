//! Shared physical and animation state for every entity.
//!
//! Players and monsters both own an [`AnimatedBody`]. Variant-specific data
//! (monster brains, player input) lives beside it in
//! [`EntityKind`](super::EntityKind) rather than in a type hierarchy.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Boolean status bits on a body.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BodyFlags: u8 {
        /// The body is following a movement intent this tick
        const MOVING = 1 << 0;
        /// The body is in its attacking pose
        const ATTACKING = 1 << 1;
        /// The body has died and will be removed at the next prune
        const DEAD = 1 << 2;
    }
}

/// Direction a body faces, used to pick an animation clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Has not moved yet
    #[default]
    Idle,
    /// Towards the top of the screen
    Up,
    /// Towards the bottom of the screen
    Down,
    /// Towards the left of the screen
    Left,
    /// Towards the right of the screen
    Right,
}

impl Facing {
    /// Four-way facing from the dominant axis of a direction.
    ///
    /// Returns `None` for a zero vector so callers can keep the previous
    /// facing while standing still. Ties go to the vertical axis.
    #[must_use]
    pub fn from_direction(direction: Vec2) -> Option<Self> {
        if direction.x == 0.0 && direction.y == 0.0 {
            return None;
        }
        if direction.x.abs() > direction.y.abs() {
            Some(if direction.x > 0.0 {
                Self::Right
            } else {
                Self::Left
            })
        } else if direction.y > 0.0 {
            Some(Self::Down)
        } else {
            Some(Self::Up)
        }
    }
}

/// Animation clip selector handed to the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationTag {
    /// Standing still
    Idle(Facing),
    /// Walking in a direction
    Walk(Facing),
    /// Attacking in a direction
    Attack(Facing),
}

/// Position, velocity, facing and status shared by all entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatedBody {
    /// Logical anchor in world space
    pub position: Vec2,
    /// Velocity in world units per baseline frame
    pub velocity: Vec2,
    /// Current facing
    pub facing: Facing,
    /// Movement speed, never negative
    pub speed: f32,
    /// Status bits
    pub flags: BodyFlags,
}

impl Default for AnimatedBody {
    fn default() -> Self {
        Self::at_position(Vec2::ZERO, 0.0)
    }
}

impl AnimatedBody {
    /// A stationary body at `position`.
    #[must_use]
    pub fn at_position(position: Vec2, speed: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            facing: Facing::Idle,
            speed: speed.max(0.0),
            flags: BodyFlags::empty(),
        }
    }

    /// Returns `true` while the body follows a movement intent.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.flags.contains(BodyFlags::MOVING)
    }

    /// Set or clear [`BodyFlags::MOVING`].
    pub fn set_moving(&mut self, moving: bool) {
        self.flags.set(BodyFlags::MOVING, moving);
    }

    /// Returns `true` while attacking.
    #[must_use]
    pub fn is_attacking(&self) -> bool {
        self.flags.contains(BodyFlags::ATTACKING)
    }

    /// Set or clear [`BodyFlags::ATTACKING`].
    pub fn set_attacking(&mut self, attacking: bool) {
        self.flags.set(BodyFlags::ATTACKING, attacking);
    }

    /// Returns `true` once the body has died.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.flags.contains(BodyFlags::DEAD)
    }

    /// Mark the body dead. Death also ends movement and attacks.
    pub fn kill(&mut self) {
        self.flags = BodyFlags::DEAD;
        self.velocity = Vec2::ZERO;
    }

    /// Zero velocity and clear [`BodyFlags::MOVING`].
    pub fn halt(&mut self) {
        self.velocity = Vec2::ZERO;
        self.set_moving(false);
    }

    /// Clip selector for the renderer. Attacking wins over walking.
    #[must_use]
    pub fn animation_tag(&self) -> AnimationTag {
        if self.is_attacking() {
            AnimationTag::Attack(self.facing)
        } else if self.is_moving() {
            AnimationTag::Walk(self.facing)
        } else {
            AnimationTag::Idle(self.facing)
        }
    }
}
