//! Entity types for the world simulation.
//!
//! - [`EntityId`]: Unique, monotonically assigned identifier
//! - [`EntityTag`]: Player or monster classification
//! - [`EntityKind`]: Variant-specific state (player input, monster brain)
//! - [`Entity`]: A body plus its kind
//!
//! # Architecture
//!
//! Every entity owns an [`AnimatedBody`] (position, velocity, facing, status
//! flags). What drives that body is carried by the [`EntityKind`] variant, so
//! the update loop matches on the variant instead of dispatching through a
//! trait object.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use isoworld_core::entity::{AnimatedBody, Entity, EntityId, EntityKind, EntityTag, PlayerState};
//!
//! let player = Entity::new(
//!     EntityId::new(0),
//!     AnimatedBody::at_position(Vec2::ZERO, 3.0),
//!     EntityKind::Player(PlayerState::default()),
//! );
//!
//! assert_eq!(player.tag(), EntityTag::Player);
//! assert!(player.as_monster().is_none());
//! ```

pub mod body;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ai::MonsterBrain;

pub use body::{AnimatedBody, AnimationTag, BodyFlags, Facing};

/// Unique identifier for an entity.
///
/// Identifiers come from a per-registry counter, so they never collide and
/// order entities by spawn time. Iterating in ID order keeps ticks
/// reproducible.
///
/// # Example
///
/// ```
/// use isoworld_core::entity::EntityId;
///
/// let first = EntityId::new(1);
/// let second = EntityId::new(2);
///
/// assert!(first < second);
/// assert_eq!(second.as_u64(), 2);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Entity classification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// The single player-controlled entity
    Player,
    /// An autonomous monster
    Monster,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Monster => write!(f, "Monster"),
        }
    }
}

/// Player-specific state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Raw directional input from the last tick
    pub last_input: Vec2,
    /// Input after isometric blending (equal to the normalized raw input when
    /// blending is off or found no open diagonal)
    pub steering: Vec2,
}

/// Variant-specific state of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Player input bookkeeping
    Player(PlayerState),
    /// Monster state machine
    Monster(MonsterBrain),
}

impl EntityKind {
    /// Returns the corresponding `EntityTag`.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        match self {
            Self::Player(_) => EntityTag::Player,
            Self::Monster(_) => EntityTag::Monster,
        }
    }
}

/// A complete entity: identifier, body and variant state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    body: AnimatedBody,
    kind: EntityKind,
}

impl Entity {
    /// Creates a new entity.
    #[must_use]
    pub const fn new(id: EntityId, body: AnimatedBody, kind: EntityKind) -> Self {
        Self { id, body, kind }
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's classification.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.kind.tag()
    }

    /// Returns the shared body.
    #[must_use]
    pub const fn body(&self) -> &AnimatedBody {
        &self.body
    }

    /// Returns the shared body mutably.
    #[must_use]
    pub fn body_mut(&mut self) -> &mut AnimatedBody {
        &mut self.body
    }

    /// Returns the variant state.
    #[must_use]
    pub const fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Returns `true` if this is the player.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    /// Returns `true` if this is a monster.
    #[must_use]
    pub const fn is_monster(&self) -> bool {
        matches!(self.kind, EntityKind::Monster(_))
    }

    /// Returns the player state, if this is the player.
    #[must_use]
    pub const fn as_player(&self) -> Option<&PlayerState> {
        match &self.kind {
            EntityKind::Player(state) => Some(state),
            EntityKind::Monster(_) => None,
        }
    }

    /// Returns the monster brain, if this is a monster.
    #[must_use]
    pub const fn as_monster(&self) -> Option<&MonsterBrain> {
        match &self.kind {
            EntityKind::Monster(brain) => Some(brain),
            EntityKind::Player(_) => None,
        }
    }

    /// Borrow the body and player state together.
    #[must_use]
    pub fn player_parts_mut(&mut self) -> Option<(&mut AnimatedBody, &mut PlayerState)> {
        match &mut self.kind {
            EntityKind::Player(state) => Some((&mut self.body, state)),
            EntityKind::Monster(_) => None,
        }
    }

    /// Borrow the body and monster brain together.
    #[must_use]
    pub fn monster_parts_mut(&mut self) -> Option<(&mut AnimatedBody, &mut MonsterBrain)> {
        match &mut self.kind {
            EntityKind::Monster(brain) => Some((&mut self.body, brain)),
            EntityKind::Player(_) => None,
        }
    }
}
