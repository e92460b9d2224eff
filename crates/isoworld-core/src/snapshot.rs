//! Read-only views of simulation state for the rendering collaborator.
//!
//! Snapshots are plain values: the renderer can keep them across ticks
//! without borrowing the simulation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::ai::MonsterState;
use crate::entity::{AnimationTag, Entity, EntityId, EntityKind, EntityTag, Facing};

/// What the renderer needs to draw one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity identifier
    pub id: EntityId,
    /// Player or monster
    pub tag: EntityTag,
    /// World-space anchor
    pub position: Vec2,
    /// Facing direction
    pub facing: Facing,
    /// Following a movement intent
    pub is_moving: bool,
    /// In the attacking pose
    pub is_attacking: bool,
    /// Clip selector derived from the flags above
    pub animation: AnimationTag,
    /// AI state, for monsters
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub monster_state: Option<MonsterState>,
}

impl From<&Entity> for EntitySnapshot {
    fn from(entity: &Entity) -> Self {
        let body = entity.body();
        Self {
            id: entity.id(),
            tag: entity.tag(),
            position: body.position,
            facing: body.facing,
            is_moving: body.is_moving(),
            is_attacking: body.is_attacking(),
            animation: body.animation_tag(),
            monster_state: match entity.kind() {
                EntityKind::Monster(brain) => Some(brain.state()),
                EntityKind::Player(_) => None,
            },
        }
    }
}

/// All entities after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Ticks completed
    pub tick: u64,
    /// Simulated seconds elapsed
    pub elapsed: f32,
    /// Entities in spawn order
    pub entities: Vec<EntitySnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{AnimatedBody, PlayerState};

    #[test]
    fn player_snapshot_has_no_monster_state() {
        let mut body = AnimatedBody::at_position(Vec2::new(1.0, 2.0), 3.0);
        body.facing = Facing::Right;
        body.set_moving(true);
        let entity = Entity::new(
            EntityId::new(4),
            body,
            EntityKind::Player(PlayerState::default()),
        );

        let snapshot = EntitySnapshot::from(&entity);
        assert_eq!(snapshot.id, EntityId::new(4));
        assert_eq!(snapshot.tag, EntityTag::Player);
        assert_eq!(snapshot.animation, AnimationTag::Walk(Facing::Right));
        assert!(snapshot.monster_state.is_none());

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(!json.contains("monster_state"));
    }
}
