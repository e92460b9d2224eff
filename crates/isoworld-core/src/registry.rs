//! Entity storage and population bookkeeping.
//!
//! The [`EntityRegistry`] owns every entity of a running chapter. Entities
//! live in a `BTreeMap` keyed by a monotonically increasing [`EntityId`], so
//! iteration order is spawn order and ticks replay identically for a given
//! seed.
//!
//! The [`PopulationController`] keeps the number of live monsters at the
//! chapter's target. It never loops unboundedly: each refill samples at most
//! [`SPAWN_ATTEMPTS_PER_MONSTER`] cells per missing monster and simply tries
//! again on the next regen interval when that is not enough.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use isoworld_core::registry::EntityRegistry;
//!
//! let mut registry = EntityRegistry::new();
//! let player = registry.spawn_player(Vec2::new(0.0, 32.0), 3.0);
//!
//! assert_eq!(registry.player_id(), Some(player));
//! assert_eq!(registry.player_position(), Some(Vec2::new(0.0, 32.0)));
//! assert_eq!(registry.live_monster_count(), 0);
//! ```

use std::collections::BTreeMap;

use glam::{IVec2, Vec2};
use rand::seq::SliceRandom;
use rand::Rng;
use terra::Walkability;
use tracing::debug;

use crate::ai::MonsterBrain;
use crate::config::{ChapterWorld, SpawnConfig};
use crate::entity::{AnimatedBody, Entity, EntityId, EntityKind, PlayerState};
use crate::resolver::MovementResolver;

/// Cell samples allowed per missing monster in one refill.
pub const SPAWN_ATTEMPTS_PER_MONSTER: usize = 50;

/// Minimum distance, in grid cells, between a spawn and the start cell.
pub const MIN_START_DISTANCE_CELLS: f32 = 5.0;

/// Minimum world distance between a spawn and the player.
pub const MIN_PLAYER_DISTANCE: f32 = 500.0;

// =============================================================================
// Entity Registry
// =============================================================================

/// All entities of a running chapter.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    /// Monotonically increasing entity ID counter.
    next_id: u64,
    /// Entity storage with deterministic iteration order.
    entities: BTreeMap<EntityId, Entity>,
    /// The player, once spawned.
    player_id: Option<EntityId>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, body: AnimatedBody, kind: EntityKind) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entity::new(id, body, kind));
        id
    }

    /// Spawns the player.
    ///
    /// There is only ever one player: when one already exists its ID is
    /// returned and nothing is spawned.
    pub fn spawn_player(&mut self, position: Vec2, speed: f32) -> EntityId {
        if let Some(id) = self.player_id {
            return id;
        }
        let id = self.insert(
            AnimatedBody::at_position(position, speed),
            EntityKind::Player(PlayerState::default()),
        );
        self.player_id = Some(id);
        id
    }

    /// Spawns a monster at `position` driven by `brain`.
    pub fn spawn_monster(&mut self, position: Vec2, brain: MonsterBrain) -> EntityId {
        let speed = brain.archetype().move_speed;
        self.insert(
            AnimatedBody::at_position(position, speed),
            EntityKind::Monster(brain),
        )
    }

    /// Removes an entity.
    ///
    /// # Returns
    ///
    /// The removed entity, if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        if self.player_id == Some(id) {
            self.player_id = None;
        }
        self.entities.remove(&id)
    }

    /// Returns a reference to an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable reference to an entity by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// The player's ID, once spawned.
    #[must_use]
    pub fn player_id(&self) -> Option<EntityId> {
        self.player_id
    }

    /// The player entity.
    #[must_use]
    pub fn player(&self) -> Option<&Entity> {
        self.player_id.and_then(|id| self.entities.get(&id))
    }

    /// The player entity, mutably.
    #[must_use]
    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.player_id.and_then(|id| self.entities.get_mut(&id))
    }

    /// The player's current position.
    #[must_use]
    pub fn player_position(&self) -> Option<Vec2> {
        self.player().map(|player| player.body().position)
    }

    /// Monster IDs in spawn order, dead or alive.
    pub fn monster_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .values()
            .filter(|entity| entity.is_monster())
            .map(Entity::id)
    }

    /// Number of monsters that have not died.
    #[must_use]
    pub fn live_monster_count(&self) -> usize {
        self.entities
            .values()
            .filter(|entity| entity.is_monster() && !entity.body().is_dead())
            .count()
    }

    /// Removes every dead monster.
    ///
    /// # Returns
    ///
    /// The IDs removed, in spawn order.
    pub fn prune_dead(&mut self) -> Vec<EntityId> {
        let dead: Vec<EntityId> = self
            .entities
            .values()
            .filter(|entity| entity.is_monster() && entity.body().is_dead())
            .map(Entity::id)
            .collect();
        for id in &dead {
            self.entities.remove(id);
            debug!(id = %id, "monster_despawned");
        }
        dead
    }

    /// Returns an iterator over entities in spawn order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Returns the number of entities, the player included.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the registry has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// =============================================================================
// Population Controller
// =============================================================================

/// Keeps the live monster count at the chapter's target.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationController {
    target: usize,
    regen_interval: f32,
    regen_timer: f32,
}

impl PopulationController {
    /// Controller for a chapter's spawn settings.
    #[must_use]
    pub fn new(config: &SpawnConfig) -> Self {
        Self {
            target: config.target_count as usize,
            regen_interval: config.regen_interval,
            regen_timer: 0.0,
        }
    }

    /// Target number of live monsters.
    #[must_use]
    pub fn target(&self) -> usize {
        self.target
    }

    /// Seconds accumulated towards the next refill.
    #[must_use]
    pub fn regen_timer(&self) -> f32 {
        self.regen_timer
    }

    /// Advance the regen timer and refill once the interval has passed.
    ///
    /// The timer only runs while the population is under target; reaching
    /// the target resets it.
    ///
    /// # Returns
    ///
    /// IDs of the monsters spawned this call.
    pub fn reconcile<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        registry: &mut EntityRegistry,
        world: &ChapterWorld,
        rng: &mut R,
    ) -> Vec<EntityId> {
        if registry.live_monster_count() >= self.target {
            self.regen_timer = 0.0;
            return Vec::new();
        }
        self.regen_timer += dt;
        if self.regen_timer < self.regen_interval {
            return Vec::new();
        }
        self.regen_timer = 0.0;
        self.fill(registry, world, rng)
    }

    /// Spawn monsters until the target is met or the attempt budget runs out.
    ///
    /// A candidate cell must be walkable, at least
    /// [`MIN_START_DISTANCE_CELLS`] from the start cell, and at least
    /// [`MIN_PLAYER_DISTANCE`] world units from the player. Both the cell
    /// centre and the monster's foot point there must pass the oracle. Each spawn draws
    /// its archetype uniformly from the chapter's list.
    ///
    /// # Returns
    ///
    /// IDs of the monsters spawned.
    #[allow(clippy::cast_possible_wrap)]
    pub fn fill<R: Rng + ?Sized>(
        &mut self,
        registry: &mut EntityRegistry,
        world: &ChapterWorld,
        rng: &mut R,
    ) -> Vec<EntityId> {
        let deficit = self.target.saturating_sub(registry.live_monster_count());
        if deficit == 0 {
            return Vec::new();
        }
        let archetypes = &world.config().monsters;
        if archetypes.is_empty() {
            debug!(deficit, "spawn_skipped_no_archetypes");
            return Vec::new();
        }

        let grid = world.grid();
        let oracle = world.oracle();
        let transform = world.transform();
        let start = world.start_cell();
        let player = registry.player_position();
        let resolver = MovementResolver::for_monster(world);

        let budget = deficit * SPAWN_ATTEMPTS_PER_MONSTER;
        let mut spawned = Vec::new();
        for _ in 0..budget {
            if spawned.len() == deficit {
                break;
            }
            let cell = IVec2::new(
                rng.gen_range(0..grid.width()) as i32,
                rng.gen_range(0..grid.height()) as i32,
            );
            if !grid.is_walkable(cell.x, cell.y) {
                continue;
            }
            if (cell - start).as_vec2().length() < MIN_START_DISTANCE_CELLS {
                continue;
            }
            let position = transform.cell_to_world(cell);
            if !oracle.is_walkable_at_world(position, 0)
                || !oracle.is_walkable_at_world(resolver.foot_point(position), 0)
            {
                continue;
            }
            if player.is_some_and(|p| position.distance(p) < MIN_PLAYER_DISTANCE) {
                continue;
            }
            let Some(archetype) = archetypes.choose(rng) else {
                break;
            };
            let brain = MonsterBrain::new(archetype.clone(), position, rng);
            let id = registry.spawn_monster(position, brain);
            debug!(
                id = %id,
                archetype = %archetype.id,
                gx = cell.x,
                gy = cell.y,
                x = position.x,
                y = position.y,
                "monster_spawned"
            );
            spawned.push(id);
        }

        if spawned.len() < deficit {
            debug!(
                deficit,
                spawned = spawned.len(),
                attempts = budget,
                "spawn_deficit_deferred"
            );
        }
        spawned
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChapterConfig, MapSource, MonsterArchetype};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use terra::TileGeometry;

    fn open_world(size: usize, target: u32, monsters: Vec<MonsterArchetype>) -> ChapterWorld {
        let rows = vec![".".repeat(size); size];
        ChapterConfig {
            id: "field".to_string(),
            name: String::new(),
            map: MapSource::Rows { rows },
            start: IVec2::new(0, 0),
            tile: TileGeometry::default(),
            boundary: None,
            collision: crate::config::CollisionConfig::default(),
            player: crate::config::PlayerConfig::default(),
            spawn: SpawnConfig {
                target_count: target,
                regen_interval: 2.0,
            },
            monsters,
        }
        .build_world()
        .unwrap()
    }

    fn brain(rng: &mut ChaCha8Rng) -> MonsterBrain {
        MonsterBrain::new(MonsterArchetype::default(), Vec2::ZERO, rng)
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn ids_are_monotonic() {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let mut registry = EntityRegistry::new();
            let a = registry.spawn_player(Vec2::ZERO, 3.0);
            let b = registry.spawn_monster(Vec2::ONE, brain(&mut rng));
            let c = registry.spawn_monster(Vec2::ONE, brain(&mut rng));
            assert!(a < b && b < c);

            registry.despawn(b);
            let d = registry.spawn_monster(Vec2::ONE, brain(&mut rng));
            assert!(d > c);
        }

        #[test]
        fn player_is_spawned_once() {
            let mut registry = EntityRegistry::new();
            let first = registry.spawn_player(Vec2::ZERO, 3.0);
            let second = registry.spawn_player(Vec2::ONE, 5.0);
            assert_eq!(first, second);
            assert_eq!(registry.entity_count(), 1);
            assert_eq!(registry.player_position(), Some(Vec2::ZERO));
        }

        #[test]
        fn despawning_player_clears_handle() {
            let mut registry = EntityRegistry::new();
            let id = registry.spawn_player(Vec2::ZERO, 3.0);
            assert!(registry.despawn(id).is_some());
            assert!(registry.player().is_none());
            assert!(registry.is_empty());
        }

        #[test]
        fn monster_speed_comes_from_archetype() {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let archetype = MonsterArchetype {
                move_speed: 2.5,
                ..MonsterArchetype::default()
            };
            let mut registry = EntityRegistry::new();
            let id = registry.spawn_monster(
                Vec2::ZERO,
                MonsterBrain::new(archetype, Vec2::ZERO, &mut rng),
            );
            assert_eq!(registry.get(id).unwrap().body().speed, 2.5);
        }

        #[test]
        fn prune_removes_only_dead_monsters() {
            let mut rng = ChaCha8Rng::seed_from_u64(0);
            let mut registry = EntityRegistry::new();
            let player = registry.spawn_player(Vec2::ZERO, 3.0);
            let alive = registry.spawn_monster(Vec2::ONE, brain(&mut rng));
            let dead = registry.spawn_monster(Vec2::ONE, brain(&mut rng));
            registry.get_mut(dead).unwrap().body_mut().kill();

            assert_eq!(registry.live_monster_count(), 1);
            assert_eq!(registry.prune_dead(), vec![dead]);
            assert!(registry.get(player).is_some());
            assert!(registry.get(alive).is_some());
            assert_eq!(registry.monster_ids().collect::<Vec<_>>(), vec![alive]);
        }
    }

    mod population_tests {
        use super::*;

        #[test]
        fn fill_respects_distance_constraints() {
            let world = open_world(40, 6, vec![MonsterArchetype::default()]);
            let mut registry = EntityRegistry::new();
            registry.spawn_player(world.transform().cell_to_world(IVec2::new(20, 20)), 3.0);
            let player = registry.player_position().unwrap();

            let mut population = PopulationController::new(&world.config().spawn);
            let mut rng = ChaCha8Rng::seed_from_u64(17);
            let spawned = population.fill(&mut registry, &world, &mut rng);
            assert!(!spawned.is_empty());

            for id in spawned {
                let position = registry.get(id).unwrap().body().position;
                let cell = world.transform().world_to_cell(position);
                assert!(cell.as_vec2().length() >= MIN_START_DISTANCE_CELLS);
                assert!(position.distance(player) >= MIN_PLAYER_DISTANCE);
                assert!(world.grid().is_walkable(cell.x, cell.y));
            }
        }

        #[test]
        fn spawn_requires_walkable_foot_point() {
            let mut config = open_world(40, 4, vec![MonsterArchetype::default()])
                .config()
                .clone();
            config.collision.y_offset = 100_000.0;
            let world = config.build_world().unwrap();
            let mut registry = EntityRegistry::new();
            let mut population = PopulationController::new(&world.config().spawn);
            let mut rng = ChaCha8Rng::seed_from_u64(5);
            assert!(population.fill(&mut registry, &world, &mut rng).is_empty());

            let world = open_world(40, 4, vec![MonsterArchetype::default()]);
            let resolver = MovementResolver::for_monster(&world);
            let mut rng = ChaCha8Rng::seed_from_u64(5);
            let spawned = population.fill(&mut registry, &world, &mut rng);
            assert!(!spawned.is_empty());
            for id in spawned {
                let position = registry.get(id).unwrap().body().position;
                assert!(world
                    .oracle()
                    .is_walkable_at_world(resolver.foot_point(position), 0));
            }
        }

        #[test]
        fn no_archetypes_spawns_nothing() {
            let world = open_world(40, 5, Vec::new());
            let mut registry = EntityRegistry::new();
            let mut population = PopulationController::new(&world.config().spawn);
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            assert!(population.fill(&mut registry, &world, &mut rng).is_empty());
            assert_eq!(registry.live_monster_count(), 0);
        }

        #[test]
        fn impossible_placement_defers_without_error() {
            // Every cell is within five cells of the start
            let world = open_world(4, 3, vec![MonsterArchetype::default()]);
            let mut registry = EntityRegistry::new();
            let mut population = PopulationController::new(&world.config().spawn);
            let mut rng = ChaCha8Rng::seed_from_u64(2);
            assert!(population.fill(&mut registry, &world, &mut rng).is_empty());
        }

        #[test]
        fn reconcile_waits_for_regen_interval() {
            let world = open_world(40, 2, vec![MonsterArchetype::default()]);
            let mut registry = EntityRegistry::new();
            let mut population = PopulationController::new(&world.config().spawn);
            let mut rng = ChaCha8Rng::seed_from_u64(3);

            assert!(population
                .reconcile(1.0, &mut registry, &world, &mut rng)
                .is_empty());
            assert_eq!(population.regen_timer(), 1.0);

            let spawned = population.reconcile(1.0, &mut registry, &world, &mut rng);
            assert_eq!(spawned.len(), 2);
            assert_eq!(population.regen_timer(), 0.0);

            // At target: timer stays reset
            assert!(population
                .reconcile(5.0, &mut registry, &world, &mut rng)
                .is_empty());
            assert_eq!(population.regen_timer(), 0.0);
        }

        #[test]
        fn archetypes_are_drawn_from_the_list() {
            let bat = MonsterArchetype {
                id: "bat".to_string(),
                ..MonsterArchetype::default()
            };
            let world = open_world(40, 12, vec![MonsterArchetype::default(), bat]);
            let mut registry = EntityRegistry::new();
            let mut population = PopulationController::new(&world.config().spawn);
            let mut rng = ChaCha8Rng::seed_from_u64(4);
            population.fill(&mut registry, &world, &mut rng);

            let ids: Vec<&str> = registry
                .entities_sorted()
                .filter_map(Entity::as_monster)
                .map(|brain| brain.archetype().id.as_str())
                .collect();
            assert!(ids.iter().all(|id| *id == "slime" || *id == "bat"));
            assert!(ids.len() >= 10);
        }
    }
}
