//! The simulation loop.
//!
//! [`Simulation`] advances one chapter by whatever delta the host frame loop
//! provides. Each [`Simulation::step`] runs these phases in order:
//!
//! 1. **PLAYER**: steer from input (with optional isometric blending) and
//!    resolve the move
//! 2. **PRUNE**: remove monsters that died since the last tick
//! 3. **MONSTERS**: think, resolve, then update the attacking flag, in
//!    spawn order
//! 4. **POPULATION**: advance the regen timer and refill when due
//!
//! # Determinism
//!
//! All randomness (spawn placement, wander targets, idle durations) comes
//! from one `ChaCha8Rng` seeded from [`LoopConfig::seed`], and entities are
//! visited in ID order. The same chapter, seed, deltas and inputs therefore
//! replay identically.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use glam::Vec2;
//! use isoworld_core::config::{ChapterConfig, LoopConfig};
//! use isoworld_core::simulation::{PlayerInput, Simulation};
//!
//! let chapter = ChapterConfig::from_json(r#"{
//!     "id": "room",
//!     "map": { "kind": "rows", "rows": ["....", "....", "....", "...."] },
//!     "start": [1, 1]
//! }"#).unwrap();
//! let world = Arc::new(chapter.build_world().unwrap());
//! let mut sim = Simulation::new(world, LoopConfig::default());
//!
//! let input = PlayerInput { direction: Vec2::new(0.0, 1.0), attack: false };
//! for _ in 0..10 {
//!     sim.step(1.0 / 60.0, &input);
//! }
//!
//! assert_eq!(sim.tick(), 10);
//! assert!(sim.player().unwrap().body().is_moving());
//! ```

use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ChapterWorld, LoopConfig};
use crate::entity::{Entity, EntityId, Facing};
use crate::registry::{EntityRegistry, PopulationController};
use crate::resolver::{frame_delta, IsoInputBlender, MovementResolver};
use crate::snapshot::{EntitySnapshot, FrameSnapshot};

/// Input for one tick, supplied by the input collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Desired direction; any magnitude, normalized before use
    pub direction: Vec2,
    /// Attack button held
    pub attack: bool,
}

impl PlayerInput {
    /// Movement input with the attack button released.
    #[must_use]
    pub fn moving(direction: Vec2) -> Self {
        Self {
            direction,
            attack: false,
        }
    }
}

/// Bookkeeping from one [`Simulation::step`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whether the tick ran (false while paused)
    pub advanced: bool,
    /// Monsters removed by the prune phase
    pub despawned: Vec<EntityId>,
    /// Monsters added by the population phase
    pub spawned: Vec<EntityId>,
}

/// One running chapter.
#[derive(Debug, Clone)]
pub struct Simulation {
    world: Arc<ChapterWorld>,
    registry: EntityRegistry,
    population: PopulationController,
    player_resolver: MovementResolver,
    monster_resolver: MovementResolver,
    iso_blender: IsoInputBlender,
    rng: ChaCha8Rng,
    loop_config: LoopConfig,
    tick: u64,
    elapsed: f32,
    paused: bool,
}

impl Simulation {
    /// Start a chapter: spawn the player and the initial monster population.
    ///
    /// # Arguments
    ///
    /// * `world` - The validated chapter, shared read-only
    /// * `loop_config` - Seed and delta cap
    #[must_use]
    pub fn new(world: Arc<ChapterWorld>, loop_config: LoopConfig) -> Self {
        let config = world.config();
        let mut registry = EntityRegistry::new();
        registry.spawn_player(world.player_spawn(), config.player.speed);

        let mut rng = ChaCha8Rng::seed_from_u64(loop_config.seed);
        let mut population = PopulationController::new(&config.spawn);
        let initial = population.fill(&mut registry, &world, &mut rng);

        info!(
            chapter = %config.id,
            seed = loop_config.seed,
            monsters = initial.len(),
            target = population.target(),
            "simulation_started"
        );

        Self {
            player_resolver: MovementResolver::for_player(&world),
            monster_resolver: MovementResolver::for_monster(&world),
            iso_blender: IsoInputBlender::new(world.transform()),
            world,
            registry,
            population,
            rng,
            loop_config,
            tick: 0,
            elapsed: 0.0,
            paused: false,
        }
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// A paused simulation does nothing: no time passes and no random draws
    /// are made. A NaN or negative `dt` is treated as zero.
    pub fn step(&mut self, dt: f32, input: &PlayerInput) -> TickReport {
        if self.paused {
            return TickReport::default();
        }
        let dt = self.sanitize_dt(dt);

        // PHASE 1: PLAYER
        self.step_player(dt, input);

        // PHASE 2: PRUNE
        let despawned = self.registry.prune_dead();

        // PHASE 3: MONSTERS
        self.step_monsters(dt);

        // PHASE 4: POPULATION
        let spawned = self
            .population
            .reconcile(dt, &mut self.registry, &self.world, &mut self.rng);

        self.tick += 1;
        self.elapsed += dt;
        TickReport {
            advanced: true,
            despawned,
            spawned,
        }
    }

    fn sanitize_dt(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt < 0.0 {
            warn!(dt, tick = self.tick, "invalid_frame_delta");
            return 0.0;
        }
        match self.loop_config.max_frame_delta {
            Some(max) => dt.min(max.max(0.0)),
            None => dt,
        }
    }

    fn step_player(&mut self, dt: f32, input: &PlayerInput) {
        let oracle = self.world.oracle();
        let Some((body, state)) = self
            .registry
            .player_mut()
            .and_then(Entity::player_parts_mut)
        else {
            return;
        };

        let raw = if input.direction.is_finite() {
            input.direction
        } else {
            Vec2::ZERO
        };
        let direction = raw.normalize_or_zero();
        let steering = if self.world.config().collision.enable_iso_input && direction != Vec2::ZERO
        {
            self.iso_blender.blend(
                direction,
                self.player_resolver.foot_point(body.position),
                oracle,
                self.player_resolver.tolerance(),
            )
        } else {
            direction
        };
        state.last_input = raw;
        state.steering = steering;

        body.velocity = steering * body.speed;
        body.set_moving(steering != Vec2::ZERO);
        if let Some(facing) = Facing::from_direction(direction) {
            body.facing = facing;
        }
        body.set_attacking(input.attack);

        let delta = frame_delta(body.velocity, dt);
        self.player_resolver.apply(body, delta, oracle);
    }

    fn step_monsters(&mut self, dt: f32) {
        let oracle = self.world.oracle();
        let boundary = self.world.boundary();
        let player_position = self.registry.player_position();
        let ids: Vec<EntityId> = self.registry.monster_ids().collect();

        for id in ids {
            let Some((body, brain)) = self
                .registry
                .get_mut(id)
                .and_then(Entity::monster_parts_mut)
            else {
                continue;
            };
            if body.is_dead() {
                continue;
            }

            if let Some(transition) = brain.think(body, dt, boundary, &mut self.rng) {
                debug!(
                    id = %id,
                    from = %transition.from,
                    to = %transition.to,
                    "monster_state_changed"
                );
            }
            let delta = frame_delta(body.velocity, dt);
            let outcome = self.monster_resolver.apply(body, delta, oracle);
            if outcome.is_stuck() {
                brain.abandon_move(body);
            }
            brain.update_attack(body, player_position);
        }
    }

    /// Stop advancing until [`Simulation::resume`].
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick, "simulation_paused");
        }
    }

    /// Continue after [`Simulation::pause`].
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            debug!(tick = self.tick, "simulation_resumed");
        }
    }

    /// Returns `true` while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Mark a monster dead. It is removed at the next tick's prune phase.
    ///
    /// # Returns
    ///
    /// `true` if `id` named a living monster.
    pub fn kill_monster(&mut self, id: EntityId) -> bool {
        match self.registry.get_mut(id) {
            Some(entity) if entity.is_monster() && !entity.body().is_dead() => {
                entity.body_mut().kill();
                true
            }
            _ => false,
        }
    }

    /// The chapter being simulated.
    #[must_use]
    pub fn world(&self) -> &Arc<ChapterWorld> {
        &self.world
    }

    /// All entities.
    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// All entities, mutably, for placing entities directly in tests.
    #[cfg(test)]
    pub(crate) fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// Population controller state.
    #[must_use]
    pub fn population(&self) -> &PopulationController {
        &self.population
    }

    /// The player entity.
    #[must_use]
    pub fn player(&self) -> Option<&Entity> {
        self.registry.player()
    }

    /// Ticks completed.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds elapsed.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seed the RNG was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.loop_config.seed
    }

    /// Snapshots of every entity in spawn order.
    #[must_use]
    pub fn entity_snapshots(&self) -> Vec<EntitySnapshot> {
        self.registry
            .entities_sorted()
            .map(EntitySnapshot::from)
            .collect()
    }

    /// Snapshot of the whole frame.
    #[must_use]
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            tick: self.tick,
            elapsed: self.elapsed,
            entities: self.entity_snapshots(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChapterConfig, MonsterArchetype};
    use crate::entity::EntityTag;

    fn room(target: u32) -> Arc<ChapterWorld> {
        let mut chapter = ChapterConfig::from_json(
            r#"{
                "id": "room",
                "map": {"kind": "random_walk", "width": 40, "height": 40, "ratio": 0.6},
                "start": [20, 20],
                "spawn": {"target_count": 0, "regen_interval": 1.0}
            }"#,
        )
        .unwrap();
        chapter.spawn.target_count = target;
        chapter.monsters = vec![MonsterArchetype::default()];
        Arc::new(chapter.build_world().unwrap())
    }

    mod step_tests {
        use super::*;

        #[test]
        fn new_spawns_player_at_start() {
            let world = room(0);
            let sim = Simulation::new(Arc::clone(&world), LoopConfig::default());
            let player = sim.player().unwrap();
            assert_eq!(player.tag(), EntityTag::Player);
            assert_eq!(player.body().position, world.player_spawn());
            assert_eq!(sim.tick(), 0);
        }

        #[test]
        fn step_advances_tick_and_time() {
            let mut sim = Simulation::new(room(0), LoopConfig::default());
            let report = sim.step(0.5, &PlayerInput::default());
            assert!(report.advanced);
            assert_eq!(sim.tick(), 1);
            assert_eq!(sim.elapsed(), 0.5);
        }

        #[test]
        fn invalid_delta_counts_as_zero() {
            let mut sim = Simulation::new(room(0), LoopConfig::default());
            let before = sim.player().unwrap().body().position;
            let input = PlayerInput::moving(Vec2::X);
            sim.step(f32::NAN, &input);
            sim.step(-1.0, &input);
            assert_eq!(sim.tick(), 2);
            assert_eq!(sim.elapsed(), 0.0);
            assert_eq!(sim.player().unwrap().body().position, before);
        }

        #[test]
        fn delta_cap_limits_elapsed_time() {
            let config = LoopConfig {
                max_frame_delta: Some(0.1),
                seed: 0,
            };
            let mut sim = Simulation::new(room(0), config);
            sim.step(5.0, &PlayerInput::default());
            assert!((sim.elapsed() - 0.1).abs() < 1e-6);
        }

        #[test]
        fn player_flags_follow_input() {
            let mut sim = Simulation::new(room(0), LoopConfig::default());
            sim.step(
                1.0 / 60.0,
                &PlayerInput {
                    direction: Vec2::new(0.0, 2.0),
                    attack: true,
                },
            );
            let body = sim.player().unwrap().body();
            assert!(body.is_moving());
            assert!(body.is_attacking());
            assert_eq!(body.facing, Facing::Down);

            sim.step(1.0 / 60.0, &PlayerInput::default());
            let body = sim.player().unwrap().body();
            assert!(!body.is_moving());
            assert!(!body.is_attacking());
            assert_eq!(body.facing, Facing::Down);
        }

        #[test]
        fn non_finite_input_is_ignored() {
            let mut sim = Simulation::new(room(0), LoopConfig::default());
            let before = sim.player().unwrap().body().position;
            sim.step(1.0 / 60.0, &PlayerInput::moving(Vec2::new(f32::NAN, 1.0)));
            assert_eq!(sim.player().unwrap().body().position, before);
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn pause_freezes_everything() {
            let mut sim = Simulation::new(room(3), LoopConfig::default());
            let before = sim.entity_snapshots();
            sim.pause();
            assert!(sim.is_paused());

            let report = sim.step(1.0, &PlayerInput::moving(Vec2::X));
            assert!(!report.advanced);
            assert_eq!(sim.tick(), 0);
            assert_eq!(sim.entity_snapshots(), before);

            sim.resume();
            assert!(!sim.is_paused());
            assert!(sim.step(1.0 / 60.0, &PlayerInput::default()).advanced);
        }

        #[test]
        fn kill_only_affects_living_monsters() {
            let mut sim = Simulation::new(room(2), LoopConfig::default());
            let player = sim.registry().player_id().unwrap();
            assert!(!sim.kill_monster(player));

            let monster = sim.registry().monster_ids().next().unwrap();
            assert!(sim.kill_monster(monster));
            assert!(!sim.kill_monster(monster));

            let report = sim.step(1.0 / 60.0, &PlayerInput::default());
            assert_eq!(report.despawned, vec![monster]);
            assert!(sim.registry().get(monster).is_none());
        }

        #[test]
        fn snapshot_lists_player_first() {
            let sim = Simulation::new(room(2), LoopConfig::default());
            let frame = sim.snapshot();
            assert_eq!(frame.tick, 0);
            assert_eq!(frame.entities[0].tag, EntityTag::Player);
            assert_eq!(frame.entities.len(), sim.registry().entity_count());
        }
    }
}
