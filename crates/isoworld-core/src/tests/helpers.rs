//! Test helper functions for building chapters and driving simulations.

use std::sync::Arc;

use glam::{IVec2, Vec2};
use terra::{Boundary, RandomWalkConfig, TileGeometry};

use crate::config::{
    ChapterConfig, ChapterWorld, CollisionConfig, LoopConfig, MapSource, MonsterArchetype,
    PlayerConfig, SpawnConfig,
};
use crate::hash::hash_simulation;
use crate::simulation::{PlayerInput, Simulation};

/// Baseline frame delta.
pub const FRAME: f32 = 1.0 / 60.0;

/// Two archetypes: a passive slime and an auto-attacking bat.
pub fn test_archetypes() -> Vec<MonsterArchetype> {
    vec![
        MonsterArchetype::default(),
        MonsterArchetype {
            id: "bat".to_string(),
            name: "Bat".to_string(),
            move_speed: 2.0,
            detection_range: 200.0,
            regen_time: 5.0,
            auto_attack: true,
        },
    ]
}

/// The legacy 160x160 random-walk chapter with a monster population.
pub fn legacy_chapter(target: u32) -> ChapterConfig {
    let walk = RandomWalkConfig::new(160, 160, 0.7);
    ChapterConfig {
        id: "legacy".to_string(),
        name: "Legacy Caves".to_string(),
        start: walk.start_cell(),
        map: MapSource::RandomWalk(walk),
        tile: TileGeometry::default(),
        boundary: None,
        collision: CollisionConfig {
            y_offset: 8.0,
            allowance: 1,
            enable_iso_input: true,
        },
        player: PlayerConfig::default(),
        spawn: SpawnConfig {
            target_count: target,
            regen_interval: 1.0,
        },
        monsters: test_archetypes(),
    }
}

/// A small chapter from literal rows.
pub fn rows_chapter(rows: &[&str], start: IVec2) -> ChapterConfig {
    ChapterConfig {
        id: "rows".to_string(),
        name: String::new(),
        map: MapSource::Rows {
            rows: rows.iter().map(|r| (*r).to_string()).collect(),
        },
        start,
        tile: TileGeometry::default(),
        boundary: None,
        collision: CollisionConfig::default(),
        player: PlayerConfig::default(),
        spawn: SpawnConfig::default(),
        monsters: Vec::new(),
    }
}

/// An open field in boundary mode with no mask.
pub fn open_boundary_chapter(boundary: Boundary) -> ChapterConfig {
    let mut chapter = rows_chapter(&["...", "...", "..."], IVec2::new(1, 1));
    chapter.boundary = Some(boundary);
    chapter.player.spawn = Some(boundary.center());
    chapter
}

/// Build a chapter's world, panicking on invalid test config.
pub fn build(chapter: &ChapterConfig) -> Arc<ChapterWorld> {
    Arc::new(chapter.build_world().unwrap())
}

/// A simulation of `chapter` with `seed`.
pub fn simulation(chapter: &ChapterConfig, seed: u64) -> Simulation {
    Simulation::new(
        build(chapter),
        LoopConfig {
            max_frame_delta: None,
            seed,
        },
    )
}

/// A deterministic, varying input script.
pub fn scripted_input(tick: u64) -> PlayerInput {
    let directions = [Vec2::X, Vec2::new(1.0, 1.0), Vec2::Y, Vec2::NEG_X, Vec2::ZERO];
    #[allow(clippy::cast_possible_truncation)]
    let index = (tick / 30) as usize % directions.len();
    PlayerInput {
        direction: directions[index],
        attack: tick % 45 < 5,
    }
}

/// Run `ticks` steps with the scripted input, returning the hash after each.
pub fn run_hashes(sim: &mut Simulation, ticks: u64) -> Vec<u64> {
    (0..ticks)
        .map(|tick| {
            sim.step(FRAME, &scripted_input(tick));
            hash_simulation(sim)
        })
        .collect()
}
