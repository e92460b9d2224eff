//! # Isoworld Core
//!
//! Entity simulation over an isometric grid world.
//!
//! A chapter is loaded once into an immutable [`ChapterWorld`] (grid,
//! walkability oracle, start cell). A [`Simulation`] then ticks the player
//! and a population of autonomous monsters over it:
//!
//! - **Entities**: a shared [`AnimatedBody`] plus a `Player`/`Monster` variant
//! - **AI**: the [`MonsterBrain`] Idle/Wander/Return state machine
//! - **Resolver**: per-axis collision-aware movement and isometric input
//!   blending
//! - **Registry**: entity storage and population refill
//!
//! Spatial primitives live in the [`terra`] crate, re-exported here.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use glam::Vec2;
//! use isoworld_core::{ChapterCatalog, LoopConfig, PlayerInput, Simulation};
//!
//! let catalog = ChapterCatalog::from_json(r#"[{
//!     "id": "cave",
//!     "map": { "kind": "random_walk", "width": 32, "height": 32, "ratio": 0.5 },
//!     "start": [16, 16],
//!     "spawn": { "target_count": 3, "regen_interval": 2.0 },
//!     "monsters": [{ "id": "bat", "move_speed": 1.5 }]
//! }]"#).unwrap();
//!
//! let world = Arc::new(catalog.load("cave").unwrap());
//! let mut sim = Simulation::new(world, LoopConfig { seed: 7, ..LoopConfig::default() });
//! sim.step(1.0 / 60.0, &PlayerInput::moving(Vec2::X));
//!
//! assert_eq!(sim.tick(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export terra for spatial queries
pub use terra;

pub mod ai;
pub mod config;
pub mod entity;
pub mod hash;
pub mod registry;
pub mod resolver;
pub mod simulation;
pub mod snapshot;

pub use ai::{MonsterBrain, MonsterState, MonsterTransition};
pub use config::{ChapterCatalog, ChapterConfig, ChapterWorld, ConfigError, LoopConfig};
pub use entity::{AnimatedBody, AnimationTag, Entity, EntityId, EntityKind, EntityTag, Facing};
pub use hash::hash_simulation;
pub use registry::{EntityRegistry, PopulationController};
pub use resolver::{IsoInputBlender, MoveOutcome, MovementResolver};
pub use simulation::{PlayerInput, Simulation, TickReport};
pub use snapshot::{EntitySnapshot, FrameSnapshot};

#[cfg(test)]
mod tests;
