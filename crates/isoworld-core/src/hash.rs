//! State hashing for determinism verification.
//!
//! Two simulations built from the same chapter and seed, fed the same deltas
//! and inputs, must produce identical hashes after every tick.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::Vec2;

use crate::entity::{Entity, EntityKind};
use crate::simulation::Simulation;

/// Compute a deterministic hash of simulation state.
///
/// This hash includes:
/// - Tick, elapsed time and the population regen timer
/// - Every entity's ID, body and AI state, in spawn order
#[must_use]
pub fn hash_simulation(sim: &Simulation) -> u64 {
    let mut hasher = DefaultHasher::new();

    sim.tick().hash(&mut hasher);
    sim.elapsed().to_bits().hash(&mut hasher);
    sim.population().regen_timer().to_bits().hash(&mut hasher);

    for entity in sim.registry().entities_sorted() {
        hash_entity(entity, &mut hasher);
    }

    hasher.finish()
}

fn hash_entity<H: Hasher>(entity: &Entity, hasher: &mut H) {
    entity.id().hash(hasher);
    let body = entity.body();
    hash_vec2(body.position, hasher);
    hash_vec2(body.velocity, hasher);
    body.facing.hash(hasher);
    body.speed.to_bits().hash(hasher);
    body.flags.bits().hash(hasher);

    match entity.kind() {
        EntityKind::Player(state) => {
            0u8.hash(hasher);
            hash_vec2(state.last_input, hasher);
            hash_vec2(state.steering, hasher);
        }
        EntityKind::Monster(brain) => {
            1u8.hash(hasher);
            brain.archetype().id.hash(hasher);
            brain.state().hash(hasher);
            brain.state_timer().to_bits().hash(hasher);
            hash_vec2(brain.spawn_origin(), hasher);
            match brain.move_target() {
                Some(target) => {
                    1u8.hash(hasher);
                    hash_vec2(target, hasher);
                }
                None => 0u8.hash(hasher),
            }
        }
    }
}

fn hash_vec2<H: Hasher>(v: Vec2, hasher: &mut H) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
}
