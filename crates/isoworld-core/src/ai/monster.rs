//! The monster state machine.

use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use terra::Boundary;

use super::{MonsterState, MonsterTransition};
use crate::config::MonsterArchetype;
use crate::entity::{AnimatedBody, Facing};

/// Distance at which a moving monster counts as having reached its target.
pub const ARRIVAL_RADIUS: f32 = 5.0;
/// Beyond this distance from its origin an idle monster may head home.
pub const RETURN_DISTANCE: f32 = 100.0;
/// Probability of heading home once beyond [`RETURN_DISTANCE`].
pub const RETURN_CHANCE: f32 = 0.6;
/// Seconds allowed for a return trip.
pub const RETURN_DURATION: f32 = 5.0;
/// Largest distance from the origin a wander target may lie.
pub const WANDER_RADIUS: f32 = 300.0;
/// Seconds allowed for a wander trip.
pub const WANDER_DURATION: f32 = 3.0;
/// Wander targets stay this far inside the boundary.
pub const WANDER_MARGIN: f32 = 50.0;
/// Seconds spent idle between trips.
pub const IDLE_DURATION_RANGE: RangeInclusive<f32> = 1.0..=3.0;

/// Per-monster AI state.
///
/// The brain never moves its body directly. [`MonsterBrain::think`] writes a
/// velocity and facing; the simulation then hands the body to the movement
/// resolver and reports back with [`MonsterBrain::abandon_move`] when the
/// move was fully blocked.
///
/// # Example
///
/// ```
/// use glam::Vec2;
/// use isoworld_core::ai::{MonsterBrain, MonsterState};
/// use isoworld_core::config::MonsterArchetype;
/// use isoworld_core::entity::AnimatedBody;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// let mut brain = MonsterBrain::new(MonsterArchetype::default(), Vec2::ZERO, &mut rng);
/// let mut body = AnimatedBody::at_position(Vec2::ZERO, 1.0);
///
/// assert_eq!(brain.state(), MonsterState::Idle);
///
/// // Idle lasts at most three seconds
/// let transition = brain.think(&mut body, 3.5, None, &mut rng);
/// assert_eq!(transition.map(|t| t.to), Some(MonsterState::Wander));
/// assert!(body.is_moving());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterBrain {
    archetype: MonsterArchetype,
    spawn_origin: Vec2,
    state: MonsterState,
    state_timer: f32,
    move_target: Option<Vec2>,
}

impl MonsterBrain {
    /// A fresh brain, idle for a random [`IDLE_DURATION_RANGE`] interval.
    pub fn new<R: Rng + ?Sized>(
        archetype: MonsterArchetype,
        spawn_origin: Vec2,
        rng: &mut R,
    ) -> Self {
        Self {
            archetype,
            spawn_origin,
            state: MonsterState::Idle,
            state_timer: rng.gen_range(IDLE_DURATION_RANGE),
            move_target: None,
        }
    }

    /// The archetype this monster was spawned from.
    #[must_use]
    pub fn archetype(&self) -> &MonsterArchetype {
        &self.archetype
    }

    /// Where the monster was spawned.
    #[must_use]
    pub fn spawn_origin(&self) -> Vec2 {
        self.spawn_origin
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> MonsterState {
        self.state
    }

    /// Seconds left in the current state.
    #[must_use]
    pub fn state_timer(&self) -> f32 {
        self.state_timer
    }

    /// Point the monster is walking towards, if any.
    #[must_use]
    pub fn move_target(&self) -> Option<Vec2> {
        self.move_target
    }

    /// Advance the state machine by `dt` seconds and set the body's velocity.
    ///
    /// Arrival within [`ARRIVAL_RADIUS`] snaps the body onto its target and
    /// zeroes the timer; the switch to `Idle` then happens on the following
    /// tick. Otherwise the timer counts down and, once it reaches zero, a
    /// transition fires.
    ///
    /// # Arguments
    ///
    /// * `body` - The monster's body
    /// * `dt` - Elapsed seconds, already sanitized by the loop
    /// * `boundary` - World boundary used to keep wander targets inside
    /// * `rng` - Source of wander and return draws
    ///
    /// # Returns
    ///
    /// The transition, when the state changed.
    pub fn think<R: Rng + ?Sized>(
        &mut self,
        body: &mut AnimatedBody,
        dt: f32,
        boundary: Option<&Boundary>,
        rng: &mut R,
    ) -> Option<MonsterTransition> {
        if body.is_moving() {
            if let Some(target) = self.move_target {
                if body.position.distance(target) < ARRIVAL_RADIUS {
                    body.position = target;
                    body.halt();
                    self.state_timer = 0.0;
                    return None;
                }
            }
        }

        self.state_timer -= dt;
        let transition = if self.state_timer <= 0.0 {
            let from = self.state;
            match from {
                MonsterState::Idle => self.leave_idle(body, boundary, rng),
                MonsterState::Wander | MonsterState::Return => self.enter_idle(body, rng),
            }
            Some(MonsterTransition {
                from,
                to: self.state,
            })
        } else {
            None
        };

        self.steer(body);
        transition
    }

    /// Give up on the current trip after a fully blocked move.
    ///
    /// The timer is zeroed so the next [`MonsterBrain::think`] fires a
    /// transition immediately.
    pub fn abandon_move(&mut self, body: &mut AnimatedBody) {
        self.state_timer = 0.0;
        body.halt();
    }

    /// Set the body's attacking flag from the player's position.
    ///
    /// Only archetypes with `auto_attack` ever attack, and only while the
    /// player is within their detection range.
    pub fn update_attack(&self, body: &mut AnimatedBody, player_position: Option<Vec2>) {
        let attacking = self.archetype.auto_attack
            && !body.is_dead()
            && player_position
                .is_some_and(|p| body.position.distance(p) <= self.archetype.detection_range);
        body.set_attacking(attacking);
    }

    fn leave_idle<R: Rng + ?Sized>(
        &mut self,
        body: &mut AnimatedBody,
        boundary: Option<&Boundary>,
        rng: &mut R,
    ) {
        let far_from_home = body.position.distance(self.spawn_origin) > RETURN_DISTANCE;
        if far_from_home && rng.gen::<f32>() < RETURN_CHANCE {
            self.state = MonsterState::Return;
            self.move_target = Some(self.spawn_origin);
            self.state_timer = RETURN_DURATION;
        } else {
            let angle = rng.gen_range(0.0..TAU);
            let radius = rng.gen_range(0.0..=WANDER_RADIUS);
            let mut target = self.spawn_origin + Vec2::from_angle(angle) * radius;
            if let Some(boundary) = boundary {
                target = boundary.shrink(WANDER_MARGIN).clamp(target);
            }
            self.state = MonsterState::Wander;
            self.move_target = Some(target);
            self.state_timer = WANDER_DURATION;
        }
        body.set_moving(true);
    }

    fn enter_idle<R: Rng + ?Sized>(&mut self, body: &mut AnimatedBody, rng: &mut R) {
        self.state = MonsterState::Idle;
        self.move_target = None;
        self.state_timer = rng.gen_range(IDLE_DURATION_RANGE);
        body.halt();
    }

    fn steer(&self, body: &mut AnimatedBody) {
        let target = match self.move_target {
            Some(target) if body.is_moving() => target,
            _ => {
                body.velocity = Vec2::ZERO;
                return;
            }
        };
        body.velocity = (target - body.position).normalize_or_zero() * self.archetype.move_speed;
        if let Some(facing) = monster_facing(body.velocity) {
            body.facing = facing;
        }
    }
}

/// Monsters have no upward clip; upward movement shows the left-facing one.
fn monster_facing(velocity: Vec2) -> Option<Facing> {
    Facing::from_direction(velocity).map(|facing| match facing {
        Facing::Up => Facing::Left,
        other => other,
    })
}

// =============================================================================
// Tests
// =============================================================================
