//! Autonomous behaviour for non-player entities.
//!
//! Each monster carries a [`MonsterBrain`]: a three-state machine
//! (`Idle`, `Wander`, `Return`) driven by a countdown timer. The brain only
//! produces a movement intent (a velocity on the entity's body); turning that
//! intent into a legal position is the
//! [`MovementResolver`](crate::resolver::MovementResolver)'s job.
//!
//! ```text
//! Idle ──(timer, far from origin, p = 0.6)──► Return
//! Idle ──(timer, otherwise)─────────────────► Wander
//! Wander | Return ──(timer, arrival, blocked)──► Idle
//! ```

mod monster;

pub use monster::{
    MonsterBrain, ARRIVAL_RADIUS, IDLE_DURATION_RANGE, RETURN_CHANCE, RETURN_DISTANCE,
    RETURN_DURATION, WANDER_DURATION, WANDER_MARGIN, WANDER_RADIUS,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Behaviour state of a monster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MonsterState {
    /// Standing still until the timer runs out
    #[default]
    Idle,
    /// Walking towards a random point near the spawn origin
    Wander,
    /// Walking back to the spawn origin
    Return,
}

impl fmt::Display for MonsterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Wander => write!(f, "wander"),
            Self::Return => write!(f, "return"),
        }
    }
}

/// A state change reported by [`MonsterBrain::think`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonsterTransition {
    /// State before the tick
    pub from: MonsterState,
    /// State after the tick
    pub to: MonsterState,
}
