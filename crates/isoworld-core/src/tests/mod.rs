//! Crate-level scenario tests.
//!
//! - `determinism.rs`: same chapter, seed and inputs give identical runs
//! - `integration.rs`: full-loop scenarios (spawning, sliding, pause, death)
//! - `helpers.rs`: chapter factories and run drivers

mod helpers;

// Re-export for convenience
pub use helpers::*;
