//! Core deterministic primitives.
//!
//! Seeded randomness for the opponent and hashing for state comparison.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash};
