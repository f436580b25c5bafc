//! # Retro Rumble Match Engine
//!
//! Rock-Paper-Scissors-Lizard-Spock matches against a computer opponent,
//! played by direct selection or by a camera gesture.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    RETRO RUMBLE ENGINE                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── rng.rs       - Deterministic Xorshift128+ PRNG          │
//! │  └── hash.rs      - State hashing for comparison             │
//! │                                                              │
//! │  game/            - Match logic (deterministic)              │
//! │  ├── rules.rs     - Vocabularies and the beats relation      │
//! │  ├── outcome.rs   - Round evaluation                         │
//! │  ├── state.rs     - Match state and config                   │
//! │  ├── round.rs     - Round controller                         │
//! │  ├── clock.rs     - Match clock                              │
//! │  └── events.rs    - Game events                              │
//! │                                                              │
//! │  capture/         - Gesture capture (async)                  │
//! │  ├── session.rs   - Capture state machine                    │
//! │  ├── pipeline.rs  - Camera + recognizer driver               │
//! │  └── camera.rs, recognizer.rs, scripted.rs                   │
//! │                                                              │
//! │  runtime/         - Engine task (non-deterministic)          │
//! │  ├── engine.rs    - Event loop, clock, timers                │
//! │  ├── session.rs   - Single owner of the match                │
//! │  └── protocol.rs  - Commands, snapshots, notices             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic: given the same seed
//! and the same sequence of moves and clock ticks, a match produces the
//! same state hash. Wall-clock time and collaborators live in `capture/`
//! and `runtime/` only.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod capture;
pub mod runtime;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::rules::{Move, Ruleset};
pub use game::outcome::{evaluate, Outcome};
pub use game::state::{MatchConfig, MatchState, Side};
pub use runtime::engine::{EngineConfig, EngineHandle};
pub use runtime::protocol::{EngineCommand, EngineUpdate, MatchSnapshot};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Health each side starts a match with
pub const MAX_HEALTH: u8 = 100;

/// Health removed from the loser of a round
pub const DAMAGE_STEP: u8 = 33;

/// Match clock length (seconds)
pub const DEFAULT_MATCH_DURATION_SECS: u32 = 15;

/// Capture countdown start value
pub const CAPTURE_COUNTDOWN_START: u8 = 3;
