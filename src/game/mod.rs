//! Game Logic Module
//!
//! Match rules and state. Pure and deterministic; no I/O, no clocks.
//!
//! ## Module Structure
//!
//! - `rules`: Move vocabularies and the beats relation
//! - `outcome`: Round evaluation
//! - `state`: Match state, config, round records
//! - `round`: Round controller (move submission, reset, gesture wait)
//! - `clock`: Match clock countdown
//! - `events`: Game events published with each update

pub mod rules;
pub mod outcome;
pub mod state;
pub mod round;
pub mod clock;
pub mod events;

// Re-export key types
pub use rules::{beats, Move, Ruleset};
pub use outcome::{evaluate, Outcome};
pub use state::{EndReason, MatchConfig, MatchState, MoveSource, RoundRecord, RoundState, Side};
pub use round::{MoveRejection, RoundReport};
pub use clock::ClockResult;
pub use events::{GameEvent, GameEventData};
