//! Match Clock
//!
//! Counts the match down one second per tick. At zero the match closes and
//! the side with more health wins.

use crate::game::events::{GameEvent, GameEventData};
use crate::game::round::end_match;
use crate::game::state::{EndReason, MatchState, Side};

/// Result of a clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockResult {
    /// Seconds remaining after the tick
    pub remaining: u32,
    /// Whether the match ended on this tick
    pub match_ended: bool,
    /// Winner (if the match ended with one)
    pub winner: Option<Side>,
}

/// Advance the clock by one second.
///
/// No-op once the match is terminal.
pub fn tick_clock(state: &mut MatchState) -> ClockResult {
    if state.terminal {
        return ClockResult {
            remaining: state.clock_remaining,
            match_ended: false,
            winner: state.winner,
        };
    }

    state.clock_remaining = state.clock_remaining.saturating_sub(1);
    state.push_event(GameEvent::new(
        state.round_number,
        state.clock_remaining,
        GameEventData::ClockTicked {
            remaining: state.clock_remaining,
        },
    ));

    let match_ended = state.clock_remaining == 0 && end_match(state, EndReason::ClockExpired);

    ClockResult {
        remaining: state.clock_remaining,
        match_ended,
        winner: state.winner,
    }
}
