//! Game Events
//!
//! Events generated by the round controller and the match clock.
//! They are drained after every transition and published with the snapshot.

use serde::{Serialize, Deserialize};

use crate::game::rules::Move;
use crate::game::state::{EndReason, MoveSource, RoundRecord, Side};

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEventData {
    /// A move was accepted for the current round
    MoveAccepted {
        source: MoveSource,
        player_move: Move,
        opponent_move: Move,
    },

    /// A round finished resolving
    RoundResolved {
        record: RoundRecord,
    },

    /// Round returned to idle for the next move
    RoundReset {
        next_round: u32,
    },

    /// Round is waiting on a gesture capture
    GestureAwaited,

    /// Gesture capture gave up without a move
    GestureAbandoned,

    /// Match clock advanced
    ClockTicked {
        remaining: u32,
    },

    /// Match ended
    MatchEnded {
        winner: Option<Side>,
        reason: EndReason,
        health_player: u8,
        health_opponent: u8,
    },
}

/// A game event stamped with the round and clock at which it happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Round number when the event occurred
    pub round: u32,

    /// Clock seconds remaining when the event occurred
    pub clock_remaining: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(round: u32, clock_remaining: u32, data: GameEventData) -> Self {
        Self {
            round,
            clock_remaining,
            data,
        }
    }

    /// Create move accepted event.
    pub fn move_accepted(
        round: u32,
        clock_remaining: u32,
        source: MoveSource,
        player_move: Move,
        opponent_move: Move,
    ) -> Self {
        Self::new(
            round,
            clock_remaining,
            GameEventData::MoveAccepted {
                source,
                player_move,
                opponent_move,
            },
        )
    }

    /// Create round resolved event.
    pub fn round_resolved(clock_remaining: u32, record: RoundRecord) -> Self {
        Self::new(record.round, clock_remaining, GameEventData::RoundResolved { record })
    }

    /// Create match ended event.
    pub fn match_ended(
        round: u32,
        clock_remaining: u32,
        winner: Option<Side>,
        reason: EndReason,
        health_player: u8,
        health_opponent: u8,
    ) -> Self {
        Self::new(
            round,
            clock_remaining,
            GameEventData::MatchEnded {
                winner,
                reason,
                health_player,
                health_opponent,
            },
        )
    }

    /// Whether this event closed the match.
    pub fn is_match_end(&self) -> bool {
        matches!(self.data, GameEventData::MatchEnded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = GameEvent::new(2, 9, GameEventData::ClockTicked { remaining: 9 });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"clock_ticked\""));

        let parsed: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_match_end_detection() {
        let end = GameEvent::match_ended(4, 0, Some(Side::Player), EndReason::ClockExpired, 100, 67);
        assert!(end.is_match_end());

        let tick = GameEvent::new(1, 14, GameEventData::ClockTicked { remaining: 14 });
        assert!(!tick.is_match_end());
    }
}
