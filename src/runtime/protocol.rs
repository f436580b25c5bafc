//! Presentation Protocol
//!
//! Commands flowing into the engine and updates flowing out to whatever
//! renders the match. Everything encodes as JSON; snapshots also encode
//! to compact binary (bincode) for storage and replay.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::capture::session::{CaptureFailure, CaptureStatus};
use crate::game::events::GameEvent;
use crate::game::round::MoveRejection;
use crate::game::rules::{Move, Ruleset};
use crate::game::state::{EndReason, MatchState, RoundRecord, RoundState, Side};

// =============================================================================
// PRESENTATION -> ENGINE
// =============================================================================

/// Commands accepted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineCommand {
    /// Play a move directly.
    SubmitMove {
        #[serde(rename = "move")]
        mv: Move,
    },

    /// Start a fresh match.
    ResetMatch,

    /// Start a gesture capture for the current round.
    StartCapture,
}

impl EngineCommand {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// ENGINE -> PRESENTATION
// =============================================================================

/// Full view of the match after a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Match identifier (UUID, hyphenated)
    pub match_id: String,
    /// Reset counter
    pub epoch: u64,
    /// Player health (0..=100)
    pub health_player: u8,
    /// Opponent health (0..=100)
    pub health_opponent: u8,
    /// Seconds left on the match clock
    pub clock_remaining: u32,
    /// Current round state
    pub round_state: RoundState,
    /// Current round number (1-based)
    pub round_number: u32,
    /// Most recently resolved round
    pub last_outcome: Option<RoundRecord>,
    /// Whether the match has ended
    pub terminal: bool,
    /// Winner; `None` while running or on a draw
    pub winner: Option<Side>,
    /// Why the match ended
    pub end_reason: Option<EndReason>,
    /// Active ruleset
    pub ruleset: Ruleset,
    /// Status of the current or most recent capture session
    pub capture: Option<CaptureStatus>,
}

impl MatchSnapshot {
    /// Capture the visible parts of a match state.
    pub fn from_state(
        match_id: String,
        epoch: u64,
        state: &MatchState,
        capture: Option<CaptureStatus>,
    ) -> Self {
        Self {
            match_id,
            epoch,
            health_player: state.health_player(),
            health_opponent: state.health_opponent(),
            clock_remaining: state.clock_remaining(),
            round_state: state.round_state(),
            round_number: state.round_number(),
            last_outcome: state.last_outcome().cloned(),
            terminal: state.is_terminal(),
            winner: state.winner(),
            end_reason: state.end_reason(),
            ruleset: state.ruleset(),
            capture,
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Informational
    Info,
    /// Action refused, nothing changed
    Warning,
    /// Something failed
    Error,
}

/// A transient message for the player (toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Short heading
    pub title: String,
    /// Body text
    pub description: String,
    /// When the engine raised it
    pub issued_at: DateTime<Utc>,
}

impl Notice {
    /// Create a notice stamped now.
    pub fn new(level: NoticeLevel, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            description: description.into(),
            issued_at: Utc::now(),
        }
    }

    /// Notice for a refused move.
    pub fn from_rejection(rejection: &MoveRejection) -> Self {
        match rejection {
            MoveRejection::IllegalMove { .. } => Self::new(
                NoticeLevel::Warning,
                "Illegal move",
                "You've already chosen your gameplay action! Please play again!",
            ),
            MoveRejection::MatchOver => Self::new(
                NoticeLevel::Warning,
                "Match over",
                "The match has ended. Start a new match to keep playing.",
            ),
            MoveRejection::ForeignMove { .. } => {
                Self::new(NoticeLevel::Warning, "Illegal move", rejection.to_string())
            }
        }
    }

    /// Notice for a failed capture. Cancellation is silent.
    pub fn from_capture_failure(failure: &CaptureFailure) -> Option<Self> {
        let description = match failure {
            CaptureFailure::Cancelled => return None,
            CaptureFailure::NoCameraAccess => {
                "No photo available. Please enable camera access.".to_string()
            }
            CaptureFailure::CaptureError { .. } => failure.to_string(),
            CaptureFailure::RecognitionError { message } => message.clone(),
        };
        Some(Self::new(NoticeLevel::Error, "Gesture Recognition Failed", description))
    }

    /// Notice for a capture that could not start.
    pub fn capture_unavailable(reason: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, "Capture unavailable", reason)
    }
}

/// Published after every engine transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineUpdate {
    /// Match view after the transition
    pub snapshot: MatchSnapshot,
    /// Message for the player, if any
    pub notice: Option<Notice>,
    /// Game events produced by the transition
    pub events: Vec<GameEvent>,
}

impl EngineUpdate {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::MatchConfig;

    #[test]
    fn test_command_json() {
        let json = r#"{"type":"submit_move","move":"Lizard"}"#;
        assert_eq!(
            EngineCommand::from_json(json).unwrap(),
            EngineCommand::SubmitMove { mv: Move::Lizard }
        );

        let reset = EngineCommand::ResetMatch.to_json().unwrap();
        assert_eq!(reset, r#"{"type":"reset_match"}"#);
        assert!(EngineCommand::from_json(r#"{"type":"start_capture"}"#).is_ok());
    }

    #[test]
    fn test_snapshot_binary_and_json() {
        let state = MatchState::new(MatchConfig::default(), 3);
        let snapshot = MatchSnapshot::from_state(
            "m-1".to_string(),
            2,
            &state,
            Some(CaptureStatus::Failed(CaptureFailure::RecognitionError {
                message: "blurry".to_string(),
            })),
        );

        let bytes = snapshot.to_bytes().unwrap();
        assert_eq!(MatchSnapshot::from_bytes(&bytes).unwrap(), snapshot);

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"round_state\":\"idle\""));
        assert_eq!(MatchSnapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn test_notice_wording() {
        let illegal = Notice::from_rejection(&MoveRejection::IllegalMove {
            round_state: RoundState::Resolved,
        });
        assert_eq!(illegal.title, "Illegal move");
        assert_eq!(
            illegal.description,
            "You've already chosen your gameplay action! Please play again!"
        );

        let failed = Notice::from_capture_failure(&CaptureFailure::RecognitionError {
            message: "Hand not visible".to_string(),
        })
        .unwrap();
        assert_eq!(failed.title, "Gesture Recognition Failed");
        assert_eq!(failed.description, "Hand not visible");

        assert!(Notice::from_capture_failure(&CaptureFailure::Cancelled).is_none());
    }
}
