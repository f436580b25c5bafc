//! Match Session
//!
//! Single owner of a match: the `MatchState`, the active capture ticket and
//! the reset epoch. Only the engine task holds a `MatchSession`, so every
//! mutation is serialized through it.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capture::session::{CaptureFailure, CaptureStatus};
use crate::core::rng::derive_match_seed;
use crate::game::clock::{tick_clock, ClockResult};
use crate::game::events::GameEvent;
use crate::game::round::{self, MoveRejection, RoundReport};
use crate::game::rules::Move;
use crate::game::state::{InvalidMatchConfig, MatchConfig, MatchState, MoveSource, RoundState};
use crate::runtime::protocol::MatchSnapshot;

/// Identifies the results of one capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureTicket {
    /// Match epoch the capture was started in
    pub epoch: u64,
    /// Capture counter within the session
    pub capture_id: u64,
    /// Round the capture was started for
    pub round: u32,
}

/// What happened to a finished capture.
#[derive(Debug, Clone)]
pub enum CaptureResolution {
    /// Ticket no longer current (match reset or superseded); ignored.
    Stale,
    /// Recognized move was played.
    Accepted(RoundReport),
    /// Recognized move arrived after its round was decided or had moved on.
    Rejected(MoveRejection),
    /// Capture failed; the round is back to idle.
    Failed(CaptureFailure),
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Move rejected by the round controller.
    #[error("Move rejected: {0}")]
    Move(#[from] MoveRejection),

    /// A capture session is already running.
    #[error("Capture already in progress")]
    CaptureInProgress,

    /// The round is not waiting for a move.
    #[error("Capture unavailable while round is {0:?}")]
    CaptureUnavailable(RoundState),
}

#[derive(Debug)]
struct ActiveCapture {
    ticket: CaptureTicket,
    status: CaptureStatus,
}

/// A running match and its capture bookkeeping.
pub struct MatchSession {
    id: Uuid,
    epoch: u64,
    config: MatchConfig,
    fixed_seed: Option<u64>,
    state: MatchState,
    capture: Option<ActiveCapture>,
    last_capture: Option<CaptureStatus>,
    next_capture_id: u64,
}

impl MatchSession {
    /// Start a session. Without a fixed seed the opponent RNG is seeded
    /// from the match UUID.
    pub fn new(config: MatchConfig, fixed_seed: Option<u64>) -> Result<Self, InvalidMatchConfig> {
        config.validate()?;

        let id = Uuid::new_v4();
        let state = MatchState::new(config.clone(), seed_for(&id, 0, fixed_seed));

        info!("Match {} started (seed {})", id, state.rng_seed());

        Ok(Self {
            id,
            epoch: 0,
            config,
            fixed_seed,
            state,
            capture: None,
            last_capture: None,
            next_capture_id: 0,
        })
    }

    /// Current match identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current epoch. Bumped by every match reset.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Match state (read-only).
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Ticket of the running capture, if any.
    pub fn active_capture(&self) -> Option<CaptureTicket> {
        self.capture.as_ref().map(|c| c.ticket)
    }

    /// Status of the running capture, or of the last finished one.
    pub fn capture_status(&self) -> Option<&CaptureStatus> {
        self.capture
            .as_ref()
            .map(|c| &c.status)
            .or(self.last_capture.as_ref())
    }

    /// Play a move.
    pub fn submit_move(&mut self, mv: Move, source: MoveSource) -> Result<RoundReport, SessionError> {
        match round::submit_move(&mut self.state, mv, source) {
            Ok(report) => {
                info!(
                    "Round {}: {} vs {} -> {} ({}/{})",
                    report.record.round,
                    report.record.player_move,
                    report.record.opponent_move,
                    report.record.outcome,
                    report.record.health_player,
                    report.record.health_opponent
                );
                if report.match_ended {
                    info!("Match {} ended, winner {:?}", self.id, report.winner);
                }
                Ok(report)
            }
            Err(rejection) => {
                warn!("Rejected {} move {}: {}", source_name(source), mv, rejection);
                Err(rejection.into())
            }
        }
    }

    /// Advance the match clock. Ignored for a stale epoch.
    pub fn tick_clock(&mut self, epoch: u64) -> Option<ClockResult> {
        if epoch != self.epoch {
            return None;
        }
        let result = tick_clock(&mut self.state);
        if result.match_ended {
            info!("Match {} ended on time, winner {:?}", self.id, result.winner);
        }
        Some(result)
    }

    /// Re-arm the round after its result was shown.
    ///
    /// Only applies if the epoch and round still match the ones the reset
    /// was scheduled for.
    pub fn reset_round(&mut self, epoch: u64, round_number: u32) -> bool {
        if epoch != self.epoch || round_number != self.state.round_number() {
            return false;
        }
        let reset = round::reset_round(&mut self.state);
        if reset {
            debug!("Round {} armed", self.state.round_number());
        }
        reset
    }

    /// Open a capture session for the current round.
    pub fn begin_capture(&mut self) -> Result<CaptureTicket, SessionError> {
        if self.state.is_terminal() {
            return Err(MoveRejection::MatchOver.into());
        }
        if self.capture.is_some() {
            return Err(SessionError::CaptureInProgress);
        }
        if self.state.round_state() != RoundState::Idle {
            return Err(SessionError::CaptureUnavailable(self.state.round_state()));
        }

        round::await_gesture(&mut self.state)?;

        self.next_capture_id += 1;
        let ticket = CaptureTicket {
            epoch: self.epoch,
            capture_id: self.next_capture_id,
            round: self.state.round_number(),
        };
        self.capture = Some(ActiveCapture {
            ticket,
            status: CaptureStatus::Idle,
        });
        debug!("Capture {} opened", ticket.capture_id);
        Ok(ticket)
    }

    /// Record a status change of the running capture.
    pub fn capture_progress(&mut self, ticket: CaptureTicket, status: CaptureStatus) -> bool {
        match self.capture.as_mut() {
            Some(active) if active.ticket == ticket => {
                active.status = status;
                true
            }
            _ => false,
        }
    }

    /// Apply the final result of a capture.
    pub fn finish_capture(
        &mut self,
        ticket: CaptureTicket,
        result: Result<Move, CaptureFailure>,
    ) -> CaptureResolution {
        let active = match self.capture.take() {
            Some(active) if active.ticket == ticket => active,
            other => {
                self.capture = other;
                debug!("Discarding stale capture result {:?}", ticket);
                return CaptureResolution::Stale;
            }
        };

        self.last_capture = Some(match &result {
            Ok(mv) => CaptureStatus::Resolved(*mv),
            Err(failure) => CaptureStatus::Failed(failure.clone()),
        });
        debug!("Capture {} finished after {}", ticket.capture_id, active.status);

        match result {
            Ok(mv) if ticket.round != self.state.round_number() => {
                warn!(
                    "Gesture {} for round {} arrived in round {}",
                    mv,
                    ticket.round,
                    self.state.round_number()
                );
                CaptureResolution::Rejected(MoveRejection::IllegalMove {
                    round_state: self.state.round_state(),
                })
            }
            Ok(mv) => match self.submit_move(mv, MoveSource::Gesture) {
                Ok(report) => CaptureResolution::Accepted(report),
                Err(SessionError::Move(rejection)) => CaptureResolution::Rejected(rejection),
                Err(_) => CaptureResolution::Stale,
            },
            Err(failure) => {
                round::abandon_gesture(&mut self.state);
                CaptureResolution::Failed(failure)
            }
        }
    }

    /// Drop the running capture without touching the round.
    ///
    /// Used once the match has ended; returns the cancelled ticket.
    pub fn cancel_capture(&mut self) -> Option<CaptureTicket> {
        let active = self.capture.take()?;
        self.last_capture = Some(CaptureStatus::Failed(CaptureFailure::Cancelled));
        debug!("Capture {} cancelled", active.ticket.capture_id);
        Some(active.ticket)
    }

    /// Replace the match with a fresh one.
    ///
    /// Returns the ticket of the capture that was cancelled, if any.
    pub fn reset_match(&mut self) -> Option<CaptureTicket> {
        self.epoch += 1;
        self.id = Uuid::new_v4();
        self.state = MatchState::new(self.config.clone(), seed_for(&self.id, self.epoch, self.fixed_seed));
        self.last_capture = None;

        let cancelled = self.capture.take().map(|active| {
            self.last_capture = Some(CaptureStatus::Failed(CaptureFailure::Cancelled));
            active.ticket
        });

        info!("Match reset: {} (epoch {})", self.id, self.epoch);
        cancelled
    }

    /// Visible state for the presentation layer.
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot::from_state(
            self.id.to_string(),
            self.epoch,
            &self.state,
            self.capture_status().cloned(),
        )
    }

    /// Drain game events produced since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.state.take_events()
    }
}

fn seed_for(id: &Uuid, epoch: u64, fixed_seed: Option<u64>) -> u64 {
    fixed_seed.unwrap_or_else(|| derive_match_seed(id.as_bytes(), &epoch.to_le_bytes()))
}

fn source_name(source: MoveSource) -> &'static str {
    match source {
        MoveSource::Manual => "manual",
        MoveSource::Gesture => "gesture",
    }
}

// =============================================================================
// TESTS
// =============================================================================
