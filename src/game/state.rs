//! Match State Definitions
//!
//! All state for one match. Fields are crate-private: only the round
//! controller (`game::round`) and the match clock (`game::clock`) mutate
//! them. Everything else reads through accessors or a snapshot.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::rng::DeterministicRng;
use crate::game::events::GameEvent;
use crate::game::outcome::Outcome;
use crate::game::round::end_match;
use crate::game::rules::{Move, Ruleset, VOCABULARY_SIZE};
use crate::{DAMAGE_STEP, DEFAULT_MATCH_DURATION_SECS, MAX_HEALTH};

// =============================================================================
// SMALL ENUMS
// =============================================================================

/// Lifecycle of the current round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RoundState {
    /// Waiting for a move from either modality
    #[default]
    Idle = 0,
    /// Waiting for an in-flight gesture capture to deliver a move
    AwaitingMove = 1,
    /// Move accepted, outcome being applied
    Resolving = 2,
    /// Outcome applied and published; next round not yet armed
    Resolved = 3,
}

impl RoundState {
    /// Whether a move may still be accepted in this state.
    #[inline]
    pub fn accepts_move(self) -> bool {
        matches!(self, RoundState::Idle | RoundState::AwaitingMove)
    }
}

/// One of the two contestants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Side {
    /// The human player
    Player = 0,
    /// The computer opponent
    Opponent = 1,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => f.write_str("Player"),
            Side::Opponent => f.write_str("Opponent"),
        }
    }
}

/// Input modality a move came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MoveSource {
    /// Direct selection
    Manual = 0,
    /// Camera capture resolved by the recognizer
    Gesture = 1,
}

/// Why a match closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EndReason {
    /// A side's health reached zero
    HealthDepleted = 0,
    /// The match clock reached zero
    ClockExpired = 1,
}

// =============================================================================
// ROUND RECORD
// =============================================================================

/// The last resolved round, as shown to the player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number (1-based)
    pub round: u32,
    /// Player's move
    pub player_move: Move,
    /// Opponent's move
    pub opponent_move: Move,
    /// Outcome from the player's side
    pub outcome: Outcome,
    /// Where the player's move came from
    pub source: MoveSource,
    /// Player health after the round
    pub health_player: u8,
    /// Opponent health after the round
    pub health_opponent: u8,
    /// Result line, e.g. "You win! Rock crushes Scissors"
    pub message: String,
}

// =============================================================================
// MATCH CONFIG
// =============================================================================

/// Configuration for one match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Rule table used for the whole match
    pub ruleset: Ruleset,
    /// Clock length in seconds
    pub duration_secs: u32,
    /// Health removed from the loser of a round. The standard game uses
    /// [`DAMAGE_STEP`]; other values give a non-standard match.
    pub damage_step: u8,
    /// Health each side starts with
    pub starting_health: u8,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ruleset: Ruleset::Classic,
            duration_secs: DEFAULT_MATCH_DURATION_SECS,
            damage_step: DAMAGE_STEP,
            starting_health: MAX_HEALTH,
        }
    }
}

impl MatchConfig {
    /// Check the configuration describes a playable match.
    pub fn validate(&self) -> Result<(), InvalidMatchConfig> {
        if self.duration_secs == 0 {
            return Err(InvalidMatchConfig::ZeroDuration);
        }
        if self.damage_step == 0 {
            return Err(InvalidMatchConfig::ZeroDamage);
        }
        if self.starting_health == 0 || self.starting_health > MAX_HEALTH {
            return Err(InvalidMatchConfig::StartingHealth(self.starting_health));
        }
        Ok(())
    }
}

/// Match configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMatchConfig {
    /// Clock would expire before the match starts.
    #[error("match duration must be at least one second")]
    ZeroDuration,

    /// Rounds would never change health.
    #[error("damage step must be positive")]
    ZeroDamage,

    /// Starting health outside 1..=100.
    #[error("starting health {0} is outside 1..=100")]
    StartingHealth(u8),
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete state of a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchState {
    pub(crate) config: MatchConfig,
    pub(crate) health_player: u8,
    pub(crate) health_opponent: u8,
    pub(crate) clock_remaining: u32,
    pub(crate) round: RoundState,
    /// Current round number (1-based)
    pub(crate) round_number: u32,
    pub(crate) last_outcome: Option<RoundRecord>,
    pub(crate) terminal: bool,
    pub(crate) winner: Option<Side>,
    pub(crate) end_reason: Option<EndReason>,
    /// RNG seed (for replay)
    pub(crate) rng_seed: u64,
    /// Opponent move source
    pub(crate) rng: DeterministicRng,
    /// Events generated since the last drain
    #[serde(skip)]
    pub(crate) pending_events: Vec<GameEvent>,
}

impl MatchState {
    /// Create a fresh match: full health, full clock, idle round.
    ///
    /// A config that already satisfies the termination predicate (zero
    /// clock or zero health) yields a match that is over from the start.
    pub fn new(config: MatchConfig, rng_seed: u64) -> Self {
        let mut state = Self {
            health_player: config.starting_health,
            health_opponent: config.starting_health,
            clock_remaining: config.duration_secs,
            round: RoundState::Idle,
            round_number: 1,
            last_outcome: None,
            terminal: false,
            winner: None,
            end_reason: None,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            pending_events: Vec::new(),
            config,
        };
        state.close_if_due();
        state
    }

    /// End the match if the termination predicate holds.
    pub(crate) fn close_if_due(&mut self) -> bool {
        if !self.termination_due() {
            return false;
        }
        let reason = if self.health_player == 0 || self.health_opponent == 0 {
            EndReason::HealthDepleted
        } else {
            EndReason::ClockExpired
        };
        end_match(self, reason)
    }

    /// Match configuration.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Active ruleset.
    pub fn ruleset(&self) -> Ruleset {
        self.config.ruleset
    }

    /// Health of one side.
    pub fn health(&self, side: Side) -> u8 {
        match side {
            Side::Player => self.health_player,
            Side::Opponent => self.health_opponent,
        }
    }

    /// Player health.
    pub fn health_player(&self) -> u8 {
        self.health_player
    }

    /// Opponent health.
    pub fn health_opponent(&self) -> u8 {
        self.health_opponent
    }

    /// Seconds left on the match clock.
    pub fn clock_remaining(&self) -> u32 {
        self.clock_remaining
    }

    /// Current round state.
    pub fn round_state(&self) -> RoundState {
        self.round
    }

    /// Current round number (1-based).
    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    /// Most recently resolved round.
    pub fn last_outcome(&self) -> Option<&RoundRecord> {
        self.last_outcome.as_ref()
    }

    /// Check if match has ended.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Winner, once the match has ended with one. `None` while running or on a draw.
    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// Why the match ended.
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Seed the opponent RNG was created from.
    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Whether the termination predicate currently holds.
    pub fn termination_due(&self) -> bool {
        self.health_player == 0 || self.health_opponent == 0 || self.clock_remaining == 0
    }

    /// Draw the opponent's move uniformly from the active vocabulary.
    pub(crate) fn draw_opponent_move(&mut self) -> Move {
        let vocabulary = self.config.ruleset.vocabulary();
        let idx = self.rng.next_int(VOCABULARY_SIZE as u32) as usize;
        vocabulary[idx]
    }

    /// Compute hash of the complete state.
    ///
    /// Two states with equal hashes are indistinguishable to every later
    /// transition, RNG included.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.round_number, self.clock_remaining, |hasher| {
            hash_config(hasher, &self.config);
            hasher.update_u8(self.health_player);
            hasher.update_u8(self.health_opponent);
            hasher.update_u8(self.round as u8);
            hasher.update_bool(self.terminal);
            hasher.update_opt_u8(self.winner.map(|w| w as u8));
            hasher.update_opt_u8(self.end_reason.map(|r| r as u8));

            match &self.last_outcome {
                Some(record) => {
                    hasher.update_u8(1);
                    hash_record(hasher, record);
                }
                None => hasher.update_u8(0),
            }

            hasher.update_u64(self.rng_seed);
            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

fn hash_config(hasher: &mut StateHasher, config: &MatchConfig) {
    hasher.update_u8(config.ruleset as u8);
    hasher.update_u32(config.duration_secs);
    hasher.update_u8(config.damage_step);
    hasher.update_u8(config.starting_health);
}

fn hash_record(hasher: &mut StateHasher, record: &RoundRecord) {
    hasher.update_u32(record.round);
    hasher.update_u8(record.player_move as u8);
    hasher.update_u8(record.opponent_move as u8);
    hasher.update_u8(record.outcome as u8);
    hasher.update_u8(record.source as u8);
    hasher.update_u8(record.health_player);
    hasher.update_u8(record.health_opponent);
    hasher.update_bytes(record.message.as_bytes());
}

/// Decide the winner from remaining health.
///
/// Strictly greater health wins; equal health is a draw (`None`).
pub fn decide_winner(health_player: u8, health_opponent: u8) -> Option<Side> {
    match health_player.cmp(&health_opponent) {
        std::cmp::Ordering::Greater => Some(Side::Player),
        std::cmp::Ordering::Less => Some(Side::Opponent),
        std::cmp::Ordering::Equal => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::round::{submit_move, MoveRejection};

    #[test]
    fn test_new_match_defaults() {
        let state = MatchState::new(MatchConfig::default(), 12345);

        assert_eq!(state.health_player(), 100);
        assert_eq!(state.health_opponent(), 100);
        assert_eq!(state.clock_remaining(), 15);
        assert_eq!(state.round_state(), RoundState::Idle);
        assert_eq!(state.round_number(), 1);
        assert!(state.last_outcome().is_none());
        assert!(!state.is_terminal());
        assert_eq!(state.winner(), None);
        assert!(!state.termination_due());
    }

    #[test]
    fn test_decide_winner() {
        assert_eq!(decide_winner(100, 67), Some(Side::Player));
        assert_eq!(decide_winner(34, 67), Some(Side::Opponent));
        assert_eq!(decide_winner(67, 67), None);
        assert_eq!(decide_winner(0, 0), None);
    }

    #[test]
    fn test_state_hash_determinism() {
        let state1 = MatchState::new(MatchConfig::default(), 12345);
        let state2 = MatchState::new(MatchConfig::default(), 12345);
        assert_eq!(state1.compute_hash(), state2.compute_hash());

        let state3 = MatchState::new(MatchConfig::default(), 54321);
        assert_ne!(state1.compute_hash(), state3.compute_hash());
    }

    #[test]
    fn test_opponent_draw_stays_in_vocabulary() {
        for ruleset in Ruleset::ALL {
            let config = MatchConfig { ruleset, ..Default::default() };
            let mut state = MatchState::new(config, 99);
            for _ in 0..200 {
                assert!(ruleset.contains(state.draw_opponent_move()));
            }
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(MatchConfig::default().validate().is_ok());

        let zero_clock = MatchConfig { duration_secs: 0, ..Default::default() };
        assert_eq!(zero_clock.validate(), Err(InvalidMatchConfig::ZeroDuration));

        let zero_damage = MatchConfig { damage_step: 0, ..Default::default() };
        assert_eq!(zero_damage.validate(), Err(InvalidMatchConfig::ZeroDamage));

        let too_healthy = MatchConfig { starting_health: 150, ..Default::default() };
        assert_eq!(too_healthy.validate(), Err(InvalidMatchConfig::StartingHealth(150)));
    }

    #[test]
    fn test_zero_clock_match_is_over_from_the_start() {
        let config = MatchConfig { duration_secs: 0, ..Default::default() };
        let mut state = MatchState::new(config, 1);

        assert_eq!(state.clock_remaining(), 0);
        assert!(state.is_terminal());
        assert_eq!(state.end_reason(), Some(EndReason::ClockExpired));
        assert_eq!(state.winner(), None);
        assert_eq!(
            submit_move(&mut state, Move::Rock, MoveSource::Manual).unwrap_err(),
            MoveRejection::MatchOver
        );

        let no_health = MatchConfig { starting_health: 0, ..Default::default() };
        let state = MatchState::new(no_health, 1);
        assert!(state.is_terminal());
        assert_eq!(state.end_reason(), Some(EndReason::HealthDepleted));
    }

    #[test]
    fn test_round_state_accepts_move() {
        assert!(RoundState::Idle.accepts_move());
        assert!(RoundState::AwaitingMove.accepts_move());
        assert!(!RoundState::Resolving.accepts_move());
        assert!(!RoundState::Resolved.accepts_move());
    }
}
