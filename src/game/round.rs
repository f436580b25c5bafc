//! Round Controller
//!
//! Accepts one move per round, evaluates it against the opponent, applies
//! damage and closes the match when a side runs out of health.
//!
//! Every rejection leaves the state untouched: no RNG draw, no event, no
//! health change.

use crate::core::hash::StateHash;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::outcome::{describe, evaluate, Outcome};
use crate::game::rules::{Move, Ruleset};
use crate::game::state::{
    decide_winner, EndReason, MatchConfig, MatchState, MoveSource, RoundRecord, RoundState, Side,
};

/// Result of an accepted move.
#[derive(Debug, Clone)]
pub struct RoundReport {
    /// The round as recorded in the state
    pub record: RoundRecord,
    /// Whether this round closed the match
    pub match_ended: bool,
    /// Winner (if the match ended with one)
    pub winner: Option<Side>,
}

/// Why a move was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    /// A move was already accepted for this round.
    #[error("a move was already accepted for this round ({round_state:?})")]
    IllegalMove { round_state: RoundState },

    /// The match has ended.
    #[error("the match is over")]
    MatchOver,

    /// Move does not belong to the active ruleset.
    #[error("{mv} is not part of the {ruleset} ruleset")]
    ForeignMove { mv: Move, ruleset: Ruleset },
}

/// Submit the player's move; the opponent's move is drawn from the match RNG.
pub fn submit_move(
    state: &mut MatchState,
    mv: Move,
    source: MoveSource,
) -> Result<RoundReport, MoveRejection> {
    check_move(state, mv)?;
    let opponent = state.draw_opponent_move();
    Ok(resolve(state, mv, opponent, source))
}

/// Submit the player's move against a fixed opponent move.
///
/// Used for replays and scripted matches. The RNG is not touched.
pub fn submit_move_against(
    state: &mut MatchState,
    mv: Move,
    opponent: Move,
    source: MoveSource,
) -> Result<RoundReport, MoveRejection> {
    check_move(state, mv)?;
    if !state.ruleset().contains(opponent) {
        return Err(MoveRejection::ForeignMove {
            mv: opponent,
            ruleset: state.ruleset(),
        });
    }
    Ok(resolve(state, mv, opponent, source))
}

/// Re-arm the round after the result display.
///
/// Returns `false` (and changes nothing) unless the round is `Resolved`
/// and the match is still running.
pub fn reset_round(state: &mut MatchState) -> bool {
    if state.terminal || state.round != RoundState::Resolved {
        return false;
    }

    state.round = RoundState::Idle;
    state.round_number += 1;
    state.push_event(GameEvent::new(
        state.round_number,
        state.clock_remaining,
        GameEventData::RoundReset {
            next_round: state.round_number,
        },
    ));
    true
}

/// Mark the round as waiting on a gesture capture.
pub fn await_gesture(state: &mut MatchState) -> Result<(), MoveRejection> {
    if state.terminal {
        return Err(MoveRejection::MatchOver);
    }
    if state.round != RoundState::Idle {
        return Err(MoveRejection::IllegalMove {
            round_state: state.round,
        });
    }

    state.round = RoundState::AwaitingMove;
    state.push_event(GameEvent::new(
        state.round_number,
        state.clock_remaining,
        GameEventData::GestureAwaited,
    ));
    Ok(())
}

/// Return an `AwaitingMove` round to `Idle` after a failed or cancelled capture.
pub fn abandon_gesture(state: &mut MatchState) -> bool {
    if state.terminal || state.round != RoundState::AwaitingMove {
        return false;
    }

    state.round = RoundState::Idle;
    state.push_event(GameEvent::new(
        state.round_number,
        state.clock_remaining,
        GameEventData::GestureAbandoned,
    ));
    true
}

/// Close the match. First caller wins; later calls are no-ops.
pub(crate) fn end_match(state: &mut MatchState, reason: EndReason) -> bool {
    if state.terminal {
        return false;
    }

    let winner = decide_winner(state.health_player, state.health_opponent);
    state.terminal = true;
    state.winner = winner;
    state.end_reason = Some(reason);

    state.push_event(GameEvent::match_ended(
        state.round_number,
        state.clock_remaining,
        winner,
        reason,
        state.health_player,
        state.health_opponent,
    ));
    true
}

fn check_move(state: &MatchState, mv: Move) -> Result<(), MoveRejection> {
    if state.terminal {
        return Err(MoveRejection::MatchOver);
    }
    if !state.round.accepts_move() {
        return Err(MoveRejection::IllegalMove {
            round_state: state.round,
        });
    }
    if !state.ruleset().contains(mv) {
        return Err(MoveRejection::ForeignMove {
            mv,
            ruleset: state.ruleset(),
        });
    }
    Ok(())
}

fn resolve(state: &mut MatchState, mv: Move, opponent: Move, source: MoveSource) -> RoundReport {
    state.round = RoundState::Resolving;
    state.push_event(GameEvent::move_accepted(
        state.round_number,
        state.clock_remaining,
        source,
        mv,
        opponent,
    ));

    let ruleset = state.ruleset();
    let outcome = evaluate(ruleset, mv, opponent);
    let damage = state.config.damage_step;
    match outcome {
        Outcome::Win => state.health_opponent = state.health_opponent.saturating_sub(damage),
        Outcome::Lose => state.health_player = state.health_player.saturating_sub(damage),
        Outcome::Tie => {}
    }

    let record = RoundRecord {
        round: state.round_number,
        player_move: mv,
        opponent_move: opponent,
        outcome,
        source,
        health_player: state.health_player,
        health_opponent: state.health_opponent,
        message: describe(ruleset, mv, opponent),
    };
    state.last_outcome = Some(record.clone());
    state.round = RoundState::Resolved;
    state.push_event(GameEvent::round_resolved(state.clock_remaining, record.clone()));

    let match_ended = state.close_if_due();

    RoundReport {
        record,
        match_ended,
        winner: state.winner,
    }
}

/// Replay a match from a recorded list of exchanges.
///
/// Each exchange is played as a manual move against a fixed opponent move,
/// followed by a round reset. Exchanges after the match closes are ignored.
/// Returns final state hash and events.
pub fn replay_match(
    config: MatchConfig,
    rng_seed: u64,
    exchanges: &[(Move, Move)],
) -> Result<(StateHash, Vec<GameEvent>), MoveRejection> {
    let mut state = MatchState::new(config, rng_seed);
    let mut events = Vec::new();

    for &(mv, opponent) in exchanges {
        if state.is_terminal() {
            break;
        }
        submit_move_against(&mut state, mv, opponent, MoveSource::Manual)?;
        reset_round(&mut state);
        events.extend(state.take_events());
    }

    Ok((state.compute_hash(), events))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_match() -> MatchState {
        MatchState::new(MatchConfig::default(), 12345)
    }

    #[test]
    fn test_rock_beats_scissors_applies_damage() {
        let mut state = new_match();

        let report =
            submit_move_against(&mut state, Move::Rock, Move::Scissors, MoveSource::Manual).unwrap();

        assert_eq!(report.record.outcome, Outcome::Win);
        assert_eq!(report.record.message, "You win! Rock crushes Scissors");
        assert!(!report.match_ended);
        assert_eq!(state.health_player(), 100);
        assert_eq!(state.health_opponent(), 67);
        assert_eq!(state.round_state(), RoundState::Resolved);
        assert_eq!(state.last_outcome().map(|r| r.opponent_move), Some(Move::Scissors));

        assert!(reset_round(&mut state));
        assert_eq!(state.round_state(), RoundState::Idle);
        assert_eq!(state.round_number(), 2);
        assert_eq!(state.health_player(), 100);
        assert_eq!(state.health_opponent(), 67);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_second_move_is_rejected_without_side_effects() {
        let mut state = new_match();
        submit_move(&mut state, Move::Paper, MoveSource::Manual).unwrap();
        state.take_events();

        let before = state.compute_hash();
        let result = submit_move(&mut state, Move::Rock, MoveSource::Gesture);

        assert_eq!(
            result.unwrap_err(),
            MoveRejection::IllegalMove {
                round_state: RoundState::Resolved
            }
        );
        assert_eq!(state.compute_hash(), before);
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_four_losses_deplete_health() {
        let mut state = new_match();
        let expected = [67, 34, 1, 0];

        for (i, &health) in expected.iter().enumerate() {
            let report =
                submit_move_against(&mut state, Move::Rock, Move::Paper, MoveSource::Manual).unwrap();
            assert_eq!(state.health_player(), health);
            assert_eq!(report.match_ended, i == 3);
            reset_round(&mut state);
        }

        assert!(state.is_terminal());
        assert_eq!(state.winner(), Some(Side::Opponent));
        assert_eq!(state.end_reason(), Some(EndReason::HealthDepleted));
        assert_eq!(state.health_opponent(), 100);
    }

    #[test]
    fn test_tie_changes_no_health() {
        let mut state = new_match();
        let report =
            submit_move_against(&mut state, Move::Spock, Move::Spock, MoveSource::Manual).unwrap();

        assert_eq!(report.record.outcome, Outcome::Tie);
        assert_eq!(report.record.message, "It's a tie!");
        assert_eq!(state.health_player(), 100);
        assert_eq!(state.health_opponent(), 100);
    }

    #[test]
    fn test_moves_rejected_after_match_over() {
        let mut state = new_match();
        for _ in 0..4 {
            submit_move_against(&mut state, Move::Lizard, Move::Spock, MoveSource::Manual).unwrap();
            reset_round(&mut state);
        }
        assert!(state.is_terminal());
        assert_eq!(state.winner(), Some(Side::Player));

        let before = state.compute_hash();
        assert_eq!(
            submit_move(&mut state, Move::Rock, MoveSource::Manual).unwrap_err(),
            MoveRejection::MatchOver
        );
        assert!(!reset_round(&mut state));
        assert_eq!(await_gesture(&mut state), Err(MoveRejection::MatchOver));
        assert_eq!(state.compute_hash(), before);
    }

    #[test]
    fn test_foreign_move_rejected() {
        let mut state = new_match();
        let before = state.compute_hash();

        let err = submit_move(&mut state, Move::Dragon, MoveSource::Manual).unwrap_err();
        assert_eq!(
            err,
            MoveRejection::ForeignMove {
                mv: Move::Dragon,
                ruleset: Ruleset::Classic
            }
        );
        assert_eq!(state.compute_hash(), before);
    }

    #[test]
    fn test_reset_round_only_from_resolved() {
        let mut state = new_match();
        assert!(!reset_round(&mut state));

        submit_move(&mut state, Move::Rock, MoveSource::Manual).unwrap();
        assert!(reset_round(&mut state));
        assert_eq!(state.round_number(), 2);
        assert_eq!(state.round_state(), RoundState::Idle);
        assert!(!reset_round(&mut state));
    }

    #[test]
    fn test_gesture_wait_and_abandon() {
        let mut state = new_match();

        await_gesture(&mut state).unwrap();
        assert_eq!(state.round_state(), RoundState::AwaitingMove);
        assert!(matches!(
            await_gesture(&mut state),
            Err(MoveRejection::IllegalMove { .. })
        ));

        assert!(abandon_gesture(&mut state));
        assert_eq!(state.round_state(), RoundState::Idle);
        assert!(!abandon_gesture(&mut state));
    }

    #[test]
    fn test_manual_move_accepted_while_gesture_pending() {
        let mut state = new_match();
        await_gesture(&mut state).unwrap();

        submit_move_against(&mut state, Move::Scissors, Move::Paper, MoveSource::Manual).unwrap();
        assert_eq!(state.round_state(), RoundState::Resolved);
        assert!(!abandon_gesture(&mut state));
    }

    #[test]
    fn test_end_match_first_writer_wins() {
        let mut state = new_match();
        assert!(end_match(&mut state, EndReason::ClockExpired));
        assert!(!end_match(&mut state, EndReason::HealthDepleted));
        assert_eq!(state.end_reason(), Some(EndReason::ClockExpired));

        let ends = state.take_events().iter().filter(|e| e.is_match_end()).count();
        assert_eq!(ends, 1);
    }

    #[test]
    fn test_replay_determinism() {
        let exchanges = [
            (Move::Rock, Move::Scissors),
            (Move::Paper, Move::Scissors),
            (Move::Spock, Move::Spock),
        ];

        let (hash1, events1) = replay_match(MatchConfig::default(), 7, &exchanges).unwrap();
        let (hash2, events2) = replay_match(MatchConfig::default(), 7, &exchanges).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(events1, events2);
        assert!(!events1.is_empty());
    }
}
