//! Property tests for the deterministic match core.

use proptest::prelude::*;

use retro_rumble::game::clock::tick_clock;
use retro_rumble::game::outcome::{evaluate, Outcome};
use retro_rumble::game::round::{replay_match, reset_round, submit_move, submit_move_against, MoveRejection};
use retro_rumble::game::rules::{Move, Ruleset};
use retro_rumble::game::state::{decide_winner, MatchConfig, MatchState, MoveSource, RoundState};

fn ruleset() -> impl Strategy<Value = Ruleset> {
    prop_oneof![Just(Ruleset::Classic), Just(Ruleset::Themed)]
}

/// One step of a match: a move pair or a clock tick.
#[derive(Debug, Clone, Copy)]
enum Step {
    Exchange(usize, usize),
    Tick,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0usize..5, 0usize..5).prop_map(|(a, b)| Step::Exchange(a, b)),
        1 => Just(Step::Tick),
    ]
}

proptest! {
    /// Property: Tie iff equal moves; otherwise exactly one side wins, and
    /// swapping the moves swaps the outcome
    #[test]
    fn prop_evaluate_is_antisymmetric(rules in ruleset(), a in 0usize..5, b in 0usize..5) {
        let vocab = rules.vocabulary();
        let (a, b) = (vocab[a], vocab[b]);

        let forward = evaluate(rules, a, b);
        let backward = evaluate(rules, b, a);

        prop_assert_eq!(forward == Outcome::Tie, a == b);
        prop_assert_eq!(forward.reverse(), backward);
    }

    /// Property: Health stays in range and a non-tie round moves exactly one
    /// side by one damage step (or down to zero)
    #[test]
    fn prop_health_changes_by_one_step(
        rules in ruleset(),
        steps in prop::collection::vec(step(), 0..40)
    ) {
        let config = MatchConfig { ruleset: rules, ..Default::default() };
        let damage = config.damage_step;
        let mut state = MatchState::new(config, 9);
        let vocab = rules.vocabulary();

        for step in steps {
            let (hp0, ho0) = (state.health_player(), state.health_opponent());
            match step {
                Step::Tick => { tick_clock(&mut state); }
                Step::Exchange(a, b) => {
                    if let Ok(report) = submit_move_against(&mut state, vocab[a], vocab[b], MoveSource::Manual) {
                        let (hp1, ho1) = (state.health_player(), state.health_opponent());
                        match report.record.outcome {
                            Outcome::Tie => prop_assert_eq!((hp1, ho1), (hp0, ho0)),
                            Outcome::Win => {
                                prop_assert_eq!(hp1, hp0);
                                prop_assert_eq!(ho1, ho0.saturating_sub(damage));
                            }
                            Outcome::Lose => {
                                prop_assert_eq!(ho1, ho0);
                                prop_assert_eq!(hp1, hp0.saturating_sub(damage));
                            }
                        }
                        reset_round(&mut state);
                    }
                }
            }
            prop_assert!(state.health_player() <= 100);
            prop_assert!(state.health_opponent() <= 100);
        }
    }

    /// Property: The match is terminal exactly when a health or the clock is
    /// zero, and the winner is the side with strictly more health
    #[test]
    fn prop_terminal_predicate(steps in prop::collection::vec(step(), 0..60), seed in any::<u64>()) {
        let mut state = MatchState::new(MatchConfig::default(), seed);

        for step in steps {
            match step {
                Step::Tick => { tick_clock(&mut state); }
                Step::Exchange(a, _) => {
                    let mv = Ruleset::Classic.vocabulary()[a];
                    if submit_move(&mut state, mv, MoveSource::Manual).is_ok() {
                        reset_round(&mut state);
                    }
                }
            }

            let predicate = state.health_player() == 0
                || state.health_opponent() == 0
                || state.clock_remaining() == 0;
            prop_assert_eq!(state.is_terminal(), predicate);
            if state.is_terminal() {
                prop_assert_eq!(
                    state.winner(),
                    decide_winner(state.health_player(), state.health_opponent())
                );
            }
        }
    }

    /// Property: A second move in a decided round is rejected and changes nothing
    #[test]
    fn prop_second_move_leaves_state_untouched(
        seed in any::<u64>(),
        first in 0usize..5,
        second in 0usize..5
    ) {
        let vocab = Ruleset::Classic.vocabulary();
        let mut state = MatchState::new(MatchConfig::default(), seed);
        let first_report = submit_move(&mut state, vocab[first], MoveSource::Manual).unwrap();
        let before = state.compute_hash();

        let result = submit_move(&mut state, vocab[second], MoveSource::Gesture);

        let rejected_as_illegal = matches!(
            result,
            Err(MoveRejection::IllegalMove { round_state: RoundState::Resolved })
        );
        prop_assert!(rejected_as_illegal);
        prop_assert_eq!(state.compute_hash(), before);
        prop_assert_eq!(state.last_outcome(), Some(&first_report.record));
    }

    /// Property: Replaying the same exchanges reproduces the same hash
    #[test]
    fn prop_replay_is_deterministic(
        seed in any::<u64>(),
        pairs in prop::collection::vec((0usize..5, 0usize..5), 0..12)
    ) {
        let vocab = Ruleset::Classic.vocabulary();
        let exchanges: Vec<(Move, Move)> = pairs.iter().map(|&(a, b)| (vocab[a], vocab[b])).collect();

        let (hash1, events1) = replay_match(MatchConfig::default(), seed, &exchanges).unwrap();
        let (hash2, events2) = replay_match(MatchConfig::default(), seed, &exchanges).unwrap();

        prop_assert_eq!(hash1, hash2);
        prop_assert_eq!(events1, events2);
    }
}
