//! Outcome Evaluation
//!
//! Decides a round from the player's point of view. Pure and deterministic.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::game::rules::{beats, Move, Ruleset};

/// Result of one exchange, from the player's side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Outcome {
    /// Same move on both sides
    Tie = 0,
    /// Player's move beats the opponent's
    Win = 1,
    /// Opponent's move beats the player's
    Lose = 2,
}

impl Outcome {
    /// The same exchange seen from the other side.
    pub fn reverse(self) -> Outcome {
        match self {
            Outcome::Tie => Outcome::Tie,
            Outcome::Win => Outcome::Lose,
            Outcome::Lose => Outcome::Win,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Tie => f.write_str("tie"),
            Outcome::Win => f.write_str("win"),
            Outcome::Lose => f.write_str("lose"),
        }
    }
}

/// Evaluate a round.
///
/// Equal moves tie; otherwise the relation is total, so the player either
/// beats the opponent or is beaten.
pub fn evaluate(ruleset: Ruleset, player: Move, opponent: Move) -> Outcome {
    if player == opponent {
        Outcome::Tie
    } else if beats(ruleset, player, opponent) {
        Outcome::Win
    } else {
        Outcome::Lose
    }
}

/// One-line result text for display, e.g. "You win! Rock crushes Scissors".
pub fn describe(ruleset: Ruleset, player: Move, opponent: Move) -> String {
    match evaluate(ruleset, player, opponent) {
        Outcome::Tie => "It's a tie!".to_string(),
        Outcome::Win => format!(
            "You win! {} {} {}",
            player,
            ruleset.verb(player, opponent).unwrap_or("beats"),
            opponent
        ),
        Outcome::Lose => format!(
            "You lose! {} {} {}",
            opponent,
            ruleset.verb(opponent, player).unwrap_or("beats"),
            player
        ),
    }
}
