//! Rule Tables
//!
//! Move vocabularies and the "beats" relation for each ruleset.
//! Pure data: swapping the ruleset of a match touches nothing else.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Number of moves in every ruleset vocabulary.
pub const VOCABULARY_SIZE: usize = 5;

// =============================================================================
// MOVE
// =============================================================================

/// A move symbol.
///
/// Every move belongs to exactly one ruleset's vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Move {
    /// Classic: crushes Scissors and Lizard
    Rock = 0,
    /// Classic: covers Rock and disproves Spock
    Paper = 1,
    /// Classic: cuts Paper and decapitates Lizard
    Scissors = 2,
    /// Classic: poisons Spock and eats Paper
    Lizard = 3,
    /// Classic: smashes Scissors and vaporizes Rock
    Spock = 4,
    /// Themed: charges down Archer and cleaves Wizard
    Knight = 5,
    /// Themed: shoots down Dragon and pins Ghost
    Archer = 6,
    /// Themed: scorches Wizard and crushes Knight
    Dragon = 7,
    /// Themed: banishes Ghost and hexes Archer
    Wizard = 8,
    /// Themed: haunts Knight and possesses Dragon
    Ghost = 9,
}

impl Move {
    /// All moves across every ruleset.
    pub const ALL: [Move; 10] = [
        Move::Rock,
        Move::Paper,
        Move::Scissors,
        Move::Lizard,
        Move::Spock,
        Move::Knight,
        Move::Archer,
        Move::Dragon,
        Move::Wizard,
        Move::Ghost,
    ];

    /// Canonical name, as used on the recognizer wire.
    pub fn name(self) -> &'static str {
        match self {
            Move::Rock => "Rock",
            Move::Paper => "Paper",
            Move::Scissors => "Scissors",
            Move::Lizard => "Lizard",
            Move::Spock => "Spock",
            Move::Knight => "Knight",
            Move::Archer => "Archer",
            Move::Dragon => "Dragon",
            Move::Wizard => "Wizard",
            Move::Ghost => "Ghost",
        }
    }

    /// Parse a move name (case-insensitive, surrounding whitespace ignored).
    pub fn from_name(name: &str) -> Option<Move> {
        let name = name.trim();
        Move::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }

    /// The ruleset whose vocabulary contains this move.
    pub fn ruleset(self) -> Ruleset {
        if (self as u8) < VOCABULARY_SIZE as u8 {
            Ruleset::Classic
        } else {
            Ruleset::Themed
        }
    }

    /// Display glyph.
    pub fn glyph(self) -> &'static str {
        match self {
            Move::Rock => "✊",
            Move::Paper => "✋",
            Move::Scissors => "✌️",
            Move::Lizard => "🦎",
            Move::Spock => "🖖",
            Move::Knight => "🛡️",
            Move::Archer => "🏹",
            Move::Dragon => "🐉",
            Move::Wizard => "🧙",
            Move::Ghost => "👻",
        }
    }

    /// Position of this move inside its ruleset's vocabulary.
    #[inline]
    fn slot(self) -> usize {
        (self as u8 as usize) % VOCABULARY_SIZE
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// RULESET
// =============================================================================

/// A named rule table: vocabulary plus win relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Ruleset {
    /// Rock, Paper, Scissors, Lizard, Spock
    #[default]
    Classic,
    /// Knight, Archer, Dragon, Wizard, Ghost
    Themed,
}

/// Static rule data for one ruleset.
struct RuleTable {
    vocabulary: [Move; VOCABULARY_SIZE],
    /// Bit `j` of entry `i` is set when vocabulary[i] beats vocabulary[j].
    defeats: [u8; VOCABULARY_SIZE],
    /// (winner, loser, verb) for every winning pair.
    verbs: [(Move, Move, &'static str); 10],
}

static CLASSIC: RuleTable = RuleTable {
    vocabulary: [Move::Rock, Move::Paper, Move::Scissors, Move::Lizard, Move::Spock],
    defeats: [
        0b01100, // Rock: Scissors, Lizard
        0b10001, // Paper: Rock, Spock
        0b01010, // Scissors: Paper, Lizard
        0b10010, // Lizard: Paper, Spock
        0b00101, // Spock: Rock, Scissors
    ],
    verbs: [
        (Move::Rock, Move::Scissors, "crushes"),
        (Move::Rock, Move::Lizard, "crushes"),
        (Move::Paper, Move::Rock, "covers"),
        (Move::Paper, Move::Spock, "disproves"),
        (Move::Scissors, Move::Paper, "cuts"),
        (Move::Scissors, Move::Lizard, "decapitates"),
        (Move::Lizard, Move::Spock, "poisons"),
        (Move::Lizard, Move::Paper, "eats"),
        (Move::Spock, Move::Scissors, "smashes"),
        (Move::Spock, Move::Rock, "vaporizes"),
    ],
};

static THEMED: RuleTable = RuleTable {
    vocabulary: [Move::Knight, Move::Archer, Move::Dragon, Move::Wizard, Move::Ghost],
    defeats: [
        0b01010, // Knight: Archer, Wizard
        0b10100, // Archer: Dragon, Ghost
        0b01001, // Dragon: Knight, Wizard
        0b10010, // Wizard: Archer, Ghost
        0b00101, // Ghost: Knight, Dragon
    ],
    verbs: [
        (Move::Knight, Move::Archer, "charges down"),
        (Move::Knight, Move::Wizard, "cleaves"),
        (Move::Archer, Move::Dragon, "shoots down"),
        (Move::Archer, Move::Ghost, "pins"),
        (Move::Dragon, Move::Wizard, "scorches"),
        (Move::Dragon, Move::Knight, "crushes"),
        (Move::Wizard, Move::Ghost, "banishes"),
        (Move::Wizard, Move::Archer, "hexes"),
        (Move::Ghost, Move::Knight, "haunts"),
        (Move::Ghost, Move::Dragon, "possesses"),
    ],
};

impl Ruleset {
    /// All rulesets.
    pub const ALL: [Ruleset; 2] = [Ruleset::Classic, Ruleset::Themed];

    fn table(self) -> &'static RuleTable {
        match self {
            Ruleset::Classic => &CLASSIC,
            Ruleset::Themed => &THEMED,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Ruleset::Classic => "Rock Paper Scissors Lizard Spock",
            Ruleset::Themed => "Knight Archer Dragon Wizard Ghost",
        }
    }

    /// Ordered move vocabulary.
    pub fn vocabulary(self) -> &'static [Move; VOCABULARY_SIZE] {
        &self.table().vocabulary
    }

    /// Check whether a move belongs to this ruleset.
    #[inline]
    pub fn contains(self, mv: Move) -> bool {
        mv.ruleset() == self
    }

    /// The two moves that `mv` defeats, in vocabulary order.
    ///
    /// Returns `None` for a move from another ruleset.
    pub fn defeats(self, mv: Move) -> Option<[Move; 2]> {
        if !self.contains(mv) {
            return None;
        }
        let table = self.table();
        let mask = table.defeats[mv.slot()];
        let mut out = [mv; 2];
        let mut n = 0;
        for (j, other) in table.vocabulary.iter().enumerate() {
            if mask & (1 << j) != 0 && n < 2 {
                out[n] = *other;
                n += 1;
            }
        }
        Some(out)
    }

    /// Verb describing how `winner` defeats `loser`.
    pub fn verb(self, winner: Move, loser: Move) -> Option<&'static str> {
        self.table()
            .verbs
            .iter()
            .find(|(w, l, _)| *w == winner && *l == loser)
            .map(|(_, _, verb)| *verb)
    }

    /// How-to-play text, one line per move.
    pub fn instructions(self) -> String {
        let table = self.table();
        table
            .vocabulary
            .iter()
            .map(|mv| {
                let clauses: Vec<String> = table
                    .verbs
                    .iter()
                    .filter(|(w, _, _)| w == mv)
                    .map(|(_, loser, verb)| format!("{} {}", verb, loser))
                    .collect();
                format!("{} {}.", mv, clauses.join(" and "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Ruleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Check whether `a` beats `b` under `ruleset`.
///
/// O(1) bitmask lookup. Moves outside the ruleset's vocabulary never beat
/// anything and are never beaten.
#[inline]
pub fn beats(ruleset: Ruleset, a: Move, b: Move) -> bool {
    if !ruleset.contains(a) || !ruleset.contains(b) {
        return false;
    }
    ruleset.table().defeats[a.slot()] & (1 << b.slot()) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_table() {
        assert!(beats(Ruleset::Classic, Move::Rock, Move::Scissors));
        assert!(beats(Ruleset::Classic, Move::Rock, Move::Lizard));
        assert!(beats(Ruleset::Classic, Move::Paper, Move::Rock));
        assert!(beats(Ruleset::Classic, Move::Paper, Move::Spock));
        assert!(beats(Ruleset::Classic, Move::Scissors, Move::Paper));
        assert!(beats(Ruleset::Classic, Move::Scissors, Move::Lizard));
        assert!(beats(Ruleset::Classic, Move::Lizard, Move::Spock));
        assert!(beats(Ruleset::Classic, Move::Lizard, Move::Paper));
        assert!(beats(Ruleset::Classic, Move::Spock, Move::Scissors));
        assert!(beats(Ruleset::Classic, Move::Spock, Move::Rock));
    }

    #[test]
    fn test_every_move_beats_two_and_loses_to_two() {
        for ruleset in Ruleset::ALL {
            for &a in ruleset.vocabulary() {
                let wins = ruleset.vocabulary().iter().filter(|&&b| beats(ruleset, a, b)).count();
                let losses = ruleset.vocabulary().iter().filter(|&&b| beats(ruleset, b, a)).count();
                assert_eq!(wins, 2, "{} in {:?}", a, ruleset);
                assert_eq!(losses, 2, "{} in {:?}", a, ruleset);
                assert!(!beats(ruleset, a, a));
            }
        }
    }

    #[test]
    fn test_relation_is_antisymmetric_and_total() {
        for ruleset in Ruleset::ALL {
            for &a in ruleset.vocabulary() {
                for &b in ruleset.vocabulary() {
                    if a == b {
                        continue;
                    }
                    assert_ne!(beats(ruleset, a, b), beats(ruleset, b, a), "{} vs {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_every_winning_pair_has_a_verb() {
        for ruleset in Ruleset::ALL {
            for &a in ruleset.vocabulary() {
                for &b in ruleset.vocabulary() {
                    assert_eq!(ruleset.verb(a, b).is_some(), beats(ruleset, a, b));
                }
            }
        }
    }

    #[test]
    fn test_foreign_moves_never_beat() {
        assert!(!beats(Ruleset::Classic, Move::Knight, Move::Rock));
        assert!(!beats(Ruleset::Classic, Move::Rock, Move::Ghost));
        assert!(!beats(Ruleset::Themed, Move::Rock, Move::Scissors));
        assert_eq!(Ruleset::Themed.defeats(Move::Rock), None);
    }

    #[test]
    fn test_defeats() {
        assert_eq!(
            Ruleset::Classic.defeats(Move::Spock),
            Some([Move::Rock, Move::Scissors])
        );
        assert_eq!(
            Ruleset::Themed.defeats(Move::Ghost),
            Some([Move::Knight, Move::Dragon])
        );
    }

    #[test]
    fn test_move_names() {
        for mv in Move::ALL {
            assert_eq!(Move::from_name(mv.name()), Some(mv));
        }
        assert_eq!(Move::from_name(" spock "), Some(Move::Spock));
        assert_eq!(Move::from_name("ROCK"), Some(Move::Rock));
        assert_eq!(Move::from_name("Lizzard"), None);
    }

    #[test]
    fn test_move_ruleset_membership() {
        for ruleset in Ruleset::ALL {
            for &mv in ruleset.vocabulary() {
                assert_eq!(mv.ruleset(), ruleset);
            }
        }
    }

    #[test]
    fn test_instructions() {
        let text = Ruleset::Classic.instructions();
        assert!(text.contains("Rock crushes Scissors and crushes Lizard."));
        assert!(text.contains("Spock smashes Scissors and vaporizes Rock."));
        assert_eq!(text.lines().count(), 5);
    }
}
