//! Difficulty levels and their guess ranges.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Range used for labels that do not name a known difficulty.
pub const FALLBACK_RANGE: (i64, i64) = (1, 100);

/// Difficulty level selected by the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// 1 to 20, eight attempts.
    Easy,
    /// 1 to 50, seven attempts.
    #[default]
    Normal,
    /// 1 to 100, six attempts.
    Hard,
}

impl Difficulty {
    /// All difficulties, easiest first.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    /// Inclusive (low, high) bounds of the secret.
    pub const fn range(self) -> (i64, i64) {
        match self {
            Difficulty::Easy => (1, 20),
            Difficulty::Normal => (1, 50),
            Difficulty::Hard => (1, 100),
        }
    }

    /// Number of guesses granted before the game can be lost.
    pub const fn attempt_limit(self) -> u32 {
        match self {
            Difficulty::Easy => 8,
            Difficulty::Normal => 7,
            Difficulty::Hard => 6,
        }
    }

    /// Display label, as shown in the difficulty selector.
    pub const fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    /// Parse an exact label.
    pub fn from_label(label: &str) -> Option<Difficulty> {
        Self::ALL.into_iter().find(|d| d.label() == label)
    }

    /// Parse a label, resolving unknown labels to the difficulty whose range
    /// is [`FALLBACK_RANGE`].
    pub fn from_label_or_fallback(label: &str) -> Difficulty {
        Self::from_label(label).unwrap_or(Difficulty::Hard)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Guess range for a raw difficulty label.
pub fn range_for_label(label: &str) -> (i64, i64) {
    Difficulty::from_label(label)
        .map(Difficulty::range)
        .unwrap_or(FALLBACK_RANGE)
}
