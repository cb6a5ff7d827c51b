//! Level model - one puzzle screen of the vault.

use serde::{Deserialize, Serialize};
use crate::id::LevelId;

/// A level is one self-contained challenge with its own win condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Position in play order, starting at 1
    pub id: LevelId,

    /// Level title
    pub title: String,

    /// Teaser shown on the level select screen
    pub description: String,

    /// Whether the level has been solved and its time submitted
    pub completed: bool,

    /// Whether the level may be entered
    pub unlocked: bool,

    /// Difficulty rating
    pub difficulty: Difficulty,
}

impl Level {
    /// Create a locked, unsolved level.
    pub fn new(
        id: LevelId,
        title: impl Into<String>,
        description: impl Into<String>,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            completed: false,
            unlocked: false,
            difficulty,
        }
    }

    /// Status as shown on the level select screen.
    pub fn status(&self) -> LevelStatus {
        if self.completed {
            LevelStatus::Completed
        } else if self.unlocked {
            LevelStatus::Available
        } else {
            LevelStatus::Locked
        }
    }
}

/// Level status derived from the completed/unlocked flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelStatus {
    /// Not yet reachable
    Locked,
    /// Unlocked, not yet completed
    Available,
    /// Completed
    Completed,
}

impl std::fmt::Display for LevelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelStatus::Locked => write!(f, "Locked"),
            LevelStatus::Available => write!(f, "Available"),
            LevelStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// Difficulty rating of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a difficulty name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty: {0}")]
pub struct ParseDifficultyError(pub String);

impl std::str::FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}
