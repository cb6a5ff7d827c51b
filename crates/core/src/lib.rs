//! VAULT core data models.
//!
//! This crate defines the levels, score rows and leaderboard snapshots
//! shared by the storage, leaderboard, progression and session crates.

#![warn(missing_docs)]

// Core identities
mod id;

// Levels and progression state
mod level;

// Scores and rankings
mod score;
mod clock;

// Re-exports
pub use id::*;

pub use level::{Level, LevelStatus, Difficulty, ParseDifficultyError};
pub use score::{
    NewScore, ScoreEntry, LeaderboardSnapshot, normalize_player_name,
    ANONYMOUS_PLAYER, MAX_PLAYER_NAME_CHARS,
};
pub use clock::{clamp_completion_seconds, format_clock};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
