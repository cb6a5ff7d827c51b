//! Score rows and leaderboard snapshots.

use serde::{Deserialize, Serialize};
use crate::id::{LevelId, ScoreId};
use crate::Time;

/// Name recorded when the player leaves the name field blank.
pub const ANONYMOUS_PLAYER: &str = "Anonymous";

/// Longest display name kept, in characters.
pub const MAX_PLAYER_NAME_CHARS: usize = 40;

/// Normalize a display name before it is written to the leaderboard.
///
/// Surrounding whitespace is trimmed, a blank name becomes
/// [`ANONYMOUS_PLAYER`] and overly long names are cut to
/// [`MAX_PLAYER_NAME_CHARS`] characters.
pub fn normalize_player_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ANONYMOUS_PLAYER.to_string();
    }
    let name: String = trimmed.chars().take(MAX_PLAYER_NAME_CHARS).collect();
    name.trim_end().to_string()
}

/// Insert payload for one completed run. The store assigns `id` and
/// `completed_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScore {
    /// Display name
    pub player_name: String,

    /// Level that was completed
    pub level_id: LevelId,

    /// Completion time in whole seconds
    pub completion_time: u32,
}

impl NewScore {
    /// Build a payload, normalizing the player name.
    pub fn new(player_name: &str, level_id: LevelId, completion_time: u32) -> Self {
        Self {
            player_name: normalize_player_name(player_name),
            level_id,
            completion_time,
        }
    }
}

/// One recorded run as stored in the `leaderboard` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Store-assigned key
    pub id: ScoreId,

    /// Display name
    pub player_name: String,

    /// Level that was completed
    pub level_id: LevelId,

    /// Completion time in whole seconds
    pub completion_time: u32,

    /// Store-assigned submission timestamp
    pub completed_at: Time,
}

impl ScoreEntry {
    /// Materialize a stored row from its insert payload.
    pub fn from_new(id: ScoreId, score: NewScore, completed_at: Time) -> Self {
        Self {
            id,
            player_name: score.player_name,
            level_id: score.level_id,
            completion_time: score.completion_time,
            completed_at,
        }
    }
}

/// A ranked, point-in-time read of the fastest runs for one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    /// Level the snapshot belongs to
    pub level_id: LevelId,

    /// Entries, fastest first, ties broken by earliest submission
    pub entries: Vec<ScoreEntry>,

    /// When the snapshot was read
    pub taken_at: Time,
}

impl LeaderboardSnapshot {
    /// An empty snapshot, used as the placeholder when nothing could be read.
    pub fn empty(level_id: LevelId) -> Self {
        Self {
            level_id,
            entries: Vec::new(),
            taken_at: chrono::Utc::now(),
        }
    }

    /// Whether no runs are recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 1-based rank of an entry, if it made the snapshot.
    pub fn rank_of(&self, id: &ScoreId) -> Option<usize> {
        self.entries.iter().position(|e| &e.id == id).map(|i| i + 1)
    }
}
