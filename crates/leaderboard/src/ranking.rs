//! Leaderboard ordering.

use std::cmp::Ordering;
use vault_core::ScoreEntry;

/// Fastest first; equal times are ordered by earliest submission.
pub fn compare_entries(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    a.completion_time
        .cmp(&b.completion_time)
        .then_with(|| a.completed_at.cmp(&b.completed_at))
}

/// Sort entries into leaderboard order and keep the first `limit`.
///
/// The sort is stable, so rows equal on both keys keep the order the store
/// returned them in and repeated reads of unchanged data rank identically.
pub fn rank(mut entries: Vec<ScoreEntry>, limit: usize) -> Vec<ScoreEntry> {
    entries.sort_by(compare_entries);
    entries.truncate(limit);
    entries
}
