//! Unlock propagation as a pure state transition.

use vault_core::{Level, LevelId};

/// Level set after `completed` has been solved.
///
/// Marks `completed` as done and unlocks the level with id `completed + 1`
/// when one exists. Every other level is copied unchanged, and no level is
/// ever re-locked. An unknown id yields an unchanged copy.
pub fn apply_completion(levels: &[Level], completed: LevelId) -> Vec<Level> {
    let unlocks = completed.next();
    let known = levels.iter().any(|l| l.id == completed);

    levels
        .iter()
        .map(|level| {
            let mut level = level.clone();
            if !known {
                return level;
            }
            if level.id == completed {
                level.completed = true;
            }
            if level.id == unlocks && unlocks != completed {
                level.unlocked = true;
            }
            level
        })
        .collect()
}
