//! Progression tracking service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use vault_core::{Level, LevelId};

use crate::catalog::standard_levels;
use crate::transition::apply_completion;

/// Errors raised by the progression tracker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    /// No level has this id
    #[error("unknown level {0}")]
    UnknownLevel(LevelId),

    /// The level exists but has not been unlocked yet
    #[error("level {0} is locked")]
    Locked(LevelId),

    /// The level set handed to the tracker is malformed
    #[error("invalid level set: {0}")]
    InvalidCatalog(String),
}

/// A snapshot of progress at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// When snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Completed levels
    pub completed: usize,

    /// Total levels
    pub total: usize,

    /// Percentage complete
    pub percentage: f32,
}

/// Owner of the session's level set.
///
/// The level list is only ever changed through [`ProgressionTracker::complete`].
#[derive(Debug, Clone)]
pub struct ProgressionTracker {
    levels: Vec<Level>,
}

impl ProgressionTracker {
    /// Create a tracker over an ordered level set.
    ///
    /// Ids must be strictly increasing and the first level is unlocked if
    /// the caller left it locked.
    pub fn new(mut levels: Vec<Level>) -> Result<Self, ProgressError> {
        if levels.is_empty() {
            return Err(ProgressError::InvalidCatalog("no levels".to_string()));
        }
        if levels.windows(2).any(|w| w[0].id >= w[1].id) {
            return Err(ProgressError::InvalidCatalog(
                "level ids must be strictly increasing".to_string(),
            ));
        }
        if !levels[0].unlocked {
            debug!("Unlocking first level {}", levels[0].id);
            levels[0].unlocked = true;
        }
        Ok(Self { levels })
    }

    /// Tracker over the standard ten-level vault.
    pub fn standard() -> Self {
        Self {
            levels: standard_levels(),
        }
    }

    /// All levels in play order.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Look up a level.
    pub fn level(&self, id: LevelId) -> Option<&Level> {
        self.levels.iter().find(|l| l.id == id)
    }

    /// Whether a level may be entered.
    pub fn is_unlocked(&self, id: LevelId) -> bool {
        self.level(id).map(|l| l.unlocked).unwrap_or(false)
    }

    /// Pick a level to play. Locked and unknown levels are rejected
    /// without any state change.
    pub fn select(&self, id: LevelId) -> Result<&Level, ProgressError> {
        let level = self.level(id).ok_or(ProgressError::UnknownLevel(id))?;
        if !level.unlocked {
            warn!("Rejected selection of locked level {}", id);
            return Err(ProgressError::Locked(id));
        }
        Ok(level)
    }

    /// Record a level as completed and unlock its successor.
    ///
    /// Returns the id of a level that became unlocked by this call, if any.
    /// Completing an already completed level re-asserts the same state.
    pub fn complete(&mut self, id: LevelId) -> Result<Option<LevelId>, ProgressError> {
        if self.level(id).is_none() {
            return Err(ProgressError::UnknownLevel(id));
        }

        let next = id.next();
        let unlocks = next != id && self.levels.iter().any(|l| l.id == next && !l.unlocked);

        self.levels = apply_completion(&self.levels, id);
        info!("Level {} completed", id);

        if unlocks {
            info!("Level {} unlocked", next);
            Ok(Some(next))
        } else {
            Ok(None)
        }
    }

    /// Current progress, recomputed from the level set.
    pub fn progress(&self) -> ProgressSnapshot {
        let total = self.levels.len();
        let completed = self.levels.iter().filter(|l| l.completed).count();
        let percentage = if total > 0 {
            (completed as f32 / total as f32) * 100.0
        } else {
            0.0
        };

        ProgressSnapshot {
            timestamp: Utc::now(),
            completed,
            total,
            percentage,
        }
    }

    /// Whether every level is completed.
    pub fn is_finished(&self) -> bool {
        self.levels.iter().all(|l| l.completed)
    }
}

impl Default for ProgressionTracker {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_core::Difficulty;

    #[test]
    fn test_select_rejects_locked_levels() {
        let tracker = ProgressionTracker::standard();

        assert!(tracker.select(LevelId::new(1)).is_ok());
        for k in 2..=10 {
            assert_eq!(
                tracker.select(LevelId::new(k)).unwrap_err(),
                ProgressError::Locked(LevelId::new(k))
            );
        }
        assert_eq!(
            tracker.select(LevelId::new(11)).unwrap_err(),
            ProgressError::UnknownLevel(LevelId::new(11))
        );
    }

    #[test]
    fn test_complete_unlocks_next() {
        let mut tracker = ProgressionTracker::standard();

        let unlocked = tracker.complete(LevelId::new(1)).unwrap();
        assert_eq!(unlocked, Some(LevelId::new(2)));
        assert!(tracker.level(LevelId::new(1)).unwrap().completed);
        assert!(tracker.is_unlocked(LevelId::new(2)));
        assert!(!tracker.is_unlocked(LevelId::new(3)));
        assert!(tracker.select(LevelId::new(2)).is_ok());
    }

    #[test]
    fn test_complete_is_idempotent() {
        let mut tracker = ProgressionTracker::standard();
        tracker.complete(LevelId::new(1)).unwrap();
        let before = tracker.levels().to_vec();

        assert_eq!(tracker.complete(LevelId::new(1)).unwrap(), None);
        assert_eq!(tracker.levels(), before.as_slice());
    }

    #[test]
    fn test_complete_unknown_level() {
        let mut tracker = ProgressionTracker::standard();
        assert_eq!(
            tracker.complete(LevelId::new(99)),
            Err(ProgressError::UnknownLevel(LevelId::new(99)))
        );
        assert_eq!(tracker.progress().completed, 0);
    }

    #[test]
    fn test_progress_percentage() {
        let mut tracker = ProgressionTracker::standard();
        assert_eq!(tracker.progress().percentage, 0.0);

        tracker.complete(LevelId::new(1)).unwrap();
        tracker.complete(LevelId::new(2)).unwrap();
        let progress = tracker.progress();
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.total, 10);
        assert!((progress.percentage - 20.0).abs() < f32::EPSILON);
        assert!(!tracker.is_finished());

        for k in 3..=10 {
            tracker.complete(LevelId::new(k)).unwrap();
        }
        assert!(tracker.is_finished());
        assert_eq!(tracker.progress().percentage, 100.0);
    }

    #[test]
    fn test_new_validates_level_set() {
        assert!(matches!(
            ProgressionTracker::new(vec![]),
            Err(ProgressError::InvalidCatalog(_))
        ));

        let a = Level::new(LevelId::new(2), "a", "", Difficulty::Easy);
        let b = Level::new(LevelId::new(1), "b", "", Difficulty::Easy);
        assert!(matches!(
            ProgressionTracker::new(vec![a.clone(), b]),
            Err(ProgressError::InvalidCatalog(_))
        ));

        let tracker = ProgressionTracker::new(vec![a]).unwrap();
        assert!(tracker.is_unlocked(LevelId::new(2)));
    }
}
