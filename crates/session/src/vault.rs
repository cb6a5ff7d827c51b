//! The vault: level selection plus at most one live attempt.

use tracing::info;
use vault_core::{Level, LevelId};
use vault_leaderboard::LeaderboardService;
use vault_progress::ProgressionTracker;
use vault_storage::ScoreStore;

use crate::challenge::ChallengeCallbacks;
use crate::controller::{
    Completion, SessionConfig, SessionController, SessionError, SessionEvent,
};

/// Top-level game state for one player session.
pub struct Vault<S: ScoreStore + 'static> {
    tracker: ProgressionTracker,
    service: LeaderboardService<S>,
    config: SessionConfig,
    active: Option<SessionController<S>>,
}

impl<S: ScoreStore + 'static> Vault<S> {
    /// Create a vault over a progression tracker and leaderboard.
    pub fn new(
        tracker: ProgressionTracker,
        service: LeaderboardService<S>,
        config: SessionConfig,
    ) -> Self {
        Self {
            tracker,
            service,
            config,
            active: None,
        }
    }

    /// Progression state.
    pub fn tracker(&self) -> &ProgressionTracker {
        &self.tracker
    }

    /// Leaderboard access.
    pub fn service(&self) -> &LeaderboardService<S> {
        &self.service
    }

    /// Levels in play order.
    pub fn levels(&self) -> &[Level] {
        self.tracker.levels()
    }

    /// The live attempt, if a level is open.
    pub fn active(&self) -> Option<&SessionController<S>> {
        self.active.as_ref()
    }

    /// Mutable access to the live attempt.
    pub fn active_mut(&mut self) -> Option<&mut SessionController<S>> {
        self.active.as_mut()
    }

    /// Open a level and start its attempt.
    ///
    /// Entering the level that is already open keeps an unfinished attempt
    /// and starts a fresh one after a submitted run. Entering another level
    /// tears the open one down first.
    pub fn enter(&mut self, id: LevelId) -> Result<ChallengeCallbacks, SessionError> {
        self.tracker.select(id)?;

        if let Some(active) = self.active.as_mut() {
            if active.level_id() == id {
                return Ok(active.mount());
            }
            active.teardown();
        }

        info!("Entering level {}", id);
        let mut controller =
            SessionController::new(id, self.service.clone(), self.config.clone());
        let callbacks = controller.mount();
        self.active = Some(controller);
        Ok(callbacks)
    }

    /// Process the live attempt's queued signals. An abandoned attempt is
    /// closed.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let Some(active) = self.active.as_mut() else {
            return Vec::new();
        };
        let events = active.drain();
        if events.contains(&SessionEvent::ChallengeAbandoned) {
            self.active = None;
        }
        events
    }

    /// Submit the live attempt's run and advance progression.
    pub async fn submit(&mut self) -> Result<Completion, SessionError> {
        let active = self.active.as_mut().ok_or(SessionError::NoActiveAttempt)?;
        active.submit(&mut self.tracker).await
    }

    /// Close the open level without submitting.
    pub fn leave(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.teardown();
            info!("Closed level {}", active.level_id());
        }
    }
}
