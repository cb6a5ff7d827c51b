//! Session controller - one timed level attempt.
//!
//! State machine: `Idle → Active → AwaitingName → Submitted`, with back
//! navigation returning to `Idle` from any state.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use vault_core::{
    clamp_completion_seconds, normalize_player_name, LeaderboardSnapshot, LevelId, ScoreEntry,
};
use vault_leaderboard::{FetchError, LeaderboardService, SubmitError, DEFAULT_LIMIT};
use vault_progress::{ProgressError, ProgressionTracker};
use vault_storage::ScoreStore;

use crate::challenge::{ChallengeCallbacks, ChallengeSignal, SignalEnvelope};
use crate::stopwatch::{Stopwatch, StopwatchReading, Timer, DEFAULT_FRAME_INTERVAL};

/// Tuning for level attempts.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Stopwatch display refresh period
    pub frame_interval: Duration,

    /// Entries shown on the leaderboard
    pub leaderboard_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
            leaderboard_limit: DEFAULT_LIMIT,
        }
    }
}

/// Where an attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not mounted
    Idle,
    /// Puzzle open, stopwatch running
    Active,
    /// Puzzle solved, stopwatch frozen, waiting for a display name
    AwaitingName,
    /// Run recorded on the leaderboard
    Submitted,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Active => write!(f, "active"),
            SessionState::AwaitingName => write!(f, "awaiting name"),
            SessionState::Submitted => write!(f, "submitted"),
        }
    }
}

/// A solved run that has not been recorded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRun {
    /// Frozen stopwatch reading, in whole seconds
    pub elapsed_seconds: i64,

    /// Name as typed so far
    pub player_name: String,
}

/// Message for the player, shown once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Something worked
    Success(String),
    /// Something failed and needs the player's attention
    Error(String),
}

/// What the leaderboard panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardView {
    /// Not open
    Closed,
    /// Fetch in flight
    Loading,
    /// Ranked entries
    Ready(LeaderboardSnapshot),
    /// Fetch failed; render an empty placeholder
    Unavailable,
}

impl LeaderboardView {
    /// Entries to render; empty unless ready.
    pub fn entries(&self) -> &[ScoreEntry] {
        match self {
            LeaderboardView::Ready(snapshot) => &snapshot.entries,
            _ => &[],
        }
    }
}

/// Result of a recorded run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Row written to the leaderboard
    pub entry: ScoreEntry,

    /// Level unlocked by this completion, if any
    pub unlocked: Option<LevelId>,

    /// Leaderboard as loaded right after the submit
    pub leaderboard: LeaderboardView,
}

/// What processing queued signals and fetch results did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Widget reported completion; the name prompt is open
    ChallengeCompleted,
    /// Widget asked to go back; the attempt was discarded
    ChallengeAbandoned,
    /// The leaderboard panel changed
    LeaderboardUpdated,
    /// A signal or result arrived for an attempt that has ended
    Ignored,
}

/// Errors raised by the session controller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Recording the run failed; retry is possible
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// Progression rejected the request
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// The operation is not valid in the current state
    #[error("cannot {action} while {state}")]
    InvalidState {
        /// What was attempted
        action: &'static str,
        /// State at the time
        state: SessionState,
    },

    /// No level attempt is in progress
    #[error("no level attempt in progress")]
    NoActiveAttempt,
}

type Hook = Box<dyn FnMut(LevelId) + Send>;

type RefreshResult = (u64, Result<LeaderboardSnapshot, FetchError>);

const SUBMIT_FAILED: &str = "Failed to submit time. Please try again.";
const SUBMIT_OK: &str = "Time submitted!";

/// Drives one level attempt around a challenge widget.
pub struct SessionController<S: ScoreStore + 'static, T: Timer = Stopwatch> {
    level_id: LevelId,
    state: SessionState,
    timer: T,
    service: LeaderboardService<S>,
    config: SessionConfig,
    // Bumped whenever an attempt ends; stale callbacks and fetches carry an older value.
    attempt: u64,
    signal_tx: mpsc::UnboundedSender<SignalEnvelope>,
    signal_rx: mpsc::UnboundedReceiver<SignalEnvelope>,
    refresh_tx: mpsc::UnboundedSender<RefreshResult>,
    refresh_rx: mpsc::UnboundedReceiver<RefreshResult>,
    pending: Option<PendingRun>,
    view: LeaderboardView,
    notices: Vec<Notice>,
    on_complete: Option<Hook>,
    on_back: Option<Hook>,
}

impl<S: ScoreStore + 'static> SessionController<S, Stopwatch> {
    /// Create a controller timed by a [`Stopwatch`].
    pub fn new(level_id: LevelId, service: LeaderboardService<S>, config: SessionConfig) -> Self {
        let timer = Stopwatch::with_frame_interval(config.frame_interval);
        Self::with_timer(level_id, service, timer, config)
    }

    /// Receive per-frame stopwatch readings.
    pub fn subscribe_clock(&self) -> watch::Receiver<StopwatchReading> {
        self.timer.subscribe()
    }
}

impl<S: ScoreStore + 'static, T: Timer> SessionController<S, T> {
    /// Create a controller with a custom timer.
    pub fn with_timer(
        level_id: LevelId,
        service: LeaderboardService<S>,
        timer: T,
        config: SessionConfig,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        Self {
            level_id,
            state: SessionState::Idle,
            timer,
            service,
            config,
            attempt: 0,
            signal_tx,
            signal_rx,
            refresh_tx,
            refresh_rx,
            pending: None,
            view: LeaderboardView::Closed,
            notices: Vec::new(),
            on_complete: None,
            on_back: None,
        }
    }

    /// Hook run after a run was recorded and progression advanced.
    pub fn on_complete(mut self, hook: impl FnMut(LevelId) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// Hook run after the widget asked to go back.
    pub fn on_back(mut self, hook: impl FnMut(LevelId) + Send + 'static) -> Self {
        self.on_back = Some(Box::new(hook));
        self
    }

    /// Level this controller plays.
    pub fn level_id(&self) -> LevelId {
        self.level_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The attempt's timer.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Stopwatch reading as `MM:SS`.
    pub fn formatted_time(&self) -> String {
        self.timer.formatted()
    }

    /// The solved run awaiting submission.
    pub fn pending(&self) -> Option<&PendingRun> {
        self.pending.as_ref()
    }

    /// Leaderboard panel contents.
    pub fn leaderboard(&self) -> &LeaderboardView {
        &self.view
    }

    /// Close the leaderboard panel.
    pub fn close_leaderboard(&mut self) {
        self.view = LeaderboardView::Closed;
    }

    /// Take the notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Callbacks for the current attempt.
    pub fn callbacks(&self) -> ChallengeCallbacks {
        ChallengeCallbacks::new(self.attempt, self.signal_tx.clone())
    }

    /// Mount the level: start the stopwatch and hand out widget callbacks.
    ///
    /// Mounting an attempt that is already underway returns its callbacks
    /// without touching the stopwatch. Mounting after a submitted run starts
    /// a fresh attempt from zero.
    pub fn mount(&mut self) -> ChallengeCallbacks {
        if self.state == SessionState::Submitted {
            self.end_attempt();
        }
        if self.state == SessionState::Idle {
            self.pending = None;
            self.timer.start();
            self.state = SessionState::Active;
            info!("Level {} attempt {} started", self.level_id, self.attempt);
        } else {
            debug!("Level {} already mounted ({})", self.level_id, self.state);
        }
        self.callbacks()
    }

    /// Process queued widget signals and finished leaderboard fetches.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(envelope) = self.signal_rx.try_recv() {
            events.push(self.handle_signal(envelope));
        }
        while let Ok((attempt, result)) = self.refresh_rx.try_recv() {
            events.push(self.apply_refresh(attempt, result));
        }
        events
    }

    fn handle_signal(&mut self, envelope: SignalEnvelope) -> SessionEvent {
        if envelope.attempt != self.attempt {
            debug!(
                "Ignoring {:?} from ended attempt {} (current {})",
                envelope.signal, envelope.attempt, self.attempt
            );
            return SessionEvent::Ignored;
        }
        match envelope.signal {
            ChallengeSignal::Completed => self.challenge_completed(),
            ChallengeSignal::Back => {
                self.go_back();
                SessionEvent::ChallengeAbandoned
            }
        }
    }

    /// The widget's puzzle condition was met.
    fn challenge_completed(&mut self) -> SessionEvent {
        if self.state != SessionState::Active {
            debug!("Ignoring completion while {}", self.state);
            return SessionEvent::Ignored;
        }

        // Freeze first so a slow name entry never inflates the recorded time.
        self.timer.stop();
        self.pending = Some(PendingRun {
            elapsed_seconds: self.timer.elapsed_seconds(),
            player_name: String::new(),
        });
        self.state = SessionState::AwaitingName;
        info!("Level {} solved in {}", self.level_id, self.timer.formatted());
        SessionEvent::ChallengeCompleted
    }

    /// Leave the level without submitting.
    pub fn go_back(&mut self) {
        self.end_attempt();
        info!("Left level {}", self.level_id);
        if let Some(hook) = self.on_back.as_mut() {
            hook(self.level_id);
        }
    }

    /// Unmount: cancel the stopwatch ticker and invalidate outstanding
    /// callbacks and fetches.
    pub fn teardown(&mut self) {
        self.end_attempt();
    }

    fn end_attempt(&mut self) {
        self.timer.stop();
        self.pending = None;
        self.view = LeaderboardView::Closed;
        self.state = SessionState::Idle;
        self.attempt += 1;
    }

    /// Update the name typed into the prompt.
    pub fn set_player_name(&mut self, name: &str) -> Result<(), SessionError> {
        match (&self.state, self.pending.as_mut()) {
            (SessionState::AwaitingName, Some(run)) => {
                run.player_name = name.to_string();
                Ok(())
            }
            _ => Err(SessionError::InvalidState {
                action: "set a player name",
                state: self.state,
            }),
        }
    }

    /// Record the solved run.
    ///
    /// On success the level is completed in `tracker`, the leaderboard is
    /// refreshed and the on-complete hook runs. On failure the attempt stays
    /// in `AwaitingName` with its name and time kept for a retry, and the
    /// tracker is left untouched.
    pub async fn submit(
        &mut self,
        tracker: &mut ProgressionTracker,
    ) -> Result<Completion, SessionError> {
        if self.state != SessionState::AwaitingName {
            return Err(SessionError::InvalidState {
                action: "submit a time",
                state: self.state,
            });
        }
        let run = self.pending.clone().ok_or(SessionError::NoActiveAttempt)?;
        if tracker.level(self.level_id).is_none() {
            return Err(ProgressError::UnknownLevel(self.level_id).into());
        }

        let player_name = normalize_player_name(&run.player_name);
        let completion_time = clamp_completion_seconds(run.elapsed_seconds);

        let entry = match self
            .service
            .submit(&player_name, self.level_id, completion_time)
            .await
        {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Keeping level {} run for retry: {}", self.level_id, e);
                self.notices.push(Notice::Error(SUBMIT_FAILED.to_string()));
                return Err(e.into());
            }
        };

        let unlocked = tracker.complete(self.level_id)?;
        self.state = SessionState::Submitted;
        self.pending = None;
        self.notices.push(Notice::Success(SUBMIT_OK.to_string()));

        let leaderboard = self.open_leaderboard().await.clone();
        if let Some(hook) = self.on_complete.as_mut() {
            hook(self.level_id);
        }

        Ok(Completion {
            entry,
            unlocked,
            leaderboard,
        })
    }

    /// Open the leaderboard panel and load it in place.
    pub async fn open_leaderboard(&mut self) -> &LeaderboardView {
        self.view = LeaderboardView::Loading;
        let attempt = self.attempt;
        let result = self
            .service
            .fetch_top(self.level_id, self.config.leaderboard_limit)
            .await;
        self.apply_refresh(attempt, result);
        &self.view
    }

    /// Open the leaderboard panel and load it in the background.
    ///
    /// The result is applied by a later [`drain`](Self::drain), and only if
    /// this attempt is still live.
    pub fn request_leaderboard(&mut self) {
        self.view = LeaderboardView::Loading;

        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime; leaderboard for level {} unavailable", self.level_id);
            self.view = LeaderboardView::Unavailable;
            return;
        };

        let service = self.service.clone();
        let tx = self.refresh_tx.clone();
        let attempt = self.attempt;
        let level_id = self.level_id;
        let limit = self.config.leaderboard_limit;

        runtime.spawn(async move {
            let result = service.fetch_top(level_id, limit).await;
            // Receiver gone means the controller was dropped.
            let _ = tx.send((attempt, result));
        });
    }

    fn apply_refresh(
        &mut self,
        attempt: u64,
        result: Result<LeaderboardSnapshot, FetchError>,
    ) -> SessionEvent {
        if attempt != self.attempt || self.view != LeaderboardView::Loading {
            debug!("Discarding leaderboard result for ended attempt {}", attempt);
            return SessionEvent::Ignored;
        }
        self.view = match result {
            Ok(snapshot) => LeaderboardView::Ready(snapshot),
            Err(e) => {
                warn!("Showing empty leaderboard: {}", e);
                LeaderboardView::Unavailable
            }
        };
        SessionEvent::LeaderboardUpdated
    }
}

impl<S: ScoreStore + 'static, T: Timer> Drop for SessionController<S, T> {
    fn drop(&mut self) {
        self.timer.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use vault_core::NewScore;
    use vault_storage::{MemoryStore, Result as StoreResult, ScoreQuery, StoreError};

    /// Timer with a scripted reading that counts starts.
    struct FakeTimer {
        elapsed_ms: i64,
        running: bool,
        starts: usize,
    }

    impl FakeTimer {
        fn reading(elapsed_ms: i64) -> Self {
            Self { elapsed_ms, running: false, starts: 0 }
        }
    }

    impl Timer for FakeTimer {
        fn start(&mut self) {
            if !self.running {
                self.running = true;
                self.starts += 1;
            }
        }
        fn stop(&mut self) {
            self.running = false;
        }
        fn reset(&mut self) {
            self.elapsed_ms = 0;
        }
        fn elapsed_ms(&self) -> i64 {
            self.elapsed_ms
        }
        fn is_running(&self) -> bool {
            self.running
        }
    }

    /// Memory store whose first `failures` inserts and every read can be made to fail.
    struct FlakyStore {
        inner: MemoryStore,
        failures: AtomicUsize,
        reads_fail: bool,
    }

    impl FlakyStore {
        fn failing_inserts(failures: usize) -> Self {
            Self { inner: MemoryStore::new(), failures: AtomicUsize::new(failures), reads_fail: false }
        }

        fn failing_reads() -> Self {
            Self { inner: MemoryStore::new(), failures: AtomicUsize::new(0), reads_fail: true }
        }
    }

    #[async_trait]
    impl ScoreStore for FlakyStore {
        async fn insert_score(&self, score: &NewScore) -> StoreResult<ScoreEntry> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::Other("store unavailable".to_string()));
            }
            self.inner.insert_score(score).await
        }

        async fn top_scores(&self, query: &ScoreQuery) -> StoreResult<Vec<ScoreEntry>> {
            if self.reads_fail {
                return Err(StoreError::Other("store unavailable".to_string()));
            }
            self.inner.top_scores(query).await
        }
    }

    fn controller<S: ScoreStore + 'static>(store: S, timer: FakeTimer) -> SessionController<S, FakeTimer> {
        SessionController::with_timer(
            LevelId::FIRST,
            LeaderboardService::new(store),
            timer,
            SessionConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_solved_level_lands_on_leaderboard() {
        let mut tracker = ProgressionTracker::standard();
        let mut session = SessionController::new(
            LevelId::FIRST,
            LeaderboardService::new(MemoryStore::new()),
            SessionConfig::default(),
        );
        let clock = session.subscribe_clock();

        let callbacks = session.mount();
        tokio::time::advance(Duration::from_millis(12_300)).await;
        callbacks.complete();
        session.drain();

        // Time spent typing the name is not counted
        tokio::time::advance(Duration::from_secs(20)).await;
        session.set_player_name("Ann").unwrap();
        let completion = session.submit(&mut tracker).await.unwrap();

        assert_eq!(completion.entry.completion_time, 12);
        assert_eq!(completion.unlocked, Some(LevelId::new(2)));
        assert_eq!(session.formatted_time(), "00:12");
        assert!(!clock.borrow().running);

        let entries = session.leaderboard().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].player_name, "Ann");
        assert_eq!(entries[0].completion_time, 12);
    }

    #[tokio::test]
    async fn test_mount_starts_timer_once() {
        let mut session = controller(MemoryStore::new(), FakeTimer::reading(0));

        let first = session.mount();
        let again = session.mount();

        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.timer().starts, 1);
        assert_eq!(first.attempt(), again.attempt());
    }

    #[tokio::test]
    async fn test_completion_freezes_time_before_name_prompt() {
        let mut session = controller(MemoryStore::new(), FakeTimer::reading(12_400));
        let callbacks = session.mount();

        callbacks.complete();
        assert_eq!(session.drain(), vec![SessionEvent::ChallengeCompleted]);
        assert_eq!(session.state(), SessionState::AwaitingName);
        assert!(!session.timer().is_running());
        assert_eq!(session.pending().unwrap().elapsed_seconds, 12);

        // A second completion from the widget changes nothing
        callbacks.complete();
        assert_eq!(session.drain(), vec![SessionEvent::Ignored]);
    }

    #[tokio::test]
    async fn test_blank_name_and_negative_time_are_normalized() {
        let mut session = controller(MemoryStore::new(), FakeTimer::reading(-5_000));
        let mut tracker = ProgressionTracker::standard();
        session.mount().complete();
        session.drain();

        session.set_player_name("   ").unwrap();
        let completion = session.submit(&mut tracker).await.unwrap();

        assert_eq!(completion.entry.player_name, "Anonymous");
        assert_eq!(completion.entry.completion_time, 0);
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_run_for_retry() {
        let mut session = controller(FlakyStore::failing_inserts(1), FakeTimer::reading(30_000));
        let mut tracker = ProgressionTracker::standard();
        session.mount().complete();
        session.drain();
        session.set_player_name("Ann").unwrap();

        let err = session.submit(&mut tracker).await.unwrap_err();
        assert!(matches!(err, SessionError::Submit(_)));
        assert_eq!(session.state(), SessionState::AwaitingName);
        assert_eq!(
            session.pending(),
            Some(&PendingRun { elapsed_seconds: 30, player_name: "Ann".to_string() })
        );
        assert!(!tracker.level(LevelId::FIRST).unwrap().completed);
        assert!(!tracker.is_unlocked(LevelId::new(2)));
        assert_eq!(
            session.take_notices(),
            vec![Notice::Error("Failed to submit time. Please try again.".to_string())]
        );

        // Retry without re-solving
        let completion = session.submit(&mut tracker).await.unwrap();
        assert_eq!(completion.entry.player_name, "Ann");
        assert_eq!(completion.entry.completion_time, 30);
        assert_eq!(completion.unlocked, Some(LevelId::new(2)));
        assert_eq!(session.state(), SessionState::Submitted);
        assert!(tracker.level(LevelId::FIRST).unwrap().completed);
    }

    #[tokio::test]
    async fn test_fetch_failure_shows_placeholder() {
        let mut session = controller(FlakyStore::failing_reads(), FakeTimer::reading(5_000));
        let mut tracker = ProgressionTracker::standard();
        session.mount().complete();
        session.drain();

        let completion = session.submit(&mut tracker).await;
        assert!(completion.is_ok());
        assert_eq!(session.leaderboard(), &LeaderboardView::Unavailable);
        assert!(session.leaderboard().entries().is_empty());
    }

    #[tokio::test]
    async fn test_back_discards_attempt() {
        let mut session = controller(MemoryStore::new(), FakeTimer::reading(8_000));
        let backs = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&backs);
        session = session.on_back(move |id| seen.lock().unwrap().push(id));

        let callbacks = session.mount();
        callbacks.back();
        assert_eq!(session.drain(), vec![SessionEvent::ChallengeAbandoned]);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.pending().is_none());
        assert!(!session.timer().is_running());
        assert_eq!(*backs.lock().unwrap(), vec![LevelId::FIRST]);

        // Old callbacks are dead
        callbacks.complete();
        assert_eq!(session.drain(), vec![SessionEvent::Ignored]);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_submit_rejected_outside_name_prompt() {
        let mut session = controller(MemoryStore::new(), FakeTimer::reading(1_000));
        let mut tracker = ProgressionTracker::standard();
        session.mount();

        let err = session.submit(&mut tracker).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidState { state: SessionState::Active, .. }
        ));
        assert!(session.set_player_name("Ann").is_err());
    }

    #[tokio::test]
    async fn test_on_complete_hook_runs_after_progression() {
        let completed = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&completed);
        let mut session = controller(MemoryStore::new(), FakeTimer::reading(2_000))
            .on_complete(move |id| seen.lock().unwrap().push(id));
        let mut tracker = ProgressionTracker::standard();

        session.mount().complete();
        session.drain();
        session.submit(&mut tracker).await.unwrap();

        assert_eq!(*completed.lock().unwrap(), vec![LevelId::FIRST]);
        assert_eq!(session.take_notices(), vec![Notice::Success("Time submitted!".to_string())]);
    }

    #[tokio::test]
    async fn test_submit_rejects_level_missing_from_tracker() {
        let store = Arc::new(MemoryStore::new());
        let mut session = SessionController::with_timer(
            LevelId::new(42),
            LeaderboardService::from_shared(Arc::clone(&store)),
            FakeTimer::reading(3_000),
            SessionConfig::default(),
        );
        let mut tracker = ProgressionTracker::standard();
        session.mount().complete();
        session.drain();
        session.set_player_name("Ann").unwrap();

        let err = session.submit(&mut tracker).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Progress(ProgressError::UnknownLevel(id)) if id == LevelId::new(42)
        ));
        assert_eq!(session.state(), SessionState::AwaitingName);
        assert_eq!(session.pending().unwrap().player_name, "Ann");
        assert_eq!(tracker.progress().completed, 0);

        // Nothing was written
        assert!(store.is_empty().await);
        assert!(session.take_notices().is_empty());
    }

    #[tokio::test]
    async fn test_remount_after_submit_starts_new_attempt() {
        let mut session = controller(MemoryStore::new(), FakeTimer::reading(4_000));
        let mut tracker = ProgressionTracker::standard();
        let first = session.mount();
        first.complete();
        session.drain();
        session.submit(&mut tracker).await.unwrap();

        let second = session.mount();
        assert_ne!(first.attempt(), second.attempt());
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.timer().starts, 2);
        assert_eq!(session.leaderboard(), &LeaderboardView::Closed);

        second.complete();
        assert_eq!(session.drain(), vec![SessionEvent::ChallengeCompleted]);
        session.submit(&mut tracker).await.unwrap();
        assert_eq!(session.state(), SessionState::Submitted);
    }

    #[tokio::test]
    async fn test_leaderboard_during_attempt_keeps_timer_running() {
        let store = MemoryStore::new();
        store.insert_score(&NewScore::new("Bob", LevelId::FIRST, 9)).await.unwrap();
        let mut session = controller(store, FakeTimer::reading(1_000));
        let callbacks = session.mount();

        assert_eq!(session.open_leaderboard().await.entries().len(), 1);
        session.close_leaderboard();
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.timer().is_running());

        callbacks.complete();
        assert_eq!(session.drain(), vec![SessionEvent::ChallengeCompleted]);
    }

    #[tokio::test]
    async fn test_background_refresh_applies_to_live_attempt() {
        let store = MemoryStore::new();
        store.insert_score(&NewScore::new("Bob", LevelId::FIRST, 9)).await.unwrap();
        let mut session = controller(store, FakeTimer::reading(0));
        session.mount();

        session.request_leaderboard();
        assert_eq!(session.leaderboard(), &LeaderboardView::Loading);
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(session.drain(), vec![SessionEvent::LeaderboardUpdated]);
        assert_eq!(session.leaderboard().entries().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_after_teardown_is_ignored() {
        let mut session = controller(MemoryStore::new(), FakeTimer::reading(0));
        session.mount();

        session.request_leaderboard();
        session.teardown();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(session.drain(), vec![SessionEvent::Ignored]);
        assert_eq!(session.leaderboard(), &LeaderboardView::Closed);
    }
}
