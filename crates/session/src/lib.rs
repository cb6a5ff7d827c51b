//! Level attempts for VAULT.
//!
//! A [`SessionController`] wraps one level's challenge widget: it runs the
//! [`Stopwatch`] while the puzzle is open, freezes it on completion,
//! captures a display name and submits the run to the leaderboard. The
//! [`Vault`] owns the progression tracker and at most one live attempt.

#![warn(missing_docs)]

pub mod stopwatch;
pub mod challenge;
pub mod controller;
pub mod vault;

pub use stopwatch::{Stopwatch, StopwatchReading, Timer, DEFAULT_FRAME_INTERVAL};
pub use challenge::{
    Challenge, ChallengeCallbacks, ChallengeFeedback, ChallengePack, ChallengeSignal,
    PackError, PasswordChallenge,
};
pub use controller::{
    Completion, LeaderboardView, Notice, PendingRun, SessionConfig, SessionController,
    SessionError, SessionEvent, SessionState,
};
pub use vault::Vault;
