//! Leaderboard Service
//!
//! Score submission and ranked reads on top of a [`vault_storage::ScoreStore`].

#![warn(missing_docs)]

pub mod service;
pub mod ranking;

pub use service::{LeaderboardService, SubmitError, FetchError, DEFAULT_LIMIT};
pub use ranking::{compare_entries, rank};
