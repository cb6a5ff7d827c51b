//! Score storage abstraction and backends for VAULT.
//!
//! The leaderboard lives in an opaque tabular store reachable over a
//! request/response API. This crate provides the trait seam plus an
//! in-memory table, a JSON file table and a PostgREST HTTP client.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
pub mod json_storage;
pub mod rest;
pub mod config;

pub use trait_::{ScoreStore, StoreError, Result, ScoreQuery, LEADERBOARD_TABLE};
pub use memory::MemoryStore;
pub use json_storage::JsonStore;
pub use rest::{RestStore, RestConfig};
pub use config::{StoreConfig, StoreKind};
