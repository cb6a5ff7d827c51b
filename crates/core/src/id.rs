//! Identifiers for VAULT entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifier of a level; levels are numbered from 1 in play order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(u32);

impl LevelId {
    /// The first level of the vault.
    pub const FIRST: LevelId = LevelId(1);

    /// Create from a raw level number.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw level number.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The level that follows this one in play order.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<u32> for LevelId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for LevelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for LevelId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Opaque identifier of a leaderboard row, assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreId(String);

impl ScoreId {
    /// Generate a fresh id, for stores that assign ids locally.
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Wrap an id handed out by a remote store.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_id_next_and_parse() {
        assert_eq!(LevelId::new(3).next(), LevelId::new(4));
        assert_eq!(LevelId::new(u32::MAX).next(), LevelId::new(u32::MAX));
        assert_eq!(" 7 ".parse::<LevelId>().unwrap(), LevelId::new(7));
        assert!("seven".parse::<LevelId>().is_err());
    }

    #[test]
    fn test_score_ids_are_unique() {
        assert_ne!(ScoreId::generate(), ScoreId::generate());
        assert_eq!(ScoreId::new("abc").as_str(), "abc");
    }
}
