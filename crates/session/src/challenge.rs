//! The contract between a level attempt and its puzzle widget.
//!
//! A widget is a black box: it is handed a [`ChallengeCallbacks`] when
//! mounted and decides on its own when to call `complete()` or `back()`.

use std::path::Path;

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;
use vault_core::{Level, LevelId};

/// What a widget asked the attempt to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeSignal {
    /// The puzzle condition is satisfied
    Completed,
    /// Return to level selection
    Back,
}

/// A signal tagged with the attempt whose callbacks sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SignalEnvelope {
    pub attempt: u64,
    pub signal: ChallengeSignal,
}

/// Capability handle given to a widget on mount.
///
/// Signals from callbacks of an attempt that has since ended are ignored
/// by the controller.
#[derive(Debug, Clone)]
pub struct ChallengeCallbacks {
    attempt: u64,
    tx: mpsc::UnboundedSender<SignalEnvelope>,
}

impl ChallengeCallbacks {
    pub(crate) fn new(attempt: u64, tx: mpsc::UnboundedSender<SignalEnvelope>) -> Self {
        Self { attempt, tx }
    }

    /// Attempt these callbacks belong to.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Report that the puzzle was solved.
    pub fn complete(&self) {
        self.send(ChallengeSignal::Completed);
    }

    /// Ask to return to level selection.
    pub fn back(&self) {
        self.send(ChallengeSignal::Back);
    }

    fn send(&self, signal: ChallengeSignal) {
        let envelope = SignalEnvelope {
            attempt: self.attempt,
            signal,
        };
        if self.tx.send(envelope).is_err() {
            debug!("Dropped {:?} from attempt {}: session closed", signal, self.attempt);
        }
    }
}

/// Widget response to one line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeFeedback {
    /// Input solved the puzzle
    Accepted,
    /// Wrong answer, with a message for the player
    Rejected(String),
    /// Player asked to leave
    Back,
    /// Input had no effect (already solved or not mounted)
    Ignored,
}

/// A level's puzzle widget.
pub trait Challenge: Send {
    /// Heading shown above the puzzle.
    fn title(&self) -> &str;

    /// Receive the callbacks for the current attempt.
    fn mount(&mut self, callbacks: ChallengeCallbacks);

    /// Feed one line of player input.
    fn input(&mut self, line: &str) -> ChallengeFeedback;
}

/// Word that asks any password widget to go back.
const BACK_COMMAND: &str = "back";

/// Widget gated behind a literal password, compared case-insensitively.
pub struct PasswordChallenge {
    title: String,
    password: String,
    hint: Option<String>,
    callbacks: Option<ChallengeCallbacks>,
    solved: bool,
}

impl PasswordChallenge {
    /// Create a widget for a password.
    pub fn new(title: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            password: password.into().trim().to_lowercase(),
            hint: None,
            callbacks: None,
            solved: false,
        }
    }

    /// Message shown on a wrong answer.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Whether the password was found.
    pub fn is_solved(&self) -> bool {
        self.solved
    }
}

impl Challenge for PasswordChallenge {
    fn title(&self) -> &str {
        &self.title
    }

    fn mount(&mut self, callbacks: ChallengeCallbacks) {
        self.callbacks = Some(callbacks);
    }

    fn input(&mut self, line: &str) -> ChallengeFeedback {
        let Some(callbacks) = &self.callbacks else {
            return ChallengeFeedback::Ignored;
        };
        let guess = line.trim().to_lowercase();

        if guess == BACK_COMMAND {
            callbacks.back();
            return ChallengeFeedback::Back;
        }
        if self.solved {
            return ChallengeFeedback::Ignored;
        }
        if guess == self.password {
            self.solved = true;
            callbacks.complete();
            return ChallengeFeedback::Accepted;
        }

        ChallengeFeedback::Rejected(
            self.hint
                .clone()
                .unwrap_or_else(|| "Incorrect password.".to_string()),
        )
    }
}

/// Failure loading a challenge pack.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed pack
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Same level listed twice
    #[error("level {0} appears more than once")]
    Duplicate(LevelId),
}

#[derive(Debug, Clone, Deserialize)]
struct PackEntry {
    level: LevelId,
    password: String,
    #[serde(default)]
    hint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PackFile {
    levels: Vec<PackEntry>,
}

/// Passwords for the levels, kept outside the code.
///
/// ```json
/// { "levels": [ { "level": 1, "password": "...", "hint": "..." } ] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChallengePack {
    entries: Vec<PackEntry>,
}

impl ChallengePack {
    /// Parse a pack from JSON text.
    pub fn from_json(json: &str) -> Result<Self, PackError> {
        let file: PackFile = serde_json::from_str(json)?;
        let mut entries: Vec<PackEntry> = Vec::with_capacity(file.levels.len());
        for entry in file.levels {
            if entries.iter().any(|e| e.level == entry.level) {
                return Err(PackError::Duplicate(entry.level));
            }
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    /// Read a pack file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PackError> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    /// Whether the pack has a password for a level.
    pub fn contains(&self, id: LevelId) -> bool {
        self.entries.iter().any(|e| e.level == id)
    }

    /// Build the widget for a level.
    pub fn challenge_for(&self, level: &Level) -> Option<PasswordChallenge> {
        let entry = self.entries.iter().find(|e| e.level == level.id)?;
        let challenge = PasswordChallenge::new(level.title.clone(), entry.password.clone());
        Some(match &entry.hint {
            Some(hint) => challenge.with_hint(hint.clone()),
            None => challenge,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_core::Difficulty;

    fn mounted(password: &str) -> (PasswordChallenge, mpsc::UnboundedReceiver<SignalEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut challenge = PasswordChallenge::new("Hidden", password);
        challenge.mount(ChallengeCallbacks::new(7, tx));
        (challenge, rx)
    }

    #[test]
    fn test_password_is_case_insensitive() {
        let (mut challenge, mut rx) = mounted("Shadow");

        assert_eq!(challenge.input("  SHADOW "), ChallengeFeedback::Accepted);
        assert!(challenge.is_solved());
        assert_eq!(
            rx.try_recv().unwrap(),
            SignalEnvelope { attempt: 7, signal: ChallengeSignal::Completed }
        );
    }

    #[test]
    fn test_completion_fires_once() {
        let (mut challenge, mut rx) = mounted("shadow");

        challenge.input("shadow");
        assert_eq!(challenge.input("shadow"), ChallengeFeedback::Ignored);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_wrong_answer_and_back() {
        let (challenge, mut rx) = mounted("shadow");
        let mut challenge = challenge.with_hint("Look more carefully...");

        assert_eq!(
            challenge.input("light"),
            ChallengeFeedback::Rejected("Look more carefully...".to_string())
        );
        assert!(rx.try_recv().is_err());

        assert_eq!(challenge.input("Back"), ChallengeFeedback::Back);
        assert_eq!(rx.try_recv().unwrap().signal, ChallengeSignal::Back);
    }

    #[test]
    fn test_unmounted_widget_ignores_input() {
        let mut challenge = PasswordChallenge::new("Hidden", "shadow");
        assert_eq!(challenge.input("shadow"), ChallengeFeedback::Ignored);
        assert!(!challenge.is_solved());
    }

    #[test]
    fn test_pack_builds_widgets() {
        let pack = ChallengePack::from_json(
            r#"{"levels": [{"level": 1, "password": "ember", "hint": "warm"}, {"level": 2, "password": "frost"}]}"#,
        )
        .unwrap();

        let level = Level::new(LevelId::new(2), "Beyond the Surface", "", Difficulty::Easy);
        let mut challenge = pack.challenge_for(&level).unwrap();
        assert_eq!(challenge.title(), "Beyond the Surface");

        let (tx, _rx) = mpsc::unbounded_channel();
        challenge.mount(ChallengeCallbacks::new(1, tx));
        assert_eq!(challenge.input("FROST"), ChallengeFeedback::Accepted);

        assert!(pack.contains(LevelId::new(1)));
        assert!(!pack.contains(LevelId::new(3)));
    }

    #[test]
    fn test_pack_rejects_duplicates() {
        let result = ChallengePack::from_json(
            r#"{"levels": [{"level": 1, "password": "a"}, {"level": 1, "password": "b"}]}"#,
        );
        assert!(matches!(result, Err(PackError::Duplicate(id)) if id == LevelId::new(1)));
    }

    #[tokio::test]
    async fn test_pack_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pack.json");
        tokio::fs::write(&path, r#"{"levels": [{"level": 3, "password": "gate"}]}"#)
            .await
            .unwrap();

        let pack = ChallengePack::load(&path).await.unwrap();
        assert!(pack.contains(LevelId::new(3)));
    }
}
