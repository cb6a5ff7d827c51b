//! The ten levels of the vault.

use vault_core::{Difficulty, Level, LevelId};

const LEVELS: [(&str, &str, Difficulty); 10] = [
    ("Hidden in Plain Sight", "Sometimes the answer is where you least expect it...", Difficulty::Easy),
    ("Beyond the Surface", "Not everything is what it appears to be.", Difficulty::Easy),
    ("Logic Gates", "Truth and lies intertwined in statements.", Difficulty::Medium),
    ("The Grid", "Words hide in shadows and light.", Difficulty::Medium),
    ("Time Traveler", "When files were born tells a story.", Difficulty::Medium),
    ("Background Check", "You've been looking at me this whole time.", Difficulty::Hard),
    ("Needle in Haystack", "100 files, but only one matters.", Difficulty::Hard),
    ("Reverse Psychology", "Sometimes you need to go backwards to move forward.", Difficulty::Hard),
    ("Ignore the Obvious", "The answer is in the last place you'd look.", Difficulty::Expert),
    ("The Final Truth", "Everything you need has been with you all along.", Difficulty::Expert),
];

/// Fresh level set for a new session: all unsolved, only level 1 unlocked.
pub fn standard_levels() -> Vec<Level> {
    LEVELS
        .iter()
        .enumerate()
        .map(|(i, (title, description, difficulty))| {
            let mut level = Level::new(LevelId::new(i as u32 + 1), *title, *description, *difficulty);
            level.unlocked = i == 0;
            level
        })
        .collect()
}
