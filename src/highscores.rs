//! High score leaderboard
//!
//! Top 10 scores across all modes, persisted through the key-value store.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, HIGHSCORES_KEY, KeyValueStore};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Wave (endless) or round (duck hunt) reached
    pub wave: u32,
    /// Short mode label, e.g. "endless" or "level 3"
    pub mode: String,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// High score leaderboard, sorted descending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would achieve (1-indexed), None if it doesn't qualify
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a score if it qualifies. Returns the rank achieved (1-indexed).
    /// Equal scores rank below existing ones.
    pub fn add_score(&mut self, score: u64, wave: u32, mode: &str, timestamp: f64) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries.insert(
            rank - 1,
            HighScoreEntry {
                score,
                wave,
                mode: mode.to_string(),
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        log::info!("High score #{rank}: {score} ({mode})");
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut scores: Self = persistence::load_or_default(store, HIGHSCORES_KEY);
        // Stored data may come from an older build; keep the invariant
        scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
        scores.entries.truncate(MAX_HIGH_SCORES);
        scores
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        persistence::save_or_warn(store, HIGHSCORES_KEY, self);
    }
}

/// Format a timestamp relative to `now_ms` ("Just now", "3 days ago", ...)
pub fn format_age(timestamp: f64, now_ms: f64) -> String {
    let mins = ((now_ms - timestamp) / 60_000.0).max(0.0);
    let hours = mins / 60.0;
    let days = hours / 24.0;

    if days >= 1.0 {
        match days.floor() as i64 {
            1 => "Yesterday".to_string(),
            d if d < 7 => format!("{d} days ago"),
            d => format!("{} weeks ago", d / 7),
        }
    } else if hours >= 1.0 {
        match hours.floor() as i64 {
            1 => "1 hour ago".to_string(),
            h => format!("{h} hours ago"),
        }
    } else if mins >= 1.0 {
        match mins.floor() as i64 {
            1 => "1 min ago".to_string(),
            m => format!("{m} mins ago"),
        }
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_insert_sorted_and_ranked() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(500, 3, "endless", 0.0), Some(1));
        assert_eq!(scores.add_score(900, 5, "endless", 0.0), Some(1));
        assert_eq!(scores.add_score(700, 4, "level 2", 0.0), Some(2));
        // Ties rank below the existing entry
        assert_eq!(scores.add_score(700, 4, "coop", 0.0), Some(3));
        let order: Vec<u64> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(order, vec![900, 700, 700, 500]);
        assert_eq!(scores.top_score(), Some(900));
    }

    #[test]
    fn test_zero_never_qualifies() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(0, 1, "endless", 0.0), None);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_capped_at_ten() {
        let mut scores = HighScores::new();
        for i in 1..=12 {
            scores.add_score(i * 100, 1, "endless", 0.0);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().unwrap().score, 300);
        assert!(!scores.qualifies(300));
        assert_eq!(scores.potential_rank(350), Some(10));
    }

    #[test]
    fn test_persistence_round_trip() {
        let mut store = MemoryStore::new();
        let mut scores = HighScores::new();
        scores.add_score(1234, 7, "endless", 1.0e12);
        scores.save(&mut store);
        assert_eq!(HighScores::load(&store), scores);
    }

    #[test]
    fn test_format_age() {
        let min = 60_000.0;
        assert_eq!(format_age(0.0, 30_000.0), "Just now");
        assert_eq!(format_age(0.0, 5.0 * min), "5 mins ago");
        assert_eq!(format_age(0.0, 61.0 * min), "1 hour ago");
        assert_eq!(format_age(0.0, 25.0 * 60.0 * min), "Yesterday");
        assert_eq!(format_age(0.0, 3.0 * 24.0 * 60.0 * min), "3 days ago");
    }
}
