//! Achievements and lifetime stats
//!
//! Stats are folded in from session events; an achievement unlocks once its
//! stat reaches the requirement. Unlocks are permanent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::persistence::{self, ACHIEVEMENTS_KEY, KeyValueStore};
use crate::sim::{GameEvent, Outcome};

/// Shots needed in one session before accuracy counts
pub const MIN_SHOTS_FOR_ACCURACY: u32 = 20;

/// Which stat an achievement tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementKind {
    Kills,
    Score,
    Combo,
    Levels,
    PowerUps,
    /// Best single-session accuracy, in percent
    Accuracy,
    Bosses,
    CoopWins,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: AchievementKind,
    pub requirement: u64,
}

const fn def(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    kind: AchievementKind,
    requirement: u64,
) -> AchievementDef {
    AchievementDef {
        id,
        name,
        description,
        kind,
        requirement,
    }
}

pub const ACHIEVEMENTS: &[AchievementDef] = &[
    def("first_blood", "First Blood", "Destroy your first target", AchievementKind::Kills, 1),
    def("centurion", "Centurion", "Destroy 100 targets", AchievementKind::Kills, 100),
    def("exterminator", "Exterminator", "Destroy 1000 targets", AchievementKind::Kills, 1000),
    def("high_roller", "High Roller", "Earn 10,000 points in total", AchievementKind::Score, 10_000),
    def("millionaire", "Millionaire", "Earn 1,000,000 points in total", AchievementKind::Score, 1_000_000),
    def("combo_starter", "Combo Starter", "Reach a 5x combo", AchievementKind::Combo, 5),
    def("combo_master", "Combo Master", "Reach a 20x combo", AchievementKind::Combo, 20),
    def("cadet", "Cadet", "Complete a level", AchievementKind::Levels, 1),
    def("veteran", "Veteran", "Complete 10 levels", AchievementKind::Levels, 10),
    def("collector", "Collector", "Collect 25 power-ups", AchievementKind::PowerUps, 25),
    def("sharpshooter", "Sharpshooter", "Finish a game with 80% accuracy", AchievementKind::Accuracy, 80),
    def("boss_slayer", "Boss Slayer", "Defeat a boss", AchievementKind::Bosses, 1),
    def("duo_champions", "Duo Champions", "Win a co-op game", AchievementKind::CoopWins, 1),
];

/// Lifetime counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameStats {
    pub total_kills: u64,
    pub total_score: u64,
    pub highest_combo: u64,
    pub levels_completed: u64,
    pub power_ups_collected: u64,
    pub bosses_defeated: u64,
    pub coop_wins: u64,
    pub best_accuracy: u64,
}

impl GameStats {
    pub fn value(&self, kind: AchievementKind) -> u64 {
        match kind {
            AchievementKind::Kills => self.total_kills,
            AchievementKind::Score => self.total_score,
            AchievementKind::Combo => self.highest_combo,
            AchievementKind::Levels => self.levels_completed,
            AchievementKind::PowerUps => self.power_ups_collected,
            AchievementKind::Accuracy => self.best_accuracy,
            AchievementKind::Bosses => self.bosses_defeated,
            AchievementKind::CoopWins => self.coop_wins,
        }
    }
}

/// Per-session summary folded in when a session ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub score: i64,
    pub shots: u32,
    pub hits: u32,
    pub coop_win: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Achievements {
    pub stats: GameStats,
    /// Unlock time (ms) by achievement id
    pub unlocked: BTreeMap<String, f64>,
}

impl Achievements {
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains_key(id)
    }

    /// Progress towards an achievement in [0, 1]
    pub fn progress(&self, def: &AchievementDef) -> f32 {
        if self.is_unlocked(def.id) || def.requirement == 0 {
            return 1.0;
        }
        (self.stats.value(def.kind) as f32 / def.requirement as f32).min(1.0)
    }

    /// Fold one event into the stats. Returns newly unlocked achievements.
    pub fn record_event(&mut self, event: &GameEvent, now_ms: f64) -> Vec<&'static AchievementDef> {
        let stats = &mut self.stats;
        match event {
            GameEvent::TargetHit { combo, .. } => {
                stats.total_kills += 1;
                stats.highest_combo = stats.highest_combo.max(*combo as u64);
            }
            GameEvent::Explosion { destroyed, .. } => stats.total_kills += *destroyed as u64,
            GameEvent::DuckHit { .. } => stats.total_kills += 1,
            GameEvent::PowerUpCollected { .. } => stats.power_ups_collected += 1,
            GameEvent::BossDefeated { .. } => stats.bosses_defeated += 1,
            GameEvent::SessionEnded {
                outcome: Outcome::LevelComplete { .. },
            } => stats.levels_completed += 1,
            _ => return Vec::new(),
        }
        self.check_unlocks(now_ms)
    }

    /// Fold a finished session's totals in
    pub fn record_session_end(&mut self, summary: SessionSummary, now_ms: f64) -> Vec<&'static AchievementDef> {
        self.stats.total_score += summary.score.max(0) as u64;
        if summary.shots >= MIN_SHOTS_FOR_ACCURACY {
            let accuracy = summary.hits as u64 * 100 / summary.shots as u64;
            self.stats.best_accuracy = self.stats.best_accuracy.max(accuracy);
        }
        if summary.coop_win {
            self.stats.coop_wins += 1;
        }
        self.check_unlocks(now_ms)
    }

    fn check_unlocks(&mut self, now_ms: f64) -> Vec<&'static AchievementDef> {
        let mut newly = Vec::new();
        for def in ACHIEVEMENTS {
            if self.is_unlocked(def.id) || self.stats.value(def.kind) < def.requirement {
                continue;
            }
            log::info!("Achievement unlocked: {}", def.name);
            self.unlocked.insert(def.id.to_string(), now_ms);
            newly.push(def);
        }
        newly
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        persistence::load_or_default(store, ACHIEVEMENTS_KEY)
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        persistence::save_or_warn(store, ACHIEVEMENTS_KEY, self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlayerId;
    use crate::persistence::MemoryStore;
    use crate::sim::TargetKind;
    use glam::Vec2;

    fn kill(combo: u32) -> GameEvent {
        GameEvent::TargetHit {
            player: PlayerId::One,
            target_id: 1,
            kind: TargetKind::Normal,
            points: 100,
            combo,
            pos: Vec2::ZERO,
        }
    }

    #[test]
    fn test_first_kill_unlocks_once() {
        let mut achievements = Achievements::default();
        let newly = achievements.record_event(&kill(1), 5.0);
        assert_eq!(newly.len(), 1);
        assert_eq!(newly[0].id, "first_blood");
        assert_eq!(achievements.unlocked.get("first_blood"), Some(&5.0));
        assert!(achievements.record_event(&kill(2), 6.0).is_empty());
    }

    #[test]
    fn test_combo_tracks_highest() {
        let mut achievements = Achievements::default();
        for combo in 1..=5 {
            achievements.record_event(&kill(combo), 0.0);
        }
        achievements.record_event(&kill(1), 0.0);
        assert_eq!(achievements.stats.highest_combo, 5);
        assert!(achievements.is_unlocked("combo_starter"));
        assert!(!achievements.is_unlocked("combo_master"));
    }

    #[test]
    fn test_explosion_counts_splash_kills() {
        let mut achievements = Achievements::default();
        achievements.record_event(&GameEvent::Explosion { pos: Vec2::ZERO, destroyed: 4 }, 0.0);
        assert_eq!(achievements.stats.total_kills, 4);
    }

    #[test]
    fn test_special_events() {
        let mut achievements = Achievements::default();
        achievements.record_event(&GameEvent::BossDefeated { player: PlayerId::One }, 0.0);
        achievements.record_event(
            &GameEvent::SessionEnded {
                outcome: Outcome::LevelComplete { stars: 2 },
            },
            0.0,
        );
        assert!(achievements.is_unlocked("boss_slayer"));
        assert!(achievements.is_unlocked("cadet"));
        // Unrelated events change nothing
        assert!(achievements.record_event(&GameEvent::ShieldConsumed, 0.0).is_empty());
    }

    #[test]
    fn test_session_end() {
        let mut achievements = Achievements::default();
        let summary = SessionSummary {
            score: 12_000,
            shots: 10,
            hits: 10,
            coop_win: true,
        };
        achievements.record_session_end(summary, 0.0);
        assert!(achievements.is_unlocked("high_roller"));
        assert!(achievements.is_unlocked("duo_champions"));
        // Too few shots for accuracy to count
        assert_eq!(achievements.stats.best_accuracy, 0);

        let summary = SessionSummary {
            score: -5,
            shots: 25,
            hits: 20,
            coop_win: false,
        };
        achievements.record_session_end(summary, 0.0);
        assert_eq!(achievements.stats.total_score, 12_000);
        assert_eq!(achievements.stats.best_accuracy, 80);
        assert!(achievements.is_unlocked("sharpshooter"));
    }

    #[test]
    fn test_progress() {
        let mut achievements = Achievements::default();
        let centurion = ACHIEVEMENTS.iter().find(|a| a.id == "centurion").unwrap();
        for _ in 0..25 {
            achievements.record_event(&kill(1), 0.0);
        }
        assert!((achievements.progress(centurion) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_unique_ids() {
        let mut ids: Vec<&str> = ACHIEVEMENTS.iter().map(|a| a.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), ACHIEVEMENTS.len());
    }

    #[test]
    fn test_round_trip() {
        let mut store = MemoryStore::new();
        let mut achievements = Achievements::default();
        achievements.record_event(&kill(3), 42.0);
        achievements.save(&mut store);
        assert_eq!(Achievements::load(&store), achievements);
    }
}
