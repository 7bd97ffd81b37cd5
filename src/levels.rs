//! Level definitions, star ratings and saved progress

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persistence::{self, KeyValueStore, PROGRESS_KEY};
use crate::sim::{MovementPattern, TargetKind};
use crate::tuning;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("level config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level {id}: {reason}")]
    Invalid { id: u32, reason: &'static str },
}

/// Optional level modifiers. Every field defaults independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialRules {
    /// Escaped targets cost no lives
    pub no_lives_loss: bool,
    /// Seconds added to the clock per kill
    pub bonus_time_per_hit: f32,
    /// Targets shrink with age
    pub shrinking_targets: bool,
    /// Targets speed up as the level clock runs down
    pub speed_ramp: bool,
    /// Ghost targets fade in and out
    pub invisible_targets: bool,
    /// A boss appears near the end of the level
    pub has_boss: bool,
    /// Power-up spawn interval override (ms)
    pub power_up_frequency: Option<f64>,
}

/// One structured level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_secs: f32,
    pub pass_score: i64,
    pub three_star_score: i64,
    #[serde(default)]
    pub difficulty: f32,
    pub max_targets: usize,
    pub spawn_interval_ms: f64,
    /// Overrides merged over the default spawn table
    #[serde(default)]
    pub target_weights: BTreeMap<TargetKind, f32>,
    /// Replaces the default movement table when non-empty
    #[serde(default)]
    pub movement_weights: BTreeMap<MovementPattern, f32>,
    #[serde(default)]
    pub special_rules: SpecialRules,
}

impl LevelConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LevelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason| Err(ConfigError::Invalid { id: self.id, reason });
        if !(self.duration_secs > 0.0) {
            return invalid("duration must be positive");
        }
        if self.pass_score > self.three_star_score {
            return invalid("pass score above three-star score");
        }
        if self.max_targets == 0 {
            return invalid("max_targets must be at least 1");
        }
        if !(self.spawn_interval_ms > 0.0) {
            return invalid("spawn interval must be positive");
        }
        Ok(())
    }

    /// Stars earned for a final score (0 = failed)
    pub fn stars(&self, score: i64) -> u8 {
        let midpoint = (self.pass_score + self.three_star_score) / 2;
        if score >= self.three_star_score {
            3
        } else if score >= midpoint {
            2
        } else if score >= self.pass_score {
            1
        } else {
            0
        }
    }
}

/// Spawn table for a level: default weights with the level's overrides
/// replacing matching kinds. Bosses never enter the table.
pub fn effective_target_weights(level: Option<&LevelConfig>) -> Vec<(TargetKind, f32)> {
    let mut table = tuning::default_target_weights();
    if let Some(level) = level {
        for (kind, weight) in table.iter_mut() {
            if let Some(w) = level.target_weights.get(kind) {
                *weight = *w;
            }
        }
    }
    table
}

pub fn effective_movement_weights(level: Option<&LevelConfig>) -> Vec<(MovementPattern, f32)> {
    match level {
        Some(level) if !level.movement_weights.is_empty() => level
            .movement_weights
            .iter()
            .map(|(p, w)| (*p, *w))
            .collect(),
        _ => tuning::default_movement_weights(),
    }
}

struct LevelDef {
    id: u32,
    name: &'static str,
    description: &'static str,
    duration_secs: f32,
    pass_score: i64,
    three_star_score: i64,
    difficulty: f32,
    max_targets: usize,
    spawn_interval_ms: f64,
    targets: &'static [(TargetKind, f32)],
    movement: &'static [(MovementPattern, f32)],
    rules: fn() -> SpecialRules,
}

impl LevelDef {
    fn build(&self) -> LevelConfig {
        LevelConfig {
            id: self.id,
            name: self.name.to_string(),
            description: self.description.to_string(),
            duration_secs: self.duration_secs,
            pass_score: self.pass_score,
            three_star_score: self.three_star_score,
            difficulty: self.difficulty,
            max_targets: self.max_targets,
            spawn_interval_ms: self.spawn_interval_ms,
            target_weights: self.targets.iter().copied().collect(),
            movement_weights: self.movement.iter().copied().collect(),
            special_rules: (self.rules)(),
        }
    }
}

use MovementPattern as M;
use TargetKind as T;

const CLASSIC_MIX: [(TargetKind, f32); 8] = [
    (T::Normal, 25.0),
    (T::Fast, 20.0),
    (T::Small, 15.0),
    (T::Bonus, 10.0),
    (T::Ufo, 12.0),
    (T::Alien, 10.0),
    (T::Meteor, 5.0),
    (T::Planet, 3.0),
];

const LEVEL_DEFS: [LevelDef; 12] = [
    LevelDef {
        id: 1,
        name: "Training Ground",
        description: "Slow targets, no pressure",
        duration_secs: 60.0,
        pass_score: 500,
        three_star_score: 1500,
        difficulty: 0.0,
        max_targets: 3,
        spawn_interval_ms: 2500.0,
        targets: &[
            (T::Normal, 50.0),
            (T::Fast, 10.0),
            (T::Small, 5.0),
            (T::Bonus, 5.0),
            (T::Ufo, 10.0),
            (T::Alien, 10.0),
            (T::Meteor, 5.0),
            (T::Planet, 5.0),
            (T::Decoy, 0.0),
            (T::Explosive, 0.0),
            (T::Split, 0.0),
            (T::Shield, 0.0),
            (T::TimeFreeze, 0.0),
        ],
        movement: &[(M::Linear, 60.0), (M::Sine, 20.0), (M::Random, 10.0), (M::Static, 10.0)],
        rules: || SpecialRules {
            no_lives_loss: true,
            ..Default::default()
        },
    },
    LevelDef {
        id: 2,
        name: "Speed Demon",
        description: "Fast targets everywhere",
        duration_secs: 45.0,
        pass_score: 800,
        three_star_score: 2000,
        difficulty: 1.0,
        max_targets: 5,
        spawn_interval_ms: 1500.0,
        targets: &[
            (T::Normal, 15.0),
            (T::Fast, 40.0),
            (T::Small, 10.0),
            (T::Bonus, 5.0),
            (T::Ufo, 15.0),
            (T::Alien, 10.0),
            (T::Meteor, 3.0),
            (T::Planet, 2.0),
        ],
        movement: &[(M::Linear, 50.0), (M::Sine, 30.0), (M::Random, 15.0), (M::Static, 5.0)],
        rules: SpecialRules::default,
    },
    LevelDef {
        id: 3,
        name: "Sharpshooter",
        description: "Tiny targets, precision over speed",
        duration_secs: 60.0,
        pass_score: 1000,
        three_star_score: 2500,
        difficulty: 1.5,
        max_targets: 4,
        spawn_interval_ms: 2000.0,
        targets: &[
            (T::Normal, 10.0),
            (T::Fast, 10.0),
            (T::Small, 50.0),
            (T::Bonus, 10.0),
            (T::Ufo, 5.0),
            (T::Alien, 10.0),
            (T::Meteor, 3.0),
            (T::Planet, 2.0),
        ],
        movement: &[(M::Linear, 40.0), (M::Sine, 30.0), (M::Random, 20.0), (M::Static, 10.0)],
        rules: SpecialRules::default,
    },
    LevelDef {
        id: 4,
        name: "Bonus Frenzy",
        description: "Tons of bonus targets",
        duration_secs: 45.0,
        pass_score: 2000,
        three_star_score: 5000,
        difficulty: 1.0,
        max_targets: 6,
        spawn_interval_ms: 1200.0,
        targets: &[
            (T::Normal, 20.0),
            (T::Fast, 10.0),
            (T::Small, 10.0),
            (T::Bonus, 40.0),
            (T::Ufo, 8.0),
            (T::Alien, 7.0),
            (T::Meteor, 3.0),
            (T::Planet, 2.0),
        ],
        movement: &[(M::Linear, 30.0), (M::Sine, 40.0), (M::Random, 20.0), (M::Static, 10.0)],
        rules: SpecialRules::default,
    },
    LevelDef {
        id: 5,
        name: "Time Attack",
        description: "Each hit adds time",
        duration_secs: 30.0,
        pass_score: 1500,
        three_star_score: 4000,
        difficulty: 2.0,
        max_targets: 5,
        spawn_interval_ms: 1000.0,
        targets: &CLASSIC_MIX,
        movement: &[(M::Linear, 25.0), (M::Sine, 35.0), (M::Random, 30.0), (M::Static, 10.0)],
        rules: || SpecialRules {
            bonus_time_per_hit: 1.5,
            ..Default::default()
        },
    },
    LevelDef {
        id: 6,
        name: "Chaos Theory",
        description: "Unpredictable movement everywhere",
        duration_secs: 50.0,
        pass_score: 1200,
        three_star_score: 3000,
        difficulty: 2.0,
        max_targets: 6,
        spawn_interval_ms: 1400.0,
        targets: &[
            (T::Normal, 20.0),
            (T::Fast, 18.0),
            (T::Small, 18.0),
            (T::Bonus, 15.0),
            (T::Ufo, 12.0),
            (T::Alien, 10.0),
            (T::Meteor, 5.0),
            (T::Planet, 2.0),
        ],
        movement: &[
            (M::Linear, 10.0),
            (M::Sine, 25.0),
            (M::Random, 40.0),
            (M::Static, 5.0),
            (M::Zigzag, 20.0),
        ],
        rules: SpecialRules::default,
    },
    LevelDef {
        id: 7,
        name: "Ghost Hunt",
        description: "Targets fade in and out",
        duration_secs: 60.0,
        pass_score: 1000,
        three_star_score: 2800,
        difficulty: 2.5,
        max_targets: 5,
        spawn_interval_ms: 1800.0,
        targets: &CLASSIC_MIX,
        movement: &[(M::Linear, 40.0), (M::Sine, 30.0), (M::Random, 20.0), (M::Static, 10.0)],
        rules: || SpecialRules {
            invisible_targets: true,
            ..Default::default()
        },
    },
    LevelDef {
        id: 8,
        name: "Pressure Cooker",
        description: "Targets speed up over time",
        duration_secs: 50.0,
        pass_score: 1500,
        three_star_score: 3500,
        difficulty: 2.5,
        max_targets: 6,
        spawn_interval_ms: 1300.0,
        targets: &[
            (T::Normal, 20.0),
            (T::Fast, 25.0),
            (T::Small, 15.0),
            (T::Bonus, 10.0),
            (T::Ufo, 12.0),
            (T::Alien, 10.0),
            (T::Meteor, 6.0),
            (T::Planet, 2.0),
        ],
        movement: &[(M::Linear, 35.0), (M::Sine, 35.0), (M::Random, 25.0), (M::Static, 5.0)],
        rules: || SpecialRules {
            speed_ramp: true,
            ..Default::default()
        },
    },
    LevelDef {
        id: 9,
        name: "Sniper Elite",
        description: "Shrinking targets",
        duration_secs: 55.0,
        pass_score: 1800,
        three_star_score: 4000,
        difficulty: 3.0,
        max_targets: 5,
        spawn_interval_ms: 1500.0,
        targets: &[
            (T::Normal, 18.0),
            (T::Fast, 18.0),
            (T::Small, 22.0),
            (T::Bonus, 15.0),
            (T::Ufo, 10.0),
            (T::Alien, 10.0),
            (T::Meteor, 5.0),
            (T::Planet, 2.0),
        ],
        movement: &[(M::Linear, 30.0), (M::Sine, 40.0), (M::Random, 25.0), (M::Static, 5.0)],
        rules: || SpecialRules {
            shrinking_targets: true,
            ..Default::default()
        },
    },
    LevelDef {
        id: 10,
        name: "Power Surge",
        description: "Power-ups rain down, special targets everywhere",
        duration_secs: 60.0,
        pass_score: 2000,
        three_star_score: 5000,
        difficulty: 3.0,
        max_targets: 6,
        spawn_interval_ms: 1200.0,
        targets: &[
            (T::Normal, 15.0),
            (T::Explosive, 15.0),
            (T::Split, 12.0),
            (T::Shield, 12.0),
            (T::Decoy, 10.0),
            (T::TimeFreeze, 8.0),
        ],
        movement: &[
            (M::Linear, 30.0),
            (M::Sine, 25.0),
            (M::Orbit, 25.0),
            (M::Zigzag, 20.0),
        ],
        rules: || SpecialRules {
            power_up_frequency: Some(5000.0),
            ..Default::default()
        },
    },
    LevelDef {
        id: 11,
        name: "Mothership",
        description: "Survive until the boss arrives, then take it down",
        duration_secs: 75.0,
        pass_score: 3000,
        three_star_score: 7000,
        difficulty: 3.5,
        max_targets: 5,
        spawn_interval_ms: 1400.0,
        targets: &CLASSIC_MIX,
        movement: &[(M::Linear, 30.0), (M::Sine, 30.0), (M::Random, 25.0), (M::Orbit, 15.0)],
        rules: || SpecialRules {
            has_boss: true,
            ..Default::default()
        },
    },
    LevelDef {
        id: 12,
        name: "Final Showdown",
        description: "Everything at once",
        duration_secs: 60.0,
        pass_score: 2500,
        three_star_score: 6000,
        difficulty: 4.0,
        max_targets: 8,
        spawn_interval_ms: 800.0,
        targets: &[
            (T::Normal, 15.0),
            (T::Fast, 15.0),
            (T::Small, 15.0),
            (T::Bonus, 20.0),
            (T::Ufo, 12.0),
            (T::Alien, 12.0),
            (T::Meteor, 8.0),
            (T::Planet, 3.0),
        ],
        movement: &[(M::Linear, 20.0), (M::Sine, 30.0), (M::Random, 40.0), (M::Static, 10.0)],
        rules: || SpecialRules {
            speed_ramp: true,
            shrinking_targets: true,
            has_boss: true,
            ..Default::default()
        },
    },
];

/// The built-in campaign
pub fn builtin_levels() -> Vec<LevelConfig> {
    LEVEL_DEFS.iter().map(LevelDef::build).collect()
}

pub fn builtin_level(id: u32) -> Option<LevelConfig> {
    LEVEL_DEFS.iter().find(|d| d.id == id).map(LevelDef::build)
}

/// Best result for one level
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub best_score: i64,
    pub stars: u8,
}

/// Saved campaign progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelProgress {
    pub records: BTreeMap<u32, LevelRecord>,
    /// Highest playable level id
    pub unlocked: u32,
}

impl Default for LevelProgress {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            unlocked: 1,
        }
    }
}

impl LevelProgress {
    pub fn is_unlocked(&self, level_id: u32) -> bool {
        level_id <= self.unlocked
    }

    pub fn record(&self, level_id: u32) -> Option<&LevelRecord> {
        self.records.get(&level_id)
    }

    /// Fold a finished attempt in. A passing attempt unlocks the next level.
    /// Returns true on a new best score.
    pub fn record_result(&mut self, level: &LevelConfig, score: i64) -> bool {
        let stars = level.stars(score);
        let entry = self.records.entry(level.id).or_default();
        let new_best = score > entry.best_score;
        if new_best {
            entry.best_score = score;
        }
        entry.stars = entry.stars.max(stars);
        if stars > 0 {
            self.unlocked = self.unlocked.max(level.id + 1);
            log::info!("Level {} passed with {} stars", level.id, stars);
        }
        new_best
    }

    pub fn total_stars(&self) -> u32 {
        self.records.values().map(|r| r.stars as u32).sum()
    }

    pub fn load(store: &dyn KeyValueStore) -> Self {
        persistence::load_or_default(store, PROGRESS_KEY)
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        persistence::save_or_warn(store, PROGRESS_KEY, self);
    }
}
