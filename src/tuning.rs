//! Data-driven game balance
//!
//! Per-kind target stats, spawn and movement weight tables, power-up
//! durations and the duck-hunt configuration. Engine-level constants live in
//! [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::sim::{MovementPattern, PowerUpKind, TargetKind};

/// Stats for one target kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSpec {
    pub size_mult: f32,
    pub speed_mult: f32,
    /// Negative for decoys
    pub points: i32,
    pub health: u32,
    /// Relative weight in the default spawn table
    pub spawn_weight: f32,
}

const fn spec(size_mult: f32, speed_mult: f32, points: i32, health: u32, spawn_weight: f32) -> TargetSpec {
    TargetSpec {
        size_mult,
        speed_mult,
        points,
        health,
        spawn_weight,
    }
}

impl TargetKind {
    pub fn spec(self) -> TargetSpec {
        match self {
            TargetKind::Normal => spec(1.0, 1.0, 100, 1, 30.0),
            TargetKind::Fast => spec(0.8, 2.0, 150, 1, 15.0),
            TargetKind::Small => spec(0.5, 1.2, 200, 1, 10.0),
            TargetKind::Bonus => spec(1.2, 1.5, 500, 1, 5.0),
            TargetKind::Ufo => spec(1.3, 1.3, 250, 2, 15.0),
            TargetKind::Alien => spec(0.9, 1.4, 180, 1, 12.0),
            TargetKind::Meteor => spec(1.1, 2.5, 300, 3, 8.0),
            TargetKind::Planet => spec(1.5, 0.5, 150, 1, 5.0),
            TargetKind::Explosive => spec(1.1, 1.0, 200, 1, 6.0),
            TargetKind::Split => spec(1.2, 0.9, 150, 1, 5.0),
            TargetKind::Shield => spec(1.1, 0.8, 250, 2, 5.0),
            TargetKind::Decoy => spec(1.0, 1.0, -100, 1, 6.0),
            TargetKind::TimeFreeze => spec(0.9, 1.2, 300, 1, 3.0),
            // Size is fixed, never drawn from the spawn table
            TargetKind::Boss => spec(1.0, 0.8, 2000, 20, 0.0),
        }
    }
}

/// Explosive targets destroy everything within this radius (plus each victim's half size)
pub const EXPLOSION_RADIUS: f32 = 150.0;

/// Boss
pub const BOSS_SIZE: f32 = 150.0;
/// Bosses stop descending at this height
pub const BOSS_HOVER_Y: f32 = 150.0;
/// Bosses bounce off this margin at the side edges
pub const BOSS_SIDE_MARGIN: f32 = 100.0;

/// Split fan-out
pub const SPLIT_COUNT: usize = 3;
pub const SPLIT_CHILD_POINTS: i32 = 50;
pub const SPLIT_CHILD_SPEED_MULT: f32 = 1.5;

/// Default spawn table, in declaration order
pub fn default_target_weights() -> Vec<(TargetKind, f32)> {
    TargetKind::SPAWNABLE
        .iter()
        .map(|&kind| (kind, kind.spec().spawn_weight))
        .collect()
}

impl MovementPattern {
    pub fn default_weight(self) -> f32 {
        match self {
            MovementPattern::Linear => 35.0,
            MovementPattern::Sine => 25.0,
            MovementPattern::Random => 15.0,
            MovementPattern::Static => 10.0,
            MovementPattern::Orbit => 8.0,
            MovementPattern::Zigzag => 7.0,
        }
    }
}

pub fn default_movement_weights() -> Vec<(MovementPattern, f32)> {
    MovementPattern::ALL
        .iter()
        .map(|&p| (p, p.default_weight()))
        .collect()
}

impl PowerUpKind {
    /// Effect duration once collected (ms)
    pub fn duration_ms(self) -> f64 {
        match self {
            PowerUpKind::SlowMo => 5000.0,
            PowerUpKind::RapidFire => 8000.0,
            PowerUpKind::SpreadShot => 8000.0,
            PowerUpKind::Magnet => 6000.0,
            PowerUpKind::Shield => 10000.0,
            PowerUpKind::DoublePoints => 10000.0,
        }
    }
}

/// Shot cooldown scale while rapid-fire is active
pub const RAPID_FIRE_COOLDOWN_SCALE: f32 = 0.5;

/// Co-op runs that reach this combined score count as a win
pub const COOP_WIN_SCORE: i64 = 5000;

/// Duck-hunt balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuckHuntTuning {
    pub ducks_per_round: u32,
    pub ducks_to_pass: u32,
    pub shots_per_duck: u32,
    /// Hit radius around the duck centre
    pub duck_size: f32,
    /// Pixels per reference frame
    pub base_speed: f32,
    pub speed_per_round: f32,
    pub fall_speed: f32,
    pub fly_away_speed: f32,
    pub fly_away_ms: f64,
    pub direction_change_ms: f64,
    pub hit_animation_ms: f64,
    pub round_transition_ms: f64,
    pub points_standard: i64,
    pub points_bonus: i64,
    pub points_special: i64,
    pub perfect_round_bonus: i64,
    /// Fraction of the screen height the ducks fly in
    pub play_area_fraction: f32,
}

impl Default for DuckHuntTuning {
    fn default() -> Self {
        Self {
            ducks_per_round: 10,
            ducks_to_pass: 6,
            shots_per_duck: 3,
            duck_size: 60.0,
            base_speed: 3.0,
            speed_per_round: 0.5,
            fall_speed: 8.0,
            fly_away_speed: 5.0,
            fly_away_ms: 5000.0,
            direction_change_ms: 1000.0,
            hit_animation_ms: 500.0,
            round_transition_ms: 2000.0,
            points_standard: 500,
            points_bonus: 1000,
            points_special: 1500,
            perfect_round_bonus: 10000,
            play_area_fraction: 0.75,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boss_never_in_spawn_table() {
        assert!(default_target_weights().iter().all(|(k, _)| *k != TargetKind::Boss));
        assert_eq!(TargetKind::Boss.spec().spawn_weight, 0.0);
    }

    #[test]
    fn test_only_decoys_cost_points() {
        for (kind, _) in default_target_weights() {
            assert_eq!(kind.spec().points < 0, kind == TargetKind::Decoy, "{kind:?}");
        }
    }

    #[test]
    fn test_duck_tuning_partial_json() {
        let t: DuckHuntTuning = serde_json::from_str(r#"{"ducks_per_round": 4}"#).unwrap();
        assert_eq!(t.ducks_per_round, 4);
        assert_eq!(t.ducks_to_pass, 6);
    }
}
