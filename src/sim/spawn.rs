//! Entity factories
//!
//! All randomness comes from the session's seeded RNG, so the same seed and
//! inputs produce the same spawns.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::duck::{Duck, DuckColor, DuckState};
use super::state::{MovementPattern, PowerUp, PowerUpKind, Target, TargetKind};
use crate::Screen;
use crate::consts::*;
use crate::levels::{self, LevelConfig};
use crate::tuning::{self, DuckHuntTuning};

/// Weighted random draw. Weights are summed, a uniform value in
/// `[0, total)` is drawn and weights are subtracted in order until it goes
/// non-positive. Empty, zero or non-finite tables yield `fallback`.
pub fn weighted_pick<R: Rng, T: Copy>(rng: &mut R, entries: &[(T, f32)], fallback: T) -> T {
    let total: f32 = entries.iter().map(|(_, w)| w.max(0.0)).sum();
    if !total.is_finite() || total <= 0.0 {
        return fallback;
    }

    let mut remaining = rng.random::<f32>() * total;
    for &(item, weight) in entries {
        let weight = weight.max(0.0);
        if weight == 0.0 {
            continue;
        }
        remaining -= weight;
        if remaining <= 0.0 {
            return item;
        }
    }
    fallback
}

/// Spawn a target at a random screen edge, heading inward
pub fn create_target<R: Rng>(
    rng: &mut R,
    id: u32,
    screen: Screen,
    difficulty: f32,
    level: Option<&LevelConfig>,
    now_ms: f64,
) -> Target {
    let kind = weighted_pick(rng, &levels::effective_target_weights(level), TargetKind::Normal);
    create_target_of_kind(rng, id, kind, screen, difficulty, level, now_ms)
}

/// Spawn a target of a given kind (level scripting, tests)
pub fn create_target_of_kind<R: Rng>(
    rng: &mut R,
    id: u32,
    kind: TargetKind,
    screen: Screen,
    difficulty: f32,
    level: Option<&LevelConfig>,
    now_ms: f64,
) -> Target {
    let spec = kind.spec();
    let movement = weighted_pick(rng, &levels::effective_movement_weights(level), MovementPattern::Linear);

    let base = rng.random_range(TARGET_MIN_SIZE..TARGET_MAX_SIZE);
    let size = (base * spec.size_mult * (1.0 - difficulty * 0.1)).max(MIN_TARGET_SIZE);
    let speed = TARGET_BASE_SPEED * spec.speed_mult * (1.0 + difficulty * DIFFICULTY_INCREASE_RATE);

    // Perpendicular jitter keeps targets from all travelling in one line
    let jitter = (rng.random::<f32>() - 0.5) * 2.0;
    let (pos, direction) = match rng.random_range(0..4) {
        0 => (
            Vec2::new(rng.random::<f32>() * screen.width, -size),
            Vec2::new(jitter, 1.0),
        ),
        1 => (
            Vec2::new(screen.width + size, rng.random::<f32>() * screen.height),
            Vec2::new(-1.0, jitter),
        ),
        2 => (
            Vec2::new(rng.random::<f32>() * screen.width, screen.height + size),
            Vec2::new(jitter, -1.0),
        ),
        _ => (
            Vec2::new(-size, rng.random::<f32>() * screen.height),
            Vec2::new(1.0, jitter),
        ),
    };

    let mut target = Target {
        id,
        pos,
        size,
        base_size: size,
        speed,
        direction: direction.normalize(),
        kind,
        health: spec.health,
        max_health: spec.health,
        points: spec.points,
        movement,
        phase: rng.random::<f32>() * TAU,
        spawn_time: now_ms,
        visibility: 1.0,
        explosion_radius: None,
        split_on_destroy: false,
        shield_active: false,
        is_decoy: false,
        freeze_on_hit: false,
        is_boss: false,
        boss_phase: 0,
    };

    match kind {
        TargetKind::Explosive => target.explosion_radius = Some(tuning::EXPLOSION_RADIUS),
        TargetKind::Split => target.split_on_destroy = true,
        TargetKind::Shield => target.shield_active = true,
        TargetKind::Decoy => target.is_decoy = true,
        TargetKind::TimeFreeze => target.freeze_on_hit = true,
        TargetKind::Boss => {
            target.is_boss = true;
            target.boss_phase = 1;
        }
        TargetKind::Normal
        | TargetKind::Fast
        | TargetKind::Small
        | TargetKind::Bonus
        | TargetKind::Ufo
        | TargetKind::Alien
        | TargetKind::Meteor
        | TargetKind::Planet => {}
    }

    target
}

/// The level boss: large, slow, tough, entering from top centre
pub fn create_boss_target(id: u32, screen: Screen, now_ms: f64) -> Target {
    let spec = TargetKind::Boss.spec();
    Target {
        id,
        pos: Vec2::new(screen.width / 2.0, -tuning::BOSS_SIZE),
        size: tuning::BOSS_SIZE,
        base_size: tuning::BOSS_SIZE,
        speed: TARGET_BASE_SPEED * spec.speed_mult,
        direction: Vec2::Y,
        kind: TargetKind::Boss,
        health: spec.health,
        max_health: spec.health,
        points: spec.points,
        movement: MovementPattern::Sine,
        phase: 0.0,
        spawn_time: now_ms,
        visibility: 1.0,
        explosion_radius: None,
        split_on_destroy: false,
        shield_active: false,
        is_decoy: false,
        freeze_on_hit: false,
        is_boss: true,
        boss_phase: 1,
    }
}

/// Fan-out children of a destroyed split target. Children are plain small
/// targets and never split again.
pub fn create_split_targets(
    parent: &Target,
    count: usize,
    mut next_id: impl FnMut() -> u32,
    now_ms: f64,
) -> Vec<Target> {
    let step = TAU / count.max(1) as f32;
    let size = (parent.size * 0.5).max(MIN_TARGET_SIZE);
    (0..count)
        .map(|i| {
            let angle = step * i as f32;
            Target {
                id: next_id(),
                pos: parent.pos,
                size,
                base_size: size,
                speed: parent.speed * tuning::SPLIT_CHILD_SPEED_MULT,
                direction: Vec2::from_angle(angle),
                kind: TargetKind::Small,
                health: 1,
                max_health: 1,
                points: tuning::SPLIT_CHILD_POINTS,
                movement: MovementPattern::Linear,
                phase: 0.0,
                spawn_time: now_ms,
                visibility: 1.0,
                explosion_radius: None,
                split_on_destroy: false,
                shield_active: false,
                is_decoy: false,
                freeze_on_hit: false,
                is_boss: false,
                boss_phase: 0,
            }
        })
        .collect()
}

/// Power-up of a uniformly drawn kind, away from the edges
pub fn create_power_up<R: Rng>(rng: &mut R, id: u32, screen: Screen, now_ms: f64) -> PowerUp {
    let kind = PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())];
    let margin = 100.0;
    let span = Vec2::new(
        (screen.width - margin * 2.0).max(0.0),
        (screen.height - margin * 2.0).max(0.0),
    );
    PowerUp {
        id,
        kind,
        pos: Vec2::new(
            margin + rng.random::<f32>() * span.x,
            margin + rng.random::<f32>() * span.y,
        ),
        size: POWERUP_SIZE,
        spawn_time: now_ms,
        duration: kind.duration_ms(),
    }
}

/// Launch a duck from the bottom of the play area, upward within ±30°
pub fn create_duck<R: Rng>(
    rng: &mut R,
    id: u32,
    screen: Screen,
    round: u32,
    tuning: &DuckHuntTuning,
    now_ms: f64,
) -> Duck {
    const COLORS: [DuckColor; 5] = [
        DuckColor::Black,
        DuckColor::Black,
        DuckColor::Black,
        DuckColor::Blue,
        DuckColor::Red,
    ];
    let color = COLORS[rng.random_range(0..COLORS.len())];
    let speed = tuning.base_speed + round.saturating_sub(1) as f32 * tuning.speed_per_round;

    let play_height = screen.height * tuning.play_area_fraction;
    let x = rng.random::<f32>() * (screen.width - 100.0).max(0.0) + 50.0;
    let angle = -PI / 2.0 + (rng.random::<f32>() - 0.5) * (PI / 3.0);

    Duck {
        id,
        pos: Vec2::new(x, play_height),
        vel: Vec2::from_angle(angle) * speed,
        state: DuckState::Flying,
        color,
        points: match color {
            DuckColor::Black => tuning.points_standard,
            DuckColor::Blue => tuning.points_bonus,
            DuckColor::Red => tuning.points_special,
        },
        spawn_time: now_ms,
        fall_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(12345)
    }

    #[test]
    fn test_weighted_distribution() {
        let mut rng = rng();
        let table = [('a', 90.0), ('b', 10.0)];
        let n = 20_000;
        let a = (0..n).filter(|_| weighted_pick(&mut rng, &table, 'z') == 'a').count();
        let freq = a as f64 / n as f64;
        assert!((freq - 0.90).abs() < 0.02, "freq = {freq}");
    }

    #[test]
    fn test_weighted_fallbacks() {
        let mut rng = rng();
        let empty: [(char, f32); 0] = [];
        assert_eq!(weighted_pick(&mut rng, &empty, 'f'), 'f');
        assert_eq!(weighted_pick(&mut rng, &[('a', 0.0), ('b', 0.0)], 'f'), 'f');
        assert_eq!(weighted_pick(&mut rng, &[('a', f32::INFINITY)], 'f'), 'f');
        assert_eq!(weighted_pick(&mut rng, &[('a', -5.0)], 'f'), 'f');
    }

    #[test]
    fn test_zero_weight_never_drawn() {
        let mut rng = rng();
        let table = [('a', 0.0), ('b', 1.0)];
        for _ in 0..1000 {
            assert_eq!(weighted_pick(&mut rng, &table, 'f'), 'b');
        }
    }

    proptest! {
        #[test]
        fn prop_weighted_pick_returns_positive_entry(
            seed in any::<u64>(),
            weights in prop::collection::vec(0.0f32..100.0, 1..10),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let table: Vec<(usize, f32)> = weights.iter().copied().enumerate().collect();
            let picked = weighted_pick(&mut rng, &table, usize::MAX);
            if weights.iter().sum::<f32>() > 0.0 {
                prop_assert!(picked != usize::MAX);
                prop_assert!(weights[picked] > 0.0);
            } else {
                prop_assert_eq!(picked, usize::MAX);
            }
        }
    }

    #[test]
    fn test_create_target_invariants() {
        let mut rng = rng();
        let screen = Screen::new(800.0, 600.0);
        for i in 0..500 {
            let t = create_target(&mut rng, i, screen, 5.0, None, 0.0);
            assert!(t.size >= MIN_TARGET_SIZE);
            assert!((t.direction.length() - 1.0).abs() < 1e-4);
            assert_eq!(t.health, t.max_health);
            assert_ne!(t.kind, TargetKind::Boss);
            // Starts beyond an edge, heading back across it
            if t.pos.y < 0.0 {
                assert!(t.direction.y > 0.0);
            } else if t.pos.y > screen.height {
                assert!(t.direction.y < 0.0);
            } else if t.pos.x < 0.0 {
                assert!(t.direction.x > 0.0);
            } else {
                assert!(t.pos.x > screen.width);
                assert!(t.direction.x < 0.0);
            }
            assert_eq!(t.is_decoy, t.kind == TargetKind::Decoy);
            assert_eq!(t.explosion_radius.is_some(), t.kind == TargetKind::Explosive);
        }
    }

    #[test]
    fn test_difficulty_scales_speed() {
        let screen = Screen::default();
        let easy = create_target_of_kind(&mut rng(), 1, TargetKind::Normal, screen, 0.0, None, 0.0);
        let hard = create_target_of_kind(&mut rng(), 1, TargetKind::Normal, screen, 3.0, None, 0.0);
        assert!((easy.speed - TARGET_BASE_SPEED).abs() < 1e-6);
        assert!(hard.speed > easy.speed);
        assert!(hard.size < easy.size);
    }

    #[test]
    fn test_boss() {
        let boss = create_boss_target(1, Screen::new(1000.0, 800.0), 0.0);
        assert!(boss.is_boss);
        assert_eq!(boss.size, 150.0);
        assert_eq!(boss.health, 20);
        assert_eq!(boss.pos, Vec2::new(500.0, -150.0));
        assert_eq!(boss.movement, MovementPattern::Sine);
    }

    #[test]
    fn test_split_children() {
        let mut rng = rng();
        let parent = create_target_of_kind(&mut rng, 1, TargetKind::Split, Screen::default(), 0.0, None, 0.0);
        let mut next = 10;
        let children = create_split_targets(&parent, 3, || {
            next += 1;
            next
        }, 100.0);
        assert_eq!(children.len(), 3);
        for c in &children {
            assert_eq!(c.kind, TargetKind::Small);
            assert!(!c.split_on_destroy);
            assert_eq!(c.pos, parent.pos);
            assert!((c.speed - parent.speed * 1.5).abs() < 1e-5);
            assert_eq!(c.points, 50);
        }
        // Radially diverging
        let sum: Vec2 = children.iter().map(|c| c.direction).sum();
        assert!(sum.length() < 1e-4);
        let ids: Vec<u32> = children.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![11, 12, 13]);
    }

    #[test]
    fn test_power_up_inside_margin() {
        let mut rng = rng();
        let screen = Screen::new(800.0, 600.0);
        for i in 0..100 {
            let p = create_power_up(&mut rng, i, screen, 0.0);
            assert!(p.pos.x >= 100.0 && p.pos.x <= 700.0);
            assert!(p.pos.y >= 100.0 && p.pos.y <= 500.0);
            assert_eq!(p.duration, p.kind.duration_ms());
        }
    }

    #[test]
    fn test_duck_launch() {
        let mut rng = rng();
        let tuning = DuckHuntTuning::default();
        let screen = Screen::new(800.0, 600.0);
        for round in 1..5 {
            let duck = create_duck(&mut rng, 1, screen, round, &tuning, 0.0);
            assert!(duck.vel.y < 0.0, "ducks launch upward");
            let expected = tuning.base_speed + (round - 1) as f32 * tuning.speed_per_round;
            assert!((duck.vel.length() - expected).abs() < 1e-4);
            assert_eq!(duck.state, DuckState::Flying);
        }
    }
}
