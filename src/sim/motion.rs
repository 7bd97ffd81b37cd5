//! Per-tick target motion
//!
//! Speeds are pixels per reference frame (60 Hz); every update scales by
//! `delta / REFERENCE_FRAME_MS` so a variable tick delta moves targets the
//! same distance per second.

use glam::Vec2;
use rand::Rng;

use super::state::{MovementPattern, Target};
use crate::Screen;
use crate::consts::*;
use crate::tuning::{BOSS_HOVER_Y, BOSS_SIDE_MARGIN};

/// Sine pattern: perpendicular wobble
const SINE_FREQUENCY: f64 = 0.005;
const SINE_AMPLITUDE: f32 = 3.0;
/// Random pattern: per-tick chance of a heading change, and its max half-angle
const RANDOM_TURN_CHANCE: f32 = 0.02;
const RANDOM_TURN_MAX: f32 = 0.25;
/// Static pattern: stop this close to the centre
const STATIC_STOP_RADIUS: f32 = 100.0;
/// Orbit pattern
const ORBIT_FREQUENCY: f64 = 0.002;
const ORBIT_STEP: f32 = 2.0;
const ORBIT_DRIFT: f32 = 0.5;
/// Zigzag pattern: flip vertical heading when the phase wave crosses this
const ZIGZAG_FREQUENCY: f64 = 0.01;
const ZIGZAG_THRESHOLD: f32 = 0.9;
/// Boss horizontal sweep
const BOSS_SWEEP_FREQUENCY: f64 = 0.002;
const BOSS_SWEEP_SPEED_MULT: f32 = 2.0;

/// Advance one target. Returns the moved copy; the input is untouched.
pub fn update_target<R: Rng>(
    target: &Target,
    delta_ms: f32,
    time_ms: f64,
    magnet: Option<Vec2>,
    screen: Screen,
    rng: &mut R,
) -> Target {
    let dt = delta_ms / REFERENCE_FRAME_MS;
    let mut pos = target.pos;
    let mut direction = target.direction;

    if let Some(magnet) = magnet {
        let to_magnet = magnet - pos;
        let dist = to_magnet.length();
        if dist > 0.0 && dist < MAGNET_RANGE {
            let pull = (1.0 - dist / MAGNET_RANGE) * MAGNET_STRENGTH;
            pos += to_magnet / dist * pull * dt;
        }
    }

    let step = target.speed * dt;
    match target.movement {
        MovementPattern::Linear => {
            pos += direction * step;
        }
        MovementPattern::Sine => {
            pos += direction * step;
            let wave = ((time_ms * SINE_FREQUENCY) as f32 + target.phase).sin();
            pos += direction.perp() * wave * SINE_AMPLITUDE * dt;
        }
        MovementPattern::Random => {
            if rng.random::<f32>() < RANDOM_TURN_CHANCE {
                let turn = (rng.random::<f32>() - 0.5) * 2.0 * RANDOM_TURN_MAX;
                direction = Vec2::from_angle(turn).rotate(direction);
            }
            pos += direction * step;
        }
        MovementPattern::Static => {
            if pos.distance(screen.center()) > STATIC_STOP_RADIUS {
                pos += direction * step;
            }
        }
        MovementPattern::Orbit => {
            let angle = target.phase + (time_ms * ORBIT_FREQUENCY) as f32;
            pos += Vec2::from_angle(angle) * ORBIT_STEP * dt;
            pos += direction * step * ORBIT_DRIFT;
        }
        MovementPattern::Zigzag => {
            pos += direction * step;
            if ((time_ms * ZIGZAG_FREQUENCY) as f32 + target.phase).sin() > ZIGZAG_THRESHOLD {
                direction.y = -direction.y;
            }
        }
    }

    // Bosses hover near the top and sweep side to side
    if target.is_boss && pos.y > BOSS_HOVER_Y {
        pos.y = BOSS_HOVER_Y;
        let sweep = if ((time_ms * BOSS_SWEEP_FREQUENCY) as f32).sin() > 0.0 {
            1.0
        } else {
            -1.0
        };
        direction = Vec2::new(sweep, 0.0);
        pos.x += direction.x * target.speed * BOSS_SWEEP_SPEED_MULT * dt;

        if pos.x < BOSS_SIDE_MARGIN {
            pos.x = BOSS_SIDE_MARGIN;
            direction = Vec2::X;
        } else if pos.x > screen.width - BOSS_SIDE_MARGIN {
            pos.x = screen.width - BOSS_SIDE_MARGIN;
            direction = Vec2::NEG_X;
        }
    }

    Target {
        pos,
        direction,
        ..target.clone()
    }
}

/// Whether a target has left the play field. Bosses never escape.
pub fn is_target_off_screen(target: &Target, screen: Screen) -> bool {
    if target.is_boss {
        return false;
    }
    let margin = target.size * 2.0;
    target.pos.x < -margin
        || target.pos.x > screen.width + margin
        || target.pos.y < -margin
        || target.pos.y > screen.height + margin
}

/// Ghost-level opacity, pulsing between 0.3 and 1.0 with target age
pub fn ghost_visibility(age_ms: f64) -> f32 {
    0.3 + 0.7 * ((age_ms / 800.0) as f32).sin().abs()
}

/// Size of a shrinking target at a given age
pub fn shrunk_size(base_size: f32, age_ms: f64) -> f32 {
    let progress = (age_ms / SHRINK_DURATION_MS).clamp(0.0, 1.0) as f32;
    (base_size * (1.0 - SHRINK_AMOUNT * progress)).max(MIN_TARGET_SIZE)
}

/// Speed factor for ramping levels
pub fn speed_ramp(progress: f32) -> f32 {
    (1.0 + progress.max(0.0) * 1.5).min(SPEED_RAMP_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawn::{create_boss_target, create_target_of_kind};
    use crate::sim::state::TargetKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    fn target_at(pos: Vec2, movement: MovementPattern) -> Target {
        let mut t = create_target_of_kind(&mut rng(), 1, TargetKind::Normal, Screen::default(), 0.0, None, 0.0);
        t.pos = pos;
        t.size = 40.0;
        t.direction = Vec2::X;
        t.speed = 2.0;
        t.movement = movement;
        t
    }

    #[test]
    fn test_linear_scales_with_delta() {
        let t = target_at(Vec2::new(100.0, 100.0), MovementPattern::Linear);
        let one = update_target(&t, REFERENCE_FRAME_MS, 0.0, None, Screen::default(), &mut rng());
        let two = update_target(&t, REFERENCE_FRAME_MS * 2.0, 0.0, None, Screen::default(), &mut rng());
        assert!((one.pos.x - 102.0).abs() < 1e-4);
        assert!((two.pos.x - 104.0).abs() < 1e-4);
        // Input untouched
        assert_eq!(t.pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_magnet_pulls_inside_range_only() {
        let mut t = target_at(Vec2::new(100.0, 100.0), MovementPattern::Static);
        t.speed = 0.0;
        let screen = Screen::default();
        let near = update_target(&t, REFERENCE_FRAME_MS, 0.0, Some(Vec2::new(200.0, 100.0)), screen, &mut rng());
        assert!(near.pos.x > 100.0);
        let far = update_target(&t, REFERENCE_FRAME_MS, 0.0, Some(Vec2::new(400.0, 100.0)), screen, &mut rng());
        assert_eq!(far.pos, t.pos);
    }

    #[test]
    fn test_static_stops_near_center() {
        let screen = Screen::new(800.0, 600.0);
        let t = target_at(screen.center() + Vec2::new(50.0, 0.0), MovementPattern::Static);
        let moved = update_target(&t, REFERENCE_FRAME_MS, 0.0, None, screen, &mut rng());
        assert_eq!(moved.pos, t.pos);
    }

    #[test]
    fn test_random_keeps_unit_direction() {
        let mut t = target_at(Vec2::new(400.0, 300.0), MovementPattern::Random);
        let mut rng = rng();
        for i in 0..1000 {
            t = update_target(&t, REFERENCE_FRAME_MS, i as f64 * 16.0, None, Screen::default(), &mut rng);
            assert!((t.direction.length() - 1.0).abs() < 1e-3);
        }
        assert_ne!(t.direction, Vec2::X);
    }

    #[test]
    fn test_boss_hovers_and_bounces() {
        let screen = Screen::new(800.0, 600.0);
        let mut boss = create_boss_target(1, screen, 0.0);
        let mut rng = rng();
        for i in 0..5000 {
            boss = update_target(&boss, REFERENCE_FRAME_MS, i as f64 * 16.67, None, screen, &mut rng);
            assert!(!is_target_off_screen(&boss, screen));
        }
        assert_eq!(boss.pos.y, BOSS_HOVER_Y);
        assert!(boss.pos.x >= BOSS_SIDE_MARGIN && boss.pos.x <= screen.width - BOSS_SIDE_MARGIN);
    }

    #[test]
    fn test_off_screen_margin() {
        let screen = Screen::new(800.0, 600.0);
        // margin = 2 * 40 = 80
        let inside = target_at(Vec2::new(-80.0, 300.0), MovementPattern::Linear);
        assert!(!is_target_off_screen(&inside, screen));
        let mut outside = inside.clone();
        outside.pos.x -= 1.0;
        assert!(is_target_off_screen(&outside, screen));
        outside.pos = Vec2::new(300.0, 600.0 + 81.0);
        assert!(is_target_off_screen(&outside, screen));

        let mut boss = create_boss_target(2, screen, 0.0);
        boss.pos = Vec2::new(-10_000.0, 10_000.0);
        assert!(!is_target_off_screen(&boss, screen));
    }

    #[test]
    fn test_shrink_and_ramp() {
        assert_eq!(shrunk_size(60.0, 0.0), 60.0);
        assert!((shrunk_size(60.0, 4000.0) - 60.0 * 0.65).abs() < 1e-4);
        assert_eq!(shrunk_size(40.0, 1e9), MIN_TARGET_SIZE);
        assert_eq!(speed_ramp(0.0), 1.0);
        assert_eq!(speed_ramp(0.5), 1.75);
        assert_eq!(speed_ramp(5.0), SPEED_RAMP_MAX);
    }

    #[test]
    fn test_ghost_visibility_bounds() {
        for i in 0..200 {
            let v = ghost_visibility(i as f64 * 37.0);
            assert!((0.3..=1.0).contains(&v));
        }
    }
}
