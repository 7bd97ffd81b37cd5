//! Hit-testing
//!
//! Simple circular tests against entity centres. Results are indices into
//! the slice passed in, so callers can mutate or remove in place.

use glam::Vec2;

use super::state::{PowerUp, Target};

/// Closest target whose centre lies within its hit radius of `aim`.
/// Ties keep the first target encountered.
pub fn find_closest_hit_target(aim: Vec2, targets: &[Target]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, target) in targets.iter().enumerate() {
        let dist = aim.distance(target.pos);
        if dist > target.hit_radius() {
            continue;
        }
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((i, dist));
        }
    }
    best.map(|(i, _)| i)
}

/// Every target touched by a blast of `radius` around `center`
pub fn targets_in_explosion_radius(center: Vec2, radius: f32, targets: &[Target]) -> Vec<usize> {
    targets
        .iter()
        .enumerate()
        .filter(|(_, t)| center.distance(t.pos) <= radius + t.hit_radius())
        .map(|(i, _)| i)
        .collect()
}

/// First power-up within pickup range of `aim`
pub fn find_power_up_at(aim: Vec2, power_ups: &[PowerUp]) -> Option<usize> {
    power_ups
        .iter()
        .position(|p| aim.distance(p.pos) <= p.pickup_radius())
}
