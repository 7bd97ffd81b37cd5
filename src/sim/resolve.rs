//! Shot and escape resolution
//!
//! Applies the scoring rules to the session: power-up pickup, decoy
//! penalties, damage, kills with combo multipliers, explosions, splits,
//! time freeze and shield absorption.

use glam::Vec2;

use super::collision::{find_closest_hit_target, find_power_up_at, targets_in_explosion_radius};
use super::spawn::create_split_targets;
use super::state::{
    ActivePowerUp, GameEvent, GameMode, HitEffect, HitEffectKind, Outcome, PowerUpKind,
    SessionState, SessionStatus,
};
use crate::PlayerId;
use crate::consts::*;
use crate::tuning::SPLIT_COUNT;

/// Combo at which a kill is shown as a critical hit
const CRITICAL_COMBO: u32 = 5;

/// What a single shot did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotResult {
    PowerUp(PowerUpKind),
    Decoy { penalty: i64 },
    Damaged { target_id: u32 },
    Destroyed { target_id: u32, points: i64 },
    Miss { absorbed: bool },
}

/// Points for a kill at combo `combo` (the combo including this kill)
pub fn combo_points(base: i32, combo: u32, double_points: bool) -> i64 {
    let multiplier = 1.0 + (combo.max(1) - 1) as f32 * (COMBO_MULTIPLIER - 1.0);
    let doubled = if double_points { 2.0 } else { 1.0 };
    (base as f32 * multiplier * doubled).round() as i64
}

/// Resolve one confirmed shot at `aim`
pub fn resolve_shot(
    state: &mut SessionState,
    player: PlayerId,
    aim: Vec2,
    now_ms: f64,
    events: &mut Vec<GameEvent>,
) -> ShotResult {
    // Power-ups are checked first and consume the shot
    if let Some(i) = find_power_up_at(aim, &state.power_ups) {
        let power_up = state.power_ups.remove(i);
        let owner = match state.mode {
            GameMode::Versus { .. } => Some(player),
            _ => None,
        };
        state.active_power_ups.push(ActivePowerUp {
            kind: power_up.kind,
            end_time: now_ms + power_up.duration,
            player: owner,
        });
        log::debug!("{player:?} collected {:?}", power_up.kind);
        events.push(GameEvent::PowerUpCollected {
            player,
            kind: power_up.kind,
        });
        return ShotResult::PowerUp(power_up.kind);
    }

    match find_closest_hit_target(aim, &state.targets) {
        Some(i) => resolve_target_hit(state, player, i, now_ms, events),
        None => resolve_miss(state, player, now_ms, events),
    }
}

/// Resolve a shot with spread active: the main ray plus two offset rays.
/// Offset rays only count when they hit a different, non-decoy target.
pub fn resolve_spread_shot(
    state: &mut SessionState,
    player: PlayerId,
    aim: Vec2,
    now_ms: f64,
    events: &mut Vec<GameEvent>,
) -> ShotResult {
    let main_target = find_closest_hit_target(aim, &state.targets).map(|i| state.targets[i].id);
    let result = resolve_shot(state, player, aim, now_ms, events);
    if matches!(result, ShotResult::PowerUp(_)) {
        return result;
    }

    for offset in [-SPREAD_OFFSET, SPREAD_OFFSET] {
        let ray = aim + Vec2::new(offset, 0.0);
        let Some(i) = find_closest_hit_target(ray, &state.targets) else {
            continue;
        };
        let target = &state.targets[i];
        if Some(target.id) == main_target || target.is_decoy {
            continue;
        }
        resolve_target_hit(state, player, i, now_ms, events);
    }
    result
}

/// Apply a hit on `state.targets[index]`
pub fn resolve_target_hit(
    state: &mut SessionState,
    player: PlayerId,
    index: usize,
    now_ms: f64,
    events: &mut Vec<GameEvent>,
) -> ShotResult {
    let target = &mut state.targets[index];

    if target.is_decoy {
        let penalty = target.points as i64;
        state.add_score(player, penalty);
        break_combo(state, player, events);
        events.push(GameEvent::DecoyHit { player, penalty });
        return ShotResult::Decoy { penalty };
    }

    state.player_mut(player).hits += 1;

    let target = &mut state.targets[index];
    let health = target.health.saturating_sub(1);
    if health > 0 {
        target.health = health;
        target.shield_active = false;
        let target_id = target.id;
        events.push(GameEvent::TargetDamaged {
            player,
            target_id,
            health,
        });
        return ShotResult::Damaged { target_id };
    }

    // Destroyed
    let target = state.targets.remove(index);
    let double_points = state.has_power_up(PowerUpKind::DoublePoints, Some(player), now_ms);
    let combo = {
        let stats = state.player_mut(player);
        stats.combo += 1;
        stats.best_combo = stats.best_combo.max(stats.combo);
        stats.combo
    };
    let points = combo_points(target.points, combo, double_points);
    state.add_score(player, points);
    state.kills_this_wave += 1;

    if let Some(level) = state.mode.level() {
        state.bonus_time_secs += level.special_rules.bonus_time_per_hit.max(0.0);
    }

    log::debug!(
        "{player:?} destroyed {:?} #{} for {points} (combo {combo})",
        target.kind,
        target.id
    );
    events.push(GameEvent::TargetHit {
        player,
        target_id: target.id,
        kind: target.kind,
        points,
        combo,
        pos: target.pos,
    });

    let mut effect = if target.is_boss || combo >= CRITICAL_COMBO {
        HitEffectKind::Critical
    } else {
        HitEffectKind::Normal
    };

    if let Some(radius) = target.explosion_radius {
        effect = HitEffectKind::Explosive;
        state.shake(SCREEN_SHAKE_MAX * 2.0);
        let mut victims: Vec<usize> = targets_in_explosion_radius(target.pos, radius, &state.targets)
            .into_iter()
            .filter(|&i| !state.targets[i].is_decoy)
            .collect();
        // Remove from the back so earlier indices stay valid
        victims.sort_unstable_by(|a, b| b.cmp(a));
        let destroyed = victims.len() as u32;
        for i in victims {
            let victim = state.targets.remove(i);
            state.add_score(player, victim.points as i64);
            state.kills_this_wave += 1;
            if victim.is_boss {
                log::info!("Boss caught in a blast by {player:?}");
                events.push(GameEvent::BossDefeated { player });
            }
        }
        events.push(GameEvent::Explosion {
            pos: target.pos,
            destroyed,
        });
    } else if target.split_on_destroy {
        effect = HitEffectKind::Split;
        let children = create_split_targets(&target, SPLIT_COUNT, || state.next_entity_id(), now_ms);
        events.push(GameEvent::TargetSplit {
            pos: target.pos,
            children: children.len() as u32,
        });
        state.targets.extend(children);
    }

    if target.freeze_on_hit {
        state.frozen_until = now_ms + FREEZE_DURATION_MS;
        events.push(GameEvent::TimeFrozen {
            until: state.frozen_until,
        });
    }

    if target.is_boss {
        log::info!("Boss defeated by {player:?}");
        events.push(GameEvent::BossDefeated { player });
    }

    let id = state.next_entity_id();
    state.hit_effects.push(HitEffect {
        id,
        pos: target.pos,
        points,
        kind: effect,
        time: now_ms,
    });

    ShotResult::Destroyed {
        target_id: target.id,
        points,
    }
}

fn resolve_miss(
    state: &mut SessionState,
    player: PlayerId,
    now_ms: f64,
    events: &mut Vec<GameEvent>,
) -> ShotResult {
    events.push(GameEvent::TargetMissed { player });
    if state.consume_power_up(PowerUpKind::Shield, Some(player), now_ms) {
        events.push(GameEvent::ShieldConsumed);
        return ShotResult::Miss { absorbed: true };
    }
    break_combo(state, player, events);
    ShotResult::Miss { absorbed: false }
}

fn break_combo(state: &mut SessionState, player: PlayerId, events: &mut Vec<GameEvent>) {
    let stats = state.player_mut(player);
    if stats.combo > 0 {
        events.push(GameEvent::ComboBroken {
            player,
            combo: stats.combo,
        });
    }
    stats.combo = 0;
}

/// Apply the life penalty for one tick's batch of escaped targets
pub fn apply_escape_penalty(
    state: &mut SessionState,
    escaped: u32,
    now_ms: f64,
    events: &mut Vec<GameEvent>,
) {
    if escaped == 0 {
        return;
    }

    let no_lives_loss = match &state.mode {
        GameMode::Level(level) => level.special_rules.no_lives_loss,
        GameMode::Versus { .. } => true,
        GameMode::Endless | GameMode::CoOp => false,
    };
    if no_lives_loss {
        events.push(GameEvent::TargetsEscaped {
            count: escaped,
            lives_lost: 0,
        });
        return;
    }

    // One shield absorbs the whole batch
    if state.consume_power_up(PowerUpKind::Shield, None, now_ms) {
        events.push(GameEvent::ShieldConsumed);
        events.push(GameEvent::TargetsEscaped {
            count: escaped,
            lives_lost: 0,
        });
        return;
    }

    let lost = escaped as i32 * MISSED_TARGET_PENALTY;
    state.lives = (state.lives - lost).max(0);
    events.push(GameEvent::TargetsEscaped {
        count: escaped,
        lives_lost: lost,
    });

    if state.lives == 0 {
        let outcome = match state.mode {
            GameMode::Level(_) => Outcome::LevelFailed,
            _ => Outcome::GameOver,
        };
        end_session(state, outcome, events);
    }
}

/// Move to the terminal status for `outcome` and announce it once
pub fn end_session(state: &mut SessionState, outcome: Outcome, events: &mut Vec<GameEvent>) {
    if state.status.is_finished() {
        return;
    }
    state.status = match outcome {
        Outcome::LevelComplete { .. } => SessionStatus::LevelComplete,
        Outcome::LevelFailed => SessionStatus::LevelFailed,
        Outcome::GameOver | Outcome::VersusWinner(_) | Outcome::VersusDraw => SessionStatus::GameOver,
    };
    state.outcome = Some(outcome);
    log::info!("Session ended: {outcome:?} (score {})", state.score);
    events.push(GameEvent::SessionEnded { outcome });
}
