//! Session controller and per-tick update
//!
//! Advances one session by one scheduler tick. Shots are resolved against
//! the current entities before anything moves, then timers, spawning,
//! motion, escapes and wave progression run in a fixed order.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::motion::{ghost_visibility, is_target_off_screen, shrunk_size, speed_ramp, update_target};
use super::resolve::{apply_escape_penalty, end_session, resolve_shot, resolve_spread_shot};
use super::spawn::{create_boss_target, create_power_up, create_target};
use super::state::{
    ActivePowerUp, GameEvent, GameMode, HitEffect, Outcome, PlayerStats, PowerUp, PowerUpKind,
    SessionState, SessionStatus, Target,
};
use crate::consts::*;
use crate::gesture::GestureState;
use crate::levels::builtin_level;
use crate::{PlayerId, Screen};

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Interpreter output per player slot
    pub gestures: [GestureState; 2],
    /// Settings read this tick
    pub limited_ammo: bool,
    pub screen_shake: bool,
}

/// Serializable view of a session after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub score: i64,
    pub lives: i32,
    pub wave: u32,
    pub difficulty: f32,
    pub players: Vec<PlayerStats>,
    pub max_ammo: u32,
    /// 0-1 per player while reloading
    pub reload_progress: Vec<Option<f32>>,
    pub time_remaining: Option<f32>,
    pub targets: Vec<Target>,
    pub power_ups: Vec<PowerUp>,
    pub active_power_ups: Vec<ActivePowerUp>,
    pub hit_effects: Vec<HitEffect>,
    pub screen_shake: f32,
    pub frozen: bool,
    pub outcome: Option<Outcome>,
}

/// One game session: state, its seeded RNG and pending notifications
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    rng: Pcg32,
    screen: Screen,
    events: Vec<GameEvent>,
}

impl Session {
    pub fn new(mode: GameMode, seed: u64, screen: Screen) -> Self {
        Self {
            state: SessionState::new(mode, seed),
            rng: Pcg32::seed_from_u64(seed),
            screen,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn mode(&self) -> &GameMode {
        &self.state.mode
    }

    pub fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
    }

    /// Idle -> Playing
    pub fn start(&mut self) {
        if self.state.status != SessionStatus::Idle {
            return;
        }
        self.restart();
    }

    pub fn pause(&mut self) {
        if self.state.status == SessionStatus::Playing {
            self.state.status = SessionStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state.status == SessionStatus::Paused {
            self.state.status = SessionStatus::Playing;
        }
    }

    /// Replay the same mode from scratch with the same seed
    pub fn retry(&mut self) {
        self.restart();
    }

    /// Move on after a completed level. Returns false when there is no next level.
    pub fn next_level(&mut self) -> bool {
        if self.state.status != SessionStatus::LevelComplete {
            return false;
        }
        let Some(next) = self.state.mode.level().and_then(|l| builtin_level(l.id + 1)) else {
            return false;
        };
        self.state.mode = GameMode::Level(next);
        self.restart();
        true
    }

    /// Leave the session from any state
    pub fn abandon(&mut self) {
        self.state.reset_entities();
        self.events.clear();
        log::info!("Session abandoned");
    }

    fn restart(&mut self) {
        self.state.reset_entities();
        self.state.status = SessionStatus::Playing;
        self.rng = Pcg32::seed_from_u64(self.state.seed);
        self.events.clear();
        match &self.state.mode {
            GameMode::Level(level) => log::info!("Level {} '{}' started", level.id, level.name),
            mode => log::info!("{mode:?} session started (seed {})", self.state.seed),
        }
    }

    /// Take the notifications produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self, now_ms: f64) -> SessionSnapshot {
        let state = &self.state;
        let players = state.mode.players();
        SessionSnapshot {
            status: state.status,
            score: state.score,
            lives: state.lives,
            wave: state.wave,
            difficulty: state.difficulty,
            players: players.iter().map(|p| state.player(*p).clone()).collect(),
            max_ammo: state.max_ammo,
            reload_progress: players
                .iter()
                .map(|p| {
                    state.player(*p).reload_until.map(|until| {
                        (1.0 - (until - now_ms) / RELOAD_TIME_MS).clamp(0.0, 1.0) as f32
                    })
                })
                .collect(),
            time_remaining: state.time_remaining,
            targets: state.targets.clone(),
            power_ups: state.power_ups.clone(),
            active_power_ups: state.active_power_ups.clone(),
            hit_effects: state.hit_effects.clone(),
            screen_shake: state.screen_shake,
            frozen: state.is_frozen(now_ms),
            outcome: state.outcome,
        }
    }

    /// Advance the session by one scheduler tick
    pub fn tick(&mut self, input: &TickInput, delta_ms: f64, now_ms: f64) {
        if self.state.status != SessionStatus::Playing {
            return;
        }
        self.state.elapsed_ms += delta_ms;

        // Reloads
        for &player in self.state.mode.players() {
            let gesture = &input.gestures[player.index()];
            let max_ammo = self.state.max_ammo;
            let stats = self.state.player_mut(player);
            if let Some(until) = stats.reload_until {
                if now_ms >= until {
                    stats.ammo = max_ammo;
                    stats.reload_until = None;
                    self.events.push(GameEvent::ReloadFinished { player });
                }
            } else if input.limited_ammo && gesture.is_reloading && stats.ammo < max_ammo {
                stats.reload_until = Some(now_ms + RELOAD_TIME_MS);
                self.events.push(GameEvent::ReloadStarted { player });
            }
        }

        // Shots, in player order, before anything moves
        for &player in self.state.mode.players() {
            self.fire(player, &input.gestures[player.index()], input.limited_ammo, now_ms);
        }
        if !input.screen_shake {
            self.state.screen_shake = 0.0;
        }

        if self.state.is_frozen(now_ms) {
            return;
        }

        let scale = if self.state.has_power_up(PowerUpKind::SlowMo, None, now_ms) {
            SLOWMO_SCALE as f64
        } else {
            1.0
        };
        let scaled_delta = delta_ms * scale;
        self.state.game_time_ms += scaled_delta;

        self.update_clock(now_ms);
        if self.state.status != SessionStatus::Playing {
            return;
        }

        self.spawn(now_ms);
        self.move_targets(input, scaled_delta as f32, now_ms);
        if self.state.status != SessionStatus::Playing {
            return;
        }

        self.state.decay_shake();
        self.state.prune(now_ms);
        self.advance_wave();
    }

    fn fire(&mut self, player: PlayerId, gesture: &GestureState, limited_ammo: bool, now_ms: f64) {
        if !gesture.is_shooting || !gesture.is_gun_shape {
            return;
        }
        let Some(aim) = gesture.aim_position else {
            return;
        };
        let rapid_fire = self.state.has_power_up(PowerUpKind::RapidFire, Some(player), now_ms);
        let stats = self.state.player_mut(player);
        if limited_ammo && stats.is_reloading() {
            return;
        }
        if limited_ammo && !rapid_fire {
            if stats.ammo == 0 {
                self.events.push(GameEvent::DryFire { player });
                return;
            }
            stats.ammo -= 1;
        }
        stats.shots += 1;
        self.events.push(GameEvent::ShotFired { player });
        self.state.shake(SCREEN_SHAKE_MAX);

        if self.state.has_power_up(PowerUpKind::SpreadShot, Some(player), now_ms) {
            resolve_spread_shot(&mut self.state, player, aim, now_ms, &mut self.events);
        } else {
            resolve_shot(&mut self.state, player, aim, now_ms, &mut self.events);
        }
    }

    /// Level and versus clocks, plus the level boss
    fn update_clock(&mut self, now_ms: f64) {
        let elapsed_secs = (self.state.elapsed_ms / 1000.0) as f32;
        match &self.state.mode {
            GameMode::Level(level) => {
                let remaining = (level.duration_secs + self.state.bonus_time_secs - elapsed_secs).max(0.0);
                self.state.time_remaining = Some(remaining);
                if remaining <= 0.0 {
                    let outcome = if self.state.score >= level.pass_score {
                        Outcome::LevelComplete {
                            stars: level.stars(self.state.score),
                        }
                    } else {
                        Outcome::LevelFailed
                    };
                    end_session(&mut self.state, outcome, &mut self.events);
                    return;
                }

                if level.special_rules.has_boss
                    && !self.state.boss_spawned
                    && remaining < BOSS_SPAWN_REMAINING_SECS
                {
                    let id = self.state.next_entity_id();
                    self.state.targets.push(create_boss_target(id, self.screen, now_ms));
                    self.state.boss_spawned = true;
                    log::info!("Boss incoming with {remaining:.1}s left");
                    self.events.push(GameEvent::BossSpawned);
                }
            }
            GameMode::Versus { duration_secs } => {
                let remaining = (duration_secs - elapsed_secs).max(0.0);
                self.state.time_remaining = Some(remaining);
                if remaining <= 0.0 {
                    let [one, two] = [&self.state.players[0], &self.state.players[1]].map(|p| p.score);
                    let outcome = match one.cmp(&two) {
                        std::cmp::Ordering::Greater => Outcome::VersusWinner(PlayerId::One),
                        std::cmp::Ordering::Less => Outcome::VersusWinner(PlayerId::Two),
                        std::cmp::Ordering::Equal => Outcome::VersusDraw,
                    };
                    end_session(&mut self.state, outcome, &mut self.events);
                }
            }
            GameMode::Endless | GameMode::CoOp => {}
        }
    }

    /// Target and power-up spawners, on independent scaled-time timers
    fn spawn(&mut self, now_ms: f64) {
        let game_time = self.state.game_time_ms;
        let (interval, max_targets, difficulty) = match self.state.mode.level() {
            Some(level) => (level.spawn_interval_ms, level.max_targets, level.difficulty),
            None => (
                SPAWN_INTERVAL_MS / (1.0 + self.state.difficulty as f64 * 0.2),
                MAX_TARGETS,
                self.state.difficulty,
            ),
        };

        if game_time - self.state.last_target_spawn >= interval && self.state.targets.len() < max_targets {
            let id = self.state.next_entity_id();
            let target = create_target(
                &mut self.rng,
                id,
                self.screen,
                difficulty,
                self.state.mode.level(),
                now_ms,
            );
            self.state.targets.push(target);
            self.state.last_target_spawn = game_time;
        }

        let power_up_interval = self
            .state
            .mode
            .level()
            .and_then(|l| l.special_rules.power_up_frequency)
            .unwrap_or(POWERUP_SPAWN_INTERVAL_MS);
        if game_time - self.state.last_power_up_spawn >= power_up_interval
            && self.state.power_ups.len() < MAX_POWERUPS
        {
            let id = self.state.next_entity_id();
            let power_up = create_power_up(&mut self.rng, id, self.screen, now_ms);
            log::debug!("Power-up {:?} spawned", power_up.kind);
            self.state.power_ups.push(power_up);
            self.state.last_power_up_spawn = game_time;
        }
    }

    fn move_targets(&mut self, input: &TickInput, delta_ms: f32, now_ms: f64) {
        let rules = self.state.mode.level().map(|l| l.special_rules.clone()).unwrap_or_default();
        let ramp = match self.state.mode.level() {
            Some(level) if rules.speed_ramp && level.duration_secs > 0.0 => {
                speed_ramp((self.state.elapsed_ms / 1000.0) as f32 / level.duration_secs)
            }
            _ => 1.0,
        };
        let magnet = self.magnet_point(input, now_ms);
        let game_time = self.state.game_time_ms;

        let mut escaped = 0;
        let targets = std::mem::take(&mut self.state.targets);
        for target in targets {
            let mut moving = target.clone();
            moving.speed *= ramp;
            let mut moved = update_target(&moving, delta_ms, game_time, magnet, self.screen, &mut self.rng);
            // Ramp applies to this step only
            moved.speed = target.speed;

            let age = now_ms - target.spawn_time;
            if rules.shrinking_targets && !moved.is_boss {
                moved.size = shrunk_size(moved.base_size, age);
            }
            if rules.invisible_targets && !moved.is_boss {
                moved.visibility = ghost_visibility(age);
            }

            if is_target_off_screen(&moved, self.screen) {
                escaped += 1;
            } else {
                self.state.targets.push(moved);
            }
        }

        apply_escape_penalty(&mut self.state, escaped, now_ms, &mut self.events);
    }

    /// Aim of the first player holding a magnet
    fn magnet_point(&self, input: &TickInput, now_ms: f64) -> Option<Vec2> {
        self.state
            .mode
            .players()
            .iter()
            .filter(|p| self.state.has_power_up(PowerUpKind::Magnet, Some(**p), now_ms))
            .find_map(|p| input.gestures[p.index()].aim_position)
    }

    /// Endless waves: every WAVE_TARGET_COUNT kills raises the difficulty
    fn advance_wave(&mut self) {
        if !matches!(self.state.mode, GameMode::Endless | GameMode::CoOp) {
            return;
        }
        if self.state.kills_this_wave < WAVE_TARGET_COUNT {
            return;
        }
        self.state.kills_this_wave -= WAVE_TARGET_COUNT;
        self.state.wave += 1;
        self.state.difficulty = (self.state.wave as f32 * DIFFICULTY_INCREASE_RATE).min(MAX_DIFFICULTY);
        log::info!("Wave {} (difficulty {:.1})", self.state.wave, self.state.difficulty);
        self.events.push(GameEvent::WaveAdvanced { wave: self.state.wave });
    }
}
