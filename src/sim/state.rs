//! Session state and core simulation types
//!
//! Everything a running session owns lives here. Entity collections hold the
//! only copy of each entity; ids come from one per-session counter.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::PlayerId;
use crate::consts::*;
use crate::levels::LevelConfig;

/// Target kinds. Behaviour dispatches on this with exhaustive matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Normal,
    Fast,
    Small,
    Bonus,
    Ufo,
    Alien,
    Meteor,
    Planet,
    Explosive,
    Split,
    Shield,
    Decoy,
    TimeFreeze,
    Boss,
}

impl TargetKind {
    /// Every kind that can come out of a weighted spawn draw
    pub const SPAWNABLE: [TargetKind; 13] = [
        TargetKind::Normal,
        TargetKind::Fast,
        TargetKind::Small,
        TargetKind::Bonus,
        TargetKind::Ufo,
        TargetKind::Alien,
        TargetKind::Meteor,
        TargetKind::Planet,
        TargetKind::Explosive,
        TargetKind::Split,
        TargetKind::Shield,
        TargetKind::Decoy,
        TargetKind::TimeFreeze,
    ];
}

/// Movement patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementPattern {
    Linear,
    Sine,
    Random,
    Static,
    Orbit,
    Zigzag,
}

impl MovementPattern {
    pub const ALL: [MovementPattern; 6] = [
        MovementPattern::Linear,
        MovementPattern::Sine,
        MovementPattern::Random,
        MovementPattern::Static,
        MovementPattern::Orbit,
        MovementPattern::Zigzag,
    ];
}

/// A shootable target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    pub pos: Vec2,
    /// Current diameter (shrinking targets lose size over time)
    pub size: f32,
    /// Diameter at spawn
    pub base_size: f32,
    /// Pixels per reference frame
    pub speed: f32,
    /// Unit vector
    pub direction: Vec2,
    pub kind: TargetKind,
    pub health: u32,
    pub max_health: u32,
    pub points: i32,
    pub movement: MovementPattern,
    /// Per-entity phase offset so patterns desynchronize
    pub phase: f32,
    pub spawn_time: f64,
    /// 0-1 opacity for ghost levels
    pub visibility: f32,
    pub explosion_radius: Option<f32>,
    pub split_on_destroy: bool,
    pub shield_active: bool,
    pub is_decoy: bool,
    pub freeze_on_hit: bool,
    pub is_boss: bool,
    pub boss_phase: u32,
}

impl Target {
    /// Radius used by the hit-test
    #[inline]
    pub fn hit_radius(&self) -> f32 {
        self.size / 2.0
    }
}

/// Power-up kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    SlowMo,
    RapidFire,
    SpreadShot,
    Magnet,
    Shield,
    DoublePoints,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 6] = [
        PowerUpKind::SlowMo,
        PowerUpKind::RapidFire,
        PowerUpKind::SpreadShot,
        PowerUpKind::Magnet,
        PowerUpKind::Shield,
        PowerUpKind::DoublePoints,
    ];
}

/// A collectible power-up floating on the field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub size: f32,
    pub spawn_time: f64,
    /// Effect duration once collected (ms)
    pub duration: f64,
}

impl PowerUp {
    /// Uncollected power-ups vanish after a fixed lifetime
    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms - self.spawn_time > POWERUP_LIFETIME_MS
    }

    pub fn pickup_radius(&self) -> f32 {
        self.size / 2.0 + POWERUP_PICKUP_GRACE
    }
}

/// A collected, running power-up effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    pub end_time: f64,
    /// Owner in versus mode; `None` applies to everyone
    pub player: Option<PlayerId>,
}

impl ActivePowerUp {
    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms >= self.end_time
    }

    fn applies_to(&self, player: Option<PlayerId>) -> bool {
        match (self.player, player) {
            (Some(owner), Some(p)) => owner == p,
            _ => true,
        }
    }
}

/// Visual style of a hit effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitEffectKind {
    Normal,
    Explosive,
    Split,
    Critical,
}

/// Short-lived hit marker for the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitEffect {
    pub id: u32,
    pub pos: Vec2,
    pub points: i64,
    pub kind: HitEffectKind,
    pub time: f64,
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Idle,
    Playing,
    Paused,
    GameOver,
    LevelComplete,
    LevelFailed,
}

impl SessionStatus {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            SessionStatus::GameOver | SessionStatus::LevelComplete | SessionStatus::LevelFailed
        )
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    GameOver,
    LevelComplete { stars: u8 },
    LevelFailed,
    VersusWinner(PlayerId),
    VersusDraw,
}

/// Which game is being played
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameMode {
    Endless,
    Level(LevelConfig),
    /// Two players, shared lives and score
    CoOp,
    /// Two players on a timer, individual scores
    Versus { duration_secs: f32 },
}

impl GameMode {
    pub fn level(&self) -> Option<&LevelConfig> {
        match self {
            GameMode::Level(config) => Some(config),
            _ => None,
        }
    }

    pub fn player_count(&self) -> usize {
        match self {
            GameMode::CoOp | GameMode::Versus { .. } => 2,
            GameMode::Endless | GameMode::Level(_) => 1,
        }
    }

    pub fn players(&self) -> &'static [PlayerId] {
        &PlayerId::ALL[..self.player_count()]
    }
}

/// Per-player counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub score: i64,
    pub combo: u32,
    pub best_combo: u32,
    pub shots: u32,
    pub hits: u32,
    pub ammo: u32,
    /// Reload completes at this wall time
    pub reload_until: Option<f64>,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            score: 0,
            combo: 0,
            best_combo: 0,
            shots: 0,
            hits: 0,
            ammo: MAX_AMMO,
            reload_until: None,
        }
    }
}

impl PlayerStats {
    /// Hit ratio in [0, 1]
    pub fn accuracy(&self) -> f32 {
        if self.shots == 0 {
            0.0
        } else {
            self.hits as f32 / self.shots as f32
        }
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_until.is_some()
    }
}

/// One-shot notifications for audio, achievements and presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ShotFired { player: PlayerId },
    /// Trigger pulled with an empty magazine
    DryFire { player: PlayerId },
    TargetHit {
        player: PlayerId,
        target_id: u32,
        kind: TargetKind,
        points: i64,
        combo: u32,
        pos: Vec2,
    },
    TargetDamaged { player: PlayerId, target_id: u32, health: u32 },
    TargetMissed { player: PlayerId },
    DecoyHit { player: PlayerId, penalty: i64 },
    ComboBroken { player: PlayerId, combo: u32 },
    Explosion { pos: Vec2, destroyed: u32 },
    TargetSplit { pos: Vec2, children: u32 },
    TimeFrozen { until: f64 },
    PowerUpCollected { player: PlayerId, kind: PowerUpKind },
    ShieldConsumed,
    TargetsEscaped { count: u32, lives_lost: i32 },
    WaveAdvanced { wave: u32 },
    BossSpawned,
    BossDefeated { player: PlayerId },
    ReloadStarted { player: PlayerId },
    ReloadFinished { player: PlayerId },
    SessionEnded { outcome: Outcome },
    DuckHit { points: i64 },
    DuckEscaped,
    RoundComplete { round: u32, perfect: bool },
    RoundFailed { round: u32 },
}

/// Complete state of one running session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub seed: u64,
    pub status: SessionStatus,
    pub mode: GameMode,
    /// Combined score (sum of players in co-op, player One otherwise)
    pub score: i64,
    pub lives: i32,
    pub wave: u32,
    pub difficulty: f32,
    pub kills_this_wave: u32,
    pub players: [PlayerStats; 2],
    pub max_ammo: u32,
    /// Seconds left on a level or versus clock
    pub time_remaining: Option<f32>,
    pub bonus_time_secs: f32,
    /// Unscaled session time (ms), drives the clock and speed ramp
    pub elapsed_ms: f64,
    /// Scaled game time (ms), drives spawn timers and motion phases
    pub game_time_ms: f64,
    pub last_target_spawn: f64,
    pub last_power_up_spawn: f64,
    pub boss_spawned: bool,
    pub targets: Vec<Target>,
    pub power_ups: Vec<PowerUp>,
    pub active_power_ups: Vec<ActivePowerUp>,
    pub hit_effects: Vec<HitEffect>,
    pub screen_shake: f32,
    pub frozen_until: f64,
    pub outcome: Option<Outcome>,
    next_id: u32,
}

impl SessionState {
    pub fn new(mode: GameMode, seed: u64) -> Self {
        let time_remaining = match &mode {
            GameMode::Level(config) => Some(config.duration_secs),
            GameMode::Versus { duration_secs } => Some(*duration_secs),
            GameMode::Endless | GameMode::CoOp => None,
        };
        Self {
            seed,
            status: SessionStatus::Idle,
            mode,
            score: 0,
            lives: STARTING_LIVES,
            wave: 1,
            difficulty: 0.0,
            kills_this_wave: 0,
            players: [PlayerStats::default(), PlayerStats::default()],
            max_ammo: MAX_AMMO,
            time_remaining,
            bonus_time_secs: 0.0,
            elapsed_ms: 0.0,
            game_time_ms: 0.0,
            last_target_spawn: 0.0,
            last_power_up_spawn: 0.0,
            boss_spawned: false,
            targets: Vec::new(),
            power_ups: Vec::new(),
            active_power_ups: Vec::new(),
            hit_effects: Vec::new(),
            screen_shake: 0.0,
            frozen_until: 0.0,
            outcome: None,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn player(&self, player: PlayerId) -> &PlayerStats {
        &self.players[player.index()]
    }

    pub fn player_mut(&mut self, player: PlayerId) -> &mut PlayerStats {
        &mut self.players[player.index()]
    }

    /// Add (or with a negative value, remove) points. Scores never go below zero.
    pub fn add_score(&mut self, player: PlayerId, points: i64) {
        let stats = self.player_mut(player);
        stats.score = (stats.score + points).max(0);
        self.score = match self.mode {
            GameMode::CoOp => self.players.iter().map(|p| p.score).sum(),
            _ => self.players[0].score,
        };
    }

    /// Any unexpired effect of this kind that applies to `player`
    pub fn has_power_up(&self, kind: PowerUpKind, player: Option<PlayerId>, now_ms: f64) -> bool {
        self.active_power_ups
            .iter()
            .any(|p| p.kind == kind && !p.is_expired(now_ms) && p.applies_to(player))
    }

    /// Remove one applicable effect of this kind. Returns whether one was found.
    pub fn consume_power_up(&mut self, kind: PowerUpKind, player: Option<PlayerId>, now_ms: f64) -> bool {
        let found = self
            .active_power_ups
            .iter()
            .position(|p| p.kind == kind && !p.is_expired(now_ms) && p.applies_to(player));
        match found {
            Some(i) => {
                self.active_power_ups.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn is_frozen(&self, now_ms: f64) -> bool {
        now_ms < self.frozen_until
    }

    /// Drop expired power-ups, effects and hit markers
    pub fn prune(&mut self, now_ms: f64) {
        self.power_ups.retain(|p| !p.is_expired(now_ms));
        self.active_power_ups.retain(|p| !p.is_expired(now_ms));
        self.hit_effects
            .retain(|e| now_ms - e.time < HIT_EFFECT_DURATION_MS);
    }

    /// Add screen shake, keeping the strongest
    pub fn shake(&mut self, amount: f32) {
        self.screen_shake = self.screen_shake.max(amount);
    }

    pub fn decay_shake(&mut self) {
        self.screen_shake *= SCREEN_SHAKE_DECAY;
        if self.screen_shake < 0.5 {
            self.screen_shake = 0.0;
        }
    }

    /// Clear all entity state for a fresh run of the same mode
    pub fn reset_entities(&mut self) {
        let mode = self.mode.clone();
        let next_id = self.next_id;
        *self = Self::new(mode, self.seed);
        // Ids stay unique across retries
        self.next_id = next_id;
    }
}
