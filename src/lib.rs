//! Shootman - a hand-gesture arcade shooter
//!
//! Core modules:
//! - `gesture`: Landmark geometry and the per-hand gesture interpreter
//! - `scheduler`: Variable-rate frames to fixed-interval ticks
//! - `sim`: Deterministic simulation (spawning, motion, hit resolution, sessions)
//! - `game`: Runner wiring tracker input, interpreters and the session together
//! - `persistence`: Key-value storage for settings, scores and progress
//! - `tuning` / `levels`: Data-driven game balance

pub mod achievements;
pub mod game;
pub mod gesture;
pub mod highscores;
pub mod levels;
pub mod persistence;
pub mod scheduler;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use achievements::Achievements;
pub use game::Game;
pub use highscores::HighScores;
pub use levels::{LevelConfig, LevelProgress, SpecialRules};
pub use settings::Settings;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Simulation tick rate
    pub const TARGET_FPS: f64 = 60.0;
    /// One reference frame at 60 Hz, in ms. Speeds are expressed per reference frame.
    pub const REFERENCE_FRAME_MS: f32 = 16.67;
    /// Upper bound on a single tick delta (ms), prevents huge jumps after a stall
    pub const MAX_FRAME_DELTA_MS: f64 = 100.0;

    /// Targets can never shrink below this and stay hittable
    pub const MIN_TARGET_SIZE: f32 = 15.0;
    pub const TARGET_MIN_SIZE: f32 = 40.0;
    pub const TARGET_MAX_SIZE: f32 = 80.0;
    /// Pixels per reference frame
    pub const TARGET_BASE_SPEED: f32 = 2.0;
    /// Endless-mode spawn interval (ms), shortened by difficulty
    pub const SPAWN_INTERVAL_MS: f64 = 2000.0;
    pub const MAX_TARGETS: usize = 5;

    /// Combo multiplier step: combo n scores 1 + (n-1) * (COMBO_MULTIPLIER - 1)
    pub const COMBO_MULTIPLIER: f32 = 1.5;

    pub const DIFFICULTY_INCREASE_RATE: f32 = 0.1;
    /// Kills per endless wave
    pub const WAVE_TARGET_COUNT: u32 = 10;
    pub const MAX_DIFFICULTY: f32 = 5.0;

    pub const STARTING_LIVES: i32 = 3;
    /// Lives lost per escaped target
    pub const MISSED_TARGET_PENALTY: i32 = 1;

    /// Limited-ammo mode
    pub const MAX_AMMO: u32 = 6;
    pub const RELOAD_TIME_MS: f64 = 1000.0;

    /// Power-ups
    pub const POWERUP_SIZE: f32 = 50.0;
    pub const POWERUP_SPAWN_INTERVAL_MS: f64 = 15000.0;
    pub const MAX_POWERUPS: usize = 2;
    /// Uncollected power-ups vanish after this long
    pub const POWERUP_LIFETIME_MS: f64 = 10000.0;
    /// Extra grace added to half the power-up size for pickup
    pub const POWERUP_PICKUP_GRACE: f32 = 30.0;
    pub const SLOWMO_SCALE: f32 = 0.3;
    pub const MAGNET_RANGE: f32 = 200.0;
    pub const MAGNET_STRENGTH: f32 = 0.5;
    /// Horizontal offset of the two extra spread-shot rays
    pub const SPREAD_OFFSET: f32 = 40.0;

    /// Time-freeze target
    pub const FREEZE_DURATION_MS: f64 = 3000.0;

    /// Level mode
    pub const BOSS_SPAWN_REMAINING_SECS: f32 = 20.0;
    pub const SPEED_RAMP_MAX: f32 = 2.5;
    pub const SHRINK_DURATION_MS: f64 = 8000.0;
    /// Fraction of base size lost when fully shrunk
    pub const SHRINK_AMOUNT: f32 = 0.7;

    /// Visual feedback
    pub const SCREEN_SHAKE_MAX: f32 = 10.0;
    pub const SCREEN_SHAKE_DECAY: f32 = 0.9;
    pub const HIT_EFFECT_DURATION_MS: f64 = 500.0;
}

/// Player slot. Two-player modes process both hands on the same client,
/// always in `One`, `Two` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }
}

/// Play-field size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub width: f32,
    pub height: f32,
}

impl Screen {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a point to the screen rectangle
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Install the platform logger (console on web, env_logger natively)
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
