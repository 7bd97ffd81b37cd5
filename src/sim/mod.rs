//! Deterministic simulation module
//!
//! All gameplay logic lives here. Given the same seed, tick deltas and
//! gesture input, a session plays out identically:
//! - Seeded RNG only
//! - Players resolved in a fixed order
//! - No rendering or platform dependencies

pub mod collision;
pub mod duck;
pub mod motion;
pub mod resolve;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{find_closest_hit_target, find_power_up_at, targets_in_explosion_radius};
pub use duck::{Duck, DuckColor, DuckHuntSession, DuckHuntSnapshot, DuckState};
pub use resolve::{ShotResult, apply_escape_penalty, resolve_shot};
pub use state::{
    ActivePowerUp, GameEvent, GameMode, HitEffect, HitEffectKind, MovementPattern, Outcome,
    PlayerStats, PowerUp, PowerUpKind, SessionState, SessionStatus, Target, TargetKind,
};
pub use tick::{Session, SessionSnapshot, TickInput};
