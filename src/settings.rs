//! Game settings and preferences
//!
//! Persisted separately from scores and progress. The runner reads these
//! every tick; nothing in the simulation keeps a copy.

use serde::{Deserialize, Serialize};

use crate::gesture::GestureConfig;
use crate::gesture::interpreter::AimMapping;
use crate::persistence::{self, KeyValueStore, SETTINGS_KEY};

/// Aim sensitivity bounds
pub const MIN_SENSITIVITY: f32 = 0.5;
pub const MAX_SENSITIVITY: f32 = 3.0;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Controls ===
    /// Aim multiplier around the camera frame centre
    pub sensitivity: f32,
    /// Track the left hand (disables camera mirroring)
    pub left_hand_mode: bool,
    /// Six-round magazine with fist-to-reload
    pub limited_ammo: bool,
    /// Gesture thresholds
    pub gesture: GestureConfig,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    // === Visual Effects ===
    /// Screen shake on shots and explosions
    pub screen_shake: bool,
    /// Show the gesture debug overlay
    pub show_debug: bool,

    // === Accessibility ===
    /// Reduced motion (no shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sensitivity: 1.4,
            left_hand_mode: false,
            limited_ammo: false,
            gesture: GestureConfig::default(),

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.5,

            screen_shake: true,
            show_debug: false,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// How the interpreter maps hand coordinates to the screen
    pub fn aim_mapping(&self) -> AimMapping {
        AimMapping {
            sensitivity: self.sensitivity.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY),
            mirrored: !self.left_hand_mode,
        }
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Final gain for sound effects
    pub fn effective_sfx_volume(&self) -> f32 {
        (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
    }

    pub fn effective_music_volume(&self) -> f32 {
        (self.master_volume * self.music_volume).clamp(0.0, 1.0)
    }

    /// Load settings, falling back to defaults
    pub fn load(store: &dyn KeyValueStore) -> Self {
        persistence::load_or_default(store, SETTINGS_KEY)
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        persistence::save_or_warn(store, SETTINGS_KEY, self);
    }
}
