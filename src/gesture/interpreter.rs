//! Per-hand gesture state machine
//!
//! Consumes one landmark frame (or its absence) per simulation tick and
//! produces a complete [`GestureState`]: smoothed aim, gun-shape flag and
//! edge-triggered shoot/reload events. Absence and ambiguity always degrade
//! to a low-confidence state; nothing here can fail.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::landmarks::*;
use crate::Screen;

/// Tunable thresholds. The shoot thresholds in particular are calibration
/// values, not physical constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Minimum time between two shots (ms)
    pub cooldown_ms: f64,
    /// Per-tick thumb closing distance that counts as a trigger pull
    pub movement_threshold: f32,
    /// Thumb-to-index distance below which the thumb is "touching"
    pub absolute_threshold: f32,
    /// Per-tick thumb closing distance that freezes the aim (pre-shot)
    pub approach_threshold: f32,
    /// Aim stays frozen this long after a shot (ms)
    pub post_shot_freeze_ms: f64,
    /// Keep reporting the last aim this long after the hand disappears (ms)
    pub persistence_ms: f64,
    /// Fist must be held this long to reload (ms)
    pub reload_hold_ms: f64,
    /// One-pole smoothing factor (higher = more responsive)
    pub aim_smoothing: f32,
    /// Weight of the index fingertip vs the index knuckle in the aim point
    pub tip_weight: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 200.0,
            movement_threshold: 0.025,
            absolute_threshold: 0.05,
            approach_threshold: 0.008,
            post_shot_freeze_ms: 150.0,
            persistence_ms: 500.0,
            reload_hold_ms: 500.0,
            aim_smoothing: 0.85,
            tip_weight: 0.85,
        }
    }
}

/// How normalized hand coordinates map onto the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimMapping {
    /// Multiplier around the frame centre (>1 = less hand travel needed)
    pub sensitivity: f32,
    /// Mirror X for a front-facing camera. Off for left-hand mode.
    pub mirrored: bool,
}

impl Default for AimMapping {
    fn default() -> Self {
        Self {
            sensitivity: 1.4,
            mirrored: true,
        }
    }
}

/// Output of one interpreter tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureState {
    pub is_gun_shape: bool,
    /// True only on the tick a shot registers
    pub is_shooting: bool,
    /// True only on the tick a fist hold crosses the reload threshold
    pub is_reloading: bool,
    pub is_fist: bool,
    pub aim_position: Option<Vec2>,
    pub confidence: f32,
}

impl GestureState {
    fn no_hand() -> Self {
        Self::default()
    }
}

/// Raw classification of the last real frame, for debug overlays
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GestureDebugInfo {
    pub index_extended: bool,
    pub middle_extended: bool,
    pub ring_curled: bool,
    pub pinky_curled: bool,
    pub thumb_distance: f32,
}

/// Gesture interpreter for one tracked hand
#[derive(Debug, Clone)]
pub struct GestureInterpreter {
    config: GestureConfig,
    /// Rapid-fire shortens the cooldown through this factor
    cooldown_scale: f32,
    last_thumb_distance: Option<f32>,
    last_shot_time: Option<f64>,
    smoothed_aim: Option<Vec2>,
    last_detection_time: f64,
    frozen_aim: Option<Vec2>,
    freeze_started: Option<f64>,
    fist_started: Option<f64>,
    /// Latch so one fist hold reloads once
    reload_emitted: bool,
    state: GestureState,
    debug: Option<GestureDebugInfo>,
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureInterpreter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            cooldown_scale: 1.0,
            last_thumb_distance: None,
            last_shot_time: None,
            smoothed_aim: None,
            last_detection_time: 0.0,
            frozen_aim: None,
            freeze_started: None,
            fist_started: None,
            reload_emitted: false,
            state: GestureState::no_hand(),
            debug: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    /// Scale the shot cooldown (1.0 = normal)
    pub fn set_cooldown_scale(&mut self, scale: f32) {
        self.cooldown_scale = scale.clamp(0.05, 4.0);
    }

    /// Most recent output
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn debug_info(&self) -> Option<GestureDebugInfo> {
        self.debug
    }

    /// Whether the reported aim is currently pinned by a trigger pull
    pub fn is_aim_frozen(&self) -> bool {
        self.frozen_aim.is_some()
    }

    /// Forget everything (new session, player swap)
    pub fn reset(&mut self) {
        *self = Self {
            cooldown_scale: self.cooldown_scale,
            ..Self::new(self.config.clone())
        };
    }

    /// Advance one tick
    pub fn process(
        &mut self,
        frame: Option<&HandFrame>,
        now_ms: f64,
        screen: Screen,
        mapping: AimMapping,
    ) -> GestureState {
        let state = match frame {
            Some(frame) => self.process_frame(frame, now_ms, screen, mapping),
            None => self.process_absent(now_ms),
        };
        self.state = state;
        state
    }

    fn process_absent(&mut self, now_ms: f64) -> GestureState {
        self.debug = None;
        self.fist_started = None;
        self.reload_emitted = false;
        self.frozen_aim = None;
        self.freeze_started = None;

        match self.smoothed_aim {
            Some(aim) if now_ms - self.last_detection_time < self.config.persistence_ms => GestureState {
                aim_position: Some(aim),
                confidence: 0.5,
                ..GestureState::no_hand()
            },
            _ => {
                let cooldown_scale = self.cooldown_scale;
                let config = self.config.clone();
                *self = Self::new(config);
                self.cooldown_scale = cooldown_scale;
                GestureState::no_hand()
            }
        }
    }

    fn process_frame(
        &mut self,
        frame: &HandFrame,
        now_ms: f64,
        screen: Screen,
        mapping: AimMapping,
    ) -> GestureState {
        self.last_detection_time = now_ms;

        let index_extended = is_finger_extended(frame, INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP);
        let middle_extended = is_finger_extended(frame, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP);
        let ring_curled = is_finger_curled(frame, RING_MCP, RING_TIP, WRIST);
        let pinky_curled = is_finger_curled(frame, PINKY_MCP, PINKY_TIP, WRIST);

        // Reload: fist held long enough, once per hold
        let is_fist = is_fist(frame);
        let mut is_reloading = false;
        if is_fist {
            let started = *self.fist_started.get_or_insert(now_ms);
            if !self.reload_emitted && now_ms - started >= self.config.reload_hold_ms {
                is_reloading = true;
                self.reload_emitted = true;
            }
        } else {
            self.fist_started = None;
            self.reload_emitted = false;
        }

        let is_full_gun_shape = index_extended && middle_extended && ring_curled && pinky_curled;
        let is_gun_shape = !is_fist && (index_extended || is_full_gun_shape);

        // Trigger: thumb closing on the index finger
        let thumb = frame.point(THUMB_TIP);
        let thumb_distance = distance_3d(thumb, frame.point(INDEX_MCP))
            .min(distance_3d(thumb, frame.point(INDEX_PIP)));
        let previous = self.last_thumb_distance;
        let closing = previous.map_or(0.0, |p| p - thumb_distance);

        let movement_trigger = previous.is_some() && closing > self.config.movement_threshold;
        let absolute_trigger = previous.is_some_and(|p| p >= self.config.absolute_threshold)
            && thumb_distance < self.config.absolute_threshold;

        let cooldown = self.config.cooldown_ms * self.cooldown_scale as f64;
        let cooled_down = self.last_shot_time.is_none_or(|t| now_ms - t >= cooldown);

        let is_shooting = is_gun_shape && cooled_down && (movement_trigger || absolute_trigger);
        if is_shooting {
            log::debug!("Trigger at {now_ms:.0} ms (thumb {thumb_distance:.3})");
            self.last_shot_time = Some(now_ms);
        }
        self.last_thumb_distance = Some(thumb_distance);

        // The smoothed aim always advances, even while the reported aim is frozen
        let raw = self.raw_aim(frame, screen, mapping);
        let before = self.smoothed_aim;
        let smoothed = match before {
            Some(prev) => prev + (raw - prev) * self.config.aim_smoothing,
            None => raw,
        };
        self.smoothed_aim = Some(smoothed);

        let approaching = is_gun_shape && closing > self.config.approach_threshold;
        let recently_fired = self
            .last_shot_time
            .is_some_and(|t| now_ms - t < self.config.post_shot_freeze_ms);

        let aim_position = if approaching || recently_fired {
            self.freeze_started.get_or_insert(now_ms);
            *self.frozen_aim.get_or_insert(before.unwrap_or(smoothed))
        } else {
            self.frozen_aim = None;
            self.freeze_started = None;
            smoothed
        };

        let confidence = [index_extended, middle_extended, ring_curled, pinky_curled]
            .iter()
            .filter(|&&f| f)
            .count() as f32
            * 0.25;

        self.debug = Some(GestureDebugInfo {
            index_extended,
            middle_extended,
            ring_curled,
            pinky_curled,
            thumb_distance,
        });

        GestureState {
            is_gun_shape,
            is_shooting,
            is_reloading,
            is_fist,
            aim_position: Some(aim_position),
            confidence,
        }
    }

    /// Screen-space aim point before smoothing
    fn raw_aim(&self, frame: &HandFrame, screen: Screen, mapping: AimMapping) -> Vec2 {
        let w = self.config.tip_weight;
        let p = frame.point(INDEX_TIP).xy() * w + frame.point(INDEX_MCP).xy() * (1.0 - w);
        let x = if mapping.mirrored { 1.0 - p.x } else { p.x };
        let centered = Vec2::new(
            0.5 + (x - 0.5) * mapping.sensitivity,
            0.5 + (p.y - 0.5) * mapping.sensitivity,
        );
        screen.clamp(Vec2::new(centered.x * screen.width, centered.y * screen.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::landmarks::poses;

    const FRAME_MS: f64 = 16.0;

    fn screen() -> Screen {
        Screen::new(1000.0, 1000.0)
    }

    fn run(interp: &mut GestureInterpreter, frame: Option<&HandFrame>, t: f64) -> GestureState {
        interp.process(frame, t, screen(), AimMapping::default())
    }

    #[test]
    fn test_no_hand() {
        let mut interp = GestureInterpreter::default();
        let state = run(&mut interp, None, 0.0);
        assert_eq!(state.aim_position, None);
        assert_eq!(state.confidence, 0.0);
        assert!(!state.is_gun_shape);
    }

    #[test]
    fn test_gun_pose_confidence_and_aim() {
        let mut interp = GestureInterpreter::default();
        let state = run(&mut interp, Some(&poses::gun(0.0)), 0.0);
        assert!(state.is_gun_shape);
        assert!(!state.is_shooting);
        assert!((state.confidence - 1.0).abs() < 1e-6);
        let aim = state.aim_position.unwrap();
        assert!(aim.x >= 0.0 && aim.x <= 1000.0);
        assert!(aim.y >= 0.0 && aim.y <= 1000.0);
    }

    #[test]
    fn test_lenient_gun_shape() {
        let mut interp = GestureInterpreter::default();
        let state = run(&mut interp, Some(&poses::pointing(0.0)), 0.0);
        assert!(state.is_gun_shape);
        // Middle finger is curled so it does not contribute
        assert!((state.confidence - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_persistence_window() {
        let mut interp = GestureInterpreter::default();
        let first = run(&mut interp, Some(&poses::gun(0.0)), 0.0);

        let held = run(&mut interp, None, 300.0);
        assert_eq!(held.aim_position, first.aim_position);
        assert_eq!(held.confidence, 0.5);
        assert!(!held.is_gun_shape);

        let lost = run(&mut interp, None, 600.0);
        assert_eq!(lost.aim_position, None);
        assert_eq!(lost.confidence, 0.0);
    }

    #[test]
    fn test_single_trigger_pull_fires_once() {
        let mut interp = GestureInterpreter::default();
        let pull = [0.0, 0.0, 0.4, 0.8, 1.0, 1.0, 1.0, 1.0];
        let mut shots = 0;
        for (i, pressed) in pull.iter().enumerate() {
            let state = run(&mut interp, Some(&poses::gun(*pressed)), i as f64 * FRAME_MS);
            if state.is_shooting {
                shots += 1;
            }
        }
        assert_eq!(shots, 1);

        // Holding the thumb down past the cooldown does not re-fire
        let mut t = pull.len() as f64 * FRAME_MS;
        for _ in 0..30 {
            let state = run(&mut interp, Some(&poses::gun(1.0)), t);
            assert!(!state.is_shooting);
            t += FRAME_MS;
        }
    }

    #[test]
    fn test_cooldown_blocks_second_pull() {
        let mut interp = GestureInterpreter::default();
        let mut t = 0.0;
        run(&mut interp, Some(&poses::gun(0.0)), t);
        t += FRAME_MS;
        assert!(run(&mut interp, Some(&poses::gun(1.0)), t).is_shooting);
        let first_shot = t;

        // Re-cock and pull again inside the cooldown
        t += FRAME_MS;
        run(&mut interp, Some(&poses::gun(0.0)), t);
        t += FRAME_MS;
        assert!(!run(&mut interp, Some(&poses::gun(1.0)), t).is_shooting);
        assert!(t - first_shot < interp.config().cooldown_ms);

        // After the cooldown a fresh pull fires
        t = first_shot + interp.config().cooldown_ms + FRAME_MS;
        run(&mut interp, Some(&poses::gun(0.0)), t);
        t += FRAME_MS;
        assert!(run(&mut interp, Some(&poses::gun(1.0)), t).is_shooting);
    }

    #[test]
    fn test_absolute_trigger_on_slow_press() {
        let config = GestureConfig {
            // Only the touch transition can fire
            movement_threshold: 1.0,
            ..GestureConfig::default()
        };
        let mut interp = GestureInterpreter::new(config);
        let mut fired = 0;
        for i in 0..=20 {
            let pressed = i as f32 / 20.0;
            if run(&mut interp, Some(&poses::gun(pressed)), i as f64 * FRAME_MS).is_shooting {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_no_shot_without_gun_shape() {
        let mut interp = GestureInterpreter::default();
        run(&mut interp, Some(&poses::fist()), 0.0);
        let state = run(&mut interp, Some(&poses::fist()), FRAME_MS);
        assert!(!state.is_gun_shape);
        assert!(!state.is_shooting);
    }

    #[test]
    fn test_short_fist_never_reloads() {
        let mut interp = GestureInterpreter::default();
        let mut t = 0.0;
        while t < 480.0 {
            let state = run(&mut interp, Some(&poses::fist()), t);
            assert!(state.is_fist);
            assert!(!state.is_reloading);
            t += FRAME_MS;
        }
        // Breaking the fist resets the timer: no partial credit
        run(&mut interp, Some(&poses::gun(0.0)), t);
        t += FRAME_MS;
        let restart = t;
        while t < restart + 480.0 {
            assert!(!run(&mut interp, Some(&poses::fist()), t).is_reloading);
            t += FRAME_MS;
        }
    }

    #[test]
    fn test_long_fist_reloads_once() {
        let mut interp = GestureInterpreter::default();
        let mut reloads = 0;
        let mut t = 0.0;
        while t <= 1500.0 {
            if run(&mut interp, Some(&poses::fist()), t).is_reloading {
                reloads += 1;
                assert!(t >= 500.0);
            }
            t += FRAME_MS;
        }
        assert_eq!(reloads, 1);
    }

    #[test]
    fn test_aim_freezes_during_trigger_pull() {
        let config = GestureConfig {
            aim_smoothing: 1.0,
            ..GestureConfig::default()
        };
        let mut interp = GestureInterpreter::new(config);
        let start = run(&mut interp, Some(&poses::gun(0.0)), 0.0).aim_position.unwrap();

        // Pull the trigger while the whole hand drifts right
        let drift = Vec2::new(0.05, 0.0);
        let frame = poses::gun(1.0).translated(drift);
        let during = run(&mut interp, Some(&frame), FRAME_MS);
        assert!(during.is_shooting);
        assert_eq!(during.aim_position, Some(start));
        assert!(interp.is_aim_frozen());

        // Once the post-shot window lapses the background position shows, no snap back
        let t = FRAME_MS + interp.config().post_shot_freeze_ms + 1.0;
        let after = run(&mut interp, Some(&frame), t).aim_position.unwrap();
        assert!(!interp.is_aim_frozen());
        assert!((after - start).length() > 1.0);
    }

    #[test]
    fn test_left_hand_mode_is_not_mirrored() {
        let frame = poses::gun(0.0).translated(Vec2::new(0.2, 0.0));
        let mut mirrored = GestureInterpreter::default();
        let mut direct = GestureInterpreter::default();
        let a = mirrored
            .process(Some(&frame), 0.0, screen(), AimMapping::default())
            .aim_position
            .unwrap();
        let b = direct
            .process(
                Some(&frame),
                0.0,
                screen(),
                AimMapping {
                    mirrored: false,
                    ..AimMapping::default()
                },
            )
            .aim_position
            .unwrap();
        // Hand moved right in camera space: mirrored aim is left of centre, direct is right
        assert!(a.x < 500.0);
        assert!(b.x > 500.0);
    }

    #[test]
    fn test_aim_clamped_to_screen() {
        let mut interp = GestureInterpreter::default();
        let frame = poses::gun(0.0).translated(Vec2::new(-0.6, -0.5));
        let aim = interp
            .process(Some(&frame), 0.0, screen(), AimMapping { sensitivity: 3.0, mirrored: true })
            .aim_position
            .unwrap();
        assert!(aim.x <= 1000.0 && aim.x >= 0.0);
        assert!(aim.y <= 1000.0 && aim.y >= 0.0);
    }

    #[test]
    fn test_cooldown_scale_allows_faster_fire() {
        let mut interp = GestureInterpreter::default();
        interp.set_cooldown_scale(0.25);
        let mut t = 0.0;
        run(&mut interp, Some(&poses::gun(0.0)), t);
        t += FRAME_MS;
        assert!(run(&mut interp, Some(&poses::gun(1.0)), t).is_shooting);
        t += 3.0 * FRAME_MS;
        run(&mut interp, Some(&poses::gun(0.0)), t);
        t += FRAME_MS;
        // 64 ms after the first shot: inside the normal 200 ms cooldown, outside 50 ms
        assert!(run(&mut interp, Some(&poses::gun(1.0)), t).is_shooting);
    }
}
