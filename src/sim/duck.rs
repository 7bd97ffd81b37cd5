//! Duck-hunt mode
//!
//! One duck flies at a time. Each duck gets a fixed number of shots and a
//! fly-away deadline; a round is a fixed number of ducks and passes on
//! enough hits. Deferred transitions (hit animation, next round) are stored
//! as wall-clock deadlines and checked every tick.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::spawn::create_duck;
use super::state::{GameEvent, Outcome, SessionStatus};
use super::tick::TickInput;
use crate::consts::REFERENCE_FRAME_MS;
use crate::tuning::DuckHuntTuning;
use crate::{PlayerId, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuckState {
    Flying,
    /// Shot, hanging in the air until `fall_at`
    Hit,
    Falling,
    FlyingAway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuckColor {
    Black,
    Blue,
    Red,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duck {
    pub id: u32,
    pub pos: Vec2,
    /// Pixels per reference frame
    pub vel: Vec2,
    pub state: DuckState,
    pub color: DuckColor,
    pub points: i64,
    pub spawn_time: f64,
    /// Wall time the hit animation ends and the fall begins
    pub fall_at: Option<f64>,
}

/// Serializable view of a duck-hunt session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuckHuntSnapshot {
    pub status: SessionStatus,
    pub round: u32,
    pub score: i64,
    pub duck: Option<Duck>,
    pub shots_remaining: u32,
    pub ducks_hit: u32,
    pub ducks_processed: u32,
    pub ducks_per_round: u32,
    pub between_rounds: bool,
    pub outcome: Option<Outcome>,
}

/// A running duck-hunt game
#[derive(Debug, Clone)]
pub struct DuckHuntSession {
    pub tuning: DuckHuntTuning,
    pub screen: Screen,
    pub seed: u64,
    pub status: SessionStatus,
    pub round: u32,
    pub score: i64,
    pub duck: Option<Duck>,
    pub shots_remaining: u32,
    pub ducks_hit: u32,
    pub ducks_processed: u32,
    pub shots: u32,
    pub hits: u32,
    pub fly_away_deadline: f64,
    pub next_round_at: Option<f64>,
    pub outcome: Option<Outcome>,
    last_direction_change: f64,
    /// Wall time of the last tick
    last_tick_ms: f64,
    /// Set by `pause`; the next playing tick shifts deadlines past the gap
    paused_at: Option<f64>,
    rng: Pcg32,
    events: Vec<GameEvent>,
    next_id: u32,
}

impl DuckHuntSession {
    pub fn new(tuning: DuckHuntTuning, screen: Screen, seed: u64) -> Self {
        Self {
            shots_remaining: tuning.shots_per_duck,
            tuning,
            screen,
            seed,
            status: SessionStatus::Idle,
            round: 1,
            score: 0,
            duck: None,
            ducks_hit: 0,
            ducks_processed: 0,
            shots: 0,
            hits: 0,
            fly_away_deadline: 0.0,
            next_round_at: None,
            outcome: None,
            last_direction_change: 0.0,
            last_tick_ms: 0.0,
            paused_at: None,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Begin (or restart) from round 1
    pub fn start(&mut self) {
        let next_id = self.next_id;
        *self = Self::new(self.tuning.clone(), self.screen, self.seed);
        self.next_id = next_id;
        self.status = SessionStatus::Playing;
        log::info!("Duck hunt started (seed {})", self.seed);
    }

    pub fn pause(&mut self) {
        if self.status == SessionStatus::Playing {
            self.status = SessionStatus::Paused;
            self.paused_at = Some(self.last_tick_ms);
        }
    }

    pub fn resume(&mut self) {
        if self.status == SessionStatus::Paused {
            self.status = SessionStatus::Playing;
        }
    }

    pub fn abandon(&mut self) {
        self.status = SessionStatus::Idle;
        self.duck = None;
        self.next_round_at = None;
    }

    pub fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Height of the band the ducks fly in
    fn play_height(&self) -> f32 {
        self.screen.height * self.tuning.play_area_fraction
    }

    /// Advance one tick. Only player One shoots.
    pub fn tick(&mut self, input: &TickInput, delta_ms: f64, now_ms: f64) {
        if self.status != SessionStatus::Playing {
            return;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.shift_deadlines((now_ms - paused_at).max(0.0));
        }
        self.last_tick_ms = now_ms;

        if let Some(at) = self.next_round_at {
            if now_ms < at {
                return;
            }
            self.begin_next_round();
        }

        self.handle_shot(input, now_ms);

        if self.duck.is_none() && self.ducks_processed < self.tuning.ducks_per_round {
            self.launch_duck(now_ms);
        }

        self.update_duck(delta_ms as f32 / REFERENCE_FRAME_MS, now_ms);

        if self.duck.is_none() && self.ducks_processed >= self.tuning.ducks_per_round {
            self.finish_round(now_ms);
        }
    }

    /// Push every pending wall-clock deadline back by `gap_ms`
    fn shift_deadlines(&mut self, gap_ms: f64) {
        self.fly_away_deadline += gap_ms;
        self.last_direction_change += gap_ms;
        if let Some(at) = self.next_round_at.as_mut() {
            *at += gap_ms;
        }
        if let Some(duck) = self.duck.as_mut() {
            duck.spawn_time += gap_ms;
            if let Some(at) = duck.fall_at.as_mut() {
                *at += gap_ms;
            }
        }
    }

    fn begin_next_round(&mut self) {
        self.round += 1;
        self.ducks_hit = 0;
        self.ducks_processed = 0;
        self.next_round_at = None;
        log::info!("Duck hunt round {}", self.round);
    }

    fn handle_shot(&mut self, input: &TickInput, now_ms: f64) {
        let gesture = &input.gestures[PlayerId::One.index()];
        if !gesture.is_shooting || !gesture.is_gun_shape || self.shots_remaining == 0 {
            return;
        }
        let Some(aim) = gesture.aim_position else {
            return;
        };

        self.shots_remaining -= 1;
        self.shots += 1;
        self.events.push(GameEvent::ShotFired { player: PlayerId::One });

        let Some(duck) = self.duck.as_mut() else {
            return;
        };
        if duck.state != DuckState::Flying || aim.distance(duck.pos) >= self.tuning.duck_size {
            return;
        }

        duck.state = DuckState::Hit;
        duck.fall_at = Some(now_ms + self.tuning.hit_animation_ms);
        let points = duck.points;
        self.ducks_hit += 1;
        self.hits += 1;
        self.score += points;
        log::debug!("Duck #{} hit for {points}", duck.id);
        self.events.push(GameEvent::DuckHit { points });
    }

    fn launch_duck(&mut self, now_ms: f64) {
        let id = self.next_id;
        self.next_id += 1;
        self.duck = Some(create_duck(
            &mut self.rng,
            id,
            self.screen,
            self.round,
            &self.tuning,
            now_ms,
        ));
        self.shots_remaining = self.tuning.shots_per_duck;
        self.fly_away_deadline = now_ms + self.tuning.fly_away_ms;
        self.last_direction_change = now_ms;
    }

    fn update_duck(&mut self, dt: f32, now_ms: f64) {
        let play_height = self.play_height();
        let half = self.tuning.duck_size / 2.0;
        let Some(duck) = self.duck.as_mut() else {
            return;
        };

        let mut removed = false;
        match duck.state {
            DuckState::Hit => {
                if duck.fall_at.is_some_and(|at| now_ms >= at) {
                    duck.state = DuckState::Falling;
                    duck.vel = Vec2::new(0.0, self.tuning.fall_speed);
                }
            }
            DuckState::Falling => {
                duck.pos.y += self.tuning.fall_speed * dt;
                removed = duck.pos.y > self.screen.height;
            }
            DuckState::FlyingAway => {
                duck.pos.y -= self.tuning.fly_away_speed * dt;
                if duck.pos.y < -self.tuning.duck_size {
                    removed = true;
                    self.events.push(GameEvent::DuckEscaped);
                }
            }
            DuckState::Flying => {
                if self.shots_remaining == 0 || now_ms > self.fly_away_deadline {
                    duck.state = DuckState::FlyingAway;
                    duck.vel = Vec2::new(0.0, -self.tuning.fly_away_speed);
                } else {
                    if now_ms - self.last_direction_change > self.tuning.direction_change_ms {
                        let speed = duck.vel.length();
                        duck.vel = Vec2::from_angle(self.rng.random::<f32>() * TAU) * speed;
                        self.last_direction_change = now_ms;
                    }
                    duck.pos += duck.vel * dt;

                    if duck.pos.x < half {
                        duck.pos.x = half;
                        duck.vel.x = duck.vel.x.abs();
                    } else if duck.pos.x > self.screen.width - half {
                        duck.pos.x = self.screen.width - half;
                        duck.vel.x = -duck.vel.x.abs();
                    }
                    if duck.pos.y < half {
                        duck.pos.y = half;
                        duck.vel.y = duck.vel.y.abs();
                    } else if duck.pos.y > play_height - half {
                        duck.pos.y = play_height - half;
                        duck.vel.y = -duck.vel.y.abs();
                    }
                }
            }
        }

        if removed {
            self.duck = None;
            self.ducks_processed += 1;
        }
    }

    fn finish_round(&mut self, now_ms: f64) {
        let round = self.round;
        if self.ducks_hit >= self.tuning.ducks_to_pass {
            let perfect = self.ducks_hit == self.tuning.ducks_per_round;
            if perfect {
                self.score += self.tuning.perfect_round_bonus;
            }
            log::info!("Duck hunt round {round} complete ({} hits)", self.ducks_hit);
            self.events.push(GameEvent::RoundComplete { round, perfect });
            self.next_round_at = Some(now_ms + self.tuning.round_transition_ms);
        } else {
            log::info!("Duck hunt over in round {round}, score {}", self.score);
            self.events.push(GameEvent::RoundFailed { round });
            self.status = SessionStatus::GameOver;
            self.outcome = Some(Outcome::GameOver);
            self.events.push(GameEvent::SessionEnded {
                outcome: Outcome::GameOver,
            });
        }
    }

    pub fn snapshot(&self) -> DuckHuntSnapshot {
        DuckHuntSnapshot {
            status: self.status,
            round: self.round,
            score: self.score,
            duck: self.duck.clone(),
            shots_remaining: self.shots_remaining,
            ducks_hit: self.ducks_hit,
            ducks_processed: self.ducks_processed,
            ducks_per_round: self.tuning.ducks_per_round,
            between_rounds: self.next_round_at.is_some(),
            outcome: self.outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::GestureState;

    const FRAME: f64 = 16.0;

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn shot_at(aim: Vec2) -> TickInput {
        let mut input = TickInput::default();
        input.gestures[0] = GestureState {
            is_gun_shape: true,
            is_shooting: true,
            aim_position: Some(aim),
            confidence: 1.0,
            ..Default::default()
        };
        input
    }

    fn started() -> DuckHuntSession {
        let mut session = DuckHuntSession::new(DuckHuntTuning::default(), Screen::new(800.0, 600.0), 42);
        session.start();
        session
    }

    /// Run idle ticks until the current duck leaves, returning the time
    fn run_until_duck_gone(session: &mut DuckHuntSession, mut now: f64) -> f64 {
        while session.duck.is_some() {
            now += FRAME;
            session.tick(&idle(), FRAME, now);
        }
        now
    }

    #[test]
    fn test_first_tick_launches_duck() {
        let mut session = started();
        session.tick(&idle(), FRAME, 0.0);
        let duck = session.duck.as_ref().unwrap();
        assert_eq!(duck.state, DuckState::Flying);
        assert_eq!(session.shots_remaining, 3);
        assert_eq!(session.fly_away_deadline, 5000.0);
    }

    #[test]
    fn test_hit_then_fall_after_delay() {
        let mut session = started();
        session.tick(&idle(), FRAME, 0.0);
        let pos = session.duck.as_ref().unwrap().pos;
        let points = session.duck.as_ref().unwrap().points;

        session.tick(&shot_at(pos), FRAME, 100.0);
        assert_eq!(session.duck.as_ref().unwrap().state, DuckState::Hit);
        assert_eq!(session.score, points);
        assert_eq!(session.ducks_hit, 1);
        assert!(session.drain_events().contains(&GameEvent::DuckHit { points }));

        session.tick(&idle(), FRAME, 599.0);
        assert_eq!(session.duck.as_ref().unwrap().state, DuckState::Hit);
        session.tick(&idle(), FRAME, 600.0);
        assert_eq!(session.duck.as_ref().unwrap().state, DuckState::Falling);

        run_until_duck_gone(&mut session, 600.0);
        assert_eq!(session.ducks_processed, 1);
        assert_eq!(session.ducks_hit, 1);
    }

    #[test]
    fn test_out_of_shots_flies_away() {
        let mut session = started();
        session.tick(&idle(), FRAME, 0.0);
        let miss = Vec2::new(-500.0, -500.0);
        for i in 1..=3 {
            session.tick(&shot_at(miss), FRAME, i as f64 * FRAME);
        }
        assert_eq!(session.shots_remaining, 0);
        assert_eq!(session.duck.as_ref().unwrap().state, DuckState::FlyingAway);

        // Further shots are ignored
        session.tick(&shot_at(miss), FRAME, 100.0);
        assert_eq!(session.shots, 3);

        run_until_duck_gone(&mut session, 100.0);
        assert_eq!(session.ducks_processed, 1);
        assert_eq!(session.ducks_hit, 0);
        assert!(session.drain_events().contains(&GameEvent::DuckEscaped));
    }

    #[test]
    fn test_fly_away_timer() {
        let mut session = started();
        session.tick(&idle(), FRAME, 0.0);
        session.tick(&idle(), FRAME, 5000.0);
        assert_eq!(session.duck.as_ref().unwrap().state, DuckState::Flying);
        session.tick(&idle(), FRAME, 5001.0);
        assert_eq!(session.duck.as_ref().unwrap().state, DuckState::FlyingAway);
    }

    #[test]
    fn test_flying_duck_stays_in_play_area() {
        let mut session = started();
        let mut now = 0.0;
        for _ in 0..250 {
            session.tick(&idle(), FRAME, now);
            now += FRAME;
            let duck = session.duck.as_ref().unwrap();
            if duck.state == DuckState::Flying {
                assert!(duck.pos.x >= 30.0 && duck.pos.x <= 770.0);
                assert!(duck.pos.y >= 30.0 && duck.pos.y <= 450.0 - 30.0 + 1e-3);
            }
        }
    }

    fn play_round(session: &mut DuckHuntSession, hits: u32, mut now: f64) -> f64 {
        for i in 0..session.tuning.ducks_per_round {
            now += FRAME;
            session.tick(&idle(), FRAME, now);
            if i < hits {
                let pos = session.duck.as_ref().unwrap().pos;
                now += FRAME;
                session.tick(&shot_at(pos), FRAME, now);
            } else {
                now += session.tuning.fly_away_ms + 1.0;
                session.tick(&idle(), FRAME, now);
            }
            now = run_until_duck_gone(session, now);
        }
        now
    }

    #[test]
    fn test_perfect_round_bonus_and_next_round() {
        let mut session = started();
        let now = play_round(&mut session, 10, 0.0);
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::RoundComplete { round: 1, perfect: true }));
        let duck_points: i64 = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::DuckHit { points } => Some(*points),
                _ => None,
            })
            .sum();
        assert_eq!(session.score, duck_points + 10_000);
        assert!(session.next_round_at.is_some());

        // Nothing happens during the transition
        session.tick(&idle(), FRAME, now + 1000.0);
        assert_eq!(session.round, 1);
        assert!(session.duck.is_none());

        session.tick(&idle(), FRAME, now + 2000.0);
        assert_eq!(session.round, 2);
        assert_eq!(session.ducks_processed, 0);
        assert!(session.duck.is_some());
    }

    #[test]
    fn test_pass_without_perfect() {
        let mut session = started();
        play_round(&mut session, 6, 0.0);
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::RoundComplete { round: 1, perfect: false }));
        assert_eq!(session.status, SessionStatus::Playing);
    }

    #[test]
    fn test_failed_round_ends_game() {
        let mut session = started();
        play_round(&mut session, 5, 0.0);
        assert_eq!(session.status, SessionStatus::GameOver);
        assert_eq!(session.outcome, Some(Outcome::GameOver));
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::RoundFailed { round: 1 }));
        assert_eq!(session.snapshot().ducks_processed, 10);
    }

    #[test]
    fn test_paused_does_not_advance() {
        let mut session = started();
        session.tick(&idle(), FRAME, 0.0);
        session.pause();
        let before = session.duck.clone();
        session.tick(&idle(), FRAME, 10_000.0);
        assert_eq!(session.duck, before);
        session.resume();
        assert_eq!(session.status, SessionStatus::Playing);
    }

    #[test]
    fn test_pause_shifts_fly_away_deadline() {
        let mut session = started();
        session.tick(&idle(), FRAME, 0.0);
        assert_eq!(session.fly_away_deadline, 5000.0);
        session.pause();
        session.resume();
        // A 30 s pause must not eat the duck's time in the air
        session.tick(&idle(), FRAME, 30_000.0);
        assert_eq!(session.fly_away_deadline, 35_000.0);
        assert_eq!(session.duck.as_ref().unwrap().state, DuckState::Flying);
    }

    #[test]
    fn test_shot_needs_gun_shape() {
        let mut session = started();
        session.tick(&idle(), FRAME, 0.0);
        let pos = session.duck.as_ref().unwrap().pos;
        let mut input = shot_at(pos);
        input.gestures[0].is_gun_shape = false;
        session.tick(&input, FRAME, FRAME);
        assert_eq!(session.shots, 0);
        assert_eq!(session.shots_remaining, session.tuning.shots_per_duck);
        assert_eq!(session.duck.as_ref().unwrap().state, DuckState::Flying);
    }
}
