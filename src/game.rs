//! Game runner
//!
//! Owns everything a running client needs: the scheduler, one gesture
//! interpreter per hand, the active session and the persisted profile
//! (settings, scores, progress, achievements). The platform layer feeds it
//! raw frames and tracker reports; it hands back snapshots and events.

use serde::Serialize;

use crate::achievements::{Achievements, SessionSummary};
use crate::gesture::{GestureDebugInfo, GestureInterpreter, GestureState, HandFrame};
use crate::highscores::HighScores;
use crate::levels::LevelProgress;
use crate::persistence::KeyValueStore;
use crate::scheduler::{FixedStepScheduler, FrameDriver};
use crate::settings::Settings;
use crate::sim::{
    DuckHuntSession, DuckHuntSnapshot, GameEvent, GameMode, Outcome, PowerUpKind, Session,
    SessionSnapshot, SessionStatus, TickInput,
};
use crate::tuning::{COOP_WIN_SCORE, DuckHuntTuning, RAPID_FIRE_COOLDOWN_SCALE};
use crate::{PlayerId, Screen};

/// The session being played
#[derive(Debug, Clone)]
pub enum ActiveSession {
    Standard(Session),
    DuckHunt(DuckHuntSession),
}

impl ActiveSession {
    pub fn status(&self) -> SessionStatus {
        match self {
            ActiveSession::Standard(session) => session.status(),
            ActiveSession::DuckHunt(session) => session.status,
        }
    }

    fn players(&self) -> &'static [PlayerId] {
        match self {
            ActiveSession::Standard(session) => session.mode().players(),
            ActiveSession::DuckHunt(_) => &PlayerId::ALL[..1],
        }
    }

    fn label(&self) -> String {
        match self {
            ActiveSession::Standard(session) => match session.mode() {
                GameMode::Endless => "endless".to_string(),
                GameMode::Level(level) => format!("level {}", level.id),
                GameMode::CoOp => "co-op".to_string(),
                GameMode::Versus { .. } => "versus".to_string(),
            },
            ActiveSession::DuckHunt(_) => "duck hunt".to_string(),
        }
    }
}

/// Everything the presentation layer needs after a tick
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub session: Option<SessionSnapshot>,
    pub duck_hunt: Option<DuckHuntSnapshot>,
    pub gestures: [GestureState; 2],
    /// Camera or tracker failure; ticks are suspended while set
    pub input_error: Option<String>,
    /// Only filled when the debug overlay is enabled
    pub debug: Option<GestureDebugInfo>,
    /// Final gains for the external audio layer
    pub sfx_volume: f32,
    pub music_volume: f32,
}

/// Client-side game runner
pub struct Game<D: FrameDriver> {
    scheduler: FixedStepScheduler<D>,
    interpreters: [GestureInterpreter; 2],
    /// Latest tracker report per hand, kept until replaced
    frames: [Option<HandFrame>; 2],
    gestures: [GestureState; 2],
    session: Option<ActiveSession>,
    settings: Settings,
    pub high_scores: HighScores,
    pub progress: LevelProgress,
    pub achievements: Achievements,
    store: Box<dyn KeyValueStore>,
    screen: Screen,
    input_error: Option<String>,
    events: Vec<GameEvent>,
    /// End-of-session bookkeeping already done for the current session
    recorded: bool,
    last_tick_time: f64,
}

impl<D: FrameDriver> Game<D> {
    /// Build a runner, loading the saved profile from `store`
    pub fn new(driver: D, store: Box<dyn KeyValueStore>, screen: Screen) -> Self {
        let settings = Settings::load(store.as_ref());
        let high_scores = HighScores::load(store.as_ref());
        let progress = LevelProgress::load(store.as_ref());
        let achievements = Achievements::load(store.as_ref());
        let interpreter = GestureInterpreter::new(settings.gesture.clone());
        Self {
            scheduler: FixedStepScheduler::new(driver),
            interpreters: [interpreter.clone(), interpreter],
            frames: [None, None],
            gestures: [GestureState::default(); 2],
            session: None,
            settings,
            high_scores,
            progress,
            achievements,
            store,
            screen,
            input_error: None,
            events: Vec::new(),
            recorded: false,
            last_tick_time: 0.0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace and persist the settings. Takes effect on the next tick.
    pub fn set_settings(&mut self, settings: Settings) {
        for interpreter in &mut self.interpreters {
            interpreter.set_config(settings.gesture.clone());
        }
        self.settings = settings;
        self.settings.save(self.store.as_mut());
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn scheduler(&self) -> &FixedStepScheduler<D> {
        &self.scheduler
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut ActiveSession> {
        self.session.as_mut()
    }

    pub fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
        match &mut self.session {
            Some(ActiveSession::Standard(session)) => session.set_screen(screen),
            Some(ActiveSession::DuckHunt(session)) => session.set_screen(screen),
            None => {}
        }
    }

    /// Start a fresh session, replacing any current one
    pub fn start_session(&mut self, mode: GameMode, seed: u64) {
        if let GameMode::Level(level) = &mode {
            if !self.progress.is_unlocked(level.id) {
                log::warn!("Level {} is locked, starting anyway", level.id);
            }
        }
        let mut session = Session::new(mode, seed, self.screen);
        session.start();
        self.begin(ActiveSession::Standard(session));
    }

    pub fn start_duck_hunt(&mut self, seed: u64) {
        let mut session = DuckHuntSession::new(DuckHuntTuning::default(), self.screen, seed);
        session.start();
        self.begin(ActiveSession::DuckHunt(session));
    }

    fn begin(&mut self, session: ActiveSession) {
        for interpreter in &mut self.interpreters {
            interpreter.reset();
        }
        self.session = Some(session);
        self.recorded = false;
        self.scheduler.start();
    }

    pub fn pause(&mut self) {
        match &mut self.session {
            Some(ActiveSession::Standard(session)) => session.pause(),
            Some(ActiveSession::DuckHunt(session)) => session.pause(),
            None => return,
        }
        self.scheduler.stop();
    }

    pub fn resume(&mut self) {
        match &mut self.session {
            Some(ActiveSession::Standard(session)) => session.resume(),
            Some(ActiveSession::DuckHunt(session)) => session.resume(),
            None => return,
        }
        self.scheduler.start();
    }

    /// Replay the current mode from the start
    pub fn retry(&mut self) {
        match &mut self.session {
            Some(ActiveSession::Standard(session)) => session.retry(),
            Some(ActiveSession::DuckHunt(session)) => session.start(),
            None => return,
        }
        self.recorded = false;
        self.scheduler.start();
    }

    /// Advance to the next built-in level after a completed one
    pub fn next_level(&mut self) -> bool {
        let Some(ActiveSession::Standard(session)) = &mut self.session else {
            return false;
        };
        if !session.next_level() {
            return false;
        }
        self.recorded = false;
        self.scheduler.start();
        true
    }

    /// Drop the session and stop ticking
    pub fn abandon(&mut self) {
        self.scheduler.stop();
        self.session = None;
    }

    /// Latest tracker output for one hand; `None` when no hand is detected
    pub fn submit_hand_frame(&mut self, player: PlayerId, frame: Option<HandFrame>) {
        self.frames[player.index()] = frame;
    }

    /// Camera or tracker failure. While set, ticks are not forwarded.
    pub fn set_input_error(&mut self, error: Option<String>) {
        if let Some(message) = &error {
            log::warn!("Input unavailable: {message}");
        } else if self.input_error.is_some() {
            log::info!("Input restored");
        }
        self.input_error = error;
    }

    /// Feed one raw animation frame. Returns whether a simulation tick ran.
    pub fn on_frame(&mut self, timestamp_ms: f64) -> bool {
        let mut delta = None;
        if !self.scheduler.on_frame(timestamp_ms, |d| delta = Some(d)) {
            return false;
        }
        if let Some(delta_ms) = delta {
            self.step(delta_ms, timestamp_ms);
        }
        true
    }

    /// One simulation tick: interpreters, then the session, then bookkeeping
    pub fn step(&mut self, delta_ms: f64, now_ms: f64) {
        if self.input_error.is_some() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        self.last_tick_time = now_ms;

        let mapping = self.settings.aim_mapping();
        let mut gestures = [GestureState::default(); 2];
        for &player in session.players() {
            let i = player.index();
            let rapid_fire = match session {
                ActiveSession::Standard(s) => {
                    s.state().has_power_up(PowerUpKind::RapidFire, Some(player), now_ms)
                }
                ActiveSession::DuckHunt(_) => false,
            };
            self.interpreters[i].set_cooldown_scale(if rapid_fire { RAPID_FIRE_COOLDOWN_SCALE } else { 1.0 });
            gestures[i] = self.interpreters[i].process(self.frames[i].as_ref(), now_ms, self.screen, mapping);
        }
        self.gestures = gestures;

        let input = TickInput {
            gestures,
            limited_ammo: self.settings.limited_ammo,
            screen_shake: self.settings.effective_screen_shake(),
        };
        let events = match session {
            ActiveSession::Standard(s) => {
                s.tick(&input, delta_ms, now_ms);
                s.drain_events()
            }
            ActiveSession::DuckHunt(s) => {
                s.tick(&input, delta_ms, now_ms);
                s.drain_events()
            }
        };

        for event in &events {
            self.achievements.record_event(event, now_ms);
        }
        self.events.extend(events);

        if session.status().is_finished() && !self.recorded {
            self.record_session_end(now_ms);
        }
    }

    /// Scores, progress and stats for a session that just ended
    fn record_session_end(&mut self, now_ms: f64) {
        let Some(session) = &self.session else {
            return;
        };
        self.recorded = true;
        self.scheduler.stop();
        let label = session.label();

        let (score, wave, summary) = match session {
            ActiveSession::Standard(s) => {
                let state = s.state();
                let players = s.mode().players();
                let shots = players.iter().map(|p| state.player(*p).shots).sum();
                let hits = players.iter().map(|p| state.player(*p).hits).sum();
                let score = match s.mode() {
                    GameMode::Versus { .. } => state.players.iter().map(|p| p.score).max().unwrap_or(0),
                    _ => state.score,
                };
                if let GameMode::Level(level) = s.mode() {
                    if self.progress.record_result(level, state.score) {
                        log::info!("New best on level {}: {}", level.id, state.score);
                    }
                }
                let summary = SessionSummary {
                    score: state.score,
                    shots,
                    hits,
                    coop_win: matches!(s.mode(), GameMode::CoOp) && state.score >= COOP_WIN_SCORE,
                };
                (score, state.wave, summary)
            }
            ActiveSession::DuckHunt(s) => (
                s.score,
                s.round,
                SessionSummary {
                    score: s.score,
                    shots: s.shots,
                    hits: s.hits,
                    coop_win: false,
                },
            ),
        };

        self.achievements.record_session_end(summary, now_ms);
        self.high_scores.add_score(score.max(0) as u64, wave, &label, now_ms);

        self.high_scores.save(self.store.as_mut());
        self.progress.save(self.store.as_mut());
        self.achievements.save(self.store.as_mut());
        log::info!("{label} finished with {score}");
    }

    /// Notifications since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Outcome of the current session, once it has ended
    pub fn outcome(&self) -> Option<Outcome> {
        match self.session.as_ref()? {
            ActiveSession::Standard(s) => s.state().outcome,
            ActiveSession::DuckHunt(s) => s.outcome,
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let (session, duck_hunt) = match &self.session {
            Some(ActiveSession::Standard(s)) => (Some(s.snapshot(self.last_tick_time)), None),
            Some(ActiveSession::DuckHunt(s)) => (None, Some(s.snapshot())),
            None => (None, None),
        };
        GameSnapshot {
            session,
            duck_hunt,
            gestures: self.gestures,
            input_error: self.input_error.clone(),
            debug: if self.settings.show_debug {
                self.interpreters[0].debug_info()
            } else {
                None
            },
            sfx_volume: self.settings.effective_sfx_volume(),
            music_volume: self.settings.effective_music_volume(),
        }
    }
}
