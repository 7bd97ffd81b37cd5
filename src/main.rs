//! Shootman entry point
//!
//! Natively this runs a headless demo: a scripted hand sweeps across the
//! screen and pulls the trigger every half second through an endless
//! session. The browser build embeds the library instead.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;
    use shootman::gesture::landmarks::poses;
    use shootman::persistence::MemoryStore;
    use shootman::scheduler::ManualDriver;
    use shootman::sim::{GameEvent, GameMode};
    use shootman::{Game, PlayerId, Screen};

    const FRAME_MS: f64 = 16.0;
    const DEMO_SECS: f64 = 60.0;

    shootman::init_logging();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(42);
    log::info!("Shootman headless demo (seed {seed})");

    let mut game = Game::new(ManualDriver::default(), Box::new(MemoryStore::new()), Screen::default());
    game.start_session(GameMode::Endless, seed);

    let (mut kills, mut shots) = (0u32, 0u32);
    let mut now = 0.0;
    while now < DEMO_SECS * 1000.0 {
        // Slow figure-eight over the middle of the camera frame
        let phase = (now / 1000.0) as f32;
        let drift = Vec2::new(0.25 * phase.sin(), 0.15 * (2.0 * phase).sin());
        let pressed = if now % 500.0 < 100.0 { 1.0 } else { 0.0 };
        game.submit_hand_frame(PlayerId::One, Some(poses::gun(pressed).translated(drift)));
        game.on_frame(now);

        for event in game.drain_events() {
            match event {
                GameEvent::ShotFired { .. } => shots += 1,
                GameEvent::TargetHit { .. } => kills += 1,
                GameEvent::SessionEnded { outcome } => log::info!("Session ended: {outcome:?}"),
                _ => {}
            }
        }
        if game.outcome().is_some() {
            break;
        }
        now += FRAME_MS;
    }

    let snapshot = game.snapshot();
    if let Some(session) = snapshot.session {
        log::info!(
            "{:.1}s: score {} wave {} lives {} ({kills} kills from {shots} shots)",
            now / 1000.0,
            session.score,
            session.wave,
            session.lives
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web build drives `shootman::Game` from the host page
}
