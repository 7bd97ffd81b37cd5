//! Fixed-step scheduler
//!
//! Turns a variable-rate frame source (requestAnimationFrame in a browser,
//! a timer loop natively) into simulation ticks at a fixed interval.

use crate::consts::{MAX_FRAME_DELTA_MS, TARGET_FPS};

/// Source of frame callbacks
pub trait FrameDriver {
    /// Ask for one more frame; returns a handle for cancellation
    fn request_frame(&mut self) -> u32;
    /// Cancel a previously requested frame
    fn cancel_frame(&mut self, handle: u32);
}

/// Driver that only hands out handles. The owner pumps frames itself
/// (headless runs, tests).
#[derive(Debug, Default)]
pub struct ManualDriver {
    next_handle: u32,
    pub pending: Option<u32>,
    pub cancelled: u32,
}

impl FrameDriver for ManualDriver {
    fn request_frame(&mut self) -> u32 {
        self.next_handle += 1;
        self.pending = Some(self.next_handle);
        self.next_handle
    }

    fn cancel_frame(&mut self, handle: u32) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
        self.cancelled += 1;
    }
}

/// Accumulator-based fixed-step scheduler
#[derive(Debug)]
pub struct FixedStepScheduler<D: FrameDriver> {
    driver: D,
    interval_ms: f64,
    max_delta_ms: f64,
    running: bool,
    pending: Option<u32>,
    previous_frame: Option<f64>,
    accumulator: f64,
    /// Wall time since the last tick, reported as the tick delta
    since_tick: f64,
}

impl<D: FrameDriver> FixedStepScheduler<D> {
    pub fn new(driver: D) -> Self {
        Self::with_fps(driver, TARGET_FPS)
    }

    pub fn with_fps(driver: D, fps: f64) -> Self {
        Self {
            driver,
            interval_ms: 1000.0 / fps.max(1.0),
            max_delta_ms: MAX_FRAME_DELTA_MS,
            running: false,
            pending: None,
            previous_frame: None,
            accumulator: 0.0,
            since_tick: 0.0,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Begin requesting frames. No-op while already running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.clear_timing();
        self.pending = Some(self.driver.request_frame());
        log::debug!("Scheduler started ({:.2} ms interval)", self.interval_ms);
    }

    /// Cancel the pending frame and forget timing so the next start is clean
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.driver.cancel_frame(handle);
        }
        if self.running {
            log::debug!("Scheduler stopped");
        }
        self.running = false;
        self.clear_timing();
    }

    fn clear_timing(&mut self) {
        self.previous_frame = None;
        self.accumulator = 0.0;
        self.since_tick = 0.0;
    }

    /// Handle one raw frame. Invokes `tick` at most once with the elapsed
    /// delta (ms, capped). Returns whether a tick ran.
    pub fn on_frame(&mut self, timestamp_ms: f64, mut tick: impl FnMut(f64)) -> bool {
        if !self.running {
            return false;
        }
        self.pending = None;

        let ticked = match self.previous_frame {
            None => {
                // First frame only primes timing
                self.previous_frame = Some(timestamp_ms);
                false
            }
            Some(previous) => {
                let elapsed = (timestamp_ms - previous).max(0.0);
                self.previous_frame = Some(timestamp_ms);
                self.accumulator += elapsed;
                self.since_tick += elapsed;

                if self.accumulator >= self.interval_ms {
                    tick(self.since_tick.min(self.max_delta_ms));
                    self.since_tick = 0.0;
                    // Carry the remainder, but never a whole extra interval
                    self.accumulator -= self.interval_ms;
                    if self.accumulator >= self.interval_ms {
                        self.accumulator %= self.interval_ms;
                    }
                    true
                } else {
                    false
                }
            }
        };

        self.pending = Some(self.driver.request_frame());
        ticked
    }
}
