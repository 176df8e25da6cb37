//! Frame-rate and pause accounting shared between the frame loop and
//! the session.
//!
//! The reported fps is the integer mean of per-frame `1/dt` samples.
//! Counters are seeded rather than zeroed so the very first report
//! already reads 60, and they only rewind after a step report actually
//! reaches the server. Samples taken during a failed exchange fold
//! into the next successful report.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const FPS_SEED_SUM: u32 = 60;
const FPS_SEED_COUNT: u32 = 1;

#[derive(Debug)]
pub struct Telemetry {
    fps_sum: AtomicU32,
    fps_count: AtomicU32,
    pause_us: AtomicU64,
    episode_pause_us: AtomicU64,
    episode_started: Mutex<Instant>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            fps_sum: AtomicU32::new(FPS_SEED_SUM),
            fps_count: AtomicU32::new(FPS_SEED_COUNT),
            pause_us: AtomicU64::new(0),
            episode_pause_us: AtomicU64::new(0),
            episode_started: Mutex::new(Instant::now()),
        }
    }

    /// Fold one rendered frame into the counters. Frozen frames also
    /// grow the pause clock.
    pub fn record_frame(&self, dt_seconds: f32, frozen: bool) {
        if dt_seconds > f32::EPSILON {
            self.fps_sum
                .fetch_add((1.0 / dt_seconds) as u32, Ordering::Relaxed);
            self.fps_count.fetch_add(1, Ordering::Relaxed);
        }
        if frozen {
            self.pause_us
                .fetch_add((dt_seconds * 1_000_000.0) as u64, Ordering::Relaxed);
        }
    }

    /// Mean frame rate over the samples gathered so far.
    pub fn fps(&self) -> u32 {
        let sum = self.fps_sum.load(Ordering::Relaxed);
        let count = self.fps_count.load(Ordering::Relaxed).max(1);
        sum / count
    }

    /// Seconds spent frozen since the last accepted step report.
    pub fn pause_seconds(&self) -> f32 {
        self.pause_us.load(Ordering::Relaxed) as f32 / 1_000_000.0
    }

    /// Frozen time accumulated over the whole episode.
    pub fn episode_pause_seconds(&self) -> f32 {
        self.episode_pause_us.load(Ordering::Relaxed) as f32 / 1_000_000.0
    }

    /// Wall-clock age of the running episode.
    pub fn episode_elapsed(&self) -> Duration {
        match self.episode_started.lock() {
            Ok(started) => started.elapsed(),
            Err(poisoned) => poisoned.into_inner().elapsed(),
        }
    }

    /// A step report reached the server: rewind the fps counters to
    /// their seeds and move the pending pause into the episode total.
    pub fn step_reported(&self) {
        self.fps_sum.store(FPS_SEED_SUM, Ordering::Relaxed);
        self.fps_count.store(FPS_SEED_COUNT, Ordering::Relaxed);
        let pending = self.pause_us.swap(0, Ordering::Relaxed);
        self.episode_pause_us.fetch_add(pending, Ordering::Relaxed);
    }

    /// A reset was acknowledged: drop all pause debt and restamp the
    /// episode clock.
    pub fn episode_restarted(&self) {
        self.pause_us.store(0, Ordering::Relaxed);
        self.episode_pause_us.store(0, Ordering::Relaxed);
        match self.episode_started.lock() {
            Ok(mut started) => *started = Instant::now(),
            Err(poisoned) => *poisoned.into_inner() = Instant::now(),
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}
