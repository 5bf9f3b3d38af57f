use hypebeat_ports::clock::AudioClockPort;
use hypebeat_ports::types::AudioTime;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Clock fed by an audio callback: the callback advances the rendered sample
/// count, the game thread reads it. Unavailable until the first `set`/`advance`.
#[derive(Debug)]
pub struct SampleClock {
    sample_time: AtomicU64,
    sample_rate_hz: AtomicU32,
    started: AtomicBool,
}

impl SampleClock {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            sample_time: AtomicU64::new(0),
            sample_rate_hz: AtomicU32::new(sample_rate_hz.max(1)),
            started: AtomicBool::new(false),
        }
    }

    pub fn set(&self, sample_time: u64) {
        self.sample_time.store(sample_time, Ordering::Relaxed);
        self.started.store(true, Ordering::Release);
    }

    pub fn advance(&self, frames: u32) {
        self.sample_time.fetch_add(frames as u64, Ordering::Relaxed);
        self.started.store(true, Ordering::Release);
    }

    pub fn set_sample_rate(&self, sample_rate_hz: u32) {
        self.sample_rate_hz.store(sample_rate_hz.max(1), Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.sample_time.load(Ordering::Relaxed)
    }
}

impl Default for SampleClock {
    fn default() -> Self {
        Self::new(48_000)
    }
}

impl AudioClockPort for SampleClock {
    fn now_seconds(&self) -> Option<AudioTime> {
        if !self.started.load(Ordering::Acquire) {
            return None;
        }
        let rate = self.sample_rate_hz.load(Ordering::Relaxed) as f64;
        Some(self.get() as f64 / rate)
    }
}

/// Hand-driven clock for tests and offline simulation.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Option<AudioTime>>,
}

impl ManualClock {
    pub fn new(now: AudioTime) -> Self {
        Self {
            now: Cell::new(Some(now)),
        }
    }

    pub fn unavailable() -> Self {
        Self { now: Cell::new(None) }
    }

    pub fn set(&self, now: AudioTime) {
        self.now.set(Some(now));
    }

    pub fn advance(&self, dt: AudioTime) {
        self.now.set(Some(self.now.get().unwrap_or(0.0) + dt));
    }

    pub fn disable(&self) {
        self.now.set(None);
    }
}

impl AudioClockPort for ManualClock {
    fn now_seconds(&self) -> Option<AudioTime> {
        self.now.get()
    }
}
