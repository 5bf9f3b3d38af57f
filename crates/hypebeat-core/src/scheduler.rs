use crate::observer::{Listeners, Subscription};
use hypebeat_domain_song::{MusicStyle, SongDef, SLOTS_PER_BAR};
use hypebeat_ports::clock::AudioClockPort;
use hypebeat_ports::synth::{DrumHit, DrumPort, DrumVoice};
use hypebeat_ports::types::AudioTime;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on beats booked by one `poll`; the rest wait for the next one.
pub const MAX_BEATS_PER_POLL: usize = 256;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    pub lookahead_ms: u32,
    pub poll_interval_ms: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookahead_ms: 100,
            poll_interval_ms: 25,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeatEvent {
    pub beat_index: u64,
    pub at: AudioTime,
}

/// (offset in beats, voice, velocity)
type GrooveStep = (f64, DrumVoice, f32);

const FUNK: [&[GrooveStep]; 4] = [
    &[(0.0, DrumVoice::Kick, 1.0), (0.0, DrumVoice::Bass, 0.9), (0.5, DrumVoice::HiHat, 0.5)],
    &[(0.0, DrumVoice::Snare, 0.9), (0.5, DrumVoice::HiHat, 0.5), (0.75, DrumVoice::Kick, 0.6)],
    &[(0.0, DrumVoice::HiHat, 0.6), (0.5, DrumVoice::Kick, 0.8), (0.5, DrumVoice::Bass, 0.7)],
    &[(0.0, DrumVoice::Snare, 0.9), (0.5, DrumVoice::OpenHat, 0.5)],
];

const DISCO: [&[GrooveStep]; 4] = [
    &[(0.0, DrumVoice::Kick, 1.0), (0.0, DrumVoice::Bass, 0.8), (0.5, DrumVoice::OpenHat, 0.6)],
    &[(0.0, DrumVoice::Kick, 1.0), (0.0, DrumVoice::Clap, 0.8), (0.5, DrumVoice::OpenHat, 0.6)],
    &[(0.0, DrumVoice::Kick, 1.0), (0.5, DrumVoice::Bass, 0.7), (0.5, DrumVoice::OpenHat, 0.6)],
    &[(0.0, DrumVoice::Kick, 1.0), (0.0, DrumVoice::Clap, 0.8), (0.5, DrumVoice::OpenHat, 0.6)],
];

const HIP_HOP: [&[GrooveStep]; 4] = [
    &[(0.0, DrumVoice::Kick, 1.0), (0.0, DrumVoice::Bass, 1.0), (0.5, DrumVoice::HiHat, 0.4)],
    &[(0.0, DrumVoice::Snare, 1.0), (0.5, DrumVoice::HiHat, 0.4)],
    &[(0.0, DrumVoice::HiHat, 0.4), (0.25, DrumVoice::Kick, 0.7), (0.75, DrumVoice::Kick, 0.8)],
    &[(0.0, DrumVoice::Snare, 1.0), (0.5, DrumVoice::HiHat, 0.4)],
];

const TECHNO: [&[GrooveStep]; 4] = [
    &[(0.0, DrumVoice::Kick, 1.0), (0.5, DrumVoice::HiHat, 0.7), (0.5, DrumVoice::Bass, 0.8)],
    &[
        (0.0, DrumVoice::Kick, 1.0),
        (0.0, DrumVoice::Clap, 0.7),
        (0.5, DrumVoice::HiHat, 0.7),
        (0.5, DrumVoice::Bass, 0.8),
    ],
    &[(0.0, DrumVoice::Kick, 1.0), (0.5, DrumVoice::HiHat, 0.7), (0.5, DrumVoice::Bass, 0.8)],
    &[
        (0.0, DrumVoice::Kick, 1.0),
        (0.0, DrumVoice::Clap, 0.7),
        (0.5, DrumVoice::OpenHat, 0.8),
        (0.5, DrumVoice::Bass, 0.8),
    ],
];

fn groove(style: MusicStyle, beat_index: u64) -> &'static [GrooveStep] {
    let table = match style {
        MusicStyle::Funk => &FUNK,
        MusicStyle::Disco => &DISCO,
        MusicStyle::HipHop => &HIP_HOP,
        MusicStyle::Techno => &TECHNO,
    };
    table[(beat_index % SLOTS_PER_BAR as u64) as usize]
}

/// Lookahead beat scheduler.
///
/// The host calls `poll` from a coarse timer. Each poll books every beat that
/// starts before `now + lookahead`, so a late timer callback still delivers
/// beats (and their drum hits) ahead of their audible time. Beat times come
/// from an accumulator anchored to the audio clock, never from the time the
/// poll happened to run.
pub struct BeatScheduler {
    config: SchedulerConfig,
    sec_per_beat: AudioTime,
    style: MusicStyle,
    running: bool,
    beat_index: u64,
    next_beat_time: AudioTime,
    listeners: Listeners<BeatEvent>,
    drums: Option<Box<dyn DrumPort>>,
}

impl BeatScheduler {
    pub fn new(song: &SongDef, config: SchedulerConfig) -> Self {
        Self {
            config,
            sec_per_beat: song.sec_per_beat(),
            style: song.style,
            running: false,
            beat_index: 0,
            next_beat_time: 0.0,
            listeners: Listeners::new(),
            drums: None,
        }
    }

    pub fn with_drums(mut self, drums: Box<dyn DrumPort>) -> Self {
        self.drums = Some(drums);
        self
    }

    pub fn start(&mut self, start_audio_time: AudioTime) {
        self.running = true;
        self.beat_index = 0;
        self.next_beat_time = start_audio_time;
        log::debug!(
            "scheduler started at {:.3}s ({:.3}s per beat)",
            start_audio_time,
            self.sec_per_beat
        );
    }

    pub fn stop(&mut self) {
        if self.running {
            log::debug!("scheduler stopped after {} beats", self.beat_index);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn on_beat(&mut self, listener: impl FnMut(&BeatEvent) + 'static) -> Subscription {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.listeners.unsubscribe(subscription)
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms as u64)
    }

    /// Beats booked so far; also the index of the next beat.
    pub fn beats_scheduled(&self) -> u64 {
        self.beat_index
    }

    pub fn next_beat_time(&self) -> AudioTime {
        self.next_beat_time
    }

    pub fn poll(&mut self, clock: &dyn AudioClockPort) -> Vec<BeatEvent> {
        if !self.running {
            return Vec::new();
        }
        let Some(now) = clock.now_seconds() else {
            return Vec::new();
        };

        let horizon = now + self.config.lookahead_ms as f64 / 1000.0;
        let mut fired = Vec::new();
        while self.next_beat_time < horizon {
            if fired.len() >= MAX_BEATS_PER_POLL {
                log::warn!(
                    "booked {} beats in one poll, deferring the rest",
                    MAX_BEATS_PER_POLL
                );
                break;
            }
            let event = BeatEvent {
                beat_index: self.beat_index,
                at: self.next_beat_time,
            };
            self.book_groove(event);
            self.listeners.emit(&event);
            fired.push(event);

            self.beat_index += 1;
            self.next_beat_time += self.sec_per_beat;
        }
        fired
    }

    fn book_groove(&mut self, event: BeatEvent) {
        let Some(drums) = self.drums.as_mut() else {
            return;
        };
        for &(offset, voice, velocity) in groove(self.style, event.beat_index) {
            drums.trigger(DrumHit {
                voice,
                at: event.at + offset * self.sec_per_beat,
                velocity,
            });
        }
    }
}
