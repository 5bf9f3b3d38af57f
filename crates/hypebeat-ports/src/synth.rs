use crate::types::AudioTime;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrumVoice {
    Kick,
    Snare,
    Clap,
    HiHat,
    OpenHat,
    Bass,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrumHit {
    pub voice: DrumVoice,
    pub at: AudioTime,
    pub velocity: f32,
}

/// Sound backend for the beat groove.
///
/// Hits are booked ahead of time: `hit.at` is usually in the near future and the
/// backend must start the sound exactly then, not when `trigger` is called.
pub trait DrumPort {
    fn trigger(&mut self, hit: DrumHit);
}
