use hypebeat_ports::types::{AudioTime, Zone};
use serde::{Deserialize, Serialize};

pub const SLOTS_PER_BAR: u32 = 4;
/// Beats a target spends falling before its hit time.
pub const TRAVEL_BEATS: u32 = 4;
/// Fastest tempo a song may declare.
pub const MAX_BPM: f64 = 1000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicStyle {
    Funk,
    Disco,
    HipHop,
    Techno,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

/// Zones that get a target on one beat. Empty slots are rests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatSlot {
    pub zones: Vec<Zone>,
}

impl BeatSlot {
    pub fn rest() -> Self {
        Self { zones: Vec::new() }
    }

    pub fn of(zones: &[Zone]) -> Self {
        Self {
            zones: zones.to_vec(),
        }
    }

    pub fn is_rest(&self) -> bool {
        self.zones.is_empty()
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SongError {
    #[error("song {0}: beat pattern is empty")]
    EmptyPattern(String),
    #[error("song {0}: bar count must be positive")]
    NoBars(String),
    #[error("song {id}: invalid tempo {bpm}")]
    InvalidTempo { id: String, bpm: f64 },
    #[error("song {id}: slot {slot} lists zone {zone} twice")]
    DuplicateZone { id: String, slot: usize, zone: Zone },
    #[error("unknown song: {0}")]
    UnknownSong(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SongDef {
    pub id: String,
    pub name: String,
    pub bpm: f64,
    pub style: MusicStyle,
    pub difficulty: Difficulty,
    pub bar_count: u32,
    pub beat_pattern: Vec<BeatSlot>,
}

impl SongDef {
    /// Rejects songs the lane and session cannot run: a pattern without slots
    /// would never end by beat count, and a zero tempo has no beat length.
    pub fn validate(&self) -> Result<(), SongError> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 || self.bpm > MAX_BPM {
            return Err(SongError::InvalidTempo {
                id: self.id.clone(),
                bpm: self.bpm,
            });
        }
        if self.bar_count == 0 {
            return Err(SongError::NoBars(self.id.clone()));
        }
        if self.beat_pattern.is_empty() {
            return Err(SongError::EmptyPattern(self.id.clone()));
        }
        for (slot_idx, slot) in self.beat_pattern.iter().enumerate() {
            for (i, zone) in slot.zones.iter().enumerate() {
                if slot.zones[..i].contains(zone) {
                    return Err(SongError::DuplicateZone {
                        id: self.id.clone(),
                        slot: slot_idx,
                        zone: *zone,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn sec_per_beat(&self) -> AudioTime {
        60.0 / self.bpm
    }

    /// Shared by target rendering and judgment so both agree on arrival.
    pub fn travel_seconds(&self) -> AudioTime {
        TRAVEL_BEATS as f64 * self.sec_per_beat()
    }

    pub fn total_beats(&self) -> u64 {
        self.bar_count as u64 * SLOTS_PER_BAR as u64
    }

    /// Zones for a beat; the pattern loops. Empty for rests and empty patterns.
    pub fn zones_for_beat(&self, beat_index: u64) -> &[Zone] {
        if self.beat_pattern.is_empty() {
            return &[];
        }
        let idx = (beat_index % self.beat_pattern.len() as u64) as usize;
        &self.beat_pattern[idx].zones
    }

    pub fn target_count(&self) -> usize {
        (0..self.total_beats())
            .map(|beat| self.zones_for_beat(beat).len())
            .sum()
    }

    pub fn duration_seconds(&self) -> AudioTime {
        self.total_beats() as f64 * self.sec_per_beat()
    }
}
