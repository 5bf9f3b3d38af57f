use crate::observer::{Listeners, Subscription};
use hypebeat_domain_eval::{HitResult, TimingWindows};
use hypebeat_domain_song::{BeatSlot, SongDef};
use hypebeat_ports::storage::SettingsDto;
use hypebeat_ports::types::{AudioTime, Column, Half, TargetId, Zone};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayField {
    pub width: f64,
    pub height: f64,
    /// Y of the horizontal rail targets fall onto; taps above it are "upper".
    pub rail_y: f64,
}

impl PlayField {
    pub fn from_settings(settings: &SettingsDto) -> Self {
        Self {
            width: settings.play_field_width,
            height: settings.play_field_height,
            rail_y: settings.rail_y,
        }
    }

    /// Out-of-field x resolves to the nearest edge column.
    pub fn column_at(&self, x: f64) -> Column {
        if x.is_nan() || self.width.is_nan() || self.width <= 0.0 {
            return Column::Center;
        }
        let third = (x / (self.width / 3.0)).floor();
        if third < 1.0 {
            Column::Left
        } else if third < 2.0 {
            Column::Center
        } else {
            Column::Right
        }
    }

    pub fn half_at(&self, y: f64) -> Half {
        if y < self.rail_y {
            Half::Upper
        } else {
            Half::Lower
        }
    }
}

impl Default for PlayField {
    fn default() -> Self {
        Self::from_settings(&SettingsDto::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetState {
    Active,
    Hit,
    Missed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RhythmTarget {
    pub id: TargetId,
    pub zone: Zone,
    pub hit_time: AudioTime,
    pub spawn_time: AudioTime,
    pub state: TargetState,
    /// 0 at spawn, 1 on the rail. Rendering only.
    pub progress: f64,
}

/// Owns the live falling targets and turns taps into judgments.
///
/// Targets are kept in creation order; that order breaks exact ties when two
/// targets in one column are equally close to a tap.
pub struct RhythmLane {
    windows: TimingWindows,
    field: PlayField,
    sec_per_beat: AudioTime,
    travel_seconds: AudioTime,
    total_beats: u64,
    pattern: Vec<BeatSlot>,
    targets: Vec<RhythmTarget>,
    next_id: TargetId,
    running: bool,
    hit_listeners: Listeners<HitResult>,
    miss_listeners: Listeners<Zone>,
}

impl RhythmLane {
    pub fn new(song: &SongDef, field: PlayField) -> Self {
        Self {
            windows: TimingWindows::default(),
            field,
            sec_per_beat: song.sec_per_beat(),
            travel_seconds: song.travel_seconds(),
            total_beats: song.total_beats(),
            pattern: song.beat_pattern.clone(),
            targets: Vec::new(),
            next_id: 0,
            running: false,
            hit_listeners: Listeners::new(),
            miss_listeners: Listeners::new(),
        }
    }

    pub fn with_windows(mut self, windows: TimingWindows) -> Self {
        self.windows = windows;
        self
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Drops every live target without reporting it.
    pub fn stop(&mut self) {
        self.running = false;
        self.targets.clear();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn targets(&self) -> &[RhythmTarget] {
        &self.targets
    }

    pub fn field(&self) -> PlayField {
        self.field
    }

    pub fn on_hit(&mut self, listener: impl FnMut(&HitResult) + 'static) -> Subscription {
        self.hit_listeners.subscribe(listener)
    }

    pub fn on_miss(&mut self, listener: impl FnMut(&Zone) + 'static) -> Subscription {
        self.miss_listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.hit_listeners.unsubscribe(subscription)
            || self.miss_listeners.unsubscribe(subscription)
    }

    pub fn clear_listeners(&mut self) {
        self.hit_listeners.clear();
        self.miss_listeners.clear();
    }

    /// Spawns one target per zone in the beat's slot and returns their ids.
    /// Beats past the end of the song spawn nothing.
    pub fn on_beat_fired(&mut self, beat_index: u64, beat_time: AudioTime) -> Vec<TargetId> {
        if !self.running || self.pattern.is_empty() || beat_index >= self.total_beats {
            return Vec::new();
        }
        let slot = (beat_index % self.pattern.len() as u64) as usize;
        let hit_time = beat_time + self.travel_seconds;

        let mut spawned = Vec::with_capacity(self.pattern[slot].zones.len());
        for &zone in &self.pattern[slot].zones {
            let id = self.next_id;
            self.next_id += 1;
            self.targets.push(RhythmTarget {
                id,
                zone,
                hit_time,
                spawn_time: hit_time - self.travel_seconds,
                state: TargetState::Active,
                progress: 0.0,
            });
            spawned.push(id);
        }
        if !spawned.is_empty() {
            log::debug!(
                "beat {}: spawned {} target(s) hitting at {:.3}s",
                beat_index,
                spawned.len(),
                hit_time
            );
        }
        spawned
    }

    /// Advances rendering progress and auto-misses targets whose grace period
    /// ran out. Returned zones are in creation order, the same order miss
    /// listeners saw them.
    pub fn update(&mut self, audio_now: AudioTime) -> Vec<Zone> {
        let mut missed = Vec::new();
        for target in self.targets.iter_mut() {
            if target.state != TargetState::Active {
                continue;
            }
            if audio_now > target.hit_time + self.windows.grace {
                target.state = TargetState::Missed;
                missed.push(target.zone);
            } else {
                target.progress =
                    ((audio_now - target.spawn_time) / self.travel_seconds).clamp(0.0, 1.0);
            }
        }
        self.targets.retain(|t| t.state == TargetState::Active);

        for zone in &missed {
            self.miss_listeners.emit(zone);
        }
        missed
    }

    /// Judges a tap against the closest active target in the tapped column.
    /// `None` means nothing was close enough: a cosmetic tap with no score
    /// effect.
    pub fn try_hit(&mut self, x: f64, _y: f64, audio_now: AudioTime) -> Option<HitResult> {
        let column = self.field.column_at(x);

        let mut best: Option<(usize, AudioTime)> = None;
        for (idx, target) in self.targets.iter().enumerate() {
            if target.state != TargetState::Active || target.zone.column() != column {
                continue;
            }
            let delta = audio_now - target.hit_time;
            if delta.abs() > self.windows.good {
                continue;
            }
            match best {
                Some((_, best_delta)) if best_delta.abs() <= delta.abs() => {}
                _ => best = Some((idx, delta)),
            }
        }

        let (idx, delta) = best?;
        let rating = self.windows.rate(delta)?;
        self.targets[idx].state = TargetState::Hit;
        let target = self.targets.remove(idx);

        let result = HitResult::tapped(rating, target.zone, target.id, delta);
        self.hit_listeners.emit(&result);
        Some(result)
    }

    /// Pure coordinate mapping used for cosmetic reactions to unjudged taps.
    pub fn tap_zone(&self, x: f64, y: f64) -> Zone {
        Zone::new(self.field.column_at(x), self.field.half_at(y))
    }

    pub fn sec_per_beat(&self) -> AudioTime {
        self.sec_per_beat
    }

    pub fn travel_seconds(&self) -> AudioTime {
        self.travel_seconds
    }
}
