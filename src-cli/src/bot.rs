use hypebeat_core::{PlayField, SessionEvent};
use hypebeat_ports::types::{AudioTime, Column, Half, Zone};
use rand::Rng;

/// How the simulated player behaves.
#[derive(Clone, Copy, Debug)]
pub struct Skill {
    /// Taps land uniformly within +/- this many seconds of the hit time.
    pub jitter: AudioTime,
    /// Chance of ignoring a target entirely.
    pub miss_rate: f64,
    /// Chance of a stray tap on each spawned target's beat.
    pub stray_rate: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedTap {
    pub at: AudioTime,
    pub x: f64,
    pub y: f64,
}

/// Plans taps from spawn events; the host fires them once the clock passes.
pub struct AutoPlayer<R> {
    skill: Skill,
    field: PlayField,
    rng: R,
    pending: Vec<PlannedTap>,
}

impl<R: Rng> AutoPlayer<R> {
    pub fn new(skill: Skill, field: PlayField, rng: R) -> Self {
        Self {
            skill,
            field,
            rng,
            pending: Vec::new(),
        }
    }

    pub fn observe(&mut self, event: &SessionEvent) {
        let SessionEvent::TargetSpawned { zone, hit_time, .. } = event else {
            return;
        };
        if self.skill.stray_rate > 0.0 && self.rng.random_bool(self.skill.stray_rate.min(1.0)) {
            let (x, y) = self.zone_center(*zone);
            self.pending.push(PlannedTap {
                at: hit_time - 1.0,
                x: self.field.width - x,
                y,
            });
        }
        if self.skill.miss_rate > 0.0 && self.rng.random_bool(self.skill.miss_rate.min(1.0)) {
            return;
        }
        let offset = if self.skill.jitter > 0.0 {
            self.rng.random_range(-self.skill.jitter..=self.skill.jitter)
        } else {
            0.0
        };
        let (x, y) = self.zone_center(*zone);
        self.pending.push(PlannedTap {
            at: hit_time + offset,
            x,
            y,
        });
    }

    /// Removes and returns the taps due at `now`, earliest first.
    pub fn due(&mut self, now: AudioTime) -> Vec<PlannedTap> {
        let mut due: Vec<PlannedTap> = Vec::new();
        self.pending.retain(|tap| {
            if tap.at <= now {
                due.push(*tap);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.at.total_cmp(&b.at));
        due
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn zone_center(&self, zone: Zone) -> (f64, f64) {
        let third = self.field.width / 3.0;
        let x = match zone.column() {
            Column::Left => third * 0.5,
            Column::Center => third * 1.5,
            Column::Right => third * 2.5,
        };
        let y = match zone.half() {
            Half::Upper => self.field.rail_y * 0.5,
            Half::Lower => (self.field.rail_y + self.field.height) * 0.5,
        };
        (x, y)
    }
}
