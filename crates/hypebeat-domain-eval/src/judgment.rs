use hypebeat_ports::types::{AudioTime, Rating, TargetId, Zone};
use serde::{Deserialize, Serialize};

/// Accuracy windows in seconds, measured as |tap - hit time|.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingWindows {
    pub perfect: AudioTime,
    pub good: AudioTime,
    /// How long after its hit time an untouched target survives before it is
    /// auto-missed.
    pub grace: AudioTime,
}

impl Default for TimingWindows {
    fn default() -> Self {
        Self {
            perfect: 0.05,
            good: 0.15,
            grace: 0.25,
        }
    }
}

impl TimingWindows {
    /// `None` when the delta is outside the good window.
    pub fn rate(&self, delta: AudioTime) -> Option<Rating> {
        let abs = delta.abs();
        if abs <= self.perfect {
            Some(Rating::Perfect)
        } else if abs <= self.good {
            Some(Rating::Good)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    pub rating: Rating,
    pub zone: Zone,
    /// `None` for an auto-miss, which has no tap behind it.
    pub target_id: Option<TargetId>,
    /// Tap time minus hit time; positive when late. Zero for auto-misses.
    pub delta: AudioTime,
}

impl HitResult {
    pub fn tapped(rating: Rating, zone: Zone, target_id: TargetId, delta: AudioTime) -> Self {
        Self {
            rating,
            zone,
            target_id: Some(target_id),
            delta,
        }
    }

    pub fn auto_miss(zone: Zone) -> Self {
        Self {
            rating: Rating::Miss,
            zone,
            target_id: None,
            delta: 0.0,
        }
    }
}
