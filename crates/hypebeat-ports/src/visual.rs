use crate::types::{Rating, Zone};

/// Cosmetic consumer of gameplay feedback (character rig, crowd, stage lights).
/// Purely informational; implementations must return promptly.
pub trait VisualSink {
    fn on_judgment(&mut self, zone: Zone, rating: Rating);
    fn on_combo_milestone(&mut self, combo: u32);
    fn on_perfect_streak(&mut self, _streak: u32) {}
    fn on_puppeteer_tap(&mut self, _zone: Zone) {}
}
