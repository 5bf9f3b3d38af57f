use crate::judgment::HitResult;
use hypebeat_ports::types::Rating;
use serde::{Deserialize, Serialize};

pub const PERFECT_POINTS: f64 = 300.0;
pub const GOOD_POINTS: f64 = 100.0;
pub const COMBO_STEP: f64 = 0.25;
pub const MAX_MULTIPLIER: f64 = 5.0;
pub const MISS_MULTIPLIER_PENALTY: f64 = 0.5;
/// Multiplier lost per second while no combo is running.
pub const IDLE_DECAY_PER_SECOND: f64 = 0.1;
pub const MAX_SESSION_BONUS: f64 = 500.0;

/// Per-session scoring aggregate. Mutated only through the functions below so
/// that `total_score == floor(crowd_hype)` holds after every call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub crowd_hype: f64,
    pub combo: u32,
    pub max_combo: u32,
    pub combo_multiplier: f64,
    pub total_score: u64,
    pub perfect_hits: u32,
    pub good_hits: u32,
    pub total_hit_attempts: u32,
    pub consecutive_perfects: u32,
    /// Wall clock, reporting only.
    pub session_start_ms: i64,
    pub bonus_applied: bool,
}

impl ScoreState {
    pub fn new() -> Self {
        Self::started_at(chrono::Utc::now().timestamp_millis())
    }

    pub fn started_at(session_start_ms: i64) -> Self {
        Self {
            crowd_hype: 0.0,
            combo: 0,
            max_combo: 0,
            combo_multiplier: 1.0,
            total_score: 0,
            perfect_hits: 0,
            good_hits: 0,
            total_hit_attempts: 0,
            consecutive_perfects: 0,
            session_start_ms,
            bonus_applied: false,
        }
    }

    pub fn misses(&self) -> u32 {
        self.total_hit_attempts
            .saturating_sub(self.perfect_hits + self.good_hits)
    }

    fn sync_total(&mut self) {
        self.total_score = self.crowd_hype.max(0.0).floor() as u64;
    }
}

impl Default for ScoreState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn create_score_state() -> ScoreState {
    ScoreState::new()
}

/// Applies one judgment and returns the points it awarded.
///
/// The award uses the multiplier from before this hit; the multiplier is then
/// recomputed from the new combo for the next hit. Stored leaderboard scores
/// depend on this ordering.
pub fn register_hit(state: &mut ScoreState, hit: &HitResult) -> u32 {
    state.total_hit_attempts += 1;

    let base = match hit.rating {
        Rating::Miss => {
            state.combo = 0;
            state.consecutive_perfects = 0;
            state.combo_multiplier = (state.combo_multiplier - MISS_MULTIPLIER_PENALTY).max(1.0);
            state.sync_total();
            return 0;
        }
        Rating::Perfect => {
            state.perfect_hits += 1;
            state.consecutive_perfects += 1;
            PERFECT_POINTS
        }
        Rating::Good => {
            state.good_hits += 1;
            state.consecutive_perfects = 0;
            GOOD_POINTS
        }
    };

    let points = (base * state.combo_multiplier).round();
    state.crowd_hype += points;
    state.combo += 1;
    state.max_combo = state.max_combo.max(state.combo);
    state.combo_multiplier = multiplier_for_combo(state.combo);
    state.sync_total();
    points as u32
}

pub fn multiplier_for_combo(combo: u32) -> f64 {
    (1.0 + combo as f64 * COMBO_STEP).min(MAX_MULTIPLIER)
}

/// Per-frame update. Only idle decay: with no combo running the multiplier
/// sinks toward 1.0.
pub fn tick(state: &mut ScoreState, dt: f64) {
    if state.combo != 0 || dt <= 0.0 {
        return;
    }
    state.combo_multiplier = (state.combo_multiplier - IDLE_DECAY_PER_SECOND * dt).max(1.0);
}

pub fn session_bonus(state: &ScoreState) -> u32 {
    if state.total_hit_attempts == 0 {
        return 0;
    }
    (MAX_SESSION_BONUS * state.perfect_hits as f64 / state.total_hit_attempts as f64).round() as u32
}

/// Adds the end-of-session bonus to hype. Only the first call has an effect.
pub fn apply_session_bonus(state: &mut ScoreState) -> u32 {
    if state.bonus_applied {
        return 0;
    }
    let bonus = session_bonus(state);
    state.crowd_hype += bonus as f64;
    state.bonus_applied = true;
    state.sync_total();
    bonus
}

pub fn accuracy(state: &ScoreState) -> f64 {
    if state.total_hit_attempts == 0 {
        return 0.0;
    }
    (state.perfect_hits + state.good_hits) as f64 / state.total_hit_attempts as f64
}
