use crate::score::ScoreState;
use hypebeat_ports::types::Rating;
use serde::{Deserialize, Serialize};

// Everything here is persisted by date key and must reproduce bit-for-bit on
// every platform: do not change the hash or the derivations.

const HASH_SEED: u32 = 5381;
const MIN_STREAK: u32 = 5;
const STREAK_SPAN: u32 = 8;
const SCORE_STEP: u64 = 500;
const BASE_REWARD: u32 = 500;
const REWARD_PER_STREAK: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeCondition {
    PerfectStreak(u32),
    ReachScore(u64),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyChallenge {
    pub date: String,
    pub description: String,
    pub conditions: Vec<ChallengeCondition>,
    pub streak_target: u32,
    pub score_target: u64,
    pub reward_points: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub current_streak: u32,
    pub best_streak: u32,
    pub score_reached: bool,
    pub completed: bool,
}

/// djb2 with xor mixing over the UTF-8 bytes.
pub fn challenge_hash(date: &str) -> u32 {
    date.bytes().fold(HASH_SEED, |hash, byte| {
        (hash << 5).wrapping_add(hash) ^ byte as u32
    })
}

pub fn generate_challenge(date: &str) -> DailyChallenge {
    let hash = challenge_hash(date);
    let streak_target = MIN_STREAK + (hash >> 8) % STREAK_SPAN;
    let score_target = (2 + (hash % 8) as u64) * SCORE_STEP;
    let reward_points = BASE_REWARD + streak_target * REWARD_PER_STREAK;

    DailyChallenge {
        date: date.to_string(),
        description: format!(
            "Land {streak_target} perfect hits in a row and reach {score_target} points"
        ),
        conditions: vec![
            ChallengeCondition::PerfectStreak(streak_target),
            ChallengeCondition::ReachScore(score_target),
        ],
        streak_target,
        score_target,
        reward_points,
    }
}

/// Local calendar date in the `YYYY-MM-DD` form challenges are keyed by.
pub fn today_key() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

pub fn create_progress(_challenge: &DailyChallenge) -> ChallengeProgress {
    ChallengeProgress::default()
}

/// Feeds one judgment into the tracker. Returns true only on the call that
/// completes the challenge; completed progress is never touched again.
pub fn update_progress(
    progress: &mut ChallengeProgress,
    challenge: &DailyChallenge,
    score: &ScoreState,
    rating: Rating,
) -> bool {
    if progress.completed {
        return false;
    }

    match rating {
        Rating::Perfect => {
            progress.current_streak += 1;
            progress.best_streak = progress.best_streak.max(progress.current_streak);
        }
        Rating::Good | Rating::Miss => progress.current_streak = 0,
    }

    if score.total_score >= challenge.score_target {
        progress.score_reached = true;
    }

    progress.completed = progress.best_streak >= challenge.streak_target && progress.score_reached;
    progress.completed
}

/// Used when storage already holds today's completion.
pub fn mark_completed(progress: &mut ChallengeProgress) {
    progress.completed = true;
}
