use hypebeat_domain_eval::{DailyChallenge, HitResult};
use hypebeat_ports::storage::SessionResult;
use hypebeat_ports::types::{AudioTime, LetterGrade, TargetId, Zone};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    Start,
    Tap { x: f64, y: f64 },
    Exit,
    SetInputOffsetMs { ms: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Ready,
    Running,
    Finished,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SessionEvent {
    Started {
        song_id: String,
        start_time: AudioTime,
        challenge: DailyChallenge,
    },
    ClockUnavailable,
    Beat {
        beat_index: u64,
        at: AudioTime,
    },
    TargetSpawned {
        target_id: TargetId,
        zone: Zone,
        hit_time: AudioTime,
    },
    Judged {
        result: HitResult,
        points: u32,
    },
    PuppeteerTap {
        zone: Zone,
    },
    ScoreUpdated {
        total_score: u64,
        combo: u32,
        multiplier: f64,
    },
    ComboMilestone {
        combo: u32,
    },
    PerfectStreak {
        streak: u32,
    },
    ChallengeCompleted {
        date: String,
        reward_points: u32,
    },
    Finished {
        result: SessionResult,
        grade: LetterGrade,
        /// false on early exit: the host skips the grade screen.
        show_grade: bool,
    },
}
