use crate::types::*;
use serde::{Deserialize, Serialize};

fn default_user_id() -> UserId {
    UserId::guest()
}

fn default_lookahead_ms() -> u32 {
    100
}

fn default_poll_interval_ms() -> u32 {
    25
}

fn default_start_lead_ms() -> u32 {
    100
}

fn default_play_field_width() -> f64 {
    720.0
}

fn default_play_field_height() -> f64 {
    1280.0
}

fn default_rail_y() -> f64 {
    640.0
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("backend unreachable: {0}")]
    Unreachable(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsDto {
    #[serde(default = "default_user_id")]
    pub user_id: UserId,
    /// Added to the audio clock when a tap is judged; negative for late displays.
    pub input_offset_ms: i32,
    #[serde(default = "default_lookahead_ms")]
    pub lookahead_ms: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u32,
    #[serde(default = "default_start_lead_ms")]
    pub start_lead_ms: u32,
    #[serde(default = "default_play_field_width")]
    pub play_field_width: f64,
    #[serde(default = "default_play_field_height")]
    pub play_field_height: f64,
    #[serde(default = "default_rail_y")]
    pub rail_y: f64,
    /// Forces a specific daily challenge (`YYYY-MM-DD`); today's date when unset.
    pub challenge_date: Option<String>,
}

impl Default for SettingsDto {
    fn default() -> Self {
        Self {
            user_id: UserId::guest(),
            input_offset_ms: 0,
            lookahead_ms: default_lookahead_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            start_lead_ms: default_start_lead_ms(),
            play_field_width: default_play_field_width(),
            play_field_height: default_play_field_height(),
            rail_y: default_rail_y(),
            challenge_date: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub user_id: UserId,
    pub song_id: String,
    pub final_score: u64,
    pub session_bonus: u32,
    pub perfect_hits: u32,
    pub good_hits: u32,
    pub misses: u32,
    pub total_hit_attempts: u32,
    pub max_combo: u32,
    pub accuracy: f64,
    pub grade: LetterGrade,
    /// false when the player left before the song ended.
    pub completed: bool,
    pub started_at_ms: i64,
    pub duration_ms: i64,
    pub challenge_date: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChallengeCompletion {
    pub user_id: UserId,
    pub date: String,
    pub description: String,
    pub best_streak: u32,
    pub streak_target: u32,
    pub score_target: u64,
    pub reward_points: u32,
}

/// Persistence backend. Every call may fail (offline, quota, remote down); the
/// session absorbs failures and falls back to local recording.
pub trait StoragePort {
    fn load_settings(&self) -> Result<SettingsDto, StorageError>;
    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError>;

    fn submit_score(&self, result: &SessionResult) -> Result<(), StorageError>;

    fn challenge_completion(&self, user_id: &UserId, date: &str) -> Result<bool, StorageError>;
    fn save_challenge_completion(
        &self,
        completion: &ChallengeCompletion,
    ) -> Result<(), StorageError>;
}

impl<T: StoragePort + ?Sized> StoragePort for std::rc::Rc<T> {
    fn load_settings(&self) -> Result<SettingsDto, StorageError> {
        (**self).load_settings()
    }

    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError> {
        (**self).save_settings(s)
    }

    fn submit_score(&self, result: &SessionResult) -> Result<(), StorageError> {
        (**self).submit_score(result)
    }

    fn challenge_completion(&self, user_id: &UserId, date: &str) -> Result<bool, StorageError> {
        (**self).challenge_completion(user_id, date)
    }

    fn save_challenge_completion(
        &self,
        completion: &ChallengeCompletion,
    ) -> Result<(), StorageError> {
        (**self).save_challenge_completion(completion)
    }
}
