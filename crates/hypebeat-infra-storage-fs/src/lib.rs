use hypebeat_ports::storage::{
    ChallengeCompletion, SessionResult, SettingsDto, StorageError, StoragePort,
};
use hypebeat_ports::types::UserId;
use std::fs;
use std::path::{Path, PathBuf};

/// JSON files under one directory: `settings.json`, `results.json` (every
/// submitted session, oldest first) and `challenges.json` (one entry per user
/// and day).
pub struct FsStorage {
    base_dir: PathBuf,
}

impl FsStorage {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_base_dir() -> Result<PathBuf, StorageError> {
        let base = dirs_next::data_dir()
            .ok_or_else(|| StorageError::Io("data dir not found".to_string()))?;
        Ok(base.join("Hypebeat"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn settings_path(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    fn results_path(&self) -> PathBuf {
        self.base_dir.join("results.json")
    }

    fn challenges_path(&self) -> PathBuf {
        self.base_dir.join("challenges.json")
    }

    pub fn results(&self) -> Result<Vec<SessionResult>, StorageError> {
        Self::read_list(&self.results_path())
    }

    pub fn completions(&self) -> Result<Vec<ChallengeCompletion>, StorageError> {
        Self::read_list(&self.challenges_path())
    }

    /// Best recorded score for a song, across all users.
    pub fn best_score(&self, song_id: &str) -> Result<Option<u64>, StorageError> {
        Ok(self
            .results()?
            .iter()
            .filter(|r| r.song_id == song_id)
            .map(|r| r.final_score)
            .max())
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
        let data = fs::read(path).map_err(|e| StorageError::Io(e.to_string()))?;
        serde_json::from_slice(&data).map_err(|e| StorageError::Serde(e.to_string()))
    }

    fn read_list<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        Self::read_json(path)
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        let data =
            serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serde(e.to_string()))?;
        fs::write(path, data).map_err(|e| StorageError::Io(e.to_string()))
    }
}

impl Default for FsStorage {
    fn default() -> Self {
        let base_dir = Self::default_base_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { base_dir }
    }
}

impl StoragePort for FsStorage {
    fn load_settings(&self) -> Result<SettingsDto, StorageError> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(SettingsDto::default());
        }
        Self::read_json(&path)
    }

    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError> {
        Self::write_json(&self.settings_path(), s)
    }

    fn submit_score(&self, result: &SessionResult) -> Result<(), StorageError> {
        let path = self.results_path();
        let mut results: Vec<SessionResult> = Self::read_list(&path)?;
        results.push(result.clone());
        Self::write_json(&path, &results)?;
        log::debug!("stored result for {} ({} total)", result.song_id, results.len());
        Ok(())
    }

    fn challenge_completion(&self, user_id: &UserId, date: &str) -> Result<bool, StorageError> {
        let completions: Vec<ChallengeCompletion> = Self::read_list(&self.challenges_path())?;
        Ok(completions
            .iter()
            .any(|c| &c.user_id == user_id && c.date == date))
    }

    fn save_challenge_completion(
        &self,
        completion: &ChallengeCompletion,
    ) -> Result<(), StorageError> {
        let path = self.challenges_path();
        let mut completions: Vec<ChallengeCompletion> = Self::read_list(&path)?;
        if completions
            .iter()
            .any(|c| c.user_id == completion.user_id && c.date == completion.date)
        {
            log::debug!(
                "challenge {} already recorded for {}",
                completion.date,
                completion.user_id
            );
            return Ok(());
        }
        completions.push(completion.clone());
        Self::write_json(&path, &completions)
    }
}
