use hypebeat_ports::storage::{
    ChallengeCompletion, SessionResult, SettingsDto, StorageError, StoragePort,
};
use hypebeat_ports::types::UserId;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Inner {
    settings: SettingsDto,
    results: Vec<SessionResult>,
    completions: Vec<ChallengeCompletion>,
}

/// In-memory storage. The session records here whenever the real backend
/// refuses a write, and it doubles as the backend for offline play.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<SessionResult> {
        self.inner.lock().results.clone()
    }

    pub fn completions(&self) -> Vec<ChallengeCompletion> {
        self.inner.lock().completions.clone()
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock();
        inner.results.is_empty() && inner.completions.is_empty()
    }
}

impl StoragePort for MemoryStorage {
    fn load_settings(&self) -> Result<SettingsDto, StorageError> {
        Ok(self.inner.lock().settings.clone())
    }

    fn save_settings(&self, s: &SettingsDto) -> Result<(), StorageError> {
        self.inner.lock().settings = s.clone();
        Ok(())
    }

    fn submit_score(&self, result: &SessionResult) -> Result<(), StorageError> {
        self.inner.lock().results.push(result.clone());
        Ok(())
    }

    fn challenge_completion(&self, user_id: &UserId, date: &str) -> Result<bool, StorageError> {
        Ok(self
            .inner
            .lock()
            .completions
            .iter()
            .any(|c| &c.user_id == user_id && c.date == date))
    }

    fn save_challenge_completion(
        &self,
        completion: &ChallengeCompletion,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        let exists = inner
            .completions
            .iter()
            .any(|c| c.user_id == completion.user_id && c.date == completion.date);
        if !exists {
            inner.completions.push(completion.clone());
        }
        Ok(())
    }
}
