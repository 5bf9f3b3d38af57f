use hypebeat_domain_eval::HitResult;
use hypebeat_ports::storage::{SessionResult, SettingsDto, StorageError};
use hypebeat_ports::types::Rating;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct AppVersion {
    name: String,
    version: String,
}

#[derive(Serialize)]
struct PlatformInfo {
    os: String,
    arch: String,
}

#[derive(Serialize)]
struct RecentJudgments<'a> {
    perfect: usize,
    good: usize,
    miss: usize,
    /// Mean signed delta of tapped judgments; drifts away from zero when the
    /// input offset is wrong.
    mean_delta: Option<f64>,
    judgments: &'a [HitResult],
}

impl<'a> RecentJudgments<'a> {
    fn summarize(judgments: &'a [HitResult]) -> Self {
        let count = |rating: Rating| judgments.iter().filter(|j| j.rating == rating).count();
        let tapped: Vec<f64> = judgments
            .iter()
            .filter(|j| j.target_id.is_some())
            .map(|j| j.delta)
            .collect();
        let mean_delta =
            (!tapped.is_empty()).then(|| tapped.iter().sum::<f64>() / tapped.len() as f64);
        Self {
            perfect: count(Rating::Perfect),
            good: count(Rating::Good),
            miss: count(Rating::Miss),
            mean_delta,
            judgments,
        }
    }
}

pub fn export_diagnostics(
    dir: &Path,
    settings: &SettingsDto,
    result: Option<&SessionResult>,
    recent_judgments: &[HitResult],
) -> Result<(), StorageError> {
    fs::create_dir_all(dir).map_err(|e| StorageError::Io(e.to_string()))?;

    let app_version = AppVersion {
        name: "Hypebeat".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let platform = PlatformInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    };

    write_json(&dir.join("app_version.json"), &app_version)?;
    write_json(&dir.join("platform.json"), &platform)?;
    write_json(&dir.join("settings.json"), settings)?;
    write_json(&dir.join("session.json"), &result)?;
    write_json(
        &dir.join("recent_judgments.json"),
        &RecentJudgments::summarize(recent_judgments),
    )?;

    log::info!("diagnostics written to {}", dir.display());
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let data = serde_json::to_vec_pretty(value).map_err(|e| StorageError::Serde(e.to_string()))?;
    fs::write(path, data).map_err(|e| StorageError::Io(e.to_string()))
}
