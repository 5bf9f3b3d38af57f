use crate::diagnostics::export_diagnostics;
use crate::ipc::{Command, SessionEvent, SessionPhase};
use crate::lane::{PlayField, RhythmLane};
use crate::local_storage::MemoryStorage;
use crate::scheduler::{BeatEvent, BeatScheduler, SchedulerConfig};
use hypebeat_domain_eval::{
    accuracy, apply_session_bonus, create_progress, generate_challenge, grade, mark_completed,
    register_hit, tick, today_key, update_progress, ChallengeProgress, DailyChallenge, HitResult,
    ScoreState,
};
use hypebeat_domain_song::{SongDef, SongError, TRAVEL_BEATS};
use hypebeat_ports::clock::AudioClockPort;
use hypebeat_ports::storage::{
    ChallengeCompletion, SessionResult, SettingsDto, StorageError, StoragePort,
};
use hypebeat_ports::synth::DrumPort;
use hypebeat_ports::types::{AudioTime, Rating};
use hypebeat_ports::visual::VisualSink;
use std::collections::VecDeque;
use std::path::Path;

const COMBO_MILESTONES: [u32; 3] = [5, 10, 15];
const PERFECT_STREAK_FLOOR: u32 = 5;
const RECENT_JUDGMENTS: usize = 32;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("song rejected: {0}")]
    Song(#[from] SongError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct SessionPorts {
    pub clock: Box<dyn AudioClockPort>,
    pub storage: Box<dyn StoragePort>,
    pub visuals: Option<Box<dyn VisualSink>>,
    pub drums: Option<Box<dyn DrumPort>>,
}

/// One play session: wires scheduler, lane, score and daily challenge
/// together and owns all of their state.
///
/// The host drives it with three entry points: `poll` from a short interval
/// timer, `frame` once per display frame and `tap` per pointer press. All
/// judging happens against the injected audio clock.
pub struct Session {
    song: SongDef,
    settings: SettingsDto,
    clock: Box<dyn AudioClockPort>,
    storage: Box<dyn StoragePort>,
    fallback: MemoryStorage,
    visuals: Option<Box<dyn VisualSink>>,
    scheduler: BeatScheduler,
    lane: RhythmLane,
    score: ScoreState,
    challenge: DailyChallenge,
    progress: ChallengeProgress,
    challenge_done_before: bool,
    phase: SessionPhase,
    awaiting_clock: bool,
    end_at: Option<AudioTime>,
    result: Option<SessionResult>,
    events: VecDeque<SessionEvent>,
    recent: VecDeque<HitResult>,
}

impl Session {
    pub fn new(
        song: SongDef,
        settings: SettingsDto,
        ports: SessionPorts,
    ) -> Result<Self, SessionError> {
        song.validate()?;

        let SessionPorts {
            clock,
            storage,
            visuals,
            drums,
        } = ports;

        let mut scheduler = BeatScheduler::new(
            &song,
            SchedulerConfig {
                lookahead_ms: settings.lookahead_ms,
                poll_interval_ms: settings.poll_interval_ms,
            },
        );
        if let Some(drums) = drums {
            scheduler = scheduler.with_drums(drums);
        }
        let lane = RhythmLane::new(&song, PlayField::from_settings(&settings));

        let date = settings.challenge_date.clone().unwrap_or_else(today_key);
        let challenge = generate_challenge(&date);
        let mut progress = create_progress(&challenge);
        let challenge_done_before = match storage.challenge_completion(&settings.user_id, &date) {
            Ok(done) => done,
            Err(err) => {
                log::warn!("challenge lookup for {} failed, assuming open: {}", date, err);
                false
            }
        };
        if challenge_done_before {
            mark_completed(&mut progress);
        }

        Ok(Self {
            song,
            settings,
            clock,
            storage,
            fallback: MemoryStorage::new(),
            visuals,
            scheduler,
            lane,
            score: ScoreState::new(),
            challenge,
            progress,
            challenge_done_before,
            phase: SessionPhase::Ready,
            awaiting_clock: false,
            end_at: None,
            result: None,
            events: VecDeque::new(),
            recent: VecDeque::with_capacity(RECENT_JUDGMENTS),
        })
    }

    pub fn handle_command(&mut self, cmd: Command) -> Option<HitResult> {
        match cmd {
            Command::Start => self.start(),
            Command::Tap { x, y } => return self.tap(x, y),
            Command::Exit => {
                self.exit();
            }
            Command::SetInputOffsetMs { ms } => {
                self.settings.input_offset_ms = ms;
                if let Err(err) = self.storage.save_settings(&self.settings) {
                    log::warn!("could not save input offset: {}", err);
                }
            }
        }
        None
    }

    /// First user interaction. Without a clock the session runs degraded and
    /// starts the beat as soon as the clock shows up.
    pub fn start(&mut self) {
        if self.phase != SessionPhase::Ready {
            return;
        }
        self.phase = SessionPhase::Running;
        self.lane.start();

        match self.clock.now_seconds() {
            Some(now) => self.start_beat(now),
            None => {
                log::warn!("audio clock unavailable; waiting before scheduling beats");
                self.awaiting_clock = true;
                self.events.push_back(SessionEvent::ClockUnavailable);
            }
        }
    }

    fn start_beat(&mut self, now: AudioTime) {
        let start_time = now + self.settings.start_lead_ms as f64 / 1000.0;
        self.awaiting_clock = false;
        self.scheduler.start(start_time);
        log::info!(
            "session started: {} at {:.3}s, challenge {}",
            self.song.id,
            start_time,
            self.challenge.date
        );
        self.events.push_back(SessionEvent::Started {
            song_id: self.song.id.clone(),
            start_time,
            challenge: self.challenge.clone(),
        });
    }

    /// Scheduler timer body. Routes every booked beat into the lane, in beat
    /// order, before returning.
    pub fn poll(&mut self) -> Vec<BeatEvent> {
        if self.phase != SessionPhase::Running {
            return Vec::new();
        }
        if self.awaiting_clock {
            match self.clock.now_seconds() {
                Some(now) => self.start_beat(now),
                None => return Vec::new(),
            }
        }

        let beats = self.scheduler.poll(&*self.clock);
        let end_beat = self.song.total_beats() + TRAVEL_BEATS as u64;
        for beat in &beats {
            self.events.push_back(SessionEvent::Beat {
                beat_index: beat.beat_index,
                at: beat.at,
            });
            for target_id in self.lane.on_beat_fired(beat.beat_index, beat.at) {
                if let Some(target) = self.lane.targets().iter().find(|t| t.id == target_id) {
                    self.events.push_back(SessionEvent::TargetSpawned {
                        target_id,
                        zone: target.zone,
                        hit_time: target.hit_time,
                    });
                }
            }
            if beat.beat_index >= end_beat && self.end_at.is_none() {
                self.end_at = Some(beat.at);
            }
        }
        beats
    }

    /// Per display frame. Misses become judgments here; the song ends on the
    /// first frame at or after the end beat once every target is judged.
    pub fn frame(&mut self, dt: f64) {
        if self.phase != SessionPhase::Running {
            return;
        }
        if let Some(now) = self.clock.now_seconds() {
            for zone in self.lane.update(now) {
                self.apply_judgment(HitResult::auto_miss(zone));
            }
            // Fast songs reach the end beat while the last targets are still
            // inside their grace period.
            let past_end = self.end_at.is_some_and(|end| now >= end);
            if past_end && self.lane.targets().is_empty() {
                self.finalize(true);
                return;
            }
        }
        tick(&mut self.score, dt);
    }

    pub fn tap(&mut self, x: f64, y: f64) -> Option<HitResult> {
        if self.phase != SessionPhase::Running {
            return None;
        }
        let judged = self.clock.now_seconds().and_then(|now| {
            let at = now + self.settings.input_offset_ms as f64 / 1000.0;
            self.lane.try_hit(x, y, at)
        });

        match judged {
            Some(hit) => {
                self.apply_judgment(hit);
                Some(hit)
            }
            None => {
                let zone = self.lane.tap_zone(x, y);
                if let Some(visuals) = self.visuals.as_mut() {
                    visuals.on_puppeteer_tap(zone);
                }
                self.events.push_back(SessionEvent::PuppeteerTap { zone });
                None
            }
        }
    }

    /// Leaves before the song ends. Safe after a natural end. Leaving before
    /// `start` closes the session without a result.
    pub fn exit(&mut self) -> Option<SessionResult> {
        self.finalize(false)
    }

    fn apply_judgment(&mut self, hit: HitResult) {
        let points = register_hit(&mut self.score, &hit);
        let completed_now =
            update_progress(&mut self.progress, &self.challenge, &self.score, hit.rating);

        if self.recent.len() >= RECENT_JUDGMENTS {
            self.recent.pop_front();
        }
        self.recent.push_back(hit);

        self.events.push_back(SessionEvent::Judged { result: hit, points });
        self.events.push_back(SessionEvent::ScoreUpdated {
            total_score: self.score.total_score,
            combo: self.score.combo,
            multiplier: self.score.combo_multiplier,
        });
        if let Some(visuals) = self.visuals.as_mut() {
            visuals.on_judgment(hit.zone, hit.rating);
        }

        if hit.rating != Rating::Miss && COMBO_MILESTONES.contains(&self.score.combo) {
            let combo = self.score.combo;
            self.events.push_back(SessionEvent::ComboMilestone { combo });
            if let Some(visuals) = self.visuals.as_mut() {
                visuals.on_combo_milestone(combo);
            }
        }
        if hit.rating == Rating::Perfect
            && self.score.consecutive_perfects >= PERFECT_STREAK_FLOOR
        {
            let streak = self.score.consecutive_perfects;
            self.events.push_back(SessionEvent::PerfectStreak { streak });
            if let Some(visuals) = self.visuals.as_mut() {
                visuals.on_perfect_streak(streak);
            }
        }

        if completed_now {
            log::info!(
                "daily challenge {} completed (+{} points)",
                self.challenge.date,
                self.challenge.reward_points
            );
            self.events.push_back(SessionEvent::ChallengeCompleted {
                date: self.challenge.date.clone(),
                reward_points: self.challenge.reward_points,
            });
        }
    }

    fn finalize(&mut self, natural_end: bool) -> Option<SessionResult> {
        match self.phase {
            SessionPhase::Finished => return self.result.clone(),
            SessionPhase::Ready => {
                self.phase = SessionPhase::Finished;
                log::info!("session for {} left before it started", self.song.id);
                return None;
            }
            SessionPhase::Running => {}
        }
        self.phase = SessionPhase::Finished;

        self.scheduler.stop();
        self.scheduler.clear_listeners();
        self.lane.stop();
        self.lane.clear_listeners();

        let bonus = apply_session_bonus(&mut self.score);
        let letter = grade(&self.score);
        let now_ms = chrono::Utc::now().timestamp_millis();
        let result = SessionResult {
            user_id: self.settings.user_id.clone(),
            song_id: self.song.id.clone(),
            final_score: self.score.total_score,
            session_bonus: bonus,
            perfect_hits: self.score.perfect_hits,
            good_hits: self.score.good_hits,
            misses: self.score.misses(),
            total_hit_attempts: self.score.total_hit_attempts,
            max_combo: self.score.max_combo,
            accuracy: accuracy(&self.score),
            grade: letter,
            completed: natural_end,
            started_at_ms: self.score.session_start_ms,
            duration_ms: (now_ms - self.score.session_start_ms).max(0),
            challenge_date: self.challenge.date.clone(),
        };
        log::info!(
            "session finished: {} score {} grade {} ({})",
            result.song_id,
            result.final_score,
            letter,
            if natural_end { "song end" } else { "early exit" }
        );

        self.persist(&result);
        self.result = Some(result.clone());
        self.events.push_back(SessionEvent::Finished {
            result: result.clone(),
            grade: letter,
            show_grade: natural_end,
        });
        Some(result)
    }

    fn persist(&self, result: &SessionResult) {
        if let Err(err) = self.storage.submit_score(result) {
            log::warn!("score submit failed, keeping it locally: {}", err);
            let _ = self.fallback.submit_score(result);
        }

        if !self.progress.completed || self.challenge_done_before {
            return;
        }
        let completion = ChallengeCompletion {
            user_id: self.settings.user_id.clone(),
            date: self.challenge.date.clone(),
            description: self.challenge.description.clone(),
            best_streak: self.progress.best_streak,
            streak_target: self.challenge.streak_target,
            score_target: self.challenge.score_target,
            reward_points: self.challenge.reward_points,
        };
        if let Err(err) = self.storage.save_challenge_completion(&completion) {
            log::warn!("challenge save failed, keeping it locally: {}", err);
            let _ = self.fallback.save_challenge_completion(&completion);
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    pub fn export_diagnostics(&self, dir: &Path) -> Result<(), SessionError> {
        let recent: Vec<HitResult> = self.recent.iter().copied().collect();
        export_diagnostics(dir, &self.settings, self.result.as_ref(), &recent)?;
        Ok(())
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn song(&self) -> &SongDef {
        &self.song
    }

    pub fn settings(&self) -> &SettingsDto {
        &self.settings
    }

    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    pub fn challenge(&self) -> &DailyChallenge {
        &self.challenge
    }

    pub fn progress(&self) -> &ChallengeProgress {
        &self.progress
    }

    pub fn lane(&self) -> &RhythmLane {
        &self.lane
    }

    pub fn scheduler(&self) -> &BeatScheduler {
        &self.scheduler
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Writes the backend refused, kept for a later retry.
    pub fn local_fallback(&self) -> &MemoryStorage {
        &self.fallback
    }
}
