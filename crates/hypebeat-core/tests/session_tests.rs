use hypebeat_core::{
    Command, ManualClock, MemoryStorage, Session, SessionError, SessionEvent, SessionPhase,
    SessionPorts,
};
use hypebeat_domain_song::{BeatSlot, Difficulty, MusicStyle, SongDef, SongError};
use hypebeat_ports::storage::{
    ChallengeCompletion, SessionResult, SettingsDto, StorageError, StoragePort,
};
use hypebeat_ports::types::{Column, LetterGrade, Rating, UserId, Zone};
use hypebeat_ports::visual::VisualSink;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

const STEP: f64 = 0.01;
const CHALLENGE_DATE: &str = "2024-01-15";

/// 120 bpm, one bar: LowerLeft on beat 0, LowerRight on beat 2.
fn short_song() -> SongDef {
    SongDef {
        id: "short".to_string(),
        name: "Short".to_string(),
        bpm: 120.0,
        style: MusicStyle::Funk,
        difficulty: Difficulty::Easy,
        bar_count: 1,
        beat_pattern: vec![
            BeatSlot::of(&[Zone::LowerLeft]),
            BeatSlot::rest(),
            BeatSlot::of(&[Zone::LowerRight]),
            BeatSlot::rest(),
        ],
    }
}

/// Sixteen targets, one per beat.
fn streak_song() -> SongDef {
    SongDef {
        id: "streak".to_string(),
        name: "Streak".to_string(),
        bpm: 120.0,
        style: MusicStyle::Techno,
        difficulty: Difficulty::Medium,
        bar_count: 4,
        beat_pattern: vec![BeatSlot::of(&[Zone::UpperCenter])],
    }
}

fn settings() -> SettingsDto {
    SettingsDto {
        challenge_date: Some(CHALLENGE_DATE.to_string()),
        ..SettingsDto::default()
    }
}

#[derive(Default)]
struct RecordingVisuals(Rc<RefCell<Vec<String>>>);

impl VisualSink for RecordingVisuals {
    fn on_judgment(&mut self, zone: Zone, rating: Rating) {
        self.0.borrow_mut().push(format!("judge {zone} {rating:?}"));
    }

    fn on_combo_milestone(&mut self, combo: u32) {
        self.0.borrow_mut().push(format!("combo {combo}"));
    }

    fn on_puppeteer_tap(&mut self, zone: Zone) {
        self.0.borrow_mut().push(format!("puppeteer {zone}"));
    }
}

struct OfflineStorage;

impl StoragePort for OfflineStorage {
    fn load_settings(&self) -> Result<SettingsDto, StorageError> {
        Err(StorageError::Unreachable("offline".to_string()))
    }

    fn save_settings(&self, _s: &SettingsDto) -> Result<(), StorageError> {
        Err(StorageError::Unreachable("offline".to_string()))
    }

    fn submit_score(&self, _result: &SessionResult) -> Result<(), StorageError> {
        Err(StorageError::Unreachable("offline".to_string()))
    }

    fn challenge_completion(&self, _user_id: &UserId, _date: &str) -> Result<bool, StorageError> {
        Err(StorageError::Unreachable("offline".to_string()))
    }

    fn save_challenge_completion(&self, _c: &ChallengeCompletion) -> Result<(), StorageError> {
        Err(StorageError::Unreachable("offline".to_string()))
    }
}

struct Rig {
    session: Session,
    clock: Rc<ManualClock>,
    storage: Rc<MemoryStorage>,
    visuals: Rc<RefCell<Vec<String>>>,
}

fn rig(song: SongDef) -> Rig {
    rig_with(song, Rc::new(MemoryStorage::new()), Rc::new(ManualClock::new(0.0)))
}

fn rig_with(song: SongDef, storage: Rc<MemoryStorage>, clock: Rc<ManualClock>) -> Rig {
    let visuals = RecordingVisuals::default();
    let log = visuals.0.clone();
    let session = Session::new(
        song,
        settings(),
        SessionPorts {
            clock: Box::new(clock.clone()),
            storage: Box::new(storage.clone()),
            visuals: Some(Box::new(visuals)),
            drums: None,
        },
    )
    .unwrap();
    Rig {
        session,
        clock,
        storage,
        visuals: log,
    }
}

fn x_for(zone: Zone) -> f64 {
    match zone.column() {
        Column::Left => 120.0,
        Column::Center => 360.0,
        Column::Right => 600.0,
    }
}

/// Steps the host loop in 10ms increments until `until` or the session ends.
/// With `autoplay` every target is tapped on the first step at or past its
/// hit time.
fn run(rig: &mut Rig, from: f64, until: f64, autoplay: bool) {
    let mut step = (from / STEP).round() as u32;
    loop {
        let now = step as f64 * STEP;
        if now > until || rig.session.phase() == SessionPhase::Finished {
            break;
        }
        rig.clock.set(now);
        rig.session.poll();
        if autoplay {
            let due: Vec<Zone> = rig
                .session
                .lane()
                .targets()
                .iter()
                .filter(|t| t.hit_time <= now + 1e-9)
                .map(|t| t.zone)
                .collect();
            for zone in due {
                rig.session.tap(x_for(zone), 900.0);
            }
        }
        rig.session.frame(STEP);
        step += 1;
    }
}

fn count(events: &[SessionEvent], pred: impl Fn(&SessionEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

#[test]
fn full_song_with_perfect_taps_finishes_and_submits() {
    let mut rig = rig(short_song());
    rig.session.start();
    assert_eq!(rig.session.phase(), SessionPhase::Running);
    run(&mut rig, 0.0, 6.0, true);

    assert_eq!(rig.session.phase(), SessionPhase::Finished);
    let events = rig.session.drain_events();
    match &events[0] {
        SessionEvent::Started {
            song_id,
            start_time,
            challenge,
        } => {
            assert_eq!(song_id, "short");
            assert!((start_time - 0.1).abs() < 1e-9);
            assert_eq!(challenge.date, CHALLENGE_DATE);
        }
        other => panic!("expected Started, got {other:?}"),
    }
    assert_eq!(count(&events, |e| matches!(e, SessionEvent::TargetSpawned { .. })), 2);
    let points: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Judged { points, .. } => Some(*points),
            _ => None,
        })
        .collect();
    assert_eq!(points, vec![300, 375]);

    let result = rig.session.result().unwrap().clone();
    assert_eq!(result.perfect_hits, 2);
    assert_eq!(result.total_hit_attempts, 2);
    assert_eq!(result.misses, 0);
    assert_eq!(result.session_bonus, 500);
    assert_eq!(result.final_score, 1175);
    assert_eq!(result.grade, LetterGrade::S);
    assert!(result.completed);
    assert_eq!(result.challenge_date, CHALLENGE_DATE);

    match events.last() {
        Some(SessionEvent::Finished {
            grade, show_grade, ..
        }) => {
            assert_eq!(*grade, LetterGrade::S);
            assert!(*show_grade);
        }
        other => panic!("expected Finished, got {other:?}"),
    }
    assert_eq!(rig.storage.results(), vec![result]);
    assert!(rig.session.local_fallback().is_empty());
    assert_eq!(
        *rig.visuals.borrow(),
        vec!["judge lower-left Perfect".to_string(), "judge lower-right Perfect".to_string()]
    );
}

#[test]
fn fast_song_judges_every_target_before_finishing() {
    let song = SongDef {
        id: "rush".to_string(),
        name: "Rush".to_string(),
        bpm: 300.0,
        style: MusicStyle::Techno,
        difficulty: Difficulty::Hard,
        bar_count: 1,
        beat_pattern: vec![BeatSlot::of(&[Zone::LowerCenter])],
    };
    let mut rig = rig(song);
    rig.session.start();
    run(&mut rig, 0.0, 4.0, false);

    assert_eq!(rig.session.phase(), SessionPhase::Finished);
    let events = rig.session.drain_events();
    assert_eq!(count(&events, |e| matches!(e, SessionEvent::TargetSpawned { .. })), 4);
    assert_eq!(
        count(&events, |e| {
            matches!(e, SessionEvent::Judged { result, .. } if result.rating == Rating::Miss)
        }),
        4
    );
    let result = rig.session.result().unwrap();
    assert_eq!(result.misses, 4);
    assert_eq!(result.total_hit_attempts, 4);
    assert!(result.completed);
    assert!(rig.session.lane().targets().is_empty());
}

#[test]
fn untouched_targets_become_misses() {
    let mut rig = rig(short_song());
    rig.session.start();
    run(&mut rig, 0.0, 6.0, false);

    let result = rig.session.result().unwrap();
    assert_eq!(result.misses, 2);
    assert_eq!(result.total_hit_attempts, 2);
    assert_eq!(result.final_score, 0);
    assert_eq!(result.grade, LetterGrade::D);

    let events = rig.session.drain_events();
    let missed: Vec<Option<u64>> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Judged { result, points } if result.rating == Rating::Miss => {
                assert_eq!(*points, 0);
                Some(result.target_id)
            }
            _ => None,
        })
        .collect();
    assert_eq!(missed, vec![None, None]);
}

#[test]
fn taps_with_nothing_to_judge_only_puppeteer() {
    let mut rig = rig(short_song());
    rig.session.start();
    run(&mut rig, 0.0, 0.5, false);
    rig.session.drain_events();

    assert_eq!(rig.session.tap(600.0, 100.0), None);
    assert_eq!(
        rig.session.drain_events(),
        vec![SessionEvent::PuppeteerTap {
            zone: Zone::UpperRight
        }]
    );
    assert_eq!(rig.session.score().total_hit_attempts, 0);
    assert_eq!(*rig.visuals.borrow(), vec!["puppeteer upper-right".to_string()]);
}

#[test]
fn input_offset_shifts_the_judged_time() {
    let mut rig = rig(short_song());
    rig.session.handle_command(Command::SetInputOffsetMs { ms: 100 });
    assert_eq!(rig.storage.load_settings().unwrap().input_offset_ms, 100);

    rig.session.handle_command(Command::Start);
    run(&mut rig, 0.0, 2.0, false);
    rig.clock.set(2.1);
    let hit = rig
        .session
        .handle_command(Command::Tap { x: 120.0, y: 900.0 })
        .unwrap();
    assert_eq!(hit.rating, Rating::Good);
    assert!((hit.delta - 0.1).abs() < 1e-6);
}

#[test]
fn early_exit_finishes_once_without_grade_screen() {
    let mut rig = rig(short_song());
    rig.session.start();
    run(&mut rig, 0.0, 2.2, true);

    let first = rig.session.handle_command(Command::Exit);
    assert_eq!(first, None);
    let result = rig.session.result().unwrap().clone();
    assert!(!result.completed);
    assert_eq!(result.perfect_hits, 1);
    assert_eq!(result.session_bonus, 500);

    assert_eq!(rig.session.exit(), Some(result.clone()));
    rig.clock.set(10.0);
    assert!(rig.session.poll().is_empty());
    rig.session.frame(STEP);
    assert_eq!(rig.session.tap(600.0, 900.0), None);

    let events = rig.session.drain_events();
    let finished: Vec<bool> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Finished { show_grade, .. } => Some(*show_grade),
            _ => None,
        })
        .collect();
    assert_eq!(finished, vec![false]);
    assert_eq!(rig.storage.results().len(), 1);
    assert!(rig.session.lane().targets().is_empty());
    assert!(!rig.session.scheduler().is_running());
}

#[test]
fn exit_before_start_records_nothing() {
    let mut rig = rig(short_song());
    assert_eq!(rig.session.exit(), None);
    assert_eq!(rig.session.phase(), SessionPhase::Finished);
    assert_eq!(rig.session.result(), None);

    rig.session.start();
    assert_eq!(rig.session.phase(), SessionPhase::Finished);
    run(&mut rig, 0.0, 3.0, false);
    assert!(rig.storage.is_empty());
    assert_eq!(
        count(&rig.session.drain_events(), |e| matches!(e, SessionEvent::Started { .. })),
        0
    );
}

#[test]
fn storage_failures_fall_back_to_local_recording() {
    let clock = Rc::new(ManualClock::new(0.0));
    let mut session = Session::new(
        streak_song(),
        settings(),
        SessionPorts {
            clock: Box::new(clock.clone()),
            storage: Box::new(OfflineStorage),
            visuals: None,
            drums: None,
        },
    )
    .unwrap();
    assert!(!session.progress().completed);

    session.start();
    let mut step = 0u32;
    while session.phase() != SessionPhase::Finished && step < 2_000 {
        let now = step as f64 * STEP;
        clock.set(now);
        session.poll();
        let due: Vec<Zone> = session
            .lane()
            .targets()
            .iter()
            .filter(|t| t.hit_time <= now + 1e-9)
            .map(|t| t.zone)
            .collect();
        for zone in due {
            session.tap(x_for(zone), 300.0);
        }
        session.frame(STEP);
        step += 1;
    }

    assert_eq!(session.phase(), SessionPhase::Finished);
    let fallback = session.local_fallback();
    assert_eq!(fallback.results().len(), 1);
    assert_eq!(fallback.results()[0].final_score, 14_300);
    assert_eq!(fallback.completions().len(), 1);
    assert_eq!(fallback.completions()[0].date, CHALLENGE_DATE);
}

#[test]
fn perfect_run_completes_daily_challenge_once() {
    let mut rig = rig(streak_song());
    rig.session.start();
    run(&mut rig, 0.0, 12.0, true);

    let events = rig.session.drain_events();
    let completed: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::ChallengeCompleted { date, reward_points } => {
                assert_eq!(date, CHALLENGE_DATE);
                Some(*reward_points)
            }
            _ => None,
        })
        .collect();
    assert_eq!(completed, vec![1400]);

    let milestones: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::ComboMilestone { combo } => Some(*combo),
            _ => None,
        })
        .collect();
    assert_eq!(milestones, vec![5, 10, 15]);
    let streaks: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::PerfectStreak { streak } => Some(*streak),
            _ => None,
        })
        .collect();
    assert_eq!(streaks, (5..=16).collect::<Vec<u32>>());

    assert!(rig.session.progress().completed);
    assert_eq!(rig.session.progress().best_streak, 16);
    let completions = rig.storage.completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].streak_target, 9);
    assert_eq!(completions[0].score_target, 3000);
    assert_eq!(rig.session.result().unwrap().final_score, 14_300);
    assert!(rig.visuals.borrow().contains(&"combo 15".to_string()));
}

#[test]
fn challenge_already_completed_today_stays_silent() {
    let storage = Rc::new(MemoryStorage::new());
    storage
        .save_challenge_completion(&ChallengeCompletion {
            user_id: UserId::guest(),
            date: CHALLENGE_DATE.to_string(),
            description: "earlier".to_string(),
            best_streak: 9,
            streak_target: 9,
            score_target: 3000,
            reward_points: 1400,
        })
        .unwrap();

    let mut rig = rig_with(streak_song(), storage, Rc::new(ManualClock::new(0.0)));
    assert!(rig.session.progress().completed);
    rig.session.start();
    run(&mut rig, 0.0, 12.0, true);

    let events = rig.session.drain_events();
    assert_eq!(count(&events, |e| matches!(e, SessionEvent::ChallengeCompleted { .. })), 0);
    let completions = rig.storage.completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].description, "earlier");
}

#[test]
fn missing_clock_defers_the_beat_until_it_appears() {
    let clock = Rc::new(ManualClock::unavailable());
    let mut rig = rig_with(short_song(), Rc::new(MemoryStorage::new()), clock);
    rig.session.start();

    assert_eq!(rig.session.phase(), SessionPhase::Running);
    assert_eq!(rig.session.drain_events(), vec![SessionEvent::ClockUnavailable]);
    assert!(rig.session.poll().is_empty());
    rig.session.frame(STEP);
    assert_eq!(rig.session.tap(120.0, 900.0), None);
    assert!(!rig.session.scheduler().is_running());

    // Lead and lookahead are both 100ms: the first beat is booked one step later.
    rig.clock.set(1.0);
    assert!(rig.session.poll().is_empty());
    rig.clock.set(1.01);
    let beats = rig.session.poll();
    assert_eq!(beats.len(), 1);
    assert!((beats[0].at - 1.1).abs() < 1e-9);
    let events = rig.session.drain_events();
    // The tap while the clock was missing is cosmetic only.
    assert_eq!(
        events[0],
        SessionEvent::PuppeteerTap {
            zone: Zone::LowerLeft
        }
    );
    assert!(matches!(
        events[1],
        SessionEvent::Started { start_time, .. } if (start_time - 1.1).abs() < 1e-9
    ));
    assert_eq!(count(&events, |e| matches!(e, SessionEvent::ClockUnavailable)), 0);
}

#[test]
fn invalid_song_is_rejected() {
    let mut song = short_song();
    song.beat_pattern.clear();
    let result = Session::new(
        song,
        settings(),
        SessionPorts {
            clock: Box::new(ManualClock::new(0.0)),
            storage: Box::new(MemoryStorage::new()),
            visuals: None,
            drums: None,
        },
    );
    assert!(matches!(
        result,
        Err(SessionError::Song(SongError::EmptyPattern(id))) if id == "short"
    ));
}

#[test]
fn tempo_above_the_limit_is_rejected() {
    let mut song = short_song();
    song.bpm = 1e300;
    let result = Session::new(
        song,
        settings(),
        SessionPorts {
            clock: Box::new(ManualClock::new(0.0)),
            storage: Box::new(MemoryStorage::new()),
            visuals: None,
            drums: None,
        },
    );
    assert!(matches!(
        result,
        Err(SessionError::Song(SongError::InvalidTempo { id, .. })) if id == "short"
    ));
}

#[test]
fn diagnostics_export_writes_the_session_snapshot() {
    let mut rig = rig(short_song());
    rig.session.start();
    run(&mut rig, 0.0, 6.0, true);

    let dir = std::env::temp_dir().join(format!("hypebeat-diag-{}", std::process::id()));
    rig.session.export_diagnostics(&dir).unwrap();

    let session: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.join("session.json")).unwrap()).unwrap();
    assert_eq!(session["final_score"], 1175);
    let recent: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.join("recent_judgments.json")).unwrap()).unwrap();
    assert_eq!(recent["judgments"].as_array().unwrap().len(), 2);
    assert_eq!(recent["perfect"], 2);
    assert_eq!(recent["miss"], 0);
    assert!(dir.join("settings.json").exists());

    let _ = std::fs::remove_dir_all(&dir);
}
