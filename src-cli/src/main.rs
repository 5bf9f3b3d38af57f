use clap::Parser;
use hypebeat_core::{
    ManualClock, MemoryStorage, PlayField, Session, SessionEvent, SessionPhase, SessionPorts,
};
use hypebeat_domain_song::{find_song, songs};
use hypebeat_infra_storage_fs::FsStorage;
use hypebeat_ports::storage::{SessionResult, StoragePort};
use hypebeat_ports::synth::{DrumHit, DrumPort};
use hypebeat_ports::types::{Rating, Zone};
use hypebeat_ports::visual::VisualSink;
use log::{info, warn, LevelFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::path::PathBuf;
use std::rc::Rc;

mod bot;

use bot::{AutoPlayer, Skill};

/// Plays one Hypebeat session headlessly with a simulated player.
#[derive(Debug, Parser)]
#[command(name = "hypebeat-sim", version)]
struct Args {
    /// Song id from the catalog
    #[arg(long, default_value = "warmup-groove")]
    song: String,

    /// List the catalog and exit
    #[arg(long)]
    list: bool,

    /// Tap timing spread in milliseconds (uniform, either side of the beat)
    #[arg(long, default_value_t = 40.0)]
    jitter_ms: f64,

    /// Probability of skipping a target
    #[arg(long, default_value_t = 0.05)]
    miss_rate: f64,

    /// Probability of a stray tap per target
    #[arg(long, default_value_t = 0.0)]
    stray_rate: f64,

    /// RNG seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Daily challenge date (YYYY-MM-DD) instead of today
    #[arg(long)]
    date: Option<String>,

    /// Leave the session after this many seconds of play
    #[arg(long)]
    exit_after: Option<f64>,

    /// Storage directory; the platform data dir when omitted
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep everything in memory
    #[arg(long)]
    offline: bool,

    /// Write a diagnostics bundle to this directory afterwards
    #[arg(long)]
    diagnostics: Option<PathBuf>,

    /// Print the session result as JSON
    #[arg(long)]
    json: bool,

    /// Simulated display frame length in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u32,
}

/// Counts booked drum hits; there is no audio device in the simulator.
#[derive(Default)]
struct CountingDrums {
    booked: u64,
}

impl DrumPort for CountingDrums {
    fn trigger(&mut self, hit: DrumHit) {
        self.booked += 1;
        log::trace!("{:?} at {:.3}s ({:.2})", hit.voice, hit.at, hit.velocity);
    }
}

struct ConsoleVisuals;

impl VisualSink for ConsoleVisuals {
    fn on_judgment(&mut self, zone: Zone, rating: Rating) {
        log::debug!("{:?} on {}", rating, zone);
    }

    fn on_combo_milestone(&mut self, combo: u32) {
        info!("combo x{}!", combo);
    }

    fn on_perfect_streak(&mut self, streak: u32) {
        if streak % 5 == 0 {
            info!("{} perfects in a row", streak);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .filter_module("hypebeat_core::lane", LevelFilter::Warn)
        .filter_module("hypebeat_core::scheduler", LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = Args::parse();

    if args.list {
        for song in songs() {
            println!(
                "{:<16} {:<18} {:>5.0} bpm  {:?}/{:?}  {} targets",
                song.id,
                song.name,
                song.bpm,
                song.style,
                song.difficulty,
                song.target_count()
            );
        }
        return Ok(());
    }

    let song = find_song(&args.song)?;

    let storage: Rc<dyn StoragePort> = if args.offline {
        Rc::new(MemoryStorage::new())
    } else {
        match &args.data_dir {
            Some(dir) => Rc::new(FsStorage::new(dir.clone())),
            None => Rc::new(FsStorage::default()),
        }
    };
    let mut settings = storage.load_settings().unwrap_or_else(|err| {
        warn!("could not load settings, using defaults: {}", err);
        Default::default()
    });
    if args.date.is_some() {
        settings.challenge_date = args.date.clone();
    }
    let field = PlayField::from_settings(&settings);
    let poll_every = settings.poll_interval_ms.max(1);

    let clock = Rc::new(ManualClock::new(0.0));
    let mut session = Session::new(
        song,
        settings,
        SessionPorts {
            clock: Box::new(clock.clone()),
            storage: Box::new(storage.clone()),
            visuals: Some(Box::new(ConsoleVisuals)),
            drums: Some(Box::new(CountingDrums::default())),
        },
    )?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let skill = Skill {
        jitter: args.jitter_ms.max(0.0) / 1000.0,
        miss_rate: args.miss_rate.clamp(0.0, 1.0),
        stray_rate: args.stray_rate.clamp(0.0, 1.0),
    };
    let mut player = AutoPlayer::new(skill, field, rng);

    info!(
        "{}: {}",
        session.challenge().date,
        session.challenge().description
    );
    session.start();

    let frame_ms = args.frame_ms.max(1);
    let limit_ms = ((session.song().duration_seconds() + 30.0) * 1000.0) as u64;
    let mut ms: u64 = 0;
    while session.phase() == SessionPhase::Running && ms <= limit_ms {
        let now = ms as f64 / 1000.0;
        clock.set(now);

        if ms % poll_every as u64 == 0 {
            session.poll();
        }
        for tap in player.due(now) {
            session.tap(tap.x, tap.y);
        }
        if ms % frame_ms as u64 == 0 {
            session.frame(frame_ms as f64 / 1000.0);
        }
        for event in session.drain_events() {
            player.observe(&event);
            report(&event);
        }

        if args.exit_after.is_some_and(|secs| now >= secs) {
            info!("leaving early at {:.1}s", now);
            session.exit();
        }
        ms += 1;
    }
    if session.phase() == SessionPhase::Running {
        warn!("song did not end within {} ms, exiting", limit_ms);
        session.exit();
    }
    for event in session.drain_events() {
        report(&event);
    }

    if !session.local_fallback().is_empty() {
        warn!(
            "{} result(s) kept in memory only",
            session.local_fallback().results().len()
        );
    }
    if let Some(dir) = &args.diagnostics {
        session.export_diagnostics(dir)?;
    }

    if let Some(result) = session.result() {
        if args.json {
            println!("{}", serde_json::to_string_pretty(result)?);
        } else {
            print_summary(result);
        }
    }
    Ok(())
}

fn report(event: &SessionEvent) {
    match event {
        SessionEvent::ClockUnavailable => warn!("audio clock unavailable"),
        SessionEvent::ChallengeCompleted {
            date,
            reward_points,
        } => info!("daily challenge {} complete: +{} points", date, reward_points),
        SessionEvent::Finished { grade, show_grade, .. } if *show_grade => {
            info!("grade {}", grade)
        }
        _ => {}
    }
}

fn print_summary(result: &SessionResult) {
    println!("song        {}", result.song_id);
    println!("score       {} (bonus {})", result.final_score, result.session_bonus);
    println!(
        "hits        {} perfect / {} good / {} miss",
        result.perfect_hits, result.good_hits, result.misses
    );
    println!("max combo   {}", result.max_combo);
    println!("accuracy    {:.1}%", result.accuracy * 100.0);
    if result.completed {
        println!("grade       {}", result.grade);
    } else {
        println!("grade       - (left early)");
    }
}
