//! Star Breaker headless driver
//!
//! Plays one level at a fixed 60 Hz frame rate with a sweeping cannon and
//! prints the outcome. Useful for tuning configs and level files without a
//! renderer attached.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;

use star_breaker::consts::TARGET_FRAME_MS;
use star_breaker::{
    EngineConfig, FrameSnapshot, LevelCatalog, LevelSession, Progress, SessionConfig,
    SessionEvent, SessionPhase,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Play a Star Breaker level headlessly", long_about = None)]
struct Args {
    /// Level number to play
    #[arg(long, default_value_t = 1)]
    level: u32,
    /// Level catalog JSON (defaults to the bundled levels)
    #[arg(long)]
    levels: Option<PathBuf>,
    /// Engine config JSON (defaults to built-in tuning)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Session config JSON (countdown, cadence, aim limits)
    #[arg(long)]
    session_config: Option<PathBuf>,
    /// Seed for milestone messages
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Give up after this many frames
    #[arg(long, default_value_t = 60 * 120)]
    max_frames: u32,
    /// Aim sweep speed (degrees per second)
    #[arg(long, default_value_t = 25.0)]
    sweep: f32,
    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let engine_config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };
    let session_config = match &args.session_config {
        Some(path) => SessionConfig::load_from_file(path)?,
        None => SessionConfig::default(),
    };
    let catalog = match &args.levels {
        Some(path) => LevelCatalog::load_from_file(path)?,
        None => LevelCatalog::bundled().context("bundled level catalog")?,
    };
    if catalog.level_count() == 0 {
        anyhow::bail!("level catalog is empty");
    }

    let level = catalog.level(args.level, &engine_config.field);
    log::info!(
        "Playing level {} of {} ({} bricks, {} balls)",
        args.level,
        catalog.level_count(),
        level.bricks.len(),
        level.stock
    );

    let max_aim = session_config.max_aim_deg;
    let mut session = LevelSession::new(engine_config, session_config, level, args.seed)?;

    let peak_balls = Rc::new(RefCell::new(0usize));
    let peak = Rc::clone(&peak_balls);
    session.engine_mut().subscribe(move |snapshot: &FrameSnapshot| {
        let mut peak = peak.borrow_mut();
        *peak = (*peak).max(snapshot.balls.len());
    })?;

    session.start();

    let mut last = FrameSnapshot::default();
    let mut sweep_dir = 1.0f32;
    let mut frames = 0u32;
    while frames < args.max_frames {
        let step = args.sweep * TARGET_FRAME_MS / 1000.0 * sweep_dir;
        let next = session.aim_deg() + step;
        if next.abs() >= max_aim {
            sweep_dir = -sweep_dir;
        }
        session.set_aim(next);

        let report = session.frame(TARGET_FRAME_MS as f64)?;
        frames += 1;
        for event in &report.events {
            match event {
                SessionEvent::StarEarned { stars, message } => {
                    println!("[{:>5}] {} ({} star)", frames, message, stars)
                }
                SessionEvent::Victory => println!("[{:>5}] Victory!", frames),
                SessionEvent::Defeat => println!("[{:>5}] Out of balls", frames),
            }
        }
        last = report.snapshot;
        if report.phase.is_over() {
            break;
        }
    }

    let phase = session.phase();
    if !phase.is_over() {
        log::warn!("Stopped after {} frames without an outcome", frames);
    }

    let mut progress = Progress::new();
    progress.record(args.level, session.stars(), phase == SessionPhase::Won);

    println!(
        "Level {}: {:?} after {} frames | score {} | bricks {}/{} | stars {} | balls left {} | peak in flight {}",
        args.level,
        phase,
        frames,
        last.score,
        last.bricks_destroyed,
        last.total_bricks,
        session.stars(),
        session.stock(),
        peak_balls.borrow()
    );
    println!(
        "Progress: {} total star(s), levels unlocked up to {}",
        progress.total_stars(),
        progress.max_level_unlocked
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&last)?);
    }

    session.destroy();
    Ok(())
}
