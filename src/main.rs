//! caroling-sim: headless driver for the caroling minigame.
//!
//! Plays houses with autoplay against a simulated clock and prints what a
//! player would see.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use caroling::app::{CarolingGame, HouseOutcome};
use caroling::config::GameConfig;
use caroling::model::beat_map::{BeatMap, BeatMapLoader, LANE_COUNT, NoteEvent};
use caroling::model::song::{HouseNumber, SongRef};
use caroling::render::{ConsolePresenter, PresentationAdapter};
use caroling::state::caroling::{AutoplayProfile, SessionSettings, plan_presses};
use caroling::traits::audio::SilentAudio;
use caroling::traits::input::{InputProvider, ScriptedInput};
use caroling::traits::time::{MockTimeProvider, TimeProvider, ms_to_us, secs_to_us};
use caroling::util::{UserError, init_logging};

#[derive(Parser, Debug)]
#[command(name = "caroling-sim", about = "Headless caroling minigame simulator")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to the game config JSON file.
    #[arg(long, default_value = "caroling.json")]
    config: PathBuf,

    /// Override the directory songs and beat maps are read from.
    #[arg(long)]
    asset_root: Option<PathBuf>,

    /// House to carol at.
    #[arg(long, default_value_t = 1, conflicts_with = "run")]
    house: HouseNumber,

    /// Visit every house in order until the run ends.
    #[arg(long)]
    run: bool,

    /// Autoplay accuracy.
    #[arg(long, value_enum, default_value_t = AutoplayProfile::Perfect)]
    profile: AutoplayProfile,

    /// RNG seed for song rotation, satisfaction and mixed autoplay.
    #[arg(long, env = "CAROLING_SEED")]
    seed: Option<u64>,

    /// Length of every simulated song.
    #[arg(long, default_value_t = 30.0)]
    song_seconds: f64,

    /// Simulated frame length.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Print every judgement and debug logs.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write generated beat maps for every configured song under DIR.
    DemoAssets {
        #[arg(default_value = "assets")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let mut config = GameConfig::load_from(&args.config)
        .with_context(|| format!("failed to load config {}", args.config.display()))?;
    if let Some(root) = &args.asset_root {
        config.asset_root = root.clone();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    let song_us = secs_to_us(args.song_seconds);

    if let Some(Command::DemoAssets { dir }) = &args.command {
        return write_demo_assets(&config, dir, song_us, args.seed.unwrap_or(0));
    }

    let houses: Vec<HouseNumber> = if args.run {
        config.catalog().house_numbers().collect()
    } else {
        vec![args.house]
    };

    let clock = Rc::new(MockTimeProvider::new());
    let audio = SilentAudio::new(clock.clone(), song_us);
    let mut game = CarolingGame::new(config, audio);
    let mut adapter = PresentationAdapter::new(ConsolePresenter::new(io::stdout(), args.verbose));
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let frame_us = ms_to_us(args.frame_ms.max(1));

    for house in houses {
        if game.progress().is_game_over() {
            break;
        }
        println!("== House {house} ==");
        play_house(
            &mut game,
            &clock,
            &mut adapter,
            house,
            args.profile,
            frame_us,
            &mut rng,
        )?;
    }

    let snapshot = game.progress().snapshot();
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "Run: score {}, lives {}/{}, houses {:?}{}{}",
        snapshot.total_score,
        snapshot.lives,
        snapshot.max_lives,
        snapshot.completed_houses,
        if snapshot.can_exit { ", exit open" } else { "" },
        if snapshot.game_over { ", GAME OVER" } else { "" },
    )?;
    Ok(())
}

fn play_house<W: Write>(
    game: &mut CarolingGame<SilentAudio>,
    clock: &MockTimeProvider,
    adapter: &mut PresentationAdapter<ConsolePresenter<W>>,
    house: HouseNumber,
    profile: AutoplayProfile,
    frame_us: i64,
    rng: &mut StdRng,
) -> Result<()> {
    let entered_at = clock.now_us();
    let handle = match game.start_session(house, entered_at, log_outcome) {
        Ok(handle) => handle,
        Err(e) => {
            warn!("House {house} could not start: {e}");
            println!("{}", UserError::for_session_error(&e));
            return Ok(());
        }
    };

    let mut input = match game.active_session() {
        Some(session) => plan_for(
            game.config(),
            session.song(),
            session.settings(),
            entered_at,
            profile,
            rng,
        ),
        None => ScriptedInput::default(),
    };
    adapter.handle_all(&game.drain_events())?;

    while game.active_handle() == Some(handle) {
        let now = clock.advance(frame_us);
        for event in input.poll_events(now) {
            game.on_input(event)?;
        }
        game.tick(now)?;
        adapter.handle_all(&game.drain_events())?;
    }
    Ok(())
}

fn log_outcome(outcome: &HouseOutcome) {
    info!(
        "House {} {}: score {}, satisfaction {}",
        outcome.house(),
        if outcome.success() { "won over" } else { "lost" },
        outcome.result.score,
        outcome.result.final_satisfaction
    );
    if outcome.need_respawn {
        info!("Back to the village square with {} lives", outcome.progress.lives);
    }
}

/// Autoplay presses for the song the session picked.
fn plan_for(
    config: &GameConfig,
    song: &SongRef,
    settings: &SessionSettings,
    entered_at_us: i64,
    profile: AutoplayProfile,
    rng: &mut StdRng,
) -> ScriptedInput {
    match BeatMapLoader::load(&config.resolve_asset(&song.beat_map)) {
        Ok(beat_map) => plan_presses(&beat_map, settings, entered_at_us, profile, rng),
        Err(e) => {
            warn!("Autoplay has no beat map for '{}': {e}", song.name);
            ScriptedInput::default()
        }
    }
}

fn write_demo_assets(config: &GameConfig, dir: &Path, song_us: i64, seed: u64) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    for house in &config.houses {
        // Busier charts for later houses.
        let interval_us = 1_000_000 - i64::from(house.number.saturating_sub(1)) * 120_000;
        for song in &house.songs {
            let beat_map = demo_beat_map(&song.name, song_us, interval_us, &mut rng);
            let path = dir.join(&song.beat_map);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(&path, beat_map.to_json()?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("{} ({} notes)", path.display(), beat_map.len());
        }
    }
    Ok(())
}

fn demo_beat_map<R: Rng>(title: &str, song_us: i64, interval_us: i64, rng: &mut R) -> BeatMap {
    let last_us = song_us - 2_000_000;
    let mut notes = Vec::new();
    let mut time_us = 1_000_000;
    while time_us <= last_us {
        notes.push(NoteEvent::new(rng.gen_range(0..LANE_COUNT), time_us));
        time_us += interval_us;
    }
    let mut beat_map = BeatMap::new(notes);
    beat_map.title = Some(title.to_string());
    beat_map.bpm = Some(60_000_000.0 / interval_us as f64);
    beat_map
}
