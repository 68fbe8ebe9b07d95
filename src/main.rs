//! Rocketris: handheld-style falling-block puzzle in the terminal, with a rocket launch for high scores.

mod app;
mod audio;
mod ending;
mod grid;
mod input;
mod leaderboard;
mod piece;
mod session;
mod theme;
mod timing;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use leaderboard::{FileLeaderboard, Leaderboard, UnavailableLeaderboard};
use std::path::PathBuf;

/// Options derived from CLI that affect the engine (seeding, frame pacing).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seed: u64,
    pub frame_rate: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(theme) => theme,
        Err(e) => {
            log::warn!("failed to load theme, using palette defaults: {e}");
            theme::Theme::for_palette(args.palette)
        }
    };
    let config = GameConfig {
        seed: args.seed.unwrap_or_else(rand::random),
        frame_rate: args.frame_rate,
    };
    log::info!("starting with seed {}", config.seed);

    let board: Box<dyn Leaderboard> = if args.no_leaderboard {
        Box::new(UnavailableLeaderboard)
    } else {
        let store = FileLeaderboard::new(args.leaderboard.unwrap_or_else(leaderboard::default_path));
        log::info!("leaderboard at {}", store.path().display());
        Box::new(store)
    };

    let mut app = App::new(
        config,
        theme,
        board,
        Box::new(audio::TerminalAudio::new(args.mute)),
        Box::new(timing::MonotonicClock::new()),
    );
    app.run()?;
    Ok(())
}

/// Logs go to a file so they never tear the alternate screen; no file, no logging.
fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "rocketris",
    version,
    about = "Handheld-style falling-block puzzle in the terminal. Clear lines, score big, watch the rocket go.",
    long_about = "Rocketris is a terminal falling-block puzzle in the style of the classic handheld.\n\n\
        Pieces fall into a 10x20 well; complete rows clear and score more at higher levels. \
        Any finishing score launches a rocket, bigger for bigger scores, before the high-score table.\n\n\
        CONTROLS:\n  Left/Right  Move    Down       Soft drop   Z / X      Rotate\n  Enter/Space Start / pause   M  Mute   Q / Esc    Quit\n\n\
        NAME ENTRY:\n  Left/Right  Pick slot   Up/Down    Change letter   Z / X / Enter  Confirm\n\n\
        Use --theme to load a btop-style theme file."
)]
pub struct Args {
    /// Seed for piece selection and exhaust particles. Random if not set.
    #[arg(short, long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Keys missing from the file keep the palette colour.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: classic (green LCD), pocket (grey) or high-contrast.
    #[arg(long, default_value = "classic")]
    pub palette: Palette,

    /// Leaderboard file (JSON). Defaults to $XDG_CONFIG_HOME/rocketris/leaderboard.json.
    #[arg(long, value_name = "FILE")]
    pub leaderboard: Option<PathBuf>,

    /// Play without a leaderboard: every game ends on an empty ranking.
    #[arg(long, conflicts_with = "leaderboard")]
    pub no_leaderboard: bool,

    /// Start with sound muted.
    #[arg(long)]
    pub mute: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write logs here (filter with RUST_LOG). Logging is off without it.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Classic,

    #[value(alias = "grey", alias = "gray")]
    Pocket,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,
}
