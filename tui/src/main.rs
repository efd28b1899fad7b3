//! Companion TUI Entry Point
//!
//! Launches the terminal surface for the learning-game companion.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (synthesized sprite sheet)
//! companion-tui
//!
//! # Pre-authored images from a directory (greet.png, encourage.png, ...)
//! companion-tui --assets ./art
//!
//! # Cycle random expressions
//! companion-tui --autoplay
//!
//! # Write the synthesized sheet to a PNG and exit
//! companion-tui --dump-sheet sheet.png
//!
//! # Verbose logging (to the log file; stdout belongs to the UI)
//! RUST_LOG=debug companion-tui --log-file companion.log
//! ```

use std::fs::File;
use std::io;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use companion_core::synth::SHEET_KEY;
use companion_core::{
    default_config_path, ensure_sheet, load_config_from_path, ConfigOverrides, PresenterConfig,
    Stage,
};
use companion_tui::App;

/// Companion TUI - the learning-game mascot in your terminal
#[derive(Parser, Debug)]
#[command(name = "companion-tui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "COMPANION_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory of per-expression PNGs
    #[arg(short = 'a', long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Always synthesize the sprite sheet, even when images exist
    #[arg(long)]
    procedural: bool,

    /// Cycle random expressions
    #[arg(long)]
    autoplay: bool,

    /// Synthesize the sprite sheet, save it as PNG and exit
    #[arg(long, value_name = "PNG")]
    dump_sheet: Option<PathBuf>,

    /// Log file (defaults to companion-tui.log in the temp directory)
    #[arg(long, env = "COMPANION_LOG_FILE", value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("companion-tui.log"));
    init_logging(&log_path)?;

    if let Some(path) = &args.dump_sheet {
        return dump_sheet(path);
    }

    let config = load(&args)?;

    // Check if we have a TTY before attempting initialization
    use std::io::IsTerminal;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: companion-tui requires a terminal (TTY)");
        eprintln!();
        eprintln!("Use --dump-sheet <png> to render the sprite sheet without one.");
        std::process::exit(1);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, config, args.autoplay).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: PresenterConfig,
    autoplay: bool,
) -> Result<()> {
    let mut app = App::new(config, autoplay)?;
    app.run(terminal).await
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    Ok(())
}

/// Merge file, environment and CLI settings
fn load(args: &Args) -> Result<PresenterConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(dir) = &args.assets {
        overrides = overrides.with_assets_dir(dir.clone());
    }
    if args.procedural {
        overrides = overrides.with_force_procedural(true);
    }
    overrides.apply(&mut config);

    info!(source = %config.source(), motion = ?config.motion, "configuration loaded");
    Ok(config)
}

fn dump_sheet(path: &Path) -> Result<()> {
    let mut stage = Stage::new(1.0, 1.0);
    let report = ensure_sheet(&mut stage);
    info!(?report, "sheet synthesized");

    let texture = stage
        .texture(SHEET_KEY)
        .context("Sprite sheet was not registered")?;
    texture
        .raster()
        .save_png(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{}", path.display());
    Ok(())
}
