mod shared;
mod tui;
mod audio_api;
mod audio;
mod config;
mod loader;
mod middle;
mod sequencer;

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use config::EngineConfig;
use middle::Middle;
use sequencer::Sequencer;
use shared::InputEvent;

/// A 16-pad, 16-step drum sequencer for the terminal.
#[derive(Parser)]
#[clap(version, about)]
struct Cli {
    /// Directory of WAV samples; the first 16 (by name) go on the pads.
    sample_dir: Option<PathBuf>,

    /// Config file to use instead of the default one.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[clap(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = run(cli) {
        log::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

// The terminal belongs to the ui, so logs go to a file.
fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("padseq")
        .join("padseq.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path).or_else(|_| File::create(std::env::temp_dir().join("padseq.log"))) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("logging disabled: {e}");
            return;
        }
    };

    if WriteLogger::init(log_level, Config::default(), log_file).is_ok() {
        log::info!("padseq starting (log level: {log_level:?})");
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = EngineConfig::load(cli.config.as_deref())?;

    let mut audio = audio::start_audio()?;
    let sample_dir = match cli.sample_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("no current directory")?,
    };
    let wav_paths = loader::sample_loader::index_wav_in_dir(&sample_dir)?;

    let mut loaded = Vec::new();
    for path in wav_paths.iter().take(shared::NUM_PADS) {
        match loader::sample_loader::load(path, audio.sample_rate()) {
            Ok(buffer) => loaded.push(audio.register(buffer)),
            // a bad file leaves its pad empty rather than aborting startup
            Err(e) => log::warn!("skipping {}: {e:#}", path.display()),
        }
    }
    log::info!("{} sample(s) loaded from {}", loaded.len(), sample_dir.display());

    let mut seq = Sequencer::new(audio, &config);
    for (pad, sample) in loaded.into_iter().enumerate() {
        seq.assign_sample(pad, sample);
    }
    let mut middle = Middle::new(seq);

    terminal::enable_raw_mode()?;
    // Enable keyboard enhancement for real press/release detection.
    // Falls back gracefully if the terminal doesn't support it.
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        )
    );
    let _guard = RawModeGuard; // auto drops when out of scope

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let frame_rate = Duration::from_millis(16); // ~60fps
    let blink_start = Instant::now();
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        let blink_on = (blink_start.elapsed().as_millis() / 250) % 2 == 0;
        let ds = middle.display_state();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, blink_on);
        })?;

        // wake up in time for the scheduler even if no key comes in
        let timeout = middle
            .seq
            .time_until_tick(Instant::now())
            .map_or(frame_rate, |t| t.min(frame_rate));

        let events = tui::input::poll_input(timeout, &mut tui_state)?;
        for event in events {
            let quit = event == InputEvent::Quit;
            middle.handle_input(event, Instant::now());
            if quit {
                drop(term);
                return Ok(());
            }
        }

        middle.tick(Instant::now());
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = terminal::disable_raw_mode();
    }
}
