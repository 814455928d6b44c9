use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};

use chargrid_input::app::{App, Mode};
use chargrid_input::source::{EventPump, TerminalSource};
use chargrid_input::{ui, ConsoleConfig, Grid, InputCoordinator, KeyPoll, MouseMode, Session, Throttle};

#[derive(Parser)]
#[command(name = "chargrid-paint", about = "Paint on a character grid, one poll at a time")]
struct Cli {
    /// Grid height in lines (palette included)
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u16).range(2..=60))]
    lines: u16,

    /// Grid width in columns
    #[arg(long, default_value_t = 40, value_parser = clap::value_parser!(u16).range(14..=100))]
    cols: u16,

    /// Minimum interval between key and mouse polls, in milliseconds
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    min_poll_ms: u64,

    /// Poll as fast as input arrives instead of throttling
    #[arg(long)]
    no_throttle: bool,

    /// Ignore mouse drags (click-only painting)
    #[arg(long)]
    no_drag: bool,

    /// Write logs to this file (RUST_LOG controls the level)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    // ── Terminal setup ──────────────────────────────────────────
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let release_reports = supports_keyboard_enhancement().unwrap_or(false);
    if release_reports {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Panic hook: restore terminal before printing the panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if release_reports {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(info);
    }));

    // ── Run ─────────────────────────────────────────────────────
    let result = run(&mut terminal, &cli, release_reports);

    // ── Terminal teardown ───────────────────────────────────────
    if release_reports {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;

    result
}

fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cli: &Cli,
    release_reports: bool,
) -> Result<()> {
    let min_poll = Duration::from_millis(cli.min_poll_ms);
    let throttle = if cli.no_throttle {
        Throttle {
            enabled: false,
            min_interval: min_poll,
        }
    } else {
        Throttle::new(min_poll)
    };
    let config = ConsoleConfig {
        throttle,
        mouse: MouseMode::from_flags(true, !cli.no_drag),
        ..ConsoleConfig::default()
    };

    let grid = Arc::new(Grid::new(cli.lines, cli.cols));
    let input = Arc::new(InputCoordinator::new(config)?.with_display(grid.clone()));
    log::info!("starting with {:?}", input.throttle());

    // ── Event source thread ─────────────────────────────────────
    let stop = Arc::new(AtomicBool::new(false));
    let mut pump = EventPump::new(Arc::clone(&input), ui::grid_area(&grid), release_reports);
    let pump_stop = Arc::clone(&stop);
    let pump_thread = thread::spawn(move || pump.run(&mut TerminalSource, &pump_stop));

    // ── Consumer loop ───────────────────────────────────────────
    let result = consume(terminal, &input, &grid, min_poll);

    stop.store(true, Ordering::Relaxed);
    match pump_thread.join() {
        Ok(pumped) => pumped.context("terminal event source failed")?,
        Err(_) => bail!("event source thread panicked"),
    }
    result
}

/// Poll-draw loop of the paint program. Uses only the coordinator's
/// consumer API, the way a student program would.
fn consume(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    input: &InputCoordinator,
    grid: &Grid,
    frame_time: Duration,
) -> Result<()> {
    let mut app = App::new();
    app.draw_palette(grid);
    grid.move_to(1, 0);

    while !app.should_quit && input.session() != Session::Closed {
        match input.poll_any_key(frame_time) {
            KeyPoll::Key(code) => app.handle_key(grid, code),
            KeyPoll::MousePending => {
                app.key_released();
                if let Some(ev) = input.poll_mouse_event(Duration::ZERO) {
                    app.handle_mouse(grid, ev);
                }
            }
            KeyPoll::NoKey => app.key_released(),
        }

        while let Some(c) = input.poll_char(Duration::ZERO) {
            if app.handle_char(grid, c) {
                let typing = app.mode == Mode::Type;
                input.set_echo(typing);
                input.set_cursor_visible(typing);
            }
        }

        let status = status_line(&app, input);
        terminal.draw(|frame| ui::draw(frame, grid, "chargrid paint", &status, app.help()))?;
    }
    Ok(())
}

fn status_line(app: &App, input: &InputCoordinator) -> String {
    let throttle = input.throttle();
    let poll = if throttle.enabled {
        format!("{}ms", throttle.min_interval.as_millis())
    } else {
        String::from("off")
    };
    format!(
        "{:?} | colour {:?} | last {} | throttle {poll}",
        app.mode, app.color, app.last_event
    )
}
