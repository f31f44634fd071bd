//! student-records binary entry point.
//!
//! Parses the command line, sets up logging, then runs either the
//! full-screen TUI (terminal in raw mode, restored on exit) or the
//! plain console menu on stdin/stdout.
//!
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::error;
use tracing_subscriber::EnvFilter;

use student_records::app::{self, AppState, Theme, config_path, keymap::Keymap};
use student_records::console::Console;
use student_records::store::StudentStore;

#[derive(Parser, Debug)]
#[command(name = "student-records", version, about = "Manage student grade records in memory")]
struct Cli {
    /// Use the numbered console menu on stdin/stdout instead of the TUI
    #[arg(long, env = "STUDENT_RECORDS_PLAIN")]
    plain: bool,

    /// Theme file (created with defaults if missing)
    #[arg(long, value_name = "PATH")]
    theme: Option<PathBuf>,

    /// Keybindings file (created with defaults if missing)
    #[arg(long, value_name = "PATH")]
    keybinds: Option<PathBuf>,

    /// Append log output to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log filter directive, e.g. "debug" or "student_records=trace"
    #[arg(long, env = "STUDENT_RECORDS_LOG", default_value = "warn")]
    log_level: String,
}

/// Install the tracing subscriber. The TUI only logs when a file is given.
fn init_logging(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_new(&cli.log_level)
        .with_context(|| format!("invalid log filter '{}'", cli.log_level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if cli.plain => builder.with_writer(std::io::stderr).init(),
        None => {}
    }
    Ok(())
}

fn path_or_default(path: &Option<PathBuf>, file_name: &str) -> String {
    path.as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| config_path(file_name))
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) {
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
}

fn run_tui(cli: &Cli) -> Result<()> {
    let theme = Theme::load_or_init(&path_or_default(&cli.theme, "theme.conf"));
    let keymap = Keymap::load_or_init(&path_or_default(&cli.keybinds, "keybinds.conf"));
    let mut app = AppState::new(StudentStore::new(), theme, keymap);

    let mut terminal = init_terminal().context("init terminal")?;
    let res = app::run(&mut terminal, &mut app);
    restore_terminal(&mut terminal);
    res
}

fn run_console() -> Result<()> {
    let mut store = StudentStore::new();
    let mut console = Console::new(std::io::stdin().lock(), std::io::stdout().lock());
    console.run(&mut store).map_err(|e| anyhow!(e))
}

/// Program entry point: exit status 0 on a normal quit, 1 after a fatal error.
fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(&cli) {
        eprintln!("student-records: {err:#}");
        return ExitCode::FAILURE;
    }

    let res = if cli.plain { run_console() } else { run_tui(&cli) };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "fatal error");
            eprintln!("student-records: {err:#}");
            ExitCode::FAILURE
        }
    }
}
