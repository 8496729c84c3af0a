use std::io::{self as stdio, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use flexi_logger::{DeferredNow, Duplicate, FileSpec, Logger, LoggerHandle, WriteMode};
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use log::Record;

pub mod inspect;
pub mod process;

const LOG_FILE_BASENAME: &str = "run";

/// Log levels accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

pub fn stderr_is_terminal() -> bool {
    stdio::stderr().is_terminal()
}

/// Starts logging to `<dir>/run.log`, duplicated to stderr.
///
/// While a progress bar owns the terminal only warnings and errors are duplicated. The returned
/// handle must stay alive for the rest of the run.
pub fn init_logging(level: LogLevel, dir: &Path, show_progress: bool) -> Result<LoggerHandle> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let duplicate = if show_progress {
        Duplicate::Warn
    } else {
        Duplicate::All
    };
    Logger::try_with_str(level.as_str())
        .context("Invalid log level")?
        .log_to_file(
            FileSpec::default()
                .directory(dir)
                .basename(LOG_FILE_BASENAME)
                .suffix("log")
                .suppress_timestamp(),
        )
        .duplicate_to_stderr(duplicate)
        .format(level_message_format)
        .write_mode(WriteMode::BufferAndFlush)
        .start()
        .context("Failed to start logger")
}

fn level_message_format(
    w: &mut dyn Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), stdio::Error> {
    write!(w, "{}:    {}", record.level(), record.args())
}

/// Progress bar over `len` items rendered to stderr, hidden when stderr is not a terminal.
pub fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::with_template("{bar:40.green/white} {pos}/{len} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}
