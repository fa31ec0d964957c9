// SPDX-License-Identifier: MIT
//
// tilde — a raw-mode terminal text viewer.
//
// This is the binary that wires the two crates together:
//
//   tilde-term   → raw mode, key decoding, window size, one-write output
//   tilde-editor → line sequence, viewport, frame renderer, session loop
//
// Each keypress flows through:
//
//   stdin → KeyDecoder → Session::handle → Viewport motion
//   Session::step → Viewport::scroll → FrameRenderer → one write(2)
//
// Ordering on the way out matters: the `RawMode` guard lives inside
// `run`, so by the time an error reaches `main` the terminal is already
// back in cooked mode and the diagnostic prints to a usable shell.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tilde_editor::dispatch::{Session, exit_status};
use tilde_editor::lines::LineSequence;
use tilde_editor::options::Options;
use tilde_term::input::TtyInput;
use tilde_term::output::TtyOutput;
use tilde_term::resize::SigwinchWatcher;
use tilde_term::terminal::{self, DEFAULT_READ_TIMEOUT, RawMode};

// ─── Command line ───────────────────────────────────────────────────────────

/// View a text file in the terminal. Arrow keys, Home/End and
/// PageUp/PageDown move the cursor; Ctrl-Q quits.
#[derive(Debug, Parser)]
#[command(name = "tilde", version, about)]
struct Cli {
    /// File to open. Without one, an empty screen with a banner is shown.
    file: Option<PathBuf>,

    /// Key read timeout in tenths of a second.
    #[arg(
        long,
        value_name = "DECISECONDS",
        default_value_t = DEFAULT_READ_TIMEOUT,
        value_parser = clap::value_parser!(u8).range(1..)
    )]
    read_timeout: u8,

    /// Write logs to this file (filter with TILDE_LOG, default `info`).
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            read_timeout: self.read_timeout,
            ..Options::default()
        }
    }
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Install a file-backed subscriber.
///
/// Stderr is the terminal we are drawing on, so logs only go to a file,
/// and only when one is asked for.
fn init_logging(path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("TILDE_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

// ─── Session ────────────────────────────────────────────────────────────────

fn run(lines: LineSequence, options: &Options) -> tilde_editor::Result<()> {
    let mut raw = RawMode::enter(options.read_timeout)?;

    let mut input = TtyInput::new();
    let mut output = TtyOutput::new();
    let size = terminal::window_size(&mut input, &mut output)?;
    tracing::info!(cols = size.cols, rows = size.rows, "session started");

    let mut session = Session::new(
        lines,
        size,
        input,
        output,
        SigwinchWatcher::install(),
        options,
    );
    let result = session.run();

    // Restore explicitly so a failure to restore is reported; `Drop` covers
    // the early returns above. A session error outranks a restore error.
    let restored = raw.leave().map_err(tilde_editor::Error::from);
    result.and(restored)
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        if let Err(e) = init_logging(path) {
            eprintln!("tilde: {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    }

    let lines = match &cli.file {
        Some(path) => match LineSequence::load(path) {
            Ok(lines) => lines,
            Err(e) => {
                tracing::error!(error = %e, "load failed");
                eprintln!("tilde: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => LineSequence::new(),
    };

    let result = run(lines, &cli.options());
    if let Err(e) = &result {
        tracing::error!(error = %e, "session failed");
        eprintln!("tilde: {e}");
    }
    ExitCode::from(exit_status(&result))
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_without_arguments() {
        let cli = Cli::try_parse_from(["tilde"]).unwrap();
        assert_eq!(cli.file, None);
        assert_eq!(cli.read_timeout, 1);
        assert_eq!(cli.log_file, None);
        assert_eq!(cli.options(), Options::default());
    }

    #[test]
    fn file_and_flags() {
        let cli = Cli::try_parse_from([
            "tilde",
            "notes.txt",
            "--read-timeout",
            "5",
            "--log-file",
            "tilde.log",
        ])
        .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("notes.txt")));
        assert_eq!(cli.options().read_timeout, 5);
        assert_eq!(cli.log_file, Some(PathBuf::from("tilde.log")));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["tilde", "--read-timeout", "0"]).is_err());
    }
}
