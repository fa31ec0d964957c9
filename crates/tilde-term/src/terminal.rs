// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, window size, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), and raw fd writes. These are the
// standard POSIX interfaces for terminal control; there is no safe
// alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// This module owns the terminal's raw state. `RawMode::enter` snapshots
// the original termios, switches the line discipline off, and hands back
// a guard. Dropping the guard puts the snapshot back on a normal return,
// on an early `?` return, or during unwinding. A panic hook covers the
// case where the guard is unreachable (the hook runs before unwinding
// reaches `main`, so the panic message prints to a sane terminal).
//
// The snapshot is taken once. A second `enter` while the first guard is
// alive is refused rather than overwriting the only copy of the user's
// settings.

use std::io::{self, Write};
#[cfg(unix)]
use std::sync::Mutex;
use std::sync::Once;

use crate::ansi;
use crate::error::{Error, Result};
use crate::input::ByteSource;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal, the query fails, or the
/// terminal reports zero columns.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Terminal size, falling back to a cursor-position probe.
///
/// The probe pushes the cursor into the bottom-right corner, asks the
/// terminal where it ended up, and reads the reply from `input`. Raw mode
/// must be active for the reply to arrive unechoed.
///
/// # Errors
///
/// Returns [`Error::WindowSize`] if neither method produces a size.
pub fn window_size(input: &mut impl ByteSource, out: &mut impl Write) -> Result<Size> {
    if let Some(size) = get_size() {
        tracing::debug!(cols = size.cols, rows = size.rows, "window size from ioctl");
        return Ok(size);
    }
    let size = probe_size(input, out)?;
    tracing::debug!(cols = size.cols, rows = size.rows, "window size from cursor probe");
    Ok(size)
}

/// Infer the terminal size from a cursor position report.
///
/// # Errors
///
/// Returns [`Error::WindowSize`] if the request cannot be written, the
/// reply cannot be read, or the reply does not parse.
pub fn probe_size(input: &mut impl ByteSource, out: &mut impl Write) -> Result<Size> {
    out.write_all(ansi::CURSOR_FAR_CORNER)
        .and_then(|()| out.write_all(ansi::REQUEST_CURSOR_POSITION))
        .and_then(|()| out.flush())
        .map_err(Error::WindowSize)?;

    let mut reply = Vec::with_capacity(32);
    while reply.len() < 31 {
        match input.read_byte() {
            Ok(Some(b'R') | None) => break,
            Ok(Some(b)) => reply.push(b),
            Err(e) => return Err(Error::WindowSize(e)),
        }
    }

    match ansi::parse_cursor_report(&reply) {
        Some((rows, cols)) if rows > 0 && cols > 0 => Ok(Size { cols, rows }),
        _ => Err(Error::WindowSize(io::Error::new(
            io::ErrorKind::InvalidData,
            "malformed cursor position report",
        ))),
    }
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Process-wide copy of the original termios.
///
/// The [`RawMode`] guard owns the real snapshot, but the panic hook can't
/// reach it. This backup (behind a [`Mutex`], not `static mut`) lets the
/// hook restore the line discipline without the guard. It also marks raw
/// mode as taken so a second snapshot is never captured.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Undo what a half-written frame may have left behind: the renderer hides
/// the cursor for the duration of a frame.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[?25h";

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to stdout's file descriptor,
/// bypassing the `io::stdout()` lock in case the panic happened mid-flush.
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── RawMode ────────────────────────────────────────────────────────────────

/// Default `VTIME`: reads give up after 100 ms with zero bytes.
pub const DEFAULT_READ_TIMEOUT: u8 = 1;

/// Raw-mode guard with RAII cleanup.
///
/// Holds the terminal state captured before raw mode was entered and puts
/// it back exactly once: via [`leave`](Self::leave) or on drop, whichever
/// comes first.
///
/// # Example
///
/// ```no_run
/// use tilde_term::terminal::{RawMode, DEFAULT_READ_TIMEOUT};
///
/// let raw = RawMode::enter(DEFAULT_READ_TIMEOUT)?;
/// // ... render frames, decode keys ...
/// drop(raw); // Terminal restored.
/// # Ok::<(), tilde_term::Error>(())
/// ```
pub struct RawMode {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original: libc::termios,

    /// Whether the original state still needs to be put back.
    active: bool,
}

impl RawMode {
    /// Snapshot the terminal and switch it to raw mode.
    ///
    /// `read_timeout` is `VTIME` in tenths of a second: a read with no
    /// input returns zero bytes after that long (`VMIN = 0`).
    ///
    /// # Errors
    ///
    /// [`Error::TerminalQuery`] if the attributes cannot be read (stdin is
    /// not a terminal); [`Error::TerminalConfigure`] if raw mode is already
    /// active or the new attributes cannot be applied.
    #[cfg(unix)]
    pub fn enter(read_timeout: u8) -> Result<Self> {
        let fd = libc::STDIN_FILENO;

        let mut backup = TERMIOS_BACKUP
            .lock()
            .map_err(|_| Error::TerminalConfigure(io::Error::other("termios backup poisoned")))?;
        if backup.is_some() {
            return Err(Error::TerminalConfigure(io::Error::other(
                "raw mode already active",
            )));
        }

        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &raw mut termios) } != 0 {
            return Err(Error::TerminalQuery(io::Error::last_os_error()));
        }
        let original = termios;

        make_raw(&mut termios, read_timeout);

        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) } != 0 {
            return Err(Error::TerminalConfigure(io::Error::last_os_error()));
        }

        *backup = Some(original);
        drop(backup);
        install_panic_hook();

        tracing::info!(read_timeout, "raw mode entered");
        Ok(Self {
            original,
            active: true,
        })
    }

    #[cfg(not(unix))]
    pub fn enter(_read_timeout: u8) -> Result<Self> {
        Err(Error::TerminalQuery(io::Error::new(
            io::ErrorKind::Unsupported,
            "raw mode requires a unix terminal",
        )))
    }

    /// Whether the original state has not been restored yet.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Put the captured terminal state back.
    ///
    /// Idempotent: the snapshot is applied once, later calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalConfigure`] if `tcsetattr` fails.
    pub fn leave(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.restore()
    }

    #[cfg(unix)]
    fn restore(&self) -> Result<()> {
        let rc = unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &self.original) };

        if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
            *guard = None;
        }

        if rc != 0 {
            return Err(Error::TerminalConfigure(io::Error::last_os_error()));
        }
        tracing::info!("raw mode left");
        Ok(())
    }

    #[cfg(not(unix))]
    fn restore(&self) -> Result<()> {
        Ok(())
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

/// Derive raw attributes from `termios` in place.
///
/// Input: no CR→NL translation, no XON/XOFF, no parity check, no 8th-bit
/// strip, no SIGINT on break. Output: no post-processing. Local: no echo,
/// no canonical mode, no signal keys, no `Ctrl-V` literal-next.
#[cfg(unix)]
fn make_raw(termios: &mut libc::termios, read_timeout: u8) {
    termios.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
    termios.c_oflag &= !libc::OPOST;
    termios.c_cflag |= libc::CS8;
    termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = read_timeout;
}

// ─── Tests ───────────────────────────────────────────────────────────────────
