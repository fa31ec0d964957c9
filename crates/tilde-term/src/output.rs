// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Output buffering.
//
// `OutputBuffer` accumulates every byte of a frame in memory, escape
// sequences included, so the whole frame reaches the terminal in
// a single `write()` syscall. A frame written in pieces can be observed
// half-drawn by the terminal; a frame written once cannot.
//
// The flush is not `write_all`: `write_all` loops on short
// writes, which would split the frame. A short write is reported as an
// error instead and the frame is abandoned.
//
// `TtyOutput` exists for the same reason: `io::Stdout` is line-buffered
// and would cut a frame at its last newline into two syscalls.

use std::io::{self, Write};

use crate::error::{Error, Result};

/// A byte buffer that accumulates ANSI output for a single `write()` syscall.
///
/// Default capacity is 16 KB.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with default capacity (16 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append raw bytes.
    #[inline]
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append `n` copies of `byte`.
    pub fn push_repeat(&mut self, byte: u8, n: usize) {
        self.buf.resize(self.buf.len() + n, byte);
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write the accumulated frame with exactly one `write` call, then clear.
    ///
    /// The buffer is cleared whether or not the write succeeds: a failed
    /// frame is never resent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TerminalIo`] if the write fails or is short.
    pub fn flush_once(&mut self, w: &mut impl Write) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let result = write_frame(w, &self.buf);
        self.buf.clear();
        result
    }
}

fn write_frame(w: &mut impl Write, frame: &[u8]) -> Result<()> {
    let written = w.write(frame).map_err(Error::write)?;
    if written != frame.len() {
        return Err(Error::write(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("short write: {written} of {} bytes", frame.len()),
        )));
    }
    w.flush().map_err(Error::write)
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing via flush_once().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── TtyOutput ───────────────────────────────────────────────────────────────

/// Unbuffered writer on stdout's file descriptor.
///
/// Each `write` is exactly one `write(2)`, so a frame handed over in one
/// call reaches the terminal in one call.
#[derive(Debug, Default)]
pub struct TtyOutput {
    _private: (),
}

impl TtyOutput {
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(unix)]
impl Write for TtyOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = unsafe { libc::write(libc::STDOUT_FILENO, buf.as_ptr().cast(), buf.len()) };
        usize::try_from(n).map_err(|_| io::Error::last_os_error())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(not(unix))]
impl Write for TtyOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(buf)?;
        stdout.flush()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
