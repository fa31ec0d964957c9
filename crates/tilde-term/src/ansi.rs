// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit; the renderer owns that. This module
// just knows the byte-level encoding of every terminal command we need.
//
// All cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal (ANSI standard uses 1-based coordinates).
//
// All functions return `io::Result` propagated from the underlying writer.
// In practice they never fail when writing to `OutputBuffer` (backed by a Vec).

use std::io::{self, Write};

/// Clear screen (ED 2).
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";
/// Cursor home (CUP with no parameters).
pub const CURSOR_HOME: &[u8] = b"\x1b[H";
/// Erase from the cursor to the end of the line (EL 0).
pub const CLEAR_LINE: &[u8] = b"\x1b[K";
/// Hide the cursor (DECTCEM reset).
pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";
/// Show the cursor (DECTCEM set).
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";
/// Device Status Report: ask the terminal for the cursor position.
pub const REQUEST_CURSOR_POSITION: &[u8] = b"\x1b[6n";
/// Push the cursor as far right and down as the terminal allows.
///
/// CUF/CUD stop at the screen edge, unlike CUP which is undefined past it.
pub const CURSOR_FAR_CORNER: &[u8] = b"\x1b[999C\x1b[999B";

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` using the CUP (Cursor Position) sequence.
///
/// Our coordinates are 0-indexed; ANSI CUP is 1-indexed.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: usize, y: usize) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", y + 1, x + 1)
}

/// Move the cursor to the top-left corner.
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CURSOR_HOME)
}

/// Hide the cursor.
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CURSOR_HIDE)
}

/// Show the cursor.
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CURSOR_SHOW)
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen.
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CLEAR_SCREEN)
}

/// Clear from the cursor to the end of the current line.
#[inline]
pub fn clear_line(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CLEAR_LINE)
}

// ─── Cursor Position Report ──────────────────────────────────────────────────

/// Parse a cursor position report `ESC [ rows ; cols R` (terminator optional).
///
/// Returns `(rows, cols)` as reported (1-based), which for a cursor parked
/// in the bottom-right corner equals the screen size. `None` if the reply
/// is malformed.
#[must_use]
pub fn parse_cursor_report(reply: &[u8]) -> Option<(u16, u16)> {
    let body = reply.strip_prefix(b"\x1b[")?;
    let body = body.strip_suffix(b"R").unwrap_or(body);
    let text = std::str::from_utf8(body).ok()?;
    let (rows, cols) = text.split_once(';')?;
    Some((rows.parse().ok()?, cols.parse().ok()?))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
