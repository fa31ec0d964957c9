// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Terminal input decoder.
//
// Turns raw stdin bytes into typed events: printable bytes, control
// bytes, and the handful of named keys the viewer reacts to. Handles the
// legacy encodings terminals actually send for those keys:
//
// - CSI letter sequences  `ESC [ A` .. `ESC [ D`, `ESC [ H`, `ESC [ F`
// - CSI tilde sequences   `ESC [ 1 ~` .. `ESC [ 8 ~`
// - SS3 sequences         `ESC O H`, `ESC O F`
//
// # Design
//
// Decoding pulls bytes one at a time from a `ByteSource`. In raw mode
// with `VMIN = 0` a read returns zero bytes after `VTIME` tenths of a
// second, so every pull is bounded. A timeout before the first byte is
// not an event: `decode_once` reports it as `None` so the caller can
// redraw; `decode` just tries again.
//
// # Escape vs escape-sequence ambiguity
//
// A bare `ESC` could be the Escape key or the first byte of a sequence
// whose tail hasn't arrived. After `ESC`, each of the next bytes gets one
// timeout window. If either window passes empty, the result is a bare
// `Escape`. A slow link can therefore turn a Home key into Escape plus
// stray `[` `H` bytes; a longer timeout would make Escape itself feel
// laggy, so the short window stays.

use std::collections::VecDeque;
use std::io;

use crate::error::{Error, Result};

/// The escape byte.
pub const ESC: u8 = 0x1B;

/// The byte a terminal sends for `Ctrl` + `key` (e.g. `ctrl(b'q') == 0x11`).
#[inline]
#[must_use]
pub const fn ctrl(key: u8) -> u8 {
    key & 0x1f
}

// ─── Event Types ────────────────────────────────────────────────────────────

/// A decoded terminal input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A byte at or above `0x20`.
    Char(u8),
    /// A byte below `0x20` (Ctrl+letter, Enter, Tab, ...).
    ControlChar(u8),
    /// A bare escape, or a sequence that didn't decode.
    Escape,
    /// A named key reported through an escape sequence.
    SpecialKey(SpecialKey),
}

/// Named keys reported through escape sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKey {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
}

// ─── Byte Sources ───────────────────────────────────────────────────────────

/// A source of single bytes with a bounded wait.
pub trait ByteSource {
    /// Read one byte.
    ///
    /// `Ok(None)` means nothing arrived within the source's timeout.
    ///
    /// # Errors
    ///
    /// Any failure other than a timeout.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
}

/// The controlling terminal's input side (stdin).
///
/// Timing comes from the termios `VMIN`/`VTIME` set by
/// [`RawMode`](crate::terminal::RawMode); this type just issues `read(2)`.
#[derive(Debug, Default)]
pub struct TtyInput {
    _private: (),
}

impl TtyInput {
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(unix)]
impl ByteSource for TtyInput {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };
        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                match err.kind() {
                    // Cygwin-style EAGAIN on timeout, and signals (SIGWINCH)
                    // landing mid-read, are both "nothing yet".
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => Ok(None),
                    _ => Err(err),
                }
            }
        }
    }
}

#[cfg(not(unix))]
impl ByteSource for TtyInput {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        use std::io::Read;

        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}

/// One step of a [`ScriptedSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Deliver this byte.
    Byte(u8),
    /// Report an empty read (timeout).
    Timeout,
    /// Fail the read.
    Fail,
}

/// An in-memory byte source that replays a fixed script.
///
/// Once the script is exhausted every read times out. Used to drive the
/// decoder and dispatcher without a terminal.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    reads: usize,
}

impl ScriptedSource {
    /// Replay `steps` in order.
    #[must_use]
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            reads: 0,
        }
    }

    /// Deliver `bytes` back-to-back with no timeouts between them.
    #[must_use]
    pub fn bytes(bytes: &[u8]) -> Self {
        Self::new(bytes.iter().copied().map(Step::Byte))
    }

    /// A source whose first read fails.
    #[must_use]
    pub fn failing() -> Self {
        Self::new([Step::Fail])
    }

    /// Steps not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    /// Total reads served, timeouts included.
    #[must_use]
    pub const fn reads(&self) -> usize {
        self.reads
    }
}

impl ByteSource for ScriptedSource {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.reads += 1;
        match self.steps.pop_front() {
            Some(Step::Byte(b)) => Ok(Some(b)),
            Some(Step::Timeout) | None => Ok(None),
            Some(Step::Fail) => Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted failure")),
        }
    }
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Escape-sequence key decoder over a [`ByteSource`].
pub struct KeyDecoder<S> {
    source: S,
}

impl<S: ByteSource> KeyDecoder<S> {
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// The underlying source (the size probe reads replies through it).
    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the decoder, returning the source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Block (in timeout-sized steps) until one event decodes.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalIo`] if a read fails.
    pub fn decode(&mut self) -> Result<InputEvent> {
        loop {
            if let Some(event) = self.decode_once()? {
                return Ok(event);
            }
        }
    }

    /// Decode one event, or `None` if the first read timed out.
    ///
    /// # Errors
    ///
    /// [`Error::TerminalIo`] if a read fails.
    pub fn decode_once(&mut self) -> Result<Option<InputEvent>> {
        let Some(byte) = self.read()? else {
            return Ok(None);
        };

        if byte != ESC {
            return Ok(Some(classify(byte)));
        }
        self.decode_escape().map(Some)
    }

    fn read(&mut self) -> Result<Option<u8>> {
        self.source.read_byte().map_err(Error::read)
    }

    /// Decode the tail of a sequence whose `ESC` was already read.
    fn decode_escape(&mut self) -> Result<InputEvent> {
        let Some(first) = self.read()? else {
            return Ok(InputEvent::Escape);
        };
        let Some(second) = self.read()? else {
            return Ok(InputEvent::Escape);
        };

        let key = match first {
            b'[' if second.is_ascii_digit() => {
                let Some(third) = self.read()? else {
                    return Ok(InputEvent::Escape);
                };
                if third == b'~' { tilde_key(second) } else { None }
            }
            b'[' => csi_letter_key(second),
            b'O' => ss3_key(second),
            _ => None,
        };

        Ok(key.map_or(InputEvent::Escape, InputEvent::SpecialKey))
    }
}

// ─── Stateless Mapping Functions ────────────────────────────────────────────

/// Classify a byte that did not start an escape sequence.
#[inline]
#[must_use]
pub const fn classify(byte: u8) -> InputEvent {
    if byte < 0x20 {
        InputEvent::ControlChar(byte)
    } else {
        InputEvent::Char(byte)
    }
}

/// `ESC [ digit ~`.
///
/// 1/7 and 4/8 both mean Home/End: terminals disagree on which to send.
const fn tilde_key(digit: u8) -> Option<SpecialKey> {
    match digit {
        b'1' | b'7' => Some(SpecialKey::Home),
        b'3' => Some(SpecialKey::Delete),
        b'4' | b'8' => Some(SpecialKey::End),
        b'5' => Some(SpecialKey::PageUp),
        b'6' => Some(SpecialKey::PageDown),
        _ => None,
    }
}

/// `ESC [ letter`.
const fn csi_letter_key(letter: u8) -> Option<SpecialKey> {
    match letter {
        b'A' => Some(SpecialKey::ArrowUp),
        b'B' => Some(SpecialKey::ArrowDown),
        b'C' => Some(SpecialKey::ArrowRight),
        b'D' => Some(SpecialKey::ArrowLeft),
        b'H' => Some(SpecialKey::Home),
        b'F' => Some(SpecialKey::End),
        _ => None,
    }
}

/// `ESC O letter`.
const fn ss3_key(letter: u8) -> Option<SpecialKey> {
    match letter {
        b'H' => Some(SpecialKey::Home),
        b'F' => Some(SpecialKey::End),
        _ => None,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode(bytes: &[u8]) -> InputEvent {
        KeyDecoder::new(ScriptedSource::bytes(bytes)).decode().unwrap()
    }

    fn special(key: SpecialKey) -> InputEvent {
        InputEvent::SpecialKey(key)
    }

    // ── Plain bytes ─────────────────────────────────────────────────────

    #[test]
    fn printable_byte() {
        assert_eq!(decode(b"a"), InputEvent::Char(b'a'));
        assert_eq!(decode(b" "), InputEvent::Char(b' '));
        assert_eq!(decode(b"~"), InputEvent::Char(b'~'));
        assert_eq!(decode(b"\x7f"), InputEvent::Char(0x7f));
    }

    #[test]
    fn control_bytes() {
        assert_eq!(decode(b"\x11"), InputEvent::ControlChar(ctrl(b'q')));
        assert_eq!(decode(b"\r"), InputEvent::ControlChar(b'\r'));
        assert_eq!(decode(b"\x00"), InputEvent::ControlChar(0));
        assert_eq!(decode(b"\x1f"), InputEvent::ControlChar(0x1f));
    }

    #[test]
    fn ctrl_masks_to_low_five_bits() {
        assert_eq!(ctrl(b'q'), 0x11);
        assert_eq!(ctrl(b'Q'), 0x11);
        assert_eq!(ctrl(b'a'), 0x01);
    }

    #[test]
    fn one_event_per_decode() {
        let mut dec = KeyDecoder::new(ScriptedSource::bytes(b"ab"));
        assert_eq!(dec.decode().unwrap(), InputEvent::Char(b'a'));
        assert_eq!(dec.decode().unwrap(), InputEvent::Char(b'b'));
    }

    // ── CSI ─────────────────────────────────────────────────────────────

    #[test]
    fn arrows() {
        assert_eq!(decode(b"\x1b[A"), special(SpecialKey::ArrowUp));
        assert_eq!(decode(b"\x1b[B"), special(SpecialKey::ArrowDown));
        assert_eq!(decode(b"\x1b[C"), special(SpecialKey::ArrowRight));
        assert_eq!(decode(b"\x1b[D"), special(SpecialKey::ArrowLeft));
    }

    #[test]
    fn csi_home_end_letters() {
        assert_eq!(decode(b"\x1b[H"), special(SpecialKey::Home));
        assert_eq!(decode(b"\x1b[F"), special(SpecialKey::End));
    }

    #[test]
    fn tilde_keys() {
        assert_eq!(decode(b"\x1b[1~"), special(SpecialKey::Home));
        assert_eq!(decode(b"\x1b[3~"), special(SpecialKey::Delete));
        assert_eq!(decode(b"\x1b[4~"), special(SpecialKey::End));
        assert_eq!(decode(b"\x1b[5~"), special(SpecialKey::PageUp));
        assert_eq!(decode(b"\x1b[6~"), special(SpecialKey::PageDown));
        assert_eq!(decode(b"\x1b[7~"), special(SpecialKey::Home));
        assert_eq!(decode(b"\x1b[8~"), special(SpecialKey::End));
    }

    #[test]
    fn unknown_tilde_digit_is_escape() {
        assert_eq!(decode(b"\x1b[2~"), InputEvent::Escape);
        assert_eq!(decode(b"\x1b[9~"), InputEvent::Escape);
    }

    #[test]
    fn digit_without_tilde_is_escape() {
        let mut dec = KeyDecoder::new(ScriptedSource::bytes(b"\x1b[5Ax"));
        assert_eq!(dec.decode().unwrap(), InputEvent::Escape);
        // The non-tilde byte was consumed as part of the failed sequence.
        assert_eq!(dec.decode().unwrap(), InputEvent::Char(b'x'));
    }

    #[test]
    fn unknown_csi_letter_is_escape() {
        assert_eq!(decode(b"\x1b[Z"), InputEvent::Escape);
    }

    // ── SS3 ─────────────────────────────────────────────────────────────

    #[test]
    fn ss3_home_end() {
        assert_eq!(decode(b"\x1bOH"), special(SpecialKey::Home));
        assert_eq!(decode(b"\x1bOF"), special(SpecialKey::End));
    }

    #[test]
    fn ss3_other_is_escape() {
        assert_eq!(decode(b"\x1bOP"), InputEvent::Escape);
    }

    #[test]
    fn unknown_introducer_is_escape() {
        assert_eq!(decode(b"\x1bxy"), InputEvent::Escape);
    }

    // ── Timeouts ────────────────────────────────────────────────────────

    #[test]
    fn lone_escape_times_out_to_escape() {
        assert_eq!(decode(b"\x1b"), InputEvent::Escape);
    }

    #[test]
    fn truncated_after_bracket_is_escape() {
        assert_eq!(decode(b"\x1b["), InputEvent::Escape);
    }

    #[test]
    fn truncated_before_tilde_is_escape() {
        assert_eq!(decode(b"\x1b[3"), InputEvent::Escape);
    }

    #[test]
    fn late_tail_is_not_joined() {
        let mut dec = KeyDecoder::new(ScriptedSource::new([
            Step::Byte(ESC),
            Step::Timeout,
            Step::Byte(b'['),
            Step::Byte(b'A'),
        ]));
        assert_eq!(dec.decode().unwrap(), InputEvent::Escape);
        assert_eq!(dec.decode().unwrap(), InputEvent::Char(b'['));
        assert_eq!(dec.decode().unwrap(), InputEvent::Char(b'A'));
    }

    #[test]
    fn timeout_before_first_byte_is_not_an_event() {
        let mut dec = KeyDecoder::new(ScriptedSource::new([Step::Timeout]));
        assert_eq!(dec.decode_once().unwrap(), None);
        assert_eq!(dec.source_mut().reads(), 1);
    }

    #[test]
    fn decode_waits_through_timeouts() {
        let mut dec = KeyDecoder::new(ScriptedSource::new([
            Step::Timeout,
            Step::Timeout,
            Step::Byte(b'z'),
        ]));
        assert_eq!(dec.decode().unwrap(), InputEvent::Char(b'z'));
        assert_eq!(dec.into_inner().reads(), 3);
    }

    // ── Errors ──────────────────────────────────────────────────────────

    #[test]
    fn read_error_is_fatal() {
        let mut dec = KeyDecoder::new(ScriptedSource::failing());
        let err = dec.decode().unwrap_err();
        assert!(matches!(err, Error::TerminalIo { op: "read", .. }));
    }

    #[test]
    fn read_error_mid_sequence_is_fatal() {
        let mut dec = KeyDecoder::new(ScriptedSource::new([Step::Byte(ESC), Step::Fail]));
        assert!(dec.decode().is_err());
    }

    // ── Scripted source ─────────────────────────────────────────────────

    #[test]
    fn exhausted_script_times_out() {
        let mut src = ScriptedSource::bytes(b"x");
        assert_eq!(src.read_byte().unwrap(), Some(b'x'));
        assert_eq!(src.read_byte().unwrap(), None);
        assert_eq!(src.read_byte().unwrap(), None);
        assert_eq!(src.remaining(), 0);
        assert_eq!(src.reads(), 3);
    }
}
