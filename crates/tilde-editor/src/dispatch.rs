//! Input dispatcher — the run loop of a viewer session.
//!
//! A [`Session`] owns everything one screen needs: the text, the viewport,
//! the key decoder, the output sink and the renderer. Each cycle:
//!
//! 1. pick up a terminal resize, if one happened
//! 2. scroll the viewport onto the cursor and render a frame
//! 3. decode at most one event (a read timeout yields none)
//! 4. move the cursor, quit, or ignore the event
//!
//! A timeout is not an error: the cycle ends and the next one redraws,
//! which is what keeps the screen current across resizes with no input.
//!
//! The session never touches raw mode. The caller holds the
//! [`RawMode`](tilde_term::terminal::RawMode) guard around
//! [`run`](Session::run), so the terminal is restored after the quit
//! sequence is written, or after any error unwinds out of the loop.

use std::io::Write;

use tilde_term::ansi;
use tilde_term::input::{ByteSource, InputEvent, KeyDecoder, ctrl};
use tilde_term::resize::ResizeSource;
use tilde_term::terminal::Size;

use crate::error::Result;
use crate::lines::LineSequence;
use crate::options::Options;
use crate::render::FrameRenderer;
use crate::viewport::{Motion, Viewport};

/// The byte `Ctrl-Q` sends.
pub const QUIT_KEY: u8 = ctrl(b'q');

/// Whether the loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Terminating,
}

/// Process exit status for the outcome of [`Session::run`].
///
/// 0 when the loop ended normally (including by quitting), 1 on any error.
#[must_use]
pub const fn exit_status<T>(result: &Result<T>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// One viewer session over one terminal.
pub struct Session<S, W, R> {
    lines: LineSequence,
    viewport: Viewport,
    decoder: KeyDecoder<S>,
    out: W,
    resize: R,
    renderer: FrameRenderer,
    state: State,
}

impl<S, W, R> Session<S, W, R>
where
    S: ByteSource,
    W: Write,
    R: ResizeSource,
{
    /// A session showing `lines` on a `size` screen.
    pub fn new(
        lines: LineSequence,
        size: Size,
        input: S,
        out: W,
        resize: R,
        options: &Options,
    ) -> Self {
        Self {
            lines,
            viewport: Viewport::new(size),
            decoder: KeyDecoder::new(input),
            out,
            resize,
            renderer: FrameRenderer::new(options.banner.clone()),
            state: State::Running,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[must_use]
    pub const fn lines(&self) -> &LineSequence {
        &self.lines
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// The output sink (what the terminal would have received).
    #[must_use]
    pub const fn output(&self) -> &W {
        &self.out
    }

    // -- Loop ---------------------------------------------------------------

    /// Cycle until quit.
    ///
    /// # Errors
    ///
    /// The first terminal error ends the loop; nothing is retried.
    pub fn run(&mut self) -> Result<()> {
        while self.state == State::Running {
            self.step()?;
        }
        Ok(())
    }

    /// Run one cycle: resize check, render, decode, dispatch.
    ///
    /// # Errors
    ///
    /// Rendering or reading failed.
    pub fn step(&mut self) -> Result<State> {
        if let Some(size) = self.resize.poll_resize() {
            self.viewport.resize(size);
        }

        self.viewport.scroll();
        self.renderer
            .render(&self.lines, &self.viewport, &mut self.out)?;

        if let Some(event) = self.decoder.decode_once()? {
            self.handle(event)?;
        }
        Ok(self.state)
    }

    /// Apply one event.
    ///
    /// # Errors
    ///
    /// Writing the quit sequence failed.
    pub fn handle(&mut self, event: InputEvent) -> Result<State> {
        match event {
            InputEvent::ControlChar(QUIT_KEY) => self.quit()?,
            InputEvent::SpecialKey(key) => {
                if let Some(motion) = Motion::from_key(key) {
                    self.viewport.move_cursor(motion, &self.lines);
                }
            }
            InputEvent::Char(_) | InputEvent::ControlChar(_) | InputEvent::Escape => {
                tracing::trace!(?event, "ignored");
            }
        }
        Ok(self.state)
    }

    /// Clear the screen, home the cursor, and stop the loop.
    fn quit(&mut self) -> Result<()> {
        tracing::info!("quit requested");
        self.state = State::Terminating;
        ansi::clear_screen(&mut self.out)
            .and_then(|()| ansi::cursor_home(&mut self.out))
            .and_then(|()| self.out.flush())
            .map_err(tilde_term::Error::write)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use tilde_term::input::{ESC, ScriptedSource, Step};
    use tilde_term::resize::{FixedSize, ScriptedResize};

    const SCREEN: Size = Size { cols: 80, rows: 24 };

    type TestSession<R> = Session<ScriptedSource, Vec<u8>, R>;

    fn session(lines: LineSequence, steps: Vec<Step>) -> TestSession<FixedSize> {
        Session::new(
            lines,
            SCREEN,
            ScriptedSource::new(steps),
            Vec::new(),
            FixedSize,
            &Options::default(),
        )
    }

    fn keys(bytes: &[u8]) -> Vec<Step> {
        bytes.iter().copied().map(Step::Byte).collect()
    }

    fn numbered(n: usize) -> LineSequence {
        LineSequence::from_lines((0..n).map(|i| format!("line {i}")))
    }

    fn output(s: &TestSession<impl ResizeSource>) -> String {
        String::from_utf8_lossy(s.output()).into_owned()
    }

    // ── Quit ──────────────────────────────────────────────────────────────

    #[test]
    fn quit_clears_screen_once_then_homes() {
        let mut s = session(LineSequence::new(), keys(&[QUIT_KEY]));
        let result = s.run();
        assert!(result.is_ok());
        assert_eq!(exit_status(&result), 0);
        assert_eq!(s.state(), State::Terminating);

        let out = output(&s);
        assert_eq!(out.matches("\x1b[2J").count(), 1);
        assert!(out.ends_with("\x1b[2J\x1b[H"));
    }

    #[test]
    fn quit_stops_reading() {
        let mut steps = keys(&[QUIT_KEY]);
        steps.extend(keys(b"\x1b[B"));
        let mut s = session(numbered(3), steps);
        s.run().unwrap();
        assert_eq!(s.viewport().cy(), 0);
    }

    // ── Timeouts ──────────────────────────────────────────────────────────

    #[test]
    fn timeout_renders_again_without_failing() {
        let mut s = session(
            LineSequence::new(),
            vec![Step::Timeout, Step::Timeout, Step::Byte(QUIT_KEY)],
        );
        assert_eq!(s.step().unwrap(), State::Running);
        assert_eq!(s.step().unwrap(), State::Running);
        assert_eq!(s.step().unwrap(), State::Terminating);

        assert_eq!(output(&s).matches("\x1b[?25l").count(), 3);
    }

    // ── Motion ────────────────────────────────────────────────────────────

    #[test]
    fn arrow_keys_move_the_cursor() {
        let mut steps = keys(b"\x1b[B\x1b[B\x1b[C\x1b[C\x1b[D");
        steps.push(Step::Byte(QUIT_KEY));
        let mut s = session(numbered(5), steps);
        s.run().unwrap();
        assert_eq!((s.viewport().cx(), s.viewport().cy()), (1, 2));
    }

    #[test]
    fn page_down_scrolls_on_next_frame() {
        let mut s = Session::new(
            numbered(50),
            Size { cols: 80, rows: 20 },
            ScriptedSource::new(keys(b"\x1b[6~")),
            Vec::new(),
            FixedSize,
            &Options::default(),
        );
        s.step().unwrap();
        assert_eq!(s.viewport().cy(), 20);
        assert_eq!(s.viewport().row_offset(), 0);

        s.step().unwrap();
        assert_eq!(s.viewport().row_offset(), 1);
        assert!(output(&s).ends_with("\x1b[20;1H\x1b[?25h"));
    }

    #[test]
    fn home_end_keys() {
        let mut steps = keys(b"\x1b[F");
        steps.push(Step::Byte(QUIT_KEY));
        let mut s = session(LineSequence::from_lines(["hello"]), steps);
        s.run().unwrap();
        assert_eq!(s.viewport().cx(), 5);

        s.handle(InputEvent::SpecialKey(tilde_term::input::SpecialKey::Home))
            .unwrap();
        assert_eq!(s.viewport().cx(), 0);
    }

    #[test]
    fn text_and_other_keys_are_ignored() {
        let mut steps = keys(b"abc\r\x1b[3~");
        steps.push(Step::Byte(ESC));
        steps.push(Step::Timeout);
        steps.push(Step::Byte(QUIT_KEY));
        let lines = numbered(2);
        let mut s = session(lines.clone(), steps);
        s.run().unwrap();
        assert_eq!((s.viewport().cx(), s.viewport().cy()), (0, 0));
        assert_eq!(s.lines(), &lines);
    }

    // ── Resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_changes_frame_height() {
        let small = Size { cols: 40, rows: 5 };
        let mut s = Session::new(
            LineSequence::new(),
            SCREEN,
            ScriptedSource::new([Step::Timeout, Step::Byte(QUIT_KEY)]),
            Vec::new(),
            ScriptedResize::new([None, Some(small)]),
            &Options::default(),
        );
        s.step().unwrap();
        let first = output(&s);
        assert_eq!(first.matches("\x1b[K").count(), 24);

        s.step().unwrap();
        assert_eq!(s.viewport().screen_rows(), 5);
        assert_eq!(s.viewport().screen_cols(), 40);
        let second = &output(&s)[first.len()..];
        assert_eq!(second.matches("\x1b[K").count(), 5);
    }

    // ── Errors ────────────────────────────────────────────────────────────

    #[test]
    fn read_error_ends_the_session() {
        let mut s = session(LineSequence::new(), vec![Step::Fail]);
        let result = s.run();
        assert_eq!(exit_status(&result), 1);
        assert!(matches!(
            result,
            Err(Error::Term(tilde_term::Error::TerminalIo { op: "read", .. }))
        ));
        assert!(!output(&s).contains("\x1b[2J"));
    }

    #[test]
    fn write_error_ends_the_session() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut s = Session::new(
            LineSequence::new(),
            SCREEN,
            ScriptedSource::new(keys(&[QUIT_KEY])),
            Closed,
            FixedSize,
            &Options::default(),
        );
        let result = s.run();
        assert!(matches!(
            result,
            Err(Error::Term(tilde_term::Error::TerminalIo { op: "write", .. }))
        ));
    }
}
