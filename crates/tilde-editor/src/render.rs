//! Frame renderer — viewport plus text in, one terminal write out.
//!
//! Every frame is a full redraw from the top-left corner; nothing is
//! diffed against the previous frame. The frame is composed into an
//! [`OutputBuffer`] and handed to the terminal with a single `write`, with
//! the cursor hidden while rows are painted so it never flickers across
//! the screen.
//!
//! Layout of one frame:
//!
//! ```text
//! ESC[?25l ESC[H                     hide cursor, home
//! row 0 ESC[K \r\n                   text, tilde, or banner
//! ...
//! row N-1 ESC[K                      no line break after the last row
//! ESC[{y};{x}H ESC[?25h              place and show the cursor
//! ```
//!
//! The last row has no trailing `\r\n`: a newline on the bottom row would
//! scroll the whole terminal up by one.

use std::io::{self, Write};

use tilde_term::ansi;
use tilde_term::output::OutputBuffer;

use crate::lines::LineSequence;
use crate::viewport::Viewport;

/// Composes and flushes frames.
pub struct FrameRenderer {
    buf: OutputBuffer,
    banner: String,
}

impl FrameRenderer {
    /// A renderer that shows `banner` on an empty screen.
    #[must_use]
    pub fn new(banner: impl Into<String>) -> Self {
        Self {
            buf: OutputBuffer::new(),
            banner: banner.into(),
        }
    }

    /// Compose one frame and write it to `out` in a single call.
    ///
    /// The viewport's offsets are used as they are; call
    /// [`Viewport::scroll`] first.
    ///
    /// # Errors
    ///
    /// [`tilde_term::Error::TerminalIo`] if the write fails or is short.
    /// The frame is not retried.
    pub fn render(
        &mut self,
        lines: &LineSequence,
        viewport: &Viewport,
        out: &mut impl Write,
    ) -> tilde_term::Result<()> {
        self.compose(lines, viewport).map_err(tilde_term::Error::write)?;
        self.buf.flush_once(out)
    }

    /// Compose one frame into the internal buffer and return its bytes.
    ///
    /// # Errors
    ///
    /// Only if formatting into the buffer fails, which a `Vec` never does.
    pub fn compose(&mut self, lines: &LineSequence, viewport: &Viewport) -> io::Result<&[u8]> {
        self.buf.clear();

        ansi::cursor_hide(&mut self.buf)?;
        ansi::cursor_home(&mut self.buf)?;
        self.draw_rows(lines, viewport)?;

        let (x, y) = viewport.screen_cursor();
        ansi::cursor_to(&mut self.buf, x, y)?;
        ansi::cursor_show(&mut self.buf)?;

        Ok(self.buf.as_bytes())
    }

    fn draw_rows(&mut self, lines: &LineSequence, viewport: &Viewport) -> io::Result<()> {
        let rows = viewport.screen_rows();
        let cols = viewport.screen_cols();

        for y in 0..rows {
            let file_row = y + viewport.row_offset();

            match lines.line(file_row) {
                Some(line) => {
                    let start = viewport.col_offset().min(line.len());
                    let end = (start + cols).min(line.len());
                    self.buf.push_bytes(&line[start..end]);
                }
                None if lines.is_empty() && y == rows / 3 => self.draw_banner(cols),
                None => self.buf.push_bytes(b"~"),
            }

            ansi::clear_line(&mut self.buf)?;
            if y + 1 < rows {
                self.buf.push_bytes(b"\r\n");
            }
        }
        Ok(())
    }

    /// Center the banner, truncated to the screen width. The first cell of
    /// the left padding keeps its `~` so the column of tildes is unbroken.
    fn draw_banner(&mut self, cols: usize) {
        let banner = self.banner.as_bytes();
        let text = &banner[..banner.len().min(cols)];

        let mut padding = (cols - text.len()) / 2;
        if padding > 0 {
            self.buf.push_bytes(b"~");
            padding -= 1;
        }
        self.buf.push_repeat(b' ', padding);
        self.buf.push_bytes(text);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
