//! Viewport — cursor position and the scroll window around it.
//!
//! The viewport holds the cursor in buffer coordinates (`cx` byte column,
//! `cy` line) and the row/column offsets that map buffer coordinates onto
//! the screen. It does no I/O: the renderer reads it, the dispatcher moves
//! it.
//!
//! # Invariants
//!
//! - `cy <= line_count`. `cy == line_count` is the empty position just
//!   past the last line.
//! - `cx <= line_len(cy)`, where the length past the last line is 0.
//!
//! Motions clamp rather than fail, and vertical motions pull `cx` back onto
//! the new line when it is shorter.
//!
//! # Scrolling
//!
//! Offsets are derived: [`scroll`](Viewport::scroll) recomputes them from
//! the cursor and the screen size before every frame, moving the window
//! the minimum distance needed to contain the cursor.

use tilde_term::input::SpecialKey;
use tilde_term::terminal::Size;

use crate::lines::LineSequence;

/// A cursor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    /// Start of the line.
    Home,
    /// End of the line.
    End,
    /// Up by one screen height.
    PageUp,
    /// Down by one screen height.
    PageDown,
}

impl Motion {
    /// The motion bound to a named key, if any.
    #[must_use]
    pub const fn from_key(key: SpecialKey) -> Option<Self> {
        match key {
            SpecialKey::ArrowLeft => Some(Self::Left),
            SpecialKey::ArrowRight => Some(Self::Right),
            SpecialKey::ArrowUp => Some(Self::Up),
            SpecialKey::ArrowDown => Some(Self::Down),
            SpecialKey::Home => Some(Self::Home),
            SpecialKey::End => Some(Self::End),
            SpecialKey::PageUp => Some(Self::PageUp),
            SpecialKey::PageDown => Some(Self::PageDown),
            SpecialKey::Delete => None,
        }
    }
}

/// Cursor and scroll state for one screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    cx: usize,
    cy: usize,
    row_offset: usize,
    col_offset: usize,
    screen_rows: usize,
    screen_cols: usize,
}

impl Viewport {
    /// A viewport at the top-left of the text, sized to `size`.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            cx: 0,
            cy: 0,
            row_offset: 0,
            col_offset: 0,
            screen_rows: usize::from(size.rows),
            screen_cols: usize::from(size.cols),
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// Cursor byte column in the current line.
    #[inline]
    #[must_use]
    pub const fn cx(&self) -> usize {
        self.cx
    }

    /// Cursor line.
    #[inline]
    #[must_use]
    pub const fn cy(&self) -> usize {
        self.cy
    }

    /// First visible line.
    #[inline]
    #[must_use]
    pub const fn row_offset(&self) -> usize {
        self.row_offset
    }

    /// First visible byte column.
    #[inline]
    #[must_use]
    pub const fn col_offset(&self) -> usize {
        self.col_offset
    }

    /// Screen height in rows.
    #[inline]
    #[must_use]
    pub const fn screen_rows(&self) -> usize {
        self.screen_rows
    }

    /// Screen width in columns.
    #[inline]
    #[must_use]
    pub const fn screen_cols(&self) -> usize {
        self.screen_cols
    }

    /// Cursor position relative to the top-left of the screen, `(x, y)`.
    ///
    /// Only meaningful after [`scroll`](Self::scroll).
    #[must_use]
    pub const fn screen_cursor(&self) -> (usize, usize) {
        (
            self.cx.saturating_sub(self.col_offset),
            self.cy.saturating_sub(self.row_offset),
        )
    }

    /// Adopt a new screen size. Offsets catch up on the next `scroll`.
    pub fn resize(&mut self, size: Size) {
        self.screen_rows = usize::from(size.rows);
        self.screen_cols = usize::from(size.cols);
    }

    // -- Motion -------------------------------------------------------------

    /// Move the cursor, clamping to the text.
    pub fn move_cursor(&mut self, motion: Motion, lines: &LineSequence) {
        match motion {
            Motion::Left => self.cx = self.cx.saturating_sub(1),
            Motion::Right => {
                if self.cy < lines.line_count() && self.cx < lines.line_len(self.cy) {
                    self.cx += 1;
                }
            }
            Motion::Up => self.cy = self.cy.saturating_sub(1),
            Motion::Down => {
                if self.cy < lines.line_count() {
                    self.cy += 1;
                }
            }
            Motion::Home => self.cx = 0,
            Motion::End => self.cx = lines.line_len(self.cy),
            Motion::PageUp => self.cy = self.cy.saturating_sub(self.screen_rows),
            Motion::PageDown => {
                self.cy = (self.cy + self.screen_rows).min(lines.line_count());
            }
        }

        if matches!(
            motion,
            Motion::Up | Motion::Down | Motion::PageUp | Motion::PageDown
        ) {
            self.cx = self.cx.min(lines.line_len(self.cy));
        }
    }

    // -- Scrolling ----------------------------------------------------------

    /// Recompute the offsets so the cursor is on screen.
    ///
    /// Idempotent: a second call with nothing changed moves nothing.
    pub const fn scroll(&mut self) {
        if self.screen_rows > 0 {
            if self.cy < self.row_offset {
                self.row_offset = self.cy;
            }
            if self.cy >= self.row_offset + self.screen_rows {
                self.row_offset = self.cy + 1 - self.screen_rows;
            }
        }

        if self.screen_cols > 0 {
            if self.cx < self.col_offset {
                self.col_offset = self.cx;
            }
            if self.cx >= self.col_offset + self.screen_cols {
                self.col_offset = self.cx + 1 - self.screen_cols;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
