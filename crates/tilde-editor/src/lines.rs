//! Line sequence — the read-only text being viewed.
//!
//! A `LineSequence` is an ordered list of byte lines with their terminators
//! stripped. It is loaded once, sequentially, and never mutated: the viewer
//! moves a cursor over it but does not edit.
//!
//! # Design choices
//!
//! - **Bytes, not `String`.** Files are shown as they are on disk; invalid
//!   UTF-8 is not an error. Columns are byte offsets, one per screen cell.
//!
//! - **Terminators are stripped greedily.** Any run of trailing `\r`/`\n`
//!   is removed, so CRLF files look the same as LF files.
//!
//! - **A trailing newline does not add a line.** `"a\nb\n"` is two lines,
//!   and the empty file is zero lines (which is what shows the banner).

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};

/// An ordered, immutable sequence of byte lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSequence {
    lines: Vec<Vec<u8>>,
}

impl LineSequence {
    /// An empty sequence.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build from already-split lines. Terminators are not stripped.
    #[must_use]
    pub fn from_lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Split raw file contents into lines.
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Self {
        // `read_lines` on a byte slice cannot fail.
        Self::read_lines(data).unwrap_or_default()
    }

    /// Read a file line by line.
    ///
    /// # Errors
    ///
    /// [`Error::SourceLoad`] if the file cannot be opened or read.
    pub fn load(path: &Path) -> Result<Self> {
        let source = |source| Error::SourceLoad {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(source)?;
        let lines = Self::read_lines(BufReader::new(file)).map_err(source)?;
        tracing::info!(path = %path.display(), lines = lines.line_count(), "file loaded");
        Ok(lines)
    }

    fn read_lines(mut reader: impl BufRead) -> io::Result<Self> {
        let mut lines = Vec::new();
        let mut line = Vec::new();
        while reader.read_until(b'\n', &mut line)? > 0 {
            while matches!(line.last(), Some(b'\n' | b'\r')) {
                line.pop();
            }
            lines.push(std::mem::take(&mut line));
        }
        Ok(Self { lines })
    }

    // -- Access -------------------------------------------------------------

    /// Number of lines.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Whether there are no lines at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The bytes of line `idx`, or `None` past the end.
    #[inline]
    #[must_use]
    pub fn line(&self, idx: usize) -> Option<&[u8]> {
        self.lines.get(idx).map(Vec::as_slice)
    }

    /// Length of line `idx` in bytes; 0 past the end.
    #[inline]
    #[must_use]
    pub fn line_len(&self, idx: usize) -> usize {
        self.lines.get(idx).map_or(0, Vec::len)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
