// SPDX-License-Identifier: MIT
//
// Terminal engine errors.
//
// Every variant wraps the `io::Error` that caused it and names the
// operation that failed, so the top-level diagnostic can say which step
// broke. None of these are recovered locally: a terminal channel that
// failed once is not retried.

use std::io;

/// Errors raised while driving the controlling terminal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `tcgetattr` failed while capturing the original terminal state.
    #[error("tcgetattr: {0}")]
    TerminalQuery(#[source] io::Error),

    /// `tcsetattr` failed while entering or leaving raw mode.
    #[error("tcsetattr: {0}")]
    TerminalConfigure(#[source] io::Error),

    /// A read or write on the terminal failed during the run loop.
    #[error("{op}: {source}")]
    TerminalIo {
        /// The operation that failed (`read`, `write`, ...).
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Neither `TIOCGWINSZ` nor the cursor-position fallback produced a size.
    #[error("getWindowSize: {0}")]
    WindowSize(#[source] io::Error),
}

impl Error {
    /// Wrap a failed terminal read.
    #[must_use]
    pub const fn read(source: io::Error) -> Self {
        Self::TerminalIo { op: "read", source }
    }

    /// Wrap a failed (or short) terminal write.
    #[must_use]
    pub const fn write(source: io::Error) -> Self {
        Self::TerminalIo {
            op: "write",
            source,
        }
    }
}

/// Result alias for terminal operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_operation() {
        let e = Error::read(io::Error::other("boom"));
        assert_eq!(e.to_string(), "read: boom");

        let e = Error::TerminalQuery(io::Error::other("not a tty"));
        assert_eq!(e.to_string(), "tcgetattr: not a tty");

        let e = Error::WindowSize(io::Error::other("no reply"));
        assert!(e.to_string().starts_with("getWindowSize"));
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error as _;

        let e = Error::write(io::Error::new(io::ErrorKind::WriteZero, "short"));
        let src = e.source().unwrap();
        assert_eq!(src.to_string(), "short");
    }
}
