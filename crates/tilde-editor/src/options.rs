//! Viewer options.
//!
//! The knobs the binary exposes on its command line, with the defaults the
//! viewer uses when a flag is absent.

use tilde_term::terminal::DEFAULT_READ_TIMEOUT;

/// Runtime options for a viewer session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Key read timeout in tenths of a second (termios `VTIME`).
    ///
    /// This is both the redraw interval when idle and the window in which
    /// the tail of an escape sequence must arrive.
    pub read_timeout: u8,

    /// Text centered on an empty screen.
    pub banner: String,
}

impl Options {
    /// The default banner: program name and version.
    #[must_use]
    pub fn default_banner() -> String {
        format!("tilde editor -- version {}", env!("CARGO_PKG_VERSION"))
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            banner: Self::default_banner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let o = Options::default();
        assert_eq!(o.read_timeout, 1);
        assert!(o.banner.starts_with("tilde editor -- version "));
        assert!(o.banner.ends_with(env!("CARGO_PKG_VERSION")));
    }
}
