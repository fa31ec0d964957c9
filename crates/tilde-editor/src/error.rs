//! Viewer errors.
//!
//! Terminal failures come up from `tilde-term` unchanged; the only error
//! this crate adds is the line source failing to load.

use std::io;
use std::path::PathBuf;

/// Everything that can end a viewer session early.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Raw mode, window size, or terminal I/O failed.
    #[error(transparent)]
    Term(#[from] tilde_term::Error),

    /// The file could not be opened or read.
    #[error("{}: {source}", path.display())]
    SourceLoad {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result alias for viewer operations.
pub type Result<T> = std::result::Result<T, Error>;
