//! # tilde-editor — Viewer core for tilde
//!
//! The pieces between the terminal engine and the binary:
//!
//! - **[`lines`]** — `LineSequence`, the read-only text, loaded line by line
//! - **[`viewport`]** — cursor motion and the scroll window around the cursor
//! - **[`render`]** — full-screen frame composition, flushed in one write
//! - **[`dispatch`]** — the session loop: render, decode a key, act on it
//! - **[`options`]** — read timeout and banner text

pub mod dispatch;
pub mod error;
pub mod lines;
pub mod options;
pub mod render;
pub mod viewport;

pub use error::{Error, Result};
