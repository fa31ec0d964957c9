// SPDX-License-Identifier: MIT
//
// tilde-term — Terminal engine for tilde.
//
// Raw termios control with guaranteed restoration, a byte-at-a-time key
// decoder for the legacy escape sequences terminals send for cursor and
// editing keys, ANSI output encoding, and an output buffer that reaches
// the terminal in exactly one write per frame.
//
// No TUI framework sits underneath: the terminal is driven directly with
// termios, ioctl and escape sequences, so every byte sent is accounted for.

pub mod ansi;
pub mod error;
pub mod input;
pub mod output;
pub mod resize;
pub mod terminal;

pub use error::{Error, Result};
