// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Terminal resize detection.
//
// A SIGWINCH handler sets an `AtomicBool`; the run loop polls it once per
// cycle through `ResizeSource`. The bounded read in the key decoder is what
// guarantees the poll happens within one timeout of the resize, even with
// no keyboard input. The handler is installed with `SA_RESTART` so a frame
// write interrupted by the signal is resumed instead of failing.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::terminal::{self, Size};

/// Global flag set by the SIGWINCH handler.
static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
fn install_sigwinch_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {}

/// Something the run loop can ask "did the screen change size?".
pub trait ResizeSource {
    /// The new size, if the terminal was resized since the last poll.
    fn poll_resize(&mut self) -> Option<Size>;
}

/// Resize source backed by SIGWINCH and `TIOCGWINSZ`.
#[derive(Debug)]
pub struct SigwinchWatcher {
    _private: (),
}

impl SigwinchWatcher {
    /// Install the SIGWINCH handler and start watching.
    #[must_use]
    pub fn install() -> Self {
        install_sigwinch_handler();
        SIGWINCH_RECEIVED.store(false, Ordering::Relaxed);
        Self { _private: () }
    }
}

impl ResizeSource for SigwinchWatcher {
    fn poll_resize(&mut self) -> Option<Size> {
        if !SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed) {
            return None;
        }
        // A resize we can't measure keeps the old size; the next signal
        // gets another chance.
        let size = terminal::get_size();
        if let Some(s) = size {
            tracing::debug!(cols = s.cols, rows = s.rows, "terminal resized");
        }
        size
    }
}

/// Resize source that never reports a change.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedSize;

impl ResizeSource for FixedSize {
    fn poll_resize(&mut self) -> Option<Size> {
        None
    }
}

/// Resize source that replays queued sizes, one per poll.
#[derive(Debug, Default, Clone)]
pub struct ScriptedResize {
    sizes: std::collections::VecDeque<Option<Size>>,
}

impl ScriptedResize {
    /// Report each entry of `sizes` on successive polls, then nothing.
    #[must_use]
    pub fn new(sizes: impl IntoIterator<Item = Option<Size>>) -> Self {
        Self {
            sizes: sizes.into_iter().collect(),
        }
    }
}

impl ResizeSource for ScriptedResize {
    fn poll_resize(&mut self) -> Option<Size> {
        self.sizes.pop_front().flatten()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
