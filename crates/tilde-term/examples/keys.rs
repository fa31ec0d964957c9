// SPDX-License-Identifier: MIT
//
// tilde-term keys — print every decoded input event, one per line.
//
// Wires raw mode, the key decoder and the single-write output buffer
// without the viewer on top. Useful for checking what a terminal emulator
// actually sends for Home/End and friends. Ctrl-Q to quit.
//
// Usage:
//   cargo run -p tilde-term --example keys

use std::io::Write;
use std::process::ExitCode;

use tilde_term::input::{InputEvent, KeyDecoder, TtyInput, ctrl};
use tilde_term::output::{OutputBuffer, TtyOutput};
use tilde_term::terminal::{DEFAULT_READ_TIMEOUT, RawMode};

fn run() -> tilde_term::Result<()> {
    let _raw = RawMode::enter(DEFAULT_READ_TIMEOUT)?;
    let mut decoder = KeyDecoder::new(TtyInput::new());
    let mut out = TtyOutput::new();
    let mut buf = OutputBuffer::new();

    loop {
        let event = decoder.decode()?;
        // OPOST is off: "\r\n", not "\n".
        let _ = write!(buf, "{event:?}\r\n");
        buf.flush_once(&mut out)?;

        if event == InputEvent::ControlChar(ctrl(b'q')) {
            return Ok(());
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("keys: {e}");
            ExitCode::FAILURE
        }
    }
}
