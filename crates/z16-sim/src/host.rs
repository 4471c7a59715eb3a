//! Stdout-backed trace sink and console for the command-line runner.

use std::io::{self, Write};

use z16_core::{Console, TraceEvent, TraceSink};

/// Prints one `0x%04X: <disassembly>` line per fetched instruction.
///
/// Memory writes and skip/fault events are left to the log.
#[derive(Debug)]
pub struct TraceWriter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> TraceWriter<W> {
    pub const fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Returns the writer and the first write error, if any occurred.
    pub fn finish(self) -> (W, Option<io::Error>) {
        (self.out, self.error)
    }
}

impl<W: Write> TraceSink for TraceWriter<W> {
    fn on_event(&mut self, event: TraceEvent) {
        if self.error.is_some() {
            return;
        }
        if let TraceEvent::InstructionStart { pc, text, .. } = event {
            if let Err(error) = writeln!(self.out, "0x{pc:04X}: {text}") {
                self.error = Some(error);
            }
        }
    }
}

/// Writes service output followed by a newline.
#[derive(Debug)]
pub struct ConsoleWriter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleWriter<W> {
    pub const fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Returns the writer and the first write error, if any occurred.
    pub fn finish(self) -> (W, Option<io::Error>) {
        (self.out, self.error)
    }
}

impl<W: Write> Console for ConsoleWriter<W> {
    fn write(&mut self, bytes: &[u8]) {
        if self.error.is_some() {
            return;
        }
        let written = self
            .out
            .write_all(bytes)
            .and_then(|()| self.out.write_all(b"\n"))
            .and_then(|()| self.out.flush());
        if let Err(error) = written {
            self.error = Some(error);
        }
    }
}
