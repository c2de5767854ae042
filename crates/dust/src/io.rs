//! Output abstraction for the `print()` builtin.
//!
//! Mirrors the reference interpreter's `PrintWriter` trait: embedders
//! implement it to capture or redirect output instead of writing to the
//! process's real stdout. [`StdPrint`] is the default used by the CLI/REPL.

use std::fmt;
use std::io::{self, Write as _};

/// Receives the fully-formatted line `print()` produces for one call
/// (arguments already joined by spaces, newline already appended).
pub trait PrintWriter {
    fn write_line(&mut self, line: &str);
}

/// Writes directly to the process's stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn write_line(&mut self, line: &str) {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        let _ = lock.write_all(line.as_bytes());
        let _ = lock.flush();
    }
}

/// Collects every line written, for tests and embedders that want the
/// program's output as a string instead of real stdout.
#[derive(Debug, Default)]
pub struct CollectStringPrint {
    pub buffer: String,
}

impl PrintWriter for CollectStringPrint {
    fn write_line(&mut self, line: &str) {
        self.buffer.push_str(line);
    }
}

impl fmt::Display for CollectStringPrint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.buffer)
    }
}

/// Discards all output. Useful for benchmarks or fuzzing where print output
/// is irrelevant.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn write_line(&mut self, _line: &str) {}
}
