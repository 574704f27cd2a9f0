//! Trace output abstraction.
//!
//! The interpreter reports frame activity (ENTER/LEAVE lines and call
//! stack dumps) through a sink so the CLI can print to stdout while tests
//! capture into a buffer. Trace lines are an observable output of the
//! interpreter, not logging; they never affect program semantics.

/// Receiver for interpreter trace lines.
pub trait TraceSink {
    /// Emit one trace entry. An entry may span multiple lines (the call
    /// stack dump is emitted as a single entry).
    fn trace(&mut self, line: &str);
}

/// Prints trace entries to stdout. The CLI default.
pub struct StdoutTrace;

impl TraceSink for StdoutTrace {
    fn trace(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Discards all trace entries.
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn trace(&mut self, _line: &str) {}
}

/// Collects trace entries; used by tests.
impl TraceSink for Vec<String> {
    fn trace(&mut self, line: &str) {
        self.push(line.to_string());
    }
}
