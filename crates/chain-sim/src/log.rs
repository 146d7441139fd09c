//! The deterministic per-run event log.
//!
//! This is a separate artifact from `tracing` diagnostics: the
//! determinism contract requires byte-identical log files across two runs
//! of the same seed and config, which rules out wall-clock timestamps or
//! any other non-reproducible formatting a generic subscriber might add.
//! Every line here is built from the simulator's own virtual clock.

use std::io::{self, Write};

/// One line of the network log: `<time:%.3f> <EVENT> <sender>-><receiver> [extra]`.
#[derive(Debug)]
pub struct EventLog {
    lines: Vec<String>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// An empty log.
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Appends a line with no extra detail.
    pub fn record(&mut self, time: f64, event: &str, sender: &str, receiver: &str) {
        self.record_extra(time, event, sender, receiver, None);
    }

    /// Appends a line with an optional trailing detail (e.g. `height=3`).
    pub fn record_extra(&mut self, time: f64, event: &str, sender: &str, receiver: &str, extra: Option<&str>) {
        let line = match extra {
            Some(extra) => format!("{time:.3} {event} {sender}->{receiver} {extra}"),
            None => format!("{time:.3} {event} {sender}->{receiver}"),
        };
        tracing::trace!(%line, "network event");
        self.lines.push(line);
    }

    /// All lines recorded so far, in emission order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Writes every line, newline-terminated, to `w`.
    pub fn write_to(&self, mut w: impl Write) -> io::Result<()> {
        for line in &self.lines {
            writeln!(w, "{line}")?;
        }
        Ok(())
    }

    /// The full log as one string, for hashing or comparison.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}
