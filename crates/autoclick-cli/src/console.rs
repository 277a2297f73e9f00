//! Human-readable status lines and the `--json` summary.
//!
//! In JSON mode stdout carries nothing but the summary document, so status
//! lines move to stderr alongside the logs.

use std::io::{self, Write};

use autoclick_core::BackendError;
use tracing::error;

use crate::clicker::{Outcome, RunReport, StopReason};

pub struct Console<O, E> {
    stdout: O,
    stderr: E,
    json: bool,
}

impl Console<io::Stdout, io::Stderr> {
    pub fn stdio(json: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), json)
    }
}

impl<O: Write, E: Write> Console<O, E> {
    pub fn new(stdout: O, stderr: E, json: bool) -> Self {
        Self {
            stdout,
            stderr,
            json,
        }
    }

    fn status(&mut self) -> &mut dyn Write {
        if self.json {
            &mut self.stderr
        } else {
            &mut self.stdout
        }
    }

    pub fn banner(&mut self, interval_ms: u64, tolerance: u32, program: &str) -> io::Result<()> {
        writeln!(
            self.status(),
            "autoclick: clicking every {}ms, stopping on movement over {} (backend: {}). Press Ctrl+C to stop.",
            interval_ms, tolerance, program
        )
    }

    pub fn position(&mut self, x: i32, y: i32) -> io::Result<()> {
        writeln!(self.stdout, "{},{}", x, y)
    }

    /// Stop banner for clean stops, error plus hint for failures.
    pub fn outcome(&mut self, report: &RunReport) -> io::Result<()> {
        let clicks = report.clicks();
        match &report.outcome {
            Outcome::Stopped(StopReason::Interrupted) => {
                writeln!(self.status(), "Stopped by interrupt after {} clicks", clicks)
            }
            Outcome::Stopped(reason) => {
                writeln!(self.status(), "Stopped: {} after {} clicks", reason, clicks)
            }
            Outcome::Failed { phase, error } => {
                self.backend_error(&format!("{} (after {} clicks)", phase, clicks), error)
            }
        }
    }

    pub fn backend_error(&mut self, context: &str, err: &BackendError) -> io::Result<()> {
        error!("Backend failure while {}: {}", context, err);
        writeln!(self.stderr, "hint: {}", err.suggestion())
    }

    /// Write the JSON summary when JSON mode is on.
    pub fn summary(&mut self, report: &RunReport) -> anyhow::Result<()> {
        if self.json {
            serde_json::to_writer_pretty(&mut self.stdout, &report.summary())?;
            writeln!(self.stdout)?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (O, E) {
        (self.stdout, self.stderr)
    }
}
