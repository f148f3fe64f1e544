use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::opcode_pipeline::opcodes::OpcodeId;

#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: String,
    pub duration: Duration,
}

/// Why an opcode did not touch the raster.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Disabled,
    /// Unknown id, retained only for round-trip.
    Unsupported,
    Invalid(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Disabled => f.write_str("disabled"),
            SkipReason::Unsupported => f.write_str("unsupported"),
            SkipReason::Invalid(reason) => write!(f, "invalid: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedOpcode {
    pub index: usize,
    pub id: OpcodeId,
    pub reason: SkipReason,
}

/// What one execution pass did: per-stage timings and skipped opcodes.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    steps: Vec<StepTiming>,
    step_map: HashMap<String, Duration>,
    skipped: Vec<SkippedOpcode>,
}

impl ExecutionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, name: impl Into<String>, duration: Duration) {
        let name = name.into();
        *self.step_map.entry(name.clone()).or_insert(Duration::ZERO) += duration;
        self.steps.push(StepTiming { name, duration });
    }

    pub fn record_skip(&mut self, index: usize, id: OpcodeId, reason: SkipReason) {
        self.skipped.push(SkippedOpcode { index, id, reason });
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Accumulated time of every step recorded under `name`.
    pub fn get_step(&self, name: &str) -> Option<Duration> {
        self.step_map.get(name).copied()
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    pub fn skipped(&self) -> &[SkippedOpcode] {
        &self.skipped
    }

    /// Runs `f` and records its wall time under `name`.
    pub fn timed<T>(&mut self, name: impl Into<String>, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.add_step(name, start.elapsed());
        out
    }

    pub fn print_summary(&self) {
        print!("{self}");
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// One line per applied step with its share of the pass, then one line per
/// skipped opcode.
impl fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total_duration();
        writeln!(
            f,
            "{} step(s) in {:.3} ms, {} opcode(s) skipped",
            self.steps.len(),
            millis(total),
            self.skipped.len()
        )?;
        for step in &self.steps {
            let share = if total.is_zero() {
                0.0
            } else {
                step.duration.as_secs_f64() / total.as_secs_f64() * 100.0
            };
            writeln!(f, "  {:<20} {:>10.3} ms {:>5.1}%", step.name, millis(step.duration), share)?;
        }
        for skip in &self.skipped {
            writeln!(f, "  #{:<3} {:<16} skipped ({})", skip.index, skip.id.to_string(), skip.reason)?;
        }
        Ok(())
    }
}
