//! Simulation statistics and their export formats.
//!
//! Every simulator keeps a [`SimulationStats`] that it updates as inputs are
//! applied. The stats serialize to JSON, flatten to a two-column CSV, and
//! render as a plain-text summary.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Aggregate statistics for one simulator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    /// What was simulated and how
    pub metadata: SimulationMetadata,

    /// Size of the flattened circuit
    pub structure: StructureStats,

    /// Work done across all `input` calls
    pub activity: ActivityStats,

    /// Wall-clock measurements
    pub timing: TimingStats,
}

/// Metadata about the simulated circuit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetadata {
    /// Type name of the top-level module
    pub top: String,

    /// Simulation approach (`levelization` or `event-driven`)
    pub approach: String,

    /// Crate version that produced the stats
    pub version: String,
}

/// Size of the flattened circuit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureStats {
    /// Primitive modules, including the power module
    pub primitive_modules: usize,

    /// Nets in the hierarchical circuit
    pub nets: usize,

    /// Evaluation levels (levelized simulator only)
    pub levels: Option<usize>,
}

/// Counters updated by `input`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityStats {
    /// Number of `input` calls that completed
    pub inputs_applied: u64,

    /// Primitive behavior evaluations
    pub evaluations: u64,

    /// Net value changes applied from the event queue
    pub events_processed: u64,

    /// Events raised by changed outputs
    pub events_generated: u64,

    /// Event/gate drain rounds
    pub convergence_rounds: u64,

    /// Largest event queue seen at the start of a round
    pub peak_event_queue: usize,

    /// Largest gate queue seen at the start of a gate drain
    pub peak_gate_queue: usize,

    /// `input` calls aborted by the convergence bound
    pub non_convergence: u64,
}

/// Timing statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingStats {
    /// Total wall-clock time spent in `input`, in milliseconds
    pub total_wall_time_ms: f64,

    /// Completed `input` calls per wall-clock second
    pub inputs_per_second: f64,

    /// Behavior evaluations per wall-clock second
    pub evaluations_per_second: f64,
}

impl SimulationStats {
    /// Creates a new empty statistics container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates stats for a simulator of `top` using `approach`.
    pub fn for_circuit(top: impl Into<String>, approach: impl Into<String>) -> Self {
        let mut stats = Self::default();
        stats.metadata.top = top.into();
        stats.metadata.approach = approach.into();
        stats.metadata.version = env!("CARGO_PKG_VERSION").to_string();
        stats
    }

    /// Adds wall-clock time and recomputes the rates.
    pub fn add_wall_time(&mut self, wall_time_ms: f64) {
        self.timing.total_wall_time_ms += wall_time_ms;

        let total = self.timing.total_wall_time_ms;
        if total > 0.0 {
            let seconds = total / 1000.0;
            self.timing.inputs_per_second = self.activity.inputs_applied as f64 / seconds;
            self.timing.evaluations_per_second = self.activity.evaluations as f64 / seconds;
        }
    }

    /// Exports statistics to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Exports statistics to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Exports summary statistics to CSV.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str("metric,value\n");

        let a = &self.activity;
        let _ = writeln!(csv, "primitive_modules,{}", self.structure.primitive_modules);
        let _ = writeln!(csv, "nets,{}", self.structure.nets);
        if let Some(levels) = self.structure.levels {
            let _ = writeln!(csv, "levels,{levels}");
        }
        let _ = writeln!(csv, "inputs_applied,{}", a.inputs_applied);
        let _ = writeln!(csv, "evaluations,{}", a.evaluations);
        let _ = writeln!(csv, "events_processed,{}", a.events_processed);
        let _ = writeln!(csv, "events_generated,{}", a.events_generated);
        let _ = writeln!(csv, "convergence_rounds,{}", a.convergence_rounds);
        let _ = writeln!(csv, "peak_event_queue,{}", a.peak_event_queue);
        let _ = writeln!(csv, "peak_gate_queue,{}", a.peak_gate_queue);
        let _ = writeln!(csv, "non_convergence,{}", a.non_convergence);
        let _ = writeln!(csv, "wall_time_ms,{:.2}", self.timing.total_wall_time_ms);
        let _ = writeln!(csv, "evaluations_per_second,{:.2}", self.timing.evaluations_per_second);

        csv
    }

    /// Exports summary statistics to a CSV file.
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }

    /// Writes a human-readable summary.
    pub fn write_summary<W: std::fmt::Write>(&self, w: &mut W) -> std::fmt::Result {
        writeln!(w, "=== Simulation Statistics ===")?;
        writeln!(w)?;
        writeln!(w, "Top: {}", self.metadata.top)?;
        writeln!(w, "Approach: {}", self.metadata.approach)?;
        writeln!(w)?;

        writeln!(w, "--- Structure ---")?;
        writeln!(w, "Primitive modules: {}", self.structure.primitive_modules)?;
        writeln!(w, "Nets: {}", self.structure.nets)?;
        if let Some(levels) = self.structure.levels {
            writeln!(w, "Levels: {levels}")?;
        }
        writeln!(w)?;

        let a = &self.activity;
        writeln!(w, "--- Activity ---")?;
        writeln!(w, "Inputs applied: {}", a.inputs_applied)?;
        writeln!(w, "Evaluations: {}", a.evaluations)?;
        if a.events_processed > 0 || a.convergence_rounds > 0 {
            writeln!(w, "Events processed: {}", a.events_processed)?;
            writeln!(w, "Events generated: {}", a.events_generated)?;
            writeln!(w, "Convergence rounds: {}", a.convergence_rounds)?;
            writeln!(w, "Peak queues: {} events, {} gates", a.peak_event_queue, a.peak_gate_queue)?;
        }
        if a.non_convergence > 0 {
            writeln!(w, "Did not settle: {}", a.non_convergence)?;
        }
        writeln!(w)?;

        writeln!(w, "--- Timing ---")?;
        writeln!(w, "Wall time: {:.2} ms", self.timing.total_wall_time_ms)?;
        writeln!(w, "Evaluations/sec: {:.2}", self.timing.evaluations_per_second)?;

        Ok(())
    }

    /// Returns the summary as a string.
    pub fn summary(&self) -> String {
        let mut buf = String::new();
        let _ = self.write_summary(&mut buf);
        buf
    }
}

/// A simple timer for measuring wall-clock time.
#[derive(Debug)]
pub struct Timer {
    start: std::time::Instant,
}

impl Timer {
    /// Starts a new timer.
    pub fn start() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    /// Returns elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns elapsed time in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}
