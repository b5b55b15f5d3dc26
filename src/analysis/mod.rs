//! Utilization analysis of a runtime-stats trace.
//!
//! The analysis has three consecutive steps:
//! 1. the trace is parsed into raw per-task records (`trace::parser`),
//! 2. each record is joined with its task descriptor and amortized over the
//!    sampling window (`normalizer`),
//! 3. the periodic records are kept and their utilization summed
//!    (`classifier`).
//!
//! Each step owns its output and hands it to the next one. Any failure aborts
//! the analysis; there is no partial report.

use std::time::Duration;

use tracing::info;

use crate::{
    error::Result,
    record::RawStatRecord,
    registry::TaskRegistry,
    trace::{StatParser, TraceFormat},
};

pub mod classifier;
pub mod normalizer;

pub use classifier::{classify, UtilizationReport};
pub use normalizer::{normalize, normalize_all};

/// Capture window: `interval_count` reads, one every `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingWindow {
    pub interval_count: u32,
    pub interval: Duration,
}

impl SamplingWindow {
    pub fn new(interval_count: u32, interval: Duration) -> Self {
        Self {
            interval_count,
            interval,
        }
    }

    /// Wall-clock time covered by the whole window, saturating at `u64::MAX`.
    pub fn total_elapsed_us(&self) -> u64 {
        let total = self.interval.as_micros() * self.interval_count as u128;
        u64::try_from(total).unwrap_or(u64::MAX)
    }
}

impl Default for SamplingWindow {
    fn default() -> Self {
        Self::new(4, Duration::from_secs(6))
    }
}

/// Output of a complete analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// All rows of the trace, periodic or not.
    pub raw: Vec<RawStatRecord>,
    pub report: UtilizationReport,
    pub elapsed_us: u64,
}

/// Runs the whole pipeline on one captured trace.
pub fn analyse(
    text: &str,
    format: &TraceFormat,
    registry: &TaskRegistry,
    window: &SamplingWindow,
) -> Result<Analysis> {
    let raw = StatParser::new(format).parse(text)?;
    let normalized = normalize_all(&raw, registry, window)?;
    let report = classify(normalized);

    info!(
        "{} task(s) in trace, {} periodic, CPU utilization {:.3}%",
        raw.len(),
        report.per_task.len(),
        report.aggregate_utilization_percent
    );

    Ok(Analysis {
        raw,
        report,
        elapsed_us: window.total_elapsed_us(),
    })
}
