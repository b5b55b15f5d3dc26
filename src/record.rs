//! Per-task statistics records produced by the pipeline stages.

use serde::Serialize;

use crate::registry::PeriodClass;

/// One data line of a runtime-stats trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawStatRecord {
    pub task_name: String,
    /// Cumulative execution ticks, already scaled by the trace tick scale.
    pub raw_execution_ticks: u64,
}

impl RawStatRecord {
    pub fn new(task_name: &str, raw_execution_ticks: u64) -> Self {
        Self {
            task_name: task_name.to_string(),
            raw_execution_ticks,
        }
    }
}

/// A raw record joined with its task descriptor and amortized over the
/// sampling window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedStatRecord {
    pub task_name: String,
    /// Mean execution time per period instance for periodic tasks, the raw
    /// tick count otherwise.
    pub mean_execution_time: f64,
    pub period: PeriodClass,
    pub priority: u32,
}

impl NormalizedStatRecord {
    /// Share of the CPU requested by this task. `None` unless periodic.
    pub fn utilization_fraction(&self) -> Option<f64> {
        self.period
            .period_us()
            .map(|period| self.mean_execution_time / period as f64)
    }
}
