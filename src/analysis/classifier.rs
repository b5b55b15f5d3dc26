//! Periodic task set utilization.

use crate::record::NormalizedStatRecord;

/// Utilization of the periodic tasks of one capture.
#[derive(Debug, Clone, PartialEq)]
pub struct UtilizationReport {
    /// Periodic tasks only, in order of first appearance in the trace.
    pub per_task: Vec<NormalizedStatRecord>,
    pub aggregate_utilization_percent: f64,
}

impl UtilizationReport {
    pub fn is_schedulable(&self) -> bool {
        self.aggregate_utilization_percent <= 100.0
    }
}

/// Keeps the periodic records and sums their utilization fractions.
///
/// Fractions are added in ascending order, which makes the aggregate
/// independent of the order of `records`.
pub fn classify(records: Vec<NormalizedStatRecord>) -> UtilizationReport {
    let per_task: Vec<NormalizedStatRecord> = records
        .into_iter()
        .filter(|r| r.period.is_periodic())
        .collect();

    let mut fractions: Vec<f64> = per_task
        .iter()
        .filter_map(NormalizedStatRecord::utilization_fraction)
        .collect();
    fractions.sort_by(f64::total_cmp);

    let aggregate_utilization_percent = 100.0 * fractions.iter().sum::<f64>();

    UtilizationReport {
        per_task,
        aggregate_utilization_percent,
    }
}
