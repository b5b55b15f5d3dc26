//! Amortization of cumulative ticks over the sampling window.

use tracing::debug;

use crate::{
    analysis::SamplingWindow,
    error::{Result, StatError},
    record::{NormalizedStatRecord, RawStatRecord},
    registry::{PeriodClass, TaskDescriptor, TaskRegistry},
};

/// Computes the mean execution time of `record` per period instance.
///
/// Periodic tasks get `ticks / (elapsed / period)`; the instance count may be
/// fractional but must cover at least one full period. Non-stop and
/// aperiodic tasks keep their raw tick count.
pub fn normalize(
    record: &RawStatRecord,
    descriptor: &TaskDescriptor,
    total_elapsed_us: u64,
) -> Result<NormalizedStatRecord> {
    let mean_execution_time = match descriptor.period {
        PeriodClass::Periodic { period_us } => {
            if total_elapsed_us < period_us {
                return Err(StatError::DegenerateWindow {
                    task: record.task_name.clone(),
                    period: period_us,
                    elapsed: total_elapsed_us,
                });
            }

            let period_instance_count = total_elapsed_us as f64 / period_us as f64;

            debug!(
                "{}: {} period instance(s) in window",
                record.task_name, period_instance_count
            );

            record.raw_execution_ticks as f64 / period_instance_count
        }
        PeriodClass::NonStop | PeriodClass::Aperiodic => record.raw_execution_ticks as f64,
    };

    Ok(NormalizedStatRecord {
        task_name: record.task_name.clone(),
        mean_execution_time,
        period: descriptor.period,
        priority: descriptor.priority,
    })
}

/// Normalizes every record against `registry`, in trace order.
///
/// Fails on the first task missing from the registry.
pub fn normalize_all(
    records: &[RawStatRecord],
    registry: &TaskRegistry,
    window: &SamplingWindow,
) -> Result<Vec<NormalizedStatRecord>> {
    let elapsed = window.total_elapsed_us();

    records
        .iter()
        .map(|record| {
            let descriptor = registry.lookup(&record.task_name)?;
            normalize(record, descriptor, elapsed)
        })
        .collect()
}
