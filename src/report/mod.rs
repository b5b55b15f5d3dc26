//! Analysis report rendering.
//!
//! Reports are either two text tables (raw runtime stats and the scheduling
//! result) followed by the CPU utilization, or a single JSON document.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::{
    analysis::Analysis,
    record::{NormalizedStatRecord, RawStatRecord},
    registry::TaskRegistry,
};

mod table;

pub use table::{Align, Table};

/// Report output format
#[derive(Debug, Clone, Copy, clap::ValueEnum, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

#[derive(Serialize)]
struct ScheduledTask<'a> {
    #[serde(flatten)]
    record: &'a NormalizedStatRecord,
    utilization_fraction: f64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    elapsed_us: u64,
    runtime_stats: &'a [RawStatRecord],
    schedulability: Vec<ScheduledTask<'a>>,
    cpu_utilization_percent: f64,
    schedulable: bool,
}

impl<'a> From<&'a Analysis> for JsonReport<'a> {
    fn from(analysis: &'a Analysis) -> Self {
        let schedulability = analysis
            .report
            .per_task
            .iter()
            .filter_map(|record| {
                record.utilization_fraction().map(|f| ScheduledTask {
                    record,
                    utilization_fraction: f,
                })
            })
            .collect();

        Self {
            elapsed_us: analysis.elapsed_us,
            runtime_stats: &analysis.raw,
            schedulability,
            cpu_utilization_percent: analysis.report.aggregate_utilization_percent,
            schedulable: analysis.report.is_schedulable(),
        }
    }
}

pub fn write_report<W: Write>(w: &mut W, analysis: &Analysis, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Table => write_tables(w, analysis),
        ReportFormat::Json => write_json(w, analysis),
    }
}

fn runtime_stats_table(raw: &[RawStatRecord]) -> Table {
    let mut table = Table::new(&[("Name", Align::Left), ("Exec Time", Align::Right)]);

    for r in raw {
        table.push_row(vec![r.task_name.clone(), r.raw_execution_ticks.to_string()]);
    }

    table
}

fn schedulability_table(records: &[NormalizedStatRecord]) -> Table {
    let mut table = Table::new(&[
        ("Name", Align::Left),
        ("Exec Time", Align::Right),
        ("Period", Align::Right),
        ("Priority", Align::Right),
    ]);

    for r in records {
        table.push_row(vec![
            r.task_name.clone(),
            format!("{:.2}", r.mean_execution_time),
            r.period.to_string(),
            r.priority.to_string(),
        ]);
    }

    table
}

fn write_tables<W: Write>(w: &mut W, analysis: &Analysis) -> Result<()> {
    writeln!(w, "\nRuntime Stats:")?;
    runtime_stats_table(&analysis.raw).write(w)?;

    writeln!(w, "\nScheduling Result:")?;
    schedulability_table(&analysis.report.per_task).write(w)?;

    writeln!(
        w,
        "\nCPU Utilization: {:.3}%",
        analysis.report.aggregate_utilization_percent
    )?;

    Ok(())
}

fn write_json<W: Write>(w: &mut W, analysis: &Analysis) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, &JsonReport::from(analysis))?;
    writeln!(w)?;

    Ok(())
}

/// Lists the task catalog in catalog order.
pub fn write_catalog<W: Write>(w: &mut W, registry: &TaskRegistry) -> Result<()> {
    let mut table = Table::new(&[
        ("Name", Align::Left),
        ("Period", Align::Right),
        ("Priority", Align::Right),
    ]);

    for task in registry.iter() {
        table.push_row(vec![
            task.name.clone(),
            task.period.to_string(),
            task.priority.to_string(),
        ]);
    }

    table.write(w)?;

    Ok(())
}
