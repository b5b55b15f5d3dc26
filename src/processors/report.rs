//! Utilization report processor.

use std::io::{Stdout, Write};

use anyhow::Result;

use crate::{
    analysis::analyse,
    context::StatContext,
    report::{write_report, ReportFormat},
    TraceProcessor,
};

/// Runs the analysis pipeline and renders the result.
pub struct Reporter<W> {
    out: W,
    format: ReportFormat,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self { out, format }
    }
}

impl From<&StatContext> for Reporter<Stdout> {
    fn from(ctx: &StatContext) -> Self {
        Reporter::new(std::io::stdout(), ctx.report_format)
    }
}

impl<W: Write> TraceProcessor for Reporter<W> {
    fn pre_acquire_init(&mut self, _ctx: &StatContext) -> Result<()> {
        Ok(())
    }

    fn process(&mut self, trace: String, ctx: &StatContext) -> Result<()> {
        let analysis = analyse(&trace, &ctx.trace_format, &ctx.registry, &ctx.window)?;

        write_report(&mut self.out, &analysis, self.format)?;
        self.out.flush()?;

        Ok(())
    }
}
