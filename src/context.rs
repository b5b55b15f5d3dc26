//! rtstat runtime parameters.
//!
//! This module defines the `StatContext` struct holding everything the
//! pipeline needs at runtime. It is built from command line parameters:
//! ```no_run
//! use rtstat::{cli::CLI, context::StatContext};
//! use clap::Parser;
//!
//! let args = CLI::parse();
//! let ctx = StatContext::try_from(&args).unwrap();
//! ```
//! Default parameters are defined in the `cli` module.

use anyhow::Result;
use tracing::info;

use crate::{
    analysis::SamplingWindow, cli::CLI, registry::TaskRegistry, report::ReportFormat,
    trace::TraceFormat,
};

/// Contains all rtstat parameters
pub struct StatContext {
    /// Task model of the firmware under analysis.
    pub registry: TaskRegistry,
    pub trace_format: TraceFormat,
    pub window: SamplingWindow,
    pub report_format: ReportFormat,
    pub verbose: bool,
}

impl StatContext {
    pub fn new(registry: TaskRegistry, window: SamplingWindow) -> Self {
        Self {
            registry,
            trace_format: TraceFormat::default(),
            window,
            report_format: ReportFormat::default(),
            verbose: false,
        }
    }
}

impl TryFrom<&CLI> for StatContext {
    type Error = anyhow::Error;

    fn try_from(cli_opts: &CLI) -> Result<Self> {
        let registry = match cli_opts.tasks() {
            Some(path) => {
                let registry = TaskRegistry::from_file(path)?;
                info!("{} task(s) loaded from {}", registry.len(), path.display());
                registry
            }
            None => TaskRegistry::builtin()?,
        };

        Ok(Self {
            registry,
            trace_format: TraceFormat::default(),
            window: cli_opts.window(),
            report_format: cli_opts.report_format(),
            verbose: cli_opts.verbose,
        })
    }
}
