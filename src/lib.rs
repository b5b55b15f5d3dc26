//! An RTOS runtime-statistics utilization analyzer.
//!
//! rtstat estimates the CPU utilization of a periodic task set from the
//! runtime-stats block printed by FreeRTOS on a microcontroller console. The
//! cumulative execution time of each task is amortized over the sampling
//! window and compared to the task period declared in a task catalog.
//!
//! rtstat's main components are either __trace sources__ or __trace
//! processors__:
//! - A trace source produces the text of one runtime-stats capture. It
//!   implements the `TraceSource` trait. Current sources are the device
//!   itself (build, flash, then read the serial console) and saved trace files.
//! - A trace processor consumes a capture. It implements the `TraceProcessor`
//!   trait. rtstat has two processors: a utilization reporter and a trace
//!   recorder.

pub mod cli;
pub mod error;

pub mod record;
pub mod registry;
pub mod trace;

pub mod acquisition;
pub mod analysis;

pub mod context;
pub mod processors;
pub mod report;

pub mod io;

use anyhow::Result;

use crate::context::StatContext;

/// Produces the text of a runtime-stats capture.
pub trait TraceSource {
    fn acquire(&mut self, ctx: &StatContext) -> Result<String>;
}

/// Consumes a runtime-stats capture.
pub trait TraceProcessor {
    /// Initialize the processor before the trace is acquired, so that
    /// configuration problems show up before any hardware step.
    fn pre_acquire_init(&mut self, ctx: &StatContext) -> Result<()>;

    /// Process the captured trace.
    fn process(&mut self, trace: String, ctx: &StatContext) -> Result<()>;
}

/// Feeds the trace produced by `source` to `processor`.
pub fn run<S: TraceSource, P: TraceProcessor>(
    mut source: S,
    mut processor: P,
    ctx: &StatContext,
) -> Result<()> {
    processor.pre_acquire_init(ctx)?;

    let trace = source.acquire(ctx)?;

    processor.process(trace, ctx)
}
