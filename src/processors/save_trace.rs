//! Trace recorder.

use std::{io::Write, path::PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::{analysis::analyse, context::StatContext, io::CaptureDirectory, TraceProcessor};

/// Saves the captured trace as-is for a later `analyze` run.
pub struct TraceWriter {
    output_dir: CaptureDirectory,
    saved: Option<PathBuf>,
}

impl TraceWriter {
    pub fn new(output_dir: CaptureDirectory) -> Self {
        Self {
            output_dir,
            saved: None,
        }
    }

    /// Path of the trace file, once written.
    pub fn saved(&self) -> Option<&PathBuf> {
        self.saved.as_ref()
    }
}

impl TraceProcessor for TraceWriter {
    fn pre_acquire_init(&mut self, _ctx: &StatContext) -> Result<()> {
        self.output_dir.create_dir()
    }

    fn process(&mut self, trace: String, ctx: &StatContext) -> Result<()> {
        // The capture is kept even if it does not analyze cleanly.
        if let Err(e) = analyse(&trace, &ctx.trace_format, &ctx.registry, &ctx.window) {
            warn!("captured trace does not analyze: {}", e);
        }

        let (path, mut file) = self.output_dir.create_trace_file()?;
        file.write_all(trace.as_bytes())?;
        file.sync_all()?;

        info!("trace saved in {}", path.display());
        self.saved = Some(path);

        Ok(())
    }
}
