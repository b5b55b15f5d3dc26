//! Saved trace reader.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::{context::StatContext, TraceSource};

/// Reads a trace previously saved by the `capture` command, or any text file
/// holding one runtime-stats block.
pub struct TraceFileSource {
    path: PathBuf,
}

impl TraceFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TraceSource for TraceFileSource {
    fn acquire(&mut self, _ctx: &StatContext) -> Result<String> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read trace {}", self.path.display()))?;

        info!("trace loaded from {}", self.path.display());

        Ok(text)
    }
}
