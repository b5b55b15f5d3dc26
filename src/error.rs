//! Error taxonomy of the analysis pipeline and its collaborators.
//!
//! Every variant is fatal to the current run. Nothing is retried: the
//! condition is reported and the binary exits with a non-zero status.

use std::fmt::Display;

/// Pipeline stage of the acquisition collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionStage {
    Build,
    Flash,
    Connect,
    Read,
}

impl Display for AcquisitionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AcquisitionStage::Build => "firmware build",
            AcquisitionStage::Flash => "device flash",
            AcquisitionStage::Connect => "serial connect",
            AcquisitionStage::Read => "serial read",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatError {
    /// The trace references a task absent from the registry.
    #[error("unknown task '{0}': the task catalog does not match the firmware")]
    UnknownTask(String),

    /// A data line does not have the `<name> <ticks> ...` shape.
    #[error("malformed record at line {line} ({content:?}): {reason}")]
    MalformedRecord {
        line: usize,
        content: String,
        reason: &'static str,
    },

    /// The trace is too short to hold the header and trailer of the format.
    #[error("malformed trace: {lines} line(s), expected at least {expected}")]
    MalformedTrace { lines: usize, expected: usize },

    /// The sampling window does not cover one full period of a task.
    #[error("degenerate window for task '{task}': {elapsed} us elapsed for a {period} us period")]
    DegenerateWindow {
        task: String,
        period: u64,
        elapsed: u64,
    },

    #[error("task '{0}' is defined more than once in the catalog")]
    DuplicateTask(String),

    #[error("task '{0}' has a zero period")]
    InvalidPeriod(String),

    #[error("{stage} failed: {reason}")]
    Acquisition {
        stage: AcquisitionStage,
        reason: String,
    },
}

impl StatError {
    pub fn acquisition<R: Display>(stage: AcquisitionStage, reason: R) -> Self {
        StatError::Acquisition {
            stage,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = StatError> = std::result::Result<T, E>;
