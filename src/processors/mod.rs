//! Trace processors.
//!
//! This module contains what is done with an acquired trace. Each of these
//! processors is invoked by a different CLI subcommand.

pub mod report;
pub mod save_trace;
