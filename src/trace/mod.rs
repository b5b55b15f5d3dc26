//! Runtime-stats traces: layout contract, parser, and saved trace files.

pub mod format;
pub mod parser;
pub mod reader;

pub use format::TraceFormat;
pub use parser::StatParser;
