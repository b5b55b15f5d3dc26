//! Runtime-stats trace parser.

use nom::{
    bytes::complete::{take_till1, take_while, take_while1},
    IResult,
};
use tracing::{debug, warn};

use crate::{
    error::{Result, StatError},
    record::RawStatRecord,
    trace::format::TraceFormat,
};

/// Splits a task row into its first two whitespace-delimited tokens.
fn row_fields(input: &str) -> IResult<&str, (&str, &str)> {
    let (i, _) = take_while(char::is_whitespace)(input)?;
    let (i, name) = take_till1(char::is_whitespace)(i)?;
    let (i, _) = take_while1(char::is_whitespace)(i)?;
    let (i, ticks) = take_till1(char::is_whitespace)(i)?;

    Ok((i, (name, ticks)))
}

/// Turns a captured trace into raw per-task records.
///
/// Any malformed row aborts the whole parse: no partial record set is ever
/// returned.
pub struct StatParser<'a> {
    format: &'a TraceFormat,
}

impl<'a> StatParser<'a> {
    pub fn new(format: &'a TraceFormat) -> Self {
        Self { format }
    }

    pub fn parse(&self, text: &str) -> Result<Vec<RawStatRecord>> {
        let text = self.format.normalize_labels(text);
        let rows = self.format.data_lines(&text)?;

        if rows.is_empty() {
            warn!("trace holds no task rows");
        }

        rows.into_iter()
            .map(|(line, content)| self.parse_row(line, content))
            .collect()
    }

    fn parse_row(&self, line: usize, content: &str) -> Result<RawStatRecord> {
        let malformed = |reason| StatError::MalformedRecord {
            line,
            content: content.to_string(),
            reason,
        };

        let (_, (name, ticks)) =
            row_fields(content).map_err(|_| malformed("expected a task name and a tick count"))?;

        if !ticks.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("tick count is not a whole number"));
        }

        let raw_execution_ticks = ticks
            .parse::<u64>()
            .ok()
            .and_then(|t| t.checked_mul(self.format.tick_scale))
            .ok_or_else(|| malformed("tick count overflows"))?;

        debug!("{}: {} ticks", name, raw_execution_ticks);

        Ok(RawStatRecord::new(name, raw_execution_ticks))
    }
}
