//! Layout contract of a FreeRTOS runtime-stats block.
//!
//! The firmware prints a fixed banner and column header before the task rows
//! and a summary line plus the console prompt after them:
//! ```text
//! <blank>
//! Task            Abs Time        % Time
//! ****************************************
//! <blank>
//! IDLE            2351            39%
//! Tmr Svc         7               <1%
//! ...
//! <summary>
//! <prompt, or the empty string after the final newline>
//! ```
//! `TraceFormat` makes this contract explicit instead of hard-coding offsets
//! in the parser.

use crate::error::{Result, StatError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFormat {
    /// Number of lines preceding the first task row.
    pub header_lines: usize,
    /// Number of lines following the last task row.
    pub trailer_lines: usize,
    /// Multi-word task labels and their single-token replacement.
    pub label_aliases: Vec<(String, String)>,
    /// Factor applied to the printed tick count.
    pub tick_scale: u64,
}

impl Default for TraceFormat {
    fn default() -> Self {
        Self {
            header_lines: 4,
            trailer_lines: 2,
            label_aliases: vec![
                ("Tmr Svc".to_string(), "TmrSvc".to_string()),
                ("Tmr Tst".to_string(), "TmrTst".to_string()),
            ],
            tick_scale: 100,
        }
    }
}

impl TraceFormat {
    /// Replaces multi-word labels so that rows split cleanly on whitespace.
    pub fn normalize_labels(&self, text: &str) -> String {
        self.label_aliases
            .iter()
            .fold(text.to_string(), |acc, (label, token)| acc.replace(label, token))
    }

    /// Returns the task rows of `text` with their 1-based line number.
    ///
    /// Lines are split on `'\n'` only, so a trailing newline produces a last
    /// empty line that belongs to the trailer.
    pub fn data_lines<'t>(&self, text: &'t str) -> Result<Vec<(usize, &'t str)>> {
        let lines: Vec<&str> = text.split('\n').collect();
        let expected = self.header_lines + self.trailer_lines;

        if lines.len() < expected {
            return Err(StatError::MalformedTrace {
                lines: lines.len(),
                expected,
            });
        }

        let end = lines.len() - self.trailer_lines;

        Ok(lines[self.header_lines..end]
            .iter()
            .enumerate()
            .map(|(i, line)| (self.header_lines + i + 1, *line))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::TraceFormat;
    use crate::error::StatError;

    #[test]
    fn test_normalize_labels() {
        let format = TraceFormat::default();

        let text = "Tmr Svc   7   3%\nTmr Tst  12  <1%";
        assert_eq!(
            format.normalize_labels(text),
            "TmrSvc   7   3%\nTmrTst  12  <1%"
        );
    }

    #[test]
    fn test_data_lines_offsets() {
        let format = TraceFormat::default();
        let text = "h1\nh2\nh3\nh4\nrow1\nrow2\nsummary\n";

        let rows = format.data_lines(text).unwrap();

        assert_eq!(rows, vec![(5, "row1"), (6, "row2")]);
    }

    #[test]
    fn test_data_lines_empty_section() {
        let format = TraceFormat::default();

        assert!(format.data_lines("h1\nh2\nh3\nh4\nsummary\n").unwrap().is_empty());
    }

    #[test]
    fn test_data_lines_too_short() {
        let format = TraceFormat::default();

        assert!(matches!(
            format.data_lines(""),
            Err(StatError::MalformedTrace {
                lines: 1,
                expected: 6
            })
        ));
        assert!(matches!(
            format.data_lines("h1\nh2\nh3\nh4\n"),
            Err(StatError::MalformedTrace { lines: 5, .. })
        ));
    }
}
