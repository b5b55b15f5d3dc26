//! Plain-text tables.

use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Column-aligned table: header, dashed rule, then one line per row.
/// Columns are separated by two spaces.
pub struct Table {
    columns: Vec<(&'static str, Align)>,
    rows: Vec<Vec<String>>,
}

const GUTTER: &str = "  ";

impl Table {
    pub fn new(columns: &[(&'static str, Align)]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.columns.len(), "bad row width");
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, (header, _))| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .fold(header.chars().count(), usize::max)
            })
            .collect()
    }

    fn write_line<W: Write>(
        &self,
        w: &mut W,
        widths: &[usize],
        cells: impl Iterator<Item = String>,
    ) -> io::Result<()> {
        let mut line = String::new();

        for (i, cell) in cells.enumerate() {
            if i > 0 {
                line.push_str(GUTTER);
            }
            let width = widths[i];
            match self.columns[i].1 {
                Align::Left => line.push_str(&format!("{:<width$}", cell, width = width)),
                Align::Right => line.push_str(&format!("{:>width$}", cell, width = width)),
            }
        }

        writeln!(w, "{}", line.trim_end())
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let widths = self.widths();

        self.write_line(
            w,
            &widths,
            self.columns.iter().map(|(header, _)| header.to_string()),
        )?;
        self.write_line(w, &widths, widths.iter().map(|&n| "-".repeat(n)))?;

        for row in &self.rows {
            self.write_line(w, &widths, row.iter().cloned())?;
        }

        Ok(())
    }
}
