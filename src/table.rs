//! Tab-separated record tables
//!
//! A table stands in for the spreadsheet the payloads are listed in: the
//! first line names the columns, every following line is one row. Each row
//! can be viewed as a [`Record`] for `$name` lookups.

use crate::payload::Record;
use anyhow::{bail, Context, Result};
use std::path::Path;

pub const CELL_SEPARATOR: char = '\t';

/// A header plus rows of string cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Parse tab-separated text; blank lines are skipped
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((_, header)) = lines.next() else {
            bail!("Table has no header line");
        };
        let mut table = Table::new(header.split(CELL_SEPARATOR).map(str::trim));

        for (line_num, line) in lines {
            let cells: Vec<String> = line.split(CELL_SEPARATOR).map(str::to_string).collect();
            table
                .push_row(cells)
                .with_context(|| format!("Invalid row at line {}", line_num + 1))?;
        }

        Ok(table)
    }

    /// Read a table from a file
    pub fn read_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read table: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to parse table: {}", path.display()))
    }

    /// Format as tab-separated text with a trailing newline
    pub fn to_tsv(&self) -> Result<String> {
        let mut output = String::new();
        Self::write_line(&mut output, &self.columns)?;
        for row in &self.rows {
            Self::write_line(&mut output, row)?;
        }
        Ok(output)
    }

    fn write_line(output: &mut String, cells: &[String]) -> Result<()> {
        for (i, cell) in cells.iter().enumerate() {
            if cell.contains(CELL_SEPARATOR) || cell.contains('\n') || cell.contains('\r') {
                bail!("Cell '{}' contains a tab or line break", cell.escape_debug());
            }
            if i > 0 {
                output.push(CELL_SEPARATOR);
            }
            output.push_str(cell);
        }
        output.push('\n');
        Ok(())
    }

    /// Write the table to a file
    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        let text = self.to_tsv()?;
        std::fs::write(path, text).with_context(|| format!("Failed to write table: {}", path.display()))?;
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of `name`, adding an empty column if it does not exist
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.columns.len() - 1
    }

    /// Append a row; it must have one cell per column
    pub fn push_row(&mut self, cells: Vec<String>) -> Result<()> {
        if cells.len() != self.columns.len() {
            bail!("Expected {} cells, found {}", self.columns.len(), cells.len());
        }
        self.rows.push(cells);
        Ok(())
    }

    /// Number of rows (excluding the header)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell value by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|cells| cells[index].as_str())
    }

    /// Overwrite a cell
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) -> Result<()> {
        let Some(index) = self.column_index(column) else {
            bail!("Column '{}' not found", column);
        };
        let Some(cells) = self.rows.get_mut(row) else {
            bail!("Row {} out of range ({} rows)", row, self.rows.len());
        };
        cells[index] = value.into();
        Ok(())
    }

    /// View a row as a record keyed by column name.
    ///
    /// Empty cells are left out, so they read as missing fields.
    pub fn record(&self, row: usize) -> Option<Record> {
        let cells = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .zip(cells)
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(name, value)| (name.as_str(), value.trim()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "filename\tqrstring\ttarif\na.png\t000201010211\t2000\nb.png\t000201010212\t\n";

    #[test]
    fn test_parse_table() {
        let table = Table::parse(SAMPLE).unwrap();
        assert_eq!(table.columns(), &["filename", "qrstring", "tarif"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "qrstring"), Some("000201010211"));
        assert_eq!(table.get(1, "tarif"), Some(""));
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let table = Table::parse("a\tb\n\n1\t2\n\n").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_crlf() {
        let table = Table::parse("a\tb\r\n1\t2\r\n").unwrap();
        assert_eq!(table.get(0, "b"), Some("2"));
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(Table::parse("").is_err());
    }

    #[test]
    fn test_parse_wrong_cell_count() {
        let err = Table::parse("a\tb\n1\t2\t3\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_record_omits_empty_cells() {
        let table = Table::parse(SAMPLE).unwrap();
        let record = table.record(1).unwrap();
        assert_eq!(record.get("filename"), Some("b.png"));
        assert_eq!(record.get("tarif"), None);
        assert!(table.record(5).is_none());
    }

    #[test]
    fn test_set_and_to_tsv() {
        let mut table = Table::parse(SAMPLE).unwrap();
        table.set(1, "tarif", "6200").unwrap();
        assert_eq!(
            table.to_tsv().unwrap(),
            "filename\tqrstring\ttarif\na.png\t000201010211\t2000\nb.png\t000201010212\t6200\n"
        );
    }

    #[test]
    fn test_set_unknown_column() {
        let mut table = Table::parse(SAMPLE).unwrap();
        assert!(table.set(0, "amount", "1").is_err());
        assert!(table.set(9, "tarif", "1").is_err());
    }

    #[test]
    fn test_ensure_column() {
        let mut table = Table::parse(SAMPLE).unwrap();
        assert_eq!(table.ensure_column("tarif"), 2);
        assert_eq!(table.ensure_column("status"), 3);
        assert_eq!(table.get(0, "status"), Some(""));
    }

    #[test]
    fn test_to_tsv_rejects_tab_in_cell() {
        let mut table = Table::new(["a"]);
        table.push_row(vec!["x\ty".to_string()]).unwrap();
        assert!(table.to_tsv().is_err());
    }
}
