//! # Raw Tables
//!
//! Untyped spreadsheet-like input: a header row and string cells. Nothing
//! here knows about beams; the [`crate::columns`] mapper decides which
//! columns matter and [`RawTable::numeric_column`] converts them.

use std::io::Read;

use calamine::{Data, Range};
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// A table exactly as uploaded, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Column headers, whitespace-trimmed
    pub headers: Vec<String>,
    /// Data rows; rows may be shorter than `headers`
    pub rows: Vec<Vec<String>>,
    /// 1-based source data row of each entry in `rows`, when blank rows
    /// were skipped on the way in; empty means rows are numbered in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_rows: Vec<usize>,
}

impl RawTable {
    /// Create a table from headers and rows, trimming the headers.
    pub fn new<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        RawTable {
            headers: headers
                .into_iter()
                .map(|h| {
                    let h: String = h.into();
                    h.trim().to_string()
                })
                .collect(),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect::<Vec<String>>())
                .collect(),
            source_rows: Vec::new(),
        }
    }

    /// Attach the source data row number of each row.
    ///
    /// Ignored unless there is exactly one number per row.
    pub fn with_source_rows(mut self, source_rows: Vec<usize>) -> Self {
        if source_rows.len() == self.rows.len() {
            self.source_rows = source_rows;
        }
        self
    }

    /// Parse CSV with a header row.
    ///
    /// Fully blank rows are dropped; ragged rows are kept as-is. Rows
    /// remember their position in the file (line number minus the header
    /// line) so errors point at what the user sees.
    pub fn from_csv_reader<R: Read>(reader: R) -> CalcResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut source_rows = Vec::new();
        for (index, record) in rdr.records().enumerate() {
            let record = record?;
            if record.iter().all(|cell| cell.is_empty()) {
                continue;
            }
            let line = record.position().map_or(index as u64 + 2, |p| p.line());
            source_rows.push(line.saturating_sub(1) as usize);
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(RawTable::new(headers, rows).with_source_rows(source_rows))
    }

    /// Convert a worksheet: first row is the header row.
    ///
    /// Numeric cells are rendered back to text so every input format goes
    /// through the same cell parsing. Blank rows are dropped like in CSV.
    pub fn from_sheet(range: &Range<Data>) -> CalcResult<Self> {
        let mut sheet_rows = range.rows();
        let headers: Vec<String> = sheet_rows
            .next()
            .ok_or_else(|| CalcError::invalid_table("Worksheet is empty"))?
            .iter()
            .map(|cell| cell.to_string())
            .collect();

        let mut rows = Vec::new();
        let mut source_rows = Vec::new();
        for (index, row) in sheet_rows.enumerate() {
            if row.iter().all(|cell| matches!(cell, Data::Empty)) {
                continue;
            }
            source_rows.push(index + 1);
            rows.push(row.iter().map(|cell| cell.to_string()).collect::<Vec<String>>());
        }

        Ok(RawTable::new(headers, rows).with_source_rows(source_rows))
    }

    /// Parse CSV from an in-memory string.
    pub fn from_csv_str(data: &str) -> CalcResult<Self> {
        Self::from_csv_reader(data.as_bytes())
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw cell text, `""` for cells missing from a short row.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// 1-based source row number of data row `row` (0-based).
    pub fn source_row(&self, row: usize) -> usize {
        self.source_rows.get(row).copied().unwrap_or(row + 1)
    }

    /// Convert the first `limit` rows of a column to numbers.
    ///
    /// Errors name the header and the 1-based data row of the first bad cell.
    pub fn numeric_prefix(&self, column: usize, limit: usize) -> CalcResult<Vec<f64>> {
        let name = self
            .headers
            .get(column)
            .cloned()
            .unwrap_or_else(|| format!("#{}", column + 1));

        (0..self.rows.len().min(limit))
            .map(|row| parse_cell(self.cell(row, column), &name, self.source_row(row)))
            .collect()
    }

    /// Convert an entire column to numbers.
    pub fn numeric_column(&self, column: usize) -> CalcResult<Vec<f64>> {
        self.numeric_prefix(column, self.rows.len())
    }

    /// Copy of the header row and the first `rows` data rows.
    pub fn preview(&self, rows: usize) -> RawTable {
        RawTable {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(rows).cloned().collect(),
            source_rows: self.source_rows.iter().take(rows).copied().collect(),
        }
    }
}

fn parse_cell(raw: &str, column: &str, row: usize) -> CalcResult<f64> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(CalcError::invalid_cell(column, row, raw, "Empty cell in a required column"));
    }
    let value: f64 = text
        .parse()
        .map_err(|_| CalcError::invalid_cell(column, row, raw, "Not a number"))?;
    if !value.is_finite() {
        return Err(CalcError::invalid_cell(column, row, raw, "Value must be finite"));
    }
    Ok(value)
}
