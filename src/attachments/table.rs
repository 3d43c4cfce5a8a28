//! CSV and spreadsheet decoding into a text table

use std::fmt::Write;
use std::io::Cursor;

use calamine::{Data, Reader};

use super::TableFormat;
use crate::{Error, Result};

/// Data rows kept from an attached table
pub const MAX_TABLE_ROWS: usize = 50;

/// Decoded table, header plus at most `MAX_TABLE_ROWS` rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Data rows in the source before truncation
    pub total_rows: usize,
}

impl Table {
    /// Decode raw bytes in the given format
    ///
    /// # Errors
    ///
    /// Returns error if the data is malformed or has no rows
    pub fn decode(format: TableFormat, data: &[u8]) -> Result<Self> {
        let records = match format {
            TableFormat::Csv => read_csv(data)?,
            TableFormat::Xls | TableFormat::Xlsx => read_workbook(data)?,
        };
        Self::from_records(records)
    }

    /// Build from raw records, first record is the header
    ///
    /// # Errors
    ///
    /// Returns error if there are no records
    pub fn from_records(records: Vec<Vec<String>>) -> Result<Self> {
        let mut records = records.into_iter();
        let headers = records
            .next()
            .ok_or_else(|| Error::Attachment("table is empty".to_string()))?;

        let mut rows = Vec::new();
        let mut total_rows = 0;
        for record in records {
            if rows.len() < MAX_TABLE_ROWS {
                rows.push(record);
            }
            total_rows += 1;
        }

        Ok(Self {
            headers,
            rows,
            total_rows,
        })
    }

    /// Whether rows were dropped
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.total_rows > self.rows.len()
    }

    /// Render as a pipe table
    #[must_use]
    pub fn render(&self) -> String {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
            .max(1);

        let mut out = String::new();
        push_row(&mut out, &self.headers, width);
        out.push('|');
        for _ in 0..width {
            out.push_str(" --- |");
        }
        out.push('\n');
        for row in &self.rows {
            push_row(&mut out, row, width);
        }

        if self.is_truncated() {
            let _ = writeln!(
                out,
                "(showing first {} of {} rows)",
                self.rows.len(),
                self.total_rows
            );
        }

        out.truncate(out.trim_end().len());
        out
    }
}

fn push_row(out: &mut String, cells: &[String], width: usize) {
    out.push('|');
    for idx in 0..width {
        let cell = cells.get(idx).map_or("", String::as_str);
        let cell = cell.replace('|', "\\|").replace(['\r', '\n'], " ");
        let _ = write!(out, " {} |", cell.trim());
    }
    out.push('\n');
}

/// Read CSV, sniffing the delimiter from the first lines
fn read_csv(data: &[u8]) -> Result<Vec<Vec<String>>> {
    let content = String::from_utf8_lossy(data);
    let content = content.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| Error::Attachment(format!("invalid CSV: {e}")))?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(records)
}

/// Pick the delimiter giving the most consistent field count over a sample
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b',', b';', b'\t', b'|'];
    let sample: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0usize;
    for &delim in candidates {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| line.split(char::from(delim)).count())
            .collect();

        let Some(&first) = counts.first() else {
            break;
        };
        if first <= 1 {
            continue;
        }

        let score = counts.iter().filter(|&&c| c == first).count() * first;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read the first worksheet of an XLS/XLSX workbook
fn read_workbook(data: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data.to_vec()))
        .map_err(|e| Error::Attachment(format!("invalid spreadsheet: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Attachment("spreadsheet has no sheets".to_string()))?
        .map_err(|e| Error::Attachment(format!("invalid worksheet: {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Display text for a spreadsheet cell
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Whole floats print without a trailing ".0"
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Data::Bool(b) => String::from(if *b { "TRUE" } else { "FALSE" }),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_rows(n: usize) -> Vec<u8> {
        let mut data = String::from("id,value\n");
        for i in 0..n {
            let _ = writeln!(data, "{i},v{i}");
        }
        data.into_bytes()
    }

    #[test]
    fn decodes_csv_with_header() {
        let table = Table::decode(TableFormat::Csv, b"name,age\nann,31\n").unwrap();
        assert_eq!(table.headers, ["name", "age"]);
        assert_eq!(table.rows, [["ann", "31"]]);
        assert!(!table.is_truncated());
    }

    #[test]
    fn truncates_to_fifty_rows() {
        let table = Table::decode(TableFormat::Csv, &csv_rows(120)).unwrap();
        assert_eq!(table.rows.len(), MAX_TABLE_ROWS);
        assert_eq!(table.total_rows, 120);

        let rendered = table.render();
        assert!(rendered.contains("| 49 | v49 |"));
        assert!(!rendered.contains("| 50 | v50 |"));
        assert!(rendered.ends_with("(showing first 50 of 120 rows)"));
    }

    #[test]
    fn sniffs_semicolons() {
        let table = Table::decode(TableFormat::Csv, b"a;b;c\n1;2;3\n").unwrap();
        assert_eq!(table.headers, ["a", "b", "c"]);
    }

    #[test]
    fn renders_ragged_rows_and_escapes_pipes() {
        let table = Table::from_records(vec![
            vec!["k".to_string()],
            vec!["x|y".to_string(), "extra".to_string()],
        ])
        .unwrap();
        assert_eq!(table.render(), "| k |  |\n| --- | --- |\n| x\\|y | extra |");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(Table::decode(TableFormat::Csv, b"").is_err());
        assert!(Table::decode(TableFormat::Xlsx, b"garbage").is_err());
    }

    #[test]
    fn whole_floats_drop_decimals() {
        assert_eq!(cell_text(&Data::Float(3.0)), "3");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Bool(true)), "TRUE");
    }
}
