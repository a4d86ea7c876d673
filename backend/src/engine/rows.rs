//! Uploaded file intake: CSV or Excel, first sheet, header row required.
//!
//! Absent cells are blank-filled to `""` so everything downstream stays
//! total over plain strings.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported file type: {0} (expected .csv, .xlsx or .xls)")]
    UnsupportedFormat(String),

    #[error("could not read CSV: {0}")]
    Csv(String),

    #[error("could not read workbook: {0}")]
    Excel(String),

    #[error("the workbook has no sheets")]
    NoSheet,

    #[error("the file has no header row")]
    NoHeader,
}

/// One data row, keyed by header. Missing cells read as `""`.
#[derive(Debug, Clone)]
pub struct SourceRow {
    /// 1-based data row number (header excluded), for result reporting.
    pub line: usize,
    cells: HashMap<String, String>,
}

impl SourceRow {
    pub fn new(line: usize, cells: HashMap<String, String>) -> Self {
        Self { line, cells }
    }

    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct UploadRows {
    pub headers: Vec<String>,
    pub rows: Vec<SourceRow>,
}

/// Parse an upload by filename extension. Fully blank rows (trailing Excel
/// range padding) are dropped.
pub fn parse_upload(filename: &str, bytes: &[u8]) -> Result<UploadRows, ParseError> {
    let lower = filename.to_ascii_lowercase();
    let parsed = if lower.ends_with(".csv") {
        parse_csv(bytes)
    } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        parse_excel(bytes)
    } else {
        Err(ParseError::UnsupportedFormat(filename.to_string()))
    }?;

    Ok(UploadRows {
        headers: parsed.headers,
        rows: parsed.rows.into_iter().filter(|r| !r.is_blank()).collect(),
    })
}

fn parse_csv(bytes: &[u8]) -> Result<UploadRows, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ParseError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() {
        return Err(ParseError::NoHeader);
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ParseError::Csv(e.to_string()))?;
        let mut cells = HashMap::new();
        for (j, header) in headers.iter().enumerate() {
            let value = record.get(j).unwrap_or("").to_string();
            cells.insert(header.clone(), value);
        }
        rows.push(SourceRow::new(i + 1, cells));
    }

    Ok(UploadRows { headers, rows })
}

fn parse_excel(bytes: &[u8]) -> Result<UploadRows, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ParseError::Excel(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::NoSheet)?
        .map_err(|e| ParseError::Excel(e.to_string()))?;

    let mut iter = range.rows();
    let header_row = iter.next().ok_or(ParseError::NoHeader)?;
    let headers: Vec<String> = header_row.iter().map(|c| cell_text(c).trim().to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::NoHeader);
    }

    let mut rows = Vec::new();
    for (i, data_row) in iter.enumerate() {
        let mut cells = HashMap::new();
        for (j, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = data_row.get(j).map(cell_text).unwrap_or_default();
            cells.insert(header.clone(), value);
        }
        rows.push(SourceRow::new(i + 1, cells));
    }

    Ok(UploadRows { headers, rows })
}

/// Render one Excel cell the way the id/bool/date parsers expect: whole
/// floats without the `.0`, datetimes as `YYYY-MM-DD HH:MM:SS`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => naive.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_are_blank_filled() {
        let csv = "id,code,description\n,A1,Alpha\n5,B2\n";
        let parsed = parse_upload("paycodes.csv", csv.as_bytes()).unwrap();
        assert_eq!(parsed.headers, vec!["id", "code", "description"]);
        assert_eq!(parsed.rows.len(), 2);
        // Short record: the missing description cell reads as "".
        assert_eq!(parsed.rows[1].get("description"), "");
        assert_eq!(parsed.rows[1].get("id"), "5");
        // Unknown column also reads as "".
        assert_eq!(parsed.rows[0].get("nope"), "");
    }

    #[test]
    fn fully_blank_rows_are_dropped() {
        let csv = "id,name\n1,one\n,\n2,two\n";
        let parsed = parse_upload("x.csv", csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1].get("name"), "two");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            parse_upload("data.pdf", b""),
            Err(ParseError::UnsupportedFormat(_))
        ));
    }
}
