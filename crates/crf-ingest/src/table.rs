//! Raw table loading.
//!
//! Workbooks are read with `calamine`, CSV exports with `csv`. Either way
//! blank cells become empty strings; nothing is ever null.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Label used in error messages (file and sheet).
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = headers.iter().map(String::as_str).map(normalize_header).collect();
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
    }

    /// Names from `required` that have no matching header.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| (*name).to_string())
            .collect()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// Supported table file kinds, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Workbook,
}

impl TableFormat {
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(TableFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(TableFormat::Workbook),
            _ => None,
        }
    }
}

fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

/// Whitespace-only cells read as blank; anything else is kept as written.
/// Identifier columns are trimmed when records are typed.
fn normalize_cell(raw: &str) -> String {
    let value = raw.trim_matches('\u{feff}');
    if value.trim().is_empty() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Split raw records into headers and rows. Fully blank records are
/// skipped; the first remaining record is the header. Short records are
/// padded with empty cells.
fn into_table(name: String, raw_rows: Vec<Vec<String>>) -> Table {
    let mut records = raw_rows
        .into_iter()
        .filter(|row| !row.iter().all(|value| value.trim().is_empty()));
    let Some(header) = records.next() else {
        return Table {
            name,
            ..Table::default()
        };
    };
    let headers: Vec<String> = header.iter().map(String::as_str).map(normalize_header).collect();
    let rows = records
        .map(|record| {
            (0..headers.len())
                .map(|idx| {
                    record
                        .get(idx)
                        .map(String::as_str)
                        .map(normalize_cell)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    Table {
        name,
        headers,
        rows,
    }
}

pub fn read_csv_table(path: &Path) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    let mut raw_rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        raw_rows.push(record.iter().map(normalize_cell).collect());
    }
    Ok(into_table(path.display().to_string(), raw_rows))
}

/// Render a workbook cell the way a spreadsheet user reads it. Integral
/// floats lose their fraction so order numbers and lengths read `3`, not `3.0`.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
            normalize_cell(value)
        }
        Data::Int(value) => value.to_string(),
        Data::Float(value) => {
            if value.fract() == 0.0 && value.abs() < 1e15 {
                format!("{}", *value as i64)
            } else {
                value.to_string()
            }
        }
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => value.as_f64().to_string(),
        Data::Error(error) => format!("{error:?}"),
    }
}

pub fn read_workbook_table(path: &Path, sheet: &str) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).map_err(|err| IngestError::Workbook {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(IngestError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
        });
    }
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|err| IngestError::Workbook {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    let raw_rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    Ok(into_table(format!("{} [{sheet}]", path.display()), raw_rows))
}

/// Read a table from a workbook sheet or a CSV file, chosen by extension.
/// The sheet name is ignored for CSV input.
pub fn read_table(path: &Path, sheet: &str) -> Result<Table> {
    if !path.exists() {
        return Err(IngestError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        ));
    }
    let table = match TableFormat::detect(path) {
        Some(TableFormat::Csv) => read_csv_table(path)?,
        Some(TableFormat::Workbook) => read_workbook_table(path, sheet)?,
        None => {
            return Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };
    debug!(
        table = %table.name,
        columns = table.headers.len(),
        rows = table.height(),
        "table loaded"
    );
    Ok(table)
}
