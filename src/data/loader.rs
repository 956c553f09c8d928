use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::Value as JsonValue;

use super::model::{Row, Table};
use crate::error::LoadError;

/// Columns the single-purpose Likert template must carry.
pub const LIKERT_TEMPLATE_COLUMNS: [&str; 5] =
    ["id", "stronglyDisagree", "disagree", "agree", "stronglyAgree"];

const TEMPLATE_CSV: &str = "\
id,stronglyDisagree,disagree,agree,stronglyAgree
STAQ001,41,15,35,9
STAQ002,47,6,38,9
STAQ003,25,21,40,14
STAQ004,12,18,52,18
";

/// The downloadable sample file offered next to the upload button.
pub fn template_csv() -> &'static str {
    TEMPLATE_CSV
}

// ---------------------------------------------------------------------------
// Format detection
// ---------------------------------------------------------------------------

/// Input flavours, decided by file extension before anything is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma separated text, first record is the header row.
    Csv,
    /// Excel / OpenDocument workbook; only the first sheet is read.
    Spreadsheet,
    /// `[{ "column": value, ... }, ...]`
    Json,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Result<Self, LoadError> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(FileFormat::Spreadsheet),
            "json" => Ok(FileFormat::Json),
            other => Err(LoadError::UnsupportedExtension(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a table from disk. Dispatch by extension.
pub fn load_file(path: &Path) -> Result<Table, LoadError> {
    let format = FileFormat::from_path(path)?;
    let content = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse(&content, format)?;
    log::info!(
        "Parsed {} with {} rows and columns {:?}",
        path.display(),
        table.len(),
        table.headers
    );
    Ok(table)
}

/// Turn raw file content into headers plus rows.
pub fn parse(content: &[u8], format: FileFormat) -> Result<Table, LoadError> {
    match format {
        FileFormat::Csv => parse_csv(content),
        FileFormat::Spreadsheet => parse_spreadsheet(content),
        FileFormat::Json => parse_json(content),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Quoted fields may contain commas and newlines. Records are matched to the
/// header row by position: short records are padded with `""`, surplus
/// fields are dropped.
fn parse_csv(content: &[u8]) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let raw_headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let headers = strip_trailing_empty(raw_headers);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
    }

    Table::new(headers, rows)
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

fn parse_spreadsheet(content: &[u8]) -> Result<Table, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content.to_vec()))?;
    let range = workbook.worksheet_range_at(0).ok_or(LoadError::NoSheets)??;

    let mut sheet_rows = range.rows();
    let header_cells = sheet_rows.next().ok_or(LoadError::MissingHeaders)?;
    let headers = strip_trailing_empty(header_cells.iter().map(cell_to_string).collect());

    let rows = sheet_rows
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), cells.get(i).map(cell_to_string).unwrap_or_default()))
                .collect::<Row>()
        })
        .collect();

    Table::new(headers, rows)
}

/// Spreadsheet numbers are stringified: integral floats lose the `.0`.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Records-oriented JSON, e.g. `df.to_json(orient='records')`. Headers are the
/// keys in order of first appearance.
fn parse_json(content: &[u8]) -> Result<Table, LoadError> {
    let root: JsonValue = serde_json::from_slice(content)?;
    let records = root.as_array().ok_or(LoadError::JsonShape)?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for rec in records {
        let obj = rec.as_object().ok_or(LoadError::JsonShape)?;
        let mut row = Row::new();
        for (key, val) in obj {
            let key = key.trim();
            if !headers.iter().any(|h| h == key) {
                headers.push(key.to_string());
            }
            row.insert(key, json_to_cell(val));
        }
        rows.push(row);
    }

    Table::new(headers, rows)
}

fn json_to_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.trim().to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

/// Exported sheets often carry blank cells to the right of the last header.
fn strip_trailing_empty(mut headers: Vec<String>) -> Vec<String> {
    while headers.last().is_some_and(|h| h.is_empty()) {
        headers.pop();
    }
    headers
}
