use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Parser errors
// ---------------------------------------------------------------------------

/// Everything that can go wrong while turning a file into a [`Table`].
///
/// The `Display` text is shown to the user verbatim in the status line.
///
/// [`Table`]: crate::data::model::Table
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Unsupported file extension: .{0} (expected .csv, .xlsx, .xls, .ods or .json)")]
    UnsupportedExtension(String),

    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unreadable spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON array of row objects")]
    JsonShape,

    #[error("The workbook has no sheets")]
    NoSheets,

    #[error("The file has no header row")]
    MissingHeaders,

    #[error("Header {index} is empty")]
    EmptyHeader { index: usize },

    #[error("Duplicate column name: {0}")]
    DuplicateHeader(String),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// ---------------------------------------------------------------------------
// Aggregation errors
// ---------------------------------------------------------------------------

/// Malformed aggregation requests, caught at the recompute boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("No dataset loaded")]
    NoData,

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Select a {0} column")]
    MissingSelection(&'static str),
}
