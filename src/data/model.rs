use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Number parsing shared by the aggregators
// ---------------------------------------------------------------------------

/// Interpret a cell as a finite number. Blank and non-numeric text is `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric value of a cell, with anything unparseable counting as zero.
pub fn number_or_zero(cell: &str) -> f64 {
    parse_number(cell).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Row – one record of the uploaded file
// ---------------------------------------------------------------------------

/// A single data row: column name → cell text.
///
/// Columns the row does not carry read as the empty string, so callers never
/// have to distinguish "missing" from "blank".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(column.into(), value.into());
    }

    /// Cell text for `column`, or `""` when the row has no such cell.
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    /// Trimmed cell text; this is what filters and group keys compare against.
    pub fn trimmed(&self, column: &str) -> &str {
        self.get(column).trim()
    }

    /// True when every field is empty after trimming.
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the complete parsed upload
// ---------------------------------------------------------------------------

/// Parsed file contents: the ordered column universe plus the valid rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Column names in source order. Never empty, never duplicated.
    pub headers: Vec<String>,
    /// Rows in source order; blank rows have already been dropped.
    pub rows: Vec<Row>,
}

impl Table {
    /// Validate the header row and keep only rows with at least one value.
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Result<Self, LoadError> {
        if headers.is_empty() {
            return Err(LoadError::MissingHeaders);
        }
        let mut seen = HashSet::with_capacity(headers.len());
        for (index, header) in headers.iter().enumerate() {
            if header.is_empty() {
                return Err(LoadError::EmptyHeader { index: index + 1 });
            }
            if !seen.insert(header.as_str()) {
                return Err(LoadError::DuplicateHeader(header.clone()));
            }
        }

        let rows = rows.into_iter().filter(|r| !r.is_blank()).collect();
        Ok(Table { headers, rows })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Fail with every absent column named, in the order they were asked for.
    pub fn require_columns(&self, required: &[&str]) -> Result<(), LoadError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LoadError::MissingColumns(missing))
        }
    }

    /// Sorted distinct non-empty trimmed values of one column.
    pub fn unique_values(&self, column: &str) -> BTreeSet<String> {
        self.rows
            .iter()
            .map(|r| r.trimmed(column))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_rejects_blank_text_and_non_finite() {
        assert_eq!(parse_number(" 41 "), Some(41.0));
        assert_eq!(parse_number("-2.5"), Some(-2.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("agree"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(number_or_zero("n/a"), 0.0);
    }

    #[test]
    fn missing_cells_read_as_empty() {
        let row: Row = [("a", "1")].into_iter().collect();
        assert_eq!(row.get("a"), "1");
        assert_eq!(row.get("b"), "");
    }

    #[test]
    fn table_drops_blank_rows() {
        let rows = vec![
            [("a", "  "), ("b", "")].into_iter().collect(),
            [("a", "x"), ("b", "")].into_iter().collect(),
        ];
        let table = Table::new(vec!["a".into(), "b".into()], rows).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].get("a"), "x");
    }

    #[test]
    fn table_rejects_bad_headers() {
        assert!(matches!(
            Table::new(vec![], vec![]),
            Err(LoadError::MissingHeaders)
        ));
        assert!(matches!(
            Table::new(vec!["a".into(), "a".into()], vec![]),
            Err(LoadError::DuplicateHeader(h)) if h == "a"
        ));
        assert!(matches!(
            Table::new(vec!["a".into(), "".into()], vec![]),
            Err(LoadError::EmptyHeader { index: 2 })
        ));
    }

    #[test]
    fn require_columns_lists_everything_missing() {
        let table = Table::new(vec!["id".into()], vec![]).unwrap();
        let err = table.require_columns(&["id", "agree", "disagree"]).unwrap_err();
        assert_eq!(err.to_string(), "Missing required columns: agree, disagree");
    }
}
