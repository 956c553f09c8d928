use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::filter::{apply_filters, FilterSpec};
use super::model::{number_or_zero, Row};

/// Joins the component values of a composite row or column key.
pub const KEY_SEPARATOR: &str = "|";

/// Which columns form the pivot's rows, columns and summed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotConfig {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<String>,
}

/// Cross-tabulated sums.
///
/// Every `(row_key, col_key)` combination is present; combinations no source
/// row produced hold a zero vector, one slot per value column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PivotTable {
    /// Composite row keys in order of first appearance.
    pub row_keys: Vec<String>,
    /// Composite column keys in order of first appearance.
    pub col_keys: Vec<String>,
    pub value_columns: Vec<String>,
    pub table: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
}

impl PivotTable {
    pub fn cell(&self, row_key: &str, col_key: &str) -> Option<&[f64]> {
        self.table
            .get(row_key)
            .and_then(|r| r.get(col_key))
            .map(Vec::as_slice)
    }

    /// Per value column, the sum across every column key of one row.
    pub fn row_total(&self, row_key: &str) -> Vec<f64> {
        let mut total = vec![0.0; self.value_columns.len()];
        if let Some(cols) = self.table.get(row_key) {
            for cell in cols.values() {
                add_into(&mut total, cell);
            }
        }
        total
    }

    /// Per value column, the sum across every row key of one column.
    pub fn col_total(&self, col_key: &str) -> Vec<f64> {
        let mut total = vec![0.0; self.value_columns.len()];
        for cols in self.table.values() {
            if let Some(cell) = cols.get(col_key) {
                add_into(&mut total, cell);
            }
        }
        total
    }
}

fn add_into(acc: &mut [f64], cell: &[f64]) {
    for (a, v) in acc.iter_mut().zip(cell) {
        *a += v;
    }
}

fn composite_key(row: &Row, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| row.trimmed(c))
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Filter, then sum each value column into `table[row_key][col_key]`.
///
/// Cells that do not parse as numbers contribute zero.
pub fn pivot(rows: &[Row], config: &PivotConfig, filter: &FilterSpec) -> PivotTable {
    pivot_rows(&apply_filters(rows, filter), config)
}

/// Pivot over rows that have already been filtered.
pub fn pivot_rows(rows: &[&Row], config: &PivotConfig) -> PivotTable {
    let arity = config.values.len();
    let mut row_keys: Vec<String> = Vec::new();
    let mut col_keys: Vec<String> = Vec::new();
    let mut seen_rows: HashSet<String> = HashSet::new();
    let mut seen_cols: HashSet<String> = HashSet::new();
    let mut sums: HashMap<(String, String), Vec<f64>> = HashMap::new();

    for row in rows {
        let rk = composite_key(row, &config.rows);
        let ck = composite_key(row, &config.columns);
        if seen_rows.insert(rk.clone()) {
            row_keys.push(rk.clone());
        }
        if seen_cols.insert(ck.clone()) {
            col_keys.push(ck.clone());
        }
        let cell = sums.entry((rk, ck)).or_insert_with(|| vec![0.0; arity]);
        for (slot, col) in cell.iter_mut().zip(&config.values) {
            *slot += number_or_zero(row.get(col));
        }
    }

    let table = row_keys
        .iter()
        .map(|rk| {
            let cols = col_keys
                .iter()
                .map(|ck| {
                    let cell = sums
                        .remove(&(rk.clone(), ck.clone()))
                        .unwrap_or_else(|| vec![0.0; arity]);
                    (ck.clone(), cell)
                })
                .collect();
            (rk.clone(), cols)
        })
        .collect();

    PivotTable {
        row_keys,
        col_keys,
        value_columns: config.values.clone(),
        table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().copied().collect()
    }

    fn config(rows: &[&str], columns: &[&str], values: &[&str]) -> PivotConfig {
        let owned = |xs: &[&str]| -> Vec<String> { xs.iter().map(|s| s.to_string()).collect() };
        PivotConfig {
            rows: owned(rows),
            columns: owned(columns),
            values: owned(values),
        }
    }

    fn sample() -> Vec<Row> {
        vec![
            row(&[("site", "A"), ("sex", "F"), ("year", "2023"), ("n", "3"), ("cost", "1.5")]),
            row(&[("site", "A"), ("sex", "M"), ("year", "2024"), ("n", "2"), ("cost", "x")]),
            row(&[("site", "B"), ("sex", "F"), ("year", "2023"), ("n", "4"), ("cost", "")]),
            row(&[("site", "A"), ("sex", "F"), ("year", "2023"), ("n", "1"), ("cost", "0.5")]),
        ]
    }

    #[test]
    fn composite_keys_in_first_appearance_order() {
        let out = pivot(&sample(), &config(&["site", "sex"], &["year"], &["n"]), &FilterSpec::new());
        assert_eq!(out.row_keys, vec!["A|F", "A|M", "B|F"]);
        assert_eq!(out.col_keys, vec!["2023", "2024"]);
        assert_eq!(out.cell("A|F", "2023"), Some(&[4.0][..]));
    }

    #[test]
    fn unparseable_cells_add_zero() {
        let out = pivot(&sample(), &config(&["site"], &[], &["n", "cost"]), &FilterSpec::new());
        assert_eq!(out.col_keys, vec![""]);
        assert_eq!(out.cell("A", ""), Some(&[6.0, 2.0][..]));
        assert_eq!(out.cell("B", ""), Some(&[4.0, 0.0][..]));
    }

    #[test]
    fn missing_combinations_are_zero_filled() {
        let out = pivot(&sample(), &config(&["site"], &["year"], &["n", "cost"]), &FilterSpec::new());
        assert_eq!(out.cell("B", "2024"), Some(&[0.0, 0.0][..]));
        for rk in &out.row_keys {
            for ck in &out.col_keys {
                assert_eq!(out.cell(rk, ck).map(<[f64]>::len), Some(2));
            }
        }
    }

    #[test]
    fn interleaved_repeats_keep_one_key_each() {
        let rows: Vec<Row> = ["B", "A", "B", "A", "C", "B"]
            .into_iter()
            .zip(["2024", "2023", "2023", "2024", "2024", "2024"])
            .map(|(site, year)| row(&[("site", site), ("year", year), ("n", "1")]))
            .collect();
        let out = pivot(&rows, &config(&["site"], &["year"], &["n"]), &FilterSpec::new());
        assert_eq!(out.row_keys, vec!["B", "A", "C"]);
        assert_eq!(out.col_keys, vec!["2024", "2023"]);
        assert_eq!(out.cell("B", "2024"), Some(&[2.0][..]));
        assert_eq!(out.cell("C", "2023"), Some(&[0.0][..]));
    }

    #[test]
    fn margins() {
        let out = pivot(&sample(), &config(&["site"], &["year"], &["n"]), &FilterSpec::new());
        assert_eq!(out.row_total("A"), vec![6.0]);
        assert_eq!(out.col_total("2023"), vec![8.0]);
        assert_eq!(out.row_total("nope"), vec![0.0]);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let out = pivot(&[], &config(&["site"], &["year"], &["n"]), &FilterSpec::new());
        assert!(out.row_keys.is_empty());
        assert!(out.table.is_empty());
    }
}
