use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::filter::{apply_filters, FilterSpec};
use super::model::{parse_number, Row};

/// Default number of ranked groups handed to the chart.
pub const DEFAULT_TOP_N: usize = 20;

/// Separator between the values of a multi-valued condition cell.
pub const DEFAULT_CONDITION_DELIMITER: &str = ", ";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How a measure column is classified as numeric (mean) or categorical
/// (percentage of rows with a value).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumericDetection {
    /// Look only at the first input row's cell.
    #[default]
    FirstRow,
    /// Numeric when more than half of the non-empty cells parse as numbers.
    Majority,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupOptions {
    /// Split condition cells on `delimiter` so one row joins several groups.
    pub split_multi_valued: bool,
    pub delimiter: String,
    pub numeric_detection: NumericDetection,
    /// Keep at most this many groups after ranking. `None` keeps all.
    pub limit: Option<usize>,
}

impl Default for GroupOptions {
    fn default() -> Self {
        GroupOptions {
            split_multi_valued: true,
            delimiter: DEFAULT_CONDITION_DELIMITER.to_string(),
            numeric_detection: NumericDetection::default(),
            limit: Some(DEFAULT_TOP_N),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureValue {
    pub column: String,
    /// Mean for numeric measures, percentage (0–100) for categorical ones.
    pub value: f64,
}

/// One bar of the stacked chart: a condition and its derived measures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRecord {
    pub condition: String,
    /// One entry per requested measure, in request order.
    pub measures: Vec<MeasureValue>,
    /// Rows that contributed to this condition.
    pub total: usize,
}

impl AggregateRecord {
    pub fn value(&self, measure: &str) -> Option<f64> {
        self.measures
            .iter()
            .find(|m| m.column == measure)
            .map(|m| m.value)
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Accumulator {
    total: usize,
    sums: Vec<f64>,
    counts: Vec<usize>,
}

/// Decide, per measure column, whether it should be averaged.
pub fn numeric_measures(rows: &[Row], measures: &[String], detection: NumericDetection) -> Vec<bool> {
    measures
        .iter()
        .map(|m| match detection {
            NumericDetection::FirstRow => rows
                .first()
                .is_some_and(|r| parse_number(r.get(m)).is_some()),
            NumericDetection::Majority => {
                let (numeric, filled) = rows
                    .iter()
                    .map(|r| r.trimmed(m))
                    .filter(|v| !v.is_empty())
                    .fold((0usize, 0usize), |(n, f), v| {
                        (n + usize::from(parse_number(v).is_some()), f + 1)
                    });
                numeric * 2 > filled
            }
        })
        .collect()
}

/// Group `rows` by `condition` and derive one value per measure.
///
/// Rows are filtered first. Each condition token of a row counts that row
/// once. Numeric cells feed a running sum, other non-empty cells a running
/// count; the column's classification picks which one is reported. Results
/// are ranked by the first measure, descending, with ties kept in order of
/// first appearance, then cut to `options.limit`.
pub fn aggregate(
    rows: &[Row],
    condition: &str,
    measures: &[String],
    filter: &FilterSpec,
    options: &GroupOptions,
) -> Vec<AggregateRecord> {
    let numeric = numeric_measures(rows, measures, options.numeric_detection);
    aggregate_rows(&apply_filters(rows, filter), condition, measures, &numeric, options)
}

/// Aggregation over rows that have already been filtered.
///
/// `numeric` holds one classification per measure, usually computed by
/// [`numeric_measures`] over the unfiltered dataset.
pub fn aggregate_rows(
    rows: &[&Row],
    condition: &str,
    measures: &[String],
    numeric: &[bool],
    options: &GroupOptions,
) -> Vec<AggregateRecord> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Accumulator> = HashMap::new();

    for row in rows {
        let raw = row.trimmed(condition);
        if raw.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = if options.split_multi_valued && !options.delimiter.is_empty() {
            raw.split(options.delimiter.as_str())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect()
        } else {
            vec![raw]
        };

        for token in tokens {
            let acc = groups.entry(token.to_string()).or_insert_with(|| {
                order.push(token.to_string());
                Accumulator {
                    total: 0,
                    sums: vec![0.0; measures.len()],
                    counts: vec![0; measures.len()],
                }
            });
            acc.total += 1;
            for (i, m) in measures.iter().enumerate() {
                let cell = row.trimmed(m);
                match parse_number(cell) {
                    Some(v) => acc.sums[i] += v,
                    None if !cell.is_empty() => acc.counts[i] += 1,
                    None => {}
                }
            }
        }
    }

    let mut records: Vec<AggregateRecord> = order
        .into_iter()
        .filter_map(|cond| {
            let acc = groups.remove(&cond)?;
            let measures = measures
                .iter()
                .enumerate()
                .map(|(i, m)| MeasureValue {
                    column: m.clone(),
                    value: derive(&acc, i, numeric.get(i).copied().unwrap_or(false)),
                })
                .collect();
            Some(AggregateRecord {
                condition: cond,
                measures,
                total: acc.total,
            })
        })
        .collect();

    // sort_by is stable, so equal values keep first-appearance order
    records.sort_by(|a, b| {
        let va = a.measures.first().map_or(0.0, |m| m.value);
        let vb = b.measures.first().map_or(0.0, |m| m.value);
        vb.total_cmp(&va)
    });
    if let Some(limit) = options.limit {
        records.truncate(limit);
    }
    records
}

fn derive(acc: &Accumulator, measure: usize, numeric: bool) -> f64 {
    if acc.total == 0 {
        return 0.0;
    }
    let total = acc.total as f64;
    if numeric {
        acc.sums[measure] / total
    } else {
        acc.counts[measure] as f64 / total * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs.iter().copied().collect()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn multi_valued_condition_joins_every_group() {
        let rows = vec![
            row(&[("cond", "A, B"), ("score", "4")]),
            row(&[("cond", "A"), ("score", "2")]),
        ];
        let out = aggregate(&rows, "cond", &cols(&["score"]), &FilterSpec::new(), &GroupOptions::default());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].condition, "B");
        assert_eq!(out[0].total, 1);
        assert_eq!(out[0].value("score"), Some(4.0));
        assert_eq!(out[1].condition, "A");
        assert_eq!(out[1].total, 2);
        assert_eq!(out[1].value("score"), Some(3.0));
    }

    #[test]
    fn splitting_can_be_disabled() {
        let rows = vec![row(&[("cond", "A, B"), ("score", "4")])];
        let options = GroupOptions {
            split_multi_valued: false,
            ..GroupOptions::default()
        };
        let out = aggregate(&rows, "cond", &cols(&["score"]), &FilterSpec::new(), &options);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].condition, "A, B");
    }

    #[test]
    fn categorical_measure_reports_percentage_of_filled_rows() {
        let rows = vec![
            row(&[("cond", "X"), ("smoker", "yes")]),
            row(&[("cond", "X"), ("smoker", "")]),
            row(&[("cond", "X"), ("smoker", "no")]),
            row(&[("cond", "X"), ("smoker", "")]),
        ];
        let out = aggregate(&rows, "cond", &cols(&["smoker"]), &FilterSpec::new(), &GroupOptions::default());
        assert_eq!(out[0].total, 4);
        assert_eq!(out[0].value("smoker"), Some(50.0));
    }

    #[test]
    fn first_row_decides_numeric_ness() {
        // the first cell is text, so the column is treated as categorical
        let rows = vec![
            row(&[("cond", "X"), ("dose", "n/a")]),
            row(&[("cond", "X"), ("dose", "10")]),
            row(&[("cond", "X"), ("dose", "20")]),
        ];
        let measures = cols(&["dose"]);
        assert_eq!(numeric_measures(&rows, &measures, NumericDetection::FirstRow), vec![false]);
        assert_eq!(numeric_measures(&rows, &measures, NumericDetection::Majority), vec![true]);

        let out = aggregate(&rows, "cond", &measures, &FilterSpec::new(), &GroupOptions::default());
        let pct = out[0].value("dose").unwrap();
        assert!((pct - 100.0 / 3.0).abs() < 1e-9);

        let majority = GroupOptions {
            numeric_detection: NumericDetection::Majority,
            ..GroupOptions::default()
        };
        let out = aggregate(&rows, "cond", &measures, &FilterSpec::new(), &majority);
        assert_eq!(out[0].value("dose"), Some(10.0));
    }

    #[test]
    fn empty_conditions_are_skipped() {
        let rows = vec![
            row(&[("cond", ""), ("score", "4")]),
            row(&[("cond", "  "), ("score", "4")]),
        ];
        let out = aggregate(&rows, "cond", &cols(&["score"]), &FilterSpec::new(), &GroupOptions::default());
        assert!(out.is_empty());
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        let rows = vec![
            row(&[("cond", "C"), ("score", "1")]),
            row(&[("cond", "A"), ("score", "5")]),
            row(&[("cond", "B"), ("score", "1")]),
        ];
        let out = aggregate(&rows, "cond", &cols(&["score"]), &FilterSpec::new(), &GroupOptions::default());
        let names: Vec<&str> = out.iter().map(|r| r.condition.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "B"]);
    }

    #[test]
    fn ranking_is_cut_to_the_limit() {
        let rows: Vec<Row> = (0..25)
            .map(|i| {
                let cond = format!("c{i}");
                let score = i.to_string();
                row(&[("cond", cond.as_str()), ("score", score.as_str())])
            })
            .collect();
        let out = aggregate(&rows, "cond", &cols(&["score"]), &FilterSpec::new(), &GroupOptions::default());
        assert_eq!(out.len(), DEFAULT_TOP_N);
        assert_eq!(out[0].condition, "c24");

        let unlimited = GroupOptions {
            limit: None,
            ..GroupOptions::default()
        };
        let out = aggregate(&rows, "cond", &cols(&["score"]), &FilterSpec::new(), &unlimited);
        assert_eq!(out.len(), 25);
    }

    #[test]
    fn no_measures_keeps_appearance_order() {
        let rows = vec![row(&[("cond", "B")]), row(&[("cond", "A")])];
        let out = aggregate(&rows, "cond", &[], &FilterSpec::new(), &GroupOptions::default());
        assert_eq!(out[0].condition, "B");
        assert!(out[0].measures.is_empty());
    }
}
