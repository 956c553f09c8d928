use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::filter::{apply_filters, FilterSpec};
use super::model::Row;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The two response values plotted on either side of the zero line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Categories {
    pub left: String,
    pub right: String,
}

/// One row of the diverging chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRecord {
    pub condition: String,
    /// Negated count of the left category, so its bar extends below zero.
    pub left_value: i64,
    pub right_value: i64,
    pub left_label: String,
    pub right_label: String,
    /// Rows of this condition with any response, including ones outside
    /// the two plotted categories.
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub records: Vec<ComparisonRecord>,
    pub categories: Categories,
    /// Sorted response values beyond the first two. They still count towards
    /// each record's `total` but get no bar of their own.
    pub dropped_categories: Vec<String>,
}

impl Comparison {
    /// The "needs at least two response values" state.
    pub fn empty() -> Self {
        Comparison::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tally {
    left: i64,
    right: i64,
    total: usize,
}

/// Split per-condition counts across the first two (sorted) response values.
///
/// The condition cell is used as-is; multi-valued cells are not split here.
pub fn compare(rows: &[Row], condition: &str, response: &str, filter: &FilterSpec) -> Comparison {
    compare_rows(&apply_filters(rows, filter), condition, response)
}

/// Comparison over rows that have already been filtered.
pub fn compare_rows(rows: &[&Row], condition: &str, response: &str) -> Comparison {
    let distinct: BTreeSet<&str> = rows
        .iter()
        .map(|r| r.trimmed(response))
        .filter(|v| !v.is_empty())
        .collect();
    if distinct.len() < 2 {
        return Comparison::empty();
    }

    let mut sorted = distinct.into_iter();
    let (Some(left), Some(right)) = (sorted.next(), sorted.next()) else {
        return Comparison::empty();
    };
    let dropped_categories: Vec<String> = sorted.map(str::to_string).collect();
    if !dropped_categories.is_empty() {
        log::warn!(
            "Column '{response}' has more than two values; only '{left}' and '{right}' are compared, ignoring {dropped_categories:?}"
        );
    }

    let mut order: Vec<&str> = Vec::new();
    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for row in rows {
        let cond = row.trimmed(condition);
        let resp = row.trimmed(response);
        if cond.is_empty() || resp.is_empty() {
            continue;
        }
        let tally = tallies.entry(cond).or_insert_with(|| {
            order.push(cond);
            Tally::default()
        });
        tally.total += 1;
        if resp == left {
            tally.left += 1;
        } else if resp == right {
            tally.right += 1;
        }
    }

    let mut records: Vec<ComparisonRecord> = order
        .into_iter()
        .filter_map(|cond| {
            let t = tallies.remove(cond)?;
            Some(ComparisonRecord {
                condition: cond.to_string(),
                left_value: -t.left,
                right_value: t.right,
                left_label: left.to_string(),
                right_label: right.to_string(),
                total: t.total,
            })
        })
        .collect();
    records.sort_by(|a, b| b.total.cmp(&a.total));

    Comparison {
        records,
        categories: Categories {
            left: left.to_string(),
            right: right.to_string(),
        },
        dropped_categories,
    }
}
