use std::collections::{BTreeMap, BTreeSet};

use super::model::{Row, Table};

// ---------------------------------------------------------------------------
// Filter predicate: which values are allowed per column
// ---------------------------------------------------------------------------

/// Per-column allow-sets: maps column_name → set of permitted values.
/// If a column is absent or its set is empty, it imposes no constraint.
pub type FilterSpec = BTreeMap<String, BTreeSet<String>>;

/// Whether `row` satisfies every non-empty allow-set in `spec`.
///
/// Matching is exact on the trimmed cell text; no case folding.
pub fn matches(row: &Row, spec: &FilterSpec) -> bool {
    spec.iter()
        .filter(|(_, allowed)| !allowed.is_empty())
        .all(|(col, allowed)| allowed.contains(row.trimmed(col)))
}

/// Keep the rows that pass all active filters, in their original order.
pub fn apply_filters<'a, I>(rows: I, spec: &FilterSpec) -> Vec<&'a Row>
where
    I: IntoIterator<Item = &'a Row>,
{
    rows.into_iter().filter(|r| matches(r, spec)).collect()
}

// ---------------------------------------------------------------------------
// Free-text filter on the condition column
// ---------------------------------------------------------------------------

/// Case-insensitive substring match on one column, typed into a search box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFilter {
    needle: String,
}

impl TextFilter {
    pub fn new(text: &str) -> Self {
        TextFilter {
            needle: text.trim().to_lowercase(),
        }
    }

    /// An empty search matches everything.
    pub fn is_active(&self) -> bool {
        !self.needle.is_empty()
    }

    pub fn matches(&self, value: &str) -> bool {
        !self.is_active() || value.to_lowercase().contains(&self.needle)
    }

    pub fn apply<'a>(&self, rows: Vec<&'a Row>, column: &str) -> Vec<&'a Row> {
        if !self.is_active() {
            return rows;
        }
        rows.into_iter()
            .filter(|r| self.matches(r.get(column)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Filter option discovery
// ---------------------------------------------------------------------------

/// Distinct values per column for populating filter checklists.
///
/// Columns listed in `exclude` (typically the ones already used as chart
/// axes) and columns with fewer than two distinct values are left out: there
/// is nothing to choose between.
pub fn filter_options(table: &Table, exclude: &[&str]) -> BTreeMap<String, Vec<String>> {
    table
        .headers
        .iter()
        .filter(|h| !exclude.contains(&h.as_str()))
        .filter_map(|h| {
            let values = table.unique_values(h);
            (values.len() >= 2).then(|| (h.clone(), values.into_iter().collect()))
        })
        .collect()
}
