use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::data::aggregate::{aggregate_rows, numeric_measures, AggregateRecord, GroupOptions};
use crate::data::compare::{compare_rows, Comparison};
use crate::data::filter::{apply_filters, filter_options, FilterSpec, TextFilter};
use crate::data::loader::{load_file, LIKERT_TEMPLATE_COLUMNS};
use crate::data::model::{parse_number, Table};
use crate::data::pivot::{pivot_rows, PivotConfig, PivotTable};
use crate::error::{EngineError, LoadError};
use crate::schedule::Debouncer;
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Selection – everything the user picked, as one snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ChartKind {
    /// Stacked bars per condition, ranked by the first measure.
    #[default]
    Likert,
    /// Two response values back to back around zero.
    Diverging,
    Pivot,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Likert, ChartKind::Diverging, ChartKind::Pivot];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Likert => "Likert",
            ChartKind::Diverging => "Comparison",
            ChartKind::Pivot => "Pivot table",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub kind: ChartKind,
    pub condition: Option<String>,
    pub measures: Vec<String>,
    pub response: Option<String>,
    pub pivot: PivotConfig,
    pub filters: FilterSpec,
    /// Free-text search on the condition column (Likert only).
    pub search: String,
}

impl Selection {
    /// Sensible first chart for a freshly loaded table: group by the first
    /// column, measure every other column whose first value is numeric.
    pub fn initial(table: &Table) -> Self {
        let condition = table.headers.first().cloned();
        let measures = table
            .headers
            .iter()
            .skip(1)
            .filter(|h| {
                table
                    .rows
                    .first()
                    .is_some_and(|r| parse_number(r.get(h)).is_some())
            })
            .cloned()
            .collect();
        Selection {
            condition,
            measures,
            ..Selection::default()
        }
    }

    /// Columns used as chart axes; they are not offered as filters.
    pub fn axis_columns(&self) -> Vec<&str> {
        match self.kind {
            ChartKind::Likert => self.condition.as_deref().into_iter().collect(),
            ChartKind::Diverging => self
                .condition
                .as_deref()
                .into_iter()
                .chain(self.response.as_deref())
                .collect(),
            ChartKind::Pivot => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Immutable snapshot handed to the chart widgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum ChartResult {
    Likert(Vec<AggregateRecord>),
    Diverging(Comparison),
    Pivot(PivotTable),
}

fn require_column(table: &Table, column: &str) -> Result<(), EngineError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(EngineError::UnknownColumn(column.to_string()))
    }
}

/// Run the aggregation `selection` asks for.
pub fn run(table: &Table, selection: &Selection, options: &GroupOptions) -> Result<ChartResult, EngineError> {
    for column in selection.filters.keys() {
        require_column(table, column)?;
    }
    let filtered = apply_filters(&table.rows, &selection.filters);

    match selection.kind {
        ChartKind::Likert => {
            let condition = selection
                .condition
                .as_deref()
                .ok_or(EngineError::MissingSelection("condition"))?;
            require_column(table, condition)?;
            for m in &selection.measures {
                require_column(table, m)?;
            }
            let rows = TextFilter::new(&selection.search).apply(filtered, condition);
            let numeric = numeric_measures(&table.rows, &selection.measures, options.numeric_detection);
            Ok(ChartResult::Likert(aggregate_rows(
                &rows,
                condition,
                &selection.measures,
                &numeric,
                options,
            )))
        }
        ChartKind::Diverging => {
            let condition = selection
                .condition
                .as_deref()
                .ok_or(EngineError::MissingSelection("condition"))?;
            let response = selection
                .response
                .as_deref()
                .ok_or(EngineError::MissingSelection("response"))?;
            require_column(table, condition)?;
            require_column(table, response)?;
            Ok(ChartResult::Diverging(compare_rows(&filtered, condition, response)))
        }
        ChartKind::Pivot => {
            let config = &selection.pivot;
            if config.rows.is_empty() {
                return Err(EngineError::MissingSelection("pivot row"));
            }
            for column in config.rows.iter().chain(&config.columns).chain(&config.values) {
                require_column(table, column)?;
            }
            Ok(ChartResult::Pivot(pivot_rows(&filtered, config)))
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct DashboardState {
    /// Loaded table (None until the user opens a file).
    pub table: Option<Table>,

    /// Where the table came from.
    pub source: Option<PathBuf>,

    /// Current chart kind, axis columns and filters.
    pub selection: Selection,

    /// Checklist values per filterable column.
    pub filter_options: BTreeMap<String, Vec<String>>,

    /// Last successfully computed chart.
    pub result: Option<ChartResult>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    pub settings: Settings,

    options: GroupOptions,
    pending: Debouncer<Selection>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl DashboardState {
    pub fn new(settings: Settings) -> Self {
        Self {
            table: None,
            source: None,
            selection: Selection::default(),
            filter_options: BTreeMap::new(),
            result: None,
            status_message: None,
            options: settings.group_options(),
            pending: Debouncer::new(settings.debounce()),
            settings,
        }
    }

    /// Read and parse `path`. On failure the current table stays as it was.
    pub fn load_path(&mut self, path: &Path) {
        let loaded = load_file(path).and_then(|table| {
            if self.settings.require_template_columns {
                table.require_columns(&LIKERT_TEMPLATE_COLUMNS)?;
            }
            Ok(table)
        });
        match loaded {
            Ok(table) => self.set_table(table, Some(path.to_path_buf())),
            Err(e) => self.report_load_error(&e),
        }
    }

    pub fn report_load_error(&mut self, e: &LoadError) {
        log::error!("Failed to load file: {e}");
        self.status_message = Some(format!("Error: {e}"));
    }

    /// Ingest a newly loaded table, pick default columns and draw right away.
    pub fn set_table(&mut self, table: Table, source: Option<PathBuf>) {
        let kind = self.selection.kind;
        self.selection = Selection {
            kind,
            ..Selection::initial(&table)
        };
        self.table = Some(table);
        self.source = source;
        self.result = None;
        self.status_message = None;
        self.pending.cancel();
        self.refresh_filter_options();
        let selection = self.selection.clone();
        self.recompute(&selection);
    }

    /// Rebuild the checklists for the current axis columns and drop filters
    /// on columns that are no longer offered.
    pub fn refresh_filter_options(&mut self) {
        let Some(table) = &self.table else {
            self.filter_options.clear();
            return;
        };
        self.filter_options = filter_options(table, &self.selection.axis_columns());
        let offered = &self.filter_options;
        self.selection.filters.retain(|col, _| offered.contains_key(col));
    }

    /// Call after any edit to `selection`; the recompute runs once the
    /// selection has been stable for the configured quiet period.
    pub fn selection_changed(&mut self, now: Instant) {
        self.refresh_filter_options();
        self.pending.schedule(self.selection.clone(), now);
    }

    /// Toggle a single value in a column's allow-set.
    pub fn toggle_filter_value(&mut self, column: &str, value: &str, now: Instant) {
        let allowed = self.selection.filters.entry(column.to_string()).or_default();
        if !allowed.remove(value) {
            allowed.insert(value.to_string());
        }
        if allowed.is_empty() {
            self.selection.filters.remove(column);
        }
        self.selection_changed(now);
    }

    /// Remove every constraint on a column.
    pub fn clear_filter(&mut self, column: &str, now: Instant) {
        if self.selection.filters.remove(column).is_some() {
            self.selection_changed(now);
        }
    }

    /// Run a due recompute, if any. Returns how long until the next one is
    /// due so the caller can schedule a repaint.
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        if let Some(selection) = self.pending.poll(now) {
            self.recompute(&selection);
        }
        self.pending.time_until_due(now)
    }

    /// Recompute immediately. Failures keep the previous chart on screen.
    pub fn recompute(&mut self, selection: &Selection) {
        let Some(table) = &self.table else {
            return;
        };
        match run(table, selection, &self.options) {
            Ok(result) => {
                log::debug!("Recomputed {:?}: {}", selection.kind, describe(&result));
                self.result = Some(result);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Processing error: {e}");
                self.status_message = Some(format!("Processing error: {e}"));
            }
        }
    }

    /// Current chart as pretty JSON, for export.
    pub fn result_json(&self) -> serde_json::Result<Option<String>> {
        self.result
            .as_ref()
            .map(serde_json::to_string_pretty)
            .transpose()
    }
}

fn describe(result: &ChartResult) -> String {
    match result {
        ChartResult::Likert(records) => format!("{} groups", records.len()),
        ChartResult::Diverging(c) => format!("{} conditions", c.records.len()),
        ChartResult::Pivot(p) => format!("{}x{} cells", p.row_keys.len(), p.col_keys.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{parse, template_csv, FileFormat};

    fn survey() -> Table {
        let text = "\
cond,resp,site,score
\"Asthma, Flu\",Yes,A,4
Asthma,No,B,2
Flu,Yes,A,5
";
        parse(text.as_bytes(), FileFormat::Csv).unwrap()
    }

    fn loaded(table: Table) -> DashboardState {
        let mut state = DashboardState::default();
        state.set_table(table, None);
        state
    }

    #[test]
    fn template_gets_a_likert_chart_on_load() {
        let state = loaded(parse(template_csv().as_bytes(), FileFormat::Csv).unwrap());
        assert_eq!(state.selection.condition.as_deref(), Some("id"));
        assert_eq!(state.selection.measures.len(), 4);
        let Some(ChartResult::Likert(records)) = &state.result else {
            panic!("expected a likert result, got {:?}", state.result);
        };
        assert_eq!(records.len(), 4);
        // ranked by stronglyDisagree
        assert_eq!(records[0].condition, "STAQ002");
        assert_eq!(records[0].value("stronglyDisagree"), Some(47.0));
    }

    #[test]
    fn recompute_waits_for_the_quiet_period() {
        let mut state = loaded(survey());
        let start = Instant::now();
        state.selection.kind = ChartKind::Diverging;
        state.selection.response = Some("resp".into());
        state.selection_changed(start);

        assert!(matches!(state.result, Some(ChartResult::Likert(_))));
        assert_eq!(state.tick(start), Some(Duration::from_millis(300)));
        assert_eq!(state.tick(start + Duration::from_millis(300)), None);
        let Some(ChartResult::Diverging(c)) = &state.result else {
            panic!("expected a comparison");
        };
        assert_eq!(c.categories.left, "No");
        assert_eq!(c.categories.right, "Yes");
    }

    #[test]
    fn failed_recompute_keeps_previous_chart() {
        let mut state = loaded(survey());
        let before = state.result.clone();
        assert!(before.is_some());

        let mut broken = state.selection.clone();
        broken.condition = Some("nope".into());
        state.recompute(&broken);
        assert_eq!(state.result, before);
        assert_eq!(
            state.status_message.as_deref(),
            Some("Processing error: Unknown column: nope")
        );
    }

    #[test]
    fn axis_columns_are_not_filterable() {
        let mut state = loaded(survey());
        assert!(!state.filter_options.contains_key("cond"));
        assert!(state.filter_options.contains_key("resp"));

        let now = Instant::now();
        state.toggle_filter_value("resp", "Yes", now);
        assert!(state.selection.filters.contains_key("resp"));

        state.selection.kind = ChartKind::Diverging;
        state.selection.response = Some("resp".into());
        state.selection_changed(now);
        assert!(!state.filter_options.contains_key("resp"));
        assert!(!state.selection.filters.contains_key("resp"));
    }

    #[test]
    fn toggling_a_value_twice_removes_the_constraint() {
        let mut state = loaded(survey());
        let now = Instant::now();
        state.toggle_filter_value("site", "A", now);
        assert_eq!(state.selection.filters["site"].len(), 1);
        state.toggle_filter_value("site", "A", now);
        assert!(!state.selection.filters.contains_key("site"));
    }

    #[test]
    fn search_narrows_likert_conditions() {
        let table = survey();
        let selection = Selection {
            search: "FLU".into(),
            ..Selection::initial(&table)
        };
        let result = run(&table, &selection, &GroupOptions::default()).unwrap();
        let ChartResult::Likert(records) = result else {
            panic!("expected likert");
        };
        // the "Asthma, Flu" row still contributes to both of its tokens
        let names: Vec<&str> = records.iter().map(|r| r.condition.as_str()).collect();
        assert_eq!(names, vec!["Flu", "Asthma"]);
        assert_eq!(records[1].total, 1);
    }

    #[test]
    fn pivot_needs_a_row_column() {
        let table = survey();
        let selection = Selection {
            kind: ChartKind::Pivot,
            ..Selection::default()
        };
        assert_eq!(
            run(&table, &selection, &GroupOptions::default()),
            Err(EngineError::MissingSelection("pivot row"))
        );
    }

    #[test]
    fn missing_file_leaves_table_untouched() {
        let mut state = loaded(survey());
        state.load_path(Path::new("/definitely/not/here.csv"));
        assert!(state.table.is_some());
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Error: Could not read")));
    }

    #[test]
    fn export_is_tagged_json() {
        let state = loaded(survey());
        let json = state.result_json().unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "likert");
        assert!(value["data"].is_array());
    }
}
