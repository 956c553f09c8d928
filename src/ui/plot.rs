use std::ops::RangeInclusive;

use eframe::egui::{Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot, VLine};

use rusty_likert::data::aggregate::AggregateRecord;
use rusty_likert::data::compare::Comparison;
use rusty_likert::data::pivot::PivotTable;
use rusty_likert::state::{ChartResult, DashboardState};

use crate::color::{likert_palette, SeriesColors};

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the current chart snapshot in the central panel.
pub fn chart(ui: &mut Ui, state: &DashboardState) {
    if state.table.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to start  (File → Open…)");
        });
        return;
    }

    match &state.result {
        None => {
            ui.label("Choose columns in the side panel to draw a chart.");
        }
        Some(ChartResult::Likert(records)) => likert_chart(ui, records),
        Some(ChartResult::Diverging(comparison)) => diverging_chart(ui, comparison),
        Some(ChartResult::Pivot(table)) => pivot_table(ui, table),
    }
}

/// Tick labels for a categorical axis: `labels[i]` at position `i`.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Likert: stacked horizontal bars, best-ranked condition on top
// ---------------------------------------------------------------------------

fn likert_chart(ui: &mut Ui, records: &[AggregateRecord]) {
    let Some(first) = records.first() else {
        ui.label("No rows match the current filters.");
        return;
    };
    let measures: Vec<&str> = first.measures.iter().map(|m| m.column.as_str()).collect();
    let colors = likert_palette(measures.len());
    let n = records.len();

    // bar position n-1-i holds record i
    let labels: Vec<String> = records.iter().rev().map(|r| r.condition.clone()).collect();

    let mut charts: Vec<BarChart> = Vec::with_capacity(measures.len());
    for (j, (measure, color)) in measures.iter().zip(colors).enumerate() {
        let bars: Vec<Bar> = records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let value = r.measures.get(j).map_or(0.0, |m| m.value);
                Bar::new((n - 1 - i) as f64, value)
                    .name(format!("{} (n={})", r.condition, r.total))
            })
            .collect();
        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars)
            .name(measure)
            .color(color)
            .width(0.7)
            .horizontal()
            .stack_on(&below);
        charts.push(chart);
    }

    Plot::new("likert_plot")
        .legend(Legend::default())
        .y_axis_formatter(category_axis(labels))
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Diverging: left category below zero, right category above
// ---------------------------------------------------------------------------

fn diverging_chart(ui: &mut Ui, comparison: &Comparison) {
    if comparison.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("The response column needs at least two different values.");
        });
        return;
    }
    if !comparison.dropped_categories.is_empty() {
        ui.label(
            RichText::new(format!(
                "Only the first two responses are compared; ignoring {}",
                comparison.dropped_categories.join(", ")
            ))
            .color(Color32::YELLOW),
        );
    }

    let left = comparison.categories.left.as_str();
    let right = comparison.categories.right.as_str();
    let colors = SeriesColors::pair(left, right);
    let n = comparison.records.len();
    let labels: Vec<String> = comparison
        .records
        .iter()
        .rev()
        .map(|r| r.condition.clone())
        .collect();

    let side = |label: &str, pick: fn(i64, i64) -> i64| {
        let bars: Vec<Bar> = comparison
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                Bar::new((n - 1 - i) as f64, pick(r.left_value, r.right_value) as f64)
                    .name(format!("{} (total {})", r.condition, r.total))
            })
            .collect();
        BarChart::new(bars)
            .name(label)
            .color(colors.color_for(label))
            .width(0.7)
            .horizontal()
    };
    let left_chart = side(left, |l, _| l);
    let right_chart = side(right, |_, r| r);

    Plot::new("diverging_plot")
        .legend(Legend::default())
        .y_axis_formatter(category_axis(labels))
        .x_axis_formatter(|mark, _range| format!("{}", mark.value.abs()))
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(left_chart);
            plot_ui.bar_chart(right_chart);
            plot_ui.vline(VLine::new(0.0).color(Color32::GRAY));
        });
}

// ---------------------------------------------------------------------------
// Pivot table with row and column totals
// ---------------------------------------------------------------------------

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn pivot_table(ui: &mut Ui, table: &PivotTable) {
    if table.row_keys.is_empty() {
        ui.label("No rows match the current filters.");
        return;
    }
    let values = &table.value_columns;
    let n_cols = (table.col_keys.len() + 1) * values.len();

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(120.0))
            .columns(Column::auto().at_least(60.0), n_cols)
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Row");
                });
                for ck in &table.col_keys {
                    for v in values {
                        header.col(|ui| {
                            ui.strong(format!("{ck} · {v}"));
                        });
                    }
                }
                for v in values {
                    header.col(|ui| {
                        ui.strong(format!("Total · {v}"));
                    });
                }
            })
            .body(|mut body| {
                for rk in &table.row_keys {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(rk.as_str());
                        });
                        for ck in &table.col_keys {
                            for v in table.cell(rk, ck).unwrap_or_default() {
                                row.col(|ui| {
                                    ui.label(format_number(*v));
                                });
                            }
                        }
                        for v in table.row_total(rk) {
                            row.col(|ui| {
                                ui.strong(format_number(v));
                            });
                        }
                    });
                }
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.strong("Total");
                    });
                    for ck in &table.col_keys {
                        for v in table.col_total(ck) {
                            row.col(|ui| {
                                ui.strong(format_number(v));
                            });
                        }
                    }
                    let grand: Vec<f64> = (0..values.len())
                        .map(|i| table.row_keys.iter().map(|rk| table.row_total(rk)[i]).sum())
                        .collect();
                    for v in grand {
                        row.col(|ui| {
                            ui.strong(format_number(v));
                        });
                    }
                });
            });
    });
}
