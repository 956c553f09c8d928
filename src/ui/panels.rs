use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use rusty_likert::data::loader::template_csv;
use rusty_likert::state::{ChartKind, DashboardState};

// ---------------------------------------------------------------------------
// Left side panel – column pickers and filter widgets
// ---------------------------------------------------------------------------

/// Render the left selection / filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut DashboardState) {
    ui.heading("Chart");
    ui.separator();

    let Some(table) = &state.table else {
        ui.label("No dataset loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let columns = table.headers.clone();
    let options = state.filter_options.clone();
    let mut changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                for kind in ChartKind::ALL {
                    changed |= ui
                        .selectable_value(&mut state.selection.kind, kind, kind.label())
                        .changed();
                }
            });
            ui.separator();

            let selection = &mut state.selection;
            match selection.kind {
                ChartKind::Likert => {
                    changed |= column_combo(ui, "condition", "Group by", &columns, &mut selection.condition);

                    ui.strong("Measures");
                    let condition = selection.condition.clone();
                    let candidates: Vec<String> = columns
                        .iter()
                        .filter(|c| condition.as_ref() != Some(*c))
                        .cloned()
                        .collect();
                    changed |= column_checklist(ui, &candidates, &mut selection.measures);

                    ui.strong("Search groups");
                    changed |= ui.text_edit_singleline(&mut selection.search).changed();
                }
                ChartKind::Diverging => {
                    changed |= column_combo(ui, "condition", "Condition", &columns, &mut selection.condition);
                    changed |= column_combo(ui, "response", "Response (two values)", &columns, &mut selection.response);
                }
                ChartKind::Pivot => {
                    egui::CollapsingHeader::new(RichText::new("Rows").strong())
                        .default_open(true)
                        .show(ui, |ui: &mut Ui| {
                            changed |= column_checklist(ui, &columns, &mut selection.pivot.rows);
                        });
                    egui::CollapsingHeader::new(RichText::new("Columns").strong())
                        .default_open(true)
                        .show(ui, |ui: &mut Ui| {
                            changed |= column_checklist(ui, &columns, &mut selection.pivot.columns);
                        });
                    egui::CollapsingHeader::new(RichText::new("Values (summed)").strong())
                        .default_open(true)
                        .show(ui, |ui: &mut Ui| {
                            changed |= column_checklist(ui, &columns, &mut selection.pivot.values);
                        });
                }
            }

            ui.add_space(8.0);
            ui.heading("Filters");
            ui.separator();

            // ---- Per-column filter widgets (collapsible) ----
            let now = Instant::now();
            for (col, values) in &options {
                let n_selected = state.selection.filters.get(col).map_or(0, |s| s.len());
                let header_text = if n_selected == 0 {
                    format!("{col}  (all)")
                } else {
                    format!("{col}  ({n_selected}/{})", values.len())
                };

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        if ui.small_button("Clear").clicked() {
                            state.clear_filter(col, now);
                        }
                        for val in values {
                            let mut checked = state
                                .selection
                                .filters
                                .get(col)
                                .is_some_and(|s| s.contains(val));
                            if ui.checkbox(&mut checked, val.as_str()).changed() {
                                state.toggle_filter_value(col, val, now);
                            }
                        }
                    });
            }
        });

    if changed {
        state.selection_changed(Instant::now());
    }
}

/// Single column picker. Returns true when the choice changed.
fn column_combo(
    ui: &mut Ui,
    id: &str,
    label: &str,
    columns: &[String],
    current: &mut Option<String>,
) -> bool {
    let mut changed = false;
    ui.strong(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.as_deref().unwrap_or("–"))
        .show_ui(ui, |ui: &mut Ui| {
            for col in columns {
                let is_current = current.as_deref() == Some(col.as_str());
                if ui.selectable_label(is_current, col.as_str()).clicked() && !is_current {
                    *current = Some(col.clone());
                    changed = true;
                }
            }
        });
    changed
}

/// Multi column picker; keeps columns in the order they were ticked.
fn column_checklist(ui: &mut Ui, columns: &[String], selected: &mut Vec<String>) -> bool {
    let mut changed = false;
    for col in columns {
        let mut checked = selected.contains(col);
        if ui.checkbox(&mut checked, col.as_str()).changed() {
            if checked {
                selected.push(col.clone());
            } else {
                selected.retain(|c| c != col);
            }
            changed = true;
        }
    }
    changed
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut DashboardState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Save template…").clicked() {
                let outcome = save_template();
                report(state, "template", outcome);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.result.is_some(), egui::Button::new("Export result…"))
                .clicked()
            {
                let outcome = export_result(state);
                report(state, "result", outcome);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            let name = state
                .source
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{name}  {} rows, {} columns",
                table.len(),
                table.headers.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut DashboardState) {
    let file = rfd::FileDialog::new()
        .set_title("Open survey data")
        .add_filter("Supported files", &["csv", "xlsx", "xlsm", "xls", "xlsb", "ods", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Spreadsheet", &["xlsx", "xlsm", "xls", "xlsb", "ods"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

fn save_template() -> Result<Option<PathBuf>> {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Save Likert template")
        .set_file_name("likert_template.csv")
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return Ok(None);
    };
    std::fs::write(&path, template_csv())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(Some(path))
}

fn export_result(state: &DashboardState) -> Result<Option<PathBuf>> {
    let Some(json) = state.result_json().context("serialising result")? else {
        return Ok(None);
    };
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export chart data")
        .set_file_name("chart.json")
        .add_filter("JSON", &["json"])
        .save_file()
    else {
        return Ok(None);
    };
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(Some(path))
}

fn report(state: &mut DashboardState, what: &str, outcome: Result<Option<PathBuf>>) {
    match outcome {
        Ok(Some(path)) => log::info!("Saved {what} to {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            log::error!("Failed to save {what}: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
