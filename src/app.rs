use std::path::Path;
use std::time::Instant;

use eframe::egui;

use rusty_likert::settings::Settings;
use rusty_likert::state::DashboardState;

use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyLikertApp {
    pub state: DashboardState,
}

impl RustyLikertApp {
    pub fn new(settings: Settings, initial_file: Option<&Path>) -> Self {
        let mut state = DashboardState::new(settings);
        if let Some(path) = initial_file {
            state.load_path(path);
        }
        Self { state }
    }
}

impl eframe::App for RustyLikertApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Run a debounced recompute if one is due; wake up again when the
        // next one will be.
        if let Some(wait) = self.state.tick(Instant::now()) {
            ctx.request_repaint_after(wait);
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: columns and filters ----
        egui::SidePanel::left("selection_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: chart ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::chart(ui, &self.state);
        });
    }
}
