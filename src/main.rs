mod app;
mod color;
mod ui;

use std::path::PathBuf;

use app::RustyLikertApp;
use eframe::egui;
use rusty_likert::settings::Settings;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::load();
    // Optional file to open on startup: `rusty-likert survey.csv`
    let initial_file = std::env::args_os().nth(1).map(PathBuf::from);
    let app = RustyLikertApp::new(settings, initial_file.as_deref());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Likert – Survey Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
