//! Judiciary Chart - CSV expense explorer & bar chart viewer
//!
//! Desktop entry point: sets up logging and opens the main window.

use eframe::egui;
use judiciary_chart::gui::JudiciaryApp;
use log::LevelFilter;

fn init_logging() {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if std::env::var("RUST_LOG").is_err() {
        builder.filter_module("judiciary_chart", LevelFilter::Info);
    }
    let _ = builder.format_timestamp_millis().try_init();
}

fn main() -> eframe::Result<()> {
    init_logging();

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1000.0, 650.0])
            .with_title("Judiciary Expenses"),
        ..Default::default()
    };

    eframe::run_native(
        "Judiciary Expenses",
        options,
        Box::new(|cc| Ok(Box::new(JudiciaryApp::new(cc)))),
    )
}
