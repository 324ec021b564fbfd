mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::PvCalcApp;
use config::Settings;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::from_env();
    log::debug!("settings: {settings:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Photovoltaic Parameters Calculator",
        options,
        Box::new(move |_cc| Ok(Box::new(PvCalcApp::new(settings)))),
    )
}
