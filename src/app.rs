use eframe::egui;

use crate::color::SeriesColors;
use crate::config::Settings;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct PvCalcApp {
    pub state: AppState,
    colors: SeriesColors,
}

impl PvCalcApp {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: AppState::new(settings),
            colors: SeriesColors::default(),
        }
    }
}

impl eframe::App for PvCalcApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: inputs + results ----
        egui::SidePanel::left("input_panel")
            .default_width(320.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::jv_plot(ui, &self.state, &self.colors);
        });
    }
}
