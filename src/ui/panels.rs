use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::config::{AREA_MM2_RANGE, INPUT_POWER_RANGE};
use crate::data::report::EXPORT_FILE_NAME;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – inputs and results
// ---------------------------------------------------------------------------

/// Render the left input panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Device");
            ui.separator();

            let mut changed = false;
            egui::Grid::new("device_params")
                .num_columns(2)
                .show(ui, |ui: &mut Ui| {
                    ui.label("Active area");
                    changed |= ui
                        .add(
                            egui::DragValue::new(&mut state.area_mm2)
                                .range(AREA_MM2_RANGE.0..=AREA_MM2_RANGE.1)
                                .speed(0.01)
                                .fixed_decimals(2)
                                .suffix(" mm²"),
                        )
                        .changed();
                    ui.end_row();

                    ui.label("Input power");
                    changed |= ui
                        .add(
                            egui::DragValue::new(&mut state.input_power_mw_cm2)
                                .range(INPUT_POWER_RANGE.0..=INPUT_POWER_RANGE.1)
                                .speed(0.1)
                                .fixed_decimals(1)
                                .suffix(" mW/cm²"),
                        )
                        .changed();
                    ui.end_row();
                });

            ui.add_space(8.0);
            ui.heading("Data");
            ui.separator();

            if let Some(file) = &state.loaded_file {
                let name = file
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                ui.label(format!("{name}: {} samples", file.curve.len()));
                if file.rows_dropped > 0 {
                    ui.label(
                        RichText::new(format!("{} non-numeric rows skipped", file.rows_dropped))
                            .weak(),
                    );
                }
                if ui.small_button("Use pasted data instead").clicked() {
                    state.close_file();
                }
            } else {
                ui.label("Paste two columns, Voltage (V) and Current (A), separated by commas or tabs:");
                changed |= ui
                    .add(
                        egui::TextEdit::multiline(&mut state.pasted_text)
                            .desired_rows(8)
                            .desired_width(f32::INFINITY)
                            .font(egui::TextStyle::Monospace)
                            .hint_text("-0.1,0.00105\n0.0,0.00103\n..."),
                    )
                    .changed();
            }

            if changed {
                state.recompute();
            }

            ui.add_space(8.0);
            ui.heading("Results");
            ui.separator();
            results_table(ui, state);
        });
}

fn results_table(ui: &mut Ui, state: &AppState) {
    let Some(analysis) = &state.analysis else {
        ui.label("No data evaluated.");
        return;
    };

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::remainder())
        .column(Column::auto())
        .column(Column::auto())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Photovoltaic Parameters");
            });
            header.col(|ui| {
                ui.strong("Value");
            });
            header.col(|ui| {
                ui.strong("Units");
            });
        })
        .body(|mut body| {
            for row in &analysis.rows {
                body.row(18.0, |mut tr| {
                    tr.col(|ui| {
                        ui.label(row.parameter);
                    });
                    tr.col(|ui| {
                        ui.label(RichText::new(row.formatted_value()).strong());
                    });
                    tr.col(|ui| {
                        ui.label(row.unit);
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.analysis.is_some(), egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if ui
            .selectable_label(state.show_power, "Power Curve")
            .clicked()
        {
            state.show_power = !state.show_power;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open J-V sweep")
        .add_filter("Supported files", &["csv", "tsv", "txt", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Text", &["tsv", "txt"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_file(&path);
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export results")
        .set_file_name(EXPORT_FILE_NAME)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export(&path) {
            log::error!("Failed to export: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
