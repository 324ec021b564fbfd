use eframe::egui::{Align2, Ui};
use egui_plot::{HLine, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Text, VLine};

use crate::color::SeriesColors;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// J–V plot (central panel)
// ---------------------------------------------------------------------------

/// Render the J–V plot in the central panel.
pub fn jv_plot(ui: &mut Ui, state: &AppState, colors: &SeriesColors) {
    let analysis = match &state.analysis {
        Some(a) => a,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Paste a sweep or open a file  (File → Open…)");
            });
            return;
        }
    };

    let metrics = analysis.metrics;
    let summary = analysis.summary();
    let mpp = analysis.curve.max_power_point();

    Plot::new("jv_plot")
        .legend(Legend::default())
        .x_axis_label("Voltage (V)")
        .y_axis_label("Current Density (mA/cm²)")
        .include_x(-0.2)
        .include_x(1.0)
        .include_y(-30.0)
        .include_y(5.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.vline(VLine::new(0.0).color(colors.axes).width(1.0));
            plot_ui.hline(HLine::new(0.0).color(colors.axes).width(1.0));

            let jv: PlotPoints = analysis
                .curve
                .points
                .iter()
                .map(|p| [p.voltage, p.current_density])
                .collect();
            plot_ui.line(Line::new(jv).name("IV Curve").color(colors.jv_curve).width(3.0));

            if state.show_power {
                let power: PlotPoints = analysis
                    .curve
                    .points
                    .iter()
                    .map(|p| [p.voltage, p.power])
                    .collect();
                plot_ui.line(
                    Line::new(power)
                        .name("Power (mW/cm²)")
                        .color(colors.power_curve)
                        .width(1.5),
                );
            }

            if metrics.jsc.is_finite() {
                plot_ui.points(
                    Points::new(vec![[0.0, -metrics.jsc]])
                        .name("Jsc")
                        .color(colors.jsc_marker)
                        .radius(5.0),
                );
            }
            if metrics.voc.is_finite() {
                plot_ui.points(
                    Points::new(vec![[metrics.voc, 0.0]])
                        .name("Voc")
                        .color(colors.voc_marker)
                        .radius(5.0),
                );
            }
            if let Some(mpp) = mpp {
                plot_ui.points(
                    Points::new(vec![[mpp.voltage, mpp.current_density]])
                        .name(format!("Max power ({:.3} mW/cm²)", -mpp.power))
                        .color(colors.mpp_marker)
                        .radius(5.0),
                );
            }

            plot_ui.text(
                Text::new(PlotPoint::new(0.30, -2.0), summary).anchor(Align2::CENTER_TOP),
            );
        });
}
