use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::data::loader::{self, PastedText};
use crate::data::model::{DeviceParameters, Metrics, RawCurve, ResampledCurve};
use crate::data::processor::{self, CurveSink, N_POINTS};
use crate::data::report::{self, ResultRow};

// ---------------------------------------------------------------------------
// Analysis – the last successful evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Analysis {
    pub params: DeviceParameters,
    pub metrics: Metrics,
    pub curve: ResampledCurve,
    pub rows: Vec<ResultRow>,
}

impl Analysis {
    /// One-line summary drawn on the plot.
    pub fn summary(&self) -> String {
        let m = &self.metrics;
        format!(
            "PCE: {} %, Jsc = {} mA/cm², Voc: {} V, FF : {} %",
            report::format_value(m.pce),
            report::format_value(m.jsc),
            report::format_value(m.voc),
            report::format_value(m.fill_factor),
        )
    }
}

/// A sweep loaded from disk. Takes precedence over pasted text.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub curve: RawCurve,
    pub rows_dropped: usize,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Active area as entered, mm².
    pub area_mm2: f64,

    /// Incident power density, mW/cm².
    pub input_power_mw_cm2: f64,

    /// Contents of the paste box.
    pub pasted_text: String,

    /// Sweep loaded from a file (None until the user opens one).
    pub loaded_file: Option<LoadedFile>,

    /// Result of the last evaluation.
    pub analysis: Option<Analysis>,

    /// Overlay the power curve on the J–V plot.
    pub show_power: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            area_mm2: settings.area_mm2,
            input_power_mw_cm2: settings.input_power_mw_cm2,
            pasted_text: String::new(),
            loaded_file: None,
            analysis: None,
            show_power: false,
            status_message: None,
        }
    }

    /// Re-evaluate the current input with the current device parameters.
    ///
    /// A loaded file wins over pasted text. With neither, the previous
    /// result is cleared.
    pub fn recompute(&mut self) {
        let params = match DeviceParameters::from_area_mm2(self.area_mm2, self.input_power_mw_cm2) {
            Ok(p) => p,
            Err(e) => {
                self.fail(anyhow::Error::new(e));
                return;
            }
        };

        let mut sink = AnalysisSink::new(params);
        let file_curve = self.loaded_file.as_ref().map(|f| f.curve.clone());
        let outcome = match file_curve {
            Some(mut curve) => processor::run(&mut curve, &params, N_POINTS, &mut sink),
            None if self.pasted_text.trim().is_empty() => {
                self.analysis = None;
                self.status_message = None;
                return;
            }
            None => {
                let outcome =
                    processor::run(&mut PastedText(&self.pasted_text), &params, N_POINTS, &mut sink);
                if let Err(e) = outcome {
                    // Runs on every keystroke; partial rows are expected here.
                    log::warn!("pasted data not usable yet: {e:#}");
                    self.status_message = Some(format!("Check input: {e:#}"));
                    self.analysis = None;
                    return;
                }
                outcome
            }
        };

        match outcome {
            Ok(_) => {
                self.analysis = sink.analysis;
                self.status_message = None;
            }
            Err(e) => self.fail(e.context("please check the input format")),
        }
    }

    /// Load a sweep file and evaluate it.
    pub fn open_file(&mut self, path: &Path) {
        match loader::load_file(path) {
            Ok(loaded) => {
                log::info!(
                    "Loaded {} samples from {} ({} of {} rows dropped)",
                    loaded.curve.len(),
                    path.display(),
                    loaded.rows_dropped,
                    loaded.rows_read
                );
                self.loaded_file = Some(LoadedFile {
                    path: path.to_path_buf(),
                    curve: loaded.curve,
                    rows_dropped: loaded.rows_dropped,
                });
                self.recompute();
            }
            Err(e) => {
                self.fail(e.context(format!("loading {}", path.display())));
            }
        }
    }

    /// Forget the loaded file and go back to the paste box.
    pub fn close_file(&mut self) {
        self.loaded_file = None;
        self.recompute();
    }

    /// Write results and curve of the last evaluation to `path`.
    pub fn export(&mut self, path: &Path) -> Result<()> {
        let analysis = self
            .analysis
            .as_ref()
            .context("nothing to export yet")?;
        report::export_csv(path, &analysis.rows, &analysis.curve)?;
        log::info!("Exported results to {}", path.display());
        Ok(())
    }

    fn fail(&mut self, e: anyhow::Error) {
        log::error!("{e:#}");
        self.status_message = Some(format!("Error: {e:#}"));
        self.analysis = None;
    }
}

/// Collects the evaluation of one `recompute` together with the device
/// parameters it was run with.
struct AnalysisSink {
    params: DeviceParameters,
    analysis: Option<Analysis>,
}

impl AnalysisSink {
    fn new(params: DeviceParameters) -> Self {
        Self {
            params,
            analysis: None,
        }
    }
}

impl CurveSink for AnalysisSink {
    fn accept_results(&mut self, metrics: Metrics, curve: ResampledCurve) {
        self.analysis = Some(Analysis {
            params: self.params,
            metrics,
            curve,
            rows: report::results_record(&self.params, &metrics),
        });
    }
}
