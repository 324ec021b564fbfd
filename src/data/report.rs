use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::{DeviceParameters, Metrics, ResampledCurve};

/// Suggested file name for the combined export.
pub const EXPORT_FILE_NAME: &str = "J-V data and calculated parameters.csv";

/// Column headers of the combined export: results columns, then curve columns.
pub const EXPORT_HEADERS: [&str; 7] = [
    "Photovoltaic Parameters",
    "Value",
    "Units",
    "Voltage",
    "Current",
    "current_density",
    "Power",
];

/// One labeled line of the results table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub parameter: &'static str,
    pub value: f64,
    pub unit: &'static str,
}

impl ResultRow {
    pub fn formatted_value(&self) -> String {
        format_value(self.value)
    }
}

/// Three decimal places, the way every value is shown and exported.
pub fn format_value(value: f64) -> String {
    format!("{value:.3}")
}

/// The six-row results record: the two user inputs followed by the four
/// figures of merit.
pub fn results_record(params: &DeviceParameters, metrics: &Metrics) -> Vec<ResultRow> {
    vec![
        ResultRow {
            parameter: "Active Area (user input)",
            value: params.area_mm2(),
            unit: "mm²",
        },
        ResultRow {
            parameter: "Input Power (user input)",
            value: params.input_power_mw_cm2,
            unit: "mW/cm²",
        },
        ResultRow {
            parameter: "Short-Circuit Current Density (Jsc)",
            value: metrics.jsc,
            unit: "mA/cm²",
        },
        ResultRow {
            parameter: "Open-Circuit Voltage (Voc)",
            value: metrics.voc,
            unit: "V",
        },
        ResultRow {
            parameter: "Fill Factor (FF)",
            value: metrics.fill_factor,
            unit: "%",
        },
        ResultRow {
            parameter: "Power Conversion Efficiency (PCE)",
            value: metrics.pce,
            unit: "%",
        },
    ]
}

/// Write results and curve as one table.
///
/// Format:
/// ```csv
/// Photovoltaic Parameters,Value,Units,Voltage,Current,current_density,Power
/// Active Area (user input),6.000,mm²,,,,
/// ...
/// ,,,-0.1,0.01,166.66666666666669,-16.66666666666667
/// ```
pub fn write_combined_csv<W: Write>(
    rows: &[ResultRow],
    curve: &ResampledCurve,
    writer: W,
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(EXPORT_HEADERS)?;

    for row in rows {
        let value = row.formatted_value();
        csv.write_record([
            row.parameter,
            value.as_str(),
            row.unit,
            "",
            "",
            "",
            "",
        ])?;
    }
    for p in &curve.points {
        csv.write_record([
            String::new(),
            String::new(),
            String::new(),
            p.voltage.to_string(),
            p.current.to_string(),
            p.current_density.to_string(),
            p.power.to_string(),
        ])?;
    }

    csv.flush().context("flushing CSV output")?;
    Ok(())
}

/// Write the combined table to `path`.
pub fn export_csv(path: &Path, rows: &[ResultRow], curve: &ResampledCurve) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_combined_csv(rows, curve, std::io::BufWriter::new(file))
        .with_context(|| format!("writing {}", path.display()))
}
