use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{RawCurve, RawSample};
use super::processor::CurveSource;

// ---------------------------------------------------------------------------
// Result of an ingest
// ---------------------------------------------------------------------------

/// A validated sweep plus what was thrown away on the way in.
#[derive(Debug, Clone)]
pub struct LoadedCurve {
    pub curve: RawCurve,
    /// Non-blank rows seen in the input.
    pub rows_read: usize,
    /// Rows whose voltage or current could not be parsed.
    pub rows_dropped: usize,
}

impl LoadedCurve {
    fn from_rows(rows: Vec<Option<RawSample>>, origin: &str) -> Result<Self> {
        let rows_read = rows.len();
        let samples: Vec<RawSample> = rows.into_iter().flatten().collect();
        let rows_dropped = rows_read - samples.len();
        if rows_dropped > 0 {
            log::warn!("{origin}: dropped {rows_dropped} of {rows_read} rows with non-numeric values");
        }
        let curve = RawCurve::new(samples)
            .with_context(|| format!("{origin}: not a usable voltage/current sweep"))?;
        Ok(Self {
            curve,
            rows_read,
            rows_dropped,
        })
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a sweep from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`            – comma separated, first two columns (V, A)
/// * `.tsv`            – tab separated, first two columns
/// * `.txt`            – same rules as pasted text (comma or tab)
/// * `.parquet`, `.pq` – first two numeric columns
///
/// A header row is just a non-numeric row and gets dropped.
pub fn load_file(path: &Path) -> Result<LoadedCurve> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_delimited(path, b','),
        "tsv" => load_delimited(path, b'\t'),
        "txt" => {
            let text = std::fs::read_to_string(path).context("reading text file")?;
            parse_pasted(&text)
        }
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Parse two columns of pasted text, one `voltage<sep>current` row per line
/// where `<sep>` is a comma or a tab. Blank lines are skipped, extra
/// columns ignored, and rows that are not two finite numbers dropped.
pub fn parse_pasted(text: &str) -> Result<LoadedCurve> {
    let rows: Vec<Option<RawSample>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = line.split([',', '\t']);
            parse_pair(fields.next(), fields.next())
        })
        .collect();
    LoadedCurve::from_rows(rows, "pasted data")
}

fn parse_pair(voltage: Option<&str>, current: Option<&str>) -> Option<RawSample> {
    let v = parse_number(voltage?)?;
    let i = parse_number(current?)?;
    Some(RawSample::new(v, i))
}

fn parse_number(field: &str) -> Option<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// CSV / TSV loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, delimiter: u8) -> Result<LoadedCurve> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        rows.push(parse_pair(record.get(0), record.get(1)));
    }

    LoadedCurve::from_rows(rows, &path.display().to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file whose first two numeric columns are voltage and
/// current. Column names are not inspected. Rows with a null in either
/// column are dropped.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<LoadedCurve> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let numeric: Vec<usize> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| is_numeric(f.data_type()))
            .map(|(i, _)| i)
            .collect();
        let [v_idx, i_idx] = match numeric.as_slice() {
            [v, i, ..] => [*v, *i],
            _ => bail!("Parquet file needs two numeric columns, found {}", numeric.len()),
        };

        let v_col = batch.column(v_idx);
        let i_col = batch.column(i_idx);
        for row in 0..batch.num_rows() {
            let v = extract_f64(v_col, row)
                .with_context(|| format!("Row {row}: failed to read voltage"))?;
            let i = extract_f64(i_col, row)
                .with_context(|| format!("Row {row}: failed to read current"))?;
            rows.push(match (v, i) {
                (Some(v), Some(i)) if v.is_finite() && i.is_finite() => Some(RawSample::new(v, i)),
                _ => None,
            });
        }
    }

    LoadedCurve::from_rows(rows, &path.display().to_string())
}

// -- Parquet / Arrow helpers --

fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
    )
}

/// Read one cell of a numeric column as `f64`; `None` for nulls.
fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .value(row),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .value(row) as f64,
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .value(row) as f64,
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .value(row) as f64,
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    Ok(Some(value))
}

// ---------------------------------------------------------------------------
// CurveSource adapters
// ---------------------------------------------------------------------------

/// Text pasted into the input box.
pub struct PastedText<'a>(pub &'a str);

impl CurveSource for PastedText<'_> {
    fn provide_raw_curve(&mut self) -> Result<RawCurve> {
        parse_pasted(self.0).map(|loaded| loaded.curve)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::error::CurveError;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn pasted_text_accepts_commas_and_tabs() {
        let loaded = parse_pasted("-0.1,0.01\n0.0\t0.005\n 0.5 , 0.0 \n\n1.0\t-0.01\n").unwrap();
        assert_eq!(loaded.rows_read, 4);
        assert_eq!(loaded.rows_dropped, 0);
        let pairs: Vec<(f64, f64)> = loaded
            .curve
            .samples()
            .iter()
            .map(|s| (s.voltage, s.current))
            .collect();
        assert_eq!(pairs, vec![(-0.1, 0.01), (0.0, 0.005), (0.5, 0.0), (1.0, -0.01)]);
    }

    #[test]
    fn pasted_text_drops_malformed_rows() {
        let text = "Voltage,Current\n0.0,0.01\nabc,1\n0.5\n0.6,nan\n1.0,-0.01\n";
        let loaded = parse_pasted(text).unwrap();
        assert_eq!(loaded.rows_read, 6);
        assert_eq!(loaded.rows_dropped, 4);
        assert_eq!(loaded.curve.len(), 2);
    }

    #[test]
    fn pasted_text_ignores_extra_columns() {
        let loaded = parse_pasted("0.0,0.01,foo\n1.0,-0.01,bar").unwrap();
        assert_eq!(loaded.curve.samples()[1], RawSample::new(1.0, -0.01));
    }

    #[test]
    fn pasted_text_rejects_unusable_sweep() {
        let err = parse_pasted("0.3,0.01\n0.3,0.02").unwrap_err();
        assert_eq!(
            err.downcast_ref::<CurveError>(),
            Some(&CurveError::DegenerateRange { voltage: 0.3 })
        );
        let err = parse_pasted("no numbers here").unwrap_err();
        assert_eq!(
            err.downcast_ref::<CurveError>(),
            Some(&CurveError::InsufficientData { found: 0 })
        );
    }

    #[test]
    fn csv_file_skips_header() {
        let file = write_temp(".csv", "Voltage (V),Current (A)\n0.0,-0.002\n0.5,-0.001\n1.0,0.003\n");
        let loaded = load_file(file.path()).unwrap();
        assert_eq!(loaded.rows_read, 4);
        assert_eq!(loaded.rows_dropped, 1);
        assert_eq!(loaded.curve.voltage_range(), (0.0, 1.0));
    }

    #[test]
    fn tsv_and_txt_files_load() {
        let tsv = write_temp(".tsv", "0.0\t-0.002\n1.0\t0.003\n");
        assert_eq!(load_file(tsv.path()).unwrap().curve.len(), 2);
        let txt = write_temp(".TXT", "0.0,-0.002\n0.5\t0.0\n1.0,0.003\n");
        assert_eq!(load_file(txt.path()).unwrap().curve.len(), 3);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let file = write_temp(".xlsx", "");
        let err = load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn parquet_uses_first_two_numeric_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("device", DataType::Utf8, false),
            Field::new("Voltage", DataType::Float64, true),
            Field::new("Current", DataType::Float32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(arrow::array::StringArray::from(vec!["a", "a", "a"])),
                Arc::new(Float64Array::from(vec![Some(0.0), None, Some(1.0)])),
                Arc::new(Float32Array::from(vec![Some(-0.5), Some(0.0), Some(0.25)])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(std::fs::File::create(file.path()).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let loaded = load_file(file.path()).unwrap();
        assert_eq!(loaded.rows_read, 3);
        assert_eq!(loaded.rows_dropped, 1);
        assert_eq!(
            loaded.curve.samples(),
            &[RawSample::new(0.0, -0.5), RawSample::new(1.0, 0.25)]
        );
    }

    #[test]
    fn pasted_text_feeds_the_processor() {
        let mut pasted = PastedText("0,0.01\n1,-0.01");
        assert_eq!(pasted.provide_raw_curve().unwrap().len(), 2);
        assert!(PastedText("nothing").provide_raw_curve().is_err());
    }
}
