use anyhow::Result;

use super::error::CurveError;
use super::model::{
    CurvePoint, DeviceParameters, Metrics, RawCurve, RawSample, ResampledCurve, argmin_by_key,
};

/// Grid size used by the calculator.
pub const N_POINTS: usize = 1000;

// ---------------------------------------------------------------------------
// Resampling
// ---------------------------------------------------------------------------

/// Resample `raw` onto `n_points` uniformly spaced voltages spanning
/// `[min(V), max(V)]` inclusive, linearly interpolating the current.
///
/// Interpolation runs over the samples stably sorted by voltage, so reverse
/// or shuffled sweeps give the same result as the sorted sweep. Where several
/// samples share a voltage, the last one in sorted order is used for that
/// voltage. The grid never leaves the sampled range, so nothing is
/// extrapolated.
///
/// Grid voltages are strictly increasing. A span only a few ULPs wide cannot
/// hold `n_points` distinct values and is rejected with
/// [`CurveError::GridTooFine`].
pub fn resample(raw: &RawCurve, n_points: usize) -> Result<ResampledCurve, CurveError> {
    if n_points < 2 {
        return Err(CurveError::InvalidGridSize { n_points });
    }

    let mut sorted: Vec<RawSample> = raw.samples().to_vec();
    sorted.sort_by(|a, b| a.voltage.total_cmp(&b.voltage));

    let (v_min, v_max) = raw.voltage_range();
    let step = (v_max - v_min) / (n_points - 1) as f64;
    log::debug!("resampling {} samples onto {n_points} points, step {step:e} V", raw.len());

    let points: Vec<CurvePoint> = (0..n_points)
        .map(|i| {
            let voltage = if i == n_points - 1 {
                v_max
            } else {
                v_min + step * i as f64
            };
            CurvePoint {
                voltage,
                current: interpolate(&sorted, voltage),
                current_density: 0.0,
                power: 0.0,
            }
        })
        .collect();

    if points.windows(2).any(|w| w[1].voltage <= w[0].voltage) {
        return Err(CurveError::GridTooFine {
            v_min,
            v_max,
            n_points,
        });
    }

    Ok(ResampledCurve { points })
}

/// Piecewise-linear interpolation over samples sorted by voltage.
/// `x` is expected within the sampled range; outside it the end value holds.
fn interpolate(sorted: &[RawSample], x: f64) -> f64 {
    // First sample strictly above x.
    let hi = sorted.partition_point(|s| s.voltage <= x);
    if hi == 0 {
        return sorted[0].current;
    }
    if hi == sorted.len() {
        return sorted[hi - 1].current;
    }
    let (a, b) = (sorted[hi - 1], sorted[hi]);
    let t = (x - a.voltage) / (b.voltage - a.voltage);
    a.current + t * (b.current - a.current)
}

// ---------------------------------------------------------------------------
// Figures of merit
// ---------------------------------------------------------------------------

/// Annotate `resampled` with current density and power, then derive the
/// four figures of merit.
///
/// * Jsc: `-J` at the grid voltage closest to 0 V.
/// * Voc: the grid voltage whose `|J|` is smallest.
/// * FF:  `-100 * min(P) / (Jsc * Voc)`.
/// * PCE: `Jsc * Voc * FF / P_in`.
///
/// A zero Jsc or Voc is returned as-is and makes FF and PCE non-finite.
pub fn compute_metrics(
    resampled: &ResampledCurve,
    params: &DeviceParameters,
) -> (Metrics, ResampledCurve) {
    let points: Vec<CurvePoint> = resampled
        .points
        .iter()
        .map(|p| {
            let current_density = 1000.0 * p.current / params.area_cm2;
            CurvePoint {
                voltage: p.voltage,
                current: p.current,
                current_density,
                power: p.voltage * current_density,
            }
        })
        .collect();

    let jsc = argmin_by_key(&points, |p| p.voltage.abs())
        .map(|i| -points[i].current_density)
        .unwrap_or(f64::NAN);
    let voc = argmin_by_key(&points, |p| p.current_density.abs())
        .map(|i| points[i].voltage)
        .unwrap_or(f64::NAN);
    let p_max = points
        .iter()
        .map(|p| p.power)
        .fold(f64::INFINITY, f64::min);

    let fill_factor = -100.0 * p_max / (jsc * voc);
    let pce = (jsc * voc * fill_factor) / params.input_power_mw_cm2;

    let metrics = Metrics {
        jsc,
        voc,
        fill_factor,
        pce,
    };
    if !metrics.is_finite() {
        log::warn!("non-finite figures of merit: {metrics:?}");
    }

    (metrics, ResampledCurve { points })
}

/// Resample and evaluate in one pass.
pub fn analyze(
    raw: &RawCurve,
    params: &DeviceParameters,
    n_points: usize,
) -> Result<(Metrics, ResampledCurve), CurveError> {
    let resampled = resample(raw, n_points)?;
    Ok(compute_metrics(&resampled, params))
}

// ---------------------------------------------------------------------------
// Collaborator seam
// ---------------------------------------------------------------------------

/// Supplies the sweep to evaluate (pasted text, a file, ...).
pub trait CurveSource {
    fn provide_raw_curve(&mut self) -> Result<RawCurve>;
}

impl CurveSource for RawCurve {
    fn provide_raw_curve(&mut self) -> Result<RawCurve> {
        Ok(self.clone())
    }
}

/// Consumes the evaluated sweep (the UI state, an exporter, ...).
pub trait CurveSink {
    fn accept_results(&mut self, metrics: Metrics, curve: ResampledCurve);
}

/// One call/response: pull a sweep from `source`, evaluate it and hand the
/// results to `sink`. Nothing reaches the sink on failure.
pub fn run<S, K>(
    source: &mut S,
    params: &DeviceParameters,
    n_points: usize,
    sink: &mut K,
) -> Result<Metrics>
where
    S: CurveSource + ?Sized,
    K: CurveSink + ?Sized,
{
    let raw = source.provide_raw_curve()?;
    let (metrics, curve) = analyze(&raw, params, n_points)?;
    log::info!(
        "Jsc = {:.3} mA/cm², Voc = {:.3} V, FF = {:.3} %, PCE = {:.3} %",
        metrics.jsc,
        metrics.voc,
        metrics.fill_factor,
        metrics.pce
    );
    sink.accept_results(metrics, curve);
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn scenario_curve() -> RawCurve {
        RawCurve::from_pairs([
            (-0.1, 0.01),
            (0.0, 0.005),
            (0.5, 0.0),
            (0.6, -0.002),
            (1.0, -0.01),
        ])
        .unwrap()
    }

    fn params() -> DeviceParameters {
        DeviceParameters::new(0.06, 100.0).unwrap()
    }

    #[test]
    fn grid_has_requested_size_and_span() {
        let raw = scenario_curve();
        for n in [2, 3, 17, N_POINTS] {
            let curve = resample(&raw, n).unwrap();
            assert_eq!(curve.len(), n);
            assert_eq!(curve.points[0].voltage, -0.1);
            assert_eq!(curve.points[n - 1].voltage, 1.0);
            let v: Vec<f64> = curve.points.iter().map(|p| p.voltage).collect();
            assert!(v.windows(2).all(|w| w[1] > w[0]), "grid not increasing for n = {n}");
        }
    }

    #[test]
    fn grid_is_uniform() {
        let curve = resample(&scenario_curve(), N_POINTS).unwrap();
        let step = 1.1 / (N_POINTS - 1) as f64;
        for w in curve.points.windows(2) {
            assert!((w[1].voltage - w[0].voltage - step).abs() < 1e-12);
        }
    }

    #[test]
    fn linear_sweep_is_reproduced_exactly() {
        let (a, b) = (-0.025, 0.012);
        let raw = RawCurve::from_pairs(
            [-0.3, -0.1, 0.05, 0.4, 0.72, 1.1].map(|v| (v, a * v + b)),
        )
        .unwrap();
        let curve = resample(&raw, N_POINTS).unwrap();
        for p in &curve.points {
            assert!((p.current - (a * p.voltage + b)).abs() < 1e-12);
        }
    }

    #[test]
    fn two_samples_interpolate_between_endpoints() {
        let raw = RawCurve::from_pairs([(0.0, -0.02), (1.0, 0.01)]).unwrap();
        let curve = resample(&raw, N_POINTS).unwrap();
        assert_eq!(curve.len(), N_POINTS);
        assert!((curve.points[0].current + 0.02).abs() < TOL);
        assert!((curve.points[N_POINTS - 1].current - 0.01).abs() < TOL);
        for p in &curve.points {
            assert!((p.current - (-0.02 + 0.03 * p.voltage)).abs() < 1e-12);
        }
    }

    #[test]
    fn grid_smaller_than_two_is_rejected() {
        let raw = scenario_curve();
        assert_eq!(resample(&raw, 0), Err(CurveError::InvalidGridSize { n_points: 0 }));
        assert_eq!(resample(&raw, 1), Err(CurveError::InvalidGridSize { n_points: 1 }));
    }

    #[test]
    fn span_of_a_few_ulps_is_rejected() {
        let v_max = f64::from_bits(1.0f64.to_bits() + 3);
        let raw = RawCurve::from_pairs([(1.0, 0.0), (v_max, 0.001)]).unwrap();
        assert_eq!(
            resample(&raw, N_POINTS),
            Err(CurveError::GridTooFine {
                v_min: 1.0,
                v_max,
                n_points: N_POINTS,
            })
        );
        // Four points fit into three ULPs.
        let curve = resample(&raw, 4).unwrap();
        assert!(curve.points.windows(2).all(|w| w[1].voltage > w[0].voltage));
    }

    #[test]
    fn unsorted_sweep_matches_sorted_sweep() {
        let sorted = scenario_curve();
        let reversed = RawCurve::new(sorted.samples().iter().rev().copied().collect()).unwrap();
        let shuffled = RawCurve::from_pairs([
            (0.6, -0.002),
            (-0.1, 0.01),
            (1.0, -0.01),
            (0.0, 0.005),
            (0.5, 0.0),
        ])
        .unwrap();
        let expected = resample(&sorted, N_POINTS).unwrap();
        assert_eq!(resample(&reversed, N_POINTS).unwrap(), expected);
        assert_eq!(resample(&shuffled, N_POINTS).unwrap(), expected);
    }

    #[test]
    fn duplicate_voltage_takes_last_sample() {
        let raw = RawCurve::from_pairs([(0.0, 1.0), (0.5, 2.0), (0.5, 4.0), (1.0, 4.0)]).unwrap();
        let curve = resample(&raw, 3).unwrap();
        assert_eq!(curve.points[1].voltage, 0.5);
        assert!((curve.points[1].current - 4.0).abs() < TOL);
    }

    #[test]
    fn annotation_uses_area_and_voltage() {
        let (_, curve) = analyze(&scenario_curve(), &params(), N_POINTS).unwrap();
        for p in &curve.points {
            assert!((p.current_density - 1000.0 * p.current / 0.06).abs() < 1e-9);
            assert!((p.power - p.voltage * p.current_density).abs() < 1e-9);
        }
    }

    #[test]
    fn scenario_jsc_and_voc_land_on_nearest_grid_points() {
        let (metrics, curve) = analyze(&scenario_curve(), &params(), N_POINTS).unwrap();
        let step = 1.1 / (N_POINTS - 1) as f64;

        // Grid voltage nearest 0 V is index 91 (+0.2 mV); sign is inverted.
        let i_sc = 91;
        assert!(curve.points[i_sc].voltage.abs() <= step / 2.0);
        assert!((metrics.jsc + curve.points[i_sc].current_density).abs() < TOL);
        assert!(metrics.jsc < 0.0, "photocurrent is positive in this sweep");
        let expected_jsc = -1000.0 * (0.005 - 0.01 * curve.points[i_sc].voltage) / 0.06;
        assert!((metrics.jsc - expected_jsc).abs() < 1e-9);

        // The sweep crosses zero current at 0.5 V, grid index 545.
        let i_oc = curve
            .points
            .iter()
            .position(|p| p.voltage == metrics.voc)
            .unwrap();
        assert_eq!(i_oc, 545);
        assert!((metrics.voc - 0.5).abs() <= step / 2.0);
        for p in &curve.points {
            assert!(curve.points[i_oc].current_density.abs() <= p.current_density.abs());
        }
    }

    #[test]
    fn fill_factor_and_pce_follow_formulas() {
        let (m, curve) = analyze(&scenario_curve(), &params(), N_POINTS).unwrap();
        let p_max = curve.max_power_point().unwrap().power;
        // Most negative power sits at the 1.0 V end of this sweep.
        assert!((p_max - 1.0 * (1000.0 * -0.01 / 0.06)).abs() < 1e-9);
        assert!((m.fill_factor - (-100.0 * p_max / (m.jsc * m.voc))).abs() < 1e-9);
        assert!((m.pce - m.jsc * m.voc * m.fill_factor / 100.0).abs() < 1e-9);
    }

    #[test]
    fn realistic_cell_gives_physical_numbers() {
        // Square-ish cell: Jsc = 20 mA/cm², Voc = 0.8 V on a 0.1 cm² device.
        let raw = RawCurve::from_pairs([
            (-0.2, -0.002),
            (0.0, -0.002),
            (0.6, -0.0018),
            (0.8, 0.0),
            (1.0, 0.004),
        ])
        .unwrap();
        let params = DeviceParameters::new(0.1, 100.0).unwrap();
        let (m, _) = analyze(&raw, &params, N_POINTS).unwrap();
        let step = 1.2 / (N_POINTS - 1) as f64;
        // 0 V and 0.8 V fall midway between grid points.
        assert!((m.jsc - 20.0).abs() < 0.01, "jsc = {}", m.jsc);
        assert!((m.voc - 0.8).abs() <= step, "voc = {}", m.voc);
        // P_max is close to 0.6 V * 18 mA/cm² = 10.8 mW/cm².
        assert!(m.fill_factor > 66.0 && m.fill_factor < 69.0, "ff = {}", m.fill_factor);
        // With FF in % and P_in in mW/cm², PCE comes out in %.
        assert!((m.pce - 10.8).abs() < 0.05, "pce = {}", m.pce);
    }

    #[test]
    fn one_sided_sweep_reports_nearest_endpoint_as_voc() {
        // Current never crosses zero, so Voc is only the endpoint closest to it.
        let raw = RawCurve::from_pairs([(0.0, -0.01), (0.5, -0.008), (1.0, -0.002)]).unwrap();
        let (m, curve) = analyze(&raw, &params(), N_POINTS).unwrap();
        assert_eq!(m.voc, 1.0);
        assert_eq!(curve.points[N_POINTS - 1].voltage, m.voc);
        assert!(curve.points[N_POINTS - 1].current_density != 0.0);
    }

    #[test]
    fn zero_current_yields_non_finite_ratio() {
        let raw = RawCurve::from_pairs([(0.0, 0.0), (1.0, 0.0)]).unwrap();
        let (m, _) = analyze(&raw, &params(), N_POINTS).unwrap();
        assert_eq!(m.jsc, 0.0);
        assert_eq!(m.voc, 0.0);
        assert!(m.fill_factor.is_nan());
        assert!(m.pce.is_nan());
        assert!(!m.is_finite());
    }

    #[test]
    fn zero_voc_yields_infinite_fill_factor() {
        // Zero current at 0 V but non-zero photocurrent elsewhere.
        let raw = RawCurve::from_pairs([(-0.5, 0.01), (0.0, 0.0), (0.5, -0.01)]).unwrap();
        let (m, curve) = analyze(&raw, &params(), 3).unwrap();
        assert_eq!(curve.points[1].voltage, 0.0);
        assert_eq!(m.voc, 0.0);
        assert!(m.fill_factor.is_infinite() || m.fill_factor.is_nan());
        assert!(!m.pce.is_finite());
    }

    #[test]
    fn compute_metrics_is_idempotent() {
        let resampled = resample(&scenario_curve(), N_POINTS).unwrap();
        let (first, curve_a) = compute_metrics(&resampled, &params());
        let (second, curve_b) = compute_metrics(&resampled, &params());
        assert_eq!(first, second);
        assert_eq!(curve_a, curve_b);
        // Re-annotating an annotated curve changes nothing either.
        let (third, _) = compute_metrics(&curve_a, &params());
        assert_eq!(first, third);
    }

    struct FixedSource(Option<RawCurve>);

    impl CurveSource for FixedSource {
        fn provide_raw_curve(&mut self) -> Result<RawCurve> {
            self.0
                .take()
                .ok_or_else(|| anyhow::anyhow!("source exhausted"))
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<(Metrics, usize)>);

    impl CurveSink for Recorder {
        fn accept_results(&mut self, metrics: Metrics, curve: ResampledCurve) {
            self.0.push((metrics, curve.len()));
        }
    }

    #[test]
    fn run_delivers_results_to_sink() {
        let mut source = FixedSource(Some(scenario_curve()));
        let mut sink = Recorder::default();
        let metrics = run(&mut source, &params(), N_POINTS, &mut sink).unwrap();
        assert_eq!(sink.0, vec![(metrics, N_POINTS)]);
    }

    #[test]
    fn run_failure_leaves_sink_untouched() {
        let mut sink = Recorder::default();
        assert!(run(&mut FixedSource(None), &params(), N_POINTS, &mut sink).is_err());

        let mut source = FixedSource(Some(scenario_curve()));
        let err = run(&mut source, &params(), 1, &mut sink).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CurveError>(),
            Some(&CurveError::InvalidGridSize { n_points: 1 })
        );
        assert!(sink.0.is_empty());
    }
}
