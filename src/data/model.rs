use super::error::CurveError;

// ---------------------------------------------------------------------------
// RawCurve – the measured sweep, as supplied by the user
// ---------------------------------------------------------------------------

/// One measured point: applied voltage (V) and measured current (A).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub voltage: f64,
    pub current: f64,
}

impl RawSample {
    pub fn new(voltage: f64, current: f64) -> Self {
        Self { voltage, current }
    }
}

/// A validated I–V sweep.
///
/// Construction guarantees at least two samples, finite values and a
/// non-degenerate voltage span. Input order is preserved; it does not have
/// to be sorted by voltage.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCurve {
    samples: Vec<RawSample>,
    v_min: f64,
    v_max: f64,
}

impl RawCurve {
    pub fn new(samples: Vec<RawSample>) -> Result<Self, CurveError> {
        if samples.len() < 2 {
            return Err(CurveError::InsufficientData {
                found: samples.len(),
            });
        }
        if let Some(index) = samples
            .iter()
            .position(|s| !s.voltage.is_finite() || !s.current.is_finite())
        {
            return Err(CurveError::NonFiniteSample { index });
        }

        let v_min = samples.iter().map(|s| s.voltage).fold(f64::INFINITY, f64::min);
        let v_max = samples
            .iter()
            .map(|s| s.voltage)
            .fold(f64::NEG_INFINITY, f64::max);
        if v_max <= v_min {
            return Err(CurveError::DegenerateRange { voltage: v_min });
        }

        Ok(Self {
            samples,
            v_min,
            v_max,
        })
    }

    /// Build from `(voltage, current)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, CurveError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(v, i)| RawSample::new(v, i))
                .collect(),
        )
    }

    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false: a `RawCurve` holds at least two samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `(min, max)` of the sampled voltages.
    pub fn voltage_range(&self) -> (f64, f64) {
        (self.v_min, self.v_max)
    }
}

// ---------------------------------------------------------------------------
// DeviceParameters
// ---------------------------------------------------------------------------

/// Cell area and illumination the sweep was measured under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceParameters {
    pub area_cm2: f64,
    pub input_power_mw_cm2: f64,
}

impl DeviceParameters {
    pub fn new(area_cm2: f64, input_power_mw_cm2: f64) -> Result<Self, CurveError> {
        check_positive("active area", area_cm2)?;
        check_positive("input power", input_power_mw_cm2)?;
        Ok(Self {
            area_cm2,
            input_power_mw_cm2,
        })
    }

    /// Area as entered in the UI (mm²); 100 mm² = 1 cm².
    pub fn from_area_mm2(area_mm2: f64, input_power_mw_cm2: f64) -> Result<Self, CurveError> {
        check_positive("active area", area_mm2)?;
        Self::new(area_mm2 / 100.0, input_power_mw_cm2)
    }

    pub fn area_mm2(&self) -> f64 {
        self.area_cm2 * 100.0
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), CurveError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CurveError::InvalidParameter { name, value })
    }
}

// ---------------------------------------------------------------------------
// ResampledCurve – uniform grid annotated with J and P
// ---------------------------------------------------------------------------

/// One grid point of the resampled sweep.
///
/// `current_density` (mA/cm²) and `power` (mW/cm²) are zero until
/// [`super::processor::compute_metrics`] fills them in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub voltage: f64,
    pub current: f64,
    pub current_density: f64,
    pub power: f64,
}

/// The sweep on a uniform, strictly increasing voltage grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResampledCurve {
    pub points: Vec<CurvePoint>,
}

impl ResampledCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First grid point with the most negative power (the maximum-power
    /// point under the photocurrent-negative convention).
    pub fn max_power_point(&self) -> Option<MaxPowerPoint> {
        let idx = argmin_by_key(&self.points, |p| p.power)?;
        let p = &self.points[idx];
        Some(MaxPowerPoint {
            voltage: p.voltage,
            current_density: p.current_density,
            power: p.power,
        })
    }
}

/// Index of the first element with the smallest key. NaN keys never win.
pub(crate) fn argmin_by_key<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, item) in items.iter().enumerate() {
        let k = key(item);
        if k.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| k < b) {
            best = Some((i, k));
        }
    }
    best.map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Photovoltaic figures of merit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Short-circuit current density, mA/cm².
    pub jsc: f64,
    /// Open-circuit voltage, V.
    pub voc: f64,
    /// Fill factor, %.
    pub fill_factor: f64,
    /// Power conversion efficiency, %.
    pub pce: f64,
}

impl Metrics {
    pub fn is_finite(&self) -> bool {
        self.jsc.is_finite()
            && self.voc.is_finite()
            && self.fill_factor.is_finite()
            && self.pce.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxPowerPoint {
    pub voltage: f64,
    pub current_density: f64,
    pub power: f64,
}
