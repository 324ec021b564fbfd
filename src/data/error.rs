use thiserror::Error;

/// Rejected preconditions of the curve processor.
///
/// Numeric degeneracy (a zero Jsc or Voc) is not an error: it shows up as a
/// non-finite fill factor / PCE in [`super::model::Metrics`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    #[error("at least 2 samples are required, found {found}")]
    InsufficientData { found: usize },

    #[error("voltage range is degenerate: every sample is at {voltage} V")]
    DegenerateRange { voltage: f64 },

    #[error("sample {index} contains a non-finite value")]
    NonFiniteSample { index: usize },

    #[error("grid needs at least 2 points, got {n_points}")]
    InvalidGridSize { n_points: usize },

    #[error("voltage span {v_min} V to {v_max} V is too narrow for {n_points} distinct grid points")]
    GridTooFine { v_min: f64, v_max: f64, n_points: usize },

    #[error("{name} must be a positive finite number, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}
