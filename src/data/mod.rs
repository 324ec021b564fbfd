//! Data layer: core types, ingestion, the curve processor and export.
//!
//! Architecture:
//! ```text
//!  pasted text / .csv / .tsv / .txt / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  drop malformed rows → RawCurve (validated)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ processor  │  resample onto 1000 points → J, P → Jsc, Voc, FF, PCE
//!   └───────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  report   │  results record + combined CSV export
//!   └──────────┘
//! ```

pub mod error;
pub mod loader;
pub mod model;
pub mod processor;
pub mod report;
