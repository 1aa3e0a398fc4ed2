//! # epiwaves-rs
//!
//! `epiwaves-rs` fits logistic epidemic waves to daily-count time series.
//!
//! The library provides:
//! - Logistic incidence and prevalence curves, for one wave or a sum of waves
//! - A multi-start bounded Levenberg-Marquardt regression engine that is
//!   robust to the local optima of the logistic loss surface
//! - Student-t prediction bands over arbitrary time grids
//! - A maximum-likelihood refit with AIC/BIC for model comparison
//!
//! ## Basic Usage
//!
//! ```
//! use epiwaves_rs::{
//!     HyperParameters, ParameterBounds, RegressionEngine, TimeSeries, WaveModel, WaveShape,
//! };
//!
//! let truth = [500.0, 0.2, 30.0];
//! let values = (1..=60)
//!     .map(|t| WaveShape::SingleWave.evaluate(t as f64, &truth))
//!     .collect();
//! let series = TimeSeries::from_values(1, values).unwrap();
//!
//! let bounds = ParameterBounds::new(vec![250.0, 0.1, 15.0], vec![750.0, 0.4, 45.0]).unwrap();
//! let hyper = HyperParameters::new(bounds, 10).with_seed(7);
//!
//! let fit = RegressionEngine::new()
//!     .fit(&series, &WaveShape::SingleWave, &hyper)
//!     .unwrap();
//! assert!(fit.diagnostics.r_squared > 0.99);
//! ```

pub mod data;
pub mod error;
pub mod lm;
pub mod models;
pub mod parameters;
pub mod problem;
pub mod regression;
pub mod series;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use error::{Result, WaveFitError};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use models::{WaveModel, WaveShape};
pub use parameters::{Bounds, HyperParameters, ParameterBounds, ParameterVector};
pub use problem::Problem;
pub use regression::{FitDiagnostics, FitResult, RegressionEngine};
pub use series::TimeSeries;
pub use uncertainty::{ConfidenceBand, InformationCriteria, MaximumLikelihood, MleConfig};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
