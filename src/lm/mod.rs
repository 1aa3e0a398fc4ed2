//! Bounded Levenberg-Marquardt local solver.
//!
//! Used by the regression engine for every Monte Carlo restart. The damping
//! controller and the damped linear solve are shared with the
//! maximum-likelihood estimator in [`crate::uncertainty`].

pub mod algorithm;
pub mod config;
pub mod convergence;
pub mod step;
pub mod trust_region;

pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::LmConfig;
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
pub use step::LmStep;
pub use trust_region::TrustRegion;
