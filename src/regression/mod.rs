//! Multi-start bounded regression engine and fit diagnostics.

pub mod diagnostics;
pub mod engine;

pub use diagnostics::FitDiagnostics;
pub use engine::{draw_initial_guesses, select_best, FitResult, RegressionEngine};
