//! Goodness-of-fit measures for a fitted curve.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveFitError};

/// Error statistics between observations and model predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    /// Root-mean-squared error
    pub rmse: f64,
    /// Mean squared error
    pub mse: f64,
    /// Coefficient of determination
    pub r_squared: f64,
}

impl FitDiagnostics {
    /// Compare `predicted` against `observed`.
    ///
    /// When the observations have no variance, `r_squared` is 1 for an exact
    /// fit and 0 otherwise.
    pub fn compute(observed: &[f64], predicted: &[f64]) -> Result<Self> {
        if observed.len() != predicted.len() {
            return Err(WaveFitError::DimensionMismatch(format!(
                "{} observations but {} predictions",
                observed.len(),
                predicted.len()
            )));
        }
        if observed.is_empty() {
            return Err(WaveFitError::InvalidInput(
                "cannot compute fit diagnostics without observations".to_string(),
            ));
        }

        let n = observed.len() as f64;
        let ss_res: f64 = observed
            .iter()
            .zip(predicted)
            .map(|(y, p)| (y - p).powi(2))
            .sum();
        let mean = observed.iter().sum::<f64>() / n;
        let ss_tot: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();

        let mse = ss_res / n;
        let r_squared = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else {
            let r_squared = if ss_res == 0.0 { 1.0 } else { 0.0 };
            warn!("observations have zero variance; reporting R² = {}", r_squared);
            r_squared
        };

        Ok(Self {
            rmse: mse.sqrt(),
            mse,
            r_squared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perfect_fit() {
        let y = [1.0, 2.0, 4.0, 8.0];
        let d = FitDiagnostics::compute(&y, &y).unwrap();
        assert_eq!(d.rmse, 0.0);
        assert_eq!(d.mse, 0.0);
        assert_eq!(d.r_squared, 1.0);
    }

    #[test]
    fn test_known_values() {
        let y = [1.0, 2.0, 3.0, 4.0];
        let p = [1.0, 2.0, 3.0, 6.0];
        let d = FitDiagnostics::compute(&y, &p).unwrap();
        assert_relative_eq!(d.mse, 1.0);
        assert_relative_eq!(d.rmse, 1.0);
        // ss_tot = 5, ss_res = 4
        assert_relative_eq!(d.r_squared, 0.2);
    }

    #[test]
    fn test_constant_observations() {
        let y = [3.0, 3.0, 3.0];
        assert_eq!(FitDiagnostics::compute(&y, &y).unwrap().r_squared, 1.0);
        assert_eq!(FitDiagnostics::compute(&y, &[3.0, 3.0, 4.0]).unwrap().r_squared, 0.0);
    }

    #[test]
    fn test_invalid_lengths() {
        assert!(FitDiagnostics::compute(&[1.0], &[1.0, 2.0]).is_err());
        assert!(FitDiagnostics::compute(&[], &[]).is_err());
    }
}
