//! Pointwise prediction bands for fitted wave models.
//!
//! The half-width at grid time `x` is
//!
//! $dy(x) = q \, s_e \sqrt{1 + 1/N + (x - \bar t)^2 / \sum_i (t_i - \bar t)^2}$
//!
//! with `q` the two-sided Student-t critical value on `N - p` degrees of
//! freedom and `s_e` the residual standard error of the training fit. The
//! mean and spread of time are those of the training sample, also for grid
//! points outside it. The band is neither clipped at zero nor forced to be
//! monotone.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{Result, WaveFitError};
use crate::models::WaveModel;
use crate::series::TimeSeries;

/// Lower and upper envelopes of a prediction band over a time grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    /// Evaluation times
    pub grid: Vec<f64>,
    /// Model prediction at each grid time
    pub fitted: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Nominal coverage, e.g. 0.95
    pub confidence: f64,
}

impl ConfidenceBand {
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Half-widths `upper - lower` divided by two.
    pub fn half_widths(&self) -> Vec<f64> {
        self.upper
            .iter()
            .zip(&self.lower)
            .map(|(u, l)| 0.5 * (u - l))
            .collect()
    }

    /// Running sums of the envelopes, turning an incidence band into a
    /// prevalence band.
    pub fn cumulative(&self) -> ConfidenceBand {
        ConfidenceBand {
            grid: self.grid.clone(),
            fitted: running_sum(&self.fitted),
            lower: running_sum(&self.lower),
            upper: running_sum(&self.upper),
            confidence: self.confidence,
        }
    }

    /// First grid time whose lower envelope exceeds `threshold`, used to date
    /// the onset of a wave.
    pub fn first_time_lower_exceeds(&self, threshold: f64) -> Option<f64> {
        self.grid
            .iter()
            .zip(&self.lower)
            .find(|(_, &l)| l > threshold)
            .map(|(&t, _)| t)
    }
}

fn running_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, &v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Two-sided Student-t critical value for `confidence` on `df` degrees of
/// freedom.
pub fn critical_value(confidence: f64, df: f64) -> Result<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(WaveFitError::Configuration(format!(
            "confidence level must lie in (0, 1), got {}",
            confidence
        )));
    }
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| WaveFitError::Configuration(format!("Student-t distribution: {}", e)))?;
    let alpha = 1.0 - confidence;
    Ok(dist.inverse_cdf(1.0 - alpha / 2.0))
}

/// Prediction band of `model` at the full parameter vector `params`, fitted
/// on `training`, evaluated over `grid`.
///
/// `p` is the full parameter count of the model, fixed parameters included.
///
/// # Errors
///
/// * `DegenerateFit` if the training set has no more points than parameters
/// * `Configuration` if `confidence` is outside `(0, 1)`
/// * `DimensionMismatch` if `params` does not match the model
pub fn prediction_band<M: WaveModel + ?Sized>(
    model: &M,
    params: &[f64],
    training: &TimeSeries,
    grid: &[f64],
    confidence: f64,
) -> Result<ConfidenceBand> {
    let p = model.parameter_count();
    if params.len() != p {
        return Err(WaveFitError::DimensionMismatch(format!(
            "Expected {} parameters, got {}",
            p,
            params.len()
        )));
    }
    let n = training.len();
    if n <= p {
        return Err(WaveFitError::DegenerateFit { n, p });
    }

    let df = (n - p) as f64;
    let q = critical_value(confidence, df)?;

    let times = training.times_f64();
    let predicted = model.evaluate_all(&times, params);
    let ssr: f64 = predicted
        .iter()
        .zip(training.values())
        .map(|(m, y)| (y - m).powi(2))
        .sum();
    let se = (ssr / df).sqrt();

    let n_f = n as f64;
    let mean_t = times.iter().sum::<f64>() / n_f;
    let sxx: f64 = times.iter().map(|t| (t - mean_t).powi(2)).sum();

    let fitted = model.evaluate_all(grid, params);
    let (lower, upper) = grid
        .iter()
        .zip(&fitted)
        .map(|(&x, &m)| {
            let dy = q * se * (1.0 + 1.0 / n_f + (x - mean_t).powi(2) / sxx).sqrt();
            (m - dy, m + dy)
        })
        .unzip();

    Ok(ConfidenceBand {
        grid: grid.to_vec(),
        fitted,
        lower,
        upper,
        confidence,
    })
}
