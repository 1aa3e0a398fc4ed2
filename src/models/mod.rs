//! Parametric growth-curve models.
//!
//! This module provides the logistic family used to describe epidemic waves
//! and the [`WaveModel`] capability trait through which the regression engine,
//! the prediction-band estimator and callers evaluate a model without knowing
//! its concrete shape.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveFitError};
use crate::parameters::{Bounds, ParameterBounds, ParameterVector};

mod logistic;

pub use logistic::{
    ln_sigmoid_density, logistic_cumulative, logistic_cumulative_gradient, logistic_rate,
    logistic_rate_gradient, multi_wave_cumulative, multi_wave_rate, sigmoid, sigmoid_density,
    Wave,
};

/// A model mapping a time value and a parameter vector to a prediction.
///
/// Implementations assume `params.len() == self.parameter_count()`; callers
/// that accept user input validate the length first.
pub trait WaveModel: Send + Sync {
    /// Number of parameters in the model signature.
    fn parameter_count(&self) -> usize;

    /// Parameter names, in the positional order used by bounds and vectors.
    fn parameter_names(&self) -> Vec<String>;

    /// Evaluate the model at time `t`.
    fn evaluate(&self, t: f64, params: &[f64]) -> f64;

    /// Write the partial derivatives of the model at `t` into `out`.
    fn gradient(&self, t: f64, params: &[f64], out: &mut [f64]);

    /// Evaluate the model at every time in `times`.
    fn evaluate_all(&self, times: &[f64], params: &[f64]) -> Vec<f64> {
        times.iter().map(|&t| self.evaluate(t, params)).collect()
    }

    /// Pair `values` with this model's parameter names.
    fn parameter_vector(&self, values: Vec<f64>) -> Result<ParameterVector> {
        ParameterVector::new(self.parameter_names(), values)
    }
}

/// Role of a parameter within a wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Asymptotic magnitude `K`
    Magnitude,
    /// Growth rate `r`
    Rate,
    /// Inflection time `tau`
    Inflection,
}

impl ParameterKind {
    /// Relative box `[lo, hi] * initial` used when deriving bounds from an
    /// initial estimate.
    pub fn default_factors(self) -> (f64, f64) {
        match self {
            ParameterKind::Magnitude => (0.5, 1.5),
            ParameterKind::Rate => (0.1, 10.0),
            ParameterKind::Inflection => (0.9, 1.1),
        }
    }
}

/// The fixed set of model shapes supported by the library.
///
/// Parameter order is `[K, r, tau]` for the single-wave shapes and
/// `[K1..Kn, r1..rn, tau1..taun]` for `MultiWave(n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveShape {
    /// Incidence rate of one logistic wave
    SingleWave,
    /// Cumulative (prevalence) curve of one logistic wave
    SingleWaveCumulative,
    /// Sum of `n` independent incidence waves
    MultiWave(usize),
}

impl WaveShape {
    /// The six-wave superposition used for long multi-wave series.
    pub const fn six_wave() -> Self {
        WaveShape::MultiWave(6)
    }

    /// Number of waves in the shape.
    pub fn wave_count(&self) -> usize {
        match self {
            WaveShape::SingleWave | WaveShape::SingleWaveCumulative => 1,
            WaveShape::MultiWave(n) => *n,
        }
    }

    /// Role of the parameter at `index`.
    pub fn kind(&self, index: usize) -> ParameterKind {
        match index / self.wave_count().max(1) {
            0 => ParameterKind::Magnitude,
            1 => ParameterKind::Rate,
            _ => ParameterKind::Inflection,
        }
    }

    /// Decode a parameter vector into its waves.
    pub fn waves(&self, params: &[f64]) -> Result<Vec<Wave>> {
        if params.len() != self.parameter_count() {
            return Err(WaveFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                self.parameter_count(),
                params.len()
            )));
        }
        let n = self.wave_count();
        Ok((0..n)
            .map(|i| Wave::new(params[i], params[n + i], params[2 * n + i]))
            .collect())
    }

    /// Bounds around an initial estimate using the per-kind relative factors,
    /// skipping parameters named in `fixed`.
    ///
    /// `K` spans `[0.5, 1.5]`, `r` spans `[0.1, 10]` and `tau` spans
    /// `[0.9, 1.1]` times its initial value.
    pub fn default_bounds(&self, initial: &[f64], fixed: &[&str]) -> Result<ParameterBounds> {
        if initial.len() != self.parameter_count() {
            return Err(WaveFitError::DimensionMismatch(format!(
                "Expected {} initial values, got {}",
                self.parameter_count(),
                initial.len()
            )));
        }

        let names = self.parameter_names();
        let mut bounds = Vec::with_capacity(initial.len());
        for (index, &value) in initial.iter().enumerate() {
            if fixed.contains(&names[index].as_str()) {
                continue;
            }
            let (lo, hi) = self.kind(index).default_factors();
            bounds.push(Bounds::relative(value, lo, hi)?);
        }

        Ok(ParameterBounds::from_bounds(&bounds)?)
    }
}

impl WaveModel for WaveShape {
    fn parameter_count(&self) -> usize {
        3 * self.wave_count()
    }

    fn parameter_names(&self) -> Vec<String> {
        match self {
            WaveShape::SingleWave | WaveShape::SingleWaveCumulative => {
                vec!["K".to_string(), "r".to_string(), "tau".to_string()]
            }
            WaveShape::MultiWave(n) => ["K", "r", "tau"]
                .iter()
                .flat_map(|prefix| (1..=*n).map(move |i| format!("{}{}", prefix, i)))
                .collect(),
        }
    }

    fn evaluate(&self, t: f64, params: &[f64]) -> f64 {
        debug_assert_eq!(params.len(), self.parameter_count());
        match self {
            WaveShape::SingleWave => logistic_rate(t, params[0], params[1], params[2]),
            WaveShape::SingleWaveCumulative => {
                logistic_cumulative(t, params[0], params[1], params[2])
            }
            WaveShape::MultiWave(n) => (0..*n)
                .map(|i| logistic_rate(t, params[i], params[n + i], params[2 * n + i]))
                .sum(),
        }
    }

    fn gradient(&self, t: f64, params: &[f64], out: &mut [f64]) {
        debug_assert_eq!(params.len(), self.parameter_count());
        debug_assert_eq!(out.len(), self.parameter_count());
        match self {
            WaveShape::SingleWave => {
                out.copy_from_slice(&logistic_rate_gradient(t, params[0], params[1], params[2]))
            }
            WaveShape::SingleWaveCumulative => out.copy_from_slice(
                &logistic_cumulative_gradient(t, params[0], params[1], params[2]),
            ),
            WaveShape::MultiWave(n) => {
                let n = *n;
                for i in 0..n {
                    let g = logistic_rate_gradient(t, params[i], params[n + i], params[2 * n + i]);
                    out[i] = g[0];
                    out[n + i] = g[1];
                    out[2 * n + i] = g[2];
                }
            }
        }
    }
}
