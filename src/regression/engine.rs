//! Multi-start bounded regression.
//!
//! The loss surface of the logistic family is not convex, so a single local
//! fit from an arbitrary start can stall in a poor basin. The engine draws
//! `sample_count` starting points uniformly from the bounds box, runs the
//! bounded Levenberg-Marquardt solver from each, and keeps the run with the
//! lowest RMSE.
//!
//! All starting points are drawn up front from one generator seeded by
//! [`HyperParameters::seed`], and the runs are reduced in sample order, so the
//! result does not depend on whether the runs execute serially or on the
//! rayon pool.

use log::{debug, info, warn};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::diagnostics::FitDiagnostics;
use crate::error::{Result, WaveFitError};
use crate::lm::{ConvergenceStatus, LevenbergMarquardt, LmConfig};
use crate::models::WaveModel;
use crate::parameters::{HyperParameters, ParameterBounds, ParameterVector};
use crate::problem::CurveProblem;
use crate::series::TimeSeries;
use crate::uncertainty::{prediction_band, ConfidenceBand};

/// Best fit found by a multi-start regression call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Full parameter vector, fixed parameters included
    pub parameters: ParameterVector,
    /// Model evaluated at the training times
    pub predicted: TimeSeries,
    pub diagnostics: FitDiagnostics,
    /// Index of the winning Monte Carlo sample
    pub sample_index: usize,
    /// Samples skipped because the local solver failed
    pub failed_samples: usize,
}

impl FitResult {
    /// Prediction band of this fit over `grid`.
    ///
    /// `model` and `training` must be the ones the fit was obtained with.
    pub fn prediction_band<M: WaveModel + ?Sized>(
        &self,
        model: &M,
        training: &TimeSeries,
        grid: &[f64],
        confidence: f64,
    ) -> Result<ConfidenceBand> {
        prediction_band(model, self.parameters.values(), training, grid, confidence)
    }
}

/// Index of the lowest finite RMSE; the earliest index wins ties.
///
/// Failed samples are represented by a non-finite RMSE and never selected.
pub fn select_best(rmse: &[f64]) -> Option<usize> {
    rmse.iter()
        .enumerate()
        .filter(|(_, r)| r.is_finite())
        .fold(None, |best: Option<(usize, f64)>, (i, &r)| match best {
            Some((_, best_rmse)) if r >= best_rmse => best,
            _ => Some((i, r)),
        })
        .map(|(i, _)| i)
}

/// Draw `count` starting points uniformly from `bounds`, one coordinate per
/// bounded parameter.
pub fn draw_initial_guesses(
    bounds: &ParameterBounds,
    count: usize,
    seed: u64,
) -> Result<Vec<Array1<f64>>> {
    let distributions = bounds
        .iter()
        .enumerate()
        .map(|(i, b)| {
            if !b.width().is_finite() {
                return Err(WaveFitError::Configuration(format!(
                    "bounds of free parameter {} are too wide to sample: [{}, {}]",
                    i, b.min, b.max
                )));
            }
            Ok(Uniform::new_inclusive(b.min, b.max))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rng = StdRng::seed_from_u64(seed);
    Ok((0..count)
        .map(|_| distributions.iter().map(|d| d.sample(&mut rng)).collect())
        .collect())
}

/// Outcome of one local fit.
struct SampleFit {
    free: Array1<f64>,
    predicted: Vec<f64>,
    diagnostics: FitDiagnostics,
    status: ConvergenceStatus,
}

/// Multi-start bounded nonlinear least-squares engine.
#[derive(Debug, Clone)]
pub struct RegressionEngine {
    solver: LevenbergMarquardt,
    parallel: bool,
}

impl Default for RegressionEngine {
    fn default() -> Self {
        Self {
            solver: LevenbergMarquardt::new(),
            parallel: true,
        }
    }
}

impl RegressionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` for every local fit.
    pub fn with_config(mut self, config: LmConfig) -> Self {
        self.solver = LevenbergMarquardt::with_config(config);
        self
    }

    /// Run the local fits on the rayon pool. Without the `parallel` feature
    /// this setting has no effect.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Fit `model` to `series` from `hyper.sample_count` random starts.
    ///
    /// # Errors
    ///
    /// * `Configuration` for a zero sample count, a bounds/model mismatch or
    ///   unusable fixed parameters
    /// * `InvalidInput` for an empty series
    /// * `NoFeasibleFit` if every local fit failed
    pub fn fit<M: WaveModel + ?Sized>(
        &self,
        series: &TimeSeries,
        model: &M,
        hyper: &HyperParameters,
    ) -> Result<FitResult> {
        let layout = hyper.layout_for(model)?;
        if series.is_empty() {
            return Err(WaveFitError::InvalidInput(
                "cannot fit an empty series".to_string(),
            ));
        }

        let seed = hyper.seed.unwrap_or_else(rand::random);
        debug!(
            "multi-start fit: {} samples, {} free of {} parameters, seed {}",
            hyper.sample_count,
            layout.free_count(),
            layout.full_count(),
            seed
        );

        let guesses = draw_initial_guesses(&hyper.bounds, hyper.sample_count, seed)?;
        let times = series.times_f64();
        let problem = CurveProblem::new(model, &layout, &times, series.values())?;
        let lower = hyper.bounds.lower();
        let upper = hyper.bounds.upper();

        let run = |guess: &Array1<f64>| -> Result<SampleFit> {
            let result = self.solver.minimize_bounded(&problem, guess.clone(), lower, upper)?;
            let predicted = problem.predict(&result.params);
            let diagnostics = FitDiagnostics::compute(series.values(), &predicted)?;
            Ok(SampleFit {
                free: result.params,
                predicted,
                diagnostics,
                status: result.status,
            })
        };

        let outcomes: Vec<Result<SampleFit>> = self.run_all(&guesses, run);

        let mut failed_samples = 0;
        let rmse: Vec<f64> = outcomes
            .iter()
            .enumerate()
            .map(|(i, outcome)| match outcome {
                Ok(fit) if fit.diagnostics.rmse.is_finite() => {
                    debug!(
                        "sample {}: rmse {:.6e} ({})",
                        i,
                        fit.diagnostics.rmse,
                        fit.status.description()
                    );
                    fit.diagnostics.rmse
                }
                Ok(_) => {
                    failed_samples += 1;
                    warn!("sample {} skipped: non-finite rmse", i);
                    f64::INFINITY
                }
                Err(e) => {
                    failed_samples += 1;
                    warn!("sample {} skipped: {}", i, e);
                    f64::INFINITY
                }
            })
            .collect();

        let best = select_best(&rmse).ok_or(WaveFitError::NoFeasibleFit {
            samples: hyper.sample_count,
        })?;
        let fit = match &outcomes[best] {
            Ok(fit) => fit,
            Err(_) => {
                return Err(WaveFitError::NoFeasibleFit {
                    samples: hyper.sample_count,
                })
            }
        };

        let parameters = model.parameter_vector(layout.expand(&fit.free.to_vec()))?;
        let predicted = TimeSeries::new(series.times().to_vec(), fit.predicted.clone())?;

        info!(
            "best of {} samples is #{} ({} failed): {} (rmse {:.6e}, R² {:.6})",
            hyper.sample_count,
            best,
            failed_samples,
            parameters,
            fit.diagnostics.rmse,
            fit.diagnostics.r_squared
        );

        Ok(FitResult {
            parameters,
            predicted,
            diagnostics: fit.diagnostics,
            sample_index: best,
            failed_samples,
        })
    }

    /// Evaluate `run` for every guess, preserving sample order.
    fn run_all<F>(&self, guesses: &[Array1<f64>], run: F) -> Vec<Result<SampleFit>>
    where
        F: Fn(&Array1<f64>) -> Result<SampleFit> + Sync,
    {
        #[cfg(feature = "parallel")]
        if self.parallel {
            return guesses.par_iter().map(|g| run(g)).collect();
        }

        guesses.iter().map(run).collect()
    }
}
