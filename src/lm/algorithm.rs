//! Implementation of the bounded Levenberg-Marquardt algorithm.
//!
//! Each trial step is computed on the free variables only and projected onto
//! the box `[lower, upper]`. A variable sitting on a bound whose gradient
//! pushes it further outside is held fixed for that iteration (active set),
//! so the remaining variables can still make progress.

use std::fmt;

use log::{debug, trace};
use ndarray::{Array1, Axis};

use crate::error::{Result, WaveFitError};
use crate::problem::Problem;

use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;
use super::trust_region::TrustRegion;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of residual evaluations
    pub func_evals: usize,

    /// Whether a convergence criterion was met
    pub success: bool,

    /// Why the iteration stopped
    pub status: ConvergenceStatus,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for relative change in cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for relative change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for the projected gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Report runs that exhaust the iteration budget as errors.
    pub fn with_require_convergence(mut self, require: bool) -> Self {
        self.config.require_convergence = require;
        self
    }

    /// Minimize the sum of squared residuals inside the box `[lower, upper]`.
    ///
    /// The initial guess is clipped into the box. Every pass through the main
    /// loop, accepted or not, counts as one iteration.
    ///
    /// # Errors
    ///
    /// * `DimensionMismatch` if the guess or bounds do not match the problem
    /// * `Configuration` if some `lower[i] > upper[i]`
    /// * `ConvergenceFailure` if the initial cost is not finite, or if
    ///   `require_convergence` is set and no criterion was met
    pub fn minimize_bounded<P: Problem>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
        lower: &[f64],
        upper: &[f64],
    ) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params || lower.len() != n_params || upper.len() != n_params {
            return Err(WaveFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {} initial values and {}/{} bounds",
                n_params,
                initial_params.len(),
                lower.len(),
                upper.len()
            )));
        }
        for i in 0..n_params {
            if !(lower[i] <= upper[i]) {
                return Err(WaveFitError::Configuration(format!(
                    "lower bound {} exceeds upper bound {} for parameter {}",
                    lower[i], upper[i], i
                )));
            }
        }

        let mut params = project(&initial_params, lower, upper);
        let mut residuals = problem.eval(&params)?;
        let mut cost = sum_of_squares(&residuals);
        let mut func_evals = 1;
        if !cost.is_finite() {
            return Err(WaveFitError::ConvergenceFailure(format!(
                "cost at the initial guess is not finite ({})",
                cost
            )));
        }

        let criteria = ConvergenceCriteria::from(&self.config);
        let mut trust = TrustRegion::from_config(&self.config);
        let mut jacobian = problem.jacobian(&params)?;
        let mut iterations = 0;

        let status = loop {
            let gradient = jacobian.t().dot(&residuals);
            let free = free_variables(&params, &gradient, lower, upper);
            let projected_norm = free
                .iter()
                .map(|&i| gradient[i] * gradient[i])
                .sum::<f64>()
                .sqrt();

            let status = criteria.check_start(cost, projected_norm, iterations);
            if status.is_terminated() {
                break status;
            }
            iterations += 1;

            let reduced = jacobian.select(Axis(1), &free);
            let reduced_step = match LmStep::calculate_step(&reduced, &residuals, trust.lambda) {
                Ok(step) => step,
                Err(WaveFitError::LinearAlgebra(msg)) => {
                    trace!("iteration {}: {}", iterations, msg);
                    trust.update_lambda(0.0);
                    if trust.is_saturated() {
                        break ConvergenceStatus::NumericalError;
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            let mut trial = params.clone();
            for (k, &i) in free.iter().enumerate() {
                trial[i] = (params[i] + reduced_step[k]).clamp(lower[i], upper[i]);
            }
            let step = &trial - &params;
            let predicted = LmStep::predicted_reduction(&jacobian, &residuals, &step);

            let trial_residuals = problem.eval(&trial)?;
            func_evals += 1;
            let trial_cost = sum_of_squares(&trial_residuals);
            let gain = TrustRegion::gain_ratio(cost, trial_cost, predicted);

            if trust.update_lambda(gain) {
                let status = criteria.check_step(&params, &trial, cost, trial_cost, gain);
                params = trial;
                residuals = trial_residuals;
                cost = trial_cost;
                if status.is_terminated() {
                    break status;
                }
                jacobian = problem.jacobian(&params)?;
            } else if trust.is_saturated() {
                break ConvergenceStatus::NumericalError;
            }
        };

        let success = status.is_converged();
        debug!(
            "LM finished after {} iterations: {} (cost {:.6e})",
            iterations,
            status.description(),
            cost
        );

        if self.config.require_convergence && !success {
            return Err(WaveFitError::ConvergenceFailure(format!(
                "{} after {} iterations",
                status.description(),
                iterations
            )));
        }

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            success,
            status,
            message: status.description().to_string(),
        })
    }
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// Clip `params` into `[lower, upper]` componentwise.
fn project(params: &Array1<f64>, lower: &[f64], upper: &[f64]) -> Array1<f64> {
    params
        .iter()
        .zip(lower.iter().zip(upper))
        .map(|(&p, (&lo, &hi))| p.clamp(lo, hi))
        .collect()
}

/// Indices not pinned to a bound by a gradient pointing out of the box.
fn free_variables(
    params: &Array1<f64>,
    gradient: &Array1<f64>,
    lower: &[f64],
    upper: &[f64],
) -> Vec<usize> {
    (0..params.len())
        .filter(|&i| {
            let at_lower = params[i] <= lower[i] && gradient[i] > 0.0;
            let at_upper = params[i] >= upper[i] && gradient[i] < 0.0;
            !(at_lower || at_upper)
        })
        .collect()
}
