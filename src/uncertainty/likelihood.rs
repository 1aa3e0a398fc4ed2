//! Maximum-likelihood refit of a single wave and information criteria.
//!
//! With the inflection time `tau` held fixed, the logistic rate is treated
//! as an unnormalized density over the observation times and the negative
//! log-likelihood
//!
//! $f(K, r) = -\sum_i \left[\ln K + \ln r + \ln \sigma'(r u_i)\right], \quad u_i = t_i - \tau$
//!
//! is minimized inside a box, where `σ'(x) = σ(x)(1 - σ(x))`. Gradient and
//! Hessian are closed-form:
//!
//! * `∂f/∂K = -N/K`, `∂f/∂r = -N/r - Σ u_i (1 - 2σ(r u_i))`
//! * `∂²f/∂K² = N/K²`, `∂²f/∂K∂r = 0`, `∂²f/∂r² = N/r² + 2 Σ u_i² σ'(r u_i)`
//!
//! The objective is strictly decreasing in `K`, so the estimate of `K` always
//! ends on its upper bound. Only `r` and the attained likelihood carry
//! information, which is all the information criteria use.

use log::{debug, warn};
use ndarray::{array, Array1, Array2};
use serde::{Deserialize, Serialize};

use super::domain::{DomainPolicy, DomainReport};
use crate::error::{Result, WaveFitError};
use crate::lm::{ConvergenceCriteria, ConvergenceStatus, LmConfig, LmStep, TrustRegion};
use crate::models::{ln_sigmoid_density, sigmoid, sigmoid_density};
use crate::parameters::Bounds;

/// Number of estimated parameters, `K` and `r`.
const MLE_PARAMETERS: usize = 2;

/// Settings of the likelihood optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MleConfig {
    /// Admissible range of `K`. Default: `[0, 1e7]`
    pub k_bounds: Bounds,
    /// Admissible range of `r`. Default: `[0, 1]`
    pub r_bounds: Bounds,
    /// Default: 400
    pub max_iterations: usize,
    /// Projected-gradient tolerance. Default: 1e-4
    pub tol: f64,
}

impl Default for MleConfig {
    fn default() -> Self {
        Self {
            k_bounds: Bounds { min: 0.0, max: 1e7 },
            r_bounds: Bounds { min: 0.0, max: 1.0 },
            max_iterations: 400,
            tol: 1e-4,
        }
    }
}

/// Outcome of a maximum-likelihood fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationCriteria {
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    /// Estimated magnitude
    pub k: f64,
    /// Estimated growth rate
    pub r: f64,
    /// Inflection time held fixed during the fit
    pub tau: f64,
    /// Number of observation times
    pub n: usize,
    pub iterations: usize,
    pub converged: bool,
    /// Suppressed log/division events at the optimum
    pub domain: DomainReport,
}

/// Akaike information criterion `2p - 2 LL`.
pub fn aic(log_likelihood: f64, p: usize) -> f64 {
    2.0 * p as f64 - 2.0 * log_likelihood
}

/// Bayesian information criterion `p ln N - 2 LL`.
pub fn bic(log_likelihood: f64, p: usize, n: usize) -> f64 {
    p as f64 * (n as f64).ln() - 2.0 * log_likelihood
}

/// Negative log-likelihood of `(k, r)` at the observation `times`.
pub fn negative_log_likelihood(
    times: &[f64],
    tau: f64,
    k: f64,
    r: f64,
    policy: &mut DomainPolicy,
) -> f64 {
    -times
        .iter()
        .map(|&t| {
            policy.safe_ln(k) + policy.safe_ln(r) + ln_rate_shape(r * (t - tau), policy)
        })
        .sum::<f64>()
}

/// `ln σ'(x)` in its stable form, except where `σ'(x)` itself underflows to
/// zero: the model rate is exactly zero there and the term goes through the
/// domain policy.
fn ln_rate_shape(x: f64, policy: &mut DomainPolicy) -> f64 {
    if sigmoid_density(x) == 0.0 {
        policy.safe_ln(0.0)
    } else {
        ln_sigmoid_density(x)
    }
}

/// Gradient of [`negative_log_likelihood`] with respect to `(k, r)`.
pub fn nll_gradient(
    times: &[f64],
    tau: f64,
    k: f64,
    r: f64,
    policy: &mut DomainPolicy,
) -> [f64; 2] {
    let n = times.len() as f64;
    let skew: f64 = times
        .iter()
        .map(|&t| {
            let u = t - tau;
            u * (1.0 - 2.0 * sigmoid(r * u))
        })
        .sum();

    [-policy.safe_div(n, k), -policy.safe_div(n, r) - skew]
}

/// Hessian of [`negative_log_likelihood`] with respect to `(k, r)`.
pub fn nll_hessian(
    times: &[f64],
    tau: f64,
    k: f64,
    r: f64,
    policy: &mut DomainPolicy,
) -> [[f64; 2]; 2] {
    let n = times.len() as f64;
    let curvature: f64 = times
        .iter()
        .map(|&t| {
            let u = t - tau;
            2.0 * u * u * sigmoid_density(r * u)
        })
        .sum();

    [
        [policy.safe_div(n, k * k), 0.0],
        [0.0, policy.safe_div(n, r * r) + curvature],
    ]
}

/// Maximum-likelihood estimator for the fixed-`tau` single wave.
#[derive(Debug, Clone, Default)]
pub struct MaximumLikelihood {
    config: MleConfig,
}

impl MaximumLikelihood {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MleConfig) -> Self {
        Self { config }
    }

    /// Maximize the likelihood of `(K, r)` starting from the least-squares
    /// estimate `(k0, r0)` and report AIC/BIC with `p = 2`, `N = times.len()`.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` if `times` is empty or contains non-finite values
    /// * `Configuration` if a bound is inverted
    pub fn estimate(
        &self,
        times: &[f64],
        tau: f64,
        k0: f64,
        r0: f64,
    ) -> Result<InformationCriteria> {
        if times.is_empty() {
            return Err(WaveFitError::InvalidInput(
                "likelihood needs at least one observation time".to_string(),
            ));
        }
        if !tau.is_finite() || times.iter().any(|t| !t.is_finite()) {
            return Err(WaveFitError::InvalidInput(
                "observation times and tau must be finite".to_string(),
            ));
        }
        let (kb, rb) = (self.config.k_bounds, self.config.r_bounds);
        for (name, b) in [("K", kb), ("r", rb)] {
            if !(b.min <= b.max) {
                return Err(WaveFitError::Configuration(format!(
                    "invalid bounds for {}: [{}, {}]",
                    name, b.min, b.max
                )));
            }
        }

        let lower = [kb.min, rb.min];
        let upper = [kb.max, rb.max];
        let mut x = array![kb.clamp(k0), rb.clamp(r0)];

        let objective = |x: &Array1<f64>, policy: &mut DomainPolicy| {
            negative_log_likelihood(times, tau, x[0], x[1], policy)
        };

        let mut scratch = DomainPolicy::new();
        let mut f = objective(&x, &mut scratch);

        let lm_config = LmConfig {
            max_iterations: self.config.max_iterations,
            ..LmConfig::default()
        };
        let criteria =
            ConvergenceCriteria::new(1e-12, 1e-14, self.config.tol, self.config.max_iterations);
        let mut trust = TrustRegion::from_config(&lm_config);
        let mut iterations = 0;

        let status = if !f.is_finite() {
            warn!(
                "likelihood is not finite at the starting point (K = {}, r = {})",
                x[0], x[1]
            );
            ConvergenceStatus::NumericalError
        } else {
            loop {
                let g = nll_gradient(times, tau, x[0], x[1], &mut scratch);
                let h = nll_hessian(times, tau, x[0], x[1], &mut scratch);

                let free: Vec<usize> = (0..MLE_PARAMETERS)
                    .filter(|&i| {
                        !((x[i] <= lower[i] && g[i] > 0.0) || (x[i] >= upper[i] && g[i] < 0.0))
                    })
                    .collect();
                let projected_norm = free.iter().map(|&i| g[i] * g[i]).sum::<f64>().sqrt();

                // The objective never reaches zero; only the gradient and
                // iteration tests apply here
                let status = criteria.check_start(f64::NAN, projected_norm, iterations);
                if status.is_terminated() {
                    break status;
                }
                iterations += 1;

                let step_free = newton_step(&free, &g, &h, trust.lambda);
                let mut trial = x.clone();
                for (k, &i) in free.iter().enumerate() {
                    trial[i] = (x[i] + step_free[k]).clamp(lower[i], upper[i]);
                }
                let s = &trial - &x;
                let predicted = -(g[0] * s[0] + g[1] * s[1])
                    - 0.5 * (h[0][0] * s[0] * s[0] + h[1][1] * s[1] * s[1]);

                let f_trial = objective(&trial, &mut scratch);
                let gain = TrustRegion::gain_ratio(f, f_trial, predicted);

                if trust.update_lambda(gain) {
                    let status = criteria.check_step(&x, &trial, f, f_trial, gain);
                    x = trial;
                    f = f_trial;
                    if status.is_terminated() {
                        break status;
                    }
                } else if trust.is_saturated() {
                    break ConvergenceStatus::NumericalError;
                }
            }
        };

        // Domain events are reported for the optimum only
        let mut policy = DomainPolicy::new();
        let nll = objective(&x, &mut policy);
        let domain = policy.into_report();
        if !domain.is_empty() {
            warn!("suppressed numeric-domain events in likelihood: {}", domain);
        }

        let log_likelihood = -nll;
        let n = times.len();
        let result = InformationCriteria {
            log_likelihood,
            aic: aic(log_likelihood, MLE_PARAMETERS),
            bic: bic(log_likelihood, MLE_PARAMETERS, n),
            k: x[0],
            r: x[1],
            tau,
            n,
            iterations,
            converged: status.is_converged(),
            domain,
        };

        debug!(
            "MLE finished after {} iterations ({}): K = {}, r = {}, LL = {}",
            iterations,
            status.description(),
            result.k,
            result.r,
            result.log_likelihood
        );

        Ok(result)
    }
}

/// Damped Newton step on the free coordinates.
///
/// Falls back to a diagonally scaled gradient step if the damped system
/// cannot be solved or does not give a descent direction.
fn newton_step(free: &[usize], g: &[f64; 2], h: &[[f64; 2]; 2], lambda: f64) -> Array1<f64> {
    let m = free.len();
    let hessian = Array2::from_shape_fn((m, m), |(a, b)| h[free[a]][free[b]]);
    let gradient: Array1<f64> = free.iter().map(|&i| g[i]).collect();

    match LmStep::solve_damped(&hessian, &gradient, lambda) {
        Ok(step) if step.dot(&gradient) < 0.0 => step,
        _ => gradient
            .iter()
            .enumerate()
            .map(|(a, &gi)| -gi / (hessian[[a, a]].abs().max(1.0) * (1.0 + lambda)))
            .collect(),
    }
}
