//! Logistic growth curves.
//!
//! A wave is characterised by its asymptotic magnitude `K`, growth rate `r`
//! and inflection time `tau`. The cumulative (prevalence) form is
//!
//! $C(t) = \frac{K}{1 + e^{-r(t - \tau)}}$
//!
//! and the rate (incidence) form is its time derivative
//!
//! $I(t) = \frac{r K e^{-r(t - \tau)}}{(1 + e^{-r(t - \tau)})^2}$
//!
//! Both are evaluated through `e^{-|r(t - \tau)|}`, which never overflows, so
//! points far from the inflection simply decay to zero instead of producing
//! `inf / inf`.

use serde::{Deserialize, Serialize};

/// Logistic sigmoid `1 / (1 + e^{-x})` without overflow for large `|x|`.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `s(1 - s)` for `s = sigmoid(x)`, the logistic density shape.
#[inline]
pub fn sigmoid_density(x: f64) -> f64 {
    let e = (-x.abs()).exp();
    e / ((1.0 + e) * (1.0 + e))
}

/// `ln(s(1 - s))` for `s = sigmoid(x)`, finite for every finite `x`.
#[inline]
pub fn ln_sigmoid_density(x: f64) -> f64 {
    let a = x.abs();
    -a - 2.0 * (-a).exp().ln_1p()
}

/// Logistic incidence rate at time `t`.
///
/// Physically implausible parameters (negative `k`, non-positive `r`) are
/// evaluated as-is; keeping them out is the job of the fit bounds.
#[inline]
pub fn logistic_rate(t: f64, k: f64, r: f64, tau: f64) -> f64 {
    r * k * sigmoid_density(r * (t - tau))
}

/// Logistic cumulative value at time `t`.
#[inline]
pub fn logistic_cumulative(t: f64, k: f64, r: f64, tau: f64) -> f64 {
    k * sigmoid(r * (t - tau))
}

/// Partial derivatives of [`logistic_rate`] with respect to `(k, r, tau)`.
pub fn logistic_rate_gradient(t: f64, k: f64, r: f64, tau: f64) -> [f64; 3] {
    let u = t - tau;
    let x = r * u;
    let d = sigmoid_density(x);
    // 1 - 2 sigmoid(x)
    let skew = -(0.5 * x).tanh();

    [r * d, k * d * (1.0 + x * skew), -r * r * k * d * skew]
}

/// Partial derivatives of [`logistic_cumulative`] with respect to `(k, r, tau)`.
pub fn logistic_cumulative_gradient(t: f64, k: f64, r: f64, tau: f64) -> [f64; 3] {
    let u = t - tau;
    let d = sigmoid_density(r * u);

    [sigmoid(r * u), k * u * d, -k * r * d]
}

/// One logistic growth episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub k: f64,
    pub r: f64,
    pub tau: f64,
}

impl Wave {
    pub fn new(k: f64, r: f64, tau: f64) -> Self {
        Self { k, r, tau }
    }

    pub fn rate(&self, t: f64) -> f64 {
        logistic_rate(t, self.k, self.r, self.tau)
    }

    pub fn cumulative(&self, t: f64) -> f64 {
        logistic_cumulative(t, self.k, self.r, self.tau)
    }
}

/// Sum of independent logistic rates. Waves need not be ordered in time.
pub fn multi_wave_rate(t: f64, waves: &[Wave]) -> f64 {
    waves.iter().map(|w| w.rate(t)).sum()
}

/// Sum of independent logistic cumulative curves.
pub fn multi_wave_cumulative(t: f64, waves: &[Wave]) -> f64 {
    waves.iter().map(|w| w.cumulative(t)).sum()
}
