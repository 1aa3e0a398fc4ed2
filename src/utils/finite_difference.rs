//! Finite difference methods for numerical differentiation.
//!
//! Used as the default Jacobian of a [`Problem`] without analytic
//! derivatives, and as an independent check of the closed-form derivatives
//! shipped with the models and the likelihood.

use crate::error::{Result, WaveFitError};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default step size for finite differences.
const DEFAULT_EPSILON: f64 = 1e-8;

/// Step for parameter `value`, scaled to its magnitude.
#[inline]
fn scaled_step(value: f64, eps: f64) -> f64 {
    if value.abs() > eps {
        value.abs() * eps
    } else {
        eps
    }
}

/// Compute the Jacobian matrix using forward finite differences.
///
/// J[i,j] = ∂residual[i]/∂param[j].
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    let residuals = problem.eval(params)?;
    if residuals.len() != n_residuals {
        return Err(WaveFitError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            n_residuals,
            residuals.len()
        )));
    }

    let mut jac = Array2::zeros((n_residuals, n_params));

    for j in 0..n_params {
        let eps_j = scaled_step(params[j], eps);
        let mut perturbed = params.clone();
        perturbed[j] += eps_j;

        let residuals_perturbed = problem.eval(&perturbed)?;
        for i in 0..n_residuals {
            jac[[i, j]] = (residuals_perturbed[i] - residuals[i]) / eps_j;
        }
    }

    Ok(jac)
}

/// Compute the gradient of a scalar function using central finite differences.
pub fn gradient<F>(f: F, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array1<f64>>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let mut grad = Array1::zeros(params.len());

    for j in 0..params.len() {
        let eps_j = scaled_step(params[j], eps);

        let mut forward = params.clone();
        forward[j] += eps_j;
        let mut backward = params.clone();
        backward[j] -= eps_j;

        grad[j] = (f(&forward)? - f(&backward)?) / (2.0 * eps_j);
    }

    Ok(grad)
}

/// Compute the Hessian matrix of a scalar function using central finite
/// differences.
pub fn hessian<F>(f: F, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array2<f64>>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();
    let mut hess = Array2::zeros((n_params, n_params));
    let f0 = f(params)?;

    for i in 0..n_params {
        for j in 0..=i {
            let eps_i = scaled_step(params[i], eps);
            let eps_j = scaled_step(params[j], eps);

            if i == j {
                let mut plus = params.clone();
                let mut minus = params.clone();
                plus[i] += eps_i;
                minus[i] -= eps_i;

                hess[[i, i]] = (f(&plus)? - 2.0 * f0 + f(&minus)?) / (eps_i * eps_i);
            } else {
                let mut pp = params.clone();
                let mut pm = params.clone();
                let mut mp = params.clone();
                let mut mm = params.clone();
                pp[i] += eps_i;
                pp[j] += eps_j;
                pm[i] += eps_i;
                pm[j] -= eps_j;
                mp[i] -= eps_i;
                mp[j] += eps_j;
                mm[i] -= eps_i;
                mm[j] -= eps_j;

                hess[[i, j]] = (f(&pp)? - f(&pm)? - f(&mp)? + f(&mm)?) / (4.0 * eps_i * eps_j);
                hess[[j, i]] = hess[[i, j]];
            }
        }
    }

    Ok(hess)
}
