//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! The step solves the Marquardt-scaled normal equations
//!
//! $(J^T J + \lambda \, \mathrm{diag}(J^T J)) \delta = -J^T r$
//!
//! which interpolates between a Gauss-Newton step (small `lambda`) and a
//! scaled gradient-descent step (large `lambda`).

use nalgebra::linalg::Cholesky;
use ndarray::{Array1, Array2};

use crate::error::{Result, WaveFitError};
use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

/// Floor for diagonal scaling entries so zero columns still get damped.
const MIN_DIAGONAL: f64 = 1e-10;

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Calculates the Levenberg-Marquardt step for the given Jacobian
    /// columns and residuals.
    pub fn calculate_step(
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        lambda: f64,
    ) -> Result<Array1<f64>> {
        if jacobian.nrows() != residuals.len() {
            return Err(WaveFitError::DimensionMismatch(format!(
                "Jacobian has {} rows but there are {} residuals",
                jacobian.nrows(),
                residuals.len()
            )));
        }

        let j_t_j = jacobian.t().dot(jacobian);
        let j_t_r = jacobian.t().dot(residuals);

        Self::solve_damped(&j_t_j, &j_t_r, lambda)
    }

    /// Solves `(A + lambda * diag(A)) x = -b` for a symmetric matrix `A`.
    ///
    /// Cholesky is tried first; an indefinite system falls back to LU.
    pub fn solve_damped(a: &Array2<f64>, b: &Array1<f64>, lambda: f64) -> Result<Array1<f64>> {
        let mut augmented = ndarray_to_nalgebra(a);
        for i in 0..augmented.nrows() {
            augmented[(i, i)] += lambda * augmented[(i, i)].abs().max(MIN_DIAGONAL);
        }
        let rhs = -ndarray_vec_to_nalgebra(b);

        let solution = match Cholesky::new(augmented.clone()) {
            Some(cholesky) => cholesky.solve(&rhs),
            None => augmented.lu().solve(&rhs).ok_or_else(|| {
                WaveFitError::LinearAlgebra("damped normal equations are singular".to_string())
            })?,
        };

        if solution.iter().any(|v| !v.is_finite()) {
            return Err(WaveFitError::LinearAlgebra(
                "step contains non-finite values".to_string(),
            ));
        }

        Ok(nalgebra_vec_to_ndarray(&solution))
    }

    /// Reduction in the sum of squared residuals predicted by the linear
    /// model for `step`: `-2 r^T J step - |J step|^2`.
    pub fn predicted_reduction(
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        step: &Array1<f64>,
    ) -> f64 {
        let j_step = jacobian.dot(step);
        -2.0 * residuals.dot(&j_step) - j_step.dot(&j_step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_undamped_step_is_gauss_newton() {
        // Linear residuals r = J x - y at x = 0: the Gauss-Newton step solves J x = y
        let jac = array![[1.0, 0.0], [0.0, 2.0], [1.0, 1.0]];
        let y = array![1.0, 4.0, 3.0];
        let residuals = -&y;

        let step = LmStep::calculate_step(&jac, &residuals, 0.0).unwrap();
        assert_relative_eq!(step[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(step[1], 2.0, epsilon = 1e-10);

        // The full step removes all of the (consistent) residual
        let predicted = LmStep::predicted_reduction(&jac, &residuals, &step);
        assert_relative_eq!(predicted, residuals.dot(&residuals), epsilon = 1e-10);
    }

    #[test]
    fn test_damping_shortens_step() {
        let jac = array![[1.0, 0.0], [0.0, 2.0], [1.0, 1.0]];
        let residuals = array![-1.0, -4.0, -3.0];

        let small = LmStep::calculate_step(&jac, &residuals, 1e-6).unwrap();
        let large = LmStep::calculate_step(&jac, &residuals, 1e3).unwrap();
        assert!(large.dot(&large) < small.dot(&small));
        assert!(LmStep::predicted_reduction(&jac, &residuals, &large) > 0.0);
    }

    #[test]
    fn test_singular_system_falls_back() {
        // A zero column is still damped by the diagonal floor
        let jac = array![[1.0, 0.0], [2.0, 0.0]];
        let residuals = array![1.0, 2.0];
        let step = LmStep::calculate_step(&jac, &residuals, 1e-3).unwrap();
        assert!(step[0] < 0.0);
        assert_relative_eq!(step[1], 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let jac = array![[1.0], [2.0]];
        let residuals = array![1.0];
        assert!(matches!(
            LmStep::calculate_step(&jac, &residuals, 1.0),
            Err(WaveFitError::DimensionMismatch(_))
        ));
    }
}
