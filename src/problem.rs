//! Problem definition trait and the curve-fitting problem.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem to be solved with the bounded Levenberg-Marquardt
//! solver, and [`CurveProblem`], which adapts a [`WaveModel`] and a training
//! series to it.

use ndarray::{Array1, Array2};

use crate::error::{Result, WaveFitError};
use crate::models::WaveModel;
use crate::parameters::ParameterLayout;

/// A trait representing a nonlinear least squares problem.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the residuals
    ///
    /// # Returns
    ///
    /// * A vector of residuals, or an error if the evaluation fails
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix of the residuals at the given parameters.
    ///
    /// The default implementation uses forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

/// Least-squares problem for fitting a [`WaveModel`] to a training series.
///
/// The solver sees only the free parameters of `layout`; fixed parameters are
/// re-inserted before every model evaluation. Residuals are
/// `model(t_i) - y_i`.
pub struct CurveProblem<'a, M: WaveModel + ?Sized> {
    model: &'a M,
    layout: &'a ParameterLayout,
    times: &'a [f64],
    values: &'a [f64],
}

impl<'a, M: WaveModel + ?Sized> CurveProblem<'a, M> {
    pub fn new(
        model: &'a M,
        layout: &'a ParameterLayout,
        times: &'a [f64],
        values: &'a [f64],
    ) -> Result<Self> {
        if times.len() != values.len() {
            return Err(WaveFitError::DimensionMismatch(format!(
                "Expected x and y data to have the same length, got {} and {}",
                times.len(),
                values.len()
            )));
        }
        if layout.full_count() != model.parameter_count() {
            return Err(WaveFitError::DimensionMismatch(format!(
                "Layout describes {} parameters, model has {}",
                layout.full_count(),
                model.parameter_count()
            )));
        }
        Ok(Self {
            model,
            layout,
            times,
            values,
        })
    }

    /// Model predictions at the training times for a free-parameter vector.
    pub fn predict(&self, free: &Array1<f64>) -> Vec<f64> {
        let full = self.layout.expand(&free.to_vec());
        self.model.evaluate_all(self.times, &full)
    }

    fn check_len(&self, params: &Array1<f64>) -> Result<()> {
        if params.len() != self.layout.free_count() {
            return Err(WaveFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                self.layout.free_count(),
                params.len()
            )));
        }
        Ok(())
    }
}

impl<'a, M: WaveModel + ?Sized> Problem for CurveProblem<'a, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.check_len(params)?;
        let predicted = self.predict(params);
        Ok(predicted
            .iter()
            .zip(self.values.iter())
            .map(|(p, y)| p - y)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        self.layout.free_count()
    }

    fn residual_count(&self) -> usize {
        self.times.len()
    }

    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>> {
        self.check_len(params)?;
        let full = self.layout.expand(&params.to_vec());
        let free = self.layout.free_indices();
        let mut grad = vec![0.0; full.len()];
        let mut jac = Array2::zeros((self.times.len(), free.len()));

        for (i, &t) in self.times.iter().enumerate() {
            self.model.gradient(t, &full, &mut grad);
            for (j, &index) in free.iter().enumerate() {
                jac[[i, j]] = grad[index];
            }
        }

        Ok(jac)
    }
}
