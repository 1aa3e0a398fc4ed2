//! Hyperparameters for a multi-start regression call.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::bounds::ParameterBounds;
use crate::error::{Result, WaveFitError};
use crate::models::WaveModel;

/// Bounds, Monte Carlo restart count and optional fixed parameters for one fit.
///
/// `bounds` covers the *free* parameters only, in model order with any fixed
/// parameter skipped. For a model without fixed parameters this is simply the
/// full parameter vector.
///
/// # Examples
///
/// ```
/// use epiwaves_rs::parameters::HyperParameters;
///
/// let json = r#"{
///     "bounds": {"lower": [5000.0, 0.005], "upper": [15000.0, 0.5]},
///     "sample_count": 30,
///     "fixed": {"tau": 119.0},
///     "seed": 7
/// }"#;
/// let hyper = HyperParameters::from_json_str(json).unwrap();
/// assert_eq!(hyper.sample_count, 30);
/// assert_eq!(hyper.fixed.get("tau"), Some(&119.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperParameters {
    /// Admissible box for the free parameters
    pub bounds: ParameterBounds,

    /// Number of Monte Carlo initial guesses
    pub sample_count: usize,

    /// Parameters held constant during estimation
    #[serde(default)]
    pub fixed: BTreeMap<String, f64>,

    /// Seed for the initial-guess generator; drawn from entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl HyperParameters {
    pub fn new(bounds: ParameterBounds, sample_count: usize) -> Self {
        Self {
            bounds,
            sample_count,
            fixed: BTreeMap::new(),
            seed: None,
        }
    }

    /// Hold `name` at `value` throughout the fit.
    pub fn with_fixed(mut self, name: impl Into<String>, value: f64) -> Self {
        self.fixed.insert(name.into(), value);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse a JSON document. Well-formed JSON with invalid content, such as
    /// inverted bounds, is a configuration error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            if e.is_data() {
                WaveFitError::Configuration(e.to_string())
            } else {
                WaveFitError::Json(e)
            }
        })
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Validate against a model signature and split parameters into free and
    /// fixed positions.
    pub fn layout_for<M: WaveModel + ?Sized>(&self, model: &M) -> Result<ParameterLayout> {
        if self.sample_count == 0 {
            return Err(WaveFitError::Configuration(
                "sample count must be positive; no fit attempted".to_string(),
            ));
        }

        let names = model.parameter_names();
        let mut template = vec![0.0; names.len()];
        let mut is_fixed = vec![false; names.len()];

        for (name, &value) in &self.fixed {
            let index = names.iter().position(|n| n == name).ok_or_else(|| {
                WaveFitError::Configuration(format!(
                    "fixed parameter '{}' is not a parameter of the model ({})",
                    name,
                    names.join(", ")
                ))
            })?;
            if !value.is_finite() {
                return Err(WaveFitError::Configuration(format!(
                    "fixed parameter '{}' has non-finite value {}",
                    name, value
                )));
            }
            template[index] = value;
            is_fixed[index] = true;
        }

        let free: Vec<usize> = (0..names.len()).filter(|&i| !is_fixed[i]).collect();

        if free.is_empty() {
            return Err(WaveFitError::Configuration(
                "every model parameter is fixed; nothing to estimate".to_string(),
            ));
        }

        if self.bounds.len() != free.len() {
            return Err(WaveFitError::Configuration(format!(
                "bounds cover {} parameters, model has {} free ({} total, {} fixed)",
                self.bounds.len(),
                free.len(),
                names.len(),
                names.len() - free.len()
            )));
        }

        Ok(ParameterLayout {
            names,
            template,
            free,
        })
    }
}

/// Mapping between the full model parameter vector and the free sub-vector
/// seen by the local solver.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterLayout {
    names: Vec<String>,
    template: Vec<f64>,
    free: Vec<usize>,
}

impl ParameterLayout {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Positions of the free parameters in the full vector.
    pub fn free_indices(&self) -> &[usize] {
        &self.free
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn full_count(&self) -> usize {
        self.template.len()
    }

    /// Write a free sub-vector into a full parameter vector.
    pub fn expand_into(&self, free_values: &[f64], full: &mut [f64]) {
        full.copy_from_slice(&self.template);
        for (&index, &value) in self.free.iter().zip(free_values) {
            full[index] = value;
        }
    }

    /// Full parameter vector for a free sub-vector.
    pub fn expand(&self, free_values: &[f64]) -> Vec<f64> {
        let mut full = vec![0.0; self.template.len()];
        self.expand_into(free_values, &mut full);
        full
    }
}
