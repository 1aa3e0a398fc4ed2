//! Named, ordered parameter vectors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WaveFitError};

/// An ordered sequence of named reals, e.g. `[K, r, tau]` or
/// `[K1..Kn, r1..rn, tau1..taun]`.
///
/// The order is fixed by the model shape that produced the names and matches
/// the bounds arrays positionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl ParameterVector {
    /// Pair names with values.
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(WaveFitError::DimensionMismatch(format!(
                "{} parameter names for {} values",
                names.len(),
                values.len()
            )));
        }
        Ok(Self { names, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Look up a value by parameter name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.position(name).map(|i| self.values[i])
    }

    /// Index of a named parameter.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

impl fmt::Display for ParameterVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{} = {:.6}", name, value)?;
            first = false;
        }
        Ok(())
    }
}
