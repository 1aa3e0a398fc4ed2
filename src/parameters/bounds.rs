//! Parameter bounds implementation
//!
//! Every parameter estimated by the multi-start engine lives inside a finite
//! box. `Bounds` describes one interval, `ParameterBounds` the positional pair
//! of lower/upper vectors that accompanies a model's parameter vector.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    /// `min > max`, for a lone interval (`index` is `None`) or for one entry
    /// of a bounds vector.
    #[error("Invalid bounds{}: min ({min}) must not exceed max ({max})", parameter_label(.index))]
    InvalidBounds {
        index: Option<usize>,
        min: f64,
        max: f64,
    },

    #[error("Non-finite bound for parameter {index}: [{min}, {max}]")]
    NonFinite { index: usize, min: f64, max: f64 },

    #[error("Bounds length mismatch: {lower} lower values, {upper} upper values")]
    LengthMismatch { lower: usize, upper: usize },
}

fn parameter_label(index: &Option<usize>) -> String {
    index
        .map(|i| format!(" for parameter {}", i))
        .unwrap_or_default()
}

/// Represents the bounds constraints on a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum allowed value for the parameter
    pub min: f64,

    /// Maximum allowed value for the parameter
    pub max: f64,
}

impl Bounds {
    /// Create a new bounds constraint with min and max values
    ///
    /// # Examples
    ///
    /// ```
    /// use epiwaves_rs::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert_eq!(bounds.clamp(12.0), 10.0);
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min > max {
            return Err(BoundsError::InvalidBounds {
                index: None,
                min,
                max,
            });
        }

        Ok(Self { min, max })
    }

    /// Bounds spanning `[lo_factor * center, hi_factor * center]`, reordered
    /// when `center` is negative.
    pub fn relative(center: f64, lo_factor: f64, hi_factor: f64) -> Result<Self, BoundsError> {
        let a = lo_factor * center;
        let b = hi_factor * center;
        Self::new(a.min(b), a.max(b))
    }

    /// Check if a value is within the bounds
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value into the bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

#[derive(Deserialize)]
struct RawParameterBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

/// Positional lower/upper bounds for a parameter vector.
///
/// Invariant: both vectors have the same length, all entries are finite and
/// `lower[i] <= upper[i]`. The struct is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameterBounds")]
pub struct ParameterBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl TryFrom<RawParameterBounds> for ParameterBounds {
    type Error = BoundsError;

    fn try_from(raw: RawParameterBounds) -> Result<Self, Self::Error> {
        ParameterBounds::new(raw.lower, raw.upper)
    }
}

impl ParameterBounds {
    /// Build bounds from lower/upper vectors, validating the invariant.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, BoundsError> {
        if lower.len() != upper.len() {
            return Err(BoundsError::LengthMismatch {
                lower: lower.len(),
                upper: upper.len(),
            });
        }

        for (index, (&min, &max)) in lower.iter().zip(upper.iter()).enumerate() {
            if !min.is_finite() || !max.is_finite() {
                return Err(BoundsError::NonFinite { index, min, max });
            }
            if min > max {
                return Err(BoundsError::InvalidBounds {
                    index: Some(index),
                    min,
                    max,
                });
            }
        }

        Ok(Self { lower, upper })
    }

    /// Build from one `Bounds` per parameter.
    pub fn from_bounds(bounds: &[Bounds]) -> Result<Self, BoundsError> {
        Self::new(
            bounds.iter().map(|b| b.min).collect(),
            bounds.iter().map(|b| b.max).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// The interval for parameter `index`.
    pub fn get(&self, index: usize) -> Option<Bounds> {
        Some(Bounds {
            min: *self.lower.get(index)?,
            max: *self.upper.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Bounds> + '_ {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .map(|(&min, &max)| Bounds { min, max })
    }

    /// Check whether every entry of `values` lies inside its interval.
    pub fn contains(&self, values: &[f64]) -> bool {
        values.len() == self.len() && self.iter().zip(values).all(|(b, &v)| b.contains(v))
    }
}
