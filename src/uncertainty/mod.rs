//! Uncertainty and model-quality estimates for fitted waves.
//!
//! - [`band`]: pointwise Student-t prediction bands over an arbitrary grid
//! - [`likelihood`]: maximum-likelihood refit of a fixed-`tau` single wave
//!   with AIC/BIC
//! - [`domain`]: the counted suppression of `ln`/division domain errors used
//!   by the likelihood

pub mod band;
pub mod domain;
pub mod likelihood;

pub use band::{critical_value, prediction_band, ConfidenceBand};
pub use domain::{DomainPolicy, DomainReport};
pub use likelihood::{
    aic, bic, negative_log_likelihood, nll_gradient, nll_hessian, InformationCriteria,
    MaximumLikelihood, MleConfig,
};
