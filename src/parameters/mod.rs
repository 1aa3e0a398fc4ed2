//! # Parameter System
//!
//! Typed containers for the values a fit estimates and the box it searches:
//!
//! - [`ParameterVector`]: ordered, named parameter values
//! - [`Bounds`] / [`ParameterBounds`]: per-parameter and positional bounds
//! - [`HyperParameters`]: bounds, Monte Carlo sample count and fixed parameters
//! - [`ParameterLayout`]: the free/fixed split of a model's parameter vector

pub mod bounds;
pub mod hyper;
pub mod vector;

pub use bounds::{Bounds, BoundsError, ParameterBounds};
pub use hyper::{HyperParameters, ParameterLayout};
pub use vector::ParameterVector;
