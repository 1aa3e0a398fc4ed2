use thiserror::Error;

/// Error types for the epiwaves-rs library.
#[derive(Error, Debug)]
pub enum WaveFitError {
    /// Invalid hyperparameters: zero samples, inverted bounds, or a
    /// bounds/model parameter-count mismatch.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A local solver run failed to converge.
    #[error("Algorithm failed to converge: {0}")]
    ConvergenceFailure(String),

    /// Every Monte Carlo sample of a multi-start fit failed.
    #[error("No feasible fit: all {samples} Monte Carlo samples failed")]
    NoFeasibleFit { samples: usize },

    /// Prediction band requested with non-positive residual degrees of freedom.
    #[error("Degenerate fit: {n} observations for {p} parameters leaves no degrees of freedom")]
    DegenerateFit { n: usize, p: usize },

    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebra(String),

    /// Malformed surveillance data file.
    #[error("Data error: {0}")]
    Data(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reader error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<crate::parameters::BoundsError> for WaveFitError {
    fn from(err: crate::parameters::BoundsError) -> Self {
        WaveFitError::Configuration(err.to_string())
    }
}

/// Result type alias for epiwaves-rs operations.
pub type Result<T> = std::result::Result<T, WaveFitError>;
