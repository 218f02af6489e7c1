//! Error module for the AdEx SNN library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq, Clone)]
pub enum SNNError {
    /// Error for inconsistent shapes, e.g., weight matrix rows and number of neurons differ.
    DimensionMismatch(String),
    /// Error for invalid parameters, e.g., a non-positive time constant.
    InvalidParameter(String),
    /// Error for non-finite values produced by the numerical integration.
    NumericalError(String),
    /// Error for I/O operations.
    IOError(String),
}

impl fmt::Display for SNNError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SNNError::DimensionMismatch(e) => write!(f, "Dimension mismatch: {}", e),
            SNNError::InvalidParameter(e) => write!(f, "Invalid parameter: {}", e),
            SNNError::NumericalError(e) => write!(f, "Numerical error: {}", e),
            SNNError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for SNNError {}
