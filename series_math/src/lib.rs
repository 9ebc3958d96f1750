//! # Series Math
//!
//! Numeric building blocks for the metric forecasting pipeline.
//! This crate provides an ordinary least-squares solver for small dense
//! designs and the descriptive statistics the model and the digests need.

use thiserror::Error;

pub mod regression;
pub mod stats;

pub use regression::{LeastSquares, LeastSquaresFit};

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Singular system: {0}")]
    Singular(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
