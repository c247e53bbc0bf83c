//! Calibration errors.

use tc_core::TcError;
use thiserror::Error;

/// Result type for calibration operations.
pub type CalibResult<T> = Result<T, CalibError>;

/// Errors that can occur while building or evaluating a calibration model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibError {
    /// No samples to train on.
    #[error("Cannot train a calibration model on an empty dataset")]
    EmptyDataset,

    /// Height and volume sequences differ in length.
    #[error("Sample length mismatch: {heights} heights vs {volumes} volumes")]
    LengthMismatch { heights: usize, volumes: usize },

    /// NaN or infinite sample value.
    #[error("Non-finite {what} at sample {index}: {value}")]
    NonFinite {
        what: &'static str,
        index: usize,
        value: f64,
    },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

impl From<TcError> for CalibError {
    fn from(err: TcError) -> Self {
        match err {
            TcError::NonFinite { what, value } => CalibError::NonFinite {
                what,
                index: 0,
                value,
            },
            TcError::InvalidArg { what } => CalibError::InvalidArg { what },
        }
    }
}

/// Check that `heights` and `volumes` form a usable training set.
pub(crate) fn validate_samples(heights: &[f64], volumes: &[f64]) -> CalibResult<()> {
    if heights.len() != volumes.len() {
        return Err(CalibError::LengthMismatch {
            heights: heights.len(),
            volumes: volumes.len(),
        });
    }
    if heights.is_empty() {
        return Err(CalibError::EmptyDataset);
    }
    for (index, (&h, &v)) in heights.iter().zip(volumes).enumerate() {
        if !h.is_finite() {
            return Err(CalibError::NonFinite {
                what: "height",
                index,
                value: h,
            });
        }
        if !v.is_finite() {
            return Err(CalibError::NonFinite {
                what: "volume",
                index,
                value: v,
            });
        }
    }
    Ok(())
}
