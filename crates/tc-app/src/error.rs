//! Error types for the tc-app layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the model and store crates
/// and provides one error surface for every front end.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Tank not found: {0}")]
    TankNotFound(String),

    #[error("Tank '{0}' is protected and cannot be deleted")]
    ProtectedTank(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Calibration error: {0}")]
    Calibration(#[from] tc_calib::CalibError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tc-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<tc_store::StoreError> for AppError {
    fn from(err: tc_store::StoreError) -> Self {
        match err {
            tc_store::StoreError::FileNotFound { path } => AppError::FileNotFound(path),
            tc_store::StoreError::Io(e) => AppError::Io(e),
            other => AppError::Store(other.to_string()),
        }
    }
}

impl From<tc_core::TcError> for AppError {
    fn from(err: tc_core::TcError) -> Self {
        AppError::Validation(err.to_string())
    }
}
