// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture-and-persist workflow
//!
//! Every variant is recoverable: the session reports it as a notification and
//! keeps running. Nothing is retried automatically.

use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Camera or storage permission errors
    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),
    /// Still capture errors
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Saving a captured photo failed
    #[error("Save failed: {0}")]
    Persist(#[from] PersistError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Permission-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// Camera access was not granted
    #[error("Camera permission not granted")]
    CameraDenied,
    /// Camera permission state is still being queried
    #[error("Camera permission is still loading")]
    CameraLoading,
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Live feed is not ready to deliver a still frame
    #[error("Camera feed is not ready")]
    CaptureUnavailable,
    /// The frame could not be turned into a storable image
    #[error("Could not materialize captured frame: {0}")]
    MaterializeFailed(String),
}

/// Persistence errors, one per step of the save sequence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    /// The user declined the directory grant
    #[error("Storage permission denied")]
    PermissionDenied,
    /// The application subfolder could not be created or reused
    #[error("Could not create folder: {0}")]
    DirectoryCreateFailed(String),
    /// The destination file entry could not be created
    #[error("Could not create file: {0}")]
    FileCreateFailed(String),
    /// The captured image could not be read back
    #[error("Could not read captured image: {0}")]
    ReadFailed(String),
    /// Writing the photo bytes failed
    #[error("Could not write photo: {0}")]
    WriteFailed(String),
}

impl AppError {
    /// Whether the error came from a declined camera or storage permission
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            AppError::Permission(PermissionError::CameraDenied)
                | AppError::Persist(PersistError::PermissionDenied)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
