// SPDX-License-Identifier: GPL-3.0-only

//! Session state types: commands in, events out

use super::frame_processor::DetectedCode;
use crate::backends::camera::CameraFacing;
use crate::errors::AppError;
use crate::pipelines::photo::SavedFile;

/// User actions on the camera screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Shutter button
    Capture,
    /// Switch between front and back camera
    ToggleFacing,
    /// Enable or disable QR scanning
    SetScanning(bool),
    /// Close the capture preview
    DismissPreview,
    /// "Open" affordance on a URL-class code
    OpenCode,
    /// Leave the screen
    Quit,
}

/// What the UI layer should render or announce
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new code passed the debouncer
    CodeDetected(DetectedCode),
    /// The cooldown ended and the code overlay should disappear
    CodeCleared,
    /// A capture succeeded; the thumbnail has these dimensions
    PreviewShown { width: u32, height: u32 },
    /// The preview was closed
    PreviewDismissed,
    /// The feed now uses another camera
    FacingChanged(CameraFacing),
    /// Non-blocking message for the user
    Notification(Notification),
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A transient, non-blocking message (toast)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn error(err: &AppError) -> Self {
        Self::failure(err.to_string())
    }

    pub fn saved(file: &SavedFile) -> Self {
        Self::info(format!("Photo saved to {}", file.path().display()))
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PersistError;

    #[test]
    fn test_error_notification_carries_message() {
        let note = Notification::error(&PersistError::PermissionDenied.into());
        assert!(note.is_error());
        assert_eq!(note.message, "Save failed: Storage permission denied");
    }

    #[test]
    fn test_saved_notification() {
        let file = SavedFile {
            directory: "/photos/ZipExtractor".into(),
            file_name: "photo_1.jpg".into(),
            mime_type: "image/jpeg".into(),
            byte_len: 3,
        };
        let note = Notification::saved(&file);
        assert!(!note.is_error());
        assert!(note.message.ends_with("photo_1.jpg"));
    }
}
