// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Cooldown after an accepted QR code before another one can be surfaced
pub const QR_COOLDOWN: Duration = Duration::from_millis(2000);

/// Linear downscale factor applied to the capture preview thumbnail
pub const PREVIEW_SCALE_DIVISOR: u32 = 20;

/// Application subfolder created inside the granted directory
pub const DEFAULT_SAVE_FOLDER: &str = "ZipExtractor";

/// Photo file naming and typing
pub mod photo {
    /// MIME type of every persisted photo
    pub const MIME_TYPE: &str = "image/jpeg";

    /// Captures are always encoded at maximum JPEG quality
    pub const JPEG_QUALITY: u8 = 100;

    /// File name prefix (`photo_<millis>.jpg`)
    pub const FILE_PREFIX: &str = "photo_";

    /// File extension without the dot
    pub const FILE_EXTENSION: &str = "jpg";

    /// Upper bound on millisecond bumps when a file name is already taken
    pub const MAX_NAME_ATTEMPTS: u64 = 1000;

    /// Build the file name for a capture taken at `millis` since the Unix epoch
    pub fn file_name(millis: u64) -> String {
        format!("{}{}.{}", FILE_PREFIX, millis, FILE_EXTENSION)
    }

    /// Check whether `name` has the `photo_<digits>.jpg` shape
    pub fn is_photo_file_name(name: &str) -> bool {
        name.strip_prefix(FILE_PREFIX)
            .and_then(|rest| rest.strip_suffix(".jpg"))
            .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// QR detection constants
pub mod qr {
    /// Frames larger than this (either side) are downscaled before detection
    pub const MAX_DIMENSION: u32 = 640;

    /// URL schemes that mark a code as openable
    pub const URL_SCHEMES: &[&str] = &["https://", "http://"];
}

/// Supported file formats for the still-image feed
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Interval between frames replayed by the still-image feed (~10fps, enough for scanning)
    pub const STILL_FEED_FRAME_INTERVAL: Duration = Duration::from_millis(100);
}

/// Application information utilities
pub mod app_info {
    /// Application name used for config and cache directories
    pub const APP_NAME: &str = "qrcam";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_file_name() {
        assert_eq!(photo::file_name(1_700_000_000_123), "photo_1700000000123.jpg");
        assert!(photo::is_photo_file_name("photo_1700000000123.jpg"));
        assert!(!photo::is_photo_file_name("photo_.jpg"));
        assert!(!photo::is_photo_file_name("photo_12a.jpg"));
        assert!(!photo::is_photo_file_name("IMG_20240101_120000.jpg"));
    }

    #[test]
    fn test_image_extensions() {
        assert!(file_formats::is_image_extension("JPG"));
        assert!(file_formats::is_image_extension("png"));
        assert!(!file_formats::is_image_extension("mp4"));
    }
}
