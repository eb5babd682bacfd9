// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for live feeds

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Which physical camera the feed is using
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraFacing {
    /// User-facing camera
    Front,
    /// World-facing camera
    #[default]
    Back,
}

impl CameraFacing {
    /// The other facing direction
    pub fn toggled(self) -> Self {
        match self {
            CameraFacing::Front => CameraFacing::Back,
            CameraFacing::Back => CameraFacing::Front,
        }
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraFacing::Front => write!(f, "front"),
            CameraFacing::Back => write!(f, "back"),
        }
    }
}

/// A single RGBA frame from the live feed
///
/// `stride` is the number of bytes per row and may exceed `width * 4`
/// when the source pads rows.
#[derive(Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub data: Arc<[u8]>,
    pub captured_at: std::time::Instant,
}

impl CameraFrame {
    /// Wrap a tightly packed RGBA image
    pub fn from_rgba(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            stride: width * 4,
            data: Arc::from(image.into_raw()),
            captured_at: std::time::Instant::now(),
        }
    }

    /// Copy into a tightly packed RGBA image, dropping stride padding
    ///
    /// Returns `None` when the buffer is shorter than the declared geometry.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        let row_bytes = self.width as usize * 4;
        let stride = self.stride as usize;
        let mut packed = Vec::with_capacity(row_bytes * self.height as usize);

        for y in 0..self.height as usize {
            let row_start = y * stride;
            packed.extend_from_slice(self.data.get(row_start..row_start + row_bytes)?);
        }

        image::RgbaImage::from_raw(self.width, self.height, packed)
    }
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A decoded QR payload reported by the live feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub payload: String,
    pub timestamp: tokio::time::Instant,
}

impl ScanEvent {
    /// Event stamped with the current time
    pub fn now(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            timestamp: tokio::time::Instant::now(),
        }
    }
}

/// Backend errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Feed has not started or was stopped
    #[error("Camera feed is not ready")]
    NotReady,
    /// Frame source could not be read
    #[error("Frame source error: {0}")]
    Source(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_toggle() {
        assert_eq!(CameraFacing::default(), CameraFacing::Back);
        assert_eq!(CameraFacing::Back.toggled(), CameraFacing::Front);
        assert_eq!(CameraFacing::Front.toggled().toggled(), CameraFacing::Front);
    }

    #[test]
    fn test_to_rgba_image_drops_stride_padding() {
        let data: Vec<u8> = vec![
            255, 0, 0, 255, // Red pixel
            0, 255, 0, 255, // Green pixel
            0, 0, // stride padding
            0, 0, 255, 255, // Blue pixel
            255, 255, 255, 255, // White pixel
            0, 0, // stride padding
        ];

        let frame = CameraFrame {
            width: 2,
            height: 2,
            stride: 10,
            data: Arc::from(data.as_slice()),
            captured_at: std::time::Instant::now(),
        };

        let image = frame.to_rgba_image().unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 255, 0, 255]);
        assert_eq!(image.get_pixel(0, 1).0, [0, 0, 255, 255]);
        assert_eq!(image.get_pixel(1, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_to_rgba_image_short_buffer() {
        let frame = CameraFrame {
            width: 2,
            height: 2,
            stride: 8,
            data: Arc::from(vec![0u8; 12]),
            captured_at: std::time::Instant::now(),
        };
        assert!(frame.to_rgba_image().is_none());
    }
}
