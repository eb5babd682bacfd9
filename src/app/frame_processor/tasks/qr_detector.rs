// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements QR code detection using the rqrr crate.
//! Frames are sampled to grayscale (downscaled when large) and every
//! decodable grid is returned as its text payload. QR is the only
//! symbology scanned.

use crate::backends::camera::types::CameraFrame;
use crate::constants::qr::MAX_DIMENSION;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// QR code detector
///
/// Optimized for real-time processing with frame downscaling.
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub fn new() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    /// Decode every QR code visible in a frame
    ///
    /// Detection is CPU-bound and runs on the blocking pool.
    pub async fn detect(&self, frame: Arc<CameraFrame>) -> Vec<String> {
        let max_dim = self.max_dimension;

        tokio::task::spawn_blocking(move || detect_sync(&frame, max_dim))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "QR detection task panicked");
                Vec::new()
            })
    }
}

/// Synchronous QR detection (runs in blocking task)
fn detect_sync(frame: &CameraFrame, max_dimension: u32) -> Vec<String> {
    let start = std::time::Instant::now();

    if frame.width == 0 || frame.height == 0 {
        return Vec::new();
    }

    let (proc_width, proc_height, scale) =
        processing_size(frame.width, frame.height, max_dimension);

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        proc_width as usize,
        proc_height as usize,
        |x, y| {
            let src_x = ((x as f32 * scale) as u32).min(frame.width - 1);
            let src_y = ((y as f32 * scale) as u32).min(frame.height - 1);
            luma_at(frame, src_x, src_y)
        },
    );

    let grids = prepared.detect_grids();
    trace!(
        proc_width,
        proc_height,
        scale,
        grids = grids.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "QR grid detection complete"
    );

    let mut payloads = Vec::with_capacity(grids.len());
    for grid in grids {
        match grid.decode() {
            Ok((_meta, content)) => {
                debug!(content = %content, "Detected QR code");
                payloads.push(content);
            }
            Err(e) => debug!(error = ?e, "Failed to decode QR code"),
        }
    }

    payloads
}

/// Target size and source-per-target scale for a frame
fn processing_size(width: u32, height: u32, max_dimension: u32) -> (u32, u32, f32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height, 1.0);
    }
    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).max(1);
    let new_height = ((height as f32 / scale) as u32).max(1);
    (new_width, new_height, scale)
}

/// BT.601 luma of one RGBA pixel, honouring stride
fn luma_at(frame: &CameraFrame, x: u32, y: u32) -> u8 {
    let offset = y as usize * frame.stride as usize + x as usize * 4;
    match frame.data.get(offset..offset + 3) {
        Some(&[r, g, b]) => ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8,
        _ => 0,
    }
}
