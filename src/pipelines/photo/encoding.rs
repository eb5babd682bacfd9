// SPDX-License-Identifier: GPL-3.0-only

//! Async photo encoding
//!
//! Captured frames are stored as JPEG at maximum quality
//! ([`photo::JPEG_QUALITY`]).

use crate::backends::camera::types::CameraFrame;
use crate::constants::photo;
use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, info};

/// Encoded JPEG ready to be written out
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// JPEG encoder for captured frames
pub struct PhotoEncoder {
    quality: u8,
}

impl PhotoEncoder {
    /// Encoder at the fixed capture quality
    pub fn new() -> Self {
        Self {
            quality: photo::JPEG_QUALITY,
        }
    }

    /// JPEG quality (0-100)
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode a frame on the blocking pool
    pub async fn encode(&self, frame: Arc<CameraFrame>) -> Result<EncodedImage, String> {
        info!(
            width = frame.width,
            height = frame.height,
            quality = self.quality,
            "Starting encoding"
        );

        let quality = self.quality;
        tokio::task::spawn_blocking(move || {
            let rgba = frame
                .to_rgba_image()
                .ok_or_else(|| "Frame buffer is smaller than its dimensions".to_string())?;
            let data = encode_jpeg(DynamicImage::ImageRgba8(rgba), quality)?;

            debug!(size = data.len(), "Encoding complete");
            Ok(EncodedImage {
                data,
                width: frame.width,
                height: frame.height,
            })
        })
        .await
        .map_err(|e| format!("Encoding task error: {}", e))?
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode image as JPEG (alpha is dropped)
fn encode_jpeg(image: DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);

    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);

    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| format!("JPEG encoding failed: {}", e))?;

    Ok(buffer)
}
