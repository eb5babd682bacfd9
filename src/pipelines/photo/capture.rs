// SPDX-License-Identifier: MPL-2.0

//! Still capture from the live feed
//!
//! The controller grabs a still frame without interrupting the preview,
//! materializes it as a JPEG in the capture cache, and keeps exactly zero or
//! one [`CapturedImage`] together with its preview thumbnail.

use super::encoding::PhotoEncoder;
use crate::backends::camera::LiveFeed;
use crate::constants::PREVIEW_SCALE_DIVISOR;
use crate::errors::CaptureError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Materialized capture file in the private cache
///
/// The file is removed when the last handle is dropped.
#[derive(Debug)]
struct ImageFile {
    path: PathBuf,
}

impl Drop for ImageFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Released captured image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to release captured image"
            ),
        }
    }
}

/// Handle to a captured photo
///
/// Clones share the underlying file; the persistence writer holds a clone
/// while it saves, so dismissing the preview never pulls the file out from
/// under an in-flight save.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    file: Arc<ImageFile>,
}

impl CapturedImage {
    /// Take ownership of an already materialized JPEG at `path`
    ///
    /// The file is deleted once every clone of the handle is gone.
    pub fn from_file(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            file: Arc::new(ImageFile { path: path.into() }),
        }
    }

    /// Local location of the JPEG bytes
    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

/// Ephemeral thumbnail shown after a capture
#[derive(Debug, Clone)]
pub struct Preview {
    pub width: u32,
    pub height: u32,
    pub thumbnail: image::RgbaImage,
}

/// Capture controller holding at most one image
pub struct CaptureController {
    encoder: PhotoEncoder,
    cache_dir: PathBuf,
    preview_divisor: u32,
    current: Option<(CapturedImage, Preview)>,
}

impl CaptureController {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            encoder: PhotoEncoder::new(),
            cache_dir: cache_dir.into(),
            preview_divisor: PREVIEW_SCALE_DIVISOR,
            current: None,
        }
    }

    /// Override the linear downscale factor of the preview
    pub fn with_preview_divisor(mut self, divisor: u32) -> Self {
        self.preview_divisor = divisor.max(1);
        self
    }

    /// Capture a still from the feed and make it the current image
    ///
    /// When the feed is not ready nothing is captured and the previous image
    /// (if any) stays. A successful capture replaces and releases the previous
    /// one.
    pub async fn capture<F: LiveFeed>(
        &mut self,
        feed: &mut F,
    ) -> Result<CapturedImage, CaptureError> {
        if !feed.is_ready() {
            info!("Feed not ready, nothing captured");
            return Err(CaptureError::CaptureUnavailable);
        }

        let frame = feed.capture_still().await.map_err(|e| {
            warn!(error = %e, "Still capture failed");
            CaptureError::CaptureUnavailable
        })?;
        let frame = Arc::new(frame);

        let encoded = self
            .encoder
            .encode(Arc::clone(&frame))
            .await
            .map_err(CaptureError::MaterializeFailed)?;

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| CaptureError::MaterializeFailed(e.to_string()))?;
        let path = self.cache_dir.join(format!("{}.jpg", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, &encoded.data)
            .await
            .map_err(|e| CaptureError::MaterializeFailed(e.to_string()))?;
        let image = CapturedImage::from_file(path, encoded.width, encoded.height);

        let divisor = self.preview_divisor;
        let preview = tokio::task::spawn_blocking(move || render_preview(&frame, divisor))
            .await
            .map_err(|e| CaptureError::MaterializeFailed(format!("Preview task error: {}", e)))??;

        info!(
            path = %image.path().display(),
            width = image.width,
            height = image.height,
            size = encoded.data.len(),
            "Photo captured"
        );

        self.current = Some((image.clone(), preview));
        Ok(image)
    }

    /// The image awaiting disposal
    pub fn current(&self) -> Option<&CapturedImage> {
        self.current.as_ref().map(|(image, _)| image)
    }

    /// Thumbnail of the current image
    pub fn preview(&self) -> Option<&Preview> {
        self.current.as_ref().map(|(_, preview)| preview)
    }

    /// Clear the current image without saving it
    ///
    /// Returns whether there was anything to dismiss.
    pub fn dismiss(&mut self) -> bool {
        let dismissed = self.current.take().is_some();
        if dismissed {
            debug!("Capture preview dismissed");
        }
        dismissed
    }
}

fn render_preview(
    frame: &crate::backends::camera::CameraFrame,
    divisor: u32,
) -> Result<Preview, CaptureError> {
    let rgba = frame.to_rgba_image().ok_or_else(|| {
        CaptureError::MaterializeFailed("Frame buffer is smaller than its dimensions".into())
    })?;
    let width = (frame.width / divisor).max(1);
    let height = (frame.height / divisor).max(1);
    let thumbnail = image::imageops::thumbnail(&rgba, width, height);
    Ok(Preview {
        width,
        height,
        thumbnail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::still_image::{FrameSource, StillImageFeed};
    use crate::backends::camera::CameraFrame;

    fn feed(width: u32, height: u32) -> StillImageFeed {
        StillImageFeed::new(FrameSource::Frame(CameraFrame::from_rgba(
            image::RgbaImage::from_pixel(width, height, image::Rgba([120, 80, 40, 255])),
        )))
    }

    #[tokio::test]
    async fn test_capture_with_feed_unavailable() {
        let cache = tempfile::tempdir().unwrap();
        let mut controller = CaptureController::new(cache.path());
        let mut feed = feed(8, 8);
        feed.set_ready(false);

        let result = controller.capture(&mut feed).await;
        assert_eq!(result.unwrap_err(), CaptureError::CaptureUnavailable);
        assert!(controller.current().is_none());
        assert!(controller.preview().is_none());
    }

    #[tokio::test]
    async fn test_preview_is_scaled_down() {
        let cache = tempfile::tempdir().unwrap();
        let mut controller = CaptureController::new(cache.path());

        let image = controller.capture(&mut feed(400, 200)).await.unwrap();
        assert_eq!((image.width, image.height), (400, 200));

        let preview = controller.preview().unwrap();
        assert_eq!((preview.width, preview.height), (20, 10));
        assert_eq!(preview.thumbnail.dimensions(), (20, 10));
    }

    #[tokio::test]
    async fn test_new_capture_supersedes_and_releases_previous() {
        let cache = tempfile::tempdir().unwrap();
        let mut controller = CaptureController::new(cache.path());
        let mut feed = feed(16, 16);

        let first_path = controller.capture(&mut feed).await.unwrap().path().to_path_buf();
        assert!(first_path.exists());

        let second = controller.capture(&mut feed).await.unwrap();
        assert_ne!(second.path(), first_path);
        assert!(!first_path.exists());
        assert_eq!(controller.current().unwrap().path(), second.path());
    }

    #[tokio::test]
    async fn test_dismiss_keeps_file_while_a_clone_is_held() {
        let cache = tempfile::tempdir().unwrap();
        let mut controller = CaptureController::new(cache.path());

        let held = controller.capture(&mut feed(16, 16)).await.unwrap();
        assert!(controller.dismiss());
        assert!(!controller.dismiss());
        assert!(held.path().exists());

        let path = held.path().to_path_buf();
        drop(held);
        assert!(!path.exists());
    }
}
