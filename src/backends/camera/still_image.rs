// SPDX-License-Identifier: GPL-3.0-only

//! Live feed backed by still images
//!
//! Replays one image per facing direction at a fixed frame interval and scans
//! every replayed frame for QR codes. Used by the command line front end and
//! by tests, where no physical camera exists.

use super::types::{BackendError, BackendResult, CameraFacing, CameraFrame, ScanEvent};
use super::LiveFeed;
use crate::app::frame_processor::QrDetector;
use crate::constants::{file_formats, timing};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where a facing direction gets its pixels from
#[derive(Debug, Clone)]
pub enum FrameSource {
    /// Image file decoded on first use
    File(PathBuf),
    /// Pre-built frame
    Frame(CameraFrame),
}

/// Load an image file as an RGBA camera frame
pub async fn load_image_frame(path: &Path) -> BackendResult<CameraFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !file_formats::is_image_extension(&extension) {
        return Err(BackendError::Source(format!(
            "Unsupported file format: {}",
            extension
        )));
    }

    let path_owned = path.to_path_buf();
    let frame = tokio::task::spawn_blocking(move || {
        image::open(&path_owned)
            .map(|img| CameraFrame::from_rgba(img.to_rgba8()))
            .map_err(|e| BackendError::Source(format!("{}: {}", path_owned.display(), e)))
    })
    .await
    .map_err(|e| BackendError::Source(format!("Image load task error: {}", e)))??;

    debug!(
        path = %path.display(),
        width = frame.width,
        height = frame.height,
        "Loaded image as frame"
    );
    Ok(frame)
}

/// Image-backed live feed
pub struct StillImageFeed {
    sources: HashMap<CameraFacing, FrameSource>,
    loaded: HashMap<CameraFacing, CameraFrame>,
    facing: CameraFacing,
    ready: bool,
    frame_interval: Duration,
    detector: QrDetector,
}

impl StillImageFeed {
    /// Feed that shows the same source on both cameras
    pub fn new(source: FrameSource) -> Self {
        let mut sources = HashMap::new();
        sources.insert(CameraFacing::Front, source.clone());
        sources.insert(CameraFacing::Back, source);
        Self {
            sources,
            loaded: HashMap::new(),
            facing: CameraFacing::default(),
            ready: true,
            frame_interval: timing::STILL_FEED_FRAME_INTERVAL,
            detector: QrDetector::new(),
        }
    }

    /// Feed backed by one image file
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(FrameSource::File(path.into()))
    }

    /// Use a different source for one facing direction
    pub fn with_source(mut self, facing: CameraFacing, source: FrameSource) -> Self {
        self.sources.insert(facing, source);
        self.loaded.remove(&facing);
        self
    }

    /// Start facing the given direction
    pub fn with_facing(mut self, facing: CameraFacing) -> Self {
        self.facing = facing;
        self
    }

    /// Override the interval between replayed frames
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Simulate the feed starting or stopping
    pub fn set_ready(&mut self, ready: bool) {
        info!(ready, "Still image feed readiness changed");
        self.ready = ready;
    }

    async fn current_frame(&mut self) -> BackendResult<CameraFrame> {
        if let Some(frame) = self.loaded.get(&self.facing) {
            return Ok(frame.clone());
        }

        let source = self
            .sources
            .get(&self.facing)
            .ok_or_else(|| BackendError::Source(format!("No source for {} camera", self.facing)))?;

        let frame = match source {
            FrameSource::Frame(frame) => frame.clone(),
            FrameSource::File(path) => load_image_frame(path).await?,
        };
        self.loaded.insert(self.facing, frame.clone());
        Ok(frame)
    }

    fn restamp(frame: CameraFrame) -> CameraFrame {
        CameraFrame {
            data: Arc::clone(&frame.data),
            captured_at: std::time::Instant::now(),
            ..frame
        }
    }
}

impl LiveFeed for StillImageFeed {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn facing(&self) -> CameraFacing {
        self.facing
    }

    fn set_facing(&mut self, facing: CameraFacing) {
        debug!(%facing, "Switching camera");
        self.facing = facing;
    }

    async fn next_scan(&mut self) -> Vec<ScanEvent> {
        tokio::time::sleep(self.frame_interval).await;
        if !self.ready {
            return Vec::new();
        }
        let frame = match self.current_frame().await {
            Ok(frame) => Self::restamp(frame),
            Err(e) => {
                warn!(error = %e, "Failed to produce preview frame");
                return Vec::new();
            }
        };
        self.detector
            .detect(Arc::new(frame))
            .await
            .into_iter()
            .map(ScanEvent::now)
            .collect()
    }

    async fn capture_still(&mut self) -> BackendResult<CameraFrame> {
        if !self.ready {
            return Err(BackendError::NotReady);
        }
        self.current_frame().await.map(Self::restamp)
    }
}
