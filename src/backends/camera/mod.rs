// SPDX-License-Identifier: MPL-2.0

//! Live feed abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │  CameraSession      │
//! └──────────┬──────────┘
//!            │ scans / stills / facing
//!            ▼
//! ┌─────────────────────┐
//! │   LiveFeed trait    │  ← Common interface
//! └──────────┬──────────┘
//!            │
//!            ▼
//!    ┌───────────────┐
//!    │StillImageFeed │  ← Image-file backed implementation
//!    └───────────────┘
//! ```
//!
//! Feeds scan their preview frames for QR codes only; image-backed feeds use
//! [`QrDetector`](crate::app::frame_processor::QrDetector) for that.

pub mod still_image;
pub mod types;

pub use still_image::StillImageFeed;
pub use types::*;

use std::future::Future;

/// A continuously running camera feed
///
/// All operations are cooperative: the session awaits them on a single
/// thread, so implementations need not be `Send`.
pub trait LiveFeed {
    /// Whether the feed can currently deliver frames
    fn is_ready(&self) -> bool;

    /// Current facing direction
    fn facing(&self) -> CameraFacing;

    /// Switch to another camera
    fn set_facing(&mut self, facing: CameraFacing);

    /// Wait for the next analysed preview frame
    ///
    /// Resolves to the QR payloads decoded from that frame, which is empty
    /// when nothing was found or no frame could be produced (feed not ready,
    /// transient source error). Callers simply call again.
    fn next_scan(&mut self) -> impl Future<Output = Vec<ScanEvent>>;

    /// Grab a full-resolution still frame
    fn capture_still(&mut self) -> impl Future<Output = BackendResult<CameraFrame>>;
}
