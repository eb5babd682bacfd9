// SPDX-License-Identifier: MPL-2.0

//! QR Camera - QR scanning and photo capture for a camera screen
//!
//! This library provides the camera screen's workflow: debounced QR code
//! detection on the live feed, still capture with a preview, and saving the
//! captured photo into a directory the user granted access to.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Camera session, QR debouncing and code classification
//! - [`backends`]: Live feed abstraction and the image-backed feed
//! - [`pipelines`]: Photo capture, encoding and persistence
//! - [`permissions`]: Camera permission gate
//! - [`storage`]: Directory grants and file access
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! // Usually driven through the command line front end:
//! // qrcam run --source code.png --root ~/Pictures
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod permissions;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{
    BarcodeDebouncer, CameraSession, CodeClass, DetectedCode, SessionCommand, SessionEvent,
};
pub use config::Config;
pub use errors::{AppError, AppResult};
