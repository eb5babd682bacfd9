// SPDX-License-Identifier: MPL-2.0

//! Frame processor module for async frame analysis
//!
//! Preview frames are analysed for QR codes; decoded payloads become
//! [`ScanEvent`](crate::backends::camera::ScanEvent)s for the debouncer.

pub mod tasks;
pub mod types;

pub use tasks::QrDetector;
pub use types::{CodeClass, DetectedCode};
