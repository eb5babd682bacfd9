// SPDX-License-Identifier: MPL-2.0

//! Async photo capture pipeline
//!
//! # Pipeline Stages
//!
//! 1. **Capture**: Grab a still frame from the live feed
//! 2. **Encoding**: Materialize it as a maximum-quality JPEG in the capture cache
//! 3. **Persist**: Copy the JPEG into the user-granted directory
//!
//! Every successful capture is saved; the preview is informational only.

pub mod capture;
pub mod encoding;
pub mod persist;

pub use capture::{CaptureController, CapturedImage, Preview};
pub use encoding::{EncodedImage, PhotoEncoder};
pub use persist::{Clock, PersistenceWriter, SavedFile, SystemClock};
