// SPDX-License-Identifier: MPL-2.0

//! Processing pipelines for captured photos
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────────┐
//! │ Still Frame  │ ──▶ │ CaptureController │ ──▶ │  PersistenceWriter   │
//! │   (RGBA)     │     │  - JPEG encoding  │     │  - directory grant   │
//! │              │     │  - preview thumb  │     │  - photo_<ms>.jpg    │
//! └──────────────┘     └───────────────────┘     └──────────────────────┘
//! ```
//!
//! The preview never pauses: encoding runs on the blocking pool and saving
//! is awaited alongside the session's event loop.

pub mod photo;
