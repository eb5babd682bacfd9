// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstractions for the camera feed

pub mod camera;
