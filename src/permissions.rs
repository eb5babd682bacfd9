// SPDX-License-Identifier: GPL-3.0-only

//! Camera permission gate
//!
//! The screen renders nothing while the permission state is loading and only
//! a request affordance while it is denied. Requests are never retried on
//! their own; the user has to trigger them again. Storage access is a
//! separate, lazy grant handled by the
//! [`PersistenceWriter`](crate::pipelines::photo::PersistenceWriter).

use crate::errors::PermissionError;
use std::future::Future;
use tracing::{debug, info};

/// Snapshot of the camera permission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionStatus {
    pub granted: bool,
    pub loading: bool,
}

impl PermissionStatus {
    /// State before the first query completes
    pub const LOADING: Self = Self {
        granted: false,
        loading: true,
    };

    /// What the screen may render in this state
    pub fn view(&self) -> GateView {
        if self.loading {
            GateView::Loading
        } else if self.granted {
            GateView::Camera
        } else {
            GateView::RequestPermission
        }
    }
}

/// Screen content allowed by the permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView {
    /// Nothing rendered yet
    Loading,
    /// Only the "grant permission" affordance
    RequestPermission,
    /// Live feed and controls
    Camera,
}

/// Platform camera permission API
pub trait PermissionProvider {
    /// Current grant without prompting
    fn query(&self) -> impl Future<Output = bool>;

    /// Prompt the user; resolves to the resulting grant
    fn request(&self) -> impl Future<Output = bool>;
}

/// Provider with a fixed answer
///
/// Desktop platforms have no runtime camera permission, so the command line
/// front end uses `StaticPermission::granted()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPermission(pub bool);

impl StaticPermission {
    pub fn granted() -> Self {
        Self(true)
    }

    pub fn denied() -> Self {
        Self(false)
    }
}

impl PermissionProvider for StaticPermission {
    async fn query(&self) -> bool {
        self.0
    }

    async fn request(&self) -> bool {
        self.0
    }
}

/// Gate in front of every camera operation
pub struct PermissionGate<P> {
    provider: P,
    status: PermissionStatus,
}

impl<P: PermissionProvider> PermissionGate<P> {
    /// New gate in the loading state; call [`refresh`](Self::refresh) next
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            status: PermissionStatus::LOADING,
        }
    }

    /// Query the provider without prompting
    pub async fn refresh(&mut self) -> PermissionStatus {
        let granted = self.provider.query().await;
        self.status = PermissionStatus {
            granted,
            loading: false,
        };
        debug!(granted, "Camera permission queried");
        self.status
    }

    /// Current camera permission
    pub fn camera_permission(&self) -> PermissionStatus {
        self.status
    }

    /// Prompt for camera access
    ///
    /// Idempotent: once granted, no prompt is shown again.
    pub async fn request_camera_permission(&mut self) -> PermissionStatus {
        if self.status.granted {
            return self.status;
        }
        let granted = self.provider.request().await;
        info!(granted, "Camera permission requested");
        self.status = PermissionStatus {
            granted,
            loading: false,
        };
        self.status
    }

    /// Fail unless the camera may be used
    pub fn ensure_granted(&self) -> Result<(), PermissionError> {
        match self.status {
            PermissionStatus { loading: true, .. } => Err(PermissionError::CameraLoading),
            PermissionStatus { granted: false, .. } => Err(PermissionError::CameraDenied),
            _ => Ok(()),
        }
    }
}
