// SPDX-License-Identifier: MPL-2.0

//! Camera screen logic
//!
//! This module contains the state and event handling of the camera screen:
//! QR debouncing, still capture, and handing captures to the persistence
//! writer.
//!
//! # Architecture
//!
//! - `debounce`: Single-slot cooldown for QR scan events
//! - `frame_processor`: QR decoding of preview frames and code classification
//! - `state`: Commands from the UI layer and events back to it
//!
//! # Main Types
//!
//! - `CameraSession`: Event loop owning the feed, debouncer and capture
//!   controller
//! - `SessionCommand` / `SessionEvent`: The session's input and output
//!
//! Everything runs cooperatively on one task. Saves are the only work that
//! overlaps with the loop: each one is polled alongside commands and scans
//! until it finishes, and a second shutter press may start another save
//! while the first is still writing.

pub mod debounce;
pub mod frame_processor;
pub mod state;

pub use debounce::BarcodeDebouncer;
pub use frame_processor::{CodeClass, DetectedCode};
pub use state::{Notification, NotificationLevel, SessionCommand, SessionEvent};

use crate::backends::camera::{LiveFeed, ScanEvent};
use crate::config::Config;
use crate::errors::{AppError, AppResult, PersistError};
use crate::permissions::{PermissionGate, PermissionProvider};
use crate::pipelines::photo::{
    CaptureController, CapturedImage, Clock, PersistenceWriter, SavedFile, SystemClock,
};
use crate::storage::{DirectoryAccess, DirectoryPicker};
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// The camera screen
pub struct CameraSession<F, A, P, C = SystemClock> {
    screen: Screen<F>,
    writer: PersistenceWriter<A, P, C>,
}

/// Everything the loop mutates; kept apart from the writer so in-flight saves
/// can borrow the writer while commands are handled.
struct Screen<F> {
    feed: F,
    debouncer: BarcodeDebouncer,
    capture: CaptureController,
    scanning: bool,
    open_urls: bool,
    events: UnboundedSender<SessionEvent>,
}

impl<F, A, P, C> CameraSession<F, A, P, C>
where
    F: LiveFeed,
    A: DirectoryAccess,
    P: DirectoryPicker,
    C: Clock,
{
    pub fn new(
        mut feed: F,
        writer: PersistenceWriter<A, P, C>,
        config: &Config,
        events: UnboundedSender<SessionEvent>,
    ) -> Self {
        if feed.facing() != config.default_facing {
            feed.set_facing(config.default_facing);
        }

        Self {
            screen: Screen {
                feed,
                debouncer: BarcodeDebouncer::new(config.cooldown()),
                capture: CaptureController::new(config.capture_cache_dir())
                    .with_preview_divisor(config.preview_divisor),
                scanning: true,
                open_urls: config.open_urls,
                events,
            },
            writer,
        }
    }

    /// Run the screen until `Quit` or until the command channel closes
    ///
    /// Refuses to start without camera permission. Saves still in flight
    /// when the loop ends are awaited before returning.
    pub async fn run<G: PermissionProvider>(
        self,
        gate: &PermissionGate<G>,
        mut commands: UnboundedReceiver<SessionCommand>,
    ) -> AppResult<()> {
        gate.ensure_granted()?;

        let Self { mut screen, writer } = self;
        let mut saves: FuturesUnordered<LocalBoxFuture<'_, Result<SavedFile, PersistError>>> =
            FuturesUnordered::new();

        info!(facing = %screen.feed.facing(), "Camera session started");

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("Command channel closed");
                        break;
                    };
                    debug!(?command, "Session command");
                    match command {
                        SessionCommand::Quit => break,
                        SessionCommand::Capture => {
                            if let Some(image) = screen.capture().await {
                                saves.push(writer.persist(image).boxed_local());
                            }
                        }
                        SessionCommand::ToggleFacing => screen.toggle_facing(),
                        SessionCommand::SetScanning(enabled) => screen.set_scanning(enabled),
                        SessionCommand::DismissPreview => screen.dismiss_preview(),
                        SessionCommand::OpenCode => screen.open_code(),
                    }
                }
                () = screen.debouncer.wait_expiry() => screen.expire_code(),
                scans = screen.feed.next_scan(), if screen.scanning => screen.on_scans(scans),
                Some(result) = saves.next(), if !saves.is_empty() => screen.report_save(result),
            }
        }

        if !saves.is_empty() {
            info!(pending = saves.len(), "Waiting for photo saves to finish");
        }
        while let Some(result) = saves.next().await {
            screen.report_save(result);
        }

        info!("Camera session ended");
        Ok(())
    }
}

impl<F: LiveFeed> Screen<F> {
    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Session event dropped, no listener");
        }
    }

    fn notify(&self, notification: Notification) {
        self.emit(SessionEvent::Notification(notification));
    }

    async fn capture(&mut self) -> Option<CapturedImage> {
        match self.capture.capture(&mut self.feed).await {
            Ok(image) => {
                if let Some(preview) = self.capture.preview() {
                    self.emit(SessionEvent::PreviewShown {
                        width: preview.width,
                        height: preview.height,
                    });
                }
                Some(image)
            }
            Err(e) => {
                warn!(error = %e, "Capture failed");
                self.notify(Notification::error(&AppError::from(e)));
                None
            }
        }
    }

    fn report_save(&self, result: Result<SavedFile, PersistError>) {
        match result {
            Ok(saved) => self.notify(Notification::saved(&saved)),
            Err(e) => {
                error!(error = %e, "Photo not saved");
                self.notify(Notification::error(&AppError::from(e)));
            }
        }
    }

    fn on_scans(&mut self, scans: Vec<ScanEvent>) {
        for scan in &scans {
            if let Some(code) = self.debouncer.on_scan(scan) {
                self.emit(SessionEvent::CodeDetected(code));
            }
        }
    }

    fn expire_code(&mut self) {
        if self.debouncer.expire(Instant::now()).is_some() {
            self.emit(SessionEvent::CodeCleared);
        }
    }

    fn set_scanning(&mut self, enabled: bool) {
        if self.scanning == enabled {
            return;
        }
        info!(enabled, "QR scanning toggled");
        self.scanning = enabled;
        if !enabled && self.debouncer.cancel().is_some() {
            self.emit(SessionEvent::CodeCleared);
        }
    }

    fn toggle_facing(&mut self) {
        let facing = self.feed.facing().toggled();
        self.feed.set_facing(facing);
        info!(%facing, "Camera switched");
        self.emit(SessionEvent::FacingChanged(facing));
    }

    fn dismiss_preview(&mut self) {
        if self.capture.dismiss() {
            self.emit(SessionEvent::PreviewDismissed);
        }
    }

    fn open_code(&self) {
        let Some(url) = self.debouncer.active_code().and_then(|code| code.url()) else {
            debug!("No URL code on screen");
            return;
        };

        if !self.open_urls {
            info!(url, "Opening links disabled");
            self.notify(Notification::info(format!("Link: {}", url)));
            return;
        }

        info!(url, "Opening URL from QR code");
        if let Err(e) = open::that_detached(url) {
            error!(url, error = %e, "Failed to open URL");
            self.notify(Notification::failure(format!("Could not open {}: {}", url, e)));
        }
    }
}
