// SPDX-License-Identifier: GPL-3.0-only

//! QR scan debouncing
//!
//! The live feed reports a code on nearly every frame while it is in view.
//! The debouncer surfaces at most one code per cooldown window:
//!
//! ```text
//!            non-empty scan
//!   Idle ─────────────────────▶ Suppressed ──┐ scans ignored
//!    ▲                              │  ◀─────┘
//!    └──────── deadline reached ────┘
//! ```
//!
//! The expiry is a deadline owned by the debouncer rather than a detached
//! timer, so the owner decides when to wait on it and tests can drive it with
//! a paused tokio clock.

use super::frame_processor::DetectedCode;
use crate::backends::camera::ScanEvent;
use crate::constants::QR_COOLDOWN;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Single-slot suppression timer for scan events
#[derive(Debug)]
pub struct BarcodeDebouncer {
    cooldown: Duration,
    active: Option<DetectedCode>,
    expires_at: Option<Instant>,
}

impl Default for BarcodeDebouncer {
    fn default() -> Self {
        Self::new(QR_COOLDOWN)
    }
}

impl BarcodeDebouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            active: None,
            expires_at: None,
        }
    }

    /// Feed one scan event
    ///
    /// Returns the code when it was accepted (Idle → Suppressed). Empty
    /// payloads and events arriving while a code is active return `None`
    /// and leave the state and deadline untouched. An event stamped at or
    /// after the pending deadline counts as arriving after expiry.
    pub fn on_scan(&mut self, event: &ScanEvent) -> Option<DetectedCode> {
        if event.payload.is_empty() {
            return None;
        }

        self.expire(event.timestamp);

        if self.active.is_some() {
            trace!(payload = %event.payload, "Scan suppressed during cooldown");
            return None;
        }

        let code = DetectedCode::new(event.payload.clone());
        debug!(payload = %code.payload, url = code.is_url(), "QR code accepted");
        self.active = Some(code.clone());
        self.expires_at = Some(event.timestamp + self.cooldown);
        Some(code)
    }

    /// Clear the active code if its deadline has passed
    ///
    /// Returns the code that was cleared.
    pub fn expire(&mut self, now: Instant) -> Option<DetectedCode> {
        match self.expires_at {
            Some(deadline) if deadline <= now => {
                self.expires_at = None;
                let cleared = self.active.take();
                if let Some(code) = &cleared {
                    debug!(payload = %code.payload, "QR cooldown expired");
                }
                cleared
            }
            _ => None,
        }
    }

    /// Resolve once the pending deadline is reached; never resolves when idle
    pub async fn wait_expiry(&self) {
        match self.expires_at {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    /// Drop the pending expiry and clear the active code
    pub fn cancel(&mut self) -> Option<DetectedCode> {
        self.expires_at = None;
        self.active.take()
    }

    /// The currently visible code
    pub fn active_code(&self) -> Option<&DetectedCode> {
        self.active.as_ref()
    }

    /// When the active code will be cleared
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(payload: &str) -> ScanEvent {
        ScanEvent::now(payload)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_payload_wins_within_window() {
        let mut debouncer = BarcodeDebouncer::default();

        assert_eq!(debouncer.on_scan(&scan("first")).unwrap().payload, "first");
        for payload in ["second", "first", "third"] {
            tokio::time::advance(Duration::from_millis(500)).await;
            assert!(debouncer.on_scan(&scan(payload)).is_none());
        }

        assert_eq!(debouncer.active_code().unwrap().payload, "first");
    }

    #[tokio::test(start_paused = true)]
    async fn test_suppressed_scans_do_not_extend_deadline() {
        let mut debouncer = BarcodeDebouncer::default();
        debouncer.on_scan(&scan("a"));
        let deadline = debouncer.expires_at().unwrap();

        tokio::time::advance(Duration::from_millis(1900)).await;
        debouncer.on_scan(&scan("a"));
        assert_eq!(debouncer.expires_at(), Some(deadline));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverts_to_empty_after_cooldown() {
        let mut debouncer = BarcodeDebouncer::default();
        debouncer.on_scan(&scan("code"));

        tokio::time::advance(Duration::from_millis(1999)).await;
        assert!(debouncer.expire(Instant::now()).is_none());
        assert!(debouncer.active_code().is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(debouncer.expire(Instant::now()).unwrap().payload, "code");
        assert!(debouncer.active_code().is_none());
        assert!(debouncer.expires_at().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_expiry_resolves_at_deadline() {
        let mut debouncer = BarcodeDebouncer::default();
        let start = Instant::now();
        debouncer.on_scan(&scan("code"));

        debouncer.wait_expiry().await;
        let waited = Instant::now() - start;
        assert!(waited >= QR_COOLDOWN);
        assert!(waited < QR_COOLDOWN + Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_expiry_pending_when_idle() {
        let debouncer = BarcodeDebouncer::default();
        let waited =
            tokio::time::timeout(Duration::from_secs(60), debouncer.wait_expiry()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_payload_never_transitions() {
        let mut debouncer = BarcodeDebouncer::default();
        assert!(debouncer.on_scan(&scan("")).is_none());
        assert!(debouncer.active_code().is_none());
        assert!(debouncer.expires_at().is_none());

        assert!(debouncer.on_scan(&scan("after")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_window_after_expiry() {
        let mut debouncer = BarcodeDebouncer::new(Duration::from_millis(100));
        debouncer.on_scan(&scan("one"));
        tokio::time::advance(Duration::from_millis(100)).await;

        let accepted = debouncer.on_scan(&scan("two")).unwrap();
        assert_eq!(accepted.payload, "two");
    }

    #[test]
    fn test_cancel_clears_code() {
        let mut debouncer = BarcodeDebouncer::default();
        debouncer.on_scan(&ScanEvent {
            payload: "x".into(),
            timestamp: Instant::now(),
        });
        assert_eq!(debouncer.cancel().unwrap().payload, "x");
        assert!(debouncer.expires_at().is_none());
    }
}
