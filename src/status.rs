//! Shared authentication status between the upload worker and the control
//! surface.
//!
//! The worker's 2FA handshake is the single writer of the
//! `requires_2fa`/`is_authenticated` flags; the control surface is the
//! single writer of the pending code slot. Both sides only need
//! last-write-wins visibility, so a plain mutex-guarded struct is enough.

use std::sync::Mutex;

use serde::Serialize;

#[derive(Default)]
struct StatusInner {
    requires_2fa: bool,
    is_authenticated: bool,
    pending_code: Option<String>,
}

/// Coarse authentication state visible to the control surface.
///
/// Shared via `Arc` between the worker task, the 2FA handshake, and the
/// axum handlers.
#[derive(Default)]
pub struct AuthStatus {
    inner: Mutex<StatusInner>,
}

/// Point-in-time copy of the status flags, serialized by `GET /status`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub requires_2fa: bool,
    pub is_authenticated: bool,
    pub status: String,
}

impl AuthStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the session as waiting for an interactively supplied code.
    pub fn set_awaiting_code(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.requires_2fa = true;
        inner.is_authenticated = false;
    }

    /// Clear the 2FA-pending flag without touching the authenticated flag,
    /// used when the handshake times out or the code was rejected.
    pub fn clear_awaiting_code(&self) {
        self.inner.lock().unwrap().requires_2fa = false;
    }

    /// Record a completed authentication.
    pub fn set_authenticated(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.requires_2fa = false;
        inner.is_authenticated = true;
    }

    /// Store a verification code received from the control surface.
    pub fn submit_code(&self, code: String) {
        self.inner.lock().unwrap().pending_code = Some(code);
    }

    /// Take the pending code out of the slot, leaving it empty.
    pub fn take_code(&self) -> Option<String> {
        self.inner.lock().unwrap().pending_code.take()
    }

    /// Drop a pending code that turned out to be invalid.
    pub fn discard_code(&self) {
        self.inner.lock().unwrap().pending_code = None;
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = self.inner.lock().unwrap();
        StatusSnapshot {
            requires_2fa: inner.requires_2fa,
            is_authenticated: inner.is_authenticated,
            status: "running".to_string(),
        }
    }
}
