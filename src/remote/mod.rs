//! Remote drive integration for backup uploads.
//!
//! This module owns everything that talks to the remote storage service:
//! the collaborator boundary ([`drive::DriveClient`]/[`drive::DriveSession`]),
//! the production HTTP implementation, and the session lifecycle that the
//! upload worker drives (connect, 2FA handshake, folder provisioning,
//! existence checks, transfers).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ UploadWorker │────▶│  RemoteSession   │────▶│ dyn DriveSession │
//! └──────────────┘     │ (lifecycle, 2FA) │     │ (HTTP or fake)   │
//!                      └──────────────────┘     └──────────────────┘
//! ```
//!
//! The worker owns exactly one [`session::RemoteSession`] at a time and
//! replaces it wholesale on reconnect or after a remote folder is created,
//! because the drive client's folder listing cache goes stale after
//! structural changes.

/// Collaborator boundary traits and listing-entry normalization
pub mod drive;

/// Production HTTP drive client
pub mod http;

/// Session lifecycle: connect, authenticate, provision, transfer
pub mod session;
