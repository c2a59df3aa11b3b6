//! # backup-shipper
//!
//! A daemon that moves locally produced backup artifacts into a remote
//! drive exactly once, tolerating an interactive two-factor authentication
//! handshake, transient connectivity failures, and duplicate discovery of
//! the same artifact.
//!
//! ## Overview
//!
//! Three producers feed an upload queue: a filesystem watcher on the
//! backup directory, a reconciliation poller that cross-checks an external
//! backup inventory, and a startup scan. A single worker consumes the
//! queue and drives each artifact through a short pipeline: stability
//! check, connect, authenticate (with an interactive 2FA handshake when
//! the remote demands one), remote folder provisioning, a remote
//! existence check, the transfer itself, and optional local cleanup.
//! Recoverable failures put the artifact back on the queue; the pipeline
//! is self-healing without operator intervention.
//!
//! ```text
//! watcher ──┐
//! poller  ──┼──▶ upload queue ──▶ upload worker ──▶ remote drive
//! scan    ──┘                          │
//!                                      └──▶ local store cleanup
//! control surface ◀──── 2FA code / status ────▶ worker handshake
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions and argument parsing
//! - [`models`]: Core data models shared across the pipeline
//! - [`store`]: Local artifact store accessor (listing, stability, cleanup)
//! - [`queue`]: Multi-producer single-consumer upload queue
//! - [`remote`]: Drive collaborator boundary, HTTP client, session lifecycle
//! - [`watch`]: Filesystem watcher producer
//! - [`reconcile`]: Inventory reconciliation poller
//! - [`worker`]: The per-artifact upload state machine
//! - [`server`]: Control surface (health, status, 2FA code intake)
//! - [`status`]: Shared authentication status state
//! - [`constants`]: Application-wide constants

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Core data models shared across the pipeline
pub mod models;

/// Application constants and default configuration values
pub mod constants;

/// Shared authentication status between worker and control surface
pub mod status;

/// Multi-producer single-consumer upload queue
pub mod queue;

/// Local artifact store accessor
pub mod store;

/// Remote drive integration (collaborator boundary, HTTP client, session)
pub mod remote;

/// Filesystem watcher producer
pub mod watch;

/// Inventory reconciliation poller
pub mod reconcile;

/// Upload worker state machine
pub mod worker;

/// Control surface endpoints
pub mod server;
