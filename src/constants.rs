//! Global constants for the backup-shipper daemon.
//!
//! This module centralizes all hardcoded values to improve maintainability
//! and make configuration changes easier. The delay and retry values here
//! are the defaults baked into [`crate::worker::RetryPolicy`]; tests
//! substitute millisecond-scale policies instead of patching constants.

// Timing constants
/// Delay before re-attempting a failed connect/authenticate/folder step (seconds)
pub const RETRY_DELAY_SECS: u64 = 60;

/// Delay after creating a remote folder before polling for visibility (seconds)
pub const FOLDER_CREATION_DELAY_SECS: u64 = 5;

/// Settle delay applied before the stability check of a freshly seen artifact (seconds)
pub const FILE_SETTLE_DELAY_SECS: u64 = 5;

/// Window between the two size probes of the stability check (seconds)
pub const STABILITY_WINDOW_SECS: u64 = 2;

/// Interval between reconciliation polls of the backup inventory API (seconds)
pub const RECONCILE_INTERVAL_SECS: u64 = 300;

/// Hard limit on waiting for an interactively supplied 2FA code (seconds)
pub const TWO_FACTOR_TIMEOUT_SECS: u64 = 300;

/// Poll cadence while waiting for the 2FA code slot to fill (seconds)
pub const TWO_FACTOR_POLL_SECS: u64 = 1;

/// Request timeout for backup inventory API calls (seconds)
pub const INVENTORY_REQUEST_TIMEOUT_SECS: u64 = 10;

// Retry limits
/// Visibility polls after creating a remote folder before giving up
pub const MAX_FOLDER_RETRIES: usize = 3;

// Network defaults
/// Port the control surface listens on
pub const DEFAULT_WEB_PORT: u16 = 5000;

// Filesystem defaults
/// Directory scanned and watched for backup artifacts
pub const DEFAULT_BACKUP_DIR: &str = "/backup";

/// Extension (without dot) that marks a file as a backup artifact
pub const BACKUP_EXTENSION: &str = "tar";

// Environment variables
/// Bearer token for the backup inventory API; the reconciliation poller
/// is disabled when unset
pub const INVENTORY_TOKEN_ENV: &str = "INVENTORY_TOKEN";
