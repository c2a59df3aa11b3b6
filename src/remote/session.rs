//! Remote session lifecycle.
//!
//! States: disconnected → connecting → connected/unauthenticated →
//! awaiting-code → authenticated. Unrecoverable failures drop the session
//! entirely; the worker reconnects from scratch on the next attempt.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::time::{sleep, Instant};

use crate::models::Credentials;
use crate::remote::drive::{DriveClient, DriveSession};
use crate::status::AuthStatus;

/// Result of the authentication gate for one pipeline pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Session is usable for drive operations
    Authenticated,
    /// Handshake failed in a recoverable way; retry the whole step later
    RetryLater,
    /// Account uses legacy two-step authentication, which has no automated
    /// handling path; the process must exit
    LegacyTwoStep,
}

/// The single live connection to the remote drive, owned by the worker.
///
/// Never mutated in place: reconnects and post-folder-creation refreshes
/// produce a whole new value.
pub struct RemoteSession {
    inner: Box<dyn DriveSession>,
}

/// Establish a fresh session.
pub async fn connect(client: &dyn DriveClient, credentials: &Credentials) -> Result<RemoteSession> {
    info!("Connecting to remote drive...");
    let inner = client
        .connect(credentials)
        .await
        .context("Remote drive connection failed")?;
    Ok(RemoteSession { inner })
}

impl RemoteSession {
    /// Drive the session to the authenticated state.
    ///
    /// When a second factor is required this blocks on the interactive
    /// handshake: the pending flag is raised for the control surface, the
    /// shared code slot is polled once per `poll` up to `timeout`, and the
    /// supplied code is validated. Invalid codes and timeouts are
    /// retryable; only the legacy two-step scheme is fatal.
    pub async fn authenticate(
        &self,
        status: &AuthStatus,
        timeout: Duration,
        poll: Duration,
    ) -> AuthOutcome {
        if self.inner.requires_two_factor() {
            return self.run_code_handshake(status, timeout, poll).await;
        }

        if self.inner.requires_legacy_two_step() {
            warn!("Legacy two-step authentication detected; no automated handling path exists");
            return AuthOutcome::LegacyTwoStep;
        }

        status.set_authenticated();
        AuthOutcome::Authenticated
    }

    async fn run_code_handshake(
        &self,
        status: &AuthStatus,
        timeout: Duration,
        poll: Duration,
    ) -> AuthOutcome {
        info!("Two-factor authentication required");
        info!("Waiting for verification code from the control surface...");
        status.set_awaiting_code();

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(code) = status.take_code() {
                match self.inner.validate_code(&code).await {
                    Ok(true) => {
                        if !self.inner.is_trusted() {
                            info!("Requesting trusted session...");
                            match self.inner.trust_session().await {
                                Ok(true) => {}
                                Ok(false) => warn!("Failed to establish trusted session"),
                                Err(e) => warn!("Trust elevation error: {:#}", e),
                            }
                        }
                        info!("Two-factor authentication successful");
                        status.set_authenticated();
                        return AuthOutcome::Authenticated;
                    }
                    Ok(false) => {
                        // Leave the pending flag raised so the operator can
                        // submit another code on the next attempt.
                        warn!("Invalid verification code");
                        return AuthOutcome::RetryLater;
                    }
                    Err(e) => {
                        warn!("Two-factor verification error: {:#}", e);
                        status.clear_awaiting_code();
                        return AuthOutcome::RetryLater;
                    }
                }
            }

            if Instant::now() >= deadline {
                warn!("Timeout waiting for verification code");
                status.clear_awaiting_code();
                return AuthOutcome::RetryLater;
            }
            sleep(poll).await;
        }
    }

    /// Ensure the upload folder exists, creating it if necessary.
    ///
    /// Folder creation invalidates the drive client's listing cache, so a
    /// successful creation is followed by a full reconnect and up to
    /// `max_retries` visibility polls spaced `creation_delay` apart.
    /// Returns `(ok, session)`; a `None` session means the handle was
    /// discarded and the caller must reconnect from scratch.
    pub async fn ensure_folder(
        self,
        client: &dyn DriveClient,
        credentials: &Credentials,
        folder: &str,
        creation_delay: Duration,
        max_retries: usize,
    ) -> (bool, Option<RemoteSession>) {
        match self.inner.folder_exists(folder).await {
            Ok(true) => {
                info!("Folder \"{}\" found", folder);
                (true, Some(self))
            }
            Ok(false) => {
                info!("Creating folder \"{}\"...", folder);
                if let Err(e) = self.inner.create_folder(folder).await {
                    warn!("Failed to create folder \"{}\": {:#}", folder, e);
                    return (false, Some(self));
                }
                info!("Folder \"{}\" created successfully", folder);

                let refreshed = match connect(client, credentials).await {
                    Ok(session) => session,
                    Err(e) => {
                        warn!("Reconnection failed after folder creation: {:#}", e);
                        return (false, None);
                    }
                };
                info!("Remote connection refreshed after folder creation");

                sleep(creation_delay).await;
                if refreshed
                    .wait_for_folder_visibility(folder, creation_delay, max_retries)
                    .await
                {
                    (true, Some(refreshed))
                } else {
                    warn!(
                        "Folder \"{}\" not accessible after {} attempts",
                        folder, max_retries
                    );
                    (false, None)
                }
            }
            Err(e) => {
                warn!("Error checking remote folder \"{}\": {:#}", folder, e);
                (false, Some(self))
            }
        }
    }

    async fn wait_for_folder_visibility(
        &self,
        folder: &str,
        delay: Duration,
        max_retries: usize,
    ) -> bool {
        for attempt in 1..=max_retries {
            match self.inner.folder_exists(folder).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => warn!("Folder visibility poll failed: {:#}", e),
            }
            if attempt < max_retries {
                sleep(delay).await;
            }
        }
        false
    }

    /// Whether the remote folder already holds a file with this name.
    ///
    /// A missing folder and listing errors both count as "not present";
    /// the caller will surface any real problem at upload time.
    pub async fn file_exists(&self, folder: &str, filename: &str) -> bool {
        match self.inner.list_folder(folder).await {
            Ok(Some(entries)) => {
                let found = entries
                    .iter()
                    .any(|entry| entry.name() == Some(filename));
                if found {
                    info!("File already exists remotely: {}", filename);
                }
                found
            }
            Ok(None) => {
                warn!(
                    "Folder \"{}\" not found while checking file existence",
                    folder
                );
                false
            }
            Err(e) => {
                warn!("Error checking remote file existence: {:#}", e);
                false
            }
        }
    }

    /// Upload one local artifact. Failures are logged and reported as
    /// `false`; nothing propagates past this boundary.
    pub async fn upload_backup(&self, folder: &str, filename: &str, local_path: &Path) -> bool {
        if !local_path.is_file() {
            warn!("File not found: {}", filename);
            return false;
        }

        info!("Uploading: {}", filename);
        match self.inner.upload(folder, filename, local_path).await {
            Ok(()) => {
                info!("Successfully uploaded: {}", filename);
                true
            }
            Err(e) => {
                warn!("Upload failed for {}: {:#}", filename, e);
                false
            }
        }
    }
}
