//! HTTP implementation of the drive collaborator boundary.
//!
//! Talks to the drive's REST surface: login, second-factor verification,
//! trust elevation, folder CRUD, listings, and streaming file uploads. All
//! requests carry the session token issued at login.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::TryStreamExt;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tokio_util::codec::{BytesCodec, FramedRead};

use crate::models::Credentials;
use crate::remote::drive::{DriveClient, DriveEntry, DriveSession};

/// Factory for HTTP drive sessions against one drive endpoint.
pub struct HttpDriveClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDriveClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    session_token: String,
    #[serde(default)]
    requires_two_factor: bool,
    #[serde(default)]
    requires_legacy_two_step: bool,
    #[serde(default)]
    trusted: bool,
}

#[async_trait]
impl DriveClient for HttpDriveClient {
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn DriveSession>> {
        let response = self
            .http
            .post(format!("{}/v1/auth/login", self.base_url))
            .json(&json!({
                "account": credentials.account,
                "secret": credentials.secret,
            }))
            .send()
            .await
            .context("Drive login request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("Drive login rejected: HTTP {}", response.status()));
        }

        let login: LoginResponse = response
            .json()
            .await
            .context("Invalid drive login response")?;

        Ok(Box::new(HttpDriveSession {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: login.session_token,
            two_factor_pending: AtomicBool::new(login.requires_two_factor),
            legacy_two_step: login.requires_legacy_two_step,
            trusted: AtomicBool::new(login.trusted),
        }))
    }
}

/// One authenticated-or-pending connection to the drive.
struct HttpDriveSession {
    http: reqwest::Client,
    base_url: String,
    token: String,
    two_factor_pending: AtomicBool,
    legacy_two_step: bool,
    trusted: AtomicBool,
}

impl HttpDriveSession {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DriveSession for HttpDriveSession {
    fn requires_two_factor(&self) -> bool {
        self.two_factor_pending.load(Ordering::SeqCst)
    }

    fn requires_legacy_two_step(&self) -> bool {
        self.legacy_two_step
    }

    fn is_trusted(&self) -> bool {
        self.trusted.load(Ordering::SeqCst)
    }

    async fn validate_code(&self, code: &str) -> Result<bool> {
        let response = self
            .http
            .post(self.url("/v1/auth/verify"))
            .bearer_auth(&self.token)
            .json(&json!({ "code": code }))
            .send()
            .await
            .context("Code verification request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Code verification failed: HTTP {}",
                response.status()
            ));
        }

        #[derive(Deserialize)]
        struct VerifyResponse {
            valid: bool,
        }

        let verdict: VerifyResponse = response
            .json()
            .await
            .context("Invalid code verification response")?;

        if verdict.valid {
            self.two_factor_pending.store(false, Ordering::SeqCst);
        }
        Ok(verdict.valid)
    }

    async fn trust_session(&self) -> Result<bool> {
        let response = self
            .http
            .post(self.url("/v1/auth/trust"))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Trust elevation request failed")?;

        let granted = response.status().is_success();
        if granted {
            self.trusted.store(true, Ordering::SeqCst);
        }
        Ok(granted)
    }

    async fn folder_exists(&self, folder: &str) -> Result<bool> {
        let response = self
            .http
            .get(self.url(&format!("/v1/drive/folders/{folder}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Folder lookup request failed")?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(anyhow!("Folder lookup failed: HTTP {status}")),
        }
    }

    async fn create_folder(&self, folder: &str) -> Result<()> {
        let response = self
            .http
            .post(self.url("/v1/drive/folders"))
            .bearer_auth(&self.token)
            .json(&json!({ "name": folder }))
            .send()
            .await
            .context("Folder creation request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("Folder creation failed: HTTP {}", response.status()));
        }
        Ok(())
    }

    async fn list_folder(&self, folder: &str) -> Result<Option<Vec<DriveEntry>>> {
        let response = self
            .http
            .get(self.url(&format!("/v1/drive/folders/{folder}/items")))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Folder listing request failed")?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let entries: Vec<DriveEntry> = response
                    .json()
                    .await
                    .context("Invalid folder listing response")?;
                Ok(Some(entries))
            }
            status => Err(anyhow!("Folder listing failed: HTTP {status}")),
        }
    }

    async fn upload(&self, folder: &str, filename: &str, local_path: &Path) -> Result<()> {
        let file = tokio::fs::File::open(local_path)
            .await
            .context(format!("Failed to open {} for upload", local_path.display()))?;
        let file_size = file
            .metadata()
            .await
            .context(format!("Failed to stat {}", local_path.display()))?
            .len();

        debug!(
            "Streaming {} ({} bytes) to folder {}",
            filename, file_size, folder
        );

        let stream = FramedRead::new(file, BytesCodec::new()).map_ok(BytesMut::freeze);
        let response = self
            .http
            .put(self.url(&format!("/v1/drive/folders/{folder}/files/{filename}")))
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_LENGTH, file_size)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await
            .context("Upload request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("Upload rejected: HTTP {}", response.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpDriveClient::new("http://drive.local/").unwrap();
        assert_eq!(client.base_url, "http://drive.local");
    }

    #[test]
    fn test_login_response_flag_defaults() {
        let login: LoginResponse =
            serde_json::from_value(json!({"session_token": "tok-1"})).unwrap();
        assert_eq!(login.session_token, "tok-1");
        assert!(!login.requires_two_factor);
        assert!(!login.requires_legacy_two_step);
        assert!(!login.trusted);
    }
}
