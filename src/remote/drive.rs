//! Collaborator boundary for the remote storage service.
//!
//! The upload pipeline only ever talks to the drive through these traits,
//! so the wire protocol stays swappable and the pipeline tests run against
//! scripted in-memory sessions.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::models::Credentials;

/// Entry point into the remote drive: turns credentials into a live session.
#[async_trait]
pub trait DriveClient: Send + Sync {
    /// Establish a new session. The returned handle starts unauthenticated
    /// unless the remote reports that no second factor is required.
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn DriveSession>>;
}

/// A live connection to the remote drive.
///
/// Implementations must be safe to share across await points; all state
/// mutation happens behind interior mutability.
#[async_trait]
pub trait DriveSession: Send + Sync {
    /// Whether the remote is waiting for a second-factor code.
    fn requires_two_factor(&self) -> bool;

    /// Whether the account is configured for the legacy two-step scheme.
    /// There is no automated handling path for it; callers must treat this
    /// as a fatal configuration error.
    fn requires_legacy_two_step(&self) -> bool;

    /// Whether the session has been elevated to a trusted session.
    fn is_trusted(&self) -> bool;

    /// Submit a verification code. `Ok(false)` means the remote rejected
    /// the code; `Err` means the verification attempt itself failed.
    async fn validate_code(&self, code: &str) -> Result<bool>;

    /// Ask the remote to elevate this session to a trusted session.
    async fn trust_session(&self) -> Result<bool>;

    async fn folder_exists(&self, folder: &str) -> Result<bool>;

    async fn create_folder(&self, folder: &str) -> Result<()>;

    /// List a folder's contents. `Ok(None)` means the folder does not
    /// exist, which callers treat as "file not present" rather than an
    /// error.
    async fn list_folder(&self, folder: &str) -> Result<Option<Vec<DriveEntry>>>;

    /// Stream a local file into the folder under the given name.
    async fn upload(&self, folder: &str, filename: &str, local_path: &Path) -> Result<()>;
}

/// A single entry in a remote folder listing.
///
/// The drive API exposes entries either as a bare name string or as a
/// record whose name hides under one of several keys. Normalization
/// happens here, once, instead of being scattered through matching logic.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DriveEntry {
    /// Entry rendered as a plain filename
    PlainName(String),
    /// Entry rendered as a record with a name-like field
    NamedRecord(serde_json::Map<String, serde_json::Value>),
}

impl DriveEntry {
    /// Keys a record may use for its display name, in precedence order.
    const NAME_KEYS: [&'static str; 3] = ["name", "filename", "title"];

    /// Extract the entry's name, or `None` if the record carries no
    /// recognizable name field.
    pub fn name(&self) -> Option<&str> {
        match self {
            DriveEntry::PlainName(name) => Some(name.as_str()),
            DriveEntry::NamedRecord(record) => Self::NAME_KEYS
                .iter()
                .find_map(|key| record.get(*key).and_then(|value| value.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_name_entry() {
        let entry = DriveEntry::PlainName("backup1.tar".to_string());
        assert_eq!(entry.name(), Some("backup1.tar"));
    }

    #[test]
    fn test_named_record_key_precedence() {
        let entries: Vec<DriveEntry> = serde_json::from_value(json!([
            {"name": "by-name.tar"},
            {"filename": "by-filename.tar"},
            {"title": "by-title.tar"},
            {"name": "wins.tar", "title": "loses.tar"},
        ]))
        .unwrap();

        assert_eq!(entries[0].name(), Some("by-name.tar"));
        assert_eq!(entries[1].name(), Some("by-filename.tar"));
        assert_eq!(entries[2].name(), Some("by-title.tar"));
        assert_eq!(entries[3].name(), Some("wins.tar"));
    }

    #[test]
    fn test_mixed_listing_deserializes() {
        let entries: Vec<DriveEntry> = serde_json::from_value(json!([
            "plain.tar",
            {"filename": "record.tar", "size": 1024},
        ]))
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name(), Some("plain.tar"));
        assert_eq!(entries[1].name(), Some("record.tar"));
    }

    #[test]
    fn test_record_without_name_field() {
        let entry: DriveEntry = serde_json::from_value(json!({"size": 42})).unwrap();
        assert_eq!(entry.name(), None);
    }

    #[test]
    fn test_non_string_name_value_ignored() {
        let entry: DriveEntry = serde_json::from_value(json!({"name": 7})).unwrap();
        assert_eq!(entry.name(), None);
    }
}
