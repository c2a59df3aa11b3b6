//! Reconciliation poller.
//!
//! Safety net for artifacts the filesystem watcher missed: periodically
//! fetches the list of known backups from the external inventory API,
//! matches newly seen records against local artifacts by substring
//! containment, and enqueues the first match. The loop never terminates
//! and never propagates errors upward.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use tokio::time::sleep;

use crate::constants::INVENTORY_REQUEST_TIMEOUT_SECS;
use crate::models::DiscoverySource;
use crate::queue::UploadQueue;
use crate::store::BackupStore;

#[derive(Deserialize, Debug, Default)]
struct InventoryResponse {
    #[serde(default)]
    data: InventoryData,
}

#[derive(Deserialize, Debug, Default)]
struct InventoryData {
    #[serde(default)]
    backups: Vec<InventoryRecord>,
}

/// One backup record as reported by the inventory API.
#[derive(Deserialize, Debug, Clone)]
pub struct InventoryRecord {
    #[serde(default)]
    pub slug: String,
}

/// Periodic producer reconciling the inventory API against local files.
pub struct ReconcilePoller {
    http: reqwest::Client,
    inventory_url: String,
    token: String,
    store: BackupStore,
    queue: UploadQueue,
    poll_interval: Duration,
    retry_delay: Duration,
}

impl ReconcilePoller {
    pub fn new(
        inventory_url: &str,
        token: String,
        store: BackupStore,
        queue: UploadQueue,
        poll_interval: Duration,
        retry_delay: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(INVENTORY_REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build inventory HTTP client")?;

        Ok(Self {
            http,
            inventory_url: inventory_url.trim_end_matches('/').to_string(),
            token,
            store,
            queue,
            poll_interval,
            retry_delay,
        })
    }

    /// Fetch the inventory. Non-200 responses are an empty result for the
    /// cycle; transport errors (including timeouts) bubble up so the
    /// caller can apply the retry delay.
    async fn fetch_known_backups(&self) -> Result<Vec<InventoryRecord>> {
        let response = self
            .http
            .get(format!("{}/backups", self.inventory_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Inventory API request failed")?;

        if !response.status().is_success() {
            warn!("Inventory API error: HTTP {}", response.status());
            return Ok(Vec::new());
        }

        let body: InventoryResponse = response
            .json()
            .await
            .context("Invalid inventory API response")?;
        Ok(body.data.backups)
    }

    /// Poll forever. Each newly seen slug is matched against the current
    /// local listing; the first local file containing the slug is
    /// enqueued.
    pub async fn run(self) {
        info!("Starting inventory reconciliation polling");
        let mut known_backups: HashSet<String> = HashSet::new();

        loop {
            match self.fetch_known_backups().await {
                Ok(records) => {
                    for record in records {
                        if record.slug.is_empty() || known_backups.contains(&record.slug) {
                            continue;
                        }
                        known_backups.insert(record.slug.clone());

                        let local = self.store.list_backups();
                        if let Some(matched) =
                            local.iter().find(|name| name.contains(&record.slug))
                        {
                            info!("New backup detected: {}", matched);
                            self.queue
                                .enqueue(matched.clone(), DiscoverySource::Reconcile);
                        }
                    }
                    sleep(self.poll_interval).await;
                }
                Err(e) => {
                    warn!("Inventory reconciliation error: {:#}", e);
                    sleep(self.retry_delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inventory_response_shape() {
        let body: InventoryResponse = serde_json::from_value(json!({
            "data": {
                "backups": [
                    {"slug": "a1b2c3"},
                    {"slug": "d4e5f6", "name": "Weekly backup"},
                ]
            }
        }))
        .unwrap();

        let slugs: Vec<&str> = body.data.backups.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a1b2c3", "d4e5f6"]);
    }

    #[test]
    fn test_inventory_response_tolerates_missing_fields() {
        let empty: InventoryResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.data.backups.is_empty());

        let no_slug: InventoryResponse = serde_json::from_value(json!({
            "data": {"backups": [{"name": "unnamed"}]}
        }))
        .unwrap();
        assert_eq!(no_slug.data.backups[0].slug, "");
    }
}
