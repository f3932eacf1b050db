//! Single-use staged batches keyed by a random token.
//!
//! A staged batch is written once, claimed by the confirmation handler and
//! then deleted. [`PendingBatchStore::consume`] never deletes: cancel removes
//! a record without ever decoding it. A run claims the record, which removes
//! it atomically so that only one run can ever see it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{BatchError, Result};
use crate::ports::RecordStore;
use crate::tab::{Scope, Tab};

pub const PENDING_BATCH_KEY_PREFIX: &str = "pendingBatch__";

pub fn pending_batch_key(token: &str) -> String {
    format!("{PENDING_BATCH_KEY_PREFIX}{token}")
}

/// TTL from a configured number of seconds, saturating at the largest
/// representable duration.
pub fn ttl_from_secs(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBatch {
    pub token: String,
    pub tabs: Vec<Tab>,
    pub scope: Scope,
    pub created_at: DateTime<Utc>,
}

impl PendingBatch {
    /// New batch under a fresh v4 UUID token.
    pub fn new(tabs: Vec<Tab>, scope: Scope, created_at: DateTime<Utc>) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            tabs,
            scope,
            created_at,
        }
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// A TTL that overflows the calendar never expires.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.created_at
            .checked_add_signed(ttl)
            .is_some_and(|deadline| deadline <= now)
    }
}

#[derive(Clone)]
pub struct PendingBatchStore {
    store: Arc<dyn RecordStore>,
}

impl PendingBatchStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn stage(&self, batch: &PendingBatch) -> Result<()> {
        let value = serde_json::to_value(batch)?;
        self.store
            .set(&pending_batch_key(&batch.token), value)
            .await
            .map_err(BatchError::Storage)?;
        info!(
            "Staged pending batch {} ({} tab(s), scope {})",
            batch.token,
            batch.len(),
            batch.scope
        );
        Ok(())
    }

    /// Read a staged batch without removing it. `None` when the token is
    /// unknown, already consumed or swept.
    pub async fn consume(&self, token: &str) -> Result<Option<PendingBatch>> {
        let value = self
            .store
            .get(&pending_batch_key(token))
            .await
            .map_err(BatchError::Storage)?;
        match value {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => {
                debug!("No pending batch for token {token}");
                Ok(None)
            }
        }
    }

    /// Remove a staged batch and return it. Concurrent claims of one token
    /// get it at most once. A record that does not decode is removed too.
    pub async fn claim(&self, token: &str) -> Result<Option<PendingBatch>> {
        let value = self
            .store
            .take(&pending_batch_key(token))
            .await
            .map_err(BatchError::Storage)?;
        match value {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => {
                debug!("Pending batch {token} is absent or already claimed");
                Ok(None)
            }
        }
    }

    pub async fn discard(&self, token: &str) -> Result<()> {
        self.store
            .delete(&pending_batch_key(token))
            .await
            .map_err(BatchError::Storage)
    }

    /// Every staged batch, oldest first. Undecodable records are skipped.
    pub async fn list(&self) -> Result<Vec<PendingBatch>> {
        let mut batches = Vec::new();
        for key in self.pending_keys().await? {
            let Some(value) = self.store.get(&key).await.map_err(BatchError::Storage)? else {
                continue;
            };
            match serde_json::from_value::<PendingBatch>(value) {
                Ok(batch) => batches.push(batch),
                Err(e) => warn!("Skipping unreadable pending batch {key}: {e}"),
            }
        }
        batches.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.token.cmp(&b.token))
        });
        Ok(batches)
    }

    /// Discard batches staged at least `ttl` before `now`, plus records that
    /// no longer decode. Returns the discarded tokens.
    pub async fn sweep_expired(&self, now: DateTime<Utc>, ttl: Duration) -> Result<Vec<String>> {
        let mut swept = Vec::new();
        for key in self.pending_keys().await? {
            let token = key
                .strip_prefix(PENDING_BATCH_KEY_PREFIX)
                .unwrap_or(&key)
                .to_string();
            let Some(value) = self.store.get(&key).await.map_err(BatchError::Storage)? else {
                continue;
            };
            let expired = match serde_json::from_value::<PendingBatch>(value) {
                Ok(batch) => batch.is_expired(now, ttl),
                Err(e) => {
                    warn!("Sweeping unreadable pending batch {key}: {e}");
                    true
                }
            };
            if expired {
                self.store.delete(&key).await.map_err(BatchError::Storage)?;
                swept.push(token);
            }
        }
        swept.sort();
        if !swept.is_empty() {
            info!("Swept {} abandoned pending batch(es)", swept.len());
        }
        Ok(swept)
    }

    async fn pending_keys(&self) -> Result<Vec<String>> {
        let mut keys = self
            .store
            .keys(PENDING_BATCH_KEY_PREFIX)
            .await
            .map_err(BatchError::Storage)?;
        keys.sort();
        Ok(keys)
    }
}
