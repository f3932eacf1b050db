use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use tabsum_core::PendingBatchStore;
use tabsum_core::pending::ttl_from_secs;
use tabsum_runtime_config::TabsumConfig;

use crate::batch_cmd::open_store;

fn pending_store(store: &Path) -> Result<PendingBatchStore> {
    Ok(PendingBatchStore::new(Arc::new(open_store(store)?)))
}

pub async fn list_pending(store: &Path) -> Result<()> {
    for batch in pending_store(store)?.list().await? {
        println!(
            "{}",
            json!({
                "token": batch.token,
                "scope": batch.scope,
                "count": batch.len(),
                "createdAt": batch.created_at,
            })
        );
    }
    Ok(())
}

pub async fn sweep_pending(config: &TabsumConfig, store: &Path, ttl_secs: Option<u64>) -> Result<()> {
    let ttl = ttl_from_secs(ttl_secs.unwrap_or(config.batch.pending_ttl_secs));
    for token in pending_store(store)?.sweep_expired(Utc::now(), ttl).await? {
        println!("{token}");
    }
    Ok(())
}
