//! Host collaborators the batch logic is driven through.
//!
//! Every port is async and object-safe so hosts can hand the core
//! `Arc<dyn Port>` values; in-memory fakes live in [`crate::testing`].

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::tab::{Scope, Tab, TabId, TabQuery};

/// Tab enumeration and lookup.
#[async_trait]
pub trait TabSource: Send + Sync {
    async fn query(&self, query: TabQuery) -> Result<Vec<Tab>>;

    /// Current state of one tab, `None` once it has been closed.
    async fn get(&self, tab_id: TabId) -> Result<Option<Tab>>;
}

/// Opens one summarizer view for a tab.
#[async_trait]
pub trait UnitOpener: Send + Sync {
    async fn open_unit(&self, tab: &Tab, ordering_hint: Option<i64>) -> Result<()>;
}

/// Durable key-value storage holding opaque JSON records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
    /// Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
    /// Remove and return a record in one atomic step. Of several concurrent
    /// callers, across processes included, at most one sees the value.
    async fn take(&self, key: &str) -> Result<Option<Value>>;
    /// All keys starting with `prefix`, in no particular order.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Shows the confirmation surface. The user's answer comes back later as a
/// decision signal, never as a return value.
#[async_trait]
pub trait ConfirmationPresenter: Send + Sync {
    async fn present(&self, token: &str, count: usize, scope: Scope) -> Result<()>;
}
