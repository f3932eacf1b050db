//! In-memory collaborators and tab builders for tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::Value;

use crate::ports::{ConfirmationPresenter, RecordStore, TabSource, UnitOpener};
use crate::tab::{Scope, Tab, TabId, TabQuery};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tab in window 1 with the given id, index and URL.
pub fn tab(id: TabId, index: i64, url: &str) -> Tab {
    Tab {
        id: Some(id),
        url: Some(url.to_string()),
        pending_url: None,
        index: Some(index),
        window_id: Some(1),
        highlighted: false,
    }
}

/// `count` eligible https tabs in window 1 with ids and indices `0..count`.
pub fn eligible_window(count: usize) -> Vec<Tab> {
    (0..count as i64)
        .map(|i| tab(i, i, &format!("https://example.com/page/{i}")))
        .collect()
}

/// Tab source over a fixed, mutable list of tabs.
#[derive(Default)]
pub struct StaticTabSource {
    tabs: Mutex<Vec<Tab>>,
    queries: Mutex<Vec<TabQuery>>,
}

impl StaticTabSource {
    pub fn new(tabs: Vec<Tab>) -> Self {
        Self {
            tabs: Mutex::new(tabs),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Simulate the user closing a tab.
    pub fn close(&self, tab_id: TabId) {
        lock(&self.tabs).retain(|t| t.id != Some(tab_id));
    }

    /// Simulate a tab navigating somewhere else.
    pub fn navigate(&self, tab_id: TabId, url: &str) {
        for t in lock(&self.tabs).iter_mut().filter(|t| t.id == Some(tab_id)) {
            t.url = Some(url.to_string());
        }
    }

    pub fn queries(&self) -> Vec<TabQuery> {
        lock(&self.queries).clone()
    }
}

#[async_trait]
impl TabSource for StaticTabSource {
    async fn query(&self, query: TabQuery) -> Result<Vec<Tab>> {
        lock(&self.queries).push(query);
        Ok(lock(&self.tabs)
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn get(&self, tab_id: TabId) -> Result<Option<Tab>> {
        Ok(lock(&self.tabs)
            .iter()
            .find(|t| t.id == Some(tab_id))
            .cloned())
    }
}

/// Record store backed by a map, counting mutations.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<String, Value>>,
    writes: Mutex<usize>,
    deletes: Mutex<usize>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        lock(&self.records).clone()
    }

    pub fn insert_raw(&self, key: &str, value: Value) {
        lock(&self.records).insert(key.to_string(), value);
    }

    pub fn writes(&self) -> usize {
        *lock(&self.writes)
    }

    pub fn deletes(&self) -> usize {
        *lock(&self.deletes)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *lock(&self.fail_reads) = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *lock(&self.fail_writes) = fail;
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        if *lock(&self.fail_reads) {
            bail!("storage unavailable");
        }
        Ok(lock(&self.records).get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        if *lock(&self.fail_writes) {
            bail!("storage unavailable");
        }
        *lock(&self.writes) += 1;
        lock(&self.records).insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if *lock(&self.fail_writes) {
            bail!("storage unavailable");
        }
        *lock(&self.deletes) += 1;
        lock(&self.records).remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Value>> {
        if *lock(&self.fail_reads) || *lock(&self.fail_writes) {
            bail!("storage unavailable");
        }
        let taken = lock(&self.records).remove(key);
        if taken.is_some() {
            *lock(&self.deletes) += 1;
        }
        Ok(taken)
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        if *lock(&self.fail_reads) {
            bail!("storage unavailable");
        }
        Ok(lock(&self.records)
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// Opener that records every call and fails for chosen tab ids.
#[derive(Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<(TabId, Option<i64>)>>,
    failing: Mutex<HashSet<TabId>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, tab_id: TabId) {
        lock(&self.failing).insert(tab_id);
    }

    /// Successfully opened units as `(tab id, ordering hint)`, in open order.
    pub fn opened(&self) -> Vec<(TabId, Option<i64>)> {
        lock(&self.opened).clone()
    }

    pub fn opened_ids(&self) -> Vec<TabId> {
        self.opened().into_iter().map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl UnitOpener for RecordingOpener {
    async fn open_unit(&self, tab: &Tab, ordering_hint: Option<i64>) -> Result<()> {
        let Some(id) = tab.id else {
            bail!("tab has no id");
        };
        if lock(&self.failing).contains(&id) {
            bail!("tab {id} could not be opened");
        }
        lock(&self.opened).push((id, ordering_hint));
        Ok(())
    }
}

/// Presenter that records confirmation requests.
#[derive(Default)]
pub struct RecordingPresenter {
    requests: Mutex<Vec<(String, usize, Scope)>>,
    fail: Mutex<bool>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        *lock(&self.fail) = fail;
    }

    pub fn requests(&self) -> Vec<(String, usize, Scope)> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl ConfirmationPresenter for RecordingPresenter {
    async fn present(&self, token: &str, count: usize, scope: Scope) -> Result<()> {
        if *lock(&self.fail) {
            bail!("confirmation window could not be created");
        }
        lock(&self.requests).push((token.to_string(), count, scope));
        Ok(())
    }
}
