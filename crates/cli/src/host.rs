//! Host bindings for the command line: tabs come from a JSON snapshot file,
//! summarizer units and confirmation requests are written to stdout as JSON
//! lines.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::json;
use tabsum_core::confirm::confirmation_url;
use tabsum_core::ports::{ConfirmationPresenter, TabSource, UnitOpener};
use tabsum_core::unit::UnitRequest;
use tabsum_core::{Scope, Tab, TabId, TabQuery};
use tabsum_runtime_config::{ConfirmSettings, SummarizerSettings};

/// Tabs as captured in a snapshot file (a JSON array of tab records).
pub struct SnapshotTabSource {
    tabs: Vec<Tab>,
}

impl SnapshotTabSource {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tabs at {}", path.display()))?;
        let tabs = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse tabs at {}", path.display()))?;
        Ok(Self { tabs })
    }

    pub fn empty() -> Self {
        Self { tabs: Vec::new() }
    }

    pub fn find(&self, tab_id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == Some(tab_id))
    }
}

#[async_trait]
impl TabSource for SnapshotTabSource {
    async fn query(&self, query: TabQuery) -> Result<Vec<Tab>> {
        Ok(self
            .tabs
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }

    async fn get(&self, tab_id: TabId) -> Result<Option<Tab>> {
        Ok(self.find(tab_id).cloned())
    }
}

fn print_line(value: &serde_json::Value) -> Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{value}").context("Failed to write to stdout")?;
    Ok(())
}

pub struct StdoutUnitOpener {
    settings: SummarizerSettings,
}

impl StdoutUnitOpener {
    pub fn new(settings: SummarizerSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl UnitOpener for StdoutUnitOpener {
    async fn open_unit(&self, tab: &Tab, ordering_hint: Option<i64>) -> Result<()> {
        let request = UnitRequest::for_tab(tab, ordering_hint, &self.settings)
            .ok_or_else(|| anyhow!("tab has no id"))?;
        print_line(&serde_json::to_value(&request)?)
    }
}

pub struct StdoutPresenter {
    settings: ConfirmSettings,
}

impl StdoutPresenter {
    pub fn new(settings: ConfirmSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ConfirmationPresenter for StdoutPresenter {
    async fn present(&self, token: &str, count: usize, scope: Scope) -> Result<()> {
        print_line(&json!({
            "confirm": confirmation_url(&self.settings.page, token, count, scope),
            "token": token,
            "count": count,
            "scope": scope,
        }))
    }
}
