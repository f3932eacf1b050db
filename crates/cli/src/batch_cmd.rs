use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tabsum_core::{BatchOpener, ConfirmationSignal, Ports, Scope, TabId, TriggerOutcome};
use tabsum_local_store::{SqliteRecordStore, default_store_path};
use tabsum_runtime_config::TabsumConfig;
use tracing::{info, warn};

use crate::host::{SnapshotTabSource, StdoutPresenter, StdoutUnitOpener};

pub fn resolve_store_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_store_path().context("Could not locate the pending batch store"),
    }
}

pub fn open_store(store: &Path) -> Result<SqliteRecordStore> {
    SqliteRecordStore::open(store)
        .with_context(|| format!("Failed to open pending batch store at {}", store.display()))
}

fn build_opener(
    config: &TabsumConfig,
    store: &Path,
    tabs: Arc<SnapshotTabSource>,
) -> Result<BatchOpener> {
    let ports = Ports {
        tabs,
        opener: Arc::new(StdoutUnitOpener::new(config.summarizer.clone())),
        store: Arc::new(open_store(store)?),
        presenter: Arc::new(StdoutPresenter::new(config.confirm.clone())),
    };
    Ok(BatchOpener::new(ports, &config.batch))
}

/// Handle an "open + summarize" trigger from tab `trigger` of the snapshot.
pub async fn run_open(
    config: &TabsumConfig,
    store: &Path,
    tabs_path: &Path,
    trigger: TabId,
    scope: Scope,
) -> Result<()> {
    let source = Arc::new(SnapshotTabSource::load(tabs_path)?);
    let trigger_tab = source
        .find(trigger)
        .cloned()
        .with_context(|| format!("Trigger tab {trigger} not found in {}", tabs_path.display()))?;

    let batch = build_opener(config, store, source)?;
    match batch.trigger(&trigger_tab, scope).await? {
        TriggerOutcome::NoOp => info!("No summarizable tabs for scope {scope}"),
        TriggerOutcome::Opened(report) => {
            if report.failed_count() > 0 {
                warn!(
                    "{} of {} summarizer(s) failed to open",
                    report.failed_count(),
                    report.outcomes.len()
                );
            }
        }
        TriggerOutcome::AwaitingConfirmation(token) => {
            info!("Batch {token} is waiting for confirmation");
        }
    }
    Ok(())
}

/// Deliver a run/cancel signal and print the response.
pub async fn run_signal(
    config: &TabsumConfig,
    store: &Path,
    tabs_path: Option<&Path>,
    signal: ConfirmationSignal,
) -> Result<()> {
    let message = signal.to_message();
    run_message(config, store, tabs_path, &message).await
}

/// Deliver a raw decision message. Prints nothing for foreign actions.
///
/// A run re-checks every staged tab against the current browser state, so it
/// needs a tab snapshot. Without one the batch is left staged.
pub async fn run_message(
    config: &TabsumConfig,
    store: &Path,
    tabs_path: Option<&Path>,
    message: &serde_json::Value,
) -> Result<()> {
    let source = match tabs_path {
        Some(path) => SnapshotTabSource::load(path)?,
        None => {
            if let Some(ConfirmationSignal::Run(token)) = ConfirmationSignal::from_message(message) {
                bail!("Running batch {token} needs --tabs with the current tab snapshot");
            }
            SnapshotTabSource::empty()
        }
    };
    let batch = build_opener(config, store, Arc::new(source))?;
    if let Some(response) = batch.handler().handle_message(message).await {
        println!("{}", serde_json::to_string(&response)?);
    }
    Ok(())
}

pub fn parse_message(raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw).context("Message is not valid JSON")
}
