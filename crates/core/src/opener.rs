use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tabsum_runtime_config::BatchSettings;
use tracing::info;

use crate::error::Result;
use crate::executor::{BatchExecutor, ExecutionReport};
use crate::gate::{BatchDecision, BatchGate};
use crate::pending::{PendingBatchStore, ttl_from_secs};
use crate::ports::{ConfirmationPresenter, RecordStore, TabSource, UnitOpener};
use crate::protocol::ConfirmationHandler;
use crate::resolver::resolve_scope;
use crate::tab::{Scope, Tab};

/// Host collaborators for one [`BatchOpener`].
#[derive(Clone)]
pub struct Ports {
    pub tabs: Arc<dyn TabSource>,
    pub opener: Arc<dyn UnitOpener>,
    pub store: Arc<dyn RecordStore>,
    pub presenter: Arc<dyn ConfirmationPresenter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Nothing eligible in scope.
    NoOp,
    /// Below the threshold: units were opened right away.
    Opened(ExecutionReport),
    /// Staged under this token; the confirmation surface has been asked.
    AwaitingConfirmation(String),
}

/// Entry point for "open + summarize" triggers and their confirmations.
pub struct BatchOpener {
    tabs: Arc<dyn TabSource>,
    pending: PendingBatchStore,
    gate: BatchGate,
    executor: BatchExecutor,
    handler: ConfirmationHandler,
    pending_ttl: Duration,
}

impl BatchOpener {
    pub fn new(ports: Ports, settings: &BatchSettings) -> Self {
        let pending = PendingBatchStore::new(ports.store);
        let executor = BatchExecutor::new(ports.opener, settings.failure_policy);
        Self {
            gate: BatchGate::new(pending.clone(), ports.presenter, settings.confirm_threshold),
            handler: ConfirmationHandler::new(pending.clone(), ports.tabs.clone(), executor.clone()),
            tabs: ports.tabs,
            pending,
            executor,
            pending_ttl: ttl_from_secs(settings.pending_ttl_secs),
        }
    }

    pub async fn trigger(&self, trigger: &Tab, scope: Scope) -> Result<TriggerOutcome> {
        let candidates = resolve_scope(self.tabs.as_ref(), trigger, scope).await?;
        match self.gate.admit(candidates, scope).await? {
            None => Ok(TriggerOutcome::NoOp),
            Some(BatchDecision::Proceed(tabs)) => {
                let report = self.executor.execute(tabs).await;
                info!(
                    "Opened {} summarizer(s) for scope {scope} ({} failed)",
                    report.opened_count(),
                    report.failed_count()
                );
                Ok(TriggerOutcome::Opened(report))
            }
            Some(BatchDecision::Staged(token)) => {
                info!(
                    "More than {} tab(s) in scope {scope}, batch {token} awaits confirmation",
                    self.gate.threshold()
                );
                Ok(TriggerOutcome::AwaitingConfirmation(token))
            }
        }
    }

    pub fn handler(&self) -> &ConfirmationHandler {
        &self.handler
    }

    pub fn pending(&self) -> &PendingBatchStore {
        &self.pending
    }

    /// Discard staged batches older than the configured TTL.
    pub async fn sweep_abandoned(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        self.pending.sweep_expired(now, self.pending_ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        MemoryRecordStore, RecordingOpener, RecordingPresenter, StaticTabSource, eligible_window,
        tab,
    };

    struct Fixture {
        records: Arc<MemoryRecordStore>,
        opener: Arc<RecordingOpener>,
        presenter: Arc<RecordingPresenter>,
        batch: BatchOpener,
    }

    fn fixture(tabs: Vec<Tab>, settings: BatchSettings) -> Fixture {
        let records = Arc::new(MemoryRecordStore::new());
        let opener = Arc::new(RecordingOpener::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let ports = Ports {
            tabs: Arc::new(StaticTabSource::new(tabs)),
            opener: opener.clone(),
            store: records.clone(),
            presenter: presenter.clone(),
        };
        Fixture {
            records,
            opener,
            presenter,
            batch: BatchOpener::new(ports, &settings),
        }
    }

    #[tokio::test]
    async fn small_window_opens_immediately() {
        let f = fixture(eligible_window(4), BatchSettings::default());
        let outcome = f
            .batch
            .trigger(&tab(0, 0, "https://example.com"), Scope::All)
            .await
            .expect("trigger");
        let TriggerOutcome::Opened(report) = outcome else {
            panic!("expected opened, got {outcome:?}");
        };
        assert_eq!(report.opened_ids(), vec![3, 2, 1, 0]);
        assert_eq!(f.opener.opened_ids(), vec![3, 2, 1, 0]);
        assert_eq!(f.records.writes(), 0);
    }

    #[tokio::test]
    async fn configured_threshold_is_honored() {
        let settings = BatchSettings {
            confirm_threshold: 2,
            ..BatchSettings::default()
        };
        let f = fixture(eligible_window(3), settings);
        let outcome = f
            .batch
            .trigger(&tab(0, 0, "https://example.com"), Scope::All)
            .await
            .expect("trigger");
        assert!(matches!(outcome, TriggerOutcome::AwaitingConfirmation(_)));
        assert_eq!(f.presenter.requests().len(), 1);
        assert!(f.opener.opened().is_empty());
    }

    #[tokio::test]
    async fn window_of_internal_pages_is_a_noop() {
        let f = fixture(
            vec![tab(1, 0, "chrome://newtab/"), tab(2, 1, "devtools://devtools")],
            BatchSettings::default(),
        );
        let outcome = f
            .batch
            .trigger(&tab(1, 0, "chrome://newtab/"), Scope::All)
            .await
            .expect("trigger");
        assert_eq!(outcome, TriggerOutcome::NoOp);
        assert!(f.presenter.requests().is_empty());
    }

    #[tokio::test]
    async fn sweep_uses_configured_ttl() {
        let settings = BatchSettings {
            pending_ttl_secs: 60,
            ..BatchSettings::default()
        };
        let f = fixture(eligible_window(20), settings);
        let outcome = f
            .batch
            .trigger(&tab(0, 0, "https://example.com"), Scope::All)
            .await
            .expect("trigger");
        let TriggerOutcome::AwaitingConfirmation(token) = outcome else {
            panic!("expected staged, got {outcome:?}");
        };

        let early = f.batch.sweep_abandoned(Utc::now()).await.expect("sweep");
        assert!(early.is_empty());
        let later = f
            .batch
            .sweep_abandoned(Utc::now() + Duration::seconds(61))
            .await
            .expect("sweep");
        assert_eq!(later, vec![token]);
        assert!(f.records.snapshot().is_empty());
    }
}
