//! Decision signals sent back by the confirmation surface.
//!
//! Every signal gets exactly one [`DecisionResponse`]; failures become
//! `{ ok: false, error }` instead of propagating. Messages with an action
//! outside this protocol get no response at all. A run claims its record
//! from the store, so a token runs at most once even when several handlers
//! share one store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::{BatchError, Result};
use crate::executor::{BatchExecutor, ExecutionReport};
use crate::filter::eligible_tabs;
use crate::pending::PendingBatchStore;
use crate::ports::TabSource;
use crate::tab::Tab;

pub const RUN_ACTION: &str = "RUN_OPEN_SUMMARIZE_BATCH";
pub const CANCEL_ACTION: &str = "CANCEL_OPEN_SUMMARIZE_BATCH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationSignal {
    Run(String),
    Cancel(String),
}

impl ConfirmationSignal {
    pub fn token(&self) -> &str {
        match self {
            Self::Run(token) | Self::Cancel(token) => token,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::Run(_) => RUN_ACTION,
            Self::Cancel(_) => CANCEL_ACTION,
        }
    }

    pub fn to_message(&self) -> Value {
        json!({ "action": self.action(), "token": self.token() })
    }

    /// `None` for anything that is not one of our two actions.
    pub fn from_message(message: &Value) -> Option<Self> {
        let action = message.get("action")?.as_str()?;
        let token = message
            .get("token")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match action {
            RUN_ACTION => Some(Self::Run(token)),
            CANCEL_ACTION => Some(Self::Cancel(token)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DecisionResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

pub struct ConfirmationHandler {
    pending: PendingBatchStore,
    tabs: Arc<dyn TabSource>,
    executor: BatchExecutor,
}

impl ConfirmationHandler {
    pub fn new(pending: PendingBatchStore, tabs: Arc<dyn TabSource>, executor: BatchExecutor) -> Self {
        Self {
            pending,
            tabs,
            executor,
        }
    }

    /// Raw transport entry point. `None` means "not ours, do not answer".
    pub async fn handle_message(&self, message: &Value) -> Option<DecisionResponse> {
        let signal = ConfirmationSignal::from_message(message)?;
        Some(self.handle(signal).await)
    }

    pub async fn handle(&self, signal: ConfirmationSignal) -> DecisionResponse {
        match signal {
            ConfirmationSignal::Run(token) => self.handle_run(&token).await,
            ConfirmationSignal::Cancel(token) => self.handle_cancel(&token).await,
        }
    }

    async fn handle_cancel(&self, token: &str) -> DecisionResponse {
        match self.pending.discard(token).await {
            Ok(()) => info!("Cancelled pending batch {token}"),
            Err(e) => warn!("Failed to discard cancelled batch {token}: {e}"),
        }
        DecisionResponse::ok()
    }

    async fn handle_run(&self, token: &str) -> DecisionResponse {
        match self.run(token).await {
            Ok(report) => {
                info!(
                    "Ran pending batch {token}: {} opened, {} failed",
                    report.opened_count(),
                    report.failed_count()
                );
                DecisionResponse::ok()
            }
            Err(e) => {
                warn!("Pending batch {token} did not run cleanly: {e}");
                DecisionResponse::failed(e.to_string())
            }
        }
    }

    async fn run(&self, token: &str) -> Result<ExecutionReport> {
        let batch = match self.pending.claim(token).await {
            Ok(Some(batch)) => batch,
            Ok(None) => return Err(BatchError::NotFound(token.to_string())),
            Err(e @ BatchError::Record(_)) => {
                // An undecodable record can never run.
                self.discard_quietly(token).await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let staged = batch.tabs.len();
        let tabs = eligible_tabs(self.refresh(batch.tabs).await);
        debug!(
            "Pending batch {token}: {} of {staged} tab(s) still eligible",
            tabs.len()
        );

        let report = self.executor.execute(tabs).await;
        self.pending.discard(token).await?;

        if report.aborted {
            return Err(BatchError::Aborted {
                failed: report.failed_count(),
                message: report.first_failure().unwrap_or_default().to_string(),
            });
        }
        Ok(report)
    }

    /// Current state of each staged tab. Closed tabs drop out; a failed
    /// lookup keeps the staged snapshot.
    async fn refresh(&self, staged: Vec<Tab>) -> Vec<Tab> {
        let mut current = Vec::with_capacity(staged.len());
        for tab in staged {
            let Some(id) = tab.id else {
                current.push(tab);
                continue;
            };
            match self.tabs.get(id).await {
                Ok(Some(fresh)) => current.push(fresh),
                Ok(None) => debug!("Tab {id} closed since staging"),
                Err(e) => {
                    warn!("Could not refresh tab {id}, using staged state: {e:#}");
                    current.push(tab);
                }
            }
        }
        current
    }

    async fn discard_quietly(&self, token: &str) {
        if let Err(e) = self.pending.discard(token).await {
            warn!("Failed to discard pending batch {token}: {e}");
        }
    }
}
