//! Decides whether a filtered batch opens immediately or waits for the user.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{BatchError, Result};
use crate::filter::eligible_tabs;
use crate::pending::{PendingBatch, PendingBatchStore};
use crate::ports::ConfirmationPresenter;
use crate::tab::{Scope, Tab};

/// Outcome of admitting a non-empty batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchDecision {
    /// Small enough to open right away.
    Proceed(Vec<Tab>),
    /// Stored under this token until the user confirms or cancels.
    Staged(String),
}

pub struct BatchGate {
    pending: PendingBatchStore,
    presenter: Arc<dyn ConfirmationPresenter>,
    threshold: usize,
}

impl BatchGate {
    pub fn new(
        pending: PendingBatchStore,
        presenter: Arc<dyn ConfirmationPresenter>,
        threshold: usize,
    ) -> Self {
        Self {
            pending,
            presenter,
            threshold,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Filter `raw_tabs` and decide. `None` when nothing is eligible.
    pub async fn admit(&self, raw_tabs: Vec<Tab>, scope: Scope) -> Result<Option<BatchDecision>> {
        let raw_count = raw_tabs.len();
        let tabs = eligible_tabs(raw_tabs);
        if tabs.is_empty() {
            debug!("No eligible tabs among {raw_count} candidate(s)");
            return Ok(None);
        }

        if tabs.len() <= self.threshold {
            debug!(
                "Proceeding with {} tab(s) (threshold {})",
                tabs.len(),
                self.threshold
            );
            return Ok(Some(BatchDecision::Proceed(tabs)));
        }

        let batch = PendingBatch::new(tabs, scope, Utc::now());
        self.pending.stage(&batch).await?;

        if let Err(e) = self
            .presenter
            .present(&batch.token, batch.len(), scope)
            .await
        {
            // Nothing will ever answer for this token.
            if let Err(discard_err) = self.pending.discard(&batch.token).await {
                warn!(
                    "Could not discard unconfirmable batch {}: {discard_err}",
                    batch.token
                );
            }
            return Err(BatchError::Confirmation(e));
        }

        Ok(Some(BatchDecision::Staged(batch.token)))
    }
}
