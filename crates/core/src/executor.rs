//! Opens one summarizer unit per tab, highest index first, one at a time.

use std::sync::Arc;

use tabsum_runtime_config::FailurePolicy;
use tracing::{debug, warn};

use crate::ports::UnitOpener;
use crate::tab::{Tab, TabId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    Opened,
    Failed(String),
    /// Not attempted: the tab had no id.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOutcome {
    pub tab_id: Option<TabId>,
    pub index: Option<i64>,
    pub status: UnitStatus,
}

/// Per-tab outcomes in the order the units were attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub outcomes: Vec<UnitOutcome>,
    /// The failure policy stopped the run before every tab was attempted.
    pub aborted: bool,
}

impl ExecutionReport {
    pub fn opened_count(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Opened))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, UnitStatus::Failed(_)))
    }

    pub fn opened_ids(&self) -> Vec<TabId> {
        self.outcomes
            .iter()
            .filter(|o| o.status == UnitStatus::Opened)
            .filter_map(|o| o.tab_id)
            .collect()
    }

    pub fn first_failure(&self) -> Option<&str> {
        self.outcomes.iter().find_map(|o| match &o.status {
            UnitStatus::Failed(message) => Some(message.as_str()),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&UnitStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Highest index first so new units cluster after the right-most source tab.
/// Stable, so equal indices keep their input order.
pub fn open_order(mut tabs: Vec<Tab>) -> Vec<Tab> {
    tabs.sort_by_key(|tab| std::cmp::Reverse(tab.sort_index()));
    tabs
}

#[derive(Clone)]
pub struct BatchExecutor {
    opener: Arc<dyn UnitOpener>,
    policy: FailurePolicy,
}

impl BatchExecutor {
    pub fn new(opener: Arc<dyn UnitOpener>, policy: FailurePolicy) -> Self {
        Self { opener, policy }
    }

    pub async fn execute(&self, tabs: Vec<Tab>) -> ExecutionReport {
        let mut report = ExecutionReport::default();

        for tab in open_order(tabs) {
            if report.aborted {
                break;
            }
            let status = match tab.id {
                None => UnitStatus::Skipped,
                Some(id) => match self.opener.open_unit(&tab, tab.index).await {
                    Ok(()) => {
                        debug!("Opened summarizer for tab {id}");
                        UnitStatus::Opened
                    }
                    Err(e) => {
                        warn!(
                            "Failed to open summarizer for tab {id} (policy {}): {e:#}",
                            self.policy.display()
                        );
                        if self.policy == FailurePolicy::Abort {
                            report.aborted = true;
                        }
                        UnitStatus::Failed(format!("tab {id}: {e:#}"))
                    }
                },
            };
            report.outcomes.push(UnitOutcome {
                tab_id: tab.id,
                index: tab.index,
                status,
            });
        }

        report
    }
}
