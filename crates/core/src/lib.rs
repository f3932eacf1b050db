//! Control logic behind "open + summarize" for a batch of browser tabs.
//!
//! A trigger resolves its scope to candidate tabs, the [`gate`] drops tabs
//! that cannot be summarized and either opens the rest right away or stages
//! them as a single-use [`pending`] batch and asks the user. The user's answer
//! arrives as a [`protocol`] signal that runs or cancels the staged batch.

pub mod confirm;
pub mod error;
pub mod executor;
pub mod filter;
pub mod gate;
pub mod opener;
pub mod pending;
pub mod ports;
pub mod protocol;
pub mod resolver;
pub mod tab;
pub mod unit;

pub use error::{BatchError, Result};
pub use executor::{BatchExecutor, ExecutionReport, UnitOutcome, UnitStatus};
pub use filter::is_eligible;
pub use gate::{BatchDecision, BatchGate};
pub use opener::{BatchOpener, Ports, TriggerOutcome};
pub use pending::{PendingBatch, PendingBatchStore};
pub use protocol::{ConfirmationHandler, ConfirmationSignal, DecisionResponse};
pub use tab::{Scope, Tab, TabId, TabQuery, WindowId};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
