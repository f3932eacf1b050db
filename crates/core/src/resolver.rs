use tracing::debug;

use crate::error::{BatchError, Result};
use crate::ports::TabSource;
use crate::tab::{Scope, Tab, TabQuery};

/// Raw candidate tabs for `scope` in the trigger tab's window. Unfiltered.
pub async fn resolve_scope(source: &dyn TabSource, trigger: &Tab, scope: Scope) -> Result<Vec<Tab>> {
    let Some(window_id) = trigger.window_id else {
        debug!("Trigger tab has no window, nothing to resolve");
        return Ok(Vec::new());
    };

    let query = TabQuery::for_scope(window_id, scope);
    let tabs = source.query(query).await.map_err(BatchError::TabSource)?;
    debug!("Resolved {} candidate tab(s) for scope {scope}", tabs.len());
    Ok(tabs)
}
