//! Addressing for summarizer units.

use serde::{Deserialize, Serialize};
use tabsum_runtime_config::SummarizerSettings;

use crate::tab::{Tab, TabId};

/// Summarizer page address for one tab.
pub fn popup_url_for_tab(page: &str, tab_id: TabId, auto_summarize: bool) -> String {
    let mut url = format!("{page}?tabId={tab_id}");
    if auto_summarize {
        url.push_str("&autoSummarize=1");
    }
    url
}

/// Everything a host needs to create one summarizer tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRequest {
    pub tab_id: TabId,
    pub url: String,
    /// Insert position: right after the source tab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
}

impl UnitRequest {
    /// `None` for tabs without an id.
    pub fn for_tab(tab: &Tab, ordering_hint: Option<i64>, settings: &SummarizerSettings) -> Option<Self> {
        let tab_id = tab.id?;
        Some(Self {
            tab_id,
            url: popup_url_for_tab(&settings.page, tab_id, settings.auto_summarize),
            index: ordering_hint.map(|index| index + 1),
        })
    }
}
