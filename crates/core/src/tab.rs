use serde::{Deserialize, Serialize};
use std::fmt;

pub type TabId = i64;
pub type WindowId = i64;

/// Browser tab metadata as reported by the host. Read-only to the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TabId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(default)]
    pub highlighted: bool,
}

impl Tab {
    /// The URL the tab shows or is navigating to. Empty strings count as absent.
    pub fn resolved_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| self.pending_url.as_deref().filter(|url| !url.is_empty()))
    }

    /// Position used for ordering; tabs without one sort as index 0.
    pub fn sort_index(&self) -> i64 {
        self.index.unwrap_or(0)
    }
}

/// Which tabs of the triggering window a batch covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    All,
    Selected,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Selected => "selected",
        }
    }

    /// Human-readable phrase for prompts.
    pub fn display(&self) -> &'static str {
        match self {
            Self::All => "all tabs",
            Self::Selected => "selected tabs",
        }
    }

    /// Query parameter value: exactly `selected` is `Selected`, anything
    /// else is `All`.
    pub fn from_param(value: &str) -> Self {
        if value == "selected" {
            Self::Selected
        } else {
            Self::All
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "selected" => Ok(Self::Selected),
            other => Err(format!("unknown scope: {other} (expected all|selected)")),
        }
    }
}

/// Enumeration request issued to the host's tab source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    pub window_id: WindowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<bool>,
}

impl TabQuery {
    pub fn for_scope(window_id: WindowId, scope: Scope) -> Self {
        Self {
            window_id,
            highlighted: match scope {
                Scope::All => None,
                Scope::Selected => Some(true),
            },
        }
    }

    pub fn matches(&self, tab: &Tab) -> bool {
        tab.window_id == Some(self.window_id)
            && self.highlighted.is_none_or(|wanted| tab.highlighted == wanted)
    }
}
