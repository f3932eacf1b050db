//! Shared batch-opener configuration types.
//!
//! The `tabsum` binary reads/writes `tabsum.toml` using these types. The core
//! crate consumes the settings structs directly; file location and loading
//! live in the binary.

use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "tabsum.toml";

/// Filtered-candidate count above which a batch needs confirmation.
pub const DEFAULT_CONFIRM_THRESHOLD: usize = 15;

pub const DEFAULT_SUMMARIZER_PAGE: &str = "src/pages/popup.html";
pub const DEFAULT_CONFIRM_PAGE: &str = "src/pages/batch_confirm.html";

/// Top-level configuration (persisted as `tabsum.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TabsumConfig {
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub summarizer: SummarizerSettings,
    #[serde(default)]
    pub confirm: ConfirmSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    #[serde(default = "default_confirm_threshold")]
    pub confirm_threshold: usize,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Age after which an unconfirmed staged batch is swept.
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_ttl_secs: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            confirm_threshold: DEFAULT_CONFIRM_THRESHOLD,
            failure_policy: FailurePolicy::Continue,
            pending_ttl_secs: default_pending_ttl_secs(),
        }
    }
}

/// What the executor does when a single summarizer unit fails to open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and keep opening the remaining tabs.
    #[default]
    #[serde(alias = "log_and_continue", alias = "skip")]
    Continue,
    /// Stop at the first failure.
    #[serde(alias = "stop")]
    Abort,
    /// Unknown/invalid values are normalized by compatibility fallbacks.
    #[serde(other)]
    Unknown,
}

impl FailurePolicy {
    pub fn display(&self) -> &'static str {
        match self {
            Self::Continue => "Continue",
            Self::Abort => "Abort",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerSettings {
    /// Extension-relative path of the summarizer page.
    #[serde(default = "default_summarizer_page")]
    pub page: String,
    /// Start summarizing as soon as the page opens.
    #[serde(default = "default_true")]
    pub auto_summarize: bool,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            page: default_summarizer_page(),
            auto_summarize: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmSettings {
    #[serde(default = "default_confirm_page")]
    pub page: String,
}

impl Default for ConfirmSettings {
    fn default() -> Self {
        Self {
            page: default_confirm_page(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_confirm_threshold() -> usize {
    DEFAULT_CONFIRM_THRESHOLD
}
fn default_pending_ttl_secs() -> u64 {
    86_400
}
fn default_summarizer_page() -> String {
    DEFAULT_SUMMARIZER_PAGE.to_string()
}
fn default_confirm_page() -> String {
    DEFAULT_CONFIRM_PAGE.to_string()
}

/// Apply compatibility fallbacks after loading raw TOML.
/// Returns true when any field was updated.
pub fn apply_compat_fallbacks(config: &mut TabsumConfig) -> bool {
    let mut changed = false;

    if config.batch.failure_policy == FailurePolicy::Unknown {
        config.batch.failure_policy = FailurePolicy::Continue;
        changed = true;
    }

    if config.summarizer.page.trim().is_empty() {
        config.summarizer.page = default_summarizer_page();
        changed = true;
    }

    if config.confirm.page.trim().is_empty() {
        config.confirm.page = default_confirm_page();
        changed = true;
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_defaults_are_stable() {
        let cfg = TabsumConfig::default();
        assert_eq!(cfg.batch.confirm_threshold, 15);
        assert_eq!(cfg.batch.failure_policy, FailurePolicy::Continue);
        assert_eq!(cfg.batch.pending_ttl_secs, 86_400);
        assert!(cfg.summarizer.auto_summarize);
        assert_eq!(cfg.summarizer.page, "src/pages/popup.html");
        assert_eq!(cfg.confirm.page, "src/pages/batch_confirm.html");
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_fields() {
        let cfg: TabsumConfig = toml::from_str(
            r#"
[batch]
confirm_threshold = 4
"#,
        )
        .expect("parse toml");

        assert_eq!(cfg.batch.confirm_threshold, 4);
        assert_eq!(cfg.batch.failure_policy, FailurePolicy::Continue);
        assert_eq!(cfg.summarizer.page, DEFAULT_SUMMARIZER_PAGE);
    }

    #[test]
    fn failure_policy_aliases_are_accepted() {
        let cfg: TabsumConfig = toml::from_str(
            r#"
[batch]
failure_policy = "stop"
"#,
        )
        .expect("parse toml");
        assert_eq!(cfg.batch.failure_policy, FailurePolicy::Abort);
        assert_eq!(cfg.batch.failure_policy.display(), "Abort");

        let cfg: TabsumConfig = toml::from_str(
            r#"
[batch]
failure_policy = "log_and_continue"
"#,
        )
        .expect("parse toml");
        assert_eq!(cfg.batch.failure_policy, FailurePolicy::Continue);
    }

    #[test]
    fn apply_compat_fallbacks_normalizes_unknown_values() {
        let mut cfg: TabsumConfig = toml::from_str(
            r#"
[batch]
failure_policy = "retry-forever"

[summarizer]
page = "  "
"#,
        )
        .expect("parse toml");
        assert_eq!(cfg.batch.failure_policy, FailurePolicy::Unknown);

        let changed = apply_compat_fallbacks(&mut cfg);
        assert!(changed);
        assert_eq!(cfg.batch.failure_policy, FailurePolicy::Continue);
        assert_eq!(cfg.summarizer.page, DEFAULT_SUMMARIZER_PAGE);
    }

    #[test]
    fn apply_compat_fallbacks_is_noop_for_modern_values() {
        let mut cfg = TabsumConfig::default();
        cfg.batch.failure_policy = FailurePolicy::Abort;
        let changed = apply_compat_fallbacks(&mut cfg);
        assert!(!changed);
        assert_eq!(cfg.batch.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let encoded = toml::to_string(&TabsumConfig::default()).expect("serialize config");
        assert!(encoded.contains("confirm_threshold = 15"));
        assert!(encoded.contains("failure_policy = \"continue\""));
        let decoded: TabsumConfig = toml::from_str(&encoded).expect("parse config");
        assert_eq!(decoded.batch.pending_ttl_secs, 86_400);
    }
}
