//! Summarization eligibility.
//!
//! Browser-internal, extension, developer-tools and source-view pages cannot
//! be scripted by the summarizer, so they never enter a batch.

use crate::tab::Tab;

/// URL prefixes that are never summarizable. Matched ASCII case-insensitively.
pub const DISALLOWED_URL_PREFIXES: &[&str] = &[
    "chrome://",
    "chrome-extension://",
    "chrome-untrusted://",
    "chrome-search://",
    "chrome-devtools://",
    "devtools://",
    "view-source:",
    "about:",
    "edge://",
    "extension://",
    "brave://",
    "opera://",
    "vivaldi://",
    "moz-extension://",
];

pub fn is_eligible(tab: &Tab) -> bool {
    if tab.id.is_none() {
        return false;
    }
    match tab.resolved_url() {
        Some(url) => !has_disallowed_prefix(url),
        None => false,
    }
}

/// Keep eligible tabs, preserving order.
pub fn eligible_tabs(tabs: impl IntoIterator<Item = Tab>) -> Vec<Tab> {
    tabs.into_iter().filter(is_eligible).collect()
}

fn has_disallowed_prefix(url: &str) -> bool {
    let url = url.trim_start();
    DISALLOWED_URL_PREFIXES.iter().any(|prefix| {
        url.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::tab;

    #[test]
    fn tab_without_id_is_ineligible() {
        let mut t = tab(1, 0, "https://example.com");
        t.id = None;
        assert!(!is_eligible(&t));
    }

    #[test]
    fn https_pages_are_eligible() {
        assert!(is_eligible(&tab(1, 0, "https://example.com/article?id=3")));
        assert!(is_eligible(&tab(2, 0, "http://localhost:8080/")));
    }

    #[test]
    fn every_disallowed_prefix_is_rejected() {
        for prefix in DISALLOWED_URL_PREFIXES {
            let url = format!("{prefix}settings");
            assert!(!is_eligible(&tab(1, 0, &url)), "{url} should be ineligible");
        }
    }

    #[test]
    fn prefix_match_ignores_ascii_case() {
        assert!(!is_eligible(&tab(1, 0, "CHROME://extensions")));
        assert!(!is_eligible(&tab(1, 0, "About:blank")));
    }

    #[test]
    fn scheme_lookalikes_stay_eligible() {
        assert!(is_eligible(&tab(1, 0, "https://chrome.google.com/webstore")));
        assert!(is_eligible(&tab(1, 0, "https://example.com/about:me")));
    }

    #[test]
    fn pending_url_is_used_when_url_missing() {
        let mut loading = tab(1, 0, "");
        loading.url = None;
        loading.pending_url = Some("https://example.com".into());
        assert!(is_eligible(&loading));

        loading.pending_url = Some("chrome://newtab/".into());
        assert!(!is_eligible(&loading));
    }

    #[test]
    fn tab_without_any_url_is_ineligible() {
        let mut blank = tab(1, 0, "");
        blank.url = None;
        assert!(!is_eligible(&blank));
        assert!(!is_eligible(&tab(1, 0, "")));
    }

    #[test]
    fn eligible_tabs_preserves_order() {
        let kept = eligible_tabs(vec![
            tab(1, 0, "https://a.example"),
            tab(2, 1, "chrome://settings"),
            tab(3, 2, "https://c.example"),
        ]);
        let ids: Vec<_> = kept.iter().filter_map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
