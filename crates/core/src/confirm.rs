//! Confirmation page: address, prompt text and user choice.

use crate::protocol::ConfirmationSignal;
use crate::tab::Scope;

/// Address of the confirmation page for a staged batch.
pub fn confirmation_url(page: &str, token: &str, count: usize, scope: Scope) -> String {
    format!(
        "{page}?token={}&count={count}&scope={}",
        urlencoding::encode(token),
        scope.as_str()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Continue,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub token: String,
    pub count: i64,
    pub scope: Scope,
}

impl ConfirmationPrompt {
    /// Parse the page's query string. Accepts a full address, `?a=b` or `a=b`.
    /// The first occurrence of a key wins. Missing token is empty, a count
    /// without leading digits is 0, any scope but `selected` is `All`.
    pub fn from_query(query: &str) -> Self {
        let query = query.split_once('?').map_or(query, |(_, q)| q);
        let query = query.split_once('#').map_or(query, |(q, _)| q);

        let mut token = None;
        let mut count = None;
        let mut scope = None;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                "token" => &mut token,
                "count" => &mut count,
                "scope" => &mut scope,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        Self {
            token: token.unwrap_or_default(),
            count: count.as_deref().map(parse_count).unwrap_or(0),
            scope: scope.as_deref().map(Scope::from_param).unwrap_or_default(),
        }
    }

    pub fn message(&self) -> String {
        format!(
            "You are about to open {} Open+Summarize tabs for {}. Continue?",
            self.count,
            self.scope.display()
        )
    }

    /// Signal to send for the user's choice. `None` when the page has no
    /// token: the page just closes.
    pub fn signal_for(&self, choice: ConfirmChoice) -> Option<ConfirmationSignal> {
        if self.token.is_empty() {
            return None;
        }
        let token = self.token.clone();
        Some(match choice {
            ConfirmChoice::Continue => ConfirmationSignal::Run(token),
            ConfirmChoice::Cancel => ConfirmationSignal::Cancel(token),
        })
    }
}

/// Leading optionally signed integer, saturating at the `i64` bounds.
fn parse_count(raw: &str) -> i64 {
    let raw = raw.trim_start();
    let digits_from = usize::from(raw.starts_with(['+', '-']));
    let end = raw[digits_from..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(raw.len(), |i| i + digits_from);
    if end == digits_from {
        return 0;
    }
    raw[..end].parse().unwrap_or(if raw.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    })
}
