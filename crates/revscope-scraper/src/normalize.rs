//! Review text normalization.
//!
//! Scraped review bodies carry emoji, decorative symbols, doubled whitespace
//! and "show more" markers. [`normalize`] reduces them to plain text under a
//! [`CleanPolicy`]; it never fails and is idempotent.

use revscope_core::{CleanPolicy, DEFAULT_BOILERPLATE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub policy: CleanPolicy,
    /// Substrings removed verbatim. Empty markers are ignored.
    pub boilerplate: Vec<String>,
}

impl NormalizeOptions {
    #[must_use]
    pub fn new(policy: CleanPolicy) -> Self {
        Self {
            policy,
            boilerplate: DEFAULT_BOILERPLATE.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn with_boilerplate(mut self, markers: Vec<String>) -> Self {
        self.boilerplate = markers;
        self
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::new(CleanPolicy::AlphanumericOnly)
    }
}

/// Normalizes review text.
///
/// `None` yields an empty string. Otherwise boilerplate markers are removed,
/// characters outside the policy's allow-list become spaces, whitespace runs
/// collapse to one space and the result is trimmed. Marker removal and
/// whitespace collapsing repeat until neither changes the text, so a second
/// pass over the output is a no-op.
#[must_use]
pub fn normalize(text: Option<&str>, options: &NormalizeOptions) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let stripped = strip_boilerplate(text, &options.boilerplate);
    let filtered: String = stripped
        .chars()
        .map(|c| if is_allowed(options.policy, c) { c } else { ' ' })
        .collect();

    settle(filtered, &options.boilerplate)
}

fn is_allowed(policy: CleanPolicy, c: char) -> bool {
    match policy {
        CleanPolicy::AlphanumericOnly => {
            c.is_whitespace() || c.is_ascii_alphanumeric() || is_hangul_syllable(c)
        }
        CleanPolicy::KeepPunctuation => {
            c.is_whitespace() || c.is_alphanumeric() || c.is_ascii_punctuation()
        }
        CleanPolicy::PreserveAll => true,
    }
}

fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// Repeats marker removal and whitespace collapsing until a fixed point.
///
/// Terminates because markers are non-empty: every round that changes the
/// text makes it strictly shorter.
fn settle(mut text: String, markers: &[String]) -> String {
    loop {
        let next = collapse_whitespace(&strip_boilerplate(&text, markers));
        if next == text {
            return next;
        }
        text = next;
    }
}

fn strip_boilerplate(text: &str, markers: &[String]) -> String {
    let mut out = text.to_string();
    for marker in markers.iter().filter(|m| !m.is_empty()) {
        if out.contains(marker.as_str()) {
            out = out.replace(marker.as_str(), "");
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
