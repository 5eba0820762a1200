//! Issue reference extraction from free-text card titles.
use once_cell::sync::Lazy;
use regex::Regex;

/// Finds an issue identifier embedded in free text.
pub trait IssueIdExtractor: Send + Sync {
    /// Returns the first issue id referenced in `text`, if any.
    fn extract(&self, text: &str) -> Option<String>;
}

// `\b` after the number keeps `MAT-123whatever` from matching as `MAT-123`.
static ISSUE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://\S+?/issue/([A-Za-z0-9]+-[0-9]+)\b").expect("valid issue url pattern")
});

/// Matches tracker issue URLs of the form `http(s)://host/.../issue/KEY-123`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueUrlExtractor;

impl IssueIdExtractor for IssueUrlExtractor {
    fn extract(&self, text: &str) -> Option<String> {
        ISSUE_URL
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}
