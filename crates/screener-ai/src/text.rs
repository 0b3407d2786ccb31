//! Prompt and reply text helpers.

use regex::Regex;
use std::sync::OnceLock;

const FENCE_PATTERN: &str = r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n?(.*?)\n?\s*```\s*$";

fn fence_pattern() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(FENCE_PATTERN).ok()).as_ref()
}

/// Strip a Markdown code fence (```` ```json ... ``` ````) wrapping a reply.
///
/// Text without a surrounding fence is returned trimmed.
pub fn clean_markdown_json(text: &str) -> String {
    match fence_pattern().and_then(|re| re.captures(text)) {
        Some(caps) => caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        None => text.trim().to_string(),
    }
}

/// Truncate `text` to at most `max_tokens` whitespace-separated words.
///
/// Words are a rough stand-in for model tokens; runs of whitespace collapse
/// to a single space in the output.
pub fn limit_tokens(text: &str, max_tokens: usize) -> String {
    text.split_whitespace()
        .take(max_tokens)
        .collect::<Vec<_>>()
        .join(" ")
}
