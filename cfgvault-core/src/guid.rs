//! GUID text form used in every table and in plugin database names.

use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

const GUID_PATTERN: &str =
    r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$";

fn guid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(GUID_PATTERN).expect("GUID pattern is valid"))
}

/// Upper-case, hyphenated, no braces.
pub fn guid_to_string(guid: &Uuid) -> String {
    format!("{:X}", guid.hyphenated())
}

/// Accepts any case, with or without braces.
pub fn parse_guid(text: &str) -> Option<Uuid> {
    let text = text.trim();
    let text = text
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(text);
    if !is_guid(text) {
        return None;
    }
    Uuid::parse_str(text).ok()
}

/// Exactly the 8-4-4-4-12 hex layout, any case.
pub fn is_guid(text: &str) -> bool {
    guid_regex().is_match(text)
}
