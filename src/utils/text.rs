//! Text cleanup for XMLTV output

use regex::Regex;
use std::sync::OnceLock;

/// Control characters that are not allowed in XML 1.0 text
fn control_chars() -> &'static Regex {
    static CONTROL_CHARS: OnceLock<Regex> = OnceLock::new();
    CONTROL_CHARS.get_or_init(|| {
        Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F]").expect("control character pattern is valid")
    })
}

/// Strip disallowed control characters from text content
pub fn clean_text(text: &str) -> String {
    control_chars().replace_all(text, "").into_owned()
}

/// Trim surrounding whitespace and strip control characters
pub fn clean_trimmed(text: &str) -> String {
    clean_text(text.trim())
}
