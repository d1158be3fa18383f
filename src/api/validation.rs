//! Small validation helpers for incoming DTOs.

use regex::Regex;

lazy_static::lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
}

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_COMMENT_LEN: usize = 5_000;
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Treats absent and empty strings the same way.
pub fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Like [`required`] but whitespace-only strings are also missing.
pub fn required_trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn ensure_max_len(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("reader@example.com"));
        assert!(!is_valid_email("reader@"));
        assert!(!is_valid_email("no spaces@example.com"));
    }

    #[test]
    fn required_treats_empty_as_missing() {
        assert_eq!(required(&Some("x".into())), Some("x"));
        assert_eq!(required(&Some(String::new())), None);
        assert_eq!(required(&None), None);
        assert_eq!(required(&Some("  ".into())), Some("  "));
        assert_eq!(required_trimmed(&Some("  ".into())), None);
        assert_eq!(required_trimmed(&Some(" hi ".into())), Some("hi"));
    }

    #[test]
    fn normalizes_email() {
        assert_eq!(normalize_email("  Reader@Example.COM "), "reader@example.com");
    }

    #[test]
    fn max_len_counts_chars() {
        assert!(ensure_max_len("ééé", 3));
        assert!(!ensure_max_len("abcd", 3));
    }
}
