//! Input validation helpers shared by the services.

use std::borrow::Cow;

use validator::ValidationError;

/// Longest URL stored in any URL column.
pub const MAX_URL_LENGTH: usize = 512;

/// Whether `value` parses as an absolute `http` or `https` URL.
#[must_use]
pub fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

/// `validator` hook for fields that must be http(s) URLs.
pub fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    if is_http_url(value) {
        Ok(())
    } else {
        Err(ValidationError::new("http_url").with_message(Cow::Borrowed("must be an http(s) URL")))
    }
}

/// Trim a required text field in place.
pub fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Trim an optional text field, mapping blank input to `None`.
#[must_use]
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Clamp a requested page size into `1..=max`, falling back to `default`.
#[must_use]
pub fn clamp_limit(limit: Option<u64>, default: u64, max: u64) -> u64 {
    limit.unwrap_or(default).clamp(1, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://example.com/video"));
        assert!(is_http_url("http://localhost:3000"));
        assert!(!is_http_url("ftp://example.com/file"));
        assert!(!is_http_url("javascript:alert(1)"));
        assert!(!is_http_url("not a url"));
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  hi ".to_string())), Some("hi".to_string()));
        assert_eq!(normalize_optional(Some("   ".to_string())), None);
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn test_trim_in_place() {
        let mut s = "  title ".to_string();
        trim_in_place(&mut s);
        assert_eq!(s, "title");
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 20, 100), 20);
        assert_eq!(clamp_limit(Some(0), 20, 100), 1);
        assert_eq!(clamp_limit(Some(500), 20, 100), 100);
    }
}
