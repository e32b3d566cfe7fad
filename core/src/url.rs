use core::fmt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::ValidationError;

static URL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?([a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}(/.*)?$").expect("URL pattern must compile")
});

/// Trims, adds `https://` when no scheme is given and strips a single trailing slash.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    if url.ends_with('/') {
        url.pop();
    }
    url
}

/// Whether `raw` would be accepted by [`NormalizedUrl::parse`].
pub fn is_valid_url(raw: &str) -> bool {
    NormalizedUrl::parse(raw).is_ok()
}

/// A URL that went through [`normalize_url`] and matched the accepted `host.tld` shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::MissingUrl);
        }

        let url = normalize_url(raw);
        if URL_SHAPE.is_match(&url) {
            Ok(Self(url))
        } else {
            Err(ValidationError::InvalidUrl(raw.trim().to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name for the card, the URL without scheme or trailing slash.
    pub fn site_name(&self) -> &str {
        let url = self.0.as_str();
        let url = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url);
        url.strip_suffix('/').unwrap_or(url)
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NormalizedUrl {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NormalizedUrl> for String {
    fn from(value: NormalizedUrl) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_https_scheme_when_missing() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("  example.com \n"), "https://example.com");
    }

    #[test]
    fn strips_single_trailing_slash() {
        assert_eq!(normalize_url("http://example.com/"), "http://example.com");
        assert_eq!(normalize_url("https://example.com//"), "https://example.com/");
    }

    #[test]
    fn parse_accepts_hosts_and_paths() {
        let url = NormalizedUrl::parse("www.maximalstudio.in/").unwrap();
        assert_eq!(url.as_str(), "https://www.maximalstudio.in");
        assert_eq!(url.site_name(), "www.maximalstudio.in");

        let url = NormalizedUrl::parse("http://sub.example.co.uk/pricing?plan=pro").unwrap();
        assert_eq!(url.site_name(), "sub.example.co.uk/pricing?plan=pro");
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert_eq!(
            NormalizedUrl::parse("not a url"),
            Err(ValidationError::InvalidUrl("not a url".to_string()))
        );
        assert!(NormalizedUrl::parse("localhost").is_err());
        assert!(NormalizedUrl::parse("ftp://example.com").is_err());
        assert!(NormalizedUrl::parse("example.c0m").is_err());
        assert_eq!(NormalizedUrl::parse("   "), Err(ValidationError::MissingUrl));
    }

    #[test]
    fn validity_check_matches_parse() {
        assert!(is_valid_url("site.com"));
        assert!(is_valid_url("https://www.maximalstudio.in/"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("site"));
        assert!(!is_valid_url("not a url"));
    }

    #[test]
    fn deserialize_validates() {
        let url: NormalizedUrl = serde_json::from_str("\"https://example.com\"").unwrap();
        assert_eq!(url.as_str(), "https://example.com");

        assert!(serde_json::from_str::<NormalizedUrl>("\"nope\"").is_err());
    }
}
