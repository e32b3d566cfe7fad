use anyhow::{Context as _, anyhow};
use powercard_core::NormalizedUrl;
use powercard_protocol::encode_data_uri;
use worker::Url;

use crate::config::WorkerConfig;
use crate::upstream;

const DEFAULT_MIME: &str = "image/jpeg";

/// Query sent to the screenshot API on top of the key and target URL.
const SCREENSHOT_OPTIONS: [(&str, &str); 9] = [
    ("format", "jpg"),
    ("block_ads", "true"),
    ("block_cookie_banners", "true"),
    ("block_banners_by_heuristics", "false"),
    ("block_trackers", "true"),
    ("delay", "0"),
    ("timeout", "60"),
    ("response_type", "by_format"),
    ("image_quality", "80"),
];

pub fn screenshot_url(api_url: &str, access_key: &str, target: &NormalizedUrl) -> anyhow::Result<Url> {
    let params = [("access_key", access_key), ("url", target.as_str())]
        .into_iter()
        .chain(SCREENSHOT_OPTIONS);
    Url::parse_with_params(api_url, params).with_context(|| format!("invalid screenshot API URL {api_url:?}"))
}

/// Mime type from a `content-type` header value, ignoring parameters.
pub fn mime_of(content_type: Option<&str>) -> &str {
    content_type
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .filter(|mime| mime.starts_with("image/"))
        .unwrap_or(DEFAULT_MIME)
}

/// Captures `target` and returns it as a data URI.
pub async fn take_screenshot(config: &WorkerConfig, target: &NormalizedUrl) -> anyhow::Result<String> {
    let access_key = config.screenshot_access_key()?;
    let url = screenshot_url(&config.screenshot_api_url, access_key, target)?;

    let mut response = upstream::send(upstream::get(url.as_str())?, config.fetch_timeout)
        .await
        .context("screenshot API request failed")?;
    let content_type = response
        .headers()
        .get("content-type")
        .map_err(|err| anyhow!("{err}"))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|err| anyhow!("{err}"))
        .context("reading screenshot body")?;
    log::debug!("captured {} ({} bytes)", target, bytes.len());

    Ok(encode_data_uri(mime_of(content_type.as_deref()), &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_carries_key_target_and_options() {
        let target = NormalizedUrl::parse("example.com/pricing").unwrap();
        let url = screenshot_url(WorkerConfig::DEFAULT_SCREENSHOT_API_URL, "k3y", &target).unwrap();

        assert_eq!(url.host_str(), Some("api.screenshotone.com"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("access_key".to_string(), "k3y".to_string()));
        assert_eq!(pairs[1], ("url".to_string(), "https://example.com/pricing".to_string()));
        for (name, value) in SCREENSHOT_OPTIONS {
            assert!(pairs.contains(&(name.to_string(), value.to_string())), "missing {name}");
        }
    }

    #[test]
    fn bad_api_url_is_an_error() {
        let target = NormalizedUrl::parse("example.com").unwrap();
        assert!(screenshot_url("not a url", "k", &target).is_err());
    }

    #[test]
    fn mime_comes_from_content_type() {
        assert_eq!(mime_of(Some("image/png")), "image/png");
        assert_eq!(mime_of(Some("image/webp; charset=binary")), "image/webp");
        assert_eq!(mime_of(Some("text/html")), DEFAULT_MIME);
        assert_eq!(mime_of(None), DEFAULT_MIME);
    }
}
