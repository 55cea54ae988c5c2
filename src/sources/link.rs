// ABOUTME: Video link parsing, platform detection, and URL normalization
// ABOUTME: Canonicalizes YouTube, TikTok, and Instagram links and expands TikTok short links
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use crate::logging::AppLogger;
use crate::utils::http_client::redirect_client;
use clipchef_core::constants::limits::MAX_URL_LENGTH;
use clipchef_core::errors::AppError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use thiserror::Error;
use tracing::{instrument, warn};
use url::Url;

/// Query parameters that only carry share/tracking state
const TRACKING_PARAMS: &[&str] = &["si", "feature", "igsh", "igshid"];

/// Hosts that only redirect to a canonical `TikTok` URL
const SHORT_LINK_HOSTS: &[&str] = &["vm.tiktok.com", "vt.tiktok.com"];

/// Maximum redirect hops followed when expanding a short link
const MAX_REDIRECTS: usize = 10;

/// Reasons a submitted link is rejected
#[derive(Debug, Error)]
pub enum LinkError {
    /// Blank input
    #[error("URL must not be empty")]
    Empty,
    /// Longer than the accepted maximum
    #[error("URL exceeds {MAX_URL_LENGTH} characters")]
    TooLong,
    /// Not parseable as a URL
    #[error("Invalid URL '{input}': {source}")]
    Malformed {
        /// Trimmed input
        input: String,
        /// Parser failure
        #[source]
        source: url::ParseError,
    },
    /// Scheme other than http or https
    #[error("Unsupported URL scheme '{0}': only http and https links are accepted")]
    UnsupportedScheme(String),
    /// No host component
    #[error("URL '{0}' has no host")]
    MissingHost(String),
}

impl From<LinkError> for AppError {
    fn from(error: LinkError) -> Self {
        Self::invalid_input(error.to_string()).with_source(error)
    }
}

/// Video platform a link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// youtube.com, youtu.be, `YouTube` Shorts
    YouTube,
    /// tiktok.com and its short-link hosts
    TikTok,
    /// instagram.com reels and posts
    Instagram,
    /// Anything else reachable over http(s)
    Other,
}

impl Platform {
    /// Lowercase platform name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::TikTok => "tiktok",
            Self::Instagram => "instagram",
            Self::Other => "other",
        }
    }

    fn from_host(host: &str) -> Self {
        if host_matches(host, "youtube.com")
            || host_matches(host, "youtu.be")
            || host_matches(host, "youtube-nocookie.com")
        {
            Self::YouTube
        } else if host_matches(host, "tiktok.com") {
            Self::TikTok
        } else if host_matches(host, "instagram.com") || host_matches(host, "instagr.am") {
            Self::Instagram
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// A parsed and normalized video link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoLink {
    /// Link exactly as submitted (trimmed)
    pub original: String,
    /// Canonical form used for lookups and deduplication
    pub normalized: String,
    /// Detected platform
    pub platform: Platform,
    /// Platform video id, when the URL shape exposes one
    pub video_id: Option<String>,
}

impl VideoLink {
    /// Parse and normalize a user-supplied link
    ///
    /// A missing scheme is treated as `https://`.
    ///
    /// # Errors
    ///
    /// Returns a [`LinkError`] for empty, overlong, non-http(s), or hostless
    /// URLs. It converts into an `InvalidInput` [`AppError`].
    pub fn parse(raw: &str) -> Result<Self, LinkError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LinkError::Empty);
        }
        if trimmed.len() > MAX_URL_LENGTH {
            return Err(LinkError::TooLong);
        }

        let with_scheme = if has_scheme(trimmed) {
            trimmed.to_owned()
        } else {
            format!("https://{trimmed}")
        };

        let url = Url::parse(&with_scheme).map_err(|source| LinkError::Malformed {
            input: trimmed.to_owned(),
            source,
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(LinkError::UnsupportedScheme(url.scheme().to_owned()));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .map(str::to_lowercase)
            .ok_or_else(|| LinkError::MissingHost(trimmed.to_owned()))?;

        let platform = Platform::from_host(&host);
        let (normalized, video_id) = match platform {
            Platform::YouTube => normalize_youtube(&url, &host),
            Platform::TikTok => normalize_tiktok(&url, &host),
            Platform::Instagram => normalize_instagram(&url),
            Platform::Other => (strip_tracking(&url), None),
        };

        Ok(Self {
            original: trimmed.to_owned(),
            normalized,
            platform,
            video_id,
        })
    }

    /// True for share links that must be expanded before lookups
    #[must_use]
    pub fn is_short_link(&self) -> bool {
        Url::parse(&self.normalized)
            .ok()
            .and_then(|url| url.host_str().map(str::to_lowercase))
            .is_some_and(|host| SHORT_LINK_HOSTS.contains(&host.as_str()))
    }
}

impl fmt::Display for VideoLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

/// A scheme separator only counts before the first path, query, or fragment
/// delimiter, so nested URLs in a query string are ignored.
fn has_scheme(input: &str) -> bool {
    input
        .split_once("://")
        .is_some_and(|(prefix, _)| !prefix.is_empty() && !prefix.contains(['/', '?', '#']))
}

fn is_video_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn normalize_youtube(url: &Url, host: &str) -> (String, Option<String>) {
    let segments = path_segments(url);

    let id = if host_matches(host, "youtu.be") {
        segments.first().map(|s| (*s).to_owned())
    } else {
        match segments.as_slice() {
            ["watch", ..] => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            ["shorts" | "embed" | "live" | "v", id, ..] => Some((*id).to_owned()),
            _ => None,
        }
    };

    match id.filter(|id| is_video_id(id)) {
        Some(id) => (format!("https://www.youtube.com/watch?v={id}"), Some(id)),
        None => (strip_tracking(url), None),
    }
}

fn normalize_tiktok(url: &Url, host: &str) -> (String, Option<String>) {
    if SHORT_LINK_HOSTS.contains(&host) {
        return (strip_tracking(url), None);
    }

    match path_segments(url).as_slice() {
        [user, "video" | "photo", id, ..] if user.starts_with('@') && is_video_id(id) => (
            format!("https://www.tiktok.com/{user}/video/{id}"),
            Some((*id).to_owned()),
        ),
        _ => (strip_tracking(url), None),
    }
}

fn normalize_instagram(url: &Url) -> (String, Option<String>) {
    match path_segments(url).as_slice() {
        ["reel" | "reels" | "p" | "tv", id, ..] if is_video_id(id) => (
            format!("https://www.instagram.com/reel/{id}/"),
            Some((*id).to_owned()),
        ),
        _ => (strip_tracking(url), None),
    }
}

/// Drop tracking query parameters and the fragment
fn strip_tracking(url: &Url) -> String {
    let mut cleaned = url.clone();
    cleaned.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !key.starts_with("utm_") && !TRACKING_PARAMS.contains(&&**key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned.query_pairs_mut().clear().extend_pairs(kept);
    }

    cleaned.to_string()
}

/// Expands share links by following their redirects
#[derive(Clone)]
pub struct LinkResolver {
    client: Client,
}

impl Default for LinkResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkResolver {
    /// Resolver backed by a redirect-following client
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: redirect_client(MAX_REDIRECTS),
        }
    }

    /// Expand a short link to its canonical form
    ///
    /// Links that are already canonical are returned unchanged without any
    /// network traffic. If the redirect cannot be followed the short link is
    /// kept and a warning is logged.
    #[instrument(skip(self), fields(url = %link.normalized))]
    pub async fn resolve(&self, link: VideoLink) -> VideoLink {
        if !link.is_short_link() {
            return link;
        }

        let started = Instant::now();
        let final_url = match self.client.get(&link.normalized).send().await {
            Ok(response) => response.url().to_string(),
            Err(e) => {
                warn!(error = %e, "Failed to expand short link");
                AppLogger::log_source_fetch(
                    "short_link",
                    &link.normalized,
                    false,
                    elapsed_ms(started),
                );
                return link;
            }
        };

        AppLogger::log_source_fetch("short_link", &link.normalized, true, elapsed_ms(started));

        match VideoLink::parse(&final_url) {
            Ok(mut expanded) => {
                expanded.original = link.original;
                expanded
            }
            Err(e) => {
                warn!(final_url = %final_url, error = %e, "Short link redirected to an invalid URL");
                link
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_matching_respects_label_boundaries() {
        assert!(host_matches("m.youtube.com", "youtube.com"));
        assert!(host_matches("youtube.com", "youtube.com"));
        assert!(!host_matches("notyoutube.com", "youtube.com"));
    }

    #[test]
    fn test_strip_tracking_keeps_other_params() {
        let url = Url::parse("https://example.com/r?id=4&utm_source=x&si=abc#top").unwrap();
        assert_eq!(strip_tracking(&url), "https://example.com/r?id=4");
    }

    #[test]
    fn test_schemeless_link_with_nested_url_in_query() {
        let link =
            VideoLink::parse("youtube.com/watch?v=dQw4w9WgXcQ&next=https://example.com").unwrap();
        assert_eq!(link.normalized, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(link.video_id.as_deref(), Some("dQw4w9WgXcQ"));

        assert!(has_scheme("http://example.com/a?b=https://c"));
        assert!(!has_scheme("example.com/a?b=https://c"));
        assert!(!has_scheme("example.com:8080/a"));
    }

    #[test]
    fn test_normalization_table() {
        let cases = [
            (
                "https://youtu.be/dQw4w9WgXcQ?si=share",
                Platform::YouTube,
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                Some("dQw4w9WgXcQ"),
            ),
            (
                "https://www.youtube.com/shorts/abcDEF12345",
                Platform::YouTube,
                "https://www.youtube.com/watch?v=abcDEF12345",
                Some("abcDEF12345"),
            ),
            (
                "https://www.youtube.com/embed/dQw4w9WgXcQ",
                Platform::YouTube,
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                Some("dQw4w9WgXcQ"),
            ),
            (
                "https://m.youtube.com/watch?v=dQw4w9WgXcQ&feature=share&utm_source=x",
                Platform::YouTube,
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                Some("dQw4w9WgXcQ"),
            ),
            (
                "https://www.instagram.com/p/Cx1_yZ-9/?igsh=abc",
                Platform::Instagram,
                "https://www.instagram.com/reel/Cx1_yZ-9/",
                Some("Cx1_yZ-9"),
            ),
            (
                "instagram.com/reels/Cx1yZ9/?igshid=abc",
                Platform::Instagram,
                "https://www.instagram.com/reel/Cx1yZ9/",
                Some("Cx1yZ9"),
            ),
            (
                "https://www.tiktok.com/@chef.ana/video/7312345678901234567?is_from_webapp=1",
                Platform::TikTok,
                "https://www.tiktok.com/@chef.ana/video/7312345678901234567",
                Some("7312345678901234567"),
            ),
            (
                "https://example.com/recipe?id=7&utm_campaign=x&igshid=y#step-2",
                Platform::Other,
                "https://example.com/recipe?id=7",
                None,
            ),
        ];

        for (input, platform, normalized, video_id) in cases {
            let link = VideoLink::parse(input).unwrap();
            assert_eq!(link.platform, platform, "{input}");
            assert_eq!(link.normalized, normalized, "{input}");
            assert_eq!(link.video_id.as_deref(), video_id, "{input}");
            assert_eq!(link.original, input);
        }
    }

    #[test]
    fn test_short_link_detection() {
        let link = VideoLink::parse("https://vm.tiktok.com/ZMabc123/").unwrap();
        assert!(link.is_short_link());
        assert_eq!(link.platform, Platform::TikTok);
        assert!(link.video_id.is_none());
    }

    #[test]
    fn test_rejections_map_to_invalid_input() {
        assert!(matches!(VideoLink::parse("   "), Err(LinkError::Empty)));
        assert!(matches!(
            VideoLink::parse("ftp://example.com/v"),
            Err(LinkError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
        assert!(matches!(
            VideoLink::parse("https://exa mple.com"),
            Err(LinkError::Malformed { .. })
        ));

        let error = AppError::from(VideoLink::parse(&"a".repeat(MAX_URL_LENGTH + 1)).unwrap_err());
        assert_eq!(error.code, clipchef_core::errors::ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_resolve_passes_canonical_links_through() {
        let link = VideoLink::parse("youtu.be/dQw4w9WgXcQ").unwrap();
        let resolved = LinkResolver::new().resolve(link.clone()).await;
        assert_eq!(resolved, link);
    }
}
