use futures::future::join_all;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use url::Url;

use crate::feed::fetcher::{FeedClient, FeedError};
use crate::util::{
    attr_value, has_file_extension, resolve_href, site_root, start_tags, validate_url,
};

const MAX_DISCOVERY_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// `<link type=...>` values that advertise a feed.
const FEED_LINK_TYPES: [&str; 3] = [
    "application/rss+xml",
    "application/atom+xml",
    "application/feed+json",
];

impl FeedClient {
    /// Finds the feeds a website offers.
    ///
    /// `website_url` may omit the scheme (`example.com` becomes
    /// `https://example.com`). Unless its last path segment names a file,
    /// the site root is scanned rather than the given page.
    ///
    /// The page's `<link>` tags are checked for feed types first. If none
    /// are found, the configured conventional paths are probed and each one
    /// answering `200` with an XML content type is kept. Results are
    /// deduplicated in discovery order; an empty list means nothing was
    /// found.
    ///
    /// # Errors
    ///
    /// Only [`FeedError::InvalidUrl`]. Network failures while scanning or
    /// probing reduce the result instead of failing it.
    pub async fn discover_feeds(&self, website_url: &str) -> Result<Vec<Url>, FeedError> {
        let page = discovery_target(website_url, self.config().allow_private_hosts)?;

        let mut found = match self.get_bytes(&page, MAX_DISCOVERY_SIZE).await {
            Ok(bytes) => find_feed_links(&String::from_utf8_lossy(&bytes), &page),
            Err(e) => {
                tracing::debug!(url = %page, error = %e, "Discovery page fetch failed");
                Vec::new()
            }
        };

        if found.is_empty() {
            found = self.probe_conventional_paths(&page).await;
        }

        dedup_in_order(&mut found);
        tracing::info!(url = %page, feeds = found.len(), "Feed discovery finished");
        Ok(found)
    }

    /// Probes every configured path concurrently, keeping configuration order.
    async fn probe_conventional_paths(&self, page: &Url) -> Vec<Url> {
        let root = site_root(page);
        let candidates: Vec<Url> = self
            .config()
            .discovery_paths
            .iter()
            .filter_map(|path| root.join(path).ok())
            .collect();

        let probes = candidates.iter().map(|url| self.probe(url));
        join_all(probes)
            .await
            .into_iter()
            .zip(candidates.iter())
            .filter(|(accepted, _)| *accepted)
            .map(|(_, url)| url.clone())
            .collect()
    }

    async fn probe(&self, url: &Url) -> bool {
        let response = match self.get(url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Discovery probe failed");
                return false;
            }
        };

        let is_xml = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("xml"));

        response.status() == StatusCode::OK && is_xml
    }
}

/// Parses user input into the page discovery should scan.
fn discovery_target(input: &str, allow_private_hosts: bool) -> Result<Url, FeedError> {
    let input = input.trim();
    let url = if input.contains("://") {
        validate_url(input, allow_private_hosts)?
    } else {
        validate_url(&format!("https://{input}"), allow_private_hosts)?
    };

    if has_file_extension(&url) {
        Ok(url)
    } else {
        Ok(site_root(&url))
    }
}

/// Scans HTML for `<link>` tags whose `type` advertises a feed.
///
/// Handles attribute ordering variations and resolves hrefs against the
/// page's site. Returns the links in document order.
fn find_feed_links(html: &str, page: &Url) -> Vec<Url> {
    start_tags(html, "link")
        .filter(|tag| {
            attr_value(tag, "type").is_some_and(|ty| {
                let ty = ty.trim();
                FEED_LINK_TYPES.iter().any(|t| ty.eq_ignore_ascii_case(t))
            })
        })
        .filter_map(|tag| attr_value(tag, "href"))
        .filter_map(|href| resolve_href(href, page))
        .collect()
}

fn dedup_in_order(urls: &mut Vec<Url>) {
    let mut seen = std::collections::HashSet::new();
    urls.retain(|url| seen.insert(url.clone()));
}
