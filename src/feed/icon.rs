//! Best-effort site icon lookup.
//!
//! Tries `/favicon.ico` on the feed's host first, then the icon advertised
//! by a `<link rel="icon">` tag on the home page. Every failure along the
//! way is logged at debug level and otherwise ignored.

use tokio::task::JoinHandle;
use url::Url;

use crate::feed::fetcher::FeedClient;
use crate::util::{
    attr_value, check_url, has_token, https_root, resolve_href, site_root, sniff_image, start_tags,
};

/// Icons larger than this are not worth storing.
const MAX_ICON_SIZE: usize = 1024 * 1024;

/// Home pages are only scanned for `<link>` tags; cap the download.
const MAX_HOME_PAGE_SIZE: usize = 2 * 1024 * 1024;

impl FeedClient {
    /// Resolves an icon for the site hosting `feed_url` and hands its bytes
    /// to `set_icon`.
    ///
    /// `set_icon` is called at most once, and only with a body that sniffs
    /// as an image. When nothing is found it is never called.
    pub async fn resolve_icon(&self, feed_url: &Url, set_icon: impl FnOnce(Vec<u8>)) {
        let origin = if self.config().icon_force_https {
            https_root(feed_url)
        } else {
            site_root(feed_url)
        };

        let Ok(favicon) = origin.join("favicon.ico") else {
            return;
        };
        if let Some(bytes) = self.fetch_image(&favicon).await {
            set_icon(bytes);
            return;
        }

        let Some(href) = self.find_icon_link(&origin).await else {
            tracing::debug!(feed = %feed_url, "No icon found");
            return;
        };
        if let Some(bytes) = self.fetch_image(&href).await {
            set_icon(bytes);
        }
    }

    /// Runs [`resolve_icon`](Self::resolve_icon) as a detached task.
    ///
    /// The caller may drop the handle; the task keeps running.
    pub fn spawn_icon_resolution<F>(&self, feed_url: Url, set_icon: F) -> JoinHandle<()>
    where
        F: FnOnce(Vec<u8>) + Send + 'static,
    {
        let client = self.clone();
        tokio::spawn(async move { client.resolve_icon(&feed_url, set_icon).await })
    }

    /// Fetches `url` and returns the body if it is a non-empty image.
    async fn fetch_image(&self, url: &Url) -> Option<Vec<u8>> {
        if let Err(e) = check_url(url, self.config().allow_private_hosts) {
            tracing::debug!(url = %url, error = %e, "Icon URL rejected");
            return None;
        }

        match self.get_bytes(url, MAX_ICON_SIZE).await {
            Ok(bytes) => match sniff_image(&bytes) {
                Some(kind) => {
                    tracing::debug!(url = %url, ?kind, size = bytes.len(), "Found icon");
                    Some(bytes)
                }
                None => {
                    tracing::debug!(url = %url, "Icon candidate is not an image");
                    None
                }
            },
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Icon fetch failed");
                None
            }
        }
    }

    /// Scans the home page for a `<link>` whose `rel` contains `icon`
    /// (`icon`, `shortcut icon`).
    async fn find_icon_link(&self, origin: &Url) -> Option<Url> {
        let bytes = match self.get_bytes(origin, MAX_HOME_PAGE_SIZE).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(url = %origin, error = %e, "Home page fetch failed");
                return None;
            }
        };
        let html = String::from_utf8_lossy(&bytes);
        find_icon_href(&html, origin)
    }
}

fn find_icon_href(html: &str, origin: &Url) -> Option<Url> {
    start_tags(html, "link")
        .filter(|tag| attr_value(tag, "rel").is_some_and(|rel| has_token(rel, "icon")))
        .filter_map(|tag| attr_value(tag, "href"))
        .find_map(|href| resolve_href(href, origin))
}
