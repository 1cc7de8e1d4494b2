use url::Url;

/// Returns the root (`scheme://host[:port]/`) of a URL, dropping path, query
/// and fragment.
pub fn site_root(url: &Url) -> Url {
    let mut root = url.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
}

/// Returns the site root of `url` with its scheme forced to `https`.
///
/// Falls back to the plain site root when the scheme cannot be changed.
pub fn https_root(url: &Url) -> Url {
    let mut root = site_root(url);
    if root.scheme() != "https" && root.set_scheme("https").is_err() {
        return site_root(url);
    }
    root
}

/// Resolves an `href` found in a page against the page's site.
///
/// - Absolute `http(s)` URLs are returned as-is.
/// - Protocol-relative URLs (`//cdn.example.com/x`) get `https:`.
/// - Anything else is treated as host-relative: a leading `/` is kept, a
///   missing one is inserted, so `icon.png` and `/icon.png` both resolve to
///   `{root}/icon.png`.
///
/// Returns `None` for other schemes (`data:`, `javascript:`) and for hrefs
/// that still fail to parse.
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    // Protocol-relative: reparse so credentials and ports are normalized
    if href.starts_with("//") {
        return Url::parse(&format!("https:{href}")).ok();
    }

    if let Ok(absolute) = Url::parse(href) {
        return match absolute.scheme() {
            "http" | "https" => Some(absolute),
            _ => None,
        };
    }

    site_root(base).join(href.trim_start_matches('/')).ok()
}

/// Resolves an article-level URL (link, image) found inside a feed document.
///
/// Unlike [`resolve_href`] this uses regular relative resolution against the
/// feed URL, since item links are usually written relative to the feed.
pub fn resolve_document_url(raw: &str, feed_url: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => feed_url.join(raw).ok(),
        Err(_) => None,
    }
}

/// Whether the last path segment of `url` looks like a file (`index.html`,
/// `feed.xml`) rather than a directory-like path.
pub fn has_file_extension(url: &Url) -> bool {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.rsplit_once('.'))
        .is_some_and(|(stem, ext)| {
            !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_site_root_drops_path_and_query() {
        let root = site_root(&url("https://example.com:8443/blog/post?id=1#top"));
        assert_eq!(root.as_str(), "https://example.com:8443/");
    }

    #[test]
    fn test_https_root_upgrades_scheme() {
        assert_eq!(
            https_root(&url("http://example.com/feed.xml")).as_str(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_resolve_absolute_url() {
        let resolved = resolve_href("https://other.com/feed", &url("https://example.com"));
        assert_eq!(resolved.unwrap().as_str(), "https://other.com/feed");
    }

    #[test]
    fn test_resolve_leading_slash_is_host_relative() {
        let resolved = resolve_href("/static/icon.png", &url("https://example.com/blog/page"));
        assert_eq!(resolved.unwrap().as_str(), "https://example.com/static/icon.png");
    }

    #[test]
    fn test_resolve_bare_path_gets_slash_inserted() {
        let resolved = resolve_href("icon.png", &url("https://example.com/blog/page"));
        assert_eq!(resolved.unwrap().as_str(), "https://example.com/icon.png");
    }

    #[test]
    fn test_resolve_protocol_relative() {
        let resolved = resolve_href("//cdn.example.com/feed", &url("http://example.com"));
        assert_eq!(resolved.unwrap().as_str(), "https://cdn.example.com/feed");
    }

    // Protocol-relative URL parser normalization
    #[test]
    fn test_resolve_protocol_relative_normalizes_path() {
        let resolved =
            resolve_href("//evil.com/../../../etc/passwd", &url("https://example.com")).unwrap();
        assert_eq!(resolved.host_str(), Some("evil.com"));
        assert!(!resolved.path().contains(".."));
    }

    #[test]
    fn test_resolve_rejects_other_schemes() {
        let base = url("https://example.com");
        assert!(resolve_href("data:image/png;base64,AAAA", &base).is_none());
        assert!(resolve_href("javascript:alert(1)", &base).is_none());
        assert!(resolve_href("   ", &base).is_none());
    }

    #[test]
    fn test_resolve_document_url_relative_to_feed() {
        let feed = url("https://example.com/blog/feed.xml");
        assert_eq!(
            resolve_document_url("posts/1", &feed).unwrap().as_str(),
            "https://example.com/blog/posts/1"
        );
        assert_eq!(
            resolve_document_url("https://other.org/x", &feed).unwrap().as_str(),
            "https://other.org/x"
        );
        assert!(resolve_document_url("", &feed).is_none());
    }

    #[test]
    fn test_has_file_extension() {
        assert!(has_file_extension(&url("https://example.com/index.html")));
        assert!(has_file_extension(&url("https://example.com/blog/feed.xml")));
        assert!(!has_file_extension(&url("https://example.com/blog/")));
        assert!(!has_file_extension(&url("https://example.com/blog")));
        assert!(!has_file_extension(&url("https://example.com/")));
        assert!(!has_file_extension(&url("https://example.com/.well-known")));
    }
}
