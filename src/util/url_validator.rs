use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Why a URL was refused before any request was made.
///
/// Parse and scheme failures are always errors; the host checks only apply
/// when private hosts are disallowed, which keeps fetched documents from
/// steering requests at internal services.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Anything but http and https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
    /// RFC 1918, link-local, unspecified or unique-local address.
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(String),
    /// `localhost` or a loopback address.
    #[error("Localhost not allowed")]
    Localhost,
}

/// Parses user input into a URL the client is willing to request.
///
/// Surrounding whitespace is ignored. Hostnames are not resolved, so only
/// literal addresses are caught by the private-host check.
///
/// # Errors
///
/// Any [`UrlValidationError`]; see [`check_url`] for the policy.
///
/// # Examples
///
/// ```
/// use blackbird::util::validate_url;
///
/// let url = validate_url("https://example.com/feed.xml", false).unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_url("http://localhost/feed", false).is_err());
/// assert!(validate_url("http://localhost/feed", true).is_ok());
/// assert!(validate_url("file:///etc/passwd", true).is_err());
/// ```
pub fn validate_url(url_str: &str, allow_private_hosts: bool) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;
    check_url(&url, allow_private_hosts)?;
    Ok(url)
}

/// Applies the same policy as [`validate_url`] to an already parsed URL.
///
/// Used for URLs that come out of fetched documents (discovered feed links,
/// icon hrefs) before they are requested.
pub fn check_url(url: &Url, allow_private_hosts: bool) -> Result<(), UrlValidationError> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    let host = url.host_str().ok_or(UrlValidationError::MissingHost)?;
    if allow_private_hosts {
        return Ok(());
    }

    if host == "localhost" {
        return Err(UrlValidationError::Localhost);
    }

    // url keeps IPv6 hosts bracketed
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    if let Ok(ip) = host_for_parse.parse::<IpAddr>() {
        if ip.is_loopback() {
            return Err(UrlValidationError::Localhost);
        }
        if is_private_ip(&ip) {
            return Err(UrlValidationError::PrivateIp(ip.to_string()));
        }
    }

    Ok(())
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_private() || ipv4.is_loopback() || ipv4.is_link_local() || ipv4.is_unspecified()
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_loopback() || ipv6.is_unspecified() {
                return true;
            }
            let segments = ipv6.segments();
            // Unique Local (fc00::/7)
            let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
            // Link-Local (fe80::/10)
            let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
            is_unique_local || is_link_local
        }
    }
}
