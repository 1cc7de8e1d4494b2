use feed_rs::model::FeedType;
use feed_rs::parser::ParseFeedError;
use thiserror::Error;

use crate::feed::json_feed::JsonFeed;
use crate::feed::model::FormatKind;

/// Why a payload could not be turned into a feed document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The payload is not well-formed XML/JSON, or is a feed the format
    /// reader rejects.
    #[error("malformed document: {0}")]
    Malformed(String),
    /// The payload is well-formed but is not RSS, Atom or JSON Feed.
    #[error("unsupported document: {0}")]
    Unsupported(String),
}

/// A feed document in its format-specific representation.
#[derive(Debug, Clone)]
pub enum ParsedDocument {
    Rss(rss::Channel),
    Atom(atom_syndication::Feed),
    Json(JsonFeed),
}

impl ParsedDocument {
    pub fn kind(&self) -> FormatKind {
        match self {
            ParsedDocument::Rss(_) => FormatKind::Rss,
            ParsedDocument::Atom(_) => FormatKind::Atom,
            ParsedDocument::Json(_) => FormatKind::JsonFeed,
        }
    }
}

/// Detects the wire format of a payload from its structure.
///
/// See [`parse_document`]; HTTP content-type headers are never consulted,
/// since feeds are routinely served as `text/html` or
/// `application/octet-stream`.
pub fn detect_format(bytes: &[u8]) -> Result<FormatKind, ParseError> {
    parse_document(bytes).map(|(kind, _)| kind)
}

/// Detects the format of a payload and parses it into the matching typed
/// representation.
///
/// A payload that starts with `{` is a JSON Feed candidate and is accepted
/// when its `version` names a jsonfeed.org version. Anything else is handed
/// to `feed-rs`, which recognizes RSS 0.9x/1.0/2.0 and Atom by their root
/// element; the document is then read with the format's own reader so
/// format-specific fields (`content:encoded`, Media RSS, Atom links) survive.
pub fn parse_document(bytes: &[u8]) -> Result<(FormatKind, ParsedDocument), ParseError> {
    let bytes = strip_preamble(bytes);

    let document = if bytes.first() == Some(&b'{') {
        ParsedDocument::Json(parse_json_feed(bytes)?)
    } else {
        let feed = feed_rs::parser::parse(bytes).map_err(classify)?;
        match feed.feed_type {
            FeedType::Atom => atom_syndication::Feed::read_from(bytes)
                .map(ParsedDocument::Atom)
                .map_err(|e| ParseError::Malformed(e.to_string()))?,
            _ => rss::Channel::read_from(bytes)
                .map(ParsedDocument::Rss)
                .map_err(|e| ParseError::Malformed(e.to_string()))?,
        }
    };

    Ok((document.kind(), document))
}

fn parse_json_feed(bytes: &[u8]) -> Result<JsonFeed, ParseError> {
    let feed = JsonFeed::from_slice(bytes).map_err(|e| ParseError::Malformed(e.to_string()))?;
    if !feed.has_known_version() {
        return Err(ParseError::Unsupported(format!(
            "JSON document is not a JSON Feed (version: {})",
            feed.version.as_deref().unwrap_or("missing")
        )));
    }
    Ok(feed)
}

fn classify(err: ParseFeedError) -> ParseError {
    match err {
        ParseFeedError::ParseError(_) => ParseError::Unsupported(err.to_string()),
        _ => ParseError::Malformed(err.to_string()),
    }
}

/// Skips a UTF-8 byte order mark and leading whitespace, which some
/// publishers emit before the XML declaration.
fn strip_preamble(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}
