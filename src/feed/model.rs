use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::util::word_count;

/// Title given to feeds whose document carries none.
pub const UNTITLED_FEED: &str = "Untitled Feed";

/// Assumed reading speed for [`reading_time_minutes`].
pub const WORDS_PER_MINUTE: usize = 200;

/// Wire format a feed document was detected as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    Rss,
    Atom,
    JsonFeed,
}

impl FormatKind {
    pub fn label(self) -> &'static str {
        match self {
            FormatKind::Rss => "RSS",
            FormatKind::Atom => "Atom",
            FormatKind::JsonFeed => "JSON Feed",
        }
    }
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A feed mapped into the canonical schema, independent of its wire format.
///
/// Created once per parse pass; ownership moves to the caller's store. The
/// unread count is deliberately absent: it is derived from the stored
/// articles on demand (see [`unread_count`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedFeed {
    /// Document title, or [`UNTITLED_FEED`]. Never empty.
    pub title: String,
    /// The URL the caller fetched, not any URL embedded in the document.
    pub url: Url,
    /// Home page of the site, when the document names one.
    pub site_url: Option<Url>,
    pub description: Option<String>,
    pub image_url: Option<Url>,
    /// Assigned by the caller, never derived from the document.
    pub category_id: Option<String>,
    /// Set at normalization time.
    pub last_updated: DateTime<Utc>,
    /// Filled in later by icon resolution.
    #[serde(skip)]
    pub icon: Option<Vec<u8>>,
    pub sort_order: i64,
    /// User state, never derived from the document.
    pub starred: bool,
    pub format: FormatKind,
}

/// An article mapped into the canonical schema.
///
/// `content` and `description` are only reachable through setters so the
/// reading-time estimate can never go stale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedArticle {
    pub title: String,
    pub link: Option<Url>,
    description: Option<String>,
    content: Option<String>,
    pub author: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub read: bool,
    pub starred: bool,
    pub image_url: Option<Url>,
    pub tags: Vec<String>,
    reading_time: Option<u32>,
    pub guid: Option<String>,
    /// Scroll position within the article, set by the reader only.
    pub last_read_position: Option<f64>,
}

impl NormalizedArticle {
    /// Creates an unread, unstarred article with no body.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: None,
            description: None,
            content: None,
            author: None,
            published: None,
            read: false,
            starred: false,
            image_url: None,
            tags: Vec::new(),
            reading_time: None,
            guid: None,
            last_read_position: None,
        }
    }

    pub fn with_link(mut self, link: Option<Url>) -> Self {
        self.link = link;
        self
    }

    pub fn with_guid(mut self, guid: Option<String>) -> Self {
        self.guid = guid;
        self
    }

    pub fn with_body(mut self, description: Option<String>, content: Option<String>) -> Self {
        self.description = description;
        self.content = content;
        self.recompute_reading_time();
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Estimated minutes to read; `None` when the body has no words.
    pub fn reading_time(&self) -> Option<u32> {
        self.reading_time
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.recompute_reading_time();
    }

    pub fn set_content(&mut self, content: Option<String>) {
        self.content = content;
        self.recompute_reading_time();
    }

    fn recompute_reading_time(&mut self) {
        let words = match (&self.content, &self.description) {
            (Some(content), _) => word_count(content),
            (None, Some(description)) => word_count(description),
            (None, None) => 0,
        };
        self.reading_time = reading_time_minutes(words);
    }
}

/// `ceil(words / 200)`, at least 1, or `None` for zero words.
pub fn reading_time_minutes(words: usize) -> Option<u32> {
    if words == 0 {
        return None;
    }
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    Some(u32::try_from(minutes).unwrap_or(u32::MAX))
}

/// Number of unread articles in a collection.
pub fn unread_count<'a>(articles: impl IntoIterator<Item = &'a NormalizedArticle>) -> usize {
    articles.into_iter().filter(|a| !a.read).count()
}
