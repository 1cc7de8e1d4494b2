//! Feed ingestion pipeline for RSS, Atom and JSON Feed.
//!
//! - **Parsing**: detect the wire format of a payload and read it with the
//!   matching typed reader
//! - **Normalization**: map every format onto one feed/article schema
//! - **Deduplication**: merge a refresh into an existing article collection
//! - **Fetching**: [`FeedClient`] owns the HTTP side: feed fetches, site
//!   icon lookup and feed discovery
//!
//! # Example
//!
//! ```no_run
//! use blackbird::config::Config;
//! use blackbird::feed::{deduplicate, FeedClient};
//!
//! # async fn run() -> Result<(), blackbird::feed::FeedError> {
//! let client = FeedClient::new(&Config::default())?;
//! let (feed, articles) = client
//!     .fetch_feed("https://example.com/feed.xml", None, None)
//!     .await?;
//! let outcome = deduplicate(&[], articles);
//! println!("{}: {} new", feed.title, outcome.inserted);
//! # Ok(())
//! # }
//! ```

mod dedup;
mod discovery;
mod fetcher;
mod icon;
mod json_feed;
mod model;
mod normalize;
mod parser;
pub mod progress;

pub use dedup::{deduplicate, ArticleIdentity, DedupOutcome, KnownArticles};
pub use fetcher::{FeedClient, FeedError, FetchedFeed, NetworkError};
pub use json_feed::{JsonAuthor, JsonFeed, JsonId, JsonItem};
pub use model::{
    reading_time_minutes, unread_count, FormatKind, NormalizedArticle, NormalizedFeed,
    UNTITLED_FEED, WORDS_PER_MINUTE,
};
pub use normalize::{normalize, normalize_at};
pub use parser::{detect_format, parse_document, ParseError, ParsedDocument};
pub use progress::{Progress, Stage};
