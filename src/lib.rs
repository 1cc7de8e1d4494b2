//! Feed ingestion for RSS, Atom and JSON Feed.
//!
//! [`feed::FeedClient`] fetches a feed and normalizes it into
//! [`feed::NormalizedFeed`] / [`feed::NormalizedArticle`], discovers the
//! feeds a website offers, and resolves site icons. [`feed::deduplicate`]
//! merges a refresh into stored articles, and [`storage`] wires the two to a
//! persistence engine.

pub mod config;
pub mod feed;
pub mod storage;
pub mod util;
