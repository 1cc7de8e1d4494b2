//! Persistence seam for normalized feeds and articles.
//!
//! The pipeline never stores anything itself. [`FeedStore`] is the interface
//! a persistence engine implements; [`MemoryStore`] is the in-memory
//! implementation used by the CLI and the tests. [`library`] holds the
//! subscribe/refresh/read-state flows written against the trait, and
//! [`categories`] the category management flows.

pub mod categories;
pub mod library;
mod memory;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use thiserror::Error;

use crate::feed::{NormalizedArticle, NormalizedFeed};

pub use memory::MemoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FeedId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ArticleId(pub u64);

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feed#{}", self.0)
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "article#{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Feed not found: {0}")]
    FeedNotFound(FeedId),

    #[error("Article not found: {0}")]
    ArticleNotFound(ArticleId),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    #[error("The default category cannot be deleted")]
    DefaultCategory,

    /// The backing store refused to persist pending changes.
    #[error("Failed to save changes: {0}")]
    Save(String),

    /// A writer panicked while holding the store lock.
    #[error("Store lock poisoned")]
    Poisoned,
}

/// A feed as held by a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFeed {
    pub id: FeedId,
    #[serde(flatten)]
    pub feed: NormalizedFeed,
}

/// An article as held by a store, owned by exactly one feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredArticle {
    pub id: ArticleId,
    pub feed_id: FeedId,
    #[serde(flatten)]
    pub article: NormalizedArticle,
}

/// A user-defined group of feeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub name: String,
    /// `RRGGBB`, no leading `#`.
    pub color_hex: Option<String>,
    pub sort_order: i64,
    /// Whether the group is shown unfolded.
    pub expanded: bool,
}

impl Category {
    /// An expanded category.
    pub fn new(name: impl Into<String>, color_hex: Option<String>, sort_order: i64) -> Self {
        Self {
            name: name.into(),
            color_hex,
            sort_order,
            expanded: true,
        }
    }
}

/// A category as held by a store. Feeds point at it through
/// [`NormalizedFeed::category_id`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredCategory {
    pub id: String,
    #[serde(flatten)]
    pub category: Category,
}

/// Predicate over stored feeds.
pub type FeedFilter<'a> = &'a dyn Fn(&StoredFeed) -> bool;

/// Predicate over stored articles.
pub type ArticleFilter<'a> = &'a dyn Fn(&StoredArticle) -> bool;

/// Persistence engine for feeds and their articles.
///
/// Mutations apply to the store immediately; [`save`](FeedStore::save)
/// persists them. A failed save leaves them applied but unpersisted, so flows
/// that must not leave partial state behind undo their own mutations.
/// Deleting a feed deletes its articles.
pub trait FeedStore {
    /// Feeds matching `filter`, ordered by `sort_order` then id.
    fn find_feeds(&self, filter: FeedFilter<'_>) -> Vec<&StoredFeed>;

    /// Articles matching `filter`, ordered by id (insertion order).
    fn find_articles(&self, filter: ArticleFilter<'_>) -> Vec<&StoredArticle>;

    fn feed(&self, id: FeedId) -> Option<&StoredFeed>;

    fn feed_mut(&mut self, id: FeedId) -> Option<&mut StoredFeed>;

    fn article_mut(&mut self, id: ArticleId) -> Option<&mut StoredArticle>;

    /// Applies `update` to every article matching `filter`; returns how many
    /// were visited.
    fn update_articles(
        &mut self,
        filter: ArticleFilter<'_>,
        update: &mut dyn FnMut(&mut NormalizedArticle),
    ) -> usize;

    /// Applies `update` to every feed matching `filter`; returns how many
    /// were visited.
    fn update_feeds(
        &mut self,
        filter: FeedFilter<'_>,
        update: &mut dyn FnMut(&mut NormalizedFeed),
    ) -> usize;

    fn insert_feed(&mut self, feed: NormalizedFeed) -> FeedId;

    /// Inserts articles under `feed_id`, returning their ids in order.
    ///
    /// # Errors
    ///
    /// [`StoreError::FeedNotFound`] if the feed does not exist.
    fn insert_articles(
        &mut self,
        feed_id: FeedId,
        articles: Vec<NormalizedArticle>,
    ) -> Result<Vec<ArticleId>, StoreError>;

    /// Removes a feed and all of its articles.
    fn delete_feed(&mut self, id: FeedId) -> Result<StoredFeed, StoreError>;

    /// All categories, ordered by `sort_order` then name.
    fn find_categories(&self) -> Vec<&StoredCategory>;

    fn category(&self, id: &str) -> Option<&StoredCategory>;

    fn category_mut(&mut self, id: &str) -> Option<&mut StoredCategory>;

    /// Stores a category under a fresh id and returns the id.
    fn insert_category(&mut self, category: Category) -> String;

    /// Removes a category. Feeds pointing at it are left untouched.
    fn delete_category(&mut self, id: &str) -> Result<StoredCategory, StoreError>;

    /// Persists every change made since the last successful save.
    fn save(&mut self) -> Result<(), StoreError>;
}

/// A store shared between the flows in [`library`] and background icon tasks.
///
/// The lock is only ever taken for short synchronous sections, never across
/// an `.await`.
pub type SharedStore<S> = Arc<Mutex<S>>;

pub fn shared<S: FeedStore>(store: S) -> SharedStore<S> {
    Arc::new(Mutex::new(store))
}

pub(crate) fn lock<S>(store: &SharedStore<S>) -> Result<MutexGuard<'_, S>, StoreError> {
    store.lock().map_err(|_| StoreError::Poisoned)
}
