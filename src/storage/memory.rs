use std::collections::BTreeMap;

use super::{
    ArticleFilter, ArticleId, Category, FeedFilter, FeedId, FeedStore, StoreError, StoredArticle,
    StoredCategory, StoredFeed,
};
use crate::feed::{NormalizedArticle, NormalizedFeed};

/// In-memory [`FeedStore`].
///
/// Ids are assigned sequentially and never reused. `save` only clears the
/// dirty flag, unless the store was made read-only, in which case it fails
/// and leaves the unsaved changes in place.
#[derive(Debug, Default)]
pub struct MemoryStore {
    feeds: BTreeMap<FeedId, StoredFeed>,
    articles: BTreeMap<ArticleId, StoredArticle>,
    categories: BTreeMap<String, StoredCategory>,
    next_feed_id: u64,
    next_article_id: u64,
    next_category_id: u64,
    dirty: bool,
    read_only: bool,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `save` fail.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Whether there are changes not yet saved.
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves
    }

    pub fn feed_count(&self) -> usize {
        self.feeds.len()
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}

impl FeedStore for MemoryStore {
    fn find_feeds(&self, filter: FeedFilter<'_>) -> Vec<&StoredFeed> {
        let mut feeds: Vec<&StoredFeed> = self.feeds.values().filter(|f| filter(f)).collect();
        feeds.sort_by_key(|f| (f.feed.sort_order, f.id));
        feeds
    }

    fn find_articles(&self, filter: ArticleFilter<'_>) -> Vec<&StoredArticle> {
        self.articles.values().filter(|a| filter(a)).collect()
    }

    fn feed(&self, id: FeedId) -> Option<&StoredFeed> {
        self.feeds.get(&id)
    }

    fn feed_mut(&mut self, id: FeedId) -> Option<&mut StoredFeed> {
        let feed = self.feeds.get_mut(&id)?;
        self.dirty = true;
        Some(feed)
    }

    fn article_mut(&mut self, id: ArticleId) -> Option<&mut StoredArticle> {
        let article = self.articles.get_mut(&id)?;
        self.dirty = true;
        Some(article)
    }

    fn update_articles(
        &mut self,
        filter: ArticleFilter<'_>,
        update: &mut dyn FnMut(&mut NormalizedArticle),
    ) -> usize {
        let mut visited = 0;
        for stored in self.articles.values_mut().filter(|a| filter(a)) {
            update(&mut stored.article);
            visited += 1;
        }
        if visited > 0 {
            self.dirty = true;
        }
        visited
    }

    fn update_feeds(
        &mut self,
        filter: FeedFilter<'_>,
        update: &mut dyn FnMut(&mut NormalizedFeed),
    ) -> usize {
        let mut visited = 0;
        for stored in self.feeds.values_mut().filter(|f| filter(f)) {
            update(&mut stored.feed);
            visited += 1;
        }
        if visited > 0 {
            self.dirty = true;
        }
        visited
    }

    fn insert_feed(&mut self, feed: NormalizedFeed) -> FeedId {
        self.next_feed_id += 1;
        let id = FeedId(self.next_feed_id);
        self.feeds.insert(id, StoredFeed { id, feed });
        self.dirty = true;
        id
    }

    fn insert_articles(
        &mut self,
        feed_id: FeedId,
        articles: Vec<NormalizedArticle>,
    ) -> Result<Vec<ArticleId>, StoreError> {
        if !self.feeds.contains_key(&feed_id) {
            return Err(StoreError::FeedNotFound(feed_id));
        }

        let mut ids = Vec::with_capacity(articles.len());
        for article in articles {
            self.next_article_id += 1;
            let id = ArticleId(self.next_article_id);
            self.articles.insert(
                id,
                StoredArticle {
                    id,
                    feed_id,
                    article,
                },
            );
            ids.push(id);
        }
        if !ids.is_empty() {
            self.dirty = true;
        }
        Ok(ids)
    }

    fn delete_feed(&mut self, id: FeedId) -> Result<StoredFeed, StoreError> {
        let feed = self.feeds.remove(&id).ok_or(StoreError::FeedNotFound(id))?;
        self.articles.retain(|_, a| a.feed_id != id);
        self.dirty = true;
        Ok(feed)
    }

    fn find_categories(&self) -> Vec<&StoredCategory> {
        let mut categories: Vec<&StoredCategory> = self.categories.values().collect();
        categories.sort_by(|a, b| {
            (a.category.sort_order, &a.category.name).cmp(&(b.category.sort_order, &b.category.name))
        });
        categories
    }

    fn category(&self, id: &str) -> Option<&StoredCategory> {
        self.categories.get(id)
    }

    fn category_mut(&mut self, id: &str) -> Option<&mut StoredCategory> {
        let category = self.categories.get_mut(id)?;
        self.dirty = true;
        Some(category)
    }

    fn insert_category(&mut self, category: Category) -> String {
        self.next_category_id += 1;
        let id = format!("category-{}", self.next_category_id);
        self.categories.insert(
            id.clone(),
            StoredCategory {
                id: id.clone(),
                category,
            },
        );
        self.dirty = true;
        id
    }

    fn delete_category(&mut self, id: &str) -> Result<StoredCategory, StoreError> {
        let category = self
            .categories
            .remove(id)
            .ok_or_else(|| StoreError::CategoryNotFound(id.to_owned()))?;
        self.dirty = true;
        Ok(category)
    }

    fn save(&mut self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::Save("store is read-only".to_string()));
        }
        self.dirty = false;
        self.saves += 1;
        Ok(())
    }
}
