//! Subscription and read-state flows on top of a [`FeedStore`].
//!
//! Each flow takes the store lock for short synchronous sections only; the
//! network work in between runs unlocked, so concurrent refreshes overlap
//! their fetches and serialize only their writes.

use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use super::{lock, ArticleId, FeedId, FeedStore, SharedStore, StoreError, StoredArticle};
use crate::feed::{deduplicate, FeedClient, FeedError, Progress};
use crate::util::validate_url;

/// Maximum feeds fetched at once by [`refresh_all`].
pub const MAX_CONCURRENT_REFRESHES: usize = 10;

/// Outcome of refreshing one feed.
#[derive(Debug)]
pub struct RefreshResult {
    pub feed_id: FeedId,
    /// Number of new articles inserted, or the error that occurred
    pub result: Result<usize, FeedError>,
}

/// Subscribes to the feed at `url`.
///
/// Fetches and normalizes the feed, stores it with its articles, saves, and
/// starts icon resolution in the background. The icon lands on the stored
/// feed whenever it resolves; if the feed was deleted by then it is dropped.
///
/// # Errors
///
/// - [`FeedError::DuplicateFeed`] if a feed with the same URL is stored,
///   checked before fetching and again before inserting
/// - any error of [`FeedClient::fetch_feed`]
/// - [`FeedError::Store`] if saving fails; the feed and its articles are
///   removed again, so the subscribe can be retried
pub async fn subscribe<S>(
    client: &FeedClient,
    store: &SharedStore<S>,
    url: &str,
    category: Option<&str>,
    progress: Option<&watch::Sender<Progress>>,
) -> Result<FeedId, FeedError>
where
    S: FeedStore + Send + 'static,
{
    let url = validate_url(url, client.config().allow_private_hosts)?;
    ensure_not_subscribed(store, &url)?;

    let (feed, articles) = client.fetch_feed(url.as_str(), category, progress).await?;

    let feed_id = {
        let mut guard = lock(store)?;
        if !guard.find_feeds(&|f| f.feed.url == url).is_empty() {
            return Err(FeedError::DuplicateFeed(url));
        }
        let feed_id = guard.insert_feed(feed);
        let outcome = deduplicate(std::iter::empty(), articles);
        let stored = guard
            .insert_articles(feed_id, outcome.to_insert)
            .and_then(|_| guard.save());
        if let Err(e) = stored {
            // Undo the insert so the feed can be subscribed again.
            if let Err(rollback) = guard.delete_feed(feed_id) {
                tracing::warn!(feed_id = %feed_id, error = %rollback, "Rollback of failed subscribe failed");
            }
            return Err(e.into());
        }
        feed_id
    };
    tracing::info!(feed_id = %feed_id, url = %url, "Subscribed to feed");

    let icon_store = Arc::clone(store);
    client.spawn_icon_resolution(url, move |bytes| {
        store_icon(&icon_store, feed_id, bytes);
    });

    Ok(feed_id)
}

fn ensure_not_subscribed<S: FeedStore>(
    store: &SharedStore<S>,
    url: &url::Url,
) -> Result<(), FeedError> {
    let guard = lock(store)?;
    if guard.find_feeds(&|f| f.feed.url == *url).is_empty() {
        Ok(())
    } else {
        Err(FeedError::DuplicateFeed(url.clone()))
    }
}

fn store_icon<S: FeedStore>(store: &SharedStore<S>, feed_id: FeedId, bytes: Vec<u8>) {
    let Ok(mut guard) = lock(store) else {
        tracing::warn!(feed_id = %feed_id, "Store lock poisoned, dropping icon");
        return;
    };
    let Some(stored) = guard.feed_mut(feed_id) else {
        tracing::debug!(feed_id = %feed_id, "Feed removed before its icon resolved");
        return;
    };
    stored.feed.icon = Some(bytes);
    if let Err(e) = guard.save() {
        tracing::warn!(feed_id = %feed_id, error = %e, "Failed to save feed icon");
    }
}

/// Refreshes one stored feed, inserting the articles not seen before.
///
/// Feed metadata (title, description, image, site) is updated from the
/// document; category, sort order, icon and per-article user state are kept.
///
/// Returns the number of new articles.
pub async fn refresh<S: FeedStore>(
    client: &FeedClient,
    store: &SharedStore<S>,
    feed_id: FeedId,
    progress: Option<&watch::Sender<Progress>>,
) -> Result<usize, FeedError> {
    let (url, category) = {
        let guard = lock(store)?;
        let stored = guard.feed(feed_id).ok_or(StoreError::FeedNotFound(feed_id))?;
        (stored.feed.url.clone(), stored.feed.category_id.clone())
    };

    let (fresh, articles) = client
        .fetch_feed(url.as_str(), category.as_deref(), progress)
        .await?;

    let mut guard = lock(store)?;
    let outcome = {
        let existing = guard.find_articles(&|a| a.feed_id == feed_id);
        deduplicate(existing.into_iter().map(|a| &a.article), articles)
    };

    let stored = guard
        .feed_mut(feed_id)
        .ok_or(StoreError::FeedNotFound(feed_id))?;
    stored.feed.title = fresh.title;
    stored.feed.site_url = fresh.site_url;
    stored.feed.description = fresh.description;
    stored.feed.image_url = fresh.image_url;
    stored.feed.format = fresh.format;
    stored.feed.last_updated = fresh.last_updated;

    guard.insert_articles(feed_id, outcome.to_insert)?;
    guard.save()?;

    tracing::debug!(feed_id = %feed_id, inserted = outcome.inserted, "Refreshed feed");
    Ok(outcome.inserted)
}

/// Refreshes every stored feed concurrently.
///
/// At most [`MAX_CONCURRENT_REFRESHES`] fetches run at once. Progress is
/// reported on `progress_tx` as `(completed, total)` after each feed.
/// Results are returned in completion order, not input order.
pub async fn refresh_all<S: FeedStore>(
    client: &FeedClient,
    store: &SharedStore<S>,
    progress_tx: Option<mpsc::Sender<(usize, usize)>>,
) -> Result<Vec<RefreshResult>, FeedError> {
    let feed_ids: Vec<FeedId> = lock(store)?
        .find_feeds(&|_| true)
        .iter()
        .map(|f| f.id)
        .collect();

    if feed_ids.is_empty() {
        return Ok(Vec::new());
    }

    let total = feed_ids.len();
    let completed = AtomicUsize::new(0);

    let results: Vec<RefreshResult> = stream::iter(feed_ids)
        .map(|feed_id| {
            let progress_tx = progress_tx.clone();
            let completed = &completed;
            async move {
                let result = refresh(client, store, feed_id, None).await;
                if let Err(e) = &result {
                    tracing::warn!(feed_id = %feed_id, error = %e, "Feed refresh failed");
                }

                let done = completed.fetch_add(1, Ordering::Relaxed).saturating_add(1);
                if let Some(tx) = progress_tx {
                    if let Err(e) = tx.send((done, total)).await {
                        tracing::warn!(
                            error = %e,
                            done = done,
                            total = total,
                            "Progress channel send failed (receiver dropped)"
                        );
                    }
                }

                RefreshResult { feed_id, result }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_REFRESHES)
        .collect()
        .await;

    Ok(results)
}

/// Sets the read flag of one article.
pub fn set_read<S: FeedStore>(
    store: &SharedStore<S>,
    article_id: ArticleId,
    read: bool,
) -> Result<(), FeedError> {
    let mut guard = lock(store)?;
    guard
        .article_mut(article_id)
        .ok_or(StoreError::ArticleNotFound(article_id))?
        .article
        .read = read;
    guard.save()?;
    Ok(())
}

/// Marks every article read, or only those of `feed_id`.
///
/// Returns the number of articles that changed from unread to read.
pub fn mark_all_read<S: FeedStore>(
    store: &SharedStore<S>,
    feed_id: Option<FeedId>,
) -> Result<usize, FeedError> {
    let mut guard = lock(store)?;
    let changed = guard.update_articles(
        &|a| !a.article.read && feed_id.map_or(true, |id| a.feed_id == id),
        &mut |article| article.read = true,
    );
    if changed > 0 {
        guard.save()?;
    }
    Ok(changed)
}

/// Flips the starred flag of an article and returns the new value.
pub fn toggle_starred<S: FeedStore>(
    store: &SharedStore<S>,
    article_id: ArticleId,
) -> Result<bool, FeedError> {
    let mut guard = lock(store)?;
    let article = &mut guard
        .article_mut(article_id)
        .ok_or(StoreError::ArticleNotFound(article_id))?
        .article;
    article.starred = !article.starred;
    let starred = article.starred;
    guard.save()?;
    Ok(starred)
}

/// Flips the starred flag of a feed and returns the new value.
pub fn toggle_feed_starred<S: FeedStore>(
    store: &SharedStore<S>,
    feed_id: FeedId,
) -> Result<bool, FeedError> {
    let mut guard = lock(store)?;
    let feed = &mut guard
        .feed_mut(feed_id)
        .ok_or(StoreError::FeedNotFound(feed_id))?
        .feed;
    feed.starred = !feed.starred;
    let starred = feed.starred;
    guard.save()?;
    Ok(starred)
}

/// Starred articles across all feeds, in insertion order.
pub fn starred_articles<S: FeedStore>(
    store: &SharedStore<S>,
) -> Result<Vec<StoredArticle>, FeedError> {
    let guard = lock(store)?;
    Ok(guard
        .find_articles(&|a| a.article.starred)
        .into_iter()
        .cloned()
        .collect())
}

/// Records how far the reader scrolled, as a fraction clamped to `0.0..=1.0`.
pub fn set_read_position<S: FeedStore>(
    store: &SharedStore<S>,
    article_id: ArticleId,
    position: f64,
) -> Result<(), FeedError> {
    let position = if position.is_nan() {
        0.0
    } else {
        position.clamp(0.0, 1.0)
    };
    let mut guard = lock(store)?;
    guard
        .article_mut(article_id)
        .ok_or(StoreError::ArticleNotFound(article_id))?
        .article
        .last_read_position = Some(position);
    guard.save()?;
    Ok(())
}

/// Unread articles of one feed, counted from the articles themselves.
pub fn unread_count<S: FeedStore>(
    store: &SharedStore<S>,
    feed_id: FeedId,
) -> Result<usize, FeedError> {
    let guard = lock(store)?;
    if guard.feed(feed_id).is_none() {
        return Err(StoreError::FeedNotFound(feed_id).into());
    }
    let articles = guard.find_articles(&|a| a.feed_id == feed_id);
    Ok(crate::feed::unread_count(articles.into_iter().map(|a| &a.article)))
}

/// Deletes a feed together with its articles.
pub fn delete_feed<S: FeedStore>(store: &SharedStore<S>, feed_id: FeedId) -> Result<(), FeedError> {
    let mut guard = lock(store)?;
    let removed = guard.delete_feed(feed_id)?;
    guard.save()?;
    tracing::info!(feed_id = %feed_id, title = %removed.feed.title, "Deleted feed");
    Ok(())
}
