//! Category management on top of a [`FeedStore`].
//!
//! Categories group feeds for display. Names are unique: adding a name that
//! exists returns the existing category. One default category collects the
//! feeds of deleted categories and cannot itself be deleted.

use super::{lock, Category, FeedId, FeedStore, SharedStore, StoreError, StoredFeed};
use crate::util::strip_control_chars;

/// Name of the category that receives the feeds of deleted categories.
pub const DEFAULT_CATEGORY_NAME: &str = "Uncategorized";

/// Color given to the default category.
pub const DEFAULT_CATEGORY_COLOR: &str = "808080";

/// Changes applied by [`update_category`]; `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub color_hex: Option<String>,
    pub expanded: Option<bool>,
}

/// Strips control characters and surrounding whitespace; rejects blank names.
fn sanitize_name(name: &str) -> Result<String, StoreError> {
    let sanitized = strip_control_chars(name);
    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        return Err(StoreError::EmptyCategoryName);
    }
    Ok(trimmed.to_owned())
}

fn find_by_name<S: FeedStore>(store: &S, name: &str) -> Option<String> {
    store
        .find_categories()
        .into_iter()
        .find(|c| c.category.name == name)
        .map(|c| c.id.clone())
}

/// Adds a category after the existing ones and returns its id.
///
/// If a category with the same name exists, its id is returned and nothing
/// changes.
pub fn add_category<S: FeedStore>(
    store: &SharedStore<S>,
    name: &str,
    color_hex: Option<&str>,
) -> Result<String, StoreError> {
    let name = sanitize_name(name)?;
    let mut guard = lock(store)?;
    if let Some(id) = find_by_name(&*guard, &name) {
        return Ok(id);
    }

    let sort_order = guard
        .find_categories()
        .iter()
        .map(|c| c.category.sort_order)
        .max()
        .unwrap_or(0)
        + 1;
    let id = guard.insert_category(Category::new(
        name.clone(),
        color_hex.map(str::to_owned),
        sort_order,
    ));
    guard.save()?;
    tracing::info!(category = %id, name = %name, "Added category");
    Ok(id)
}

pub fn update_category<S: FeedStore>(
    store: &SharedStore<S>,
    id: &str,
    update: CategoryUpdate,
) -> Result<(), StoreError> {
    let name = update.name.as_deref().map(sanitize_name).transpose()?;
    let mut guard = lock(store)?;
    let stored = guard
        .category_mut(id)
        .ok_or_else(|| StoreError::CategoryNotFound(id.to_owned()))?;
    if let Some(name) = name {
        stored.category.name = name;
    }
    if let Some(color_hex) = update.color_hex {
        stored.category.color_hex = Some(color_hex);
    }
    if let Some(expanded) = update.expanded {
        stored.category.expanded = expanded;
    }
    guard.save()
}

/// Deletes a category, first moving its feeds to the default category.
///
/// Without a default category the feeds become uncategorized.
///
/// # Errors
///
/// - [`StoreError::DefaultCategory`] for the default category itself
/// - [`StoreError::CategoryNotFound`] for an unknown id
pub fn delete_category<S: FeedStore>(store: &SharedStore<S>, id: &str) -> Result<(), StoreError> {
    let mut guard = lock(store)?;
    let stored = guard
        .category(id)
        .ok_or_else(|| StoreError::CategoryNotFound(id.to_owned()))?;
    if stored.category.name == DEFAULT_CATEGORY_NAME {
        return Err(StoreError::DefaultCategory);
    }

    let fallback = find_by_name(&*guard, DEFAULT_CATEGORY_NAME);
    let moved = guard.update_feeds(&|f| f.feed.category_id.as_deref() == Some(id), &mut |feed| {
        feed.category_id = fallback.clone();
    });
    let removed = guard.delete_category(id)?;
    guard.save()?;
    tracing::info!(category = %id, name = %removed.category.name, moved = moved, "Deleted category");
    Ok(())
}

/// Assigns `sort_order` 0, 1, 2, ... in the order given.
///
/// Every id is checked before anything changes.
pub fn reorder_categories<S: FeedStore>(
    store: &SharedStore<S>,
    ids: &[&str],
) -> Result<(), StoreError> {
    let mut guard = lock(store)?;
    if let Some(missing) = ids.iter().find(|id| guard.category(id).is_none()) {
        return Err(StoreError::CategoryNotFound((*missing).to_owned()));
    }
    for (index, id) in ids.iter().enumerate() {
        if let Some(stored) = guard.category_mut(id) {
            stored.category.sort_order = i64::try_from(index).unwrap_or(i64::MAX);
        }
    }
    guard.save()
}

/// Flips the expanded flag and returns the new value.
pub fn toggle_expanded<S: FeedStore>(store: &SharedStore<S>, id: &str) -> Result<bool, StoreError> {
    let mut guard = lock(store)?;
    let stored = guard
        .category_mut(id)
        .ok_or_else(|| StoreError::CategoryNotFound(id.to_owned()))?;
    stored.category.expanded = !stored.category.expanded;
    let expanded = stored.category.expanded;
    guard.save()?;
    Ok(expanded)
}

/// Returns the id of the default category, creating it if needed.
pub fn ensure_default_category<S: FeedStore>(store: &SharedStore<S>) -> Result<String, StoreError> {
    add_category(store, DEFAULT_CATEGORY_NAME, Some(DEFAULT_CATEGORY_COLOR))
}

/// Puts a feed into `category_id`, or takes it out of any category with `None`.
pub fn move_feed<S: FeedStore>(
    store: &SharedStore<S>,
    feed_id: FeedId,
    category_id: Option<&str>,
) -> Result<(), StoreError> {
    let mut guard = lock(store)?;
    if let Some(id) = category_id {
        if guard.category(id).is_none() {
            return Err(StoreError::CategoryNotFound(id.to_owned()));
        }
    }
    guard
        .feed_mut(feed_id)
        .ok_or(StoreError::FeedNotFound(feed_id))?
        .feed
        .category_id = category_id.map(str::to_owned);
    guard.save()
}

fn sorted_feeds<S: FeedStore>(
    store: &SharedStore<S>,
    category_id: Option<&str>,
) -> Result<Vec<StoredFeed>, StoreError> {
    let guard = lock(store)?;
    let mut feeds: Vec<StoredFeed> = guard
        .find_feeds(&|f| f.feed.category_id.as_deref() == category_id)
        .into_iter()
        .cloned()
        .collect();
    feeds.sort_by(|a, b| {
        (a.feed.sort_order, &a.feed.title).cmp(&(b.feed.sort_order, &b.feed.title))
    });
    Ok(feeds)
}

/// Feeds of one category, ordered by `sort_order` then title.
pub fn feeds_in_category<S: FeedStore>(
    store: &SharedStore<S>,
    id: &str,
) -> Result<Vec<StoredFeed>, StoreError> {
    if lock(store)?.category(id).is_none() {
        return Err(StoreError::CategoryNotFound(id.to_owned()));
    }
    sorted_feeds(store, Some(id))
}

/// Feeds without a category, ordered by `sort_order` then title.
pub fn uncategorized_feeds<S: FeedStore>(
    store: &SharedStore<S>,
) -> Result<Vec<StoredFeed>, StoreError> {
    sorted_feeds(store, None)
}
