use std::collections::HashSet;

use url::Url;

use crate::feed::model::NormalizedArticle;

/// The key an article is recognized by across refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleIdentity<'a> {
    Guid(&'a str),
    Link(&'a Url),
    /// Neither guid nor link: the article is new on every refresh.
    Unidentified,
}

impl NormalizedArticle {
    /// Primary identity: guid if present, else link, else none.
    pub fn identity(&self) -> ArticleIdentity<'_> {
        match (&self.guid, &self.link) {
            (Some(guid), _) => ArticleIdentity::Guid(guid),
            (None, Some(link)) => ArticleIdentity::Link(link),
            (None, None) => ArticleIdentity::Unidentified,
        }
    }
}

/// Result of merging a refresh into an existing collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    /// New articles, in incoming order.
    pub to_insert: Vec<NormalizedArticle>,
    pub inserted: usize,
}

/// Guids and links already present in a collection.
#[derive(Debug, Default)]
pub struct KnownArticles {
    guids: HashSet<String>,
    links: HashSet<Url>,
}

impl KnownArticles {
    pub fn from_articles<'a>(articles: impl IntoIterator<Item = &'a NormalizedArticle>) -> Self {
        let mut known = Self::default();
        for article in articles {
            known.remember(article);
        }
        known
    }

    /// An article is a duplicate when its guid matches a known guid, or
    /// failing that, when its link matches a known link.
    ///
    /// The guid check runs first, so a republished article whose link
    /// changed but whose guid did not is still recognized.
    pub fn contains(&self, article: &NormalizedArticle) -> bool {
        if article
            .guid
            .as_ref()
            .is_some_and(|guid| self.guids.contains(guid))
        {
            return true;
        }
        article
            .link
            .as_ref()
            .is_some_and(|link| self.links.contains(link))
    }

    pub fn remember(&mut self, article: &NormalizedArticle) {
        if let Some(guid) = &article.guid {
            self.guids.insert(guid.clone());
        }
        if let Some(link) = &article.link {
            self.links.insert(link.clone());
        }
    }
}

/// Filters `incoming` down to the articles not already in `existing`.
///
/// Articles carrying neither guid nor link can't be matched and are always
/// reported as new; no fuzzy matching on title or body is attempted.
/// Articles accepted earlier in the same batch count as known for the rest
/// of it, so a document that repeats an item inserts it once.
pub fn deduplicate<'a>(
    existing: impl IntoIterator<Item = &'a NormalizedArticle>,
    incoming: Vec<NormalizedArticle>,
) -> DedupOutcome {
    let mut known = KnownArticles::from_articles(existing);
    let mut to_insert = Vec::with_capacity(incoming.len());

    for article in incoming {
        if known.contains(&article) {
            continue;
        }
        known.remember(&article);
        to_insert.push(article);
    }

    DedupOutcome {
        inserted: to_insert.len(),
        to_insert,
    }
}
