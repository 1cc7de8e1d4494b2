//! Maps RSS, Atom and JSON Feed documents onto [`NormalizedFeed`] and
//! [`NormalizedArticle`].
//!
//! Everything here is pure: no I/O, and the only clock read happens in
//! [`normalize`], which delegates to [`normalize_at`] with `Utc::now()`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rss::extension::Extension;
use url::Url;

use crate::feed::json_feed::{JsonFeed, JsonItem};
use crate::feed::model::{NormalizedArticle, NormalizedFeed, UNTITLED_FEED};
use crate::feed::parser::ParsedDocument;
use crate::util::{clean_line, first_img_src, resolve_document_url};

/// Feed-level fields pulled out of a document before the caller-supplied
/// fields are attached.
struct FeedHead {
    title: Option<String>,
    site_url: Option<Url>,
    description: Option<String>,
    image_url: Option<Url>,
}

/// Normalizes a parsed document, stamping `last_updated` with the current time.
///
/// See [`normalize_at`].
pub fn normalize(
    document: &ParsedDocument,
    feed_url: &Url,
    category_id: Option<&str>,
) -> (NormalizedFeed, Vec<NormalizedArticle>) {
    normalize_at(document, feed_url, category_id, Utc::now())
}

/// Normalizes a parsed document into a feed and its articles.
///
/// # Arguments
///
/// * `document` - The format-specific document
/// * `feed_url` - The URL the caller fetched; becomes the feed's canonical URL
///   and the base for relative links inside the document
/// * `category_id` - Caller-assigned category, copied onto the feed
/// * `now` - Timestamp recorded as the feed's `last_updated`
///
/// Articles without a usable title are dropped. The output is fully
/// determined by the arguments.
pub fn normalize_at(
    document: &ParsedDocument,
    feed_url: &Url,
    category_id: Option<&str>,
    now: DateTime<Utc>,
) -> (NormalizedFeed, Vec<NormalizedArticle>) {
    let (head, articles, total) = match document {
        ParsedDocument::Rss(channel) => (
            rss_head(channel, feed_url),
            collect(channel.items(), |item| rss_article(item, feed_url)),
            channel.items().len(),
        ),
        ParsedDocument::Atom(feed) => (
            atom_head(feed, feed_url),
            collect(feed.entries(), |entry| atom_article(entry, feed_url)),
            feed.entries().len(),
        ),
        ParsedDocument::Json(feed) => (
            json_head(feed, feed_url),
            collect(&feed.items, |item| json_article(item, feed_url)),
            feed.items.len(),
        ),
    };

    let dropped = total - articles.len();
    if dropped > 0 {
        tracing::debug!(
            feed = %feed_url,
            dropped = dropped,
            "Skipped entries without a title"
        );
    }

    let feed = NormalizedFeed {
        title: head.title.unwrap_or_else(|| UNTITLED_FEED.to_owned()),
        url: feed_url.clone(),
        site_url: head.site_url,
        description: head.description,
        image_url: head.image_url,
        category_id: category_id.map(str::to_owned),
        last_updated: now,
        icon: None,
        sort_order: 0,
        starred: false,
        format: document.kind(),
    };

    (feed, articles)
}

fn collect<T>(
    items: &[T],
    map: impl Fn(&T) -> Option<NormalizedArticle>,
) -> Vec<NormalizedArticle> {
    items.iter().filter_map(map).collect()
}

// ============================================================================
// RSS
// ============================================================================

fn rss_head(channel: &rss::Channel, feed_url: &Url) -> FeedHead {
    FeedHead {
        title: clean_line(channel.title()),
        site_url: resolve_document_url(channel.link(), feed_url),
        description: non_blank(Some(channel.description())),
        image_url: channel
            .image()
            .and_then(|image| resolve_document_url(image.url(), feed_url)),
    }
}

fn rss_article(item: &rss::Item, feed_url: &Url) -> Option<NormalizedArticle> {
    let title = item.title().and_then(clean_line)?;

    let guid = item.guid().and_then(|g| non_blank(Some(g.value())));
    let link = item
        .link()
        .and_then(|l| resolve_document_url(l, feed_url))
        .or_else(|| {
            // A permalink guid doubles as the article link
            item.guid()
                .filter(|g| g.is_permalink())
                .and_then(|g| Url::parse(g.value().trim()).ok())
                .filter(|u| matches!(u.scheme(), "http" | "https"))
        });

    let description = non_blank(item.description());
    let content = non_blank(item.content()).or_else(|| description.clone());

    let image_url = rss_media_url(item)
        .and_then(|raw| resolve_document_url(raw, feed_url))
        .or_else(|| image_from_body(content.as_deref(), link.as_ref(), feed_url));

    let dublin_core = item.dublin_core_ext();
    let author = item
        .author()
        .and_then(clean_line)
        .or_else(|| dublin_core.and_then(|dc| dc.creators().iter().find_map(|c| clean_line(c))));

    let published = item.pub_date().and_then(parse_date).or_else(|| {
        dublin_core.and_then(|dc| dc.dates().iter().find_map(|d| parse_date(d)))
    });

    let mut article = NormalizedArticle::new(title)
        .with_link(link)
        .with_guid(guid)
        .with_body(description, content);
    article.author = author;
    article.published = published;
    article.image_url = image_url;
    article.tags = item
        .categories()
        .iter()
        .filter_map(|c| clean_line(c.name()))
        .collect();
    Some(article)
}

/// First image URL carried by Media RSS or an image enclosure.
///
/// Checks `media:content`, `media:group/media:content`, `media:thumbnail`,
/// then `<enclosure type="image/...">`.
fn rss_media_url(item: &rss::Item) -> Option<&str> {
    let from_media = item.extensions().get("media").and_then(|media| {
        let direct = media.get("content").and_then(|c| first_image_extension(c));
        let grouped = || {
            media.get("group").and_then(|groups| {
                groups.iter().find_map(|group| {
                    group
                        .children()
                        .get("content")
                        .and_then(|c| first_image_extension(c))
                })
            })
        };
        let thumbnail = || {
            media
                .get("thumbnail")
                .and_then(|t| t.iter().find_map(|ext| ext.attrs().get("url")))
                .map(String::as_str)
        };
        direct.or_else(grouped).or_else(thumbnail)
    });

    from_media.or_else(|| {
        item.enclosure()
            .filter(|e| e.mime_type().starts_with("image/"))
            .map(|e| e.url())
    })
}

fn first_image_extension(contents: &[Extension]) -> Option<&str> {
    contents
        .iter()
        .filter(|ext| {
            let attrs = ext.attrs();
            let medium_ok = attrs.get("medium").map_or(true, |m| m == "image");
            let type_ok = attrs.get("type").map_or(true, |t| t.starts_with("image/"));
            medium_ok && type_ok
        })
        .find_map(|ext| ext.attrs().get("url"))
        .map(String::as_str)
}

// ============================================================================
// Atom
// ============================================================================

fn atom_head(feed: &atom_syndication::Feed, feed_url: &Url) -> FeedHead {
    FeedHead {
        title: clean_line(&feed.title().value),
        site_url: alternate_link(feed.links()).and_then(|href| resolve_document_url(href, feed_url)),
        description: feed.subtitle().and_then(|t| non_blank(Some(t.value.as_str()))),
        image_url: feed
            .logo()
            .or(feed.icon())
            .and_then(|raw| resolve_document_url(raw, feed_url)),
    }
}

fn atom_article(entry: &atom_syndication::Entry, feed_url: &Url) -> Option<NormalizedArticle> {
    let title = clean_line(&entry.title().value)?;

    let link = alternate_link(entry.links()).and_then(|href| resolve_document_url(href, feed_url));
    let description = entry.summary().and_then(|s| non_blank(Some(s.value.as_str())));
    let content = entry
        .content()
        .and_then(|c| non_blank(c.value()))
        .or_else(|| description.clone());
    let image_url = image_from_body(content.as_deref(), link.as_ref(), feed_url);

    // atom_syndication fills a missing <updated> with the Unix epoch.
    let published = entry
        .published()
        .copied()
        .or_else(|| Some(*entry.updated()).filter(|d| d.timestamp() != 0))
        .map(|d| d.with_timezone(&Utc));

    let mut article = NormalizedArticle::new(title)
        .with_link(link)
        .with_guid(non_blank(Some(entry.id())))
        .with_body(description, content);
    article.author = entry.authors().iter().find_map(|p| clean_line(p.name()));
    article.published = published;
    article.image_url = image_url;
    article.tags = entry
        .categories()
        .iter()
        .filter_map(|c| clean_line(c.term()))
        .collect();
    Some(article)
}

/// The `rel="alternate"` link, falling back to the first link of any kind.
fn alternate_link(links: &[atom_syndication::Link]) -> Option<&str> {
    links
        .iter()
        .find(|l| l.rel() == "alternate")
        .or_else(|| links.first())
        .map(|l| l.href())
}

// ============================================================================
// JSON Feed
// ============================================================================

fn json_head(feed: &JsonFeed, feed_url: &Url) -> FeedHead {
    FeedHead {
        title: feed.title.as_deref().and_then(clean_line),
        site_url: feed
            .home_page_url
            .as_deref()
            .and_then(|raw| resolve_document_url(raw, feed_url)),
        description: non_blank(feed.description.as_deref()),
        image_url: feed
            .icon
            .as_deref()
            .and_then(|raw| resolve_document_url(raw, feed_url)),
    }
}

fn json_article(item: &JsonItem, feed_url: &Url) -> Option<NormalizedArticle> {
    let title = item.title.as_deref().and_then(clean_line)?;

    let link = item
        .url
        .as_deref()
        .or(item.external_url.as_deref())
        .and_then(|raw| resolve_document_url(raw, feed_url));
    let description = non_blank(item.summary.as_deref());
    let content = non_blank(item.content_html.as_deref())
        .or_else(|| non_blank(item.content_text.as_deref()))
        .or_else(|| description.clone());

    let image_url = item
        .image
        .as_deref()
        .or(item.banner_image.as_deref())
        .and_then(|raw| resolve_document_url(raw, feed_url))
        .or_else(|| image_from_body(content.as_deref(), link.as_ref(), feed_url));

    let author = item
        .author
        .iter()
        .chain(item.authors.iter())
        .find_map(|a| a.name.as_deref().and_then(clean_line));

    let published = item
        .date_published
        .as_deref()
        .and_then(parse_date)
        .or_else(|| item.date_modified.as_deref().and_then(parse_date));

    let mut article = NormalizedArticle::new(title)
        .with_link(link)
        .with_guid(item.id.as_ref().and_then(|id| non_blank(Some(id.to_guid().as_str()))))
        .with_body(description, content);
    article.author = author;
    article.published = published;
    article.image_url = image_url;
    article.tags = item.tags.clone();
    Some(article)
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Trims a string and maps blank values to `None`.
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// The first `<img src>` in an HTML body, resolved against the article link
/// (or the feed URL when the article has none).
fn image_from_body(body: Option<&str>, link: Option<&Url>, feed_url: &Url) -> Option<Url> {
    let src = first_img_src(body?)?;
    resolve_document_url(src, link.unwrap_or(feed_url))
}

/// Zone-less layouts seen in the wild, read as UTC.
const NAIVE_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parses RFC 2822 (RSS `pubDate`) or RFC 3339 (Atom, JSON Feed, `dc:date`),
/// then the zone-less layouts and a bare `YYYY-MM-DD`.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw).or_else(|_| DateTime::parse_from_rfc3339(raw)) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::model::FormatKind;
    use crate::feed::parser::parse_document;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn feed_url() -> Url {
        Url::parse("https://example.com/feed.xml").unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn run(payload: &str) -> (NormalizedFeed, Vec<NormalizedArticle>) {
        let (_, doc) = parse_document(payload.as_bytes()).unwrap();
        normalize_at(&doc, &feed_url(), None, fixed_now())
    }

    fn rss_with_items(items: &str) -> String {
        format!(
            r#"<?xml version="1.0"?>
<rss version="2.0"
     xmlns:content="http://purl.org/rss/1.0/modules/content/"
     xmlns:dc="http://purl.org/dc/elements/1.1/"
     xmlns:media="http://search.yahoo.com/mrss/">
<channel>
  <title>Example Blog</title>
  <link>https://example.com/</link>
  <description>About things</description>
  {items}
</channel>
</rss>"#
        )
    }

    fn json_with_items(items: &str) -> String {
        format!(
            r#"{{
  "version": "https://jsonfeed.org/version/1.1",
  "title": "JSON Example",
  "home_page_url": "https://example.org/",
  "icon": "https://example.org/icon.png",
  "items": [{items}]
}}"#
        )
    }

    // --- RSS ---

    #[test]
    fn test_rss_feed_fields() {
        let (feed, articles) = run(&rss_with_items(""));
        assert_eq!(feed.title, "Example Blog");
        assert_eq!(feed.url, feed_url());
        assert_eq!(feed.site_url.as_ref().map(Url::as_str), Some("https://example.com/"));
        assert_eq!(feed.description.as_deref(), Some("About things"));
        assert_eq!(feed.format, FormatKind::Rss);
        assert_eq!(feed.last_updated, fixed_now());
        assert_eq!(feed.category_id, None);
        assert_eq!(feed.sort_order, 0);
        assert!(feed.icon.is_none());
        assert!(articles.is_empty());
    }

    #[test]
    fn test_rss_prefers_encoded_content() {
        let (_, articles) = run(&rss_with_items(
            r#"<item><title>A</title><description>B</description>
               <content:encoded><![CDATA[<p>A</p>]]></content:encoded></item>"#,
        ));
        assert_eq!(articles[0].content(), Some("<p>A</p>"));
        assert_eq!(articles[0].description(), Some("B"));
    }

    #[test]
    fn test_rss_empty_encoded_falls_back_to_description() {
        let (_, articles) = run(&rss_with_items(
            r#"<item><title>A</title><description>B</description>
               <content:encoded></content:encoded></item>"#,
        ));
        assert_eq!(articles[0].content(), Some("B"));
    }

    #[test]
    fn test_rss_no_body_at_all() {
        let (_, articles) = run(&rss_with_items("<item><title>Bare</title></item>"));
        assert_eq!(articles[0].content(), None);
        assert_eq!(articles[0].description(), None);
        assert_eq!(articles[0].reading_time(), None);
    }

    #[test]
    fn test_rss_item_fields() {
        let (_, articles) = run(&rss_with_items(
            r#"<item>
                 <title> Post &amp; More </title>
                 <link>https://example.com/post/1</link>
                 <guid isPermaLink="false">post-1</guid>
                 <author>jane@example.com (Jane)</author>
                 <pubDate>Tue, 10 Jun 2003 04:00:00 GMT</pubDate>
                 <category>rust</category>
                 <category>feeds</category>
                 <description>one two three</description>
               </item>"#,
        ));
        let article = &articles[0];
        assert_eq!(article.title, "Post & More");
        assert_eq!(
            article.link.as_ref().map(Url::as_str),
            Some("https://example.com/post/1")
        );
        assert_eq!(article.guid.as_deref(), Some("post-1"));
        assert_eq!(article.author.as_deref(), Some("jane@example.com (Jane)"));
        assert_eq!(
            article.published,
            Some(Utc.with_ymd_and_hms(2003, 6, 10, 4, 0, 0).unwrap())
        );
        assert_eq!(article.tags, vec!["rust", "feeds"]);
        assert_eq!(article.reading_time(), Some(1));
        assert!(!article.read);
        assert!(!article.starred);
    }

    #[test]
    fn test_rss_dublin_core_fallbacks() {
        let (_, articles) = run(&rss_with_items(
            r#"<item><title>DC</title>
                 <dc:creator>Jane Doe</dc:creator>
                 <dc:date>2024-05-01T08:30:00Z</dc:date>
               </item>"#,
        ));
        assert_eq!(articles[0].author.as_deref(), Some("Jane Doe"));
        assert_eq!(
            articles[0].published,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_rss_permalink_guid_used_as_link() {
        let (_, articles) = run(&rss_with_items(
            r#"<item><title>P</title><guid>https://example.com/p/9</guid></item>"#,
        ));
        assert_eq!(
            articles[0].link.as_ref().map(Url::as_str),
            Some("https://example.com/p/9")
        );
        assert_eq!(articles[0].guid.as_deref(), Some("https://example.com/p/9"));
    }

    #[test]
    fn test_rss_media_content_image() {
        let (_, articles) = run(&rss_with_items(
            r#"<item><title>M</title>
                 <media:content url="https://cdn.example.com/photo.jpg" medium="image"/>
                 <description><![CDATA[<img src="https://example.com/inline.png">]]></description>
               </item>"#,
        ));
        assert_eq!(
            articles[0].image_url.as_ref().map(Url::as_str),
            Some("https://cdn.example.com/photo.jpg")
        );
    }

    #[test]
    fn test_rss_media_group_and_thumbnail() {
        let (_, articles) = run(&rss_with_items(
            r#"<item><title>G</title>
                 <media:group><media:content url="https://cdn.example.com/g.jpg" type="image/jpeg"/></media:group>
               </item>
               <item><title>T</title>
                 <media:thumbnail url="https://cdn.example.com/t.jpg"/>
               </item>"#,
        ));
        assert_eq!(
            articles[0].image_url.as_ref().map(Url::as_str),
            Some("https://cdn.example.com/g.jpg")
        );
        assert_eq!(
            articles[1].image_url.as_ref().map(Url::as_str),
            Some("https://cdn.example.com/t.jpg")
        );
    }

    #[test]
    fn test_rss_video_media_is_not_an_image() {
        let (_, articles) = run(&rss_with_items(
            r#"<item><title>V</title>
                 <media:content url="https://cdn.example.com/clip.mp4" medium="video"/>
               </item>"#,
        ));
        assert_eq!(articles[0].image_url, None);
    }

    #[test]
    fn test_rss_image_enclosure() {
        let (_, articles) = run(&rss_with_items(
            r#"<item><title>E</title>
                 <enclosure url="https://cdn.example.com/e.png" length="10" type="image/png"/>
               </item>"#,
        ));
        assert_eq!(
            articles[0].image_url.as_ref().map(Url::as_str),
            Some("https://cdn.example.com/e.png")
        );
    }

    #[test]
    fn test_rss_image_extracted_from_content() {
        let (_, articles) = run(&rss_with_items(
            r#"<item><title>I</title>
                 <link>https://example.com/posts/7/</link>
                 <content:encoded><![CDATA[<p>x</p><img src="images/a.png"><img src="/b.png">]]></content:encoded>
               </item>"#,
        ));
        // Relative to the article link, first image only
        assert_eq!(
            articles[0].image_url.as_ref().map(Url::as_str),
            Some("https://example.com/posts/7/images/a.png")
        );
    }

    #[test]
    fn test_untitled_items_are_dropped() {
        let (_, articles) = run(&rss_with_items(
            r#"<item><description>no title</description></item>
               <item><title>   </title></item>
               <item><title>Kept</title></item>"#,
        ));
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Kept");
    }

    #[test]
    fn test_missing_feed_title_uses_placeholder() {
        let payload = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><item><title>Post</title></item></channel></rss>"#;
        let (feed, _) = run(payload);
        assert_eq!(feed.title, UNTITLED_FEED);
    }

    #[test]
    fn test_feed_title_control_chars_stripped() {
        let payload = "<?xml version=\"1.0\"?>\n<rss version=\"2.0\"><channel>\
            <title>Evil\x1b[31m Feed</title>\
            <item><title>Po\x07st</title></item>\
            </channel></rss>";
        let (feed, articles) = run(payload);
        assert_eq!(feed.title, "Evil Feed");
        assert_eq!(articles[0].title, "Post");
    }

    #[test]
    fn test_category_is_copied_from_caller() {
        let (_, doc) = parse_document(rss_with_items("").as_bytes()).unwrap();
        let (feed, _) = normalize_at(&doc, &feed_url(), Some("tech"), fixed_now());
        assert_eq!(feed.category_id.as_deref(), Some("tech"));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let payload = rss_with_items(
            r#"<item><title>A</title><guid>a</guid><description>x y z</description></item>
               <item><title>B</title><link>https://example.com/b</link></item>"#,
        );
        let (_, doc) = parse_document(payload.as_bytes()).unwrap();
        let first = normalize(&doc, &feed_url(), Some("c"));
        let second = normalize(&doc, &feed_url(), Some("c"));

        let mut first_feed = first.0;
        first_feed.last_updated = second.0.last_updated;
        assert_eq!(first_feed, second.0);
        assert_eq!(first.1, second.1);
    }

    // --- Atom ---

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <subtitle>Atom subtitle</subtitle>
  <id>urn:uuid:feed</id>
  <updated>2024-01-02T00:00:00Z</updated>
  <logo>https://example.com/logo.png</logo>
  <link href="https://example.com/feed.xml" rel="self"/>
  <link href="https://example.com/" rel="alternate"/>
  <entry>
    <title>With content</title>
    <id>urn:uuid:1</id>
    <link href="https://example.com/self/1" rel="self"/>
    <link href="https://example.com/posts/1" rel="alternate"/>
    <published>2024-01-01T10:00:00Z</published>
    <updated>2024-01-01T12:00:00Z</updated>
    <author><name>Ann</name></author>
    <category term="news"/>
    <summary>Short</summary>
    <content type="html">&lt;p&gt;Long &lt;img src="/pic.png"&gt;&lt;/p&gt;</content>
  </entry>
  <entry>
    <title>Summary only</title>
    <id>urn:uuid:2</id>
    <updated>2024-01-03T09:00:00Z</updated>
    <summary>Just a summary</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_atom_feed_fields() {
        let (feed, articles) = run(ATOM);
        assert_eq!(feed.title, "Atom Example");
        assert_eq!(feed.description.as_deref(), Some("Atom subtitle"));
        assert_eq!(feed.site_url.as_ref().map(Url::as_str), Some("https://example.com/"));
        assert_eq!(
            feed.image_url.as_ref().map(Url::as_str),
            Some("https://example.com/logo.png")
        );
        assert_eq!(feed.format, FormatKind::Atom);
        assert_eq!(articles.len(), 2);
    }

    #[test]
    fn test_atom_content_priority_and_fields() {
        let (_, articles) = run(ATOM);
        let first = &articles[0];
        assert_eq!(first.content(), Some(r#"<p>Long <img src="/pic.png"></p>"#));
        assert_eq!(first.description(), Some("Short"));
        assert_eq!(
            first.link.as_ref().map(Url::as_str),
            Some("https://example.com/posts/1")
        );
        assert_eq!(first.guid.as_deref(), Some("urn:uuid:1"));
        assert_eq!(first.author.as_deref(), Some("Ann"));
        assert_eq!(first.tags, vec!["news"]);
        assert_eq!(
            first.image_url.as_ref().map(Url::as_str),
            Some("https://example.com/pic.png")
        );
        assert_eq!(
            first.published,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
        );

        let second = &articles[1];
        assert_eq!(second.content(), Some("Just a summary"));
        assert_eq!(second.link, None);
        assert_eq!(second.image_url, None);
    }

    #[test]
    fn test_atom_entry_without_dates_has_no_published() {
        let (_, articles) = run(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>T</title><id>urn:t</id>
               <entry><id>urn:e</id><title>Undated</title></entry></feed>"#,
        );
        assert_eq!(articles[0].title, "Undated");
        assert_eq!(articles[0].published, None);
    }

    #[test]
    fn test_atom_published_falls_back_to_updated() {
        let (_, articles) = run(ATOM);
        assert_eq!(
            articles[1].published,
            Some(Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap())
        );
    }

    // --- JSON Feed ---

    #[test]
    fn test_json_content_text_when_html_empty() {
        let (_, articles) = run(&json_with_items(
            r#"{"title": "T", "content_html": "", "content_text": "hello world", "summary": "S"}"#,
        ));
        assert_eq!(articles[0].content(), Some("hello world"));
        assert_eq!(articles[0].description(), Some("S"));
    }

    #[test]
    fn test_json_content_priority() {
        let (_, articles) = run(&json_with_items(
            r#"{"title": "H", "content_html": "<b>html</b>", "content_text": "text"},
               {"title": "S", "summary": "only summary"},
               {"title": "N"}"#,
        ));
        assert_eq!(articles[0].content(), Some("<b>html</b>"));
        assert_eq!(articles[1].content(), Some("only summary"));
        assert_eq!(articles[2].content(), None);
    }

    #[test]
    fn test_json_feed_and_item_fields() {
        let (feed, articles) = run(&json_with_items(
            r#"{
                "id": 17,
                "url": "https://example.org/p/17",
                "title": "Numbered",
                "content_html": "<p>Body <img src=\"https://example.org/inline.png\"></p>",
                "image": "https://example.org/hero.png",
                "date_modified": "2024-02-02T02:02:02+01:00",
                "authors": [{"name": "Bo"}],
                "tags": ["Rust", "rust", " spaced "]
            }"#,
        ));
        assert_eq!(feed.title, "JSON Example");
        assert_eq!(feed.format, FormatKind::JsonFeed);
        assert_eq!(
            feed.image_url.as_ref().map(Url::as_str),
            Some("https://example.org/icon.png")
        );

        let article = &articles[0];
        assert_eq!(article.guid.as_deref(), Some("17"));
        assert_eq!(
            article.link.as_ref().map(Url::as_str),
            Some("https://example.org/p/17")
        );
        assert_eq!(
            article.image_url.as_ref().map(Url::as_str),
            Some("https://example.org/hero.png")
        );
        assert_eq!(article.author.as_deref(), Some("Bo"));
        // Tags are copied verbatim
        assert_eq!(article.tags, vec!["Rust", "rust", " spaced "]);
        assert_eq!(
            article.published,
            Some(Utc.with_ymd_and_hms(2024, 2, 2, 1, 2, 2).unwrap())
        );
    }

    #[test]
    fn test_json_image_from_content_when_no_explicit_image() {
        let (_, articles) = run(&json_with_items(
            r#"{"title": "I", "content_html": "<img src=\"https://example.org/in.png\">"}"#,
        ));
        assert_eq!(
            articles[0].image_url.as_ref().map(Url::as_str),
            Some("https://example.org/in.png")
        );
    }

    #[test]
    fn test_json_items_without_title_dropped() {
        let (_, articles) = run(&json_with_items(
            r#"{"id": "1", "content_text": "microblog post"}, {"id": "2", "title": "Titled"}"#,
        ));
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].guid.as_deref(), Some("2"));
    }

    #[test]
    fn test_json_missing_title_uses_placeholder() {
        let payload = r#"{"version": "https://jsonfeed.org/version/1", "title": "  ", "items": []}"#;
        let (feed, _) = run(payload);
        assert_eq!(feed.title, UNTITLED_FEED);
    }

    // Image extraction looks at the first <img src> only. Later candidates,
    // srcset and lazy-loading attributes are out of scope.
    #[test]
    fn test_image_extraction_first_match_only() {
        let (_, articles) = run(&json_with_items(
            r#"{"title": "Many", "content_html": "<img src=\"https://a.example/1.png\"><img src=\"https://a.example/2.png\">"},
               {"title": "Lazy", "content_html": "<img data-src=\"https://a.example/lazy.png\" srcset=\"https://a.example/x.png 2x\">"}"#,
        ));
        assert_eq!(
            articles[0].image_url.as_ref().map(Url::as_str),
            Some("https://a.example/1.png")
        );
        assert_eq!(articles[1].image_url, None);
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("Mon, 02 Jan 2006 15:04:05 -0700").is_some());
        assert!(parse_date(" 2006-01-02T15:04:05Z ").is_some());
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn test_parse_date_zoneless_layouts_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
        assert_eq!(parse_date("2024-01-05 10:00:00"), Some(expected));
        assert_eq!(parse_date("2024-01-05T10:00:00"), Some(expected));
        assert_eq!(parse_date("2024-01-05 10:00"), Some(expected));
        assert_eq!(
            parse_date("2024-01-05"),
            Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_date("2024-13-45 10:00:00"), None);
    }

    #[test]
    fn test_rss_zoneless_pub_date() {
        let (_, articles) = run(&rss_with_items(
            "<item><title>A</title><pubDate>2024-01-05 10:00:00</pubDate></item>",
        ));
        assert_eq!(
            articles[0].published,
            Some(Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap())
        );
    }
}
