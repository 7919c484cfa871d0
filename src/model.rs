//! In-memory guide → feed → article graph the search core reads from
//!
//! The graph is owned by the application; the search engine never mutates it.
//! Containers sit behind `RwLock`s so the domain side can keep appending
//! articles while a scan is running, and [`GuidesSet::snapshot`] hands the
//! scanner a copy that stays consistent for the whole pass.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Kind of content a feed carries. Image feeds turn article matches into pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedContent {
    #[default]
    Mixed,
    Text,
    Image,
}

/// How a feed gets its articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// Subscribed source holding its own articles.
    #[default]
    Direct,
    /// Synthetic feed built from a filter over other feeds.
    Query,
    /// Saved search.
    Search,
}

impl FeedKind {
    /// Only direct feeds own articles; synthetic feeds would duplicate them.
    pub fn holds_articles(&self) -> bool {
        matches!(self, FeedKind::Direct)
    }
}

#[derive(Debug)]
pub struct Article {
    title: String,
    text: String,
    link: Option<String>,
    published: Option<DateTime<Utc>>,
    pinned: AtomicBool,
}

impl Article {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            link: None,
            published: None,
            pinned: AtomicBool::new(false),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self
    }

    pub fn with_pinned(self, pinned: bool) -> Self {
        self.pinned.store(pinned, Ordering::Relaxed);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Raw HTML body.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.published
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.load(Ordering::Relaxed)
    }

    pub fn set_pinned(&self, pinned: bool) {
        self.pinned.store(pinned, Ordering::Relaxed);
    }

    /// Body rendered to plain text: tags dropped, entities decoded, whitespace collapsed.
    pub fn plain_text(&self) -> String {
        html_to_plain_text(&self.text)
    }
}

#[derive(Debug)]
pub struct Feed {
    title: String,
    kind: FeedKind,
    content: FeedContent,
    site_url: Option<String>,
    last_updated: RwLock<Option<DateTime<Utc>>>,
    articles: RwLock<Vec<Arc<Article>>>,
}

impl Feed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: FeedKind::Direct,
            content: FeedContent::Mixed,
            site_url: None,
            last_updated: RwLock::new(None),
            articles: RwLock::new(Vec::new()),
        }
    }

    pub fn with_kind(mut self, kind: FeedKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_content(mut self, content: FeedContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = Some(url.into());
        self
    }

    pub fn with_last_updated(self, when: DateTime<Utc>) -> Self {
        *self.last_updated.write() = Some(when);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    pub fn content(&self) -> FeedContent {
        self.content
    }

    pub fn site_url(&self) -> Option<&str> {
        self.site_url.as_deref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        *self.last_updated.read()
    }

    pub fn set_last_updated(&self, when: Option<DateTime<Utc>>) {
        *self.last_updated.write() = when;
    }

    pub fn add_article(&self, article: Arc<Article>) {
        self.articles.write().push(article);
    }

    /// Removes the article by identity; returns whether it was present.
    pub fn remove_article(&self, article: &Arc<Article>) -> bool {
        let mut articles = self.articles.write();
        let before = articles.len();
        articles.retain(|a| !Arc::ptr_eq(a, article));
        articles.len() != before
    }

    /// Copy of the current article list.
    pub fn articles(&self) -> Vec<Arc<Article>> {
        self.articles.read().clone()
    }

    pub fn article_count(&self) -> usize {
        self.articles.read().len()
    }
}

#[derive(Debug)]
pub struct Guide {
    title: String,
    feeds: RwLock<Vec<Arc<Feed>>>,
}

impl Guide {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            feeds: RwLock::new(Vec::new()),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn add_feed(&self, feed: Arc<Feed>) {
        self.feeds.write().push(feed);
    }

    pub fn remove_feed(&self, feed: &Arc<Feed>) -> bool {
        let mut feeds = self.feeds.write();
        let before = feeds.len();
        feeds.retain(|f| !Arc::ptr_eq(f, feed));
        feeds.len() != before
    }

    pub fn feeds(&self) -> Vec<Arc<Feed>> {
        self.feeds.read().clone()
    }
}

/// Root of the domain graph.
#[derive(Debug, Default)]
pub struct GuidesSet {
    guides: RwLock<Vec<Arc<Guide>>>,
}

impl GuidesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_guide(&self, guide: Arc<Guide>) {
        self.guides.write().push(guide);
    }

    pub fn remove_guide(&self, guide: &Arc<Guide>) -> bool {
        let mut guides = self.guides.write();
        let before = guides.len();
        guides.retain(|g| !Arc::ptr_eq(g, guide));
        guides.len() != before
    }

    pub fn guides(&self) -> Vec<Arc<Guide>> {
        self.guides.read().clone()
    }

    /// Distinct feeds across all guides, in guide order then feed order.
    pub fn feeds(&self) -> Vec<Arc<Feed>> {
        let mut seen = HashSet::new();
        let mut feeds = Vec::new();
        for guide in self.guides.read().iter() {
            for feed in guide.feeds() {
                if seen.insert(Arc::as_ptr(&feed)) {
                    feeds.push(feed);
                }
            }
        }
        feeds
    }

    /// Copies the graph as it is right now.
    pub fn snapshot(&self) -> GraphSnapshot {
        let guides = self.guides();
        let feeds = self
            .feeds()
            .into_iter()
            .map(|feed| {
                let articles = if feed.kind().holds_articles() {
                    feed.articles()
                } else {
                    Vec::new()
                };
                (feed, articles)
            })
            .collect();
        GraphSnapshot { guides, feeds }
    }
}

/// Immutable view of the graph used for one scan.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    pub guides: Vec<Arc<Guide>>,
    /// Feeds in flat order, each paired with its articles at snapshot time.
    pub feeds: Vec<(Arc<Feed>, Vec<Arc<Article>>)>,
}

impl GraphSnapshot {
    pub fn article_count(&self) -> usize {
        self.feeds.iter().map(|(_, articles)| articles.len()).sum()
    }
}

lazy_static! {
    static ref TAG_RE: Regex =
        Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>|<[^>]*>").unwrap();
    static ref ENTITY_RE: Regex = Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap();
    static ref SPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Renders an HTML fragment to plain text for body matching.
pub fn html_to_plain_text(html: &str) -> String {
    let stripped = TAG_RE.replace_all(html, " ");
    let decoded = ENTITY_RE.replace_all(&stripped, |caps: &regex::Captures<'_>| {
        decode_entity(&caps[1]).map_or_else(|| caps[0].to_string(), |c| c.to_string())
    });
    SPACE_RE.replace_all(decoded.trim(), " ").into_owned()
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_strips_markup() {
        let html = "<p>Storm <b>warning</b> &amp; flood<br/>alert</p><script>var x = 1;</script>";
        assert_eq!(html_to_plain_text(html), "Storm warning & flood alert");
    }

    #[test]
    fn test_plain_text_keeps_unknown_entities() {
        assert_eq!(html_to_plain_text("a &bogus; b &#65;"), "a &bogus; b A");
    }

    #[test]
    fn test_feeds_are_distinct_in_first_seen_order() {
        let set = GuidesSet::new();
        let shared = Arc::new(Feed::new("Shared"));
        let only = Arc::new(Feed::new("Only"));

        let first = Arc::new(Guide::new("First"));
        first.add_feed(shared.clone());
        let second = Arc::new(Guide::new("Second"));
        second.add_feed(only.clone());
        second.add_feed(shared.clone());
        set.add_guide(first);
        set.add_guide(second);

        let titles: Vec<_> = set.feeds().iter().map(|f| f.title().to_string()).collect();
        assert_eq!(titles, vec!["Shared", "Only"]);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_mutation() {
        let set = GuidesSet::new();
        let guide = Arc::new(Guide::new("News"));
        let feed = Arc::new(Feed::new("BBC"));
        feed.add_article(Arc::new(Article::new("One", "")));
        guide.add_feed(feed.clone());
        set.add_guide(guide);

        let snapshot = set.snapshot();
        feed.add_article(Arc::new(Article::new("Two", "")));

        assert_eq!(snapshot.article_count(), 1);
        assert_eq!(feed.article_count(), 2);
    }

    #[test]
    fn test_snapshot_skips_articles_of_synthetic_feeds() {
        let set = GuidesSet::new();
        let guide = Arc::new(Guide::new("News"));
        let query = Arc::new(Feed::new("Saved").with_kind(FeedKind::Query));
        query.add_article(Arc::new(Article::new("Mirrored", "")));
        guide.add_feed(query);
        set.add_guide(guide);

        let snapshot = set.snapshot();
        assert_eq!(snapshot.feeds.len(), 1);
        assert_eq!(snapshot.article_count(), 0);
    }
}
