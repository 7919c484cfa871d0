//! JSON reading list loader
//!
//! ```json
//! {
//!   "feeds": [
//!     { "id": "bbc", "title": "BBC", "content": "text",
//!       "articles": [ { "title": "Storm warning issued", "pinned": false } ] }
//!   ],
//!   "guides": [ { "title": "News", "feeds": ["bbc"] } ]
//! }
//! ```
//!
//! Feeds are declared once and referenced by id, so several guides can share a feed.

use crate::error::{Result, SearchError};
use crate::model::{Article, Feed, FeedContent, FeedKind, Guide, GuidesSet};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LibraryDocument {
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
    #[serde(default)]
    pub guides: Vec<GuideEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub kind: FeedKind,
    #[serde(default)]
    pub content: FeedContent,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub articles: Vec<ArticleEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleEntry {
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GuideEntry {
    pub title: String,
    #[serde(default)]
    pub feeds: Vec<String>,
}

impl LibraryDocument {
    /// Builds the domain graph. Fails on duplicate or unknown feed ids.
    pub fn into_guides_set(self) -> std::result::Result<GuidesSet, String> {
        let mut feeds: HashMap<String, Arc<Feed>> = HashMap::new();
        for entry in self.feeds {
            let mut feed = Feed::new(entry.title)
                .with_kind(entry.kind)
                .with_content(entry.content);
            if let Some(url) = entry.site_url {
                feed = feed.with_site_url(url);
            }
            if let Some(when) = entry.last_updated {
                feed = feed.with_last_updated(when);
            }
            for article in entry.articles {
                feed.add_article(Arc::new(article.into_article()));
            }
            if feeds.insert(entry.id.clone(), Arc::new(feed)).is_some() {
                return Err(format!("duplicate feed id '{}'", entry.id));
            }
        }

        let set = GuidesSet::new();
        for entry in self.guides {
            let guide = Guide::new(entry.title);
            for id in entry.feeds {
                let feed = feeds
                    .get(&id)
                    .ok_or_else(|| format!("guide '{}' references unknown feed '{id}'", guide.title()))?;
                guide.add_feed(feed.clone());
            }
            set.add_guide(Arc::new(guide));
        }
        Ok(set)
    }
}

impl ArticleEntry {
    fn into_article(self) -> Article {
        let mut article = Article::new(self.title, self.text).with_pinned(self.pinned);
        if let Some(link) = self.link {
            article = article.with_link(link);
        }
        if let Some(published) = self.published {
            article = article.with_published(published);
        }
        article
    }
}

/// Parses a library document from JSON text.
pub fn parse_library(json: &str) -> Result<GuidesSet> {
    let document: LibraryDocument = serde_json::from_str(json)?;
    document.into_guides_set().map_err(SearchError::Other)
}

/// Loads a library document from disk.
pub fn load_library(path: &Path) -> Result<GuidesSet> {
    let library_error = |source: Box<dyn std::error::Error + Send + Sync>| SearchError::Library {
        path: path.to_path_buf(),
        source,
    };

    let content = fs::read_to_string(path).map_err(|e| library_error(Box::new(e)))?;
    let document: LibraryDocument =
        serde_json::from_str(&content).map_err(|e| library_error(Box::new(e)))?;
    let set = document
        .into_guides_set()
        .map_err(|e| library_error(e.into()))?;

    debug!(
        "Loaded {} guides and {} feeds from {}",
        set.guides().len(),
        set.feeds().len(),
        path.display()
    );
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_feeds_resolve_to_one_instance() {
        let set = parse_library(
            r#"{
                "feeds": [
                    { "id": "bbc", "title": "BBC",
                      "articles": [ { "title": "Storm warning issued", "pinned": true,
                                      "published": "2024-06-15T08:00:00Z" } ] }
                ],
                "guides": [
                    { "title": "News", "feeds": ["bbc"] },
                    { "title": "World", "feeds": ["bbc"] }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(set.guides().len(), 2);
        let feeds = set.feeds();
        assert_eq!(feeds.len(), 1);
        let articles = feeds[0].articles();
        assert!(articles[0].is_pinned());
        assert!(articles[0].published().is_some());
    }

    #[test]
    fn test_unknown_feed_id_is_rejected() {
        let err = parse_library(r#"{ "guides": [ { "title": "News", "feeds": ["nope"] } ] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("unknown feed 'nope'"));
    }

    #[test]
    fn test_duplicate_feed_id_is_rejected() {
        let err = parse_library(
            r#"{ "feeds": [ { "id": "a", "title": "A" }, { "id": "a", "title": "B" } ] }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate feed id 'a'"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_library(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
