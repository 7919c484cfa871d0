use crate::model::{Article, Feed, FeedContent, Guide};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Classification of a matched object. Order values are stable group/sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultItemType {
    Guide,
    Feed,
    Article,
    Picture,
}

impl ResultItemType {
    pub const ALL: [ResultItemType; 4] = [
        ResultItemType::Guide,
        ResultItemType::Feed,
        ResultItemType::Article,
        ResultItemType::Picture,
    ];

    pub fn order(&self) -> u32 {
        match self {
            ResultItemType::Guide => 0,
            ResultItemType::Feed => 1,
            ResultItemType::Article => 2,
            ResultItemType::Picture => 3,
        }
    }

    pub fn from_order(order: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.order() == order)
    }

    /// Group header shown to the user
    pub fn display_name(&self) -> &'static str {
        match self {
            ResultItemType::Guide => "Guides",
            ResultItemType::Feed => "Feeds",
            ResultItemType::Article => "Articles",
            ResultItemType::Picture => "Pictures",
        }
    }

    /// Resource key of the icon drawn next to items of this type
    pub fn icon_key(&self) -> &'static str {
        match self {
            ResultItemType::Guide => "search.guide.icon",
            ResultItemType::Feed => "search.feed.icon",
            ResultItemType::Article => "search.article.icon",
            ResultItemType::Picture => "search.picture.icon",
        }
    }
}

impl fmt::Display for ResultItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A domain object found by the search.
#[derive(Debug, Clone)]
pub enum ResultObject {
    Guide(Arc<Guide>),
    Feed(Arc<Feed>),
    /// Article plus the feed it was found in.
    Article {
        article: Arc<Article>,
        feed: Arc<Feed>,
    },
}

impl ResultObject {
    fn identity(&self) -> *const () {
        match self {
            ResultObject::Guide(guide) => Arc::as_ptr(guide) as *const (),
            ResultObject::Feed(feed) => Arc::as_ptr(feed) as *const (),
            ResultObject::Article { article, .. } => Arc::as_ptr(article) as *const (),
        }
    }

    pub fn as_article(&self) -> Option<&Arc<Article>> {
        match self {
            ResultObject::Article { article, .. } => Some(article),
            _ => None,
        }
    }
}

/// One matched entity with its derived presentation attributes.
#[derive(Debug, Clone)]
pub struct ResultItem {
    object: ResultObject,
    item_type: ResultItemType,
    date: Option<DateTime<Utc>>,
    priority: bool,
}

impl ResultItem {
    pub fn new(object: ResultObject) -> Self {
        let (item_type, date, priority) = match &object {
            ResultObject::Guide(_) => (ResultItemType::Guide, None, false),
            ResultObject::Feed(feed) => (ResultItemType::Feed, feed.last_updated(), false),
            ResultObject::Article { article, feed } => {
                let item_type = if feed.content() == FeedContent::Image {
                    ResultItemType::Picture
                } else {
                    ResultItemType::Article
                };
                (item_type, article.published(), article.is_pinned())
            }
        };

        Self {
            object,
            item_type,
            date,
            priority,
        }
    }

    pub fn object(&self) -> &ResultObject {
        &self.object
    }

    pub fn item_type(&self) -> ResultItemType {
        self.item_type
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }

    /// Pinned articles are shown ahead of everything else in their group.
    pub fn is_priority(&self) -> bool {
        self.priority
    }

    pub fn title(&self) -> &str {
        match &self.object {
            ResultObject::Guide(guide) => guide.title(),
            ResultObject::Feed(feed) => feed.title(),
            ResultObject::Article { article, .. } => article.title(),
        }
    }

    /// Article link or feed site URL.
    pub fn link(&self) -> Option<&str> {
        match &self.object {
            ResultObject::Guide(_) => None,
            ResultObject::Feed(feed) => feed.site_url(),
            ResultObject::Article { article, .. } => article.link(),
        }
    }

    /// Title of the feed an article was found in.
    pub fn source(&self) -> Option<&str> {
        match &self.object {
            ResultObject::Article { feed, .. } => Some(feed.title()),
            _ => None,
        }
    }
}

impl PartialEq for ResultItem {
    fn eq(&self, other: &Self) -> bool {
        self.object.identity() == other.object.identity()
    }
}

impl Eq for ResultItem {}

impl Hash for ResultItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.object.identity().hash(state);
    }
}

impl fmt::Display for ResultItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_type_orders_are_stable() {
        let orders: Vec<u32> = ResultItemType::ALL.iter().map(|t| t.order()).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
        assert_eq!(ResultItemType::from_order(3), Some(ResultItemType::Picture));
        assert_eq!(ResultItemType::from_order(4), None);
    }

    #[test]
    fn test_article_in_image_feed_is_picture() {
        let feed = Arc::new(Feed::new("Photos").with_content(FeedContent::Image));
        let article = Arc::new(Article::new("Sunset", ""));
        let item = ResultItem::new(ResultObject::Article { article, feed });
        assert_eq!(item.item_type(), ResultItemType::Picture);
    }

    #[test]
    fn test_derived_dates_and_priority() {
        let when = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let feed = Arc::new(Feed::new("BBC").with_last_updated(when));
        let article = Arc::new(Article::new("Storm", "").with_published(when).with_pinned(true));

        let feed_item = ResultItem::new(ResultObject::Feed(feed.clone()));
        assert_eq!(feed_item.date(), Some(when));
        assert!(!feed_item.is_priority());

        let article_item = ResultItem::new(ResultObject::Article { article, feed });
        assert_eq!(article_item.date(), Some(when));
        assert!(article_item.is_priority());
        assert_eq!(article_item.source(), Some("BBC"));

        let guide_item = ResultItem::new(ResultObject::Guide(Arc::new(Guide::new("News"))));
        assert_eq!(guide_item.date(), None);
    }

    #[test]
    fn test_equality_follows_object_identity() {
        let a = Arc::new(Guide::new("Same"));
        let b = Arc::new(Guide::new("Same"));
        let first = ResultItem::new(ResultObject::Guide(a.clone()));
        assert_eq!(first, ResultItem::new(ResultObject::Guide(a)));
        assert_ne!(first, ResultItem::new(ResultObject::Guide(b)));
    }
}
