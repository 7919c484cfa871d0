use crate::error::SearchError;
use crate::model::{Article, Feed, Guide};
use crate::search::cache::PatternCache;
use crate::search::keywords::{keywords_to_pattern, KeywordQuery};
use log::warn;
use memchr::memmem;

/// Default compiled-size ceiling for keyword regexes.
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Trait for text matching strategies
pub trait TextMatcher: Send + Sync {
    fn is_match(&self, text: &str) -> bool;
    fn name(&self) -> &'static str;
}

/// Case-insensitive literal substring search
pub struct SimpleMatcher {
    finder: memmem::Finder<'static>,
}

impl SimpleMatcher {
    pub fn new(pattern: &str) -> Self {
        let lowered = pattern.to_lowercase();
        Self {
            finder: memmem::Finder::new(lowered.as_bytes()).into_owned(),
        }
    }
}

impl TextMatcher for SimpleMatcher {
    fn is_match(&self, text: &str) -> bool {
        self.finder.find(text.to_lowercase().as_bytes()).is_some()
    }

    fn name(&self) -> &'static str {
        "simple"
    }
}

/// Keyword-syntax search compiled to case-insensitive regexes
pub struct RegexMatcher {
    query: KeywordQuery,
}

impl RegexMatcher {
    pub fn new(query: KeywordQuery) -> Self {
        Self { query }
    }
}

impl TextMatcher for RegexMatcher {
    fn is_match(&self, text: &str) -> bool {
        self.query.is_match(text)
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

/// Stand-in for patterns that could not be built. Matches nothing.
pub struct NothingMatcher;

impl TextMatcher for NothingMatcher {
    fn is_match(&self, _text: &str) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "nothing"
    }
}

/// True when the query uses keyword syntax (quotes, wildcards or required terms).
pub fn is_complex_search_pattern(pattern: &str) -> bool {
    pattern.contains(['"', '*', '+'])
}

/// Decides whether guides, feeds and articles satisfy a query.
pub struct SearchMatcher {
    strategy: Box<dyn TextMatcher>,
    pinned_articles_only: bool,
}

impl SearchMatcher {
    pub fn new(pattern: &str, pinned_articles_only: bool) -> Self {
        Self::build(pattern, pinned_articles_only, DEFAULT_REGEX_SIZE_LIMIT, None)
    }

    /// Builds the matcher, consulting `cache` for keyword queries when given.
    pub fn build(
        pattern: &str,
        pinned_articles_only: bool,
        size_limit: usize,
        cache: Option<&PatternCache>,
    ) -> Self {
        let strategy: Box<dyn TextMatcher> = if is_complex_search_pattern(pattern) {
            let compiled = match cache {
                Some(cache) => cache.get_or_compile(pattern, size_limit),
                None => keywords_to_pattern(pattern, size_limit),
            };
            match compiled {
                Ok(query) => Box::new(RegexMatcher::new(query)),
                Err(e) => {
                    warn!("Query '{pattern}' matches nothing: {}", SearchError::from(e));
                    Box::new(NothingMatcher)
                }
            }
        } else if pattern.is_empty() {
            Box::new(NothingMatcher)
        } else {
            Box::new(SimpleMatcher::new(pattern))
        };

        Self {
            strategy,
            pinned_articles_only,
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn pinned_articles_only(&self) -> bool {
        self.pinned_articles_only
    }

    pub fn matches_guide(&self, guide: &Guide) -> bool {
        !self.pinned_articles_only && self.strategy.is_match(guide.title())
    }

    pub fn matches_feed(&self, feed: &Feed) -> bool {
        !self.pinned_articles_only && self.strategy.is_match(feed.title())
    }

    pub fn matches_article(&self, article: &Article) -> bool {
        if self.pinned_articles_only && !article.is_pinned() {
            return false;
        }
        self.strategy.is_match(article.title()) || self.strategy.is_match(&article.plain_text())
    }
}
