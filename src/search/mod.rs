//! Search pipeline: keyword parsing, matching, scanning and result collection
pub mod cache;
pub mod engine;
pub mod item;
pub mod keywords;
pub mod matcher;
pub mod result;

pub use engine::{EngineOptions, SearchEngine};
pub use item::{ResultItem, ResultItemType, ResultObject};
pub use matcher::{is_complex_search_pattern, SearchMatcher};
pub use result::{SearchResult, SearchResultListener};
