pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod library;
pub mod list_model;
pub mod metrics;
pub mod model;
pub mod output;
pub mod search;

pub use crate::error::{Result, SearchError};
pub use clap::Parser;
pub use cli::{Cli, Commands, OutputFormat};
pub use dispatch::{ChannelListener, Debouncer, ModelFeeder, SearchEvent};
pub use library::{load_library, parse_library};
pub use list_model::{DateRange, GroupBy, ResultGroup, ResultsListModel, ResultsListModelListener};
pub use metrics::SearchMetrics;
pub use model::{Article, Feed, FeedContent, FeedKind, Guide, GuidesSet};
pub use search::{
    is_complex_search_pattern, EngineOptions, ResultItem, ResultItemType, ResultObject,
    SearchEngine, SearchMatcher, SearchResult, SearchResultListener,
};
