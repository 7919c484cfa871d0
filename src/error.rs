use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::search::keywords::KeywordError;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Keyword pattern error: {0}")]
    Keyword(#[from] KeywordError),

    #[error("Failed to load library '{path}': {source}")]
    Library {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("An unexpected error occurred: {0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_error_converts() {
        let err: SearchError = KeywordError::Empty.into();
        assert!(matches!(err, SearchError::Keyword(KeywordError::Empty)));
        assert!(err.to_string().starts_with("Keyword pattern error"));
    }
}
