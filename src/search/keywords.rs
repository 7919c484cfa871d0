//! Keyword mini-language compiled to case-insensitive regular expressions
//!
//! Grammar, tokens separated by whitespace:
//! - `"some phrase"` matches the words in sequence (an unterminated quote runs to the end)
//! - `+word` marks the token as required
//! - `*` inside a token stands for any run of non-whitespace characters
//!
//! When required tokens are present every one of them must match; otherwise
//! any single token is enough.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeywordError {
    #[error("query has no usable keywords")]
    Empty,

    #[error("failed to compile keyword pattern: {0}")]
    Compile(String),
}

/// One parsed keyword or phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub text: String,
    pub required: bool,
    pub phrase: bool,
}

/// Compiled form of a keyword query.
#[derive(Debug, Clone)]
pub struct KeywordQuery {
    required: Vec<Regex>,
    any: Option<Regex>,
}

impl KeywordQuery {
    pub fn is_match(&self, text: &str) -> bool {
        if !self.required.is_empty() {
            return self.required.iter().all(|re| re.is_match(text));
        }
        self.any.as_ref().is_some_and(|re| re.is_match(text))
    }

    pub fn required_count(&self) -> usize {
        self.required.len()
    }
}

/// Splits the raw query into keywords. Empty tokens (a lone `+`, `""`) are dropped.
pub fn parse_keywords(input: &str) -> Vec<Keyword> {
    let mut keywords = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut required = false;
        if c == '+' {
            required = true;
            chars.next();
        }

        let mut text = String::new();
        let phrase = chars.peek() == Some(&'"');
        if phrase {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '"' {
                    break;
                }
                text.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || ch == '"' {
                    break;
                }
                text.push(ch);
                chars.next();
            }
        }

        let text = text.trim().to_string();
        if !text.is_empty() && text.chars().any(|ch| ch != '*') {
            keywords.push(Keyword {
                text,
                required,
                phrase,
            });
        }
    }

    keywords
}

/// Regex source for a single keyword, without case flags.
pub fn keyword_to_regex(keyword: &Keyword) -> String {
    let mut body = String::new();
    let mut in_space = false;
    for ch in keyword.text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                body.push_str(r"\s+");
                in_space = true;
            }
            continue;
        }
        in_space = false;
        if ch == '*' {
            body.push_str(r"\S*");
        } else {
            body.push_str(&regex::escape(ch.encode_utf8(&mut [0; 4])));
        }
    }

    let starts_word = keyword
        .text
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_');
    let ends_word = keyword
        .text
        .chars()
        .last()
        .is_some_and(|c| c.is_alphanumeric() || c == '_');

    let mut source = String::with_capacity(body.len() + 4);
    if starts_word {
        source.push_str(r"\b");
    }
    source.push_str(&body);
    if ends_word {
        source.push_str(r"\b");
    }
    source
}

/// Compiles keyword syntax into a [`KeywordQuery`].
pub fn keywords_to_pattern(input: &str, size_limit: usize) -> Result<KeywordQuery, KeywordError> {
    let keywords = parse_keywords(input);
    if keywords.is_empty() {
        return Err(KeywordError::Empty);
    }

    let compile = |source: &str| {
        RegexBuilder::new(source)
            .case_insensitive(true)
            .size_limit(size_limit)
            .build()
            .map_err(|e| KeywordError::Compile(e.to_string()))
    };

    let mut required = Vec::new();
    let mut optional = Vec::new();
    for keyword in &keywords {
        let source = keyword_to_regex(keyword);
        if keyword.required {
            required.push(compile(&source)?);
        } else {
            optional.push(format!("(?:{source})"));
        }
    }

    let any = if required.is_empty() && !optional.is_empty() {
        Some(compile(&optional.join("|"))?)
    } else {
        None
    };

    Ok(KeywordQuery { required, any })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 1 << 20;

    #[test]
    fn test_parse_mixed_tokens() {
        let keywords = parse_keywords(r#"word* +required "some phrase""#);
        assert_eq!(keywords.len(), 3);
        assert_eq!(keywords[0].text, "word*");
        assert!(!keywords[0].required);
        assert!(keywords[1].required);
        assert_eq!(keywords[1].text, "required");
        assert!(keywords[2].phrase);
        assert_eq!(keywords[2].text, "some phrase");
    }

    #[test]
    fn test_parse_drops_empty_tokens() {
        assert!(parse_keywords(r#"+ "" *"#).is_empty());
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        let keywords = parse_keywords(r#""storm warning"#);
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].text, "storm warning");
    }

    #[test]
    fn test_wildcard_matches_word_tail() {
        let query = keywords_to_pattern("hel*o", LIMIT).unwrap();
        assert!(query.is_match("well HELLO there"));
        assert!(query.is_match("helo"));
        assert!(!query.is_match("help"));
    }

    #[test]
    fn test_required_terms_must_all_match() {
        let query = keywords_to_pattern("+storm +warning", LIMIT).unwrap();
        assert!(query.is_match("Storm warning issued"));
        assert!(!query.is_match("Storm passed"));
        assert_eq!(query.required_count(), 2);
    }

    #[test]
    fn test_optional_terms_ignored_when_required_present() {
        let query = keywords_to_pattern("rain +storm", LIMIT).unwrap();
        assert!(query.is_match("storm ahead"));
        assert!(!query.is_match("rain ahead"));
    }

    #[test]
    fn test_phrase_matches_words_in_sequence() {
        let query = keywords_to_pattern(r#""storm   warning""#, LIMIT).unwrap();
        assert!(query.is_match("A storm\nwarning was issued"));
        assert!(!query.is_match("warning: storm"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let query = keywords_to_pattern(r#""c++ (draft)""#, LIMIT).unwrap();
        assert!(query.is_match("notes on C++ (draft) syntax"));
        assert!(!query.is_match("notes on c draft"));
    }

    #[test]
    fn test_empty_query_is_error() {
        assert_eq!(keywords_to_pattern("+", LIMIT).unwrap_err(), KeywordError::Empty);
        assert_eq!(keywords_to_pattern("\"\"", LIMIT).unwrap_err(), KeywordError::Empty);
    }

    #[test]
    fn test_tiny_size_limit_fails_to_compile() {
        let err = keywords_to_pattern("+*longer*wildcard*term*", 8).unwrap_err();
        assert!(matches!(err, KeywordError::Compile(_)));
    }
}
