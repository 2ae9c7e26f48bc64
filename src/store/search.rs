//! # Search Queries
//!
//! Free-text search over a fixed set of fields. The text is matched as a
//! case-insensitive literal substring and the per-field matches are OR'd.

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::Document;

/// Fields searched when none are configured
pub const DEFAULT_SEARCH_FIELDS: [&str; 4] = ["subject", "location", "price", "spaces"];

/// A compiled search query
#[derive(Debug, Clone)]
pub struct SearchQuery {
    text: String,
    fields: Vec<String>,
    matcher: Regex,
}

impl SearchQuery {
    /// Build a query for `text` over `fields`
    pub fn new(text: impl Into<String>, fields: Vec<String>) -> StoreResult<Self> {
        let text = text.into();
        let matcher = RegexBuilder::new(&regex::escape(&text))
            .case_insensitive(true)
            .build()
            .map_err(|e| StoreError::Backend(format!("search pattern: {e}")))?;

        Ok(Self {
            text,
            fields,
            matcher,
        })
    }

    /// Build a query over [`DEFAULT_SEARCH_FIELDS`]
    pub fn with_default_fields(text: impl Into<String>) -> StoreResult<Self> {
        Self::new(
            text,
            DEFAULT_SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
        )
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// An empty text matches every document
    pub fn matches_everything(&self) -> bool {
        self.text.is_empty()
    }

    /// Escaped pattern for backends that evaluate the regex themselves
    pub fn pattern(&self) -> String {
        regex::escape(&self.text)
    }

    /// Check a document against the query
    pub fn matches(&self, doc: &Document) -> bool {
        if self.matches_everything() {
            return true;
        }

        self.fields
            .iter()
            .filter_map(|field| doc.get(field))
            .any(|value| self.value_matches(value))
    }

    fn value_matches(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => self.matcher.is_match(s),
            Value::Array(items) => items
                .iter()
                .any(|item| item.as_str().is_some_and(|s| self.matcher.is_match(s))),
            _ => false,
        }
    }
}
