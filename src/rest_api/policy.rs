//! # Collection Policy
//!
//! Decides which collection names clients may address.

use std::collections::HashSet;

use super::errors::{RestError, RestResult};

/// Longest accepted collection name, in bytes
pub const MAX_COLLECTION_NAME_LEN: usize = 120;

/// Naming convention plus optional allow-list
#[derive(Debug, Clone, Default)]
pub struct CollectionPolicy {
    /// When set, only these names are served
    allowed: Option<HashSet<String>>,
}

impl CollectionPolicy {
    /// Accept any name that follows the naming convention
    pub fn open() -> Self {
        Self::default()
    }

    /// Accept only the listed names. An empty list means [`CollectionPolicy::open`].
    pub fn allow_list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: HashSet<String> = names.into_iter().map(Into::into).collect();
        Self {
            allowed: (!allowed.is_empty()).then_some(allowed),
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.allowed.is_some()
    }

    /// Validate a collection name
    pub fn check(&self, name: &str) -> RestResult<()> {
        if !follows_convention(name) {
            return Err(RestError::InvalidCollectionName(name.to_string()));
        }

        match &self.allowed {
            Some(allowed) if !allowed.contains(name) => {
                Err(RestError::CollectionNotFound(name.to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn follows_convention(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_COLLECTION_NAME_LEN
        && !name.starts_with('.')
        && !name.starts_with("system.")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
