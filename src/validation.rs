// Validation layer: contract enforcement at the Core Facade boundary, before any Store
// access.

use crate::errors::CoreError;
use std::collections::HashMap;

/// Validation context for attaching attributes to an error message, mirroring the
/// teacher's `ValidationContext` in shape (operation name + key/value attributes) but
/// returning the crate's own `CoreError::InvalidInput` instead of a generic anyhow bail.
#[derive(Clone)]
pub struct ValidationContext {
    operation: String,
    attributes: HashMap<String, String>,
}

impl ValidationContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn require(self, condition: bool, field: &str, reason: &str) -> Result<(), CoreError> {
        if condition {
            return Ok(());
        }
        tracing::debug!(
            operation = %self.operation,
            attributes = ?self.attributes,
            field,
            reason,
            "validation failed"
        );
        Err(CoreError::invalid(field, reason))
    }
}

pub const MIN_SEARCH_LIMIT: usize = 1;
pub const MAX_SEARCH_LIMIT: usize = 50;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
pub const DEFAULT_BROWSE_LIMIT: usize = 20;

/// §8 boundary behavior: "limit clamped to [1, 50] for search; rejected otherwise with
/// InvalidInput". We reject rather than silently clamp so a caller passing e.g. 0 or 500
/// finds out immediately.
pub fn validate_search_limit(limit: usize) -> Result<usize, CoreError> {
    ValidationContext::new("validate_search_limit")
        .with_attribute("limit", limit.to_string())
        .require(
            (MIN_SEARCH_LIMIT..=MAX_SEARCH_LIMIT).contains(&limit),
            "limit",
            &format!("must be between {MIN_SEARCH_LIMIT} and {MAX_SEARCH_LIMIT}"),
        )?;
    Ok(limit)
}

pub fn validate_key(key: &str) -> Result<&str, CoreError> {
    ValidationContext::new("validate_key").require(
        !key.trim().is_empty(),
        "key",
        "must be a non-empty server id or slug",
    )?;
    Ok(key)
}

pub fn validate_category(category: &str) -> Result<&str, CoreError> {
    ValidationContext::new("validate_category")
        .with_attribute("category", category.to_string())
        .require(
            crate::types::TAXONOMY_NAMES.contains(&category),
            "category",
            "not part of the closed taxonomy",
        )?;
    Ok(category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_inside_range_is_accepted() {
        assert_eq!(validate_search_limit(1).unwrap(), 1);
        assert_eq!(validate_search_limit(50).unwrap(), 50);
    }

    #[test]
    fn limit_outside_range_is_rejected() {
        assert!(validate_search_limit(0).is_err());
        assert!(validate_search_limit(51).is_err());
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(validate_category("not-a-category").is_err());
        assert!(validate_category("database").is_ok());
    }
}
