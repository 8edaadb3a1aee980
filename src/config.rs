//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::model::Arity;
use crate::{Error, Result};

/// Default number of memoized query results kept per cache.
pub const DEFAULT_MEMO_CAPACITY: usize = 256;

/// Configuration for a relation kind and the caches built around its store.
///
/// ```
/// use relstore::{Arity, StoreConfig};
///
/// let config = StoreConfig::from_json(r#"{ "memo_capacity": 16 }"#).unwrap();
/// assert_eq!(config.memo_capacity, 16);
/// assert_eq!(config.arity, Arity::Exactly(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Maximum cached query results. Zero disables memoization.
    pub memo_capacity: usize,
    /// Party count a finalized record must have.
    pub arity: Arity,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            memo_capacity: DEFAULT_MEMO_CAPACITY,
            arity: Arity::default(),
        }
    }
}

impl StoreConfig {
    pub fn with_memo_capacity(mut self, capacity: usize) -> Self {
        self.memo_capacity = capacity;
        self
    }

    pub fn with_arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.memo_capacity, DEFAULT_MEMO_CAPACITY);
        assert_eq!(config.arity, Arity::Exactly(2));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = StoreConfig::default()
            .with_memo_capacity(3)
            .with_arity(Arity::AtLeast(3));
        let json = config.to_json().unwrap();
        assert_eq!(StoreConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_arity_json_shape() {
        let config = StoreConfig::from_json(r#"{ "arity": { "kind": "at_least", "count": 4 } }"#).unwrap();
        assert_eq!(config.arity, Arity::AtLeast(4));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = StoreConfig::from_json(r#"{ "capacity": 1 }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
