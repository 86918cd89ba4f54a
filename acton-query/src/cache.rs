//! Memoizing parser
//!
//! [`CachedQueryParser`] remembers descriptors by raw query string and schema
//! fingerprint, so repeated requests for the same listing skip parsing. The
//! map is a [`DashMap`] and can be shared across threads.
//!
//! # Example
//!
//! ```rust
//! use acton_query::prelude::*;
//!
//! let cache = CachedQueryParser::new(QueryParser::default(), 128);
//! let schema = ResourceSchema::new()
//!     .with_field("age", FieldSchema::new(FieldType::Number).filterable())
//!     .resolve();
//!
//! let first = cache.parse("age[gt]=18", &schema).unwrap();
//! let second = cache.parse("age[gt]=18", &schema).unwrap();
//! assert_eq!(first, second);
//! assert_eq!(cache.len(), 1);
//! ```

use dashmap::DashMap;

use crate::config::Config;
use crate::descriptor::QueryDescriptor;
use crate::error::Result;
use crate::params::QueryParams;
use crate::parser::QueryParser;
use crate::schema::ResolvedSchema;

/// Default number of cached descriptors
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    schema: blake3::Hash,
}

/// Bounded, thread-safe cache in front of a [`QueryParser`]
///
/// Validation failures are never stored. When the cache is full an
/// arbitrary entry is evicted before inserting; under concurrent inserts the
/// bound may be exceeded briefly. A capacity of zero disables caching.
#[derive(Debug)]
pub struct CachedQueryParser {
    parser: QueryParser,
    entries: DashMap<CacheKey, QueryDescriptor>,
    capacity: usize,
}

impl CachedQueryParser {
    pub fn new(parser: QueryParser, capacity: usize) -> Self {
        Self {
            parser,
            entries: DashMap::with_capacity(capacity.min(DEFAULT_CACHE_CAPACITY)),
            capacity,
        }
    }

    /// Build from the `parser` and `cache` sections of a configuration
    ///
    /// A disabled cache gets capacity zero.
    pub fn from_config(config: &Config) -> Self {
        let capacity = if config.cache.enabled {
            config.cache.capacity
        } else {
            0
        };
        Self::new(QueryParser::from_config(config), capacity)
    }

    /// Parse `raw`, reusing a previous descriptor for the same query and schema
    pub fn parse(&self, raw: &str, schema: &ResolvedSchema) -> Result<QueryDescriptor> {
        if self.capacity == 0 {
            return self.parser.parse_resolved(&QueryParams::parse(raw), schema);
        }

        let key = CacheKey {
            query: raw.to_string(),
            schema: schema.fingerprint(),
        };

        if let Some(hit) = self.entries.get(&key) {
            tracing::trace!(query = raw, "Query descriptor cache hit");
            return Ok(hit.value().clone());
        }

        let descriptor = self.parser.parse_resolved(&QueryParams::parse(raw), schema)?;

        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_one();
        }
        self.entries.insert(key, descriptor.clone());

        Ok(descriptor)
    }

    fn evict_one(&self) {
        let victim = self.entries.iter().next().map(|entry| entry.key().clone());
        if let Some(victim) = victim {
            self.entries.remove(&victim);
            tracing::trace!(query = %victim.query, "Evicted query descriptor");
        }
    }

    pub fn parser(&self) -> &QueryParser {
        &self.parser
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for CachedQueryParser {
    fn default() -> Self {
        Self::new(QueryParser::default(), DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, FieldType, ResourceSchema};

    fn schema() -> ResolvedSchema {
        ResourceSchema::new()
            .with_field("age", FieldSchema::new(FieldType::Number).filterable())
            .resolve()
    }

    #[test]
    fn test_cache_hit_returns_equal_descriptor() {
        let cache = CachedQueryParser::default();
        let first = cache.parse("age=3", &schema()).unwrap();
        let second = cache.parse("age=3", &schema()).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_schema_is_part_of_key() {
        let cache = CachedQueryParser::default();
        let other = ResourceSchema::new().with_default_limit(5).resolve();

        let first = cache.parse("age=3", &schema()).unwrap();
        let second = cache.parse("age=3", &other).unwrap();
        assert!(first.has_filters());
        assert!(!second.has_filters());
        assert_eq!(second.pagination.limit, 5);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failures_not_cached() {
        let cache = CachedQueryParser::default();
        assert!(cache.parse("age=abc", &schema()).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_bound() {
        let cache = CachedQueryParser::new(QueryParser::default(), 2);
        for page in 1..=5 {
            cache.parse(&format!("page={page}"), &schema()).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = CachedQueryParser::new(QueryParser::default(), 0);
        let descriptor = cache.parse("page=3", &schema()).unwrap();
        assert_eq!(descriptor.pagination.page, 3);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = CachedQueryParser::default();
        cache.parse("page=2", &schema()).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_from_config_disabled() {
        let mut config = Config::default();
        config.cache.enabled = false;
        assert_eq!(CachedQueryParser::from_config(&config).capacity(), 0);
    }
}
