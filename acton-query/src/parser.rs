//! Query parsing entry points
//!
//! Resolves the schema once, runs the pagination, filter, sort, and include
//! stages against it, and assembles a [`QueryDescriptor`].
//!
//! # Example
//!
//! ```rust
//! use acton_query::prelude::*;
//!
//! let schema = ResourceSchema::new()
//!     .with_field("name", FieldSchema::new(FieldType::String).filterable().sortable())
//!     .with_field("age", FieldSchema::new(FieldType::Number).filterable().sortable());
//!
//! let descriptor = parse_query("name[in]=John,Jack&sort=-age&page=2", &schema).unwrap();
//! assert_eq!(descriptor.pagination.offset, 25);
//! assert_eq!(descriptor.sort["age"], SortOrder::Desc);
//!
//! // A value that does not fit the field type fails the whole parse
//! let err = parse_query("age=abc", &schema).unwrap_err();
//! assert!(err.as_validation().is_some());
//! ```

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::descriptor::QueryDescriptor;
use crate::error::Result;
use crate::filter::parse_filters;
use crate::includes::parse_includes;
use crate::pagination::parse_pagination;
use crate::params::QueryParams;
use crate::schema::{ResolvedSchema, ResourceSchema};
use crate::sort::parse_sorting;

/// Behaviour switches for parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Leave `filter` out of the descriptor when no condition matched
    #[serde(default = "default_true")]
    pub omit_empty_filter: bool,

    /// Use the schema's default sort when the query yields no usable sort
    #[serde(default = "default_true")]
    pub default_sort_fallback: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            omit_empty_filter: true,
            default_sort_fallback: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Reusable parser bound to a set of [`ParseOptions`]
///
/// # Example
///
/// ```rust
/// use acton_query::prelude::*;
///
/// let parser = QueryParser::new(ParseOptions {
///     omit_empty_filter: false,
///     ..ParseOptions::default()
/// });
/// let schema = ResourceSchema::new();
///
/// let descriptor = parser.parse("page=1", &schema).unwrap();
/// assert_eq!(descriptor.filter, Some(FilterMap::new()));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryParser {
    options: ParseOptions,
}

impl QueryParser {
    pub const fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Build from the `parser` section of a loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.parser)
    }

    pub const fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse a raw query string
    pub fn parse(&self, raw: &str, schema: &ResourceSchema) -> Result<QueryDescriptor> {
        self.parse_params(&QueryParams::parse(raw), schema)
    }

    /// Parse parameters that are already decoded
    pub fn parse_params(&self, query: &QueryParams, schema: &ResourceSchema) -> Result<QueryDescriptor> {
        self.parse_resolved(query, &schema.resolve())
    }

    /// Parse against a schema that is already resolved
    pub fn parse_resolved(&self, query: &QueryParams, schema: &ResolvedSchema) -> Result<QueryDescriptor> {
        tracing::trace!(params = query.len(), "Parsing query");

        let pagination = parse_pagination(query, schema);
        let filter = parse_filters(query, schema)?;
        let sort = parse_sorting(query, schema, &self.options);
        let includes = parse_includes(query, schema);

        let filter = if filter.is_empty() && self.options.omit_empty_filter {
            None
        } else {
            Some(filter)
        };

        Ok(QueryDescriptor {
            pagination,
            filter,
            sort,
            includes,
        })
    }
}

/// Parse a raw query string with default options
pub fn parse_query(raw: &str, schema: &ResourceSchema) -> Result<QueryDescriptor> {
    QueryParser::default().parse(raw, schema)
}

/// Parse a raw query string with explicit options
pub fn parse_query_with(
    raw: &str,
    schema: &ResourceSchema,
    options: &ParseOptions,
) -> Result<QueryDescriptor> {
    QueryParser::new(*options).parse(raw, schema)
}

/// Parse an already decoded string map
pub fn parse_params(
    query: &QueryParams,
    schema: &ResourceSchema,
    options: &ParseOptions,
) -> Result<QueryDescriptor> {
    QueryParser::new(*options).parse_params(query, schema)
}
