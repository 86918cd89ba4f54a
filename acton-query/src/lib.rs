//! # acton-query
//!
//! Schema-driven query string interpreter for list endpoints.
//!
//! Given a raw query string and a resource schema describing which fields
//! exist, their types, and what may be done with them, it produces a
//! validated [`QueryDescriptor`]: pagination, filters with operators, sort
//! order, and relation includes. Turning the descriptor into a database
//! query is left to the caller.
//!
//! ## Features
//!
//! - **Pagination**: `page` / `limit` with default, maximum, and unlimited-fetch policy
//! - **Filters**: `field[operator]=value` with per-type coercion and operator whitelisting
//! - **Sorting**: `sort=name,-age` restricted to sortable fields, with a schema default
//! - **Includes**: `includes=author,tags` validated against declared relations
//! - **Caching**: optional bounded, thread-safe memoization of descriptors
//!
//! Only filter values can fail a parse. Unknown fields, unsupported operators,
//! and malformed pagination, sort, or include tokens are dropped.
//!
//! ## Example
//!
//! ```rust
//! use acton_query::prelude::*;
//!
//! let schema = ResourceSchema::new()
//!     .with_field("name", FieldSchema::new(FieldType::String).filterable().sortable())
//!     .with_field("age", FieldSchema::new(FieldType::Number).filterable().sortable())
//!     .with_relation("posts", RelationSchema::new("Post", ["id", "title"]))
//!     .with_max_limit(50);
//!
//! let descriptor = parse_query(
//!     "age[gt]=18&name[in]=John,Jack&sort=-age&limit=100&includes=posts",
//!     &schema,
//! )?;
//!
//! assert_eq!(descriptor.pagination.limit, 50);
//! assert_eq!(
//!     descriptor.filter_value("age", FilterOperator::Gt),
//!     Some(&FilterOperand::Single(FilterValue::Integer(18)))
//! );
//! assert_eq!(descriptor.sort["age"], SortOrder::Desc);
//! assert!(descriptor.includes.contains_key("posts"));
//! # Ok::<(), acton_query::Error>(())
//! ```

pub mod cache;
pub mod coerce;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod filter;
pub mod includes;
pub mod observability;
pub mod pagination;
pub mod params;
pub mod parser;
pub mod schema;
pub mod sort;

pub use descriptor::QueryDescriptor;
pub use error::{Error, Result, ValidationError, ValidationErrorKind};
pub use parser::{parse_params, parse_query, parse_query_with, ParseOptions, QueryParser};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::CachedQueryParser;
    pub use crate::config::{CacheConfig, Config, LoggingConfig};
    pub use crate::descriptor::QueryDescriptor;
    pub use crate::error::{Error, Result, ValidationError, ValidationErrorKind};
    pub use crate::filter::{FieldFilter, FilterMap, FilterOperand, FilterOperator, FilterValue};
    pub use crate::includes::IncludeMap;
    pub use crate::observability::init_tracing;
    pub use crate::pagination::Pagination;
    pub use crate::params::QueryParams;
    pub use crate::parser::{parse_params, parse_query, parse_query_with, ParseOptions, QueryParser};
    pub use crate::schema::{
        FieldSchema, FieldType, RelationSchema, ResolvedSchema, ResourceSchema,
    };
    pub use crate::sort::{SortMap, SortOrder};
}
