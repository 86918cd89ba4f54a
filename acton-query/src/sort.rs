//! Sort parsing
//!
//! `sort` is a comma-separated list of field names, each optionally prefixed
//! with `-` for descending order. Only known, sortable fields are kept.
//!
//! # Example
//!
//! ```rust
//! use acton_query::params::QueryParams;
//! use acton_query::parser::ParseOptions;
//! use acton_query::schema::{FieldSchema, FieldType, ResourceSchema};
//! use acton_query::sort::{parse_sorting, SortOrder};
//!
//! let schema = ResourceSchema::new()
//!     .with_field("name", FieldSchema::new(FieldType::String).sortable())
//!     .with_field("age", FieldSchema::new(FieldType::Number).sortable())
//!     .resolve();
//!
//! let sort = parse_sorting(&QueryParams::parse("sort=name,-age"), &schema, &ParseOptions::default());
//! assert_eq!(sort["name"], SortOrder::Asc);
//! assert_eq!(sort["age"], SortOrder::Desc);
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::params::QueryParams;
use crate::parser::ParseOptions;
use crate::schema::ResolvedSchema;

/// Sort direction
///
/// # Example
///
/// ```rust
/// use acton_query::sort::SortOrder;
///
/// assert_eq!(format!("{}", SortOrder::Asc), "asc");
/// assert_eq!(SortOrder::default(), SortOrder::Asc);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Sort in ascending order (A-Z, 0-9, oldest first)
    #[default]
    Asc,
    /// Sort in descending order (Z-A, 9-0, newest first)
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

/// Sort directions by field, in priority order
///
/// Equality ignores entry order.
pub type SortMap = IndexMap<String, SortOrder>;

/// Derive the sort order of a query
///
/// Later mentions of a field overwrite earlier ones. When nothing usable
/// remains and `options.default_sort_fallback` is set, the schema's default
/// sort is returned instead, limited to fields that are sortable.
pub fn parse_sorting(query: &QueryParams, schema: &ResolvedSchema, options: &ParseOptions) -> SortMap {
    let mut sort = SortMap::new();

    if let Some(raw) = query.get("sort") {
        for token in raw.split(',').map(str::trim).filter(|token| !token.is_empty()) {
            let (field, order) = match token.strip_prefix('-') {
                Some(field) => (field, SortOrder::Desc),
                None => (token, SortOrder::Asc),
            };

            if schema.is_sortable(field) {
                sort.insert(field.to_string(), order);
            } else {
                tracing::debug!(field, "Ignoring sort on unknown or non-sortable field");
            }
        }
    }

    if sort.is_empty() && options.default_sort_fallback {
        return schema
            .default_sort
            .iter()
            .filter(|(field, _)| schema.is_sortable(field))
            .map(|(field, order)| (field.clone(), *order))
            .collect();
    }

    sort
}
