//! The structured result of parsing a query string

use serde::Serialize;

use crate::filter::{FieldFilter, FilterMap, FilterOperand, FilterOperator};
use crate::includes::IncludeMap;
use crate::pagination::Pagination;
use crate::sort::SortMap;

/// Validated pagination, filters, sort order, and includes of one request
///
/// This is what a data-access layer turns into a concrete query.
///
/// # Example
///
/// ```rust
/// use acton_query::prelude::*;
///
/// let schema = ResourceSchema::new()
///     .with_field("age", FieldSchema::new(FieldType::Number).filterable().sortable());
///
/// let descriptor = parse_query("age[ge]=21&sort=-age&limit=10", &schema).unwrap();
/// assert!(descriptor.has_filters());
/// assert_eq!(descriptor.sort["age"], SortOrder::Desc);
/// assert_eq!(descriptor.pagination.limit, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    /// Page window
    pub pagination: Pagination,

    /// Filter conditions by field
    ///
    /// `None` when no condition matched, unless the parser was configured
    /// to keep an empty map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterMap>,

    /// Sort directions in priority order
    pub sort: SortMap,

    /// Relations to load with each row
    pub includes: IncludeMap,
}

impl QueryDescriptor {
    /// Whether at least one filter condition is present
    pub fn has_filters(&self) -> bool {
        self.filter.as_ref().is_some_and(|filter| !filter.is_empty())
    }

    pub fn has_sort(&self) -> bool {
        !self.sort.is_empty()
    }

    pub fn has_includes(&self) -> bool {
        !self.includes.is_empty()
    }

    /// Conditions on `field`, if any
    pub fn filters_for(&self, field: &str) -> Option<&FieldFilter> {
        self.filter.as_ref()?.get(field)
    }

    /// Operand of a single condition
    pub fn filter_value(&self, field: &str, operator: FilterOperator) -> Option<&FilterOperand> {
        self.filters_for(field)?.get(&operator)
    }
}
