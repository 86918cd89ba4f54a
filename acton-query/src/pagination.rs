//! Pagination parsing
//!
//! Derives page, limit, and offset from the `page` and `limit` parameters.
//! Malformed input never fails a request; it falls back to the schema's
//! defaults instead.
//!
//! # Example
//!
//! ```rust
//! use acton_query::pagination::{parse_pagination, Pagination};
//! use acton_query::params::QueryParams;
//! use acton_query::schema::ResourceSchema;
//!
//! let schema = ResourceSchema::new().with_max_limit(50).resolve();
//!
//! let pagination = parse_pagination(&QueryParams::parse("page=3&limit=20"), &schema);
//! assert_eq!(pagination, Pagination::new(3, 20));
//! assert_eq!(pagination.offset, 40);
//!
//! // Clamped to the schema's max_limit
//! let pagination = parse_pagination(&QueryParams::parse("limit=500"), &schema);
//! assert_eq!(pagination.limit, 50);
//! ```

use serde::{Deserialize, Serialize};

use crate::params::QueryParams;
use crate::schema::ResolvedSchema;

/// Page window of a listing request
///
/// A `limit` of zero means every row, in which case `page` is always 1 and
/// `offset` is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number
    pub page: u64,
    /// Rows per page, 0 for unlimited
    pub limit: u64,
    /// Rows to skip
    pub offset: u64,
}

impl Pagination {
    /// Build a window and derive its offset
    pub fn new(page: u64, limit: u64) -> Self {
        let page = page.max(1);
        Self {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }

    /// Whether every row is requested
    pub const fn is_unlimited(&self) -> bool {
        self.limit == 0
    }
}

/// Derive the page window of a query
pub fn parse_pagination(query: &QueryParams, schema: &ResolvedSchema) -> Pagination {
    let mut page = query
        .get("page")
        .and_then(parse_int)
        .filter(|page| *page >= 1)
        .map_or(1, |page| page as u64);

    let mut limit = query
        .get("limit")
        .and_then(parse_int)
        .filter(|limit| *limit >= 0)
        .map_or(schema.default_limit, |limit| limit as u64);

    if limit == 0 {
        if schema.allow_no_limit {
            page = 1;
        } else {
            limit = schema.max_limit;
        }
    }

    if limit > schema.max_limit {
        limit = schema.max_limit;
    }

    Pagination::new(page, limit)
}

/// Lenient integer parse
///
/// Surrounding whitespace is ignored and decimals truncate toward zero.
fn parse_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value.trunc() as i64)
}
