//! Filter parsing
//!
//! Every query key that is not reserved (`page`, `limit`, `sort`,
//! `includes`) is a filter candidate of the form `field` or
//! `field[operator]`. Candidates naming an unknown or non-filterable field,
//! or an operator the field does not accept, are dropped. Values of accepted
//! candidates are coerced to the field type, and a value that does not fit
//! fails the whole parse.
//!
//! # Example
//!
//! ```rust
//! use acton_query::filter::{parse_filters, FilterOperand, FilterOperator, FilterValue};
//! use acton_query::params::QueryParams;
//! use acton_query::schema::{FieldSchema, FieldType, ResourceSchema};
//!
//! let schema = ResourceSchema::new()
//!     .with_field("age", FieldSchema::new(FieldType::Number).filterable())
//!     .resolve();
//! let query = QueryParams::parse("age[gt]=18&secret=1");
//!
//! let filter = parse_filters(&query, &schema).unwrap();
//! assert_eq!(
//!     filter["age"][&FilterOperator::Gt],
//!     FilterOperand::Single(FilterValue::Integer(18))
//! );
//! assert!(!filter.contains_key("secret"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::coerce::coerce;
use crate::error::ValidationError;
use crate::params::QueryParams;
use crate::schema::{FieldType, ResolvedSchema};

/// Query keys that never name a filter
pub const RESERVED_KEYS: [&str; 4] = ["sort", "page", "limit", "includes"];

/// `field` or `field[operator]`
static FILTER_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)(?:\[(.+)\])?$").expect("filter key regex is valid"));

const NUMBER_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Eq,
    FilterOperator::Ne,
    FilterOperator::Gt,
    FilterOperator::Ge,
    FilterOperator::Lt,
    FilterOperator::Le,
    FilterOperator::In,
    FilterOperator::Nin,
];

const STRING_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Eq,
    FilterOperator::Ne,
    FilterOperator::Match,
    FilterOperator::In,
    FilterOperator::Nin,
];

const ENUM_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Eq,
    FilterOperator::Ne,
    FilterOperator::In,
    FilterOperator::Nin,
];

const BOOLEAN_OPERATORS: &[FilterOperator] = &[FilterOperator::Eq, FilterOperator::Ne];

const TEMPORAL_OPERATORS: &[FilterOperator] = &[
    FilterOperator::Eq,
    FilterOperator::Ne,
    FilterOperator::Gt,
    FilterOperator::Ge,
    FilterOperator::Lt,
    FilterOperator::Le,
];

/// Operators accepted for a field type when the field has no explicit list
pub const fn default_operators(field_type: FieldType) -> &'static [FilterOperator] {
    match field_type {
        FieldType::Number => NUMBER_OPERATORS,
        FieldType::String => STRING_OPERATORS,
        FieldType::Enum => ENUM_OPERATORS,
        FieldType::Boolean => BOOLEAN_OPERATORS,
        FieldType::Date | FieldType::Unix => TEMPORAL_OPERATORS,
    }
}

/// Comparison operators for filter conditions
///
/// # Example
///
/// ```rust
/// use acton_query::filter::FilterOperator;
///
/// assert_eq!(FilterOperator::from_name("ge"), Some(FilterOperator::Ge));
/// assert_eq!(FilterOperator::from_name("gte"), None);
/// assert!(FilterOperator::Nin.takes_list());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equal to
    Eq,
    /// Not equal to
    Ne,
    /// Greater than
    Gt,
    /// Greater than or equal to
    Ge,
    /// Less than
    Lt,
    /// Less than or equal to
    Le,
    /// Value is in a list
    In,
    /// Value is not in a list
    Nin,
    /// Pattern matching
    Match,
}

impl FilterOperator {
    /// Every operator, in declaration order
    pub const ALL: [FilterOperator; 9] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Ge,
        Self::Lt,
        Self::Le,
        Self::In,
        Self::Nin,
        Self::Match,
    ];

    /// Look up an operator by its query-string name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|operator| operator.as_str() == name)
    }

    /// Query-string name of the operator
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Match => "match",
        }
    }

    /// Whether the operator takes a comma-separated list of values
    #[must_use]
    pub const fn takes_list(&self) -> bool {
        matches!(self, Self::In | Self::Nin)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coerced filter value
///
/// Numbers without a fractional part become [`FilterValue::Integer`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// String value
    String(String),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// Point in time, from `date` and `unix` fields
    DateTime(DateTime<FixedOffset>),
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<FixedOffset>> for FilterValue {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self::DateTime(dt)
    }
}

/// Right-hand side of one filter condition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterOperand {
    /// Value for single-value operators
    Single(FilterValue),
    /// Values for `in` / `nin`, in query-string order
    List(Vec<FilterValue>),
}

/// Conditions on one field, by operator
pub type FieldFilter = BTreeMap<FilterOperator, FilterOperand>;

/// Conditions by field name
pub type FilterMap = BTreeMap<String, FieldFilter>;

/// Derive the filter conditions of a query
///
/// The last occurrence of a field/operator pair wins. Fields without any
/// accepted condition are absent from the result.
pub fn parse_filters(
    query: &QueryParams,
    schema: &ResolvedSchema,
) -> Result<FilterMap, ValidationError> {
    let mut filter = FilterMap::new();

    for (key, value) in query.iter() {
        if RESERVED_KEYS.contains(&key) || value.is_empty() {
            continue;
        }

        let Some(captures) = FILTER_KEY_REGEX.captures(key) else {
            continue;
        };
        let field_name = captures.get(1).map_or(key, |m| m.as_str());
        let operator_name = captures.get(2).map_or("eq", |m| m.as_str());

        let Some(field) = schema.field(field_name) else {
            tracing::debug!(field = field_name, "Ignoring filter on unknown field");
            continue;
        };
        if !field.filterable {
            tracing::debug!(field = field_name, "Ignoring filter on non-filterable field");
            continue;
        }
        let Some(operator) = FilterOperator::from_name(operator_name) else {
            tracing::debug!(field = field_name, operator = operator_name, "Ignoring unknown filter operator");
            continue;
        };
        if !field.supports(operator) {
            tracing::debug!(field = field_name, operator = %operator, "Ignoring unsupported filter operator");
            continue;
        }

        let operand = if operator.takes_list() {
            let values = value
                .split(',')
                .map(|item| coerce(item, field_name, field))
                .collect::<Result<Vec<_>, _>>()?;
            FilterOperand::List(values)
        } else {
            FilterOperand::Single(coerce(value, field_name, field)?)
        };

        filter
            .entry(field_name.to_string())
            .or_default()
            .insert(operator, operand);
    }

    Ok(filter)
}
