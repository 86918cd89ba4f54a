//! Resource schemas and their resolution
//!
//! A [`ResourceSchema`] is the caller-owned description of a list endpoint:
//! which fields can be filtered or sorted, which relations can be included,
//! and the pagination limits. Any limit left unset is filled in by
//! [`ResourceSchema::resolve`], which every parsing stage works from.
//!
//! # Example
//!
//! ```rust
//! use acton_query::schema::{FieldSchema, FieldType, RelationSchema, ResourceSchema};
//!
//! let schema = ResourceSchema::new()
//!     .with_field("name", FieldSchema::new(FieldType::String).filterable().sortable())
//!     .with_field("age", FieldSchema::new(FieldType::Number).filterable())
//!     .with_relation("author", RelationSchema::new("users", ["id", "name"]))
//!     .with_max_limit(50);
//!
//! let resolved = schema.resolve();
//! assert_eq!(resolved.default_limit, 25);
//! assert_eq!(resolved.max_limit, 50);
//! assert!(resolved.allow_no_limit);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::filter::{default_operators, FilterOperator};
use crate::sort::SortOrder;

/// Page size used when a schema does not set one
pub const DEFAULT_LIMIT: u64 = 25;

/// Largest page size used when a schema does not set one
pub const DEFAULT_MAX_LIMIT: u64 = 100;

/// Whether `limit=0` (fetch everything) is honoured when a schema does not say
pub const DEFAULT_ALLOW_NO_LIMIT: bool = true;

/// Value type of a queryable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Integer or decimal number
    Number,
    /// Free text, optionally restricted to `enum_values`
    String,
    /// Truthy/falsy flag
    Boolean,
    /// Calendar date or date-time
    Date,
    /// Seconds since the unix epoch
    Unix,
    /// One of a closed set of string values
    Enum,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
            Self::Date => write!(f, "date"),
            Self::Unix => write!(f, "unix"),
            Self::Enum => write!(f, "enum"),
        }
    }
}

/// Description of one queryable field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Value type, drives coercion and the default operator set
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Whether filter operators may target this field
    #[serde(default)]
    pub filterable: bool,

    /// Whether this field may appear in `sort`
    #[serde(default)]
    pub sortable: bool,

    /// Explicit operator allow-list, replacing the per-type default set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_operators: Option<Vec<FilterOperator>>,

    /// Allowed values for `enum` fields, or a domain restriction for `string` fields
    #[serde(
        default,
        alias = "enum",
        deserialize_with = "deserialize_enum_values",
        skip_serializing_if = "Option::is_none"
    )]
    pub enum_values: Option<Vec<String>>,

    /// Free-text documentation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSchema {
    /// Create a field that is neither filterable nor sortable
    #[must_use]
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            filterable: false,
            sortable: false,
            supported_operators: None,
            enum_values: None,
            description: None,
        }
    }

    /// Allow filtering on this field
    #[must_use]
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    /// Allow sorting on this field
    #[must_use]
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Restrict the operators accepted for this field
    #[must_use]
    pub fn with_operators(mut self, operators: impl IntoIterator<Item = FilterOperator>) -> Self {
        self.supported_operators = Some(operators.into_iter().collect());
        self
    }

    /// Set the allowed values
    #[must_use]
    pub fn with_enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Operators accepted for this field
    ///
    /// The explicit allow-list when one is set, otherwise the default set for
    /// the field type.
    pub fn effective_operators(&self) -> &[FilterOperator] {
        self.supported_operators
            .as_deref()
            .unwrap_or_else(|| default_operators(self.field_type))
    }

    /// Whether `operator` may be used on this field
    pub fn supports(&self, operator: FilterOperator) -> bool {
        self.effective_operators().contains(&operator)
    }
}

/// What including a relation expands to
///
/// Opaque to the parser beyond existence checking; it is handed through to
/// the data-access layer untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSchema {
    /// Related entity name
    pub entity: String,
    /// Fields of the related entity to load
    #[serde(default)]
    pub fields: Vec<String>,
}

impl RelationSchema {
    /// Create a relation description
    pub fn new<I, S>(entity: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity: entity.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Caller-supplied, possibly partial, resource schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSchema {
    /// Queryable fields by name
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSchema>,

    /// Includable relations by name
    #[serde(default)]
    pub related: BTreeMap<String, RelationSchema>,

    /// Sort applied when the query does not give a usable one
    #[serde(default)]
    pub default_sort: IndexMap<String, SortOrder>,

    /// Page size when `limit` is absent or invalid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<u64>,

    /// Upper bound for `limit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_limit: Option<u64>,

    /// Whether `limit=0` fetches everything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_no_limit: Option<bool>,
}

impl ResourceSchema {
    /// Create an empty schema
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a field
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, field: FieldSchema) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Add or replace a relation
    #[must_use]
    pub fn with_relation(mut self, name: impl Into<String>, relation: RelationSchema) -> Self {
        self.related.insert(name.into(), relation);
        self
    }

    /// Append an entry to the default sort
    #[must_use]
    pub fn with_default_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.default_sort.insert(field.into(), order);
        self
    }

    /// Set the default page size
    #[must_use]
    pub fn with_default_limit(mut self, limit: u64) -> Self {
        self.default_limit = Some(limit);
        self
    }

    /// Set the maximum page size
    #[must_use]
    pub fn with_max_limit(mut self, limit: u64) -> Self {
        self.max_limit = Some(limit);
        self
    }

    /// Allow or forbid `limit=0`
    #[must_use]
    pub fn with_allow_no_limit(mut self, allow: bool) -> Self {
        self.allow_no_limit = Some(allow);
        self
    }

    /// Fill every unset option with its default
    pub fn resolve(&self) -> ResolvedSchema {
        ResolvedSchema {
            fields: self.fields.clone(),
            related: self.related.clone(),
            default_sort: self.default_sort.clone(),
            default_limit: self.default_limit.unwrap_or(DEFAULT_LIMIT),
            max_limit: self.max_limit.unwrap_or(DEFAULT_MAX_LIMIT),
            allow_no_limit: self.allow_no_limit.unwrap_or(DEFAULT_ALLOW_NO_LIMIT),
        }
    }

    /// Check the schema for internal inconsistencies
    ///
    /// Reports enum fields without values, default sorts on unknown or
    /// unsortable fields, and inconsistent limits. Parsing never calls this.
    pub fn validate(&self) -> Result<()> {
        let resolved = self.resolve();
        let mut problems = Vec::new();

        for (name, field) in &resolved.fields {
            if field.field_type == FieldType::Enum
                && field.enum_values.as_ref().is_none_or(|values| values.is_empty())
            {
                problems.push(format!("enum field `{}` declares no enum_values", name));
            }
        }

        for field in resolved.default_sort.keys() {
            match resolved.fields.get(field) {
                None => problems.push(format!("default_sort references unknown field `{}`", field)),
                Some(schema) if !schema.sortable => {
                    problems.push(format!("default_sort field `{}` is not sortable", field));
                }
                Some(_) => {}
            }
        }

        if resolved.max_limit == 0 {
            problems.push("max_limit must be at least 1".to_string());
        }
        if resolved.default_limit > resolved.max_limit {
            problems.push(format!(
                "default_limit {} exceeds max_limit {}",
                resolved.default_limit, resolved.max_limit
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Schema(problems.join("; ")))
        }
    }

    /// Load and validate a schema from a TOML or JSON file
    ///
    /// The format is chosen by extension: `.json` is read as JSON, anything
    /// else as TOML. `default_sort` keeps the order it has in the file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let schema: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            _ => toml::from_str(&contents)?,
        };

        if let Err(err) = schema.validate() {
            tracing::warn!(path = %path.display(), error = %err, "Rejected resource schema");
            return Err(err);
        }

        tracing::debug!(
            path = %path.display(),
            fields = schema.fields.len(),
            relations = schema.related.len(),
            "Loaded resource schema"
        );
        Ok(schema)
    }
}

/// A resource schema with every option filled in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSchema {
    /// Queryable fields by name
    pub fields: BTreeMap<String, FieldSchema>,
    /// Includable relations by name
    pub related: BTreeMap<String, RelationSchema>,
    /// Sort applied when the query does not give a usable one
    pub default_sort: IndexMap<String, SortOrder>,
    /// Page size when `limit` is absent or invalid
    pub default_limit: u64,
    /// Upper bound for `limit`
    pub max_limit: u64,
    /// Whether `limit=0` fetches everything
    pub allow_no_limit: bool,
}

impl Default for ResolvedSchema {
    fn default() -> Self {
        ResourceSchema::default().resolve()
    }
}

impl ResolvedSchema {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    /// Look up a relation by name
    pub fn relation(&self, name: &str) -> Option<&RelationSchema> {
        self.related.get(name)
    }

    /// Whether `name` is a known, sortable field
    pub fn is_sortable(&self, name: &str) -> bool {
        self.field(name).is_some_and(|field| field.sortable)
    }

    /// Stable content hash identifying this schema by value
    ///
    /// Fields and relations hash the same whatever order they were added in.
    /// `default_sort` hashes in priority order, so two schemas whose default
    /// sorts list the same fields in a different order get different
    /// fingerprints. Every variable-length item is length prefixed so adjacent
    /// strings cannot run together.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();

        hasher.update(&(self.fields.len() as u64).to_le_bytes());
        for (name, field) in &self.fields {
            update_str(&mut hasher, name);
            update_str(&mut hasher, &field.field_type.to_string());
            hasher.update(&[u8::from(field.filterable), u8::from(field.sortable)]);

            match &field.supported_operators {
                Some(operators) => {
                    hasher.update(&[1]);
                    hasher.update(&(operators.len() as u64).to_le_bytes());
                    for operator in operators {
                        update_str(&mut hasher, operator.as_str());
                    }
                }
                None => {
                    hasher.update(&[0]);
                }
            }

            match &field.enum_values {
                Some(values) => {
                    hasher.update(&[1]);
                    hasher.update(&(values.len() as u64).to_le_bytes());
                    for value in values {
                        update_str(&mut hasher, value);
                    }
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }

        hasher.update(&(self.related.len() as u64).to_le_bytes());
        for (name, relation) in &self.related {
            update_str(&mut hasher, name);
            update_str(&mut hasher, &relation.entity);
            hasher.update(&(relation.fields.len() as u64).to_le_bytes());
            for field in &relation.fields {
                update_str(&mut hasher, field);
            }
        }

        hasher.update(&(self.default_sort.len() as u64).to_le_bytes());
        for (field, order) in &self.default_sort {
            update_str(&mut hasher, field);
            update_str(&mut hasher, &order.to_string());
        }

        hasher.update(&self.default_limit.to_le_bytes());
        hasher.update(&self.max_limit.to_le_bytes());
        hasher.update(&[u8::from(self.allow_no_limit)]);

        hasher.finalize()
    }
}

/// Resolve a partial schema; see [`ResourceSchema::resolve`]
pub fn resolve(schema: &ResourceSchema) -> ResolvedSchema {
    schema.resolve()
}

fn update_str(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

/// Accepts either a list of values or a name-to-value map (legacy `enum` form)
#[derive(Deserialize)]
#[serde(untagged)]
enum EnumValuesRepr {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

fn deserialize_enum_values<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<EnumValuesRepr>::deserialize(deserializer)?;
    Ok(repr.map(|repr| match repr {
        EnumValuesRepr::List(values) => values,
        EnumValuesRepr::Map(values) => values.into_values().collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResourceSchema {
        ResourceSchema::new()
            .with_field("name", FieldSchema::new(FieldType::String).filterable().sortable())
            .with_field(
                "status",
                FieldSchema::new(FieldType::Enum)
                    .filterable()
                    .with_enum_values(["draft", "published"]),
            )
            .with_relation("author", RelationSchema::new("users", ["id"]))
    }

    #[test]
    fn test_resolve_defaults() {
        let resolved = ResourceSchema::new().resolve();
        assert_eq!(resolved.default_limit, DEFAULT_LIMIT);
        assert_eq!(resolved.max_limit, DEFAULT_MAX_LIMIT);
        assert!(resolved.allow_no_limit);
        assert!(resolved.fields.is_empty());
        assert!(resolved.related.is_empty());
        assert!(resolved.default_sort.is_empty());
    }

    #[test]
    fn test_resolve_overrides() {
        let resolved = ResourceSchema::new()
            .with_default_limit(10)
            .with_max_limit(20)
            .with_allow_no_limit(false)
            .resolve();
        assert_eq!(resolved.default_limit, 10);
        assert_eq!(resolved.max_limit, 20);
        assert!(!resolved.allow_no_limit);
    }

    #[test]
    fn test_resolve_keeps_fields() {
        let resolved = resolve(&sample());
        assert!(resolved.field("name").is_some());
        assert!(resolved.relation("author").is_some());
        assert!(resolved.is_sortable("name"));
        assert!(!resolved.is_sortable("status"));
        assert!(!resolved.is_sortable("missing"));
    }

    #[test]
    fn test_effective_operators_default_and_explicit() {
        let field = FieldSchema::new(FieldType::Boolean);
        assert_eq!(
            field.effective_operators(),
            &[FilterOperator::Eq, FilterOperator::Ne]
        );
        assert!(!field.supports(FilterOperator::Gt));

        let field = FieldSchema::new(FieldType::Number).with_operators([FilterOperator::Gt]);
        assert!(field.supports(FilterOperator::Gt));
        assert!(!field.supports(FilterOperator::Eq));
    }

    #[test]
    fn test_validate_accepts_sample() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_reports_problems() {
        let schema = ResourceSchema::new()
            .with_field("kind", FieldSchema::new(FieldType::Enum).filterable())
            .with_field("age", FieldSchema::new(FieldType::Number))
            .with_default_sort("age", SortOrder::Desc)
            .with_default_sort("ghost", SortOrder::Asc)
            .with_default_limit(500);

        let err = schema.validate().unwrap_err().to_string();
        assert!(err.contains("enum field `kind` declares no enum_values"));
        assert!(err.contains("default_sort field `age` is not sortable"));
        assert!(err.contains("unknown field `ghost`"));
        assert!(err.contains("default_limit 500 exceeds max_limit 100"));
    }

    #[test]
    fn test_validate_rejects_zero_max_limit() {
        let err = ResourceSchema::new()
            .with_default_limit(0)
            .with_max_limit(0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("max_limit must be at least 1"));
    }

    #[test]
    fn test_deserialize_enum_values_list() {
        let field: FieldSchema = serde_json::from_str(
            r#"{"type": "enum", "filterable": true, "enum_values": ["a", "b"]}"#,
        )
        .unwrap();
        assert_eq!(field.enum_values, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(!field.sortable);
    }

    #[test]
    fn test_deserialize_legacy_enum_map() {
        let field: FieldSchema = serde_json::from_str(
            r#"{"type": "string", "filterable": true, "enum": {"Active": "active", "Banned": "banned"}}"#,
        )
        .unwrap();
        assert_eq!(
            field.enum_values,
            Some(vec!["active".to_string(), "banned".to_string()])
        );
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = sample().resolve();
        let b = sample().resolve();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let a = sample().resolve();
        let b = sample().with_max_limit(10).resolve();
        let c = sample()
            .with_field("name", FieldSchema::new(FieldType::String).filterable())
            .resolve();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_fingerprint_field_order_irrelevant() {
        let a = ResourceSchema::new()
            .with_field("name", FieldSchema::new(FieldType::String))
            .with_field("age", FieldSchema::new(FieldType::Number))
            .resolve();
        let b = ResourceSchema::new()
            .with_field("age", FieldSchema::new(FieldType::Number))
            .with_field("name", FieldSchema::new(FieldType::String))
            .resolve();
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_follows_default_sort_order() {
        let a = sample()
            .with_default_sort("name", SortOrder::Asc)
            .with_default_sort("status", SortOrder::Desc)
            .resolve();
        let b = sample()
            .with_default_sort("status", SortOrder::Desc)
            .with_default_sort("name", SortOrder::Asc)
            .resolve();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_field_type_display() {
        assert_eq!(FieldType::Unix.to_string(), "unix");
        assert_eq!(FieldType::Enum.to_string(), "enum");
    }
}
