//! Relation include parsing

use std::collections::BTreeMap;

use crate::params::QueryParams;
use crate::schema::{RelationSchema, ResolvedSchema};

/// Declared relations requested by a query, by name
pub type IncludeMap = BTreeMap<String, RelationSchema>;

/// Derive the relations to load eagerly from `includes`
///
/// Names are comma-separated and trimmed; names the schema does not declare
/// are dropped.
pub fn parse_includes(query: &QueryParams, schema: &ResolvedSchema) -> IncludeMap {
    let Some(raw) = query.get("includes") else {
        return IncludeMap::new();
    };

    let mut includes = IncludeMap::new();
    for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        match schema.relation(name) {
            Some(relation) => {
                includes.insert(name.to_string(), relation.clone());
            }
            None => tracing::debug!(include = name, "Ignoring undeclared include"),
        }
    }
    includes
}
