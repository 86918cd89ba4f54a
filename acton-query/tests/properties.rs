//! Property-based tests for parsing invariants
//!
//! - Pagination always stays within the schema's limits
//! - Unknown and non-filterable fields never reach the filter map
//! - Only sortable fields reach the sort map
//! - Parsing is deterministic

use acton_query::prelude::*;
use proptest::prelude::*;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn schema() -> ResourceSchema {
    ResourceSchema::new()
        .with_field("name", FieldSchema::new(FieldType::String).filterable().sortable())
        .with_field("age", FieldSchema::new(FieldType::Number).filterable())
        .with_field("active", FieldSchema::new(FieldType::Boolean).filterable().sortable())
        .with_field("secret", FieldSchema::new(FieldType::String).sortable())
}

fn number_text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (-1000i64..1000).prop_map(|n| n.to_string()),
        (-100.0f64..100.0).prop_map(|n| format!("{n:.2}")),
        prop::string::string_regex("[a-z ]{0,4}").unwrap(),
    ]
}

fn limits_strategy() -> impl Strategy<Value = (u64, u64, bool)> {
    (1u64..200, any::<bool>()).prop_flat_map(|(max, allow)| (1..=max, Just(max), Just(allow)))
}

fn key_strategy() -> impl Strategy<Value = String> {
    let field = prop_oneof![
        Just("name"),
        Just("age"),
        Just("active"),
        Just("secret"),
        Just("ghost"),
    ];
    let operator = prop_oneof![
        Just(""),
        Just("[eq]"),
        Just("[ne]"),
        Just("[gt]"),
        Just("[in]"),
        Just("[nin]"),
        Just("[match]"),
        Just("[bogus]"),
    ];
    (field, operator).prop_map(|(field, operator)| format!("{field}{operator}"))
}

fn value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[a-z0-9,]{0,6}").unwrap(),
        prop::string::string_regex("[0-9]{1,3}(,[0-9]{1,3}){0,2}").unwrap(),
        Just("true".to_string()),
    ]
}

fn pairs_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((key_strategy(), value_strategy()), 0..8)
}

fn sort_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("name"),
            Just("-name"),
            Just("age"),
            Just("-active"),
            Just("secret"),
            Just("ghost"),
            Just(""),
        ],
        0..5,
    )
    .prop_map(|tokens| tokens.join(","))
}

// =============================================================================
// PAGINATION PROPERTIES
// =============================================================================

mod pagination_properties {
    use super::*;

    proptest! {
        #[test]
        fn limit_within_schema_bounds(
            page in number_text_strategy(),
            limit in number_text_strategy(),
            (default_limit, max_limit, allow) in limits_strategy(),
        ) {
            let schema = ResourceSchema::new()
                .with_default_limit(default_limit)
                .with_max_limit(max_limit)
                .with_allow_no_limit(allow);
            let query = QueryParams::from_pairs([("page", page), ("limit", limit)]);

            let pagination = parse_params(&query, &schema, &ParseOptions::default())
                .unwrap()
                .pagination;

            prop_assert!(pagination.page >= 1);
            prop_assert!(pagination.limit <= max_limit);
            prop_assert_eq!(pagination.offset, (pagination.page - 1) * pagination.limit);
            if pagination.limit == 0 {
                prop_assert!(allow);
                prop_assert_eq!(pagination.page, 1);
            }
        }

        #[test]
        fn negative_limit_uses_default(
            limit in -1000i64..0,
            (default_limit, max_limit, allow) in limits_strategy(),
        ) {
            let schema = ResourceSchema::new()
                .with_default_limit(default_limit)
                .with_max_limit(max_limit)
                .with_allow_no_limit(allow);

            let descriptor = parse_query(&format!("limit={limit}"), &schema).unwrap();
            prop_assert_eq!(descriptor.pagination.limit, default_limit);
        }
    }
}

// =============================================================================
// FILTER AND SORT PROPERTIES
// =============================================================================

mod selection_properties {
    use super::*;

    proptest! {
        #[test]
        fn only_filterable_fields_are_filtered(pairs in pairs_strategy()) {
            let query = QueryParams::from_pairs(pairs);
            match parse_params(&query, &schema(), &ParseOptions::default()) {
                Ok(descriptor) => {
                    for field in descriptor.filter.iter().flat_map(|filter| filter.keys()) {
                        prop_assert!(["name", "age", "active"].contains(&field.as_str()));
                    }
                    prop_assert!(descriptor.filter.as_ref().is_none_or(|filter| !filter.is_empty()));
                }
                Err(err) => {
                    let validation = err.as_validation();
                    prop_assert!(validation.is_some());
                    let field = validation.map(|v| v.field.as_str()).unwrap_or_default();
                    prop_assert!(["name", "age", "active"].contains(&field));
                }
            }
        }

        #[test]
        fn only_sortable_fields_are_sorted(sort in sort_strategy()) {
            let query = QueryParams::from_pairs([("sort", sort)]);
            let descriptor = parse_params(&query, &schema(), &ParseOptions::default()).unwrap();
            for field in descriptor.sort.keys() {
                prop_assert!(["name", "active", "secret"].contains(&field.as_str()));
            }
        }

        #[test]
        fn parsing_is_deterministic(pairs in pairs_strategy(), sort in sort_strategy()) {
            let mut pairs = pairs;
            pairs.push(("sort".to_string(), sort));
            let query = QueryParams::from_pairs(pairs);

            let first = parse_params(&query, &schema(), &ParseOptions::default());
            let second = parse_params(&query, &schema(), &ParseOptions::default());
            match (first, second) {
                (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                (Err(a), Err(b)) => prop_assert_eq!(a.as_validation(), b.as_validation()),
                _ => prop_assert!(false, "outcomes differ"),
            }
        }
    }
}
