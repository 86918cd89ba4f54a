//! Decoded query string parameters
//!
//! Keeps every key/value pair in the order it appeared, duplicates included,
//! because filter precedence depends on that order.
//!
//! # Example
//!
//! ```rust
//! use acton_query::params::QueryParams;
//!
//! let params = QueryParams::parse("?name=Jo+Smith&tag=a&tag=b&city=S%C3%A3o%20Paulo");
//! assert_eq!(params.get("name"), Some("Jo Smith"));
//! assert_eq!(params.get("tag"), Some("a"));
//! assert_eq!(params.get("city"), Some("São Paulo"));
//! assert_eq!(params.len(), 4);
//! ```

/// Ordered key/value pairs of a query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Decode an `application/x-www-form-urlencoded` query component
    ///
    /// A leading `?` is ignored. `+` decodes to a space and malformed percent
    /// sequences are kept literally.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        Self {
            pairs: url::form_urlencoded::parse(raw.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    /// Build from pairs that are already decoded
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Value of the first occurrence of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }

    /// All pairs in query-string order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
