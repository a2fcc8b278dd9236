//! Ordered, multi-valued request parameters.
//!
//! The Collins API takes both query strings and form bodies as flat
//! `key=value` collections where a key may repeat (e.g. several `attribute`
//! filters on a find). `Params` preserves insertion order and repeated keys,
//! and encodes to `application/x-www-form-urlencoded` either direction.

use url::form_urlencoded;

/// An ordered mapping of string keys to one or more string values.
///
/// Repeated keys are kept as separate pairs, matching the repeated-key
/// encoding Collins expects for multi-valued filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single key/value pair.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Append one pair per value, all under the same key.
    pub fn append_all<I, V>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        for value in values {
            self.pairs.push((key.to_string(), value.into()));
        }
        self
    }

    /// Whether no pairs have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of pairs (repeated keys counted individually).
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// All pairs in insertion order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Values recorded for `key`, in insertion order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Encode as a `application/x-www-form-urlencoded` string
    /// (no leading `?`), with repeated keys emitted as repeated pairs.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Parse a query/form string back into pairs, preserving order and
    /// repeated keys.
    #[must_use]
    pub fn from_query_str(query: &str) -> Self {
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
