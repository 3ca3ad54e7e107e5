//! Ordered query parameters with optional values.

/// Query string parameters for [`crate::FiscalClient::request`].
///
/// Keeps insertion order. Entries whose value is `None` are dropped when the
/// URL is built, so optional filters can be passed through unconditionally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Option<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter. Repeated keys are kept and sent in order.
    pub fn insert(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.entries.push((key.into(), Some(value.to_string())));
        self
    }

    /// Append a parameter that is skipped when `value` is `None`.
    pub fn insert_opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.entries
            .push((key.into(), value.map(|v| v.to_string())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().next().is_none()
    }

    /// Present `(key, value)` pairs in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    pub(crate) fn to_vec(&self) -> Vec<(&str, &str)> {
        self.pairs().collect()
    }
}

impl<K, V> FromIterator<(K, Option<V>)> for QueryParams
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |params, (k, v)| params.insert_opt(k, v))
    }
}
