use crate::key::Key;

/// Filter for selecting a subset of a datastore's entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    /// If set, only entries under this key prefix are returned.
    pub prefix: Option<Key>,
    /// If set, at most this many entries are returned.
    pub limit: Option<usize>,
}

impl Query {
    /// A query matching every entry.
    pub fn all() -> Self {
        Self::default()
    }

    /// A query matching entries under the given prefix.
    pub fn prefixed(prefix: Key) -> Self {
        Self {
            prefix: Some(prefix),
            limit: None,
        }
    }

    /// Returns `true` if the given key matches this query's prefix filter.
    pub fn matches(&self, key: &Key) -> bool {
        match &self.prefix {
            Some(prefix) => key.has_prefix(prefix),
            None => true,
        }
    }
}

/// A single key/value entry returned from [`crate::Datastore::query`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: Key,
    pub value: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_matches_everything() {
        let query = Query::all();
        assert!(query.matches(&Key::new("/a")));
        assert!(query.matches(&Key::root()));
    }

    #[test]
    fn prefixed_query_filters() {
        let query = Query::prefixed(Key::new("/Person"));
        assert!(query.matches(&Key::new("/Person/p1")));
        assert!(query.matches(&Key::new("/Person")));
        assert!(!query.matches(&Key::new("/Dog/d1")));
    }
}
