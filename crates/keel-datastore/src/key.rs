use std::fmt;

use serde::{Deserialize, Serialize};

/// Hierarchical path key, always in the normalized form `/a/b`.
///
/// Construction normalizes the input: a leading slash is ensured, a trailing
/// slash and empty segments are dropped. The root key is `/`. Keys order by
/// their byte representation, which gives prefix-grouped iteration in an
/// ordered store.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    /// Build a key from a path string, normalizing it.
    pub fn new(path: &str) -> Self {
        let mut normalized = String::with_capacity(path.len() + 1);
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            normalized.push('/');
            normalized.push_str(segment);
        }
        if normalized.is_empty() {
            normalized.push('/');
        }
        Self(normalized)
    }

    /// The root key (`/`).
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Append a child segment to this key.
    pub fn child(&self, segment: &str) -> Self {
        if self.is_root() {
            Self::new(segment)
        } else {
            Self::new(&format!("{}/{}", self.0, segment))
        }
    }

    /// Returns `true` if this is the root key.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// The final path segment, or `""` for the root key.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Returns `true` if `prefix` is an ancestor of (or equal to) this key.
    pub fn has_prefix(&self, prefix: &Key) -> bool {
        if prefix.is_root() {
            return true;
        }
        self.0 == prefix.0 || self.0.starts_with(&format!("{}/", prefix.0))
    }

    /// Remove a leading `prefix`, keeping the remainder rooted.
    ///
    /// Returns `None` if `prefix` is not an ancestor of this key.
    pub fn strip_prefix(&self, prefix: &Key) -> Option<Key> {
        if !self.has_prefix(prefix) {
            return None;
        }
        if prefix.is_root() {
            return Some(self.clone());
        }
        Some(Key::new(&self.0[prefix.0.len()..]))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_leading_slash() {
        assert_eq!(Key::new("a/b").as_str(), "/a/b");
        assert_eq!(Key::new("/a/b").as_str(), "/a/b");
    }

    #[test]
    fn normalizes_redundant_slashes() {
        assert_eq!(Key::new("//a///b/").as_str(), "/a/b");
    }

    #[test]
    fn empty_path_is_root() {
        assert_eq!(Key::new("").as_str(), "/");
        assert!(Key::new("").is_root());
        assert_eq!(Key::new(""), Key::root());
    }

    #[test]
    fn child_appends_segment() {
        let parent = Key::new("/Person");
        assert_eq!(parent.child("p1").as_str(), "/Person/p1");
        assert_eq!(Key::root().child("p1").as_str(), "/p1");
    }

    #[test]
    fn name_is_last_segment() {
        assert_eq!(Key::new("/Person/p1").name(), "p1");
        assert_eq!(Key::root().name(), "");
    }

    #[test]
    fn prefix_checks() {
        let key = Key::new("/Person/p1");
        assert!(key.has_prefix(&Key::new("/Person")));
        assert!(key.has_prefix(&Key::root()));
        assert!(key.has_prefix(&key));
        assert!(!key.has_prefix(&Key::new("/Pers")));
        assert!(!key.has_prefix(&Key::new("/Dog")));
    }

    #[test]
    fn strip_prefix_keeps_remainder_rooted() {
        let key = Key::new("/Person/p1");
        assert_eq!(
            key.strip_prefix(&Key::new("/Person")),
            Some(Key::new("/p1"))
        );
        assert_eq!(key.strip_prefix(&Key::root()), Some(key.clone()));
        assert_eq!(key.strip_prefix(&Key::new("/Dog")), None);
    }

    #[test]
    fn ordering_is_bytewise() {
        let mut keys = vec![Key::new("/b"), Key::new("/a/z"), Key::new("/a")];
        keys.sort();
        assert_eq!(
            keys,
            vec![Key::new("/a"), Key::new("/a/z"), Key::new("/b")]
        );
    }

    #[test]
    fn serde_is_transparent() {
        let key = Key::new("/a/b");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"/a/b\"");
        let parsed: Key = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
    }
}
