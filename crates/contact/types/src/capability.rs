//! Entity capability hashes and the feature sets they expand to

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque capability hash (`ver`) advertised by a peer.
///
/// Many resources, even across contacts, share one value: identical client
/// builds produce identical hashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CapabilityHash(String);

impl CapabilityHash {
    pub fn new(ver: impl Into<String>) -> Self {
        Self(ver.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CapabilityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unordered set of feature identifiers (namespaces) behind one hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    features: HashSet<String>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(String::as_str)
    }

    /// Features in lexicographic order, for deterministic display.
    pub fn sorted(&self) -> Vec<String> {
        let mut features: Vec<String> = self.features.iter().cloned().collect();
        features.sort();
        features
    }
}

impl<S: Into<String>> FromIterator<S> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_is_lexicographic() {
        let set: CapabilitySet = [
            "urn:xmpp:ping",
            "http://jabber.org/protocol/disco#info",
            "jabber:iq:version",
        ]
        .into_iter()
        .collect();

        assert_eq!(
            set.sorted(),
            vec![
                "http://jabber.org/protocol/disco#info".to_string(),
                "jabber:iq:version".to_string(),
                "urn:xmpp:ping".to_string(),
            ]
        );
    }

    #[test]
    fn test_duplicate_features_collapse() {
        let set: CapabilitySet = ["urn:xmpp:ping", "urn:xmpp:ping"].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert!(set.contains("urn:xmpp:ping"));
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a: CapabilitySet = ["a", "b", "c"].into_iter().collect();
        let b: CapabilitySet = ["c", "a", "b"].into_iter().collect();
        assert_eq!(a, b);
    }
}
