//! Strongly-typed identifiers for contacts and their resources
//!
//! All identifiers are opaque strings wrapped in newtype structs. They are
//! compared byte-for-byte and never normalised here; normalisation of JIDs
//! belongs to the stanza layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the local account a contact is reachable through
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bare JID of a contact (`user@domain`, no resource part)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContactJid(String);

impl ContactJid {
    pub fn new(jid: impl Into<String>) -> Self {
        Self(jid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactJid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resource part of a full JID, naming one connected client of a contact.
///
/// Ordering is lexicographic on the underlying string, which is the order
/// snapshots are presented in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ResourceName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Identity of one contact: the (account, bare JID) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactKey {
    pub account: AccountId,
    pub jid: ContactJid,
}

impl ContactKey {
    pub fn new(account: impl Into<String>, jid: impl Into<String>) -> Self {
        Self {
            account: AccountId::new(account),
            jid: ContactJid::new(jid),
        }
    }

    /// Returns true when both the account and the JID match.
    pub fn matches(&self, account: &AccountId, jid: &ContactJid) -> bool {
        self.account == *account && self.jid == *jid
    }
}

impl fmt::Display for ContactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account, self.jid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_key_display() {
        let key = ContactKey::new("acct-1", "alice@example.org");
        assert_eq!(key.to_string(), "acct-1/alice@example.org");
    }

    #[test]
    fn test_contact_key_requires_both_parts() {
        let key = ContactKey::new("acct-1", "alice@example.org");
        assert!(key.matches(&AccountId::new("acct-1"), &ContactJid::new("alice@example.org")));
        assert!(!key.matches(&AccountId::new("acct-2"), &ContactJid::new("alice@example.org")));
        assert!(!key.matches(&AccountId::new("acct-1"), &ContactJid::new("bob@example.org")));
    }

    #[test]
    fn test_resource_names_order_lexicographically() {
        let mut names = vec![
            ResourceName::new("m3"),
            ResourceName::new("m1"),
            ResourceName::new("m2"),
        ];
        names.sort();
        let names: Vec<_> = names.iter().map(ResourceName::as_str).collect();
        assert_eq!(names, vec!["m1", "m2", "m3"]);
    }
}
