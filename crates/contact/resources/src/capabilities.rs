//! Capability resolution: resource -> capability hash -> feature set.
//!
//! Hash lookup and set resolution are separate steps so one stored set serves
//! every resource (across all contacts) advertising the same hash. Stored sets
//! never change, so resolved sets are memoised per hash.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use contact_store::CapabilityHashStore;
use contact_types::{CapabilityHash, CapabilitySet, ContactKey, ResourceName};
use tracing::{debug, warn};

/// Resolves resources to their advertised capability sets
pub struct CapabilityResolver {
    store: Arc<dyn CapabilityHashStore>,
    resolved: RwLock<HashMap<CapabilityHash, Arc<CapabilitySet>>>,
}

impl CapabilityResolver {
    pub fn new(store: Arc<dyn CapabilityHashStore>) -> Self {
        Self {
            store,
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// Hash the resource currently advertises; `None` means unknown.
    pub async fn current_hash(
        &self,
        key: &ContactKey,
        resource: &ResourceName,
    ) -> Option<CapabilityHash> {
        match self.store.get_capability_hash(key, resource).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(contact = %key, resource = %resource, error = %e, "Failed to read capability hash");
                None
            }
        }
    }

    /// Feature set stored for a hash; `None` when it was never stored.
    pub async fn resolve(&self, hash: &CapabilityHash) -> Option<Arc<CapabilitySet>> {
        if let Some(set) = self.cached(hash) {
            return Some(set);
        }

        let set = match self.store.get_capability_set(hash).await {
            Ok(Some(set)) => Arc::new(set),
            Ok(None) => return None,
            Err(e) => {
                warn!(hash = %hash, error = %e, "Failed to read capability set");
                return None;
            }
        };

        match self.resolved.write() {
            Ok(mut guard) => Some(Arc::clone(guard.entry(hash.clone()).or_insert(set))),
            Err(_) => Some(set),
        }
    }

    /// Sorted features of a resource; empty when the hash or its set is unknown.
    pub async fn resolve_capabilities(
        &self,
        key: &ContactKey,
        resource: &ResourceName,
    ) -> Vec<String> {
        let Some(hash) = self.current_hash(key, resource).await else {
            debug!(contact = %key, resource = %resource, "No capability hash known");
            return Vec::new();
        };

        match self.resolve(&hash).await {
            Some(set) => set.sorted(),
            None => {
                debug!(contact = %key, resource = %resource, hash = %hash, "Capability hash not resolved yet");
                Vec::new()
            }
        }
    }

    /// True when no set is stored for `hash` yet, i.e. a disco#info query
    /// is worth sending. Shared hashes resolve once for every resource.
    pub async fn needs_discovery(&self, hash: &CapabilityHash) -> bool {
        self.resolve(hash).await.is_none()
    }

    /// Number of memoised capability sets
    pub fn cached_sets(&self) -> usize {
        self.resolved.read().map(|guard| guard.len()).unwrap_or(0)
    }

    fn cached(&self, hash: &CapabilityHash) -> Option<Arc<CapabilitySet>> {
        let guard = self.resolved.read().ok()?;
        guard.get(hash).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contact_store::InMemoryContactStorage;

    const SHARED_VER: &str = "q07IKJEyjvHSyhy//CH0CxmKi8w=";

    fn storage_with_shared_hash() -> Arc<InMemoryContactStorage> {
        let storage = Arc::new(InMemoryContactStorage::new());
        let alice = ContactKey::new("acct-1", "alice@example.org");
        let bob = ContactKey::new("acct-1", "bob@example.org");
        let hash = CapabilityHash::new(SHARED_VER);

        storage
            .set_capability_hash(&alice, &ResourceName::new("phone"), hash.clone())
            .unwrap();
        storage
            .set_capability_hash(&bob, &ResourceName::new("desktop"), hash.clone())
            .unwrap();
        storage
            .store_capability_set(
                hash,
                [
                    "urn:xmpp:ping",
                    "http://jabber.org/protocol/caps",
                    "jabber:iq:version",
                ]
                .into_iter()
                .collect(),
            )
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn resolves_sorted_features() {
        let resolver = CapabilityResolver::new(storage_with_shared_hash());
        let alice = ContactKey::new("acct-1", "alice@example.org");

        let features = resolver
            .resolve_capabilities(&alice, &ResourceName::new("phone"))
            .await;

        assert_eq!(
            features,
            vec![
                "http://jabber.org/protocol/caps".to_string(),
                "jabber:iq:version".to_string(),
                "urn:xmpp:ping".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn shared_hash_resolves_to_same_set() {
        let resolver = CapabilityResolver::new(storage_with_shared_hash());
        let alice = ContactKey::new("acct-1", "alice@example.org");
        let bob = ContactKey::new("acct-1", "bob@example.org");

        let from_alice = resolver
            .resolve_capabilities(&alice, &ResourceName::new("phone"))
            .await;
        let from_bob = resolver
            .resolve_capabilities(&bob, &ResourceName::new("desktop"))
            .await;

        assert_eq!(from_alice, from_bob);
        assert_eq!(resolver.cached_sets(), 1);

        let hash = CapabilityHash::new(SHARED_VER);
        let first = resolver.resolve(&hash).await.unwrap();
        let second = resolver.resolve(&hash).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn unknown_hash_resolves_empty() {
        let storage = Arc::new(InMemoryContactStorage::new());
        let alice = ContactKey::new("acct-1", "alice@example.org");
        storage
            .set_capability_hash(
                &alice,
                &ResourceName::new("phone"),
                CapabilityHash::new("not-yet-discovered"),
            )
            .unwrap();
        let resolver = CapabilityResolver::new(storage);

        let features = resolver
            .resolve_capabilities(&alice, &ResourceName::new("phone"))
            .await;

        assert!(features.is_empty());
        assert!(
            resolver
                .needs_discovery(&CapabilityHash::new("not-yet-discovered"))
                .await
        );
        assert_eq!(resolver.cached_sets(), 0);
    }

    #[tokio::test]
    async fn resource_without_hash_resolves_empty() {
        let resolver = CapabilityResolver::new(Arc::new(InMemoryContactStorage::new()));
        let alice = ContactKey::new("acct-1", "alice@example.org");

        assert!(resolver
            .current_hash(&alice, &ResourceName::new("tablet"))
            .await
            .is_none());
        assert!(resolver
            .resolve_capabilities(&alice, &ResourceName::new("tablet"))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn stored_hash_needs_no_discovery() {
        let resolver = CapabilityResolver::new(storage_with_shared_hash());
        assert!(!resolver.needs_discovery(&CapabilityHash::new(SHARED_VER)).await);
    }
}
