//! In-memory reference implementation of the contact storage traits.
//!
//! This adapter is deterministic and test-friendly. It also carries the write
//! path the protocol layer uses (version replies, presence caps, disco#info
//! results), which the tracking core itself never calls.

use crate::traits::{CapabilityHashStore, VersionInfoStore};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use contact_types::{CapabilityHash, CapabilitySet, ContactKey, ResourceName, VersionInfo};
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;
use tracing::debug;

type ResourceKey = (ContactKey, ResourceName);

/// In-memory contact storage adapter.
#[derive(Default)]
pub struct InMemoryContactStorage {
    known: RwLock<HashMap<ContactKey, BTreeSet<ResourceName>>>,
    versions: RwLock<HashMap<ResourceKey, VersionInfo>>,
    hashes: RwLock<HashMap<ResourceKey, CapabilityHash>>,
    capability_sets: RwLock<HashMap<CapabilityHash, CapabilitySet>>,
}

impl InMemoryContactStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a resource of `key` has been seen (e.g. on presence).
    pub fn mark_resource_known(
        &self,
        key: &ContactKey,
        resource: &ResourceName,
    ) -> StorageResult<()> {
        let mut guard = self
            .known
            .write()
            .map_err(|_| StorageError::Backend("resource lock poisoned".to_string()))?;
        guard
            .entry(key.clone())
            .or_default()
            .insert(resource.clone());
        Ok(())
    }

    /// Store a version record, replacing any previous one for the resource.
    pub fn upsert_version_info(&self, key: &ContactKey, info: VersionInfo) -> StorageResult<()> {
        if info.resource.as_str().is_empty() {
            return Err(StorageError::InvalidInput(
                "version info without resource".to_string(),
            ));
        }
        self.mark_resource_known(key, &info.resource)?;

        let mut guard = self
            .versions
            .write()
            .map_err(|_| StorageError::Backend("version lock poisoned".to_string()))?;
        guard.insert((key.clone(), info.resource.clone()), info);
        Ok(())
    }

    /// Record the capability hash a resource advertised in its presence.
    pub fn set_capability_hash(
        &self,
        key: &ContactKey,
        resource: &ResourceName,
        hash: CapabilityHash,
    ) -> StorageResult<()> {
        if hash.is_empty() {
            return Err(StorageError::InvalidInput("empty capability hash".to_string()));
        }
        self.mark_resource_known(key, resource)?;

        let mut guard = self
            .hashes
            .write()
            .map_err(|_| StorageError::Backend("hash lock poisoned".to_string()))?;
        guard.insert((key.clone(), resource.clone()), hash);
        Ok(())
    }

    /// Store the feature set for a hash.
    ///
    /// Sets are append-only: storing the identical set again is a no-op,
    /// storing a different set under an existing hash is a conflict.
    pub fn store_capability_set(
        &self,
        hash: CapabilityHash,
        set: CapabilitySet,
    ) -> StorageResult<()> {
        if hash.is_empty() {
            return Err(StorageError::InvalidInput("empty capability hash".to_string()));
        }

        let mut guard = self
            .capability_sets
            .write()
            .map_err(|_| StorageError::Backend("capability lock poisoned".to_string()))?;

        match guard.get(&hash) {
            Some(existing) if *existing == set => Ok(()),
            Some(_) => Err(StorageError::Conflict(format!(
                "capability hash {} already stored with a different feature set",
                hash
            ))),
            None => {
                debug!(hash = %hash, features = set.len(), "Stored capability set");
                guard.insert(hash, set);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl VersionInfoStore for InMemoryContactStorage {
    async fn resources_known(&self, key: &ContactKey) -> StorageResult<BTreeSet<ResourceName>> {
        let guard = self
            .known
            .read()
            .map_err(|_| StorageError::Backend("resource lock poisoned".to_string()))?;
        Ok(guard.get(key).cloned().unwrap_or_default())
    }

    async fn get_version_info(
        &self,
        key: &ContactKey,
        resource: &ResourceName,
    ) -> StorageResult<Option<VersionInfo>> {
        let guard = self
            .versions
            .read()
            .map_err(|_| StorageError::Backend("version lock poisoned".to_string()))?;
        Ok(guard.get(&(key.clone(), resource.clone())).cloned())
    }
}

#[async_trait]
impl CapabilityHashStore for InMemoryContactStorage {
    async fn get_capability_hash(
        &self,
        key: &ContactKey,
        resource: &ResourceName,
    ) -> StorageResult<Option<CapabilityHash>> {
        let guard = self
            .hashes
            .read()
            .map_err(|_| StorageError::Backend("hash lock poisoned".to_string()))?;
        Ok(guard.get(&(key.clone(), resource.clone())).cloned())
    }

    async fn get_capability_set(
        &self,
        hash: &CapabilityHash,
    ) -> StorageResult<Option<CapabilitySet>> {
        let guard = self
            .capability_sets
            .read()
            .map_err(|_| StorageError::Backend("capability lock poisoned".to_string()))?;
        Ok(guard.get(hash).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn alice() -> ContactKey {
        ContactKey::new("acct-1", "alice@example.org")
    }

    #[tokio::test]
    async fn version_upsert_marks_resource_known_and_replaces() {
        let storage = InMemoryContactStorage::new();
        let key = alice();

        storage
            .upsert_version_info(&key, VersionInfo::new("phone").with_app("Monal", "6.0"))
            .unwrap();
        storage
            .upsert_version_info(
                &key,
                VersionInfo::new("phone")
                    .with_app("Monal", "6.1")
                    .with_last_interaction(Utc::now()),
            )
            .unwrap();

        let known = storage.resources_known(&key).await.unwrap();
        assert_eq!(known.len(), 1);

        let info = storage
            .get_version_info(&key, &ResourceName::new("phone"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.app_version.as_deref(), Some("6.1"));
    }

    #[tokio::test]
    async fn known_resources_are_scoped_per_account() {
        let storage = InMemoryContactStorage::new();
        let key = alice();
        let other_account = ContactKey::new("acct-2", "alice@example.org");

        storage
            .mark_resource_known(&key, &ResourceName::new("phone"))
            .unwrap();

        assert_eq!(storage.resources_known(&key).await.unwrap().len(), 1);
        assert!(storage.resources_known(&other_account).await.unwrap().is_empty());
        assert!(storage
            .get_version_info(&key, &ResourceName::new("phone"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn capability_sets_are_append_only() {
        let storage = InMemoryContactStorage::new();
        let hash = CapabilityHash::new("q07IKJEyjvHSyhy//CH0CxmKi8w=");
        let set: CapabilitySet = ["urn:xmpp:ping", "jabber:iq:version"].into_iter().collect();

        storage.store_capability_set(hash.clone(), set.clone()).unwrap();
        storage.store_capability_set(hash.clone(), set.clone()).unwrap();

        let different: CapabilitySet = ["urn:xmpp:ping"].into_iter().collect();
        let result = storage.store_capability_set(hash.clone(), different);
        assert!(matches!(result, Err(StorageError::Conflict(_))));

        assert_eq!(storage.get_capability_set(&hash).await.unwrap(), Some(set));
    }

    #[tokio::test]
    async fn empty_hash_is_rejected() {
        let storage = InMemoryContactStorage::new();
        let result = storage.set_capability_hash(
            &alice(),
            &ResourceName::new("phone"),
            CapabilityHash::new(""),
        );
        assert!(matches!(result, Err(StorageError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn unknown_hash_reads_as_absent() {
        let storage = InMemoryContactStorage::new();
        let missing = storage
            .get_capability_set(&CapabilityHash::new("never-seen"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
