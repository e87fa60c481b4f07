use crate::StorageResult;
use async_trait::async_trait;
use contact_types::{CapabilityHash, CapabilitySet, ContactKey, ResourceName, VersionInfo};
use std::collections::BTreeSet;

/// Storage interface for per-resource software version records.
#[async_trait]
pub trait VersionInfoStore: Send + Sync {
    /// Resources known for a contact, whether or not version data exists.
    async fn resources_known(&self, key: &ContactKey) -> StorageResult<BTreeSet<ResourceName>>;

    /// Last stored version record for one resource.
    async fn get_version_info(
        &self,
        key: &ContactKey,
        resource: &ResourceName,
    ) -> StorageResult<Option<VersionInfo>>;
}

/// Storage interface for entity capabilities.
#[async_trait]
pub trait CapabilityHashStore: Send + Sync {
    /// Capability hash most recently advertised by a resource.
    async fn get_capability_hash(
        &self,
        key: &ContactKey,
        resource: &ResourceName,
    ) -> StorageResult<Option<CapabilityHash>>;

    /// Feature set stored for a hash; `None` when the hash was never resolved.
    async fn get_capability_set(&self, hash: &CapabilityHash)
        -> StorageResult<Option<CapabilitySet>>;
}

/// Unified storage bundle consumed by the tracking core.
pub trait ContactStorage: VersionInfoStore + CapabilityHashStore + Send + Sync {}

impl<T> ContactStorage for T where T: VersionInfoStore + CapabilityHashStore + Send + Sync {}
