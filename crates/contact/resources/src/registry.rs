//! Live per-contact resource registry.
//!
//! The registry is a read cache of what the protocol layer already persisted:
//! it is filled from storage once and then kept current by update events. It
//! holds no locks; one owning task mutates it (see [`crate::view`]).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use contact_store::VersionInfoStore;
use contact_types::{ContactKey, ResourceName, VersionInfo};
use tracing::{debug, instrument, warn};

use crate::config::InteractionPolicy;

/// Ordered view of a registry: `(resource, record)` sorted by resource.
pub type ResourceSnapshot = Vec<(ResourceName, VersionInfo)>;

/// Outcome of applying a last-interaction update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// The entry's `last_interaction` was set.
    Applied,

    /// No entry exists for the resource; the update was dropped.
    UnknownResource,

    /// The timestamp is older than the stored one and the policy is monotonic.
    Stale,
}

/// Authoritative `{resource -> VersionInfo}` view for one contact.
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    key: ContactKey,
    policy: InteractionPolicy,
    entries: HashMap<ResourceName, VersionInfo>,
}

impl ResourceRegistry {
    /// Create an empty registry for a contact.
    pub fn new(key: ContactKey) -> Self {
        Self::with_policy(key, InteractionPolicy::default())
    }

    pub fn with_policy(key: ContactKey, policy: InteractionPolicy) -> Self {
        Self {
            key,
            policy,
            entries: HashMap::new(),
        }
    }

    /// Cold-load a registry from storage.
    ///
    /// Resources without a stored record are omitted. Storage failures never
    /// abort construction: they leave the affected resources out.
    #[instrument(skip_all, fields(contact = %key))]
    pub async fn load(
        key: ContactKey,
        store: &dyn VersionInfoStore,
        policy: InteractionPolicy,
    ) -> Self {
        let mut registry = Self::with_policy(key, policy);

        let resources = match store.resources_known(&registry.key).await {
            Ok(resources) => resources,
            Err(e) => {
                warn!(contact = %registry.key, error = %e, "Failed to list known resources");
                return registry;
            }
        };

        for resource in resources {
            match store.get_version_info(&registry.key, &resource).await {
                Ok(Some(info)) => {
                    registry.entries.insert(resource, info);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        contact = %registry.key,
                        resource = %resource,
                        error = %e,
                        "Failed to read stored version info"
                    );
                }
            }
        }

        debug!(contact = %registry.key, resources = registry.len(), "Loaded resource registry");
        registry
    }

    pub fn key(&self) -> &ContactKey {
        &self.key
    }

    pub fn policy(&self) -> InteractionPolicy {
        self.policy
    }

    /// Insert or replace the record for `info.resource`.
    pub fn apply_version_update(&mut self, info: VersionInfo) {
        let resource = info.resource.clone();
        if self.entries.insert(resource.clone(), info).is_none() {
            debug!(contact = %self.key, resource = %resource, "Created resource entry");
        }
    }

    /// Set only the `last_interaction` field of an existing entry.
    ///
    /// Updates for resources without an entry are dropped: without a version
    /// record there is nothing to attach the timestamp to.
    pub fn apply_last_interaction(
        &mut self,
        resource: &ResourceName,
        timestamp: DateTime<Utc>,
    ) -> InteractionOutcome {
        let Some(entry) = self.entries.get_mut(resource) else {
            return InteractionOutcome::UnknownResource;
        };

        if self.policy == InteractionPolicy::Monotonic {
            if let Some(current) = entry.last_interaction {
                if timestamp < current {
                    return InteractionOutcome::Stale;
                }
            }
        }

        entry.last_interaction = Some(timestamp);
        InteractionOutcome::Applied
    }

    pub fn get(&self, resource: &ResourceName) -> Option<&VersionInfo> {
        self.entries.get(resource)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resources with an entry, sorted.
    pub fn resources(&self) -> Vec<ResourceName> {
        let mut resources: Vec<_> = self.entries.keys().cloned().collect();
        resources.sort();
        resources
    }

    /// Entries sorted lexicographically by resource.
    pub fn snapshot(&self) -> ResourceSnapshot {
        let mut snapshot: ResourceSnapshot = self
            .entries
            .iter()
            .map(|(resource, info)| (resource.clone(), info.clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }
}
