//! Live update events for contact resources
//!
//! Events are produced by the protocol layer after it has persisted the
//! underlying data, and are delivered to every subscribed registry. Each
//! event names the account and contact it originates from so subscribers can
//! filter without inspecting the payload.

use crate::{AccountId, ContactJid, ContactKey, ResourceName, VersionInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of a published event, used for log correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event:{}", self.0)
    }
}

/// Update addressed to one contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEvent {
    /// Unique event ID
    pub id: EventId,

    /// Account the update was received on
    pub account: AccountId,

    /// Bare JID of the contact the update concerns
    pub contact: ContactJid,

    /// The actual update
    pub kind: ResourceEventKind,
}

/// Kinds of resource updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceEventKind {
    /// A software version reply (or a stored record) for one resource
    VersionUpdate(VersionInfo),

    /// Fresh activity observed from one resource
    InteractionUpdate {
        resource: ResourceName,
        timestamp: DateTime<Utc>,
    },
}

impl ResourceEvent {
    pub fn new(key: &ContactKey, kind: ResourceEventKind) -> Self {
        Self {
            id: EventId::generate(),
            account: key.account.clone(),
            contact: key.jid.clone(),
            kind,
        }
    }

    /// Version update for the contact identified by `key`
    pub fn version_update(key: &ContactKey, info: VersionInfo) -> Self {
        Self::new(key, ResourceEventKind::VersionUpdate(info))
    }

    /// Last-interaction update for one resource of the contact identified by `key`
    pub fn interaction_update(
        key: &ContactKey,
        resource: impl Into<ResourceName>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            key,
            ResourceEventKind::InteractionUpdate {
                resource: resource.into(),
                timestamp,
            },
        )
    }

    /// Match predicate: the event originates from `key`'s account and contact.
    pub fn targets(&self, key: &ContactKey) -> bool {
        key.matches(&self.account, &self.contact)
    }

    /// Resource the update concerns
    pub fn resource(&self) -> &ResourceName {
        match &self.kind {
            ResourceEventKind::VersionUpdate(info) => &info.resource,
            ResourceEventKind::InteractionUpdate { resource, .. } => resource,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ResourceEventKind::VersionUpdate(_) => "version_update",
            ResourceEventKind::InteractionUpdate { .. } => "interaction_update",
        }
    }
}
