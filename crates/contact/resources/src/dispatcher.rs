//! Update dispatch from the protocol layer to per-contact registries.
//!
//! One broadcast channel carries every [`ResourceEvent`]. Each registry
//! subscribes with its [`ContactKey`] and only sees events originating from
//! that account and contact; everything else is skipped without side effects.

use contact_types::{ContactKey, ResourceEvent, ResourceEventKind};
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::registry::{InteractionOutcome, ResourceRegistry};

/// Outcome of dispatching one event to one registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The event targets another account or contact.
    Ignored,

    /// The registry changed.
    Applied,

    /// Interaction update for a resource without an entry.
    Dropped,

    /// Interaction update older than the stored timestamp.
    Stale,
}

impl DispatchOutcome {
    pub fn changed(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Publish/subscribe hub for resource update events
#[derive(Clone)]
pub struct UpdateDispatcher {
    sender: broadcast::Sender<ResourceEvent>,
}

impl UpdateDispatcher {
    /// Create a new dispatcher with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event, returning the number of subscribers it reached
    pub fn publish(&self, event: ResourceEvent) -> usize {
        trace!(
            event_id = %event.id,
            kind = event.kind_name(),
            account = %event.account,
            contact = %event.contact,
            "Publishing resource event"
        );
        // No subscribers is fine: nobody is looking at this contact.
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to events for one contact
    pub fn subscribe(&self, key: ContactKey) -> ContactSubscription {
        ContactSubscription {
            key,
            receiver: self.sender.subscribe(),
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for UpdateDispatcher {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// What a subscription yields
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// An event targeting this contact.
    Event(ResourceEvent),

    /// The subscription fell behind and `n` events were overwritten.
    ///
    /// Some of them may have targeted this contact, so the receiver should
    /// rebuild its state from storage.
    Lagged(u64),
}

/// Receiver half scoped to one contact
pub struct ContactSubscription {
    key: ContactKey,
    receiver: broadcast::Receiver<ResourceEvent>,
}

impl ContactSubscription {
    pub fn key(&self) -> &ContactKey {
        &self.key
    }

    /// Next event targeting this contact in delivery order, or a lag notice.
    ///
    /// Returns `None` once the dispatcher is gone.
    pub async fn recv(&mut self) -> Option<Delivery> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.targets(&self.key) => return Some(Delivery::Event(event)),
                Ok(event) => {
                    trace!(contact = %self.key, event_id = %event.id, "Skipping event for other contact");
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(contact = %self.key, lagged = n, "Resource subscription lagged behind dispatcher");
                    return Some(Delivery::Lagged(n));
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(contact = %self.key, "Dispatcher closed");
                    return None;
                }
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    ///
    /// Returns `None` when nothing for this contact is queued right now.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.targets(&self.key) => return Some(Delivery::Event(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(contact = %self.key, lagged = n, "Resource subscription lagged behind dispatcher");
                    return Some(Delivery::Lagged(n));
                }
                Err(_) => return None,
            }
        }
    }
}

/// Translate one event into a registry mutation.
///
/// Events not targeting the registry's contact are ignored.
pub fn dispatch(registry: &mut ResourceRegistry, event: &ResourceEvent) -> DispatchOutcome {
    if !event.targets(registry.key()) {
        return DispatchOutcome::Ignored;
    }

    match &event.kind {
        ResourceEventKind::VersionUpdate(info) => {
            debug!(
                contact = %registry.key(),
                resource = %info.resource,
                event_id = %event.id,
                "Applying software version update"
            );
            registry.apply_version_update(info.clone());
            DispatchOutcome::Applied
        }
        ResourceEventKind::InteractionUpdate {
            resource,
            timestamp,
        } => match registry.apply_last_interaction(resource, *timestamp) {
            InteractionOutcome::Applied => {
                debug!(
                    contact = %registry.key(),
                    resource = %resource,
                    event_id = %event.id,
                    "Applied last interaction update"
                );
                DispatchOutcome::Applied
            }
            InteractionOutcome::UnknownResource => {
                debug!(
                    contact = %registry.key(),
                    resource = %resource,
                    "Dropping last interaction update for resource without version info"
                );
                DispatchOutcome::Dropped
            }
            InteractionOutcome::Stale => {
                debug!(
                    contact = %registry.key(),
                    resource = %resource,
                    "Rejecting stale last interaction update"
                );
                DispatchOutcome::Stale
            }
        },
    }
}
