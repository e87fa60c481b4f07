//! Outbound query contract towards the protocol layer.

use contact_types::{ContactKey, ResourceName};

/// Sends software version (XEP-0092) and capability discovery requests.
///
/// Fire-and-forget: replies, if the peer ever answers, come back as
/// [`contact_types::ResourceEvent`]s through the update dispatcher.
pub trait VersionQuery: Send + Sync {
    fn request_version_and_capabilities(&self, key: &ContactKey, resource: &ResourceName);
}
