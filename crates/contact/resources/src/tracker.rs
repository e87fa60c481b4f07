//! Entry point wiring storage, dispatch, resolution and refresh together.

use std::sync::Arc;

use contact_store::{CapabilityHashStore, ContactStorage, VersionInfoStore};
use contact_types::ContactKey;

use crate::capabilities::CapabilityResolver;
use crate::config::TrackerConfig;
use crate::dispatcher::UpdateDispatcher;
use crate::query::VersionQuery;
use crate::scheduler::RefreshScheduler;
use crate::view::{ContactResourcesView, ViewContext};

/// Shared tracking core for all contacts of a client
pub struct ResourceTracker {
    ctx: ViewContext,
}

impl ResourceTracker {
    /// Create a tracker over separate version and capability stores
    pub fn new(
        versions: Arc<dyn VersionInfoStore>,
        capabilities: Arc<dyn CapabilityHashStore>,
        query: Arc<dyn VersionQuery>,
        config: TrackerConfig,
    ) -> Self {
        let ctx = ViewContext {
            versions,
            resolver: Arc::new(CapabilityResolver::new(capabilities)),
            dispatcher: UpdateDispatcher::new(config.events.channel_capacity),
            scheduler: RefreshScheduler::new(query),
            config,
        };
        Self { ctx }
    }

    /// Create a tracker over one storage backend implementing both stores
    pub fn with_storage<S>(storage: Arc<S>, query: Arc<dyn VersionQuery>, config: TrackerConfig) -> Self
    where
        S: ContactStorage + 'static,
    {
        let versions: Arc<dyn VersionInfoStore> = storage.clone();
        let capabilities: Arc<dyn CapabilityHashStore> = storage;
        Self::new(versions, capabilities, query, config)
    }

    /// Open a live view of one contact's resources
    pub async fn open_view(&self, key: ContactKey) -> ContactResourcesView {
        ContactResourcesView::open(key, self.ctx.clone()).await
    }

    /// Dispatcher the protocol layer publishes updates to
    pub fn dispatcher(&self) -> &UpdateDispatcher {
        &self.ctx.dispatcher
    }

    pub fn resolver(&self) -> &Arc<CapabilityResolver> {
        &self.ctx.resolver
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.ctx.scheduler
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.ctx.config
    }
}
