//! Owning context for one contact's resource registry.
//!
//! A [`ContactResourcesView`] is a handle to a task that exclusively owns a
//! [`ResourceRegistry`]. Update events (from the dispatcher subscription) and
//! commands (from the handle) are both marshalled onto that task, which is the
//! only place the registry is mutated. Every applied change is published as a
//! fresh snapshot on a watch channel.

use std::sync::Arc;
use std::time::Duration;

use contact_store::VersionInfoStore;
use contact_types::{ContactKey, ResourceName};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::capabilities::CapabilityResolver;
use crate::config::TrackerConfig;
use crate::dispatcher::{dispatch, ContactSubscription, Delivery, UpdateDispatcher};
use crate::error::{TrackerError, TrackerResult};
use crate::registry::{ResourceRegistry, ResourceSnapshot};
use crate::scheduler::{RefreshHandle, RefreshScheduler};

/// Events handled back to back before a queued command is served
const EVENT_BURST: usize = 64;

/// Commands marshalled onto the owning task
enum ViewCommand {
    Activate,
    Deactivate,
    Snapshot(oneshot::Sender<ResourceSnapshot>),
    RefreshPending(oneshot::Sender<bool>),
    Close(oneshot::Sender<()>),
}

/// Shared collaborators a view needs
#[derive(Clone)]
pub struct ViewContext {
    pub versions: Arc<dyn VersionInfoStore>,
    pub resolver: Arc<CapabilityResolver>,
    pub dispatcher: UpdateDispatcher,
    pub scheduler: RefreshScheduler,
    pub config: TrackerConfig,
}

/// Handle to a live per-contact resource view
pub struct ContactResourcesView {
    key: ContactKey,
    commands: mpsc::Sender<ViewCommand>,
    changes: watch::Receiver<ResourceSnapshot>,
    resolver: Arc<CapabilityResolver>,
    task: Option<JoinHandle<()>>,
}

impl ContactResourcesView {
    /// Subscribe, cold-load the registry, then start the owning task.
    ///
    /// The subscription is taken before loading so events published while
    /// the load is in flight queue up and are applied once it completes.
    #[instrument(skip_all, fields(contact = %key))]
    pub async fn open(key: ContactKey, ctx: ViewContext) -> Self {
        let subscription = ctx.dispatcher.subscribe(key.clone());
        let registry = ResourceRegistry::load(
            key.clone(),
            ctx.versions.as_ref(),
            ctx.config.interaction_policy,
        )
        .await;

        let (commands, command_rx) = mpsc::channel(ctx.config.views.command_capacity);
        let (change_tx, changes) = watch::channel(registry.snapshot());

        let owner = ViewOwner {
            registry,
            subscription,
            commands: command_rx,
            changes: change_tx,
            versions: ctx.versions,
            scheduler: ctx.scheduler,
            refresh_enabled: ctx.config.refresh.enabled,
            refresh_delay: ctx.config.refresh.delay(),
            pending_refresh: None,
        };
        let task = tokio::spawn(owner.run());

        info!(contact = %key, "Opened contact resources view");

        Self {
            key,
            commands,
            changes,
            resolver: ctx.resolver,
            task: Some(task),
        }
    }

    pub fn key(&self) -> &ContactKey {
        &self.key
    }

    /// Schedule a deferred version refresh for the contact's known resources.
    ///
    /// A refresh still pending from an earlier activation is replaced.
    pub async fn activate(&self) -> TrackerResult<()> {
        self.send(ViewCommand::Activate).await
    }

    /// Cancel a pending refresh.
    pub async fn deactivate(&self) -> TrackerResult<()> {
        self.send(ViewCommand::Deactivate).await
    }

    /// Current entries, sorted by resource.
    pub async fn snapshot(&self) -> TrackerResult<ResourceSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(ViewCommand::Snapshot(tx)).await?;
        rx.await.map_err(|_| self.closed())
    }

    /// True while a scheduled refresh has neither fired nor been cancelled.
    pub async fn refresh_pending(&self) -> TrackerResult<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(ViewCommand::RefreshPending(tx)).await?;
        rx.await.map_err(|_| self.closed())
    }

    /// Receiver notified with a new snapshot after every change.
    pub fn changes(&self) -> watch::Receiver<ResourceSnapshot> {
        self.changes.clone()
    }

    /// Sorted capabilities of one resource; empty when unknown.
    pub async fn resolve_capabilities(&self, resource: &ResourceName) -> Vec<String> {
        self.resolver.resolve_capabilities(&self.key, resource).await
    }

    /// Tear the view down: cancel any pending refresh and stop the task.
    pub async fn close(mut self) -> TrackerResult<()> {
        let (tx, rx) = oneshot::channel();
        self.send(ViewCommand::Close(tx)).await?;
        rx.await.map_err(|_| self.closed())?;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        Ok(())
    }

    async fn send(&self, command: ViewCommand) -> TrackerResult<()> {
        self.commands.send(command).await.map_err(|_| self.closed())
    }

    fn closed(&self) -> TrackerError {
        TrackerError::ViewClosed(self.key.to_string())
    }
}

impl Drop for ContactResourcesView {
    fn drop(&mut self) {
        // Dropping the command sender ends the task; aborting makes it prompt.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// State owned by the view task
struct ViewOwner {
    registry: ResourceRegistry,
    subscription: ContactSubscription,
    commands: mpsc::Receiver<ViewCommand>,
    changes: watch::Sender<ResourceSnapshot>,
    versions: Arc<dyn VersionInfoStore>,
    scheduler: RefreshScheduler,
    refresh_enabled: bool,
    refresh_delay: Duration,
    pending_refresh: Option<RefreshHandle>,
}

impl ViewOwner {
    async fn run(mut self) {
        let mut burst = 0;
        loop {
            // A long event burst yields to one queued command.
            if burst >= EVENT_BURST {
                burst = 0;
                if let Ok(command) = self.commands.try_recv() {
                    if !self.handle_command(command).await {
                        break;
                    }
                    continue;
                }
            }

            // Queued events go first so a read issued after a publish sees it.
            tokio::select! {
                biased;
                delivery = self.subscription.recv() => match delivery {
                    Some(delivery) => {
                        burst += 1;
                        self.handle_delivery(delivery).await;
                    }
                    None => {
                        warn!(contact = %self.registry.key(), "Update dispatcher closed; view no longer live");
                        self.drain_commands().await;
                        break;
                    }
                },
                command = self.commands.recv() => match command {
                    Some(command) => {
                        burst = 0;
                        if !self.handle_command(command).await {
                            break;
                        }
                    }
                    None => {
                        self.cancel_refresh();
                        break;
                    }
                },
            }
        }
        debug!(contact = %self.registry.key(), "Contact resources view stopped");
    }

    async fn handle_delivery(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Event(event) => {
                if dispatch(&mut self.registry, &event).changed() {
                    self.changes.send_replace(self.registry.snapshot());
                }
            }
            Delivery::Lagged(missed) => {
                // Updates are persisted before they are published, so a
                // reload recovers whatever the lost window held.
                let key = self.registry.key().clone();
                info!(contact = %key, missed, "Reloading contact resources after lag");
                self.registry =
                    ResourceRegistry::load(key, self.versions.as_ref(), self.registry.policy()).await;
                self.changes.send_replace(self.registry.snapshot());
            }
        }
    }

    /// Returns false once the view should stop.
    async fn handle_command(&mut self, command: ViewCommand) -> bool {
        match command {
            ViewCommand::Activate => self.schedule_refresh().await,
            ViewCommand::Deactivate => self.cancel_refresh(),
            ViewCommand::Snapshot(reply) => {
                let _ = reply.send(self.registry.snapshot());
            }
            ViewCommand::RefreshPending(reply) => {
                let pending = self
                    .pending_refresh
                    .as_ref()
                    .is_some_and(|h| !h.is_cancelled() && !h.is_finished());
                let _ = reply.send(pending);
            }
            ViewCommand::Close(ack) => {
                self.cancel_refresh();
                let _ = ack.send(());
                return false;
            }
        }
        true
    }

    /// Without live events the view can still answer reads until closed.
    async fn drain_commands(&mut self) {
        while let Some(command) = self.commands.recv().await {
            if !self.handle_command(command).await {
                return;
            }
        }
        self.cancel_refresh();
    }

    async fn schedule_refresh(&mut self) {
        self.cancel_refresh();
        if !self.refresh_enabled {
            return;
        }

        let key = self.registry.key().clone();
        let resources: Vec<ResourceName> = match self.versions.resources_known(&key).await {
            Ok(resources) => resources.into_iter().collect(),
            Err(e) => {
                warn!(contact = %key, error = %e, "Failed to list known resources; refreshing loaded ones");
                self.registry.resources()
            }
        };

        if resources.is_empty() {
            debug!(contact = %key, "No known resources to refresh");
            return;
        }

        self.pending_refresh = Some(
            self.scheduler
                .schedule_refresh(key, resources, self.refresh_delay),
        );
    }

    fn cancel_refresh(&mut self) {
        if let Some(handle) = self.pending_refresh.take() {
            handle.cancel();
        }
    }
}
