//! Deferred, cancellable version refreshes.
//!
//! Activating a view schedules one batch of outbound queries after a short
//! delay so that rapid activate/deactivate cycles do not flood the peer. The
//! batch enumerates the resources captured at schedule time.

use std::sync::Arc;
use std::time::Duration;

use contact_types::{ContactKey, ResourceName};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::query::VersionQuery;

/// Schedules deferred outbound version queries
#[derive(Clone)]
pub struct RefreshScheduler {
    query: Arc<dyn VersionQuery>,
}

impl RefreshScheduler {
    pub fn new(query: Arc<dyn VersionQuery>) -> Self {
        Self { query }
    }

    /// Query every resource in `resources` once, after `after` has elapsed.
    ///
    /// Must be called from within a tokio runtime. The returned handle cancels
    /// the batch when dropped.
    pub fn schedule_refresh(
        &self,
        key: ContactKey,
        resources: Vec<ResourceName>,
        after: Duration,
    ) -> RefreshHandle {
        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let query = Arc::clone(&self.query);

        debug!(
            refresh_id = %id,
            contact = %key,
            resources = resources.len(),
            delay = ?after,
            "Scheduled version refresh"
        );

        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(refresh_id = %id, contact = %key, "Version refresh cancelled before firing");
                    return 0;
                }
                _ = tokio::time::sleep(after) => {}
            }

            let mut issued = 0;
            for resource in &resources {
                if token.is_cancelled() {
                    debug!(refresh_id = %id, contact = %key, issued, "Version refresh cancelled while firing");
                    break;
                }
                trace!(refresh_id = %id, contact = %key, resource = %resource, "Querying software version");
                query.request_version_and_capabilities(&key, resource);
                issued += 1;
            }

            debug!(refresh_id = %id, contact = %key, issued, "Version refresh fired");
            issued
        });

        RefreshHandle {
            id,
            cancel,
            task: Some(task),
        }
    }
}

/// Handle to one scheduled refresh batch
pub struct RefreshHandle {
    id: Uuid,
    cancel: CancellationToken,
    task: Option<JoinHandle<usize>>,
}

impl RefreshHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stop the batch. Requests already issued stay issued.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// True once the batch has fired or observed its cancellation
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the batch and return the number of requests issued.
    pub async fn join(mut self) -> usize {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(0),
            None => 0,
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        // Dropped without join: the owner is gone, so is the batch.
        if self.task.is_some() {
            self.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingQuery {
        calls: Mutex<Vec<(ContactKey, ResourceName)>>,
    }

    impl RecordingQuery {
        fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(_, r)| r.as_str().to_string())
                .collect()
        }
    }

    impl VersionQuery for RecordingQuery {
        fn request_version_and_capabilities(&self, key: &ContactKey, resource: &ResourceName) {
            self.calls
                .lock()
                .unwrap()
                .push((key.clone(), resource.clone()));
        }
    }

    fn alice() -> ContactKey {
        ContactKey::new("acct-1", "alice@example.org")
    }

    fn resources(names: &[&str]) -> Vec<ResourceName> {
        names.iter().map(|n| ResourceName::new(*n)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_resource_after_delay() {
        let query = Arc::new(RecordingQuery::default());
        let scheduler = RefreshScheduler::new(query.clone());

        let handle =
            scheduler.schedule_refresh(alice(), resources(&["phone", "laptop"]), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(query.calls().is_empty());

        assert_eq!(handle.join().await, 2);
        assert_eq!(query.calls(), vec!["phone", "laptop"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_delay_issues_nothing() {
        let query = Arc::new(RecordingQuery::default());
        let scheduler = RefreshScheduler::new(query.clone());

        let handle =
            scheduler.schedule_refresh(alice(), resources(&["phone", "laptop"]), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(200)).await;
        handle.cancel();

        assert!(handle.is_cancelled());
        assert_eq!(handle.join().await, 0);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(query.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels() {
        let query = Arc::new(RecordingQuery::default());
        let scheduler = RefreshScheduler::new(query.clone());

        drop(scheduler.schedule_refresh(alice(), resources(&["phone"]), Duration::from_secs(1)));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(query.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn batch_uses_resources_captured_at_schedule_time() {
        let query = Arc::new(RecordingQuery::default());
        let scheduler = RefreshScheduler::new(query.clone());
        let mut captured = resources(&["phone"]);

        let handle =
            scheduler.schedule_refresh(alice(), captured.clone(), Duration::from_secs(1));
        captured.push(ResourceName::new("tablet"));

        assert_eq!(handle.join().await, 1);
        assert_eq!(query.calls(), vec!["phone"]);
    }
}
