//! Contact Resources - live resource and capability tracking per contact
//!
//! For one conversational peer this crate keeps the set of known client
//! resources with their software version records, and resolves each
//! resource's capability hash into its feature set. Three sources feed it:
//!
//! - **Storage**: cold load of everything the protocol layer persisted
//! - **Update events**: live version and last-interaction updates
//! - **Refresh queries**: deferred outbound requests whose replies come back
//!   as update events
//!
//! ## Architectural Boundaries
//!
//! - **Protocol layer** owns: stanza parsing, persistence writes, sending queries
//! - **This crate** owns: the per-contact view, event matching, caps resolution
//! - **Frontends** own: rendering of snapshots and capability lists

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod capabilities;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod query;
pub mod registry;
pub mod scheduler;
pub mod tracker;
pub mod view;

pub use capabilities::CapabilityResolver;
pub use config::{EventConfig, InteractionPolicy, RefreshConfig, TrackerConfig, ViewConfig};
pub use dispatcher::{dispatch, ContactSubscription, Delivery, DispatchOutcome, UpdateDispatcher};
pub use error::{TrackerError, TrackerResult};
pub use query::VersionQuery;
pub use registry::{InteractionOutcome, ResourceRegistry, ResourceSnapshot};
pub use scheduler::{RefreshHandle, RefreshScheduler};
pub use tracker::ResourceTracker;
pub use view::{ContactResourcesView, ViewContext};
