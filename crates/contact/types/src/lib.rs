//! Contact Types - Core types for per-contact resource tracking
//!
//! A contact is a conversational peer identified by the local account it is
//! reachable through and its bare JID. Each contact owns zero or more
//! resources, one per connected client instance.
//!
//! ## Key Concepts
//!
//! - **ContactKey**: (account, bare JID) pair scoping every lookup and event
//! - **VersionInfo**: software identity and last interaction of one resource
//! - **CapabilityHash**: opaque `ver` string advertised by a peer
//! - **CapabilitySet**: feature identifiers a capability hash expands to
//! - **ResourceEvent**: typed live update addressed to one contact

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod capability;
pub mod events;
pub mod ids;
pub mod version;

pub use capability::{CapabilityHash, CapabilitySet};
pub use events::{EventId, ResourceEvent, ResourceEventKind};
pub use ids::{AccountId, ContactJid, ContactKey, ResourceName};
pub use version::{VersionInfo, UNSUPPORTED_LABEL};
