//! Contact resource storage abstractions.
//!
//! This crate defines the read contract the resource tracking core consumes:
//! - which resources of a contact are known
//! - the last stored software version record per resource
//! - the capability hash each resource advertised
//! - the feature set stored for a capability hash
//!
//! Design stance:
//! - Writes are performed by the protocol layer, outside the tracking core.
//! - Capability sets are append-only and content addressed by their hash.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod error;
pub mod memory;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryContactStorage;
pub use traits::{CapabilityHashStore, ContactStorage, VersionInfoStore};
