//! Service construction and dependency injection
//!
//! `SimpleServices` builds the stores and collaborators from config and
//! wires the domain services together. The collaborator traits
//! (`BlobStore`, `Notifier`, `ImportTracker`) are re-exported here; tests
//! substitute their in-memory implementations directly.

pub mod simple_container;

pub use simple_container::{ServiceSet, SimpleServices};

pub use crate::core::infrastructure::{BlobStore, ImportTracker, Notifier};
