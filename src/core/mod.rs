//! Core domain: models, persistence, services and infrastructure
//!
//! - `model`: store-backed entities and their polymorphic variants
//! - `data`: SQLite persistence for the content and statistics stores
//! - `services`: the admin operations exposed to the CLI
//! - `infrastructure`: blob storage, notifications, import tracking and
//!   HTML sanitization

pub mod data;
pub mod infrastructure;
pub mod model;
pub mod services;

#[cfg(test)]
pub mod test_support;

pub use data::{Database, StatsDatabase};
