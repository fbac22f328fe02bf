//! SQLite persistence for the content and statistics stores
//!
//! `Database` wraps the content store; `StatsDatabase` wraps the companion
//! statistics store. Query methods are spread across one file per entity
//! family, all as `impl Database` blocks. Sibling orderings are rewritten
//! whole inside a single transaction wherever an invariant depends on them.

pub mod amendment;
pub mod content;
pub mod database;
pub mod files;
pub mod key_stats;
pub mod releases;
pub mod statistics;

pub use database::{Database, StatsDatabase};
