//! Cross-cutting collaborators: blob storage, notifications, import
//! tracking and HTML sanitization
//!
//! Side-effecting collaborators are traits with a production and an
//! in-memory implementation so services can be exercised without real
//! storage or a notifier endpoint behind them.

pub mod blob;
pub mod imports;
pub mod notify;
pub mod sanitize;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use imports::{ImportStatus, ImportTracker, MemoryImportTracker, SqliteImportTracker};
pub use notify::{HttpNotifier, NoopNotifier, Notifier, RecordingNotifier, ReleaseNotice};
pub use sanitize::CommentMarkupStripper;
