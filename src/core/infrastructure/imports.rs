//! Import tracking for uploaded data files
//!
//! Every data file upload creates an import row; the checklist blocks
//! approval until all imports for a release have completed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::core::data::Database;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Queued,
    Running,
    Complete,
    Failed,
    Cancelled,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Queued => "queued",
            ImportStatus::Running => "running",
            ImportStatus::Complete => "complete",
            ImportStatus::Failed => "failed",
            ImportStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(ImportStatus::Queued),
            "running" => Some(ImportStatus::Running),
            "complete" => Some(ImportStatus::Complete),
            "failed" => Some(ImportStatus::Failed),
            "cancelled" => Some(ImportStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ImportStatus::Complete)
    }
}

#[async_trait]
pub trait ImportTracker: Send + Sync {
    async fn create_import(&self, file_id: Uuid, total_rows: i64) -> Result<()>;

    async fn import_status(&self, file_id: Uuid) -> Result<Option<ImportStatus>>;

    async fn set_import_status(&self, file_id: Uuid, status: ImportStatus) -> Result<()>;

    async fn delete_import(&self, file_id: Uuid) -> Result<()>;
}

/// Tracker backed by the content store's `data_imports` table.
pub struct SqliteImportTracker {
    db: Arc<Database>,
}

impl SqliteImportTracker {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ImportTracker for SqliteImportTracker {
    async fn create_import(&self, file_id: Uuid, total_rows: i64) -> Result<()> {
        self.db
            .insert_import_row(file_id, ImportStatus::Queued.as_str(), total_rows, Utc::now())
    }

    async fn import_status(&self, file_id: Uuid) -> Result<Option<ImportStatus>> {
        let row = self.db.get_import_row(file_id)?;
        Ok(row.and_then(|(status, _)| ImportStatus::parse(&status)))
    }

    async fn set_import_status(&self, file_id: Uuid, status: ImportStatus) -> Result<()> {
        self.db.update_import_status(file_id, status.as_str())
    }

    async fn delete_import(&self, file_id: Uuid) -> Result<()> {
        self.db.delete_import_row(file_id)
    }
}

/// In-memory tracker used by tests.
#[derive(Default)]
pub struct MemoryImportTracker {
    statuses: Mutex<HashMap<Uuid, ImportStatus>>,
}

impl MemoryImportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a status directly, bypassing the create/update flow.
    pub fn set(&self, file_id: Uuid, status: ImportStatus) {
        self.statuses.lock().insert(file_id, status);
    }

    pub fn contains(&self, file_id: Uuid) -> bool {
        self.statuses.lock().contains_key(&file_id)
    }
}

#[async_trait]
impl ImportTracker for MemoryImportTracker {
    async fn create_import(&self, file_id: Uuid, _total_rows: i64) -> Result<()> {
        self.statuses.lock().insert(file_id, ImportStatus::Queued);
        Ok(())
    }

    async fn import_status(&self, file_id: Uuid) -> Result<Option<ImportStatus>> {
        Ok(self.statuses.lock().get(&file_id).copied())
    }

    async fn set_import_status(&self, file_id: Uuid, status: ImportStatus) -> Result<()> {
        self.statuses.lock().insert(file_id, status);
        Ok(())
    }

    async fn delete_import(&self, file_id: Uuid) -> Result<()> {
        self.statuses.lock().remove(&file_id);
        Ok(())
    }
}
