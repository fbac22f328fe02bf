//! Pre-approval checklist
//!
//! Collects the open issues that block a release from being approved.
//! Issues come back as validation errors so the approval path can return
//! them verbatim.

use std::sync::Arc;

use crate::core::data::Database;
use crate::core::infrastructure::ImportTracker;
use crate::core::model::{FileKind, Release};
use crate::error::{Result, ValidationCode, ValidationError};

pub struct ChecklistService {
    db: Arc<Database>,
    imports: Arc<dyn ImportTracker>,
}

impl ChecklistService {
    pub fn new(db: Arc<Database>, imports: Arc<dyn ImportTracker>) -> Self {
        Self { db, imports }
    }

    pub async fn errors(&self, release: &Release) -> Result<Vec<ValidationError>> {
        let mut errors = Vec::new();

        let data_files = self.db.list_release_files(release.id, Some(FileKind::Data))?;

        let mut imports_pending = false;
        let mut replacements_pending = false;
        for info in &data_files {
            match self.imports.import_status(info.file.id).await? {
                Some(status) if status.is_complete() => {}
                _ => imports_pending = true,
            }
            if info.file.replaced_by_id.is_some() {
                replacements_pending = true;
            }
        }
        if imports_pending {
            errors.push(ValidationError::new(
                ValidationCode::DataFileImportsMustBeCompleted,
            ));
        }
        if replacements_pending {
            errors.push(ValidationError::new(
                ValidationCode::DataFileReplacementsMustBeCompleted,
            ));
        }

        let guidance_missing = release
            .data_guidance
            .as_deref()
            .map_or(true, |g| g.trim().is_empty());
        if !data_files.is_empty() && guidance_missing {
            errors.push(ValidationError::new(
                ValidationCode::PublicDataGuidanceRequired,
            ));
        }

        if release.is_amendment() && self.db.list_release_notes(release.id)?.is_empty() {
            errors.push(ValidationError::new(ValidationCode::ReleaseNoteRequired));
        }

        Ok(errors)
    }
}
