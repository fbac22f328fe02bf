//! Release approval service
//!
//! Status creation is where lifecycle rules are enforced and where the
//! approval side effects fire: unused-image cleanup, pre-release invites
//! (first time only), the optional subscriber notice and exactly one
//! publish-change signal.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::data::Database;
use crate::core::infrastructure::{BlobStore, Notifier, ReleaseNotice};
use crate::core::model::{ApprovalStatus, BlockKind, FileKind, Release, ReleaseStatus};
use crate::error::{Result, StatDeskError, ValidationCode, ValidationError};

use super::checklist::ChecklistService;

pub struct StatusSubmission {
    pub approval_status: ApprovalStatus,
    pub internal_note: Option<String>,
    /// Overrides the release's scheduled publish date when set.
    pub publish_scheduled: Option<NaiveDate>,
    /// Defaults to true for an initial release, false for an amendment.
    pub notify_subscribers: Option<bool>,
}

pub struct ReleaseApprovalService {
    db: Arc<Database>,
    checklist: Arc<ChecklistService>,
    notifier: Arc<dyn Notifier>,
    blobs: Arc<dyn BlobStore>,
}

impl ReleaseApprovalService {
    pub fn new(
        db: Arc<Database>,
        checklist: Arc<ChecklistService>,
        notifier: Arc<dyn Notifier>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            db,
            checklist,
            notifier,
            blobs,
        }
    }

    pub async fn create_status(
        &self,
        release_id: Uuid,
        submission: StatusSubmission,
        actor: &str,
    ) -> Result<ReleaseStatus> {
        let release = self
            .db
            .get_release(release_id)?
            .ok_or(StatDeskError::NotFound)?;
        let publication = self
            .db
            .get_publication(release.publication_id)?
            .ok_or(StatDeskError::NotFound)?;

        let mut errors = Vec::new();
        if release.live() && submission.approval_status == ApprovalStatus::Draft {
            errors.push(ValidationError::new(
                ValidationCode::PublishedReleaseCannotBeUnapproved,
            ));
        }
        let publish_scheduled = submission.publish_scheduled.or(release.publish_scheduled);
        if submission.approval_status == ApprovalStatus::Approved {
            if publish_scheduled.is_none() {
                errors.push(ValidationError::new(
                    ValidationCode::ApprovedReleaseMustHavePublishScheduledDate,
                ));
            }
            errors.extend(self.checklist.errors(&release).await?);
        }
        if !errors.is_empty() {
            return Err(StatDeskError::validation_all(errors));
        }

        let removed = self.remove_unused_images(&release).await?;
        if removed > 0 {
            info!("Removed {} unused images from release {}", removed, release_id);
        }

        let notify_subscribers = submission
            .notify_subscribers
            .unwrap_or(!release.is_amendment());
        self.db
            .update_release_approval(release_id, submission.approval_status, notify_subscribers)?;
        if submission.publish_scheduled.is_some() {
            self.db
                .update_release_publish_scheduled(release_id, publish_scheduled)?;
        }

        let status = ReleaseStatus {
            id: Uuid::new_v4(),
            release_id,
            approval_status: submission.approval_status,
            internal_note: submission.internal_note,
            created_by: actor.to_string(),
            created_at: Utc::now(),
        };
        self.db.insert_release_status(&status)?;
        info!(
            "Release {} moved to {:?} by {}",
            release_id, submission.approval_status, actor
        );

        if submission.approval_status == ApprovalStatus::Approved {
            let notice = ReleaseNotice {
                release_id,
                publication_title: publication.title.clone(),
                slug: publication.slug.clone(),
                amendment: release.is_amendment(),
            };

            for invite in self
                .db
                .list_invites(release_id)?
                .into_iter()
                .filter(|invite| !invite.sent)
            {
                self.notifier
                    .send_prerelease_invite(&invite.email, &notice)
                    .await?;
                self.db.mark_invite_sent(invite.id)?;
            }

            if notify_subscribers {
                self.notifier.notify_subscribers(&notice).await?;
            }

            let immediate =
                publish_scheduled.map_or(false, |date| date <= Utc::now().date_naive());
            self.notifier.release_changed(&notice, immediate).await?;
        }

        Ok(status)
    }

    /// Full status history, newest first, walking back through the
    /// amendment chain.
    pub async fn list_statuses(&self, release_id: Uuid) -> Result<Vec<ReleaseStatus>> {
        let mut release = self
            .db
            .get_release(release_id)?
            .ok_or(StatDeskError::NotFound)?;
        let mut history = Vec::new();
        loop {
            history.extend(self.db.list_release_statuses(release.id)?);
            match release.previous_version_id {
                Some(previous_id) => match self.db.get_release(previous_id)? {
                    Some(previous) => release = previous,
                    None => {
                        warn!(
                            "Release {} names missing previous version {}",
                            release.id, previous_id
                        );
                        break;
                    }
                },
                None => break,
            }
        }
        Ok(history)
    }

    /// Drop image links no html body of the release references; the blob
    /// and file row go too once no other release links the image.
    async fn remove_unused_images(&self, release: &Release) -> Result<usize> {
        let images = self.db.list_release_files(release.id, Some(FileKind::Image))?;
        if images.is_empty() {
            return Ok(0);
        }
        let Some(page) = self.db.get_release_page(release.id)? else {
            return Ok(0);
        };
        let Some(tree) = self.db.get_page_tree(page.id)? else {
            return Ok(0);
        };

        let bodies: Vec<String> = tree
            .sections
            .iter()
            .flat_map(|section| &section.blocks)
            .filter_map(|block| match &block.block.kind {
                BlockKind::Html { body } => Some(body.clone()),
                _ => None,
            })
            .collect();

        let mut removed = 0;
        for info in images {
            let id_fragment = info.file.id.to_string();
            if bodies.iter().any(|body| body.contains(&id_fragment)) {
                continue;
            }
            self.db.delete_release_file_link(release.id, info.file.id)?;
            if self.db.count_file_links(info.file.id)? == 0 {
                self.blobs.delete(&info.file.blob_path()).await?;
                self.db.delete_file_row(info.file.id)?;
            }
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crate::core::infrastructure::{
        ImportStatus, MemoryBlobStore, MemoryImportTracker, RecordingNotifier,
    };
    use crate::core::model::{FileReference, ReleaseFileLink};
    use crate::core::services::content::ContentService;
    use crate::core::services::releases::ReleaseService;
    use crate::core::test_support::{content_db, seed_publication, seed_release};

    struct Fixture {
        db: Arc<Database>,
        service: ReleaseApprovalService,
        notifier: Arc<RecordingNotifier>,
        blobs: Arc<MemoryBlobStore>,
        imports: Arc<MemoryImportTracker>,
        release: Release,
    }

    fn fixture() -> Fixture {
        let db = content_db();
        let publication = seed_publication(&db);
        let release = seed_release(&db, &publication);
        let notifier = Arc::new(RecordingNotifier::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let imports = Arc::new(MemoryImportTracker::new());
        let checklist = Arc::new(ChecklistService::new(db.clone(), imports.clone()));
        let service = ReleaseApprovalService::new(
            db.clone(),
            checklist,
            notifier.clone(),
            blobs.clone(),
        );
        Fixture {
            db,
            service,
            notifier,
            blobs,
            imports,
            release,
        }
    }

    fn approve_submission() -> StatusSubmission {
        StatusSubmission {
            approval_status: ApprovalStatus::Approved,
            internal_note: Some("Ready".to_string()),
            publish_scheduled: Some(NaiveDate::from_ymd_opt(2030, 1, 1).expect("valid date")),
            notify_subscribers: None,
        }
    }

    fn seed_data_file(fixture: &Fixture, status: Option<ImportStatus>) -> Uuid {
        let file = FileReference {
            id: Uuid::new_v4(),
            filename: "absence.csv".to_string(),
            content_type: "text/csv".to_string(),
            size: 100,
            kind: FileKind::Data,
            source_archive_id: None,
            paired_file_id: None,
            replacing_id: None,
            replaced_by_id: None,
            created_by: "author@example.test".to_string(),
            created_at: Utc::now(),
        };
        fixture.db.insert_file(&file).unwrap();
        fixture
            .db
            .insert_release_file(&ReleaseFileLink {
                id: Uuid::new_v4(),
                release_id: fixture.release.id,
                file_id: file.id,
                name: Some("Absence data".to_string()),
                ord: 0,
            })
            .unwrap();
        if let Some(status) = status {
            fixture.imports.set(file.id, status);
        }
        file.id
    }

    #[tokio::test]
    async fn test_approval_requires_publish_scheduled_date() {
        let fixture = fixture();
        let err = fixture
            .service
            .create_status(
                fixture.release.id,
                StatusSubmission {
                    publish_scheduled: None,
                    ..approve_submission()
                },
                "approver@example.test",
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::ApprovedReleaseMustHavePublishScheduledDate]
        );
        assert!(fixture.notifier.changes().is_empty());
    }

    #[tokio::test]
    async fn test_published_release_cannot_return_to_draft() {
        let fixture = fixture();
        fixture
            .db
            .set_release_published(fixture.release.id, Utc::now())
            .unwrap();

        let err = fixture
            .service
            .create_status(
                fixture.release.id,
                StatusSubmission {
                    approval_status: ApprovalStatus::Draft,
                    internal_note: None,
                    publish_scheduled: None,
                    notify_subscribers: None,
                },
                "approver@example.test",
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::PublishedReleaseCannotBeUnapproved]
        );
    }

    #[tokio::test]
    async fn test_checklist_issues_block_approval_without_side_effects() {
        let fixture = fixture();
        seed_data_file(&fixture, Some(ImportStatus::Running));
        fixture
            .db
            .update_release_data_guidance(fixture.release.id, "Guidance text")
            .unwrap();

        let err = fixture
            .service
            .create_status(fixture.release.id, approve_submission(), "approver@example.test")
            .await
            .unwrap_err();

        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::DataFileImportsMustBeCompleted]
        );
        assert!(fixture.notifier.invites().is_empty());
        assert!(fixture.notifier.subscriber_notices().is_empty());
        assert!(fixture.notifier.changes().is_empty());
    }

    #[tokio::test]
    async fn test_clean_approval_fires_each_side_effect_once() {
        let fixture = fixture();
        seed_data_file(&fixture, Some(ImportStatus::Complete));
        fixture
            .db
            .update_release_data_guidance(fixture.release.id, "Guidance text")
            .unwrap();

        let releases = ReleaseService::new(fixture.db.clone(), crate::core::test_support::stats_db());
        releases
            .add_prerelease_invite(fixture.release.id, "viewer@example.test")
            .await
            .unwrap();

        let status = fixture
            .service
            .create_status(fixture.release.id, approve_submission(), "approver@example.test")
            .await
            .unwrap();

        assert_eq!(status.approval_status, ApprovalStatus::Approved);
        assert_eq!(fixture.notifier.invites(), vec!["viewer@example.test".to_string()]);
        assert_eq!(fixture.notifier.subscriber_notices(), vec![fixture.release.id]);
        assert_eq!(fixture.notifier.changes(), vec![fixture.release.id]);

        let release = fixture.db.get_release(fixture.release.id).unwrap().unwrap();
        assert_eq!(release.approval_status, ApprovalStatus::Approved);
        assert!(release.notify_subscribers);
    }

    #[tokio::test]
    async fn test_amendment_approval_defaults_to_no_subscriber_notice() {
        let fixture = fixture();
        let mut amendment = fixture.release.clone();
        amendment.id = Uuid::new_v4();
        amendment.version = 1;
        amendment.previous_version_id = Some(fixture.release.id);
        fixture.db.insert_release(&amendment).unwrap();

        // Amendments need an update-history entry before approval.
        fixture
            .db
            .insert_release_note(&crate::core::model::ReleaseNote {
                id: Uuid::new_v4(),
                release_id: amendment.id,
                ord: 0,
                reason: "Corrected figures".to_string(),
                created_by: "author@example.test".to_string(),
                created_at: Utc::now(),
            })
            .unwrap();

        fixture
            .service
            .create_status(amendment.id, approve_submission(), "approver@example.test")
            .await
            .unwrap();

        // Amendments stay silent unless explicitly requested.
        assert!(fixture.notifier.subscriber_notices().is_empty());
        assert_eq!(fixture.notifier.changes(), vec![amendment.id]);

        fixture
            .service
            .create_status(
                amendment.id,
                StatusSubmission {
                    notify_subscribers: Some(true),
                    ..approve_submission()
                },
                "approver@example.test",
            )
            .await
            .unwrap();
        assert_eq!(fixture.notifier.subscriber_notices(), vec![amendment.id]);
    }

    #[tokio::test]
    async fn test_invites_are_sent_only_once() {
        let fixture = fixture();
        let releases = ReleaseService::new(fixture.db.clone(), crate::core::test_support::stats_db());
        releases
            .add_prerelease_invite(fixture.release.id, "viewer@example.test")
            .await
            .unwrap();

        fixture
            .service
            .create_status(fixture.release.id, approve_submission(), "approver@example.test")
            .await
            .unwrap();
        fixture
            .service
            .create_status(fixture.release.id, approve_submission(), "approver@example.test")
            .await
            .unwrap();

        // The second approval sends no further invites.
        assert_eq!(fixture.notifier.invites().len(), 1);
        assert_eq!(fixture.notifier.changes().len(), 2);
    }

    #[tokio::test]
    async fn test_status_creation_removes_unused_images() {
        let fixture = fixture();
        let page = fixture
            .db
            .get_release_page(fixture.release.id)
            .unwrap()
            .unwrap();

        let seed_image = |name: &str| {
            let file = FileReference {
                id: Uuid::new_v4(),
                filename: name.to_string(),
                content_type: "image/png".to_string(),
                size: 10,
                kind: FileKind::Image,
                source_archive_id: None,
                paired_file_id: None,
                replacing_id: None,
                replaced_by_id: None,
                created_by: "author@example.test".to_string(),
                created_at: Utc::now(),
            };
            fixture.db.insert_file(&file).unwrap();
            fixture
                .db
                .insert_release_file(&ReleaseFileLink {
                    id: Uuid::new_v4(),
                    release_id: fixture.release.id,
                    file_id: file.id,
                    name: None,
                    ord: 0,
                })
                .unwrap();
            file
        };
        let used = seed_image("used.png");
        let unused = seed_image("unused.png");

        fixture.blobs.upload(&used.blob_path(), b"png").await.unwrap();
        fixture
            .blobs
            .upload(&unused.blob_path(), b"png")
            .await
            .unwrap();

        let content = ContentService::new(fixture.db.clone());
        let section = content.add_section(page.id, None, "About").await.unwrap();
        content
            .add_html_block(
                page.id,
                section.id,
                None,
                &format!(r#"<img src="/images/{}"/>"#, used.id),
            )
            .await
            .unwrap();

        fixture
            .service
            .create_status(
                fixture.release.id,
                StatusSubmission {
                    approval_status: ApprovalStatus::HigherLevelReview,
                    internal_note: None,
                    publish_scheduled: None,
                    notify_subscribers: None,
                },
                "author@example.test",
            )
            .await
            .unwrap();

        assert!(fixture.blobs.contains(&used.blob_path()));
        assert!(!fixture.blobs.contains(&unused.blob_path()));
        assert!(fixture.db.get_file(used.id).unwrap().is_some());
        assert!(fixture.db.get_file(unused.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_status_history_walks_amendment_chain_newest_first() {
        let fixture = fixture();

        // Fabricate an amendment pointing back at the seeded release.
        let mut amendment = fixture.release.clone();
        amendment.id = Uuid::new_v4();
        amendment.version = 1;
        amendment.previous_version_id = Some(fixture.release.id);
        fixture.db.insert_release(&amendment).unwrap();

        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let mut record = |release_id: Uuid, status: ApprovalStatus, at_offset: i64| {
            fixture
                .db
                .insert_release_status(&ReleaseStatus {
                    id: Uuid::new_v4(),
                    release_id,
                    approval_status: status,
                    internal_note: None,
                    created_by: "author@example.test".to_string(),
                    created_at: base + Duration::hours(at_offset),
                })
                .unwrap();
        };
        record(fixture.release.id, ApprovalStatus::Draft, 0);
        record(fixture.release.id, ApprovalStatus::Approved, 1);
        record(amendment.id, ApprovalStatus::Draft, 2);
        record(amendment.id, ApprovalStatus::HigherLevelReview, 3);

        let history = fixture.service.list_statuses(amendment.id).await.unwrap();
        let statuses: Vec<ApprovalStatus> =
            history.iter().map(|s| s.approval_status).collect();
        assert_eq!(
            statuses,
            vec![
                ApprovalStatus::HigherLevelReview,
                ApprovalStatus::Draft,
                ApprovalStatus::Approved,
                ApprovalStatus::Draft,
            ]
        );
    }
}
