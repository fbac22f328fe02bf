//! Shared fixtures for service tests: in-memory stores and seeded
//! publication/release rows.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::data::{Database, StatsDatabase};
use crate::core::model::{ApprovalStatus, Page, PageKind, Publication, Release};

pub fn content_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().expect("in-memory content database"))
}

pub fn stats_db() -> Arc<StatsDatabase> {
    Arc::new(StatsDatabase::open_in_memory().expect("in-memory statistics database"))
}

pub fn seed_publication(db: &Database) -> Publication {
    let id = Uuid::new_v4();
    let publication = Publication {
        id,
        title: "Pupil absence".to_string(),
        // Slugs are unique; key them off the id so fixtures can seed more
        // than one publication.
        slug: format!("pupil-absence-{id}"),
    };
    db.insert_publication(&publication).expect("insert publication");
    publication
}

/// A draft version-0 release with its content page.
pub fn seed_release(db: &Database, publication: &Publication) -> Release {
    let release = Release {
        id: Uuid::new_v4(),
        publication_id: publication.id,
        version: 0,
        previous_version_id: None,
        time_period: "AY".to_string(),
        year: 2025,
        label: None,
        approval_status: ApprovalStatus::Draft,
        publish_scheduled: None,
        next_release_date: None,
        published: None,
        notify_subscribers: false,
        update_published_date: false,
        data_guidance: None,
        created_by: "author@example.test".to_string(),
        created_at: Utc::now(),
        soft_deleted: false,
    };
    db.insert_release(&release).expect("insert release");

    let page = Page {
        id: Uuid::new_v4(),
        kind: PageKind::Release,
        release_id: Some(release.id),
        title: publication.title.clone(),
        slug: publication.slug.clone(),
    };
    db.insert_page(&page).expect("insert release page");

    release
}
