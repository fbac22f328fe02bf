//! Release and publication management: creation, roles, invites, notes and
//! related links
//!
//! Creating a release writes the content-store row, its content page and
//! the companion statistics-store row under the same id.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::core::data::{Database, StatsDatabase};
use crate::core::model::{
    ApprovalStatus, Page, PageKind, PrereleaseInvite, Publication, RelatedLink, Release,
    ReleaseNote, ReleaseRole, StatRelease, UserReleaseRole,
};
use crate::error::{Result, StatDeskError};

pub struct ReleaseService {
    db: Arc<Database>,
    stats_db: Arc<StatsDatabase>,
}

pub struct ReleaseInput {
    pub time_period: String,
    pub year: i32,
    pub label: Option<String>,
}

impl ReleaseService {
    pub fn new(db: Arc<Database>, stats_db: Arc<StatsDatabase>) -> Self {
        Self { db, stats_db }
    }

    pub async fn create_publication(&self, title: &str, slug: &str) -> Result<Publication> {
        let publication = Publication {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: slug.to_string(),
        };
        self.db.insert_publication(&publication)?;
        info!("Created publication {} ({})", publication.slug, publication.id);
        Ok(publication)
    }

    pub async fn list_publications(&self) -> Result<Vec<Publication>> {
        self.db.list_publications()
    }

    /// Create the initial (version 0) release of a publication period,
    /// together with its content page and statistics-store row.
    pub async fn create_release(
        &self,
        publication_id: Uuid,
        input: ReleaseInput,
        actor: &str,
    ) -> Result<Release> {
        let publication = self
            .db
            .get_publication(publication_id)?
            .ok_or(StatDeskError::NotFound)?;

        let release = Release {
            id: Uuid::new_v4(),
            publication_id,
            version: 0,
            previous_version_id: None,
            time_period: input.time_period,
            year: input.year,
            label: input.label,
            approval_status: ApprovalStatus::Draft,
            publish_scheduled: None,
            next_release_date: None,
            published: None,
            notify_subscribers: false,
            update_published_date: false,
            data_guidance: None,
            created_by: actor.to_string(),
            created_at: Utc::now(),
            soft_deleted: false,
        };
        self.db.insert_release(&release)?;

        let page = Page {
            id: Uuid::new_v4(),
            kind: PageKind::Release,
            release_id: Some(release.id),
            title: publication.title.clone(),
            slug: format!("{}-{}", publication.slug, release.year),
        };
        self.db.insert_page(&page)?;

        self.stats_db.insert_stat_release(&StatRelease {
            id: release.id,
            publication_id,
        })?;

        info!(
            "Created release {} v{} of {}",
            release.id, release.version, publication.slug
        );
        Ok(release)
    }

    pub async fn get_release(&self, release_id: Uuid) -> Result<Release> {
        self.db
            .get_release(release_id)?
            .ok_or(StatDeskError::NotFound)
    }

    pub async fn list_releases(&self, publication_id: Uuid) -> Result<Vec<Release>> {
        self.db.list_releases(publication_id)
    }

    /// The latest version in a publication lineage, if any release exists.
    pub async fn latest_release(&self, publication_id: Uuid) -> Result<Option<Release>> {
        self.db.latest_release(publication_id)
    }

    pub async fn set_data_guidance(&self, release_id: Uuid, guidance: &str) -> Result<()> {
        self.require_release(release_id)?;
        self.db.update_release_data_guidance(release_id, guidance)
    }

    pub async fn add_role(
        &self,
        release_id: Uuid,
        user_email: &str,
        role: ReleaseRole,
    ) -> Result<UserReleaseRole> {
        self.require_release(release_id)?;
        let role = UserReleaseRole {
            id: Uuid::new_v4(),
            release_id,
            user_email: user_email.to_string(),
            role,
        };
        self.db.insert_role(&role)?;
        Ok(role)
    }

    /// Record pending pre-release access; the invite email goes out on
    /// first approval.
    pub async fn add_prerelease_invite(
        &self,
        release_id: Uuid,
        email: &str,
    ) -> Result<PrereleaseInvite> {
        self.require_release(release_id)?;
        let invite = PrereleaseInvite {
            id: Uuid::new_v4(),
            release_id,
            email: email.to_string(),
            sent: false,
        };
        self.db.insert_invite(&invite)?;
        Ok(invite)
    }

    /// Append an update-history entry.
    pub async fn add_release_note(
        &self,
        release_id: Uuid,
        reason: &str,
        actor: &str,
    ) -> Result<ReleaseNote> {
        self.require_release(release_id)?;
        let note = ReleaseNote {
            id: Uuid::new_v4(),
            release_id,
            ord: self.db.list_release_notes(release_id)?.len() as i64,
            reason: reason.to_string(),
            created_by: actor.to_string(),
            created_at: Utc::now(),
        };
        self.db.insert_release_note(&note)?;
        Ok(note)
    }

    pub async fn add_related_link(
        &self,
        release_id: Uuid,
        title: &str,
        url: &str,
    ) -> Result<RelatedLink> {
        self.require_release(release_id)?;
        let link = RelatedLink {
            id: Uuid::new_v4(),
            release_id,
            ord: self.db.list_related_links(release_id)?.len() as i64,
            title: title.to_string(),
            url: url.to_string(),
        };
        self.db.insert_related_link(&link)?;
        Ok(link)
    }

    fn require_release(&self, release_id: Uuid) -> Result<()> {
        self.db
            .get_release(release_id)?
            .map(|_| ())
            .ok_or(StatDeskError::NotFound)
    }
}
