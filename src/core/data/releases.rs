//! Release lifecycle queries: publications, releases, approval history,
//! roles, pre-release invites, release notes, related links and featured
//! tables.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::core::model::{
    ApprovalStatus, FeaturedTable, PrereleaseInvite, Publication, RelatedLink, Release,
    ReleaseNote, ReleaseRole, ReleaseStatus, UserReleaseRole,
};
use crate::error::{DatabaseError, Result};

use super::content::invalid_text;
use super::database::Database;

fn release_from_row(row: &Row) -> rusqlite::Result<Release> {
    let status_str: String = row.get("approval_status")?;
    Ok(Release {
        id: row.get("id")?,
        publication_id: row.get("publication_id")?,
        version: row.get("version")?,
        previous_version_id: row.get("previous_version_id")?,
        time_period: row.get("time_period")?,
        year: row.get("year")?,
        label: row.get("label")?,
        approval_status: ApprovalStatus::parse(&status_str)
            .ok_or_else(|| invalid_text(&status_str))?,
        publish_scheduled: row.get("publish_scheduled")?,
        next_release_date: row.get("next_release_date")?,
        published: row.get("published")?,
        notify_subscribers: row.get("notify_subscribers")?,
        update_published_date: row.get("update_published_date")?,
        data_guidance: row.get("data_guidance")?,
        created_by: row.get("created_by")?,
        created_at: row.get("created_at")?,
        soft_deleted: row.get("soft_deleted")?,
    })
}

const RELEASE_COLUMNS: &str = "id, publication_id, version, previous_version_id, time_period, \
     year, label, approval_status, publish_scheduled, next_release_date, published, \
     notify_subscribers, update_published_date, data_guidance, created_by, created_at, \
     soft_deleted";

pub(crate) fn query_release(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Release>> {
    conn.query_row(
        &format!("SELECT {RELEASE_COLUMNS} FROM releases WHERE id = ?1 AND soft_deleted = 0"),
        params![id],
        release_from_row,
    )
    .optional()
}

pub(crate) fn insert_release_row(conn: &Connection, release: &Release) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO releases
         (id, publication_id, version, previous_version_id, time_period, year, label,
          approval_status, publish_scheduled, next_release_date, published,
          notify_subscribers, update_published_date, data_guidance, created_by,
          created_at, soft_deleted)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            release.id,
            release.publication_id,
            release.version,
            release.previous_version_id,
            release.time_period,
            release.year,
            release.label,
            release.approval_status.as_str(),
            release.publish_scheduled,
            release.next_release_date,
            release.published,
            release.notify_subscribers,
            release.update_published_date,
            release.data_guidance,
            release.created_by,
            release.created_at,
            release.soft_deleted
        ],
    )?;
    Ok(())
}

fn role_from_row(row: &Row) -> rusqlite::Result<UserReleaseRole> {
    let role_str: String = row.get("role")?;
    Ok(UserReleaseRole {
        id: row.get("id")?,
        release_id: row.get("release_id")?,
        user_email: row.get("user_email")?,
        role: ReleaseRole::parse(&role_str).ok_or_else(|| invalid_text(&role_str))?,
    })
}

impl Database {
    pub fn insert_publication(&self, publication: &Publication) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO publications (id, title, slug) VALUES (?1, ?2, ?3)",
            params![publication.id, publication.title, publication.slug],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn get_publication(&self, id: Uuid) -> Result<Option<Publication>> {
        let conn = self.lock();
        let publication = conn
            .query_row(
                "SELECT id, title, slug FROM publications WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Publication {
                        id: row.get("id")?,
                        title: row.get("title")?,
                        slug: row.get("slug")?,
                    })
                },
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(publication)
    }

    pub fn list_publications(&self) -> Result<Vec<Publication>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare("SELECT id, title, slug FROM publications ORDER BY title")
            .map_err(DatabaseError::Query)?;
        let publications = stmt
            .query_map([], |row| {
                Ok(Publication {
                    id: row.get("id")?,
                    title: row.get("title")?,
                    slug: row.get("slug")?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::Query)?;
        Ok(publications)
    }

    pub fn insert_release(&self, release: &Release) -> Result<()> {
        let conn = self.lock();
        insert_release_row(&conn, release).map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn get_release(&self, id: Uuid) -> Result<Option<Release>> {
        let conn = self.lock();
        query_release(&conn, id).map_err(|e| DatabaseError::Query(e).into())
    }

    /// The highest-versioned live row in a publication lineage.
    pub fn latest_release(&self, publication_id: Uuid) -> Result<Option<Release>> {
        let conn = self.lock();
        let release = conn
            .query_row(
                &format!(
                    "SELECT {RELEASE_COLUMNS} FROM releases
                     WHERE publication_id = ?1 AND soft_deleted = 0
                     ORDER BY version DESC LIMIT 1"
                ),
                params![publication_id],
                release_from_row,
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(release)
    }

    pub fn list_releases(&self, publication_id: Uuid) -> Result<Vec<Release>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {RELEASE_COLUMNS} FROM releases
                 WHERE publication_id = ?1 AND soft_deleted = 0 ORDER BY version"
            ))
            .map_err(DatabaseError::Query)?;
        let releases = stmt
            .query_map(params![publication_id], release_from_row)
            .map_err(DatabaseError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::Query)?;
        Ok(releases)
    }

    pub fn update_release_approval(
        &self,
        id: Uuid,
        status: ApprovalStatus,
        notify_subscribers: bool,
    ) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE releases SET approval_status = ?1, notify_subscribers = ?2 WHERE id = ?3",
            params![status.as_str(), notify_subscribers, id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn set_release_published(&self, id: Uuid, published: DateTime<Utc>) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE releases SET published = ?1 WHERE id = ?2",
            params![published, id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn update_release_publish_scheduled(
        &self,
        id: Uuid,
        publish_scheduled: Option<chrono::NaiveDate>,
    ) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE releases SET publish_scheduled = ?1 WHERE id = ?2",
            params![publish_scheduled, id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn update_release_data_guidance(&self, id: Uuid, data_guidance: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE releases SET data_guidance = ?1 WHERE id = ?2",
            params![data_guidance, id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn insert_release_status(&self, status: &ReleaseStatus) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO release_statuses
             (id, release_id, approval_status, internal_note, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                status.id,
                status.release_id,
                status.approval_status.as_str(),
                status.internal_note,
                status.created_by,
                status.created_at
            ],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    /// Statuses of one release, newest first.
    pub fn list_release_statuses(&self, release_id: Uuid) -> Result<Vec<ReleaseStatus>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, release_id, approval_status, internal_note, created_by, created_at
                 FROM release_statuses WHERE release_id = ?1 ORDER BY created_at DESC",
            )
            .map_err(DatabaseError::Query)?;
        let statuses = stmt
            .query_map(params![release_id], |row| {
                let status_str: String = row.get("approval_status")?;
                Ok(ReleaseStatus {
                    id: row.get("id")?,
                    release_id: row.get("release_id")?,
                    approval_status: ApprovalStatus::parse(&status_str)
                        .ok_or_else(|| invalid_text(&status_str))?,
                    internal_note: row.get("internal_note")?,
                    created_by: row.get("created_by")?,
                    created_at: row.get("created_at")?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::Query)?;
        Ok(statuses)
    }

    pub fn insert_role(&self, role: &UserReleaseRole) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO user_release_roles (id, release_id, user_email, role)
             VALUES (?1, ?2, ?3, ?4)",
            params![role.id, role.release_id, role.user_email, role.role.as_str()],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn list_roles(&self, release_id: Uuid) -> Result<Vec<UserReleaseRole>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, release_id, user_email, role FROM user_release_roles
                 WHERE release_id = ?1 ORDER BY user_email",
            )
            .map_err(DatabaseError::Query)?;
        let roles = stmt
            .query_map(params![release_id], role_from_row)
            .map_err(DatabaseError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::Query)?;
        Ok(roles)
    }

    pub fn insert_invite(&self, invite: &PrereleaseInvite) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO prerelease_invites (id, release_id, email, sent)
             VALUES (?1, ?2, ?3, ?4)",
            params![invite.id, invite.release_id, invite.email, invite.sent],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn list_invites(&self, release_id: Uuid) -> Result<Vec<PrereleaseInvite>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, release_id, email, sent FROM prerelease_invites
                 WHERE release_id = ?1 ORDER BY email",
            )
            .map_err(DatabaseError::Query)?;
        let invites = stmt
            .query_map(params![release_id], |row| {
                Ok(PrereleaseInvite {
                    id: row.get("id")?,
                    release_id: row.get("release_id")?,
                    email: row.get("email")?,
                    sent: row.get("sent")?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::Query)?;
        Ok(invites)
    }

    pub fn mark_invite_sent(&self, invite_id: Uuid) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE prerelease_invites SET sent = 1 WHERE id = ?1",
            params![invite_id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn insert_release_note(&self, note: &ReleaseNote) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO release_notes (id, release_id, ord, reason, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                note.id,
                note.release_id,
                note.ord,
                note.reason,
                note.created_by,
                note.created_at
            ],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn list_release_notes(&self, release_id: Uuid) -> Result<Vec<ReleaseNote>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, release_id, ord, reason, created_by, created_at
                 FROM release_notes WHERE release_id = ?1 ORDER BY ord",
            )
            .map_err(DatabaseError::Query)?;
        let notes = stmt
            .query_map(params![release_id], |row| {
                Ok(ReleaseNote {
                    id: row.get("id")?,
                    release_id: row.get("release_id")?,
                    ord: row.get("ord")?,
                    reason: row.get("reason")?,
                    created_by: row.get("created_by")?,
                    created_at: row.get("created_at")?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::Query)?;
        Ok(notes)
    }

    pub fn insert_related_link(&self, link: &RelatedLink) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO related_links (id, release_id, ord, title, url)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![link.id, link.release_id, link.ord, link.title, link.url],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn list_related_links(&self, release_id: Uuid) -> Result<Vec<RelatedLink>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, release_id, ord, title, url FROM related_links
                 WHERE release_id = ?1 ORDER BY ord",
            )
            .map_err(DatabaseError::Query)?;
        let links = stmt
            .query_map(params![release_id], |row| {
                Ok(RelatedLink {
                    id: row.get("id")?,
                    release_id: row.get("release_id")?,
                    ord: row.get("ord")?,
                    title: row.get("title")?,
                    url: row.get("url")?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::Query)?;
        Ok(links)
    }

    pub fn insert_featured_table(&self, table: &FeaturedTable) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO featured_tables
             (id, release_id, ord, name, description, data_block_version_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                table.id,
                table.release_id,
                table.ord,
                table.name,
                table.description,
                table.data_block_version_id
            ],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn list_featured_tables(&self, release_id: Uuid) -> Result<Vec<FeaturedTable>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, release_id, ord, name, description, data_block_version_id
                 FROM featured_tables WHERE release_id = ?1 ORDER BY ord",
            )
            .map_err(DatabaseError::Query)?;
        let tables = stmt
            .query_map(params![release_id], |row| {
                Ok(FeaturedTable {
                    id: row.get("id")?,
                    release_id: row.get("release_id")?,
                    ord: row.get("ord")?,
                    name: row.get("name")?,
                    description: row.get("description")?,
                    data_block_version_id: row.get("data_block_version_id")?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::Query)?;
        Ok(tables)
    }
}
