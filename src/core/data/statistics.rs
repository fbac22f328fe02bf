//! Statistics-store queries: companion release rows, subject linkage and
//! footnotes with their criteria associations.

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::core::model::{Footnote, FootnoteLinks, FootnoteWithLinks, StatRelease, Subject};
use crate::error::{DatabaseError, Result};

use super::database::StatsDatabase;

fn query_link_ids(
    conn: &Connection,
    table: &str,
    id_col: &str,
    footnote_id: Uuid,
) -> rusqlite::Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {id_col} FROM {table} WHERE footnote_id = ?1 ORDER BY {id_col}"
    ))?;
    let result = stmt
        .query_map(params![footnote_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>();
    result
}

fn insert_link_ids(
    conn: &Connection,
    table: &str,
    id_col: &str,
    footnote_id: Uuid,
    ids: &[Uuid],
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {table} (footnote_id, {id_col}) VALUES (?1, ?2)"
    ))?;
    for id in ids {
        stmt.execute(params![footnote_id, id])?;
    }
    Ok(())
}

fn query_footnotes(conn: &Connection, release_id: Uuid) -> rusqlite::Result<Vec<FootnoteWithLinks>> {
    let rows: Vec<(Uuid, String, i64)> = {
        let mut stmt = conn.prepare(
            "SELECT f.id, f.content, rf.ord
             FROM release_footnotes rf JOIN footnotes f ON rf.footnote_id = f.id
             WHERE rf.release_id = ?1 ORDER BY rf.ord",
        )?;
        let result = stmt
            .query_map(params![release_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        result
    };

    let mut footnotes = Vec::with_capacity(rows.len());
    for (id, content, ord) in rows {
        footnotes.push(FootnoteWithLinks {
            footnote: Footnote { id, content },
            ord,
            links: FootnoteLinks {
                subjects: query_link_ids(conn, "footnote_subjects", "subject_id", id)?,
                filters: query_link_ids(conn, "footnote_filters", "filter_id", id)?,
                filter_items: query_link_ids(conn, "footnote_filter_items", "filter_item_id", id)?,
                indicators: query_link_ids(conn, "footnote_indicators", "indicator_id", id)?,
            },
        });
    }
    Ok(footnotes)
}

impl StatsDatabase {
    pub fn insert_stat_release(&self, release: &StatRelease) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO stat_releases (id, publication_id) VALUES (?1, ?2)",
            params![release.id, release.publication_id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn get_stat_release(&self, id: Uuid) -> Result<Option<StatRelease>> {
        let conn = self.lock();
        let release = conn
            .query_row(
                "SELECT id, publication_id FROM stat_releases WHERE id = ?1",
                params![id],
                |row| {
                    Ok(StatRelease {
                        id: row.get(0)?,
                        publication_id: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(release)
    }

    pub fn insert_subject(&self, subject: &Subject) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO subjects (id, name) VALUES (?1, ?2)",
            params![subject.id, subject.name],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn link_subject(&self, release_id: Uuid, subject_id: Uuid) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO release_subjects (release_id, subject_id) VALUES (?1, ?2)",
            params![release_id, subject_id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn list_subjects(&self, release_id: Uuid) -> Result<Vec<Subject>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT s.id, s.name FROM release_subjects rs
                 JOIN subjects s ON rs.subject_id = s.id
                 WHERE rs.release_id = ?1 ORDER BY s.name",
            )
            .map_err(DatabaseError::Query)?;
        let subjects = stmt
            .query_map(params![release_id], |row| {
                Ok(Subject {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::Query)?;
        Ok(subjects)
    }

    /// Attach a footnote to a release together with its criteria links.
    pub fn insert_footnote(&self, release_id: Uuid, footnote: &FootnoteWithLinks) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        tx.execute(
            "INSERT INTO footnotes (id, content) VALUES (?1, ?2)",
            params![footnote.footnote.id, footnote.footnote.content],
        )
        .map_err(DatabaseError::Query)?;
        tx.execute(
            "INSERT INTO release_footnotes (release_id, footnote_id, ord) VALUES (?1, ?2, ?3)",
            params![release_id, footnote.footnote.id, footnote.ord],
        )
        .map_err(DatabaseError::Query)?;
        let id = footnote.footnote.id;
        insert_link_ids(&tx, "footnote_subjects", "subject_id", id, &footnote.links.subjects)
            .map_err(DatabaseError::Query)?;
        insert_link_ids(&tx, "footnote_filters", "filter_id", id, &footnote.links.filters)
            .map_err(DatabaseError::Query)?;
        insert_link_ids(
            &tx,
            "footnote_filter_items",
            "filter_item_id",
            id,
            &footnote.links.filter_items,
        )
        .map_err(DatabaseError::Query)?;
        insert_link_ids(
            &tx,
            "footnote_indicators",
            "indicator_id",
            id,
            &footnote.links.indicators,
        )
        .map_err(DatabaseError::Query)?;
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn list_footnotes(&self, release_id: Uuid) -> Result<Vec<FootnoteWithLinks>> {
        let conn = self.lock();
        query_footnotes(&conn, release_id).map_err(|e| DatabaseError::Query(e).into())
    }

    /// Clone the companion release row, subject links and footnotes under a
    /// new release id. Footnotes get fresh ids; their criteria associations
    /// and per-release ordering are preserved. Returns false when the source
    /// has no companion row.
    pub fn clone_release(&self, source_id: Uuid, new_id: Uuid) -> Result<bool> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;

        let publication_id: Option<Uuid> = tx
            .query_row(
                "SELECT publication_id FROM stat_releases WHERE id = ?1",
                params![source_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        let Some(publication_id) = publication_id else {
            return Ok(false);
        };

        tx.execute(
            "INSERT INTO stat_releases (id, publication_id) VALUES (?1, ?2)",
            params![new_id, publication_id],
        )
        .map_err(DatabaseError::Query)?;

        tx.execute(
            "INSERT INTO release_subjects (release_id, subject_id)
             SELECT ?1, subject_id FROM release_subjects WHERE release_id = ?2",
            params![new_id, source_id],
        )
        .map_err(DatabaseError::Query)?;

        let footnotes = query_footnotes(&tx, source_id).map_err(DatabaseError::Query)?;
        for footnote in footnotes {
            let cloned_id = Uuid::new_v4();
            tx.execute(
                "INSERT INTO footnotes (id, content) VALUES (?1, ?2)",
                params![cloned_id, footnote.footnote.content],
            )
            .map_err(DatabaseError::Query)?;
            tx.execute(
                "INSERT INTO release_footnotes (release_id, footnote_id, ord) VALUES (?1, ?2, ?3)",
                params![new_id, cloned_id, footnote.ord],
            )
            .map_err(DatabaseError::Query)?;
            insert_link_ids(
                &tx,
                "footnote_subjects",
                "subject_id",
                cloned_id,
                &footnote.links.subjects,
            )
            .map_err(DatabaseError::Query)?;
            insert_link_ids(
                &tx,
                "footnote_filters",
                "filter_id",
                cloned_id,
                &footnote.links.filters,
            )
            .map_err(DatabaseError::Query)?;
            insert_link_ids(
                &tx,
                "footnote_filter_items",
                "filter_item_id",
                cloned_id,
                &footnote.links.filter_items,
            )
            .map_err(DatabaseError::Query)?;
            insert_link_ids(
                &tx,
                "footnote_indicators",
                "indicator_id",
                cloned_id,
                &footnote.links.indicators,
            )
            .map_err(DatabaseError::Query)?;
        }

        tx.commit().map_err(DatabaseError::Query)?;
        Ok(true)
    }
}
