//! File reference and release-file link queries, plus the import-tracking
//! rows used by the SQLite import tracker.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::core::model::{FileKind, FileReference, ReleaseFileInfo, ReleaseFileLink};
use crate::error::{DatabaseError, Result};

use super::content::invalid_text;
use super::database::Database;

fn file_from_row(row: &Row) -> rusqlite::Result<FileReference> {
    let kind_str: String = row.get("kind")?;
    Ok(FileReference {
        id: row.get("id")?,
        filename: row.get("filename")?,
        content_type: row.get("content_type")?,
        size: row.get("size")?,
        kind: FileKind::parse(&kind_str).ok_or_else(|| invalid_text(&kind_str))?,
        source_archive_id: row.get("source_archive_id")?,
        paired_file_id: row.get("paired_file_id")?,
        replacing_id: row.get("replacing_id")?,
        replaced_by_id: row.get("replaced_by_id")?,
        created_by: row.get("created_by")?,
        created_at: row.get("created_at")?,
    })
}

const FILE_COLUMNS: &str = "id, filename, content_type, size, kind, source_archive_id, \
     paired_file_id, replacing_id, replaced_by_id, created_by, created_at";

pub(crate) fn insert_link_row(conn: &Connection, link: &ReleaseFileLink) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO release_files (id, release_id, file_id, name, ord)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![link.id, link.release_id, link.file_id, link.name, link.ord],
    )?;
    Ok(())
}

impl Database {
    pub fn insert_file(&self, file: &FileReference) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO files
             (id, filename, content_type, size, kind, source_archive_id, paired_file_id,
              replacing_id, replaced_by_id, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                file.id,
                file.filename,
                file.content_type,
                file.size,
                file.kind.as_str(),
                file.source_archive_id,
                file.paired_file_id,
                file.replacing_id,
                file.replaced_by_id,
                file.created_by,
                file.created_at
            ],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn get_file(&self, file_id: Uuid) -> Result<Option<FileReference>> {
        let conn = self.lock();
        let file = conn
            .query_row(
                &format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1"),
                params![file_id],
                file_from_row,
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(file)
    }

    pub fn set_file_replaced_by(&self, file_id: Uuid, replaced_by: Option<Uuid>) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE files SET replaced_by_id = ?1 WHERE id = ?2",
            params![replaced_by, file_id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn set_file_replacing(&self, file_id: Uuid, replacing: Option<Uuid>) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE files SET replacing_id = ?1 WHERE id = ?2",
            params![replacing, file_id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn delete_file_row(&self, file_id: Uuid) -> Result<()> {
        let conn = self.lock();
        conn.execute("DELETE FROM files WHERE id = ?1", params![file_id])
            .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn insert_release_file(&self, link: &ReleaseFileLink) -> Result<()> {
        let conn = self.lock();
        insert_link_row(&conn, link).map_err(DatabaseError::Query)?;
        Ok(())
    }

    /// Files of a release, optionally narrowed to one kind, data files
    /// first by their explicit order.
    pub fn list_release_files(
        &self,
        release_id: Uuid,
        kind: Option<FileKind>,
    ) -> Result<Vec<ReleaseFileInfo>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT rf.id AS link_id, rf.release_id, rf.file_id, rf.name AS link_name,
                        rf.ord AS link_ord, {}
                 FROM release_files rf JOIN files f ON rf.file_id = f.id
                 WHERE rf.release_id = ?1 AND (?2 IS NULL OR f.kind = ?2)
                 ORDER BY rf.ord, f.filename",
                FILE_COLUMNS
                    .split(", ")
                    .map(|c| format!("f.{c}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
            .map_err(DatabaseError::Query)?;
        let infos = stmt
            .query_map(
                params![release_id, kind.map(|k| k.as_str())],
                |row| {
                    Ok(ReleaseFileInfo {
                        link: ReleaseFileLink {
                            id: row.get("link_id")?,
                            release_id: row.get("release_id")?,
                            file_id: row.get("file_id")?,
                            name: row.get("link_name")?,
                            ord: row.get("link_ord")?,
                        },
                        file: file_from_row(row)?,
                    })
                },
            )
            .map_err(DatabaseError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::Query)?;
        Ok(infos)
    }

    pub fn get_release_file(
        &self,
        release_id: Uuid,
        file_id: Uuid,
    ) -> Result<Option<ReleaseFileInfo>> {
        let conn = self.lock();
        let info = conn
            .query_row(
                &format!(
                    "SELECT rf.id AS link_id, rf.release_id, rf.file_id, rf.name AS link_name,
                            rf.ord AS link_ord, {}
                     FROM release_files rf JOIN files f ON rf.file_id = f.id
                     WHERE rf.release_id = ?1 AND rf.file_id = ?2",
                    FILE_COLUMNS
                        .split(", ")
                        .map(|c| format!("f.{c}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                params![release_id, file_id],
                |row| {
                    Ok(ReleaseFileInfo {
                        link: ReleaseFileLink {
                            id: row.get("link_id")?,
                            release_id: row.get("release_id")?,
                            file_id: row.get("file_id")?,
                            name: row.get("link_name")?,
                            ord: row.get("link_ord")?,
                        },
                        file: file_from_row(row)?,
                    })
                },
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(info)
    }

    pub fn delete_release_file_link(&self, release_id: Uuid, file_id: Uuid) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "DELETE FROM release_files WHERE release_id = ?1 AND file_id = ?2",
            params![release_id, file_id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    /// How many releases still link to this file.
    pub fn count_file_links(&self, file_id: Uuid) -> Result<i64> {
        let conn = self.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM release_files WHERE file_id = ?1",
                params![file_id],
                |row| row.get(0),
            )
            .map_err(DatabaseError::Query)?;
        Ok(count)
    }

    /// How many surviving files still name this archive as their source.
    pub fn count_files_with_source_archive(&self, archive_id: Uuid) -> Result<i64> {
        let conn = self.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM files WHERE source_archive_id = ?1",
                params![archive_id],
                |row| row.get(0),
            )
            .map_err(DatabaseError::Query)?;
        Ok(count)
    }

    /// Next free data-file position for a release.
    pub fn next_data_file_ord(&self, release_id: Uuid) -> Result<i64> {
        let conn = self.lock();
        let next: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(rf.ord) + 1, 0)
                 FROM release_files rf JOIN files f ON rf.file_id = f.id
                 WHERE rf.release_id = ?1 AND f.kind = 'data'",
                params![release_id],
                |row| row.get(0),
            )
            .map_err(DatabaseError::Query)?;
        Ok(next)
    }

    /// Rewrite data-file orders for a release in one transaction. Keys are
    /// file ids, not link ids.
    pub fn set_data_file_orders(&self, release_id: Uuid, orders: &[(Uuid, i64)]) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        {
            let mut stmt = tx
                .prepare(
                    "UPDATE release_files SET ord = ?1 WHERE release_id = ?2 AND file_id = ?3",
                )
                .map_err(DatabaseError::Query)?;
            for (file_id, ord) in orders {
                stmt.execute(params![ord, release_id, file_id])
                    .map_err(DatabaseError::Query)?;
            }
        }
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }

    // Import-tracking rows, used by the SQLite-backed import tracker.

    pub fn insert_import_row(
        &self,
        file_id: Uuid,
        status: &str,
        total_rows: i64,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO data_imports (file_id, status, total_rows, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![file_id, status, total_rows, created_at],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn get_import_row(&self, file_id: Uuid) -> Result<Option<(String, i64)>> {
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT status, total_rows FROM data_imports WHERE file_id = ?1",
                params![file_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(row)
    }

    pub fn update_import_status(&self, file_id: Uuid, status: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE data_imports SET status = ?1 WHERE file_id = ?2",
            params![status, file_id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn delete_import_row(&self, file_id: Uuid) -> Result<()> {
        let conn = self.lock();
        conn.execute("DELETE FROM data_imports WHERE file_id = ?1", params![file_id])
            .map_err(DatabaseError::Query)?;
        Ok(())
    }
}
