//! Key statistic queries. Orders are dense from zero per release.

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::core::model::{KeyStatKind, KeyStatistic};
use crate::error::{DatabaseError, Result};

use super::content::invalid_text;
use super::database::Database;

fn key_stat_from_row(row: &Row) -> rusqlite::Result<KeyStatistic> {
    let kind_str: String = row.get("kind")?;
    let kind = match kind_str.as_str() {
        "text" => KeyStatKind::Text {
            title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
            statistic: row.get::<_, Option<String>>("statistic")?.unwrap_or_default(),
        },
        "data_block" => KeyStatKind::DataBlock {
            data_block_version_id: row.get("data_block_version_id")?,
        },
        other => return Err(invalid_text(other)),
    };
    Ok(KeyStatistic {
        id: row.get("id")?,
        release_id: row.get("release_id")?,
        ord: row.get("ord")?,
        trend: row.get("trend")?,
        guidance_title: row.get("guidance_title")?,
        guidance_text: row.get("guidance_text")?,
        kind,
    })
}

pub(crate) fn insert_key_stat_row(
    conn: &Connection,
    stat: &KeyStatistic,
) -> rusqlite::Result<()> {
    let (title, statistic, version_id) = match &stat.kind {
        KeyStatKind::Text { title, statistic } => {
            (Some(title.as_str()), Some(statistic.as_str()), None)
        }
        KeyStatKind::DataBlock {
            data_block_version_id,
        } => (None, None, Some(*data_block_version_id)),
    };
    conn.execute(
        "INSERT INTO key_statistics
         (id, release_id, ord, kind, title, statistic, trend, guidance_title,
          guidance_text, data_block_version_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            stat.id,
            stat.release_id,
            stat.ord,
            stat.kind.kind_str(),
            title,
            statistic,
            stat.trend,
            stat.guidance_title,
            stat.guidance_text,
            version_id
        ],
    )?;
    Ok(())
}

pub(crate) fn query_key_statistics(
    conn: &Connection,
    release_id: Uuid,
) -> rusqlite::Result<Vec<KeyStatistic>> {
    let mut stmt = conn.prepare(
        "SELECT id, release_id, ord, kind, title, statistic, trend, guidance_title,
                guidance_text, data_block_version_id
         FROM key_statistics WHERE release_id = ?1 ORDER BY ord",
    )?;
    let stats = stmt
        .query_map(params![release_id], key_stat_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(stats)
}

impl Database {
    pub fn list_key_statistics(&self, release_id: Uuid) -> Result<Vec<KeyStatistic>> {
        let conn = self.lock();
        query_key_statistics(&conn, release_id).map_err(|e| DatabaseError::Query(e).into())
    }

    pub fn get_key_statistic(
        &self,
        release_id: Uuid,
        stat_id: Uuid,
    ) -> Result<Option<KeyStatistic>> {
        let conn = self.lock();
        let stat = conn
            .query_row(
                "SELECT id, release_id, ord, kind, title, statistic, trend, guidance_title,
                        guidance_text, data_block_version_id
                 FROM key_statistics WHERE id = ?1 AND release_id = ?2",
                params![stat_id, release_id],
                key_stat_from_row,
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(stat)
    }

    pub fn insert_key_statistic(&self, stat: &KeyStatistic) -> Result<()> {
        let conn = self.lock();
        insert_key_stat_row(&conn, stat).map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn update_key_statistic(&self, stat: &KeyStatistic) -> Result<()> {
        let conn = self.lock();
        let (title, statistic, version_id) = match &stat.kind {
            KeyStatKind::Text { title, statistic } => {
                (Some(title.as_str()), Some(statistic.as_str()), None)
            }
            KeyStatKind::DataBlock {
                data_block_version_id,
            } => (None, None, Some(*data_block_version_id)),
        };
        conn.execute(
            "UPDATE key_statistics
             SET title = ?1, statistic = ?2, trend = ?3, guidance_title = ?4,
                 guidance_text = ?5, data_block_version_id = ?6
             WHERE id = ?7",
            params![
                title,
                statistic,
                stat.trend,
                stat.guidance_title,
                stat.guidance_text,
                version_id,
                stat.id
            ],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn set_key_statistic_orders(&self, orders: &[(Uuid, i64)]) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        {
            let mut stmt = tx
                .prepare("UPDATE key_statistics SET ord = ?1 WHERE id = ?2")
                .map_err(DatabaseError::Query)?;
            for (id, ord) in orders {
                stmt.execute(params![ord, id]).map_err(DatabaseError::Query)?;
            }
        }
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }

    /// Delete one key statistic and close the ordering gap.
    pub fn delete_key_statistic(&self, release_id: Uuid, stat_id: Uuid) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        tx.execute(
            "DELETE FROM key_statistics WHERE id = ?1",
            params![stat_id],
        )
        .map_err(DatabaseError::Query)?;
        let ids: Vec<Uuid> = {
            let mut stmt = tx
                .prepare("SELECT id FROM key_statistics WHERE release_id = ?1 ORDER BY ord")
                .map_err(DatabaseError::Query)?;
            let result = stmt
                .query_map(params![release_id], |row| row.get(0))
                .map_err(DatabaseError::Query)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(DatabaseError::Query)?;
            result
        };
        {
            let mut update = tx
                .prepare("UPDATE key_statistics SET ord = ?1 WHERE id = ?2")
                .map_err(DatabaseError::Query)?;
            for (ord, id) in ids.iter().enumerate() {
                update
                    .execute(params![ord as i64, id])
                    .map_err(DatabaseError::Query)?;
            }
        }
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }
}
