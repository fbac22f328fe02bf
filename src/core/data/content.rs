//! Content tree queries: pages, sections, blocks, tiles, comments, embeds
//! and data-block versions.
//!
//! Mutations that touch sibling orderings run inside one transaction and
//! leave `ord` values dense from zero. Row-level helpers take a plain
//! `&Connection` so they can run both standalone and inside the amendment
//! transaction.

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::core::model::{
    BlockKind, BlockTree, Comment, ContentBlock, ContentSection, DataBlockParent,
    DataBlockVersion, Embed, Page, PageKind, PageTree, SectionTree, Tile, TileKind,
};
use crate::error::{DatabaseError, Result};

use super::database::Database;

pub(crate) fn invalid_text(value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        format!("unrecognised discriminator: {value}").into(),
    )
}

fn page_from_row(row: &Row) -> rusqlite::Result<Page> {
    let kind_str: String = row.get("kind")?;
    Ok(Page {
        id: row.get("id")?,
        kind: PageKind::parse(&kind_str).ok_or_else(|| invalid_text(&kind_str))?,
        release_id: row.get("release_id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
    })
}

fn section_from_row(row: &Row) -> rusqlite::Result<ContentSection> {
    Ok(ContentSection {
        id: row.get("id")?,
        page_id: row.get("page_id")?,
        ord: row.get("ord")?,
        heading: row.get("heading")?,
    })
}

fn block_from_row(row: &Row) -> rusqlite::Result<ContentBlock> {
    let kind_str: String = row.get("kind")?;
    let kind = match kind_str.as_str() {
        "html" => BlockKind::Html {
            body: row.get::<_, Option<String>>("body")?.unwrap_or_default(),
        },
        "tile_group" => BlockKind::TileGroup,
        "data_block" => BlockKind::DataBlock {
            data_block_version_id: row.get("data_block_version_id")?,
        },
        "embed" => BlockKind::Embed {
            embed_id: row.get("embed_id")?,
        },
        other => return Err(invalid_text(other)),
    };
    Ok(ContentBlock {
        id: row.get("id")?,
        section_id: row.get("section_id")?,
        ord: row.get("ord")?,
        kind,
    })
}

fn tile_from_row(row: &Row) -> rusqlite::Result<Tile> {
    let kind_str: String = row.get("kind")?;
    let kind = match kind_str.as_str() {
        "stat" => TileKind::Stat {
            title: row.get("title")?,
            statistic: row.get::<_, Option<String>>("statistic")?.unwrap_or_default(),
            trend: row.get("trend")?,
        },
        "link" => TileKind::Link {
            title: row.get("title")?,
            link_text: row.get::<_, Option<String>>("link_text")?.unwrap_or_default(),
            link_url: row.get::<_, Option<String>>("link_url")?.unwrap_or_default(),
        },
        other => return Err(invalid_text(other)),
    };
    Ok(Tile {
        id: row.get("id")?,
        block_id: row.get("block_id")?,
        ord: row.get("ord")?,
        kind,
    })
}

fn version_from_row(row: &Row) -> rusqlite::Result<DataBlockVersion> {
    Ok(DataBlockVersion {
        id: row.get("id")?,
        parent_id: row.get("parent_id")?,
        release_id: row.get("release_id")?,
        name: row.get("name")?,
        heading: row.get("heading")?,
        source: row.get("source")?,
        query: row.get("query")?,
        table_config: row.get("table_config")?,
        chart_config: row.get("chart_config")?,
        version: row.get("version")?,
    })
}

pub(crate) fn query_sections(
    conn: &Connection,
    page_id: Uuid,
) -> rusqlite::Result<Vec<ContentSection>> {
    let mut stmt = conn.prepare(
        "SELECT id, page_id, ord, heading FROM content_sections
         WHERE page_id = ?1 ORDER BY ord",
    )?;
    let sections = stmt
        .query_map(params![page_id], section_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(sections)
}

pub(crate) fn query_blocks(
    conn: &Connection,
    section_id: Uuid,
) -> rusqlite::Result<Vec<ContentBlock>> {
    let mut stmt = conn.prepare(
        "SELECT id, section_id, ord, kind, body, data_block_version_id, embed_id
         FROM content_blocks WHERE section_id = ?1 ORDER BY ord",
    )?;
    let blocks = stmt
        .query_map(params![section_id], block_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(blocks)
}

pub(crate) fn query_tiles(conn: &Connection, block_id: Uuid) -> rusqlite::Result<Vec<Tile>> {
    let mut stmt = conn.prepare(
        "SELECT id, block_id, ord, kind, title, statistic, trend, link_text, link_url
         FROM tiles WHERE block_id = ?1 ORDER BY ord",
    )?;
    let tiles = stmt
        .query_map(params![block_id], tile_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tiles)
}

pub(crate) fn insert_section_row(
    conn: &Connection,
    section: &ContentSection,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO content_sections (id, page_id, ord, heading) VALUES (?1, ?2, ?3, ?4)",
        params![section.id, section.page_id, section.ord, section.heading],
    )?;
    Ok(())
}

pub(crate) fn insert_block_row(conn: &Connection, block: &ContentBlock) -> rusqlite::Result<()> {
    let (body, version_id, embed_id) = match &block.kind {
        BlockKind::Html { body } => (Some(body.as_str()), None, None),
        BlockKind::TileGroup => (None, None, None),
        BlockKind::DataBlock {
            data_block_version_id,
        } => (None, Some(*data_block_version_id), None),
        BlockKind::Embed { embed_id } => (None, None, Some(*embed_id)),
    };
    conn.execute(
        "INSERT INTO content_blocks (id, section_id, ord, kind, body, data_block_version_id, embed_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            block.id,
            block.section_id,
            block.ord,
            block.kind.kind_str(),
            body,
            version_id,
            embed_id
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_tile_row(conn: &Connection, tile: &Tile) -> rusqlite::Result<()> {
    let (title, statistic, trend, link_text, link_url) = match &tile.kind {
        TileKind::Stat {
            title,
            statistic,
            trend,
        } => (
            title.as_str(),
            Some(statistic.as_str()),
            trend.as_deref(),
            None,
            None,
        ),
        TileKind::Link {
            title,
            link_text,
            link_url,
        } => (
            title.as_str(),
            None,
            None,
            Some(link_text.as_str()),
            Some(link_url.as_str()),
        ),
    };
    conn.execute(
        "INSERT INTO tiles (id, block_id, ord, kind, title, statistic, trend, link_text, link_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            tile.id,
            tile.block_id,
            tile.ord,
            tile.kind.kind_str(),
            title,
            statistic,
            trend,
            link_text,
            link_url
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_version_row(
    conn: &Connection,
    version: &DataBlockVersion,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO data_block_versions
         (id, parent_id, release_id, name, heading, source, query, table_config, chart_config, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            version.id,
            version.parent_id,
            version.release_id,
            version.name,
            version.heading,
            version.source,
            version.query,
            version.table_config,
            version.chart_config,
            version.version
        ],
    )?;
    Ok(())
}

/// Rewrite a sibling set's `ord` column to 0..n-1 following current order.
fn renumber_siblings(
    conn: &Connection,
    table: &str,
    parent_col: &str,
    parent_id: Uuid,
) -> rusqlite::Result<()> {
    let ids: Vec<Uuid> = {
        let mut stmt = conn.prepare(&format!(
            "SELECT id FROM {table} WHERE {parent_col} = ?1 ORDER BY ord"
        ))?;
        let result = stmt
            .query_map(params![parent_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        result
    };
    let mut update = conn.prepare(&format!("UPDATE {table} SET ord = ?1 WHERE id = ?2"))?;
    for (ord, id) in ids.iter().enumerate() {
        update.execute(params![ord as i64, id])?;
    }
    Ok(())
}

impl Database {
    pub fn insert_page(&self, page: &Page) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO pages (id, kind, release_id, title, slug) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                page.id,
                page.kind.as_str(),
                page.release_id,
                page.title,
                page.slug
            ],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn get_page(&self, page_id: Uuid) -> Result<Option<Page>> {
        let conn = self.lock();
        let page = conn
            .query_row(
                "SELECT id, kind, release_id, title, slug FROM pages WHERE id = ?1",
                params![page_id],
                page_from_row,
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(page)
    }

    pub fn get_release_page(&self, release_id: Uuid) -> Result<Option<Page>> {
        let conn = self.lock();
        let page = conn
            .query_row(
                "SELECT id, kind, release_id, title, slug FROM pages WHERE release_id = ?1",
                params![release_id],
                page_from_row,
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(page)
    }

    /// Full content tree, ordered by `ord` at every level.
    pub fn get_page_tree(&self, page_id: Uuid) -> Result<Option<PageTree>> {
        let conn = self.lock();
        let page = conn
            .query_row(
                "SELECT id, kind, release_id, title, slug FROM pages WHERE id = ?1",
                params![page_id],
                page_from_row,
            )
            .optional()
            .map_err(DatabaseError::Query)?;

        let Some(page) = page else {
            return Ok(None);
        };

        let mut sections = Vec::new();
        for section in query_sections(&conn, page_id).map_err(DatabaseError::Query)? {
            let mut blocks = Vec::new();
            for block in query_blocks(&conn, section.id).map_err(DatabaseError::Query)? {
                let tiles = if matches!(block.kind, BlockKind::TileGroup) {
                    query_tiles(&conn, block.id).map_err(DatabaseError::Query)?
                } else {
                    Vec::new()
                };
                blocks.push(BlockTree { block, tiles });
            }
            sections.push(SectionTree { section, blocks });
        }

        Ok(Some(PageTree { page, sections }))
    }

    pub fn list_sections(&self, page_id: Uuid) -> Result<Vec<ContentSection>> {
        let conn = self.lock();
        query_sections(&conn, page_id).map_err(|e| DatabaseError::Query(e).into())
    }

    pub fn get_section(&self, page_id: Uuid, section_id: Uuid) -> Result<Option<ContentSection>> {
        let conn = self.lock();
        let section = conn
            .query_row(
                "SELECT id, page_id, ord, heading FROM content_sections
                 WHERE id = ?1 AND page_id = ?2",
                params![section_id, page_id],
                section_from_row,
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(section)
    }

    /// Insert a section at its `ord`, shifting existing siblings at or after
    /// that position up by one. Runs as a single transaction.
    pub fn insert_section_at(&self, section: &ContentSection) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        tx.execute(
            "UPDATE content_sections SET ord = ord + 1 WHERE page_id = ?1 AND ord >= ?2",
            params![section.page_id, section.ord],
        )
        .map_err(DatabaseError::Query)?;
        insert_section_row(&tx, section).map_err(DatabaseError::Query)?;
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn update_section_heading(&self, section_id: Uuid, heading: &str) -> Result<bool> {
        let conn = self.lock();
        let changed = conn
            .execute(
                "UPDATE content_sections SET heading = ?1 WHERE id = ?2",
                params![heading, section_id],
            )
            .map_err(DatabaseError::Query)?;
        Ok(changed > 0)
    }

    pub fn set_section_orders(&self, orders: &[(Uuid, i64)]) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        {
            let mut stmt = tx
                .prepare("UPDATE content_sections SET ord = ?1 WHERE id = ?2")
                .map_err(DatabaseError::Query)?;
            for (id, ord) in orders {
                stmt.execute(params![ord, id]).map_err(DatabaseError::Query)?;
            }
        }
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }

    /// Delete a section with its blocks, tiles and comments, then renumber
    /// the surviving siblings. Cascades are enumerated explicitly.
    pub fn delete_section(&self, page_id: Uuid, section_id: Uuid) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        tx.execute(
            "DELETE FROM comments WHERE block_id IN
             (SELECT id FROM content_blocks WHERE section_id = ?1)",
            params![section_id],
        )
        .map_err(DatabaseError::Query)?;
        tx.execute(
            "DELETE FROM tiles WHERE block_id IN
             (SELECT id FROM content_blocks WHERE section_id = ?1)",
            params![section_id],
        )
        .map_err(DatabaseError::Query)?;
        tx.execute(
            "DELETE FROM content_blocks WHERE section_id = ?1",
            params![section_id],
        )
        .map_err(DatabaseError::Query)?;
        tx.execute(
            "DELETE FROM content_sections WHERE id = ?1",
            params![section_id],
        )
        .map_err(DatabaseError::Query)?;
        renumber_siblings(&tx, "content_sections", "page_id", page_id)
            .map_err(DatabaseError::Query)?;
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn list_blocks(&self, section_id: Uuid) -> Result<Vec<ContentBlock>> {
        let conn = self.lock();
        query_blocks(&conn, section_id).map_err(|e| DatabaseError::Query(e).into())
    }

    pub fn get_block(&self, section_id: Uuid, block_id: Uuid) -> Result<Option<ContentBlock>> {
        let conn = self.lock();
        let block = conn
            .query_row(
                "SELECT id, section_id, ord, kind, body, data_block_version_id, embed_id
                 FROM content_blocks WHERE id = ?1 AND section_id = ?2",
                params![block_id, section_id],
                block_from_row,
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(block)
    }

    pub fn insert_block_at(&self, block: &ContentBlock) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        tx.execute(
            "UPDATE content_blocks SET ord = ord + 1 WHERE section_id = ?1 AND ord >= ?2",
            params![block.section_id, block.ord],
        )
        .map_err(DatabaseError::Query)?;
        insert_block_row(&tx, block).map_err(DatabaseError::Query)?;
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn update_block_body(&self, block_id: Uuid, body: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "UPDATE content_blocks SET body = ?1 WHERE id = ?2",
            params![body, block_id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn set_block_orders(&self, orders: &[(Uuid, i64)]) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        {
            let mut stmt = tx
                .prepare("UPDATE content_blocks SET ord = ?1 WHERE id = ?2")
                .map_err(DatabaseError::Query)?;
            for (id, ord) in orders {
                stmt.execute(params![ord, id]).map_err(DatabaseError::Query)?;
            }
        }
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn delete_block(&self, section_id: Uuid, block_id: Uuid) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        tx.execute("DELETE FROM comments WHERE block_id = ?1", params![block_id])
            .map_err(DatabaseError::Query)?;
        tx.execute("DELETE FROM tiles WHERE block_id = ?1", params![block_id])
            .map_err(DatabaseError::Query)?;
        tx.execute("DELETE FROM content_blocks WHERE id = ?1", params![block_id])
            .map_err(DatabaseError::Query)?;
        renumber_siblings(&tx, "content_blocks", "section_id", section_id)
            .map_err(DatabaseError::Query)?;
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn list_tiles(&self, block_id: Uuid) -> Result<Vec<Tile>> {
        let conn = self.lock();
        query_tiles(&conn, block_id).map_err(|e| DatabaseError::Query(e).into())
    }

    pub fn get_tile(&self, block_id: Uuid, tile_id: Uuid) -> Result<Option<Tile>> {
        let conn = self.lock();
        let tile = conn
            .query_row(
                "SELECT id, block_id, ord, kind, title, statistic, trend, link_text, link_url
                 FROM tiles WHERE id = ?1 AND block_id = ?2",
                params![tile_id, block_id],
                tile_from_row,
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(tile)
    }

    pub fn insert_tile_at(&self, tile: &Tile) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        tx.execute(
            "UPDATE tiles SET ord = ord + 1 WHERE block_id = ?1 AND ord >= ?2",
            params![tile.block_id, tile.ord],
        )
        .map_err(DatabaseError::Query)?;
        insert_tile_row(&tx, tile).map_err(DatabaseError::Query)?;
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn update_tile(&self, tile: &Tile) -> Result<()> {
        let conn = self.lock();
        let (title, statistic, trend, link_text, link_url) = match &tile.kind {
            TileKind::Stat {
                title,
                statistic,
                trend,
            } => (
                title.as_str(),
                Some(statistic.as_str()),
                trend.as_deref(),
                None,
                None,
            ),
            TileKind::Link {
                title,
                link_text,
                link_url,
            } => (
                title.as_str(),
                None,
                None,
                Some(link_text.as_str()),
                Some(link_url.as_str()),
            ),
        };
        conn.execute(
            "UPDATE tiles SET title = ?1, statistic = ?2, trend = ?3, link_text = ?4, link_url = ?5
             WHERE id = ?6",
            params![title, statistic, trend, link_text, link_url, tile.id],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn set_tile_orders(&self, orders: &[(Uuid, i64)]) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        {
            let mut stmt = tx
                .prepare("UPDATE tiles SET ord = ?1 WHERE id = ?2")
                .map_err(DatabaseError::Query)?;
            for (id, ord) in orders {
                stmt.execute(params![ord, id]).map_err(DatabaseError::Query)?;
            }
        }
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn delete_tile(&self, block_id: Uuid, tile_id: Uuid) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;
        tx.execute("DELETE FROM tiles WHERE id = ?1", params![tile_id])
            .map_err(DatabaseError::Query)?;
        renumber_siblings(&tx, "tiles", "block_id", block_id).map_err(DatabaseError::Query)?;
        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO comments (id, block_id, content, created_by, created_at, resolved)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                comment.id,
                comment.block_id,
                comment.content,
                comment.created_by,
                comment.created_at,
                comment.resolved
            ],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn list_comments(&self, block_id: Uuid) -> Result<Vec<Comment>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, block_id, content, created_by, created_at, resolved
                 FROM comments WHERE block_id = ?1 ORDER BY created_at",
            )
            .map_err(DatabaseError::Query)?;
        let comments = stmt
            .query_map(params![block_id], |row| {
                Ok(Comment {
                    id: row.get("id")?,
                    block_id: row.get("block_id")?,
                    content: row.get("content")?,
                    created_by: row.get("created_by")?,
                    created_at: row.get("created_at")?,
                    resolved: row.get("resolved")?,
                })
            })
            .map_err(DatabaseError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::Query)?;
        Ok(comments)
    }

    pub fn insert_embed(&self, embed: &Embed) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO embeds (id, title, url) VALUES (?1, ?2, ?3)",
            params![embed.id, embed.title, embed.url],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn get_embed(&self, embed_id: Uuid) -> Result<Option<Embed>> {
        let conn = self.lock();
        let embed = conn
            .query_row(
                "SELECT id, title, url FROM embeds WHERE id = ?1",
                params![embed_id],
                |row| {
                    Ok(Embed {
                        id: row.get("id")?,
                        title: row.get("title")?,
                        url: row.get("url")?,
                    })
                },
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(embed)
    }

    pub fn insert_data_block_parent(&self, parent: &DataBlockParent) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO data_block_parents (id, publication_id, name) VALUES (?1, ?2, ?3)",
            params![parent.id, parent.publication_id, parent.name],
        )
        .map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn insert_data_block_version(&self, version: &DataBlockVersion) -> Result<()> {
        let conn = self.lock();
        insert_version_row(&conn, version).map_err(DatabaseError::Query)?;
        Ok(())
    }

    pub fn get_data_block_version(&self, version_id: Uuid) -> Result<Option<DataBlockVersion>> {
        let conn = self.lock();
        let version = conn
            .query_row(
                "SELECT id, parent_id, release_id, name, heading, source, query,
                        table_config, chart_config, version
                 FROM data_block_versions WHERE id = ?1",
                params![version_id],
                version_from_row,
            )
            .optional()
            .map_err(DatabaseError::Query)?;
        Ok(version)
    }

    pub fn list_data_block_versions(&self, release_id: Uuid) -> Result<Vec<DataBlockVersion>> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, parent_id, release_id, name, heading, source, query,
                        table_config, chart_config, version
                 FROM data_block_versions WHERE release_id = ?1 ORDER BY name",
            )
            .map_err(DatabaseError::Query)?;
        let versions = stmt
            .query_map(params![release_id], version_from_row)
            .map_err(DatabaseError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::Query)?;
        Ok(versions)
    }

    /// How many places within a release reference a data-block version:
    /// content blocks, key statistics and featured tables.
    pub fn count_version_references(&self, release_id: Uuid, version_id: Uuid) -> Result<i64> {
        let conn = self.lock();
        let count: i64 = conn
            .query_row(
                "SELECT
                   (SELECT COUNT(*) FROM content_blocks b
                      JOIN content_sections s ON b.section_id = s.id
                      JOIN pages p ON s.page_id = p.id
                    WHERE p.release_id = ?1 AND b.data_block_version_id = ?2)
                 + (SELECT COUNT(*) FROM key_statistics
                    WHERE release_id = ?1 AND data_block_version_id = ?2)
                 + (SELECT COUNT(*) FROM featured_tables
                    WHERE release_id = ?1 AND data_block_version_id = ?2)",
                params![release_id, version_id],
                |row| row.get(0),
            )
            .map_err(DatabaseError::Query)?;
        Ok(count)
    }
}
