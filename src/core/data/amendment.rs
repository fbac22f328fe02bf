//! Persistence of a fully built amendment graph.
//!
//! The amendment service assembles the cloned graph in memory; this module
//! writes it in one transaction so a failed clone leaves no partial
//! release behind.

use rusqlite::params;

use crate::core::model::{
    ContentBlock, ContentSection, DataBlockVersion, FeaturedTable, KeyStatistic, Page,
    RelatedLink, Release, ReleaseFileLink, ReleaseNote, Tile, UserReleaseRole,
};
use crate::error::{DatabaseError, Result};

use super::content::{insert_block_row, insert_section_row, insert_tile_row, insert_version_row};
use super::database::Database;
use super::files::insert_link_row;
use super::key_stats::insert_key_stat_row;
use super::releases::insert_release_row;

/// Everything a new amendment writes to the content store.
pub struct AmendmentGraph {
    pub release: Release,
    pub page: Page,
    pub sections: Vec<ContentSection>,
    pub blocks: Vec<ContentBlock>,
    pub tiles: Vec<Tile>,
    pub data_block_versions: Vec<DataBlockVersion>,
    pub key_statistics: Vec<KeyStatistic>,
    pub file_links: Vec<ReleaseFileLink>,
    pub roles: Vec<UserReleaseRole>,
    pub release_notes: Vec<ReleaseNote>,
    pub related_links: Vec<RelatedLink>,
    pub featured_tables: Vec<FeaturedTable>,
}

impl Database {
    pub fn insert_amendment_graph(&self, graph: &AmendmentGraph) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction().map_err(DatabaseError::Query)?;

        insert_release_row(&tx, &graph.release).map_err(DatabaseError::Query)?;

        tx.execute(
            "INSERT INTO pages (id, kind, release_id, title, slug) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                graph.page.id,
                graph.page.kind.as_str(),
                graph.page.release_id,
                graph.page.title,
                graph.page.slug
            ],
        )
        .map_err(DatabaseError::Query)?;

        for version in &graph.data_block_versions {
            insert_version_row(&tx, version).map_err(DatabaseError::Query)?;
        }
        for section in &graph.sections {
            insert_section_row(&tx, section).map_err(DatabaseError::Query)?;
        }
        for block in &graph.blocks {
            insert_block_row(&tx, block).map_err(DatabaseError::Query)?;
        }
        for tile in &graph.tiles {
            insert_tile_row(&tx, tile).map_err(DatabaseError::Query)?;
        }
        for stat in &graph.key_statistics {
            insert_key_stat_row(&tx, stat).map_err(DatabaseError::Query)?;
        }
        for link in &graph.file_links {
            insert_link_row(&tx, link).map_err(DatabaseError::Query)?;
        }
        for role in &graph.roles {
            tx.execute(
                "INSERT INTO user_release_roles (id, release_id, user_email, role)
                 VALUES (?1, ?2, ?3, ?4)",
                params![role.id, role.release_id, role.user_email, role.role.as_str()],
            )
            .map_err(DatabaseError::Query)?;
        }
        for note in &graph.release_notes {
            tx.execute(
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
        }
        for link in &graph.related_links {
            tx.execute(
                "INSERT INTO related_links (id, release_id, ord, title, url)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![link.id, link.release_id, link.ord, link.title, link.url],
            )
            .map_err(DatabaseError::Query)?;
        }
        for table in &graph.featured_tables {
            tx.execute(
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
        }

        tx.commit().map_err(DatabaseError::Query)?;
        Ok(())
    }
}
