//! Release amendment service
//!
//! Amending clones a release's whole content graph into a new draft
//! version: scalar fields carry over, lifecycle fields reset, and every
//! foreign key is re-pointed into the new graph. Data-block parents get a
//! fresh draft version per lineage; cloned content must reference the new
//! version ids even while the originals still exist. Review comments are
//! dropped and their inline markup stripped from cloned bodies. The
//! companion statistics-store rows are cloned under the same new release
//! id.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::data::amendment::AmendmentGraph;
use crate::core::data::{Database, StatsDatabase};
use crate::core::infrastructure::CommentMarkupStripper;
use crate::core::model::{
    ApprovalStatus, BlockKind, ContentBlock, ContentSection, DataBlockVersion, FeaturedTable,
    KeyStatKind, KeyStatistic, Page, RelatedLink, Release, ReleaseFileLink, ReleaseNote,
    ReleaseRole, Tile, UserReleaseRole,
};
use crate::error::{Result, StatDeskError};

pub struct AmendmentService {
    db: Arc<Database>,
    stats_db: Arc<StatsDatabase>,
    stripper: CommentMarkupStripper,
}

impl AmendmentService {
    pub fn new(db: Arc<Database>, stats_db: Arc<StatsDatabase>) -> Self {
        Self {
            db,
            stats_db,
            stripper: CommentMarkupStripper::new(),
        }
    }

    /// Clone `source_release_id` into a new draft amendment and return the
    /// stored amendment row.
    pub async fn amend(&self, source_release_id: Uuid, actor: &str) -> Result<Release> {
        let source = self
            .db
            .get_release(source_release_id)?
            .ok_or(StatDeskError::NotFound)?;
        let source_page = self
            .db
            .get_release_page(source.id)?
            .ok_or(StatDeskError::NotFound)?;
        let tree = self
            .db
            .get_page_tree(source_page.id)?
            .ok_or(StatDeskError::NotFound)?;

        let new_id = Uuid::new_v4();

        // Each data-block parent with a version on the source release gets
        // a new draft version keyed to the amendment.
        let mut version_map: HashMap<Uuid, Uuid> = HashMap::new();
        let data_block_versions: Vec<DataBlockVersion> = self
            .db
            .list_data_block_versions(source.id)?
            .into_iter()
            .map(|old| {
                let cloned = DataBlockVersion {
                    id: Uuid::new_v4(),
                    parent_id: old.parent_id,
                    release_id: new_id,
                    name: old.name.clone(),
                    heading: old.heading.clone(),
                    source: old.source.clone(),
                    query: old.query.clone(),
                    table_config: old.table_config.clone(),
                    chart_config: old.chart_config.clone(),
                    version: old.version + 1,
                };
                version_map.insert(old.id, cloned.id);
                cloned
            })
            .collect();

        let page = Page {
            id: Uuid::new_v4(),
            kind: source_page.kind,
            release_id: Some(new_id),
            title: source_page.title.clone(),
            slug: source_page.slug.clone(),
        };

        let mut sections = Vec::new();
        let mut blocks = Vec::new();
        let mut tiles = Vec::new();
        for section_tree in &tree.sections {
            let section_id = Uuid::new_v4();
            sections.push(ContentSection {
                id: section_id,
                page_id: page.id,
                ord: section_tree.section.ord,
                heading: section_tree.section.heading.clone(),
            });
            for block_tree in &section_tree.blocks {
                let block_id = Uuid::new_v4();
                let kind = match &block_tree.block.kind {
                    BlockKind::Html { body } => BlockKind::Html {
                        body: self.stripper.strip(body),
                    },
                    BlockKind::TileGroup => BlockKind::TileGroup,
                    BlockKind::DataBlock {
                        data_block_version_id,
                    } => BlockKind::DataBlock {
                        data_block_version_id: self
                            .map_version(&version_map, *data_block_version_id),
                    },
                    BlockKind::Embed { embed_id } => BlockKind::Embed { embed_id: *embed_id },
                };
                blocks.push(ContentBlock {
                    id: block_id,
                    section_id,
                    ord: block_tree.block.ord,
                    kind,
                });
                for tile in &block_tree.tiles {
                    tiles.push(Tile {
                        id: Uuid::new_v4(),
                        block_id,
                        ord: tile.ord,
                        kind: tile.kind.clone(),
                    });
                }
            }
        }

        let key_statistics: Vec<KeyStatistic> = self
            .db
            .list_key_statistics(source.id)?
            .into_iter()
            .map(|stat| {
                let kind = match stat.kind {
                    KeyStatKind::Text { title, statistic } => {
                        KeyStatKind::Text { title, statistic }
                    }
                    KeyStatKind::DataBlock {
                        data_block_version_id,
                    } => KeyStatKind::DataBlock {
                        data_block_version_id: self
                            .map_version(&version_map, data_block_version_id),
                    },
                };
                KeyStatistic {
                    id: Uuid::new_v4(),
                    release_id: new_id,
                    ord: stat.ord,
                    trend: stat.trend,
                    guidance_title: stat.guidance_title,
                    guidance_text: stat.guidance_text,
                    kind,
                }
            })
            .collect();

        // File blobs are shared across versions; only new link rows are
        // written.
        let file_links: Vec<ReleaseFileLink> = self
            .db
            .list_release_files(source.id, None)?
            .into_iter()
            .map(|info| ReleaseFileLink {
                id: Uuid::new_v4(),
                release_id: new_id,
                file_id: info.link.file_id,
                name: info.link.name.clone(),
                ord: info.link.ord,
            })
            .collect();

        let roles: Vec<UserReleaseRole> = self
            .db
            .list_roles(source.id)?
            .into_iter()
            .filter(|role| role.role != ReleaseRole::PrereleaseViewer)
            .map(|role| UserReleaseRole {
                id: Uuid::new_v4(),
                release_id: new_id,
                user_email: role.user_email,
                role: role.role,
            })
            .collect();

        let release_notes: Vec<ReleaseNote> = self
            .db
            .list_release_notes(source.id)?
            .into_iter()
            .map(|note| ReleaseNote {
                id: Uuid::new_v4(),
                release_id: new_id,
                ..note
            })
            .collect();

        let related_links: Vec<RelatedLink> = self
            .db
            .list_related_links(source.id)?
            .into_iter()
            .map(|link| RelatedLink {
                id: Uuid::new_v4(),
                release_id: new_id,
                ..link
            })
            .collect();

        let featured_tables: Vec<FeaturedTable> = self
            .db
            .list_featured_tables(source.id)?
            .into_iter()
            .map(|table| FeaturedTable {
                id: Uuid::new_v4(),
                release_id: new_id,
                data_block_version_id: self
                    .map_version(&version_map, table.data_block_version_id),
                ..table
            })
            .collect();

        let release = Release {
            id: new_id,
            publication_id: source.publication_id,
            version: source.version + 1,
            previous_version_id: Some(source.id),
            time_period: source.time_period.clone(),
            year: source.year,
            label: source.label.clone(),
            approval_status: ApprovalStatus::Draft,
            publish_scheduled: None,
            next_release_date: source.next_release_date,
            published: None,
            notify_subscribers: false,
            update_published_date: source.update_published_date,
            data_guidance: source.data_guidance.clone(),
            created_by: actor.to_string(),
            created_at: Utc::now(),
            soft_deleted: false,
        };

        self.db.insert_amendment_graph(&AmendmentGraph {
            release,
            page,
            sections,
            blocks,
            tiles,
            data_block_versions,
            key_statistics,
            file_links,
            roles,
            release_notes,
            related_links,
            featured_tables,
        })?;

        if !self.stats_db.clone_release(source.id, new_id)? {
            warn!(
                "Release {} has no statistics-store row; amendment {} created without one",
                source.id, new_id
            );
        }

        info!(
            "Amended release {} into draft version {} ({})",
            source.id,
            source.version + 1,
            new_id
        );

        // Re-read so the caller sees exactly what the store now holds.
        self.db
            .get_release(new_id)?
            .ok_or_else(|| StatDeskError::Internal(anyhow!("amendment missing after insert")))
    }

    fn map_version(&self, version_map: &HashMap<Uuid, Uuid>, old_id: Uuid) -> Uuid {
        match version_map.get(&old_id) {
            Some(new_id) => *new_id,
            None => {
                warn!(
                    "Data-block version {} is not owned by the amended release; keeping the original reference",
                    old_id
                );
                old_id
            }
        }
    }
}
