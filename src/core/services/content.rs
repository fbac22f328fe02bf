//! Content structure service: ordered trees of sections, blocks and tiles
//! under a page
//!
//! Every mutation keeps sibling `ord` values dense from zero. Lookups are
//! scoped by the claimed parent chain; an id that does not resolve under
//! its parent is a not-found, as is an update aimed at the wrong block or
//! tile variant.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::core::data::Database;
use crate::core::model::{
    BlockKind, Comment, ContentBlock, ContentSection, Embed, Page, PageKind, PageTree, Tile,
    TileKind,
};
use crate::error::{Result, StatDeskError, ValidationCode};

use super::ordering::{dense_orders, insert_position, validate_reorder};

pub struct ContentService {
    db: Arc<Database>,
}

impl ContentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a standalone simple content page.
    pub async fn create_page(&self, title: &str, slug: &str) -> Result<Page> {
        let page = Page {
            id: Uuid::new_v4(),
            kind: PageKind::Standalone,
            release_id: None,
            title: title.to_string(),
            slug: slug.to_string(),
        };
        self.db.insert_page(&page)?;
        info!("Created page {} ({})", page.slug, page.id);
        Ok(page)
    }

    /// Full tree ordered by `ord` at every level.
    pub async fn get_page_tree(&self, page_id: Uuid) -> Result<PageTree> {
        self.db.get_page_tree(page_id)?.ok_or(StatDeskError::NotFound)
    }

    pub async fn add_section(
        &self,
        page_id: Uuid,
        order: Option<i64>,
        heading: &str,
    ) -> Result<ContentSection> {
        self.require_page(page_id)?;
        let siblings = self.db.list_sections(page_id)?;
        let section = ContentSection {
            id: Uuid::new_v4(),
            page_id,
            ord: insert_position(order, siblings.len()),
            heading: heading.to_string(),
        };
        self.db.insert_section_at(&section)?;
        info!("Added section {} to page {} at {}", section.id, page_id, section.ord);
        Ok(section)
    }

    pub async fn update_section_heading(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        heading: &str,
    ) -> Result<ContentSection> {
        let mut section = self.require_section(page_id, section_id)?;
        self.db.update_section_heading(section_id, heading)?;
        section.heading = heading.to_string();
        Ok(section)
    }

    /// Apply a complete new section order. The id set must match exactly.
    pub async fn reorder_sections(
        &self,
        page_id: Uuid,
        ids: Vec<Uuid>,
    ) -> Result<Vec<ContentSection>> {
        self.require_page(page_id)?;
        let actual: Vec<Uuid> = self.db.list_sections(page_id)?.iter().map(|s| s.id).collect();
        validate_reorder(&ids, &actual, ValidationCode::SectionIdsDifferFromActual)?;
        self.db.set_section_orders(&dense_orders(&ids))?;
        self.db.list_sections(page_id)
    }

    pub async fn remove_section(&self, page_id: Uuid, section_id: Uuid) -> Result<()> {
        self.require_section(page_id, section_id)?;
        self.db.delete_section(page_id, section_id)?;
        info!("Removed section {} from page {}", section_id, page_id);
        Ok(())
    }

    pub async fn add_html_block(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        order: Option<i64>,
        body: &str,
    ) -> Result<ContentBlock> {
        self.add_block(page_id, section_id, order, BlockKind::Html {
            body: body.to_string(),
        })
        .await
    }

    pub async fn add_tile_group_block(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        order: Option<i64>,
    ) -> Result<ContentBlock> {
        self.add_block(page_id, section_id, order, BlockKind::TileGroup).await
    }

    /// Attach an existing data-block version as a content block.
    pub async fn attach_data_block(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        order: Option<i64>,
        data_block_version_id: Uuid,
    ) -> Result<ContentBlock> {
        if self.db.get_data_block_version(data_block_version_id)?.is_none() {
            return Err(StatDeskError::NotFound);
        }
        self.add_block(page_id, section_id, order, BlockKind::DataBlock {
            data_block_version_id,
        })
        .await
    }

    /// Register an embeddable resource for use by embed blocks.
    pub async fn create_embed(&self, title: &str, url: &str) -> Result<Embed> {
        let embed = Embed {
            id: Uuid::new_v4(),
            title: title.to_string(),
            url: url.to_string(),
        };
        self.db.insert_embed(&embed)?;
        info!("Created embed {} ({})", embed.title, embed.id);
        Ok(embed)
    }

    pub async fn add_embed_block(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        order: Option<i64>,
        embed_id: Uuid,
    ) -> Result<ContentBlock> {
        if self.db.get_embed(embed_id)?.is_none() {
            return Err(StatDeskError::NotFound);
        }
        self.add_block(page_id, section_id, order, BlockKind::Embed { embed_id })
            .await
    }

    /// Attach a review comment to a block.
    pub async fn add_comment(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        block_id: Uuid,
        content: &str,
        actor: &str,
    ) -> Result<Comment> {
        self.require_block(page_id, section_id, block_id)?;
        let comment = Comment {
            id: Uuid::new_v4(),
            block_id,
            content: content.to_string(),
            created_by: actor.to_string(),
            created_at: chrono::Utc::now(),
            resolved: false,
        };
        self.db.insert_comment(&comment)?;
        Ok(comment)
    }

    async fn add_block(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        order: Option<i64>,
        kind: BlockKind,
    ) -> Result<ContentBlock> {
        self.require_section(page_id, section_id)?;
        let siblings = self.db.list_blocks(section_id)?;
        let block = ContentBlock {
            id: Uuid::new_v4(),
            section_id,
            ord: insert_position(order, siblings.len()),
            kind,
        };
        self.db.insert_block_at(&block)?;
        info!(
            "Added {} block {} to section {} at {}",
            block.kind.kind_str(),
            block.id,
            section_id,
            block.ord
        );
        Ok(block)
    }

    /// Replace the body of an html block. Aiming this at any other block
    /// variant is a not-found, not a type error.
    pub async fn update_block_body(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        block_id: Uuid,
        body: &str,
    ) -> Result<ContentBlock> {
        let mut block = self.require_block(page_id, section_id, block_id)?;
        match block.kind {
            BlockKind::Html { .. } => {}
            _ => return Err(StatDeskError::NotFound),
        }
        self.db.update_block_body(block_id, body)?;
        block.kind = BlockKind::Html {
            body: body.to_string(),
        };
        Ok(block)
    }

    pub async fn reorder_blocks(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        ids: Vec<Uuid>,
    ) -> Result<Vec<ContentBlock>> {
        self.require_section(page_id, section_id)?;
        let actual: Vec<Uuid> = self.db.list_blocks(section_id)?.iter().map(|b| b.id).collect();
        validate_reorder(&ids, &actual, ValidationCode::BlockIdsDifferFromActual)?;
        self.db.set_block_orders(&dense_orders(&ids))?;
        self.db.list_blocks(section_id)
    }

    pub async fn remove_block(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        block_id: Uuid,
    ) -> Result<()> {
        self.require_block(page_id, section_id, block_id)?;
        self.db.delete_block(section_id, block_id)?;
        info!("Removed block {} from section {}", block_id, section_id);
        Ok(())
    }

    pub async fn add_tile(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        block_id: Uuid,
        order: Option<i64>,
        kind: TileKind,
    ) -> Result<Tile> {
        self.require_tile_group(page_id, section_id, block_id)?;
        let siblings = self.db.list_tiles(block_id)?;
        let tile = Tile {
            id: Uuid::new_v4(),
            block_id,
            ord: insert_position(order, siblings.len()),
            kind,
        };
        self.db.insert_tile_at(&tile)?;
        info!(
            "Added {} tile {} to block {} at {}",
            tile.kind.kind_str(),
            tile.id,
            block_id,
            tile.ord
        );
        Ok(tile)
    }

    /// Update a tile in place. The variant must match the existing tile;
    /// a mismatched variant is a not-found.
    pub async fn update_tile(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        block_id: Uuid,
        tile_id: Uuid,
        kind: TileKind,
    ) -> Result<Tile> {
        self.require_tile_group(page_id, section_id, block_id)?;
        let mut tile = self
            .db
            .get_tile(block_id, tile_id)?
            .ok_or(StatDeskError::NotFound)?;
        if tile.kind.kind_str() != kind.kind_str() {
            return Err(StatDeskError::NotFound);
        }
        tile.kind = kind;
        self.db.update_tile(&tile)?;
        Ok(tile)
    }

    pub async fn reorder_tiles(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        block_id: Uuid,
        ids: Vec<Uuid>,
    ) -> Result<Vec<Tile>> {
        self.require_tile_group(page_id, section_id, block_id)?;
        let actual: Vec<Uuid> = self.db.list_tiles(block_id)?.iter().map(|t| t.id).collect();
        validate_reorder(&ids, &actual, ValidationCode::TileIdsDifferFromActual)?;
        self.db.set_tile_orders(&dense_orders(&ids))?;
        self.db.list_tiles(block_id)
    }

    pub async fn remove_tile(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        block_id: Uuid,
        tile_id: Uuid,
    ) -> Result<()> {
        self.require_tile_group(page_id, section_id, block_id)?;
        if self.db.get_tile(block_id, tile_id)?.is_none() {
            return Err(StatDeskError::NotFound);
        }
        self.db.delete_tile(block_id, tile_id)?;
        info!("Removed tile {} from block {}", tile_id, block_id);
        Ok(())
    }

    fn require_page(&self, page_id: Uuid) -> Result<Page> {
        self.db.get_page(page_id)?.ok_or(StatDeskError::NotFound)
    }

    fn require_section(&self, page_id: Uuid, section_id: Uuid) -> Result<ContentSection> {
        self.db
            .get_section(page_id, section_id)?
            .ok_or(StatDeskError::NotFound)
    }

    fn require_block(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        block_id: Uuid,
    ) -> Result<ContentBlock> {
        self.require_section(page_id, section_id)?;
        self.db
            .get_block(section_id, block_id)?
            .ok_or(StatDeskError::NotFound)
    }

    fn require_tile_group(
        &self,
        page_id: Uuid,
        section_id: Uuid,
        block_id: Uuid,
    ) -> Result<ContentBlock> {
        let block = self.require_block(page_id, section_id, block_id)?;
        match block.kind {
            BlockKind::TileGroup => Ok(block),
            _ => Err(StatDeskError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ContentService {
        let db = Arc::new(Database::open_in_memory().expect("in-memory database"));
        ContentService::new(db)
    }

    async fn page(service: &ContentService) -> Page {
        service.create_page("Glossary", "glossary").await.expect("create page")
    }

    fn orders(sections: &[ContentSection]) -> Vec<i64> {
        sections.iter().map(|s| s.ord).collect()
    }

    #[tokio::test]
    async fn test_get_page_tree_unknown_page_is_not_found() {
        let service = service();
        let err = service.get_page_tree(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_add_section_appends_when_order_unspecified() {
        let service = service();
        let page = page(&service).await;

        let first = service.add_section(page.id, None, "One").await.unwrap();
        let second = service.add_section(page.id, None, "Two").await.unwrap();

        assert_eq!(first.ord, 0);
        assert_eq!(second.ord, 1);
    }

    #[tokio::test]
    async fn test_add_section_at_taken_order_shifts_existing_siblings() {
        let service = service();
        let page = page(&service).await;
        let b = service.add_section(page.id, None, "B").await.unwrap();
        let a = service.add_section(page.id, None, "A").await.unwrap();

        let newcomer = service.add_section(page.id, Some(0), "New").await.unwrap();

        let sections = service.get_page_tree(page.id).await.unwrap().sections;
        let find = |id: Uuid| sections.iter().find(|s| s.section.id == id).unwrap().section.ord;
        assert_eq!(newcomer.ord, 0);
        assert_eq!(find(b.id), 1);
        assert_eq!(find(a.id), 2);
    }

    #[tokio::test]
    async fn test_section_orders_stay_dense_after_removal() {
        let service = service();
        let page = page(&service).await;
        let first = service.add_section(page.id, None, "One").await.unwrap();
        service.add_section(page.id, None, "Two").await.unwrap();
        service.add_section(page.id, None, "Three").await.unwrap();

        service.remove_section(page.id, first.id).await.unwrap();

        let sections = service.db.list_sections(page.id).unwrap();
        assert_eq!(orders(&sections), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_reorder_sections_applies_given_order() {
        let service = service();
        let page = page(&service).await;
        let one = service.add_section(page.id, None, "One").await.unwrap();
        let two = service.add_section(page.id, None, "Two").await.unwrap();

        let sections = service
            .reorder_sections(page.id, vec![two.id, one.id])
            .await
            .unwrap();

        assert_eq!(sections[0].id, two.id);
        assert_eq!(sections[1].id, one.id);
        assert_eq!(orders(&sections), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_reorder_sections_rejects_mismatched_id_sets() {
        let service = service();
        let page = page(&service).await;
        let one = service.add_section(page.id, None, "One").await.unwrap();
        let two = service.add_section(page.id, None, "Two").await.unwrap();

        // Missing an id.
        let err = service.reorder_sections(page.id, vec![one.id]).await.unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::SectionIdsDifferFromActual]
        );

        // Right size, wrong membership.
        let err = service
            .reorder_sections(page.id, vec![one.id, Uuid::new_v4()])
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::SectionIdsDifferFromActual]
        );

        // Extra id.
        let err = service
            .reorder_sections(page.id, vec![one.id, two.id, Uuid::new_v4()])
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::SectionIdsDifferFromActual]
        );
    }

    #[tokio::test]
    async fn test_update_section_heading_under_wrong_page_is_not_found() {
        let service = service();
        let page_a = page(&service).await;
        let page_b = service.create_page("Other", "other").await.unwrap();
        let section = service.add_section(page_a.id, None, "One").await.unwrap();

        let err = service
            .update_section_heading(page_b.id, section.id, "Renamed")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let updated = service
            .update_section_heading(page_a.id, section.id, "Renamed")
            .await
            .unwrap();
        assert_eq!(updated.heading, "Renamed");
    }

    #[tokio::test]
    async fn test_block_orders_shift_and_stay_dense() {
        let service = service();
        let page = page(&service).await;
        let section = service.add_section(page.id, None, "One").await.unwrap();

        let first = service
            .add_html_block(page.id, section.id, None, "<p>first</p>")
            .await
            .unwrap();
        let second = service
            .add_html_block(page.id, section.id, None, "<p>second</p>")
            .await
            .unwrap();
        let inserted = service
            .add_html_block(page.id, section.id, Some(1), "<p>between</p>")
            .await
            .unwrap();

        let blocks = service.db.list_blocks(section.id).unwrap();
        let ids: Vec<Uuid> = blocks.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![first.id, inserted.id, second.id]);
        assert_eq!(blocks.iter().map(|b| b.ord).collect::<Vec<_>>(), vec![0, 1, 2]);

        service.remove_block(page.id, section.id, inserted.id).await.unwrap();
        let blocks = service.db.list_blocks(section.id).unwrap();
        assert_eq!(blocks.iter().map(|b| b.ord).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_update_block_body_on_tile_group_is_not_found() {
        let service = service();
        let page = page(&service).await;
        let section = service.add_section(page.id, None, "One").await.unwrap();
        let group = service
            .add_tile_group_block(page.id, section.id, None)
            .await
            .unwrap();

        let err = service
            .update_block_body(page.id, section.id, group.id, "<p>nope</p>")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_reorder_blocks_rejects_foreign_ids() {
        let service = service();
        let page = page(&service).await;
        let section = service.add_section(page.id, None, "One").await.unwrap();
        let block = service
            .add_html_block(page.id, section.id, None, "<p>only</p>")
            .await
            .unwrap();

        let err = service
            .reorder_blocks(page.id, section.id, vec![block.id, Uuid::new_v4()])
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::BlockIdsDifferFromActual]
        );
    }

    #[tokio::test]
    async fn test_tile_lifecycle_under_tile_group() {
        let service = service();
        let page = page(&service).await;
        let section = service.add_section(page.id, None, "One").await.unwrap();
        let group = service
            .add_tile_group_block(page.id, section.id, None)
            .await
            .unwrap();

        let stat = service
            .add_tile(
                page.id,
                section.id,
                group.id,
                None,
                TileKind::Stat {
                    title: "Attendance".to_string(),
                    statistic: "92%".to_string(),
                    trend: Some("up".to_string()),
                },
            )
            .await
            .unwrap();
        let link = service
            .add_tile(
                page.id,
                section.id,
                group.id,
                Some(0),
                TileKind::Link {
                    title: "More".to_string(),
                    link_text: "See data".to_string(),
                    link_url: "https://example.test/data".to_string(),
                },
            )
            .await
            .unwrap();

        let tiles = service.db.list_tiles(group.id).unwrap();
        assert_eq!(tiles.iter().map(|t| t.id).collect::<Vec<_>>(), vec![link.id, stat.id]);
        assert_eq!(tiles.iter().map(|t| t.ord).collect::<Vec<_>>(), vec![0, 1]);

        // Updating a stat tile through the link variant is a not-found.
        let err = service
            .update_tile(
                page.id,
                section.id,
                group.id,
                stat.id,
                TileKind::Link {
                    title: "x".to_string(),
                    link_text: "x".to_string(),
                    link_url: "x".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        service
            .remove_tile(page.id, section.id, group.id, link.id)
            .await
            .unwrap();
        let tiles = service.db.list_tiles(group.id).unwrap();
        assert_eq!(tiles.iter().map(|t| t.ord).collect::<Vec<_>>(), vec![0]);
    }

    #[tokio::test]
    async fn test_tile_ops_require_tile_group_block() {
        let service = service();
        let page = page(&service).await;
        let section = service.add_section(page.id, None, "One").await.unwrap();
        let html = service
            .add_html_block(page.id, section.id, None, "<p>text</p>")
            .await
            .unwrap();

        let err = service
            .add_tile(
                page.id,
                section.id,
                html.id,
                None,
                TileKind::Stat {
                    title: "t".to_string(),
                    statistic: "1".to_string(),
                    trend: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
