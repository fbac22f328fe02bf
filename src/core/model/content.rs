use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// The content page owned by a release.
    Release,
    /// A standalone simple content page (glossary, methodology, ...).
    Standalone,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Release => "release",
            PageKind::Standalone => "standalone",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "release" => Some(PageKind::Release),
            "standalone" => Some(PageKind::Standalone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub kind: PageKind,
    pub release_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
}

/// Ordered section of a page. `ord` values are dense from zero per page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSection {
    pub id: Uuid,
    pub page_id: Uuid,
    pub ord: i64,
    pub heading: String,
}

/// Ordered block of a section. `ord` values are dense from zero per section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: Uuid,
    pub section_id: Uuid,
    pub ord: i64,
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Html { body: String },
    TileGroup,
    DataBlock { data_block_version_id: Uuid },
    Embed { embed_id: Uuid },
}

impl BlockKind {
    pub fn kind_str(&self) -> &'static str {
        match self {
            BlockKind::Html { .. } => "html",
            BlockKind::TileGroup => "tile_group",
            BlockKind::DataBlock { .. } => "data_block",
            BlockKind::Embed { .. } => "embed",
        }
    }
}

/// Ordered tile under a tile-group block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub id: Uuid,
    pub block_id: Uuid,
    pub ord: i64,
    pub kind: TileKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TileKind {
    Stat {
        title: String,
        statistic: String,
        trend: Option<String>,
    },
    Link {
        title: String,
        link_text: String,
        link_url: String,
    },
}

impl TileKind {
    pub fn kind_str(&self) -> &'static str {
        match self {
            TileKind::Stat { .. } => "stat",
            TileKind::Link { .. } => "link",
        }
    }
}

/// Review comment on a content block. Never carried into amendments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub block_id: Uuid,
    pub content: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

/// Separately-owned embeddable resource referenced by embed blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embed {
    pub id: Uuid,
    pub title: String,
    pub url: String,
}

/// A saved data visualization lineage within a publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBlockParent {
    pub id: Uuid,
    pub publication_id: Uuid,
    pub name: String,
}

/// One per-release version of a data visualization. Content blocks, key
/// statistics, and featured tables reference version ids, never parents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBlockVersion {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub release_id: Uuid,
    pub name: String,
    pub heading: Option<String>,
    pub source: Option<String>,
    pub query: String,
    pub table_config: String,
    pub chart_config: Option<String>,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageTree {
    pub page: Page,
    pub sections: Vec<SectionTree>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionTree {
    pub section: ContentSection,
    pub blocks: Vec<BlockTree>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockTree {
    pub block: ContentBlock,
    pub tiles: Vec<Tile>,
}
