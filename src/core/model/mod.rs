//! Domain entities backed by the content and statistics stores
//!
//! Polymorphic rows (content blocks, tiles, key statistics) are tagged
//! unions so every consumer matches exhaustively on the variant instead of
//! downcasting.

pub mod content;
pub mod file;
pub mod key_stat;
pub mod release;
pub mod statistics;

pub use content::{
    BlockKind, BlockTree, Comment, ContentBlock, ContentSection, DataBlockParent,
    DataBlockVersion, Embed, Page, PageKind, PageTree, SectionTree, Tile, TileKind,
};
pub use file::{FileKind, FileReference, ReleaseFileInfo, ReleaseFileLink};
pub use key_stat::{KeyStatKind, KeyStatistic};
pub use release::{
    ApprovalStatus, FeaturedTable, PrereleaseInvite, Publication, RelatedLink, Release,
    ReleaseNote, ReleaseRole, ReleaseStatus, UserReleaseRole,
};
pub use statistics::{Footnote, FootnoteLinks, FootnoteWithLinks, StatRelease, Subject};
