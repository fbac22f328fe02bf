//! Entities of the companion statistics store. Rows are keyed by the same
//! release ids as the content store to keep the two consistent.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Companion row for a release in the statistics store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatRelease {
    pub id: Uuid,
    pub publication_id: Uuid,
}

/// A data subject (one imported data set) available to a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Footnote {
    pub id: Uuid,
    pub content: String,
}

/// Criteria a footnote applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootnoteLinks {
    pub subjects: Vec<Uuid>,
    pub filters: Vec<Uuid>,
    pub filter_items: Vec<Uuid>,
    pub indicators: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootnoteWithLinks {
    pub footnote: Footnote,
    pub ord: i64,
    pub links: FootnoteLinks,
}
