use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A short highlighted figure attached to a release, ordered densely from
/// zero per release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyStatistic {
    pub id: Uuid,
    pub release_id: Uuid,
    pub ord: i64,
    pub trend: Option<String>,
    pub guidance_title: Option<String>,
    pub guidance_text: Option<String>,
    pub kind: KeyStatKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyStatKind {
    /// Free-text figure entered by an author.
    Text { title: String, statistic: String },
    /// Figure backed by a data visualization version.
    DataBlock { data_block_version_id: Uuid },
}

impl KeyStatKind {
    pub fn kind_str(&self) -> &'static str {
        match self {
            KeyStatKind::Text { .. } => "text",
            KeyStatKind::DataBlock { .. } => "data_block",
        }
    }
}
