use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Data,
    Metadata,
    Ancillary,
    Image,
    Archive,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Data => "data",
            FileKind::Metadata => "metadata",
            FileKind::Ancillary => "ancillary",
            FileKind::Image => "image",
            FileKind::Archive => "archive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "data" => Some(FileKind::Data),
            "metadata" => Some(FileKind::Metadata),
            "ancillary" => Some(FileKind::Ancillary),
            "image" => Some(FileKind::Image),
            "archive" => Some(FileKind::Archive),
            _ => None,
        }
    }
}

/// Metadata row describing an uploaded artifact. The blob itself lives in
/// blob storage under `blob_path()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReference {
    pub id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    pub kind: FileKind,
    /// The archive this data/metadata pair was extracted from, if any.
    pub source_archive_id: Option<Uuid>,
    /// For data files, the metadata file of the pair, and vice versa.
    pub paired_file_id: Option<Uuid>,
    /// The file this one replaces, while a replacement is in progress.
    pub replacing_id: Option<Uuid>,
    pub replaced_by_id: Option<Uuid>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl FileReference {
    pub fn blob_path(&self) -> String {
        format!("{}/{}", self.kind.as_str(), self.id)
    }
}

/// Link-table row attaching a file to a release. Files shared across
/// release versions have one link row per release; deleting a link never
/// implies deleting the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseFileLink {
    pub id: Uuid,
    pub release_id: Uuid,
    pub file_id: Uuid,
    /// Display name, e.g. the data set title for data files.
    pub name: Option<String>,
    /// Meaningful for data files only; other kinds stay at zero.
    pub ord: i64,
}

/// Joined listing view of a release's file.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseFileInfo {
    pub link: ReleaseFileLink,
    pub file: FileReference,
}
