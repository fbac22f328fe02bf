use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a release version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Draft,
    HigherLevelReview,
    Approved,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Draft => "draft",
            ApprovalStatus::HigherLevelReview => "higher_level_review",
            ApprovalStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ApprovalStatus::Draft),
            "higher_level_review" => Some(ApprovalStatus::HigherLevelReview),
            "approved" => Some(ApprovalStatus::Approved),
            _ => None,
        }
    }
}

/// One lineage of release versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

/// One versioned edition of a publication's content and data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub id: Uuid,
    pub publication_id: Uuid,
    /// Monotonically increasing within a publication lineage.
    pub version: i64,
    /// Set on amendments; points at the release this one was cloned from.
    pub previous_version_id: Option<Uuid>,
    pub time_period: String,
    pub year: i32,
    pub label: Option<String>,
    pub approval_status: ApprovalStatus,
    pub publish_scheduled: Option<NaiveDate>,
    pub next_release_date: Option<NaiveDate>,
    pub published: Option<DateTime<Utc>>,
    pub notify_subscribers: bool,
    pub update_published_date: bool,
    pub data_guidance: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub soft_deleted: bool,
}

impl Release {
    pub fn is_amendment(&self) -> bool {
        self.previous_version_id.is_some()
    }

    pub fn live(&self) -> bool {
        self.published.is_some()
    }
}

/// Append-only approval history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseStatus {
    pub id: Uuid,
    pub release_id: Uuid,
    pub approval_status: ApprovalStatus,
    pub internal_note: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseRole {
    Contributor,
    Approver,
    Lead,
    PrereleaseViewer,
}

impl ReleaseRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseRole::Contributor => "contributor",
            ReleaseRole::Approver => "approver",
            ReleaseRole::Lead => "lead",
            ReleaseRole::PrereleaseViewer => "prerelease_viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "contributor" => Some(ReleaseRole::Contributor),
            "approver" => Some(ReleaseRole::Approver),
            "lead" => Some(ReleaseRole::Lead),
            "prerelease_viewer" => Some(ReleaseRole::PrereleaseViewer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReleaseRole {
    pub id: Uuid,
    pub release_id: Uuid,
    pub user_email: String,
    pub role: ReleaseRole,
}

/// Pending pre-release access; `sent` flips once the invite email goes out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrereleaseInvite {
    pub id: Uuid,
    pub release_id: Uuid,
    pub email: String,
    pub sent: bool,
}

/// Update-history entry shown on published releases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseNote {
    pub id: Uuid,
    pub release_id: Uuid,
    pub ord: i64,
    pub reason: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedLink {
    pub id: Uuid,
    pub release_id: Uuid,
    pub ord: i64,
    pub title: String,
    pub url: String,
}

/// A highlighted data-block table surfaced on the publication's table tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturedTable {
    pub id: Uuid,
    pub release_id: Uuid,
    pub ord: i64,
    pub name: String,
    pub description: Option<String>,
    pub data_block_version_id: Uuid,
}
