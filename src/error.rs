//! Error handling for the statdesk backend
//!
//! Expected failures (unknown ids, business-rule violations) are typed
//! variants that callers can match on; validation failures carry named
//! codes so callers can assert on specific rules. Infrastructure failures
//! propagate through `#[from]` conversions.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatDeskError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Blob storage error: {0}")]
    Blob(#[from] BlobError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(ValidationFailure),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl StatDeskError {
    pub fn validation(code: ValidationCode) -> Self {
        StatDeskError::Validation(ValidationFailure::new(vec![ValidationError::new(code)]))
    }

    pub fn validation_all(errors: Vec<ValidationError>) -> Self {
        StatDeskError::Validation(ValidationFailure::new(errors))
    }

    /// The validation codes carried by this error, empty for other variants.
    pub fn validation_codes(&self) -> Vec<ValidationCode> {
        match self {
            StatDeskError::Validation(failure) => {
                failure.errors.iter().map(|e| e.code).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StatDeskError::NotFound)
    }
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    Connection(#[source] rusqlite::Error),

    #[error("Query failed: {0}")]
    Query(#[source] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Database file not found: {path}")]
    FileNotFound { path: PathBuf },
}

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blob not found: {path}")]
    NotFound { path: String },

    #[error("Invalid blob path: {path}")]
    InvalidPath { path: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid config format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable error: {0}")]
    Environment(#[from] std::env::VarError),
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Template rendering failed: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Invalid notifier endpoint: {endpoint}")]
    InvalidEndpoint { endpoint: String },
}

/// One or more named business-rule violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub errors: Vec<ValidationError>,
}

impl ValidationFailure {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self.errors.iter().map(|e| e.code.to_string()).collect();
        write!(f, "{}", codes.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: ValidationCode,
    pub detail: Option<String>,
}

impl ValidationError {
    pub fn new(code: ValidationCode) -> Self {
        Self { code, detail: None }
    }

    pub fn with_detail(code: ValidationCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: Some(detail.into()),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.code, detail),
            None => write!(f, "{}", self.code),
        }
    }
}

/// Closed set of business-rule codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    ApprovedReleaseMustHavePublishScheduledDate,
    PublishedReleaseCannotBeUnapproved,
    SectionIdsDifferFromActual,
    BlockIdsDifferFromActual,
    TileIdsDifferFromActual,
    KeyStatisticIdsDifferFromActual,
    DataFileIdsDifferFromActual,
    DataBlockShouldBeUnattached,
    DataFileImportsMustBeCompleted,
    DataFileReplacementsMustBeCompleted,
    PublicDataGuidanceRequired,
    ReleaseNoteRequired,
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationCode::ApprovedReleaseMustHavePublishScheduledDate => {
                "APPROVED_RELEASE_MUST_HAVE_PUBLISH_SCHEDULED_DATE"
            }
            ValidationCode::PublishedReleaseCannotBeUnapproved => {
                "PUBLISHED_RELEASE_CANNOT_BE_UNAPPROVED"
            }
            ValidationCode::SectionIdsDifferFromActual => "SECTION_IDS_DIFFER_FROM_ACTUAL",
            ValidationCode::BlockIdsDifferFromActual => "BLOCK_IDS_DIFFER_FROM_ACTUAL",
            ValidationCode::TileIdsDifferFromActual => "TILE_IDS_DIFFER_FROM_ACTUAL",
            ValidationCode::KeyStatisticIdsDifferFromActual => {
                "KEY_STATISTIC_IDS_DIFFER_FROM_ACTUAL"
            }
            ValidationCode::DataFileIdsDifferFromActual => "DATA_FILE_IDS_DIFFER_FROM_ACTUAL",
            ValidationCode::DataBlockShouldBeUnattached => "DATA_BLOCK_SHOULD_BE_UNATTACHED",
            ValidationCode::DataFileImportsMustBeCompleted => {
                "DATA_FILE_IMPORTS_MUST_BE_COMPLETED"
            }
            ValidationCode::DataFileReplacementsMustBeCompleted => {
                "DATA_FILE_REPLACEMENTS_MUST_BE_COMPLETED"
            }
            ValidationCode::PublicDataGuidanceRequired => "PUBLIC_DATA_GUIDANCE_REQUIRED",
            ValidationCode::ReleaseNoteRequired => "RELEASE_NOTE_REQUIRED",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, StatDeskError>;

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::Query(err)
    }
}

impl From<rusqlite::Error> for StatDeskError {
    fn from(err: rusqlite::Error) -> Self {
        StatDeskError::Database(DatabaseError::from(err))
    }
}

impl From<std::io::Error> for StatDeskError {
    fn from(err: std::io::Error) -> Self {
        StatDeskError::Blob(BlobError::Io(err))
    }
}

impl From<toml::de::Error> for StatDeskError {
    fn from(err: toml::de::Error) -> Self {
        StatDeskError::Config(ConfigError::InvalidFormat(err))
    }
}

impl From<tokio::task::JoinError> for StatDeskError {
    fn from(err: tokio::task::JoinError) -> Self {
        StatDeskError::Internal(err.into())
    }
}
