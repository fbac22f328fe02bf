//! Domain services
//!
//! Each service wraps the stores and whichever collaborators its side
//! effects need. Expected failures come back as typed errors: not-found
//! for unresolvable ids (including wrong-parent and wrong-variant
//! lookups), validation failures with named codes for business rules.

pub mod amendment;
pub mod approval;
pub mod checklist;
pub mod content;
pub mod data_blocks;
pub mod images;
pub mod key_stats;
pub mod ordering;
pub mod releases;
pub mod release_files;

pub use amendment::AmendmentService;
pub use approval::{ReleaseApprovalService, StatusSubmission};
pub use checklist::ChecklistService;
pub use content::ContentService;
pub use data_blocks::{DataBlockInput, DataBlockService};
pub use images::ImageService;
pub use key_stats::{
    DataBlockKeyStatInput, KeyStatGuidanceUpdate, KeyStatService, TextKeyStatInput,
};
pub use release_files::{DataFileUpload, ReleaseFileService};
pub use releases::{ReleaseInput, ReleaseService};
