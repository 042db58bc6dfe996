//! crates/qc_inspection_core/src/ports.rs
//!
//! Defines the service contracts (traits) the inspection core depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of whether inspections come from fixtures or a database.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    DraftReadings, InspectionForm, InspectionSubmission, LoadedInspection, SubmissionAck,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, files).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait InspectionRepository: Send + Sync {
    /// Loads batch info, the inspection form and any saved draft.
    async fn get_inspection_by_id(&self, inspection_id: Uuid) -> PortResult<LoadedInspection>;

    /// Upserts the current draft. Calling it twice with the same draft is harmless.
    async fn save_draft_readings(
        &self,
        inspection_id: Uuid,
        draft: &DraftReadings,
    ) -> PortResult<()>;

    /// Stores the final record.
    async fn submit_inspection(
        &self,
        inspection_id: Uuid,
        submission: &InspectionSubmission,
    ) -> PortResult<SubmissionAck>;
}

/// Looks up inspection forms by part code. A miss is `None`, never an error.
pub trait FormLookup: Send + Sync {
    fn form_for_part(&self, part_code: &str) -> Option<InspectionForm>;
}
