//! services/api/src/web/protocol.rs
//!
//! Defines the JSON request and response bodies exchanged between the inspection
//! UI and the API server.

use chrono::{DateTime, Utc};
use qc_inspection_core::{
    CheckpointVerdict, CompletenessReport, InspectionSession, InspectionStats, ReadingStatus,
    ReadingValue, SessionPhase, Specification,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Requests Sent FROM the Client TO the Server
//=========================================================================================

/// Records one measured or visual value. A `null` or blank value clears the slot.
#[derive(Deserialize, Debug, ToSchema)]
pub struct ReadingUpdate {
    pub checkpoint_id: String,
    pub sample_number: u32,
    /// A number, a numeric string, or `"OK"`/`"NG"`.
    #[schema(value_type = Option<Object>)]
    pub value: Option<ReadingValue>,
}

/// Records an OK/NG verdict for a visual checkpoint.
#[derive(Deserialize, Debug, ToSchema)]
pub struct VisualCheckUpdate {
    pub checkpoint_id: String,
    pub sample_number: u32,
    /// `"OK"` or `"NG"`.
    pub verdict: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RemarksUpdate {
    pub remarks: String,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SpecificationQuery {
    /// Free-text specification, e.g. `250mm +/-0.5`.
    pub text: String,
}

//=========================================================================================
// Responses Sent FROM the Server TO the Client
//=========================================================================================

/// The full state of an open inspection session.
#[derive(Serialize, Debug, ToSchema)]
pub struct SessionView {
    pub inspection_id: Uuid,
    #[schema(value_type = String)]
    pub phase: SessionPhase,
    pub dirty: bool,
    pub load_error: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub session: Option<InspectionSession>,
    #[schema(value_type = Option<Object>)]
    pub stats: Option<InspectionStats>,
    #[schema(value_type = Option<Object>)]
    pub completeness: Option<CompletenessReport>,
}

/// The outcome of recording a reading.
#[derive(Serialize, Debug, ToSchema)]
pub struct ReadingUpdateResponse {
    pub checkpoint_id: String,
    pub sample_number: u32,
    #[schema(value_type = Option<String>)]
    pub status: Option<ReadingStatus>,
    #[schema(value_type = String)]
    pub checkpoint_result: CheckpointVerdict,
    #[schema(value_type = Object)]
    pub stats: InspectionStats,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SaveResponse {
    pub success: bool,
    pub last_saved: DateTime<Utc>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SubmitResponse {
    pub success: bool,
    pub submission_id: Option<Uuid>,
    #[schema(value_type = Object)]
    pub stats: InspectionStats,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SpecificationResponse {
    pub tolerance_plus: f64,
    pub tolerance_minus: f64,
    /// `null` when the text has no leading nominal or no tolerance marker.
    #[schema(value_type = Option<Object>)]
    pub specification: Option<Specification>,
}
