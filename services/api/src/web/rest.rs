//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::session_error_status;
use crate::web::protocol::{
    ReadingUpdate, ReadingUpdateResponse, RemarksUpdate, SaveResponse, SessionView,
    SpecificationQuery, SpecificationResponse, SubmitResponse, VisualCheckUpdate,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use qc_inspection_core::{
    parse_specification, parse_tolerance, InspectionController, PortError, SessionError,
    VisualVerdict,
};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        load_session_handler,
        get_session_handler,
        close_session_handler,
        update_reading_handler,
        update_visual_check_handler,
        update_remarks_handler,
        reset_readings_handler,
        save_handler,
        submit_handler,
        completeness_handler,
        parse_specification_handler,
    ),
    components(
        schemas(
            ReadingUpdate,
            VisualCheckUpdate,
            RemarksUpdate,
            SessionView,
            ReadingUpdateResponse,
            SaveResponse,
            SubmitResponse,
            SpecificationResponse,
        )
    ),
    tags(
        (name = "QC Inspection API", description = "Inspection data capture, checkpoint evaluation and submission.")
    )
)]
pub struct ApiDoc;

type HandlerError = (StatusCode, String);

//=========================================================================================
// Helpers
//=========================================================================================

async fn open_controller(
    app_state: &AppState,
    inspection_id: Uuid,
) -> Result<InspectionController, HandlerError> {
    app_state.session(inspection_id).await.ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("No open session for inspection {}", inspection_id),
        )
    })
}

fn session_failure(inspection_id: Uuid, action: &str, e: SessionError) -> HandlerError {
    let status = session_error_status(&e);
    if status.is_server_error() {
        error!("Failed to {} inspection {}: {}", action, inspection_id, e);
    } else {
        warn!("Could not {} inspection {}: {}", action, inspection_id, e);
    }
    (status, e.to_string())
}

async fn session_view(inspection_id: Uuid, controller: &InspectionController) -> SessionView {
    let session = controller.snapshot().await;
    SessionView {
        inspection_id,
        phase: controller.phase().await,
        dirty: session.as_ref().is_some_and(|s| s.is_dirty()),
        load_error: controller.load_error().await,
        stats: session.as_ref().map(|s| s.stats()),
        completeness: session.as_ref().map(|s| s.completeness()),
        session,
    }
}

//=========================================================================================
// Session Lifecycle Handlers
//=========================================================================================

/// Open (or reload) an inspection session.
///
/// Hydrates the saved draft if there is one, otherwise starts from empty readings.
#[utoipa::path(
    post,
    path = "/inspections/{id}/session",
    responses(
        (status = 200, description = "Session loaded", body = SessionView),
        (status = 404, description = "Inspection not found"),
        (status = 422, description = "No inspection form for the part code"),
        (status = 502, description = "Inspection store failed")
    ),
    params(("id" = Uuid, Path, description = "The inspection ID."))
)]
pub async fn load_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(inspection_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let controller = app_state.open_session(inspection_id).await;
    if let Err(e) = controller.load(inspection_id).await {
        // A missing form keeps the session open so its load error stays visible.
        if matches!(e, SessionError::Port(PortError::NotFound(_))) {
            app_state.discard_session(inspection_id, &controller).await;
        }
        return Err(session_failure(inspection_id, "load", e));
    }
    Ok(Json(session_view(inspection_id, &controller).await))
}

/// Get the current state of an open session, including stats and completeness.
#[utoipa::path(
    get,
    path = "/inspections/{id}/session",
    responses(
        (status = 200, description = "Session state", body = SessionView),
        (status = 404, description = "No open session")
    ),
    params(("id" = Uuid, Path, description = "The inspection ID."))
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(inspection_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let controller = open_controller(&app_state, inspection_id).await?;
    Ok(Json(session_view(inspection_id, &controller).await))
}

/// Close a session. Unsaved edits are dropped; pending autosaves are cancelled.
#[utoipa::path(
    delete,
    path = "/inspections/{id}/session",
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "No open session")
    ),
    params(("id" = Uuid, Path, description = "The inspection ID."))
)]
pub async fn close_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(inspection_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    if app_state.close_session(inspection_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            format!("No open session for inspection {}", inspection_id),
        ))
    }
}

//=========================================================================================
// Edit Handlers
//=========================================================================================

async fn apply_reading(
    inspection_id: Uuid,
    controller: &InspectionController,
    checkpoint_id: String,
    sample_number: u32,
    verdict: Option<qc_inspection_core::CheckpointVerdict>,
) -> Result<ReadingUpdateResponse, HandlerError> {
    let Some(checkpoint_result) = verdict else {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!(
                "Reading for checkpoint {} sample {} was not recorded (unknown target, no session, or already submitted)",
                checkpoint_id, sample_number
            ),
        ));
    };
    let session = controller.snapshot().await.ok_or_else(|| {
        (
            StatusCode::CONFLICT,
            format!("Session for inspection {} was closed", inspection_id),
        )
    })?;
    let status = session
        .checkpoints()
        .get(&checkpoint_id)
        .and_then(|c| c.sample(sample_number))
        .and_then(|s| s.status);
    Ok(ReadingUpdateResponse {
        checkpoint_id,
        sample_number,
        status,
        checkpoint_result,
        stats: session.stats(),
    })
}

/// Record a reading for one checkpoint sample.
#[utoipa::path(
    put,
    path = "/inspections/{id}/readings",
    request_body = ReadingUpdate,
    responses(
        (status = 200, description = "Reading recorded", body = ReadingUpdateResponse),
        (status = 404, description = "No open session"),
        (status = 422, description = "Unknown checkpoint or sample, or session read-only")
    ),
    params(("id" = Uuid, Path, description = "The inspection ID."))
)]
pub async fn update_reading_handler(
    State(app_state): State<Arc<AppState>>,
    Path(inspection_id): Path<Uuid>,
    Json(update): Json<ReadingUpdate>,
) -> Result<impl IntoResponse, HandlerError> {
    let controller = open_controller(&app_state, inspection_id).await?;
    let verdict = controller
        .update_reading(&update.checkpoint_id, update.sample_number, update.value)
        .await;
    let response = apply_reading(
        inspection_id,
        &controller,
        update.checkpoint_id,
        update.sample_number,
        verdict,
    )
    .await?;
    Ok(Json(response))
}

/// Record an OK/NG verdict for a visual checkpoint sample.
#[utoipa::path(
    put,
    path = "/inspections/{id}/visual-checks",
    request_body = VisualCheckUpdate,
    responses(
        (status = 200, description = "Verdict recorded", body = ReadingUpdateResponse),
        (status = 400, description = "Verdict is not OK or NG"),
        (status = 404, description = "No open session"),
        (status = 422, description = "Unknown checkpoint or sample, or session read-only")
    ),
    params(("id" = Uuid, Path, description = "The inspection ID."))
)]
pub async fn update_visual_check_handler(
    State(app_state): State<Arc<AppState>>,
    Path(inspection_id): Path<Uuid>,
    Json(update): Json<VisualCheckUpdate>,
) -> Result<impl IntoResponse, HandlerError> {
    let verdict: VisualVerdict = update.verdict.parse().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("Verdict must be OK or NG, got '{}'", update.verdict),
        )
    })?;
    let controller = open_controller(&app_state, inspection_id).await?;
    let result = controller
        .update_visual_check(&update.checkpoint_id, update.sample_number, verdict)
        .await;
    let response = apply_reading(
        inspection_id,
        &controller,
        update.checkpoint_id,
        update.sample_number,
        result,
    )
    .await?;
    Ok(Json(response))
}

/// Replace the inspection remarks.
#[utoipa::path(
    put,
    path = "/inspections/{id}/remarks",
    request_body = RemarksUpdate,
    responses(
        (status = 204, description = "Remarks updated"),
        (status = 404, description = "No open session"),
        (status = 409, description = "Session is not editable")
    ),
    params(("id" = Uuid, Path, description = "The inspection ID."))
)]
pub async fn update_remarks_handler(
    State(app_state): State<Arc<AppState>>,
    Path(inspection_id): Path<Uuid>,
    Json(update): Json<RemarksUpdate>,
) -> Result<impl IntoResponse, HandlerError> {
    let controller = open_controller(&app_state, inspection_id).await?;
    if controller.update_remarks(update.remarks).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::CONFLICT,
            format!("Inspection {} is not editable", inspection_id),
        ))
    }
}

/// Clear every reading of the inspection back to empty.
#[utoipa::path(
    post,
    path = "/inspections/{id}/reset",
    responses(
        (status = 200, description = "Readings cleared", body = SessionView),
        (status = 404, description = "No open session"),
        (status = 409, description = "Session is not editable")
    ),
    params(("id" = Uuid, Path, description = "The inspection ID."))
)]
pub async fn reset_readings_handler(
    State(app_state): State<Arc<AppState>>,
    Path(inspection_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let controller = open_controller(&app_state, inspection_id).await?;
    if !controller.reset_readings().await {
        return Err((
            StatusCode::CONFLICT,
            format!("Inspection {} is not editable", inspection_id),
        ));
    }
    Ok(Json(session_view(inspection_id, &controller).await))
}

//=========================================================================================
// Persistence Handlers
//=========================================================================================

/// Save the current readings and remarks as a draft.
#[utoipa::path(
    post,
    path = "/inspections/{id}/save",
    responses(
        (status = 200, description = "Draft saved", body = SaveResponse),
        (status = 404, description = "No open session"),
        (status = 409, description = "Already submitted or superseded"),
        (status = 502, description = "Inspection store failed; edits are kept")
    ),
    params(("id" = Uuid, Path, description = "The inspection ID."))
)]
pub async fn save_handler(
    State(app_state): State<Arc<AppState>>,
    Path(inspection_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let controller = open_controller(&app_state, inspection_id).await?;
    let last_saved = controller
        .save_progress()
        .await
        .map_err(|e| session_failure(inspection_id, "save", e))?;
    Ok(Json(SaveResponse {
        success: true,
        last_saved,
    }))
}

/// Submit the inspection. Every reading must be filled in.
#[utoipa::path(
    post,
    path = "/inspections/{id}/submit",
    responses(
        (status = 200, description = "Inspection submitted", body = SubmitResponse),
        (status = 404, description = "No open session"),
        (status = 409, description = "Already submitted"),
        (status = 422, description = "Readings are missing"),
        (status = 502, description = "Inspection store failed; edits are kept")
    ),
    params(("id" = Uuid, Path, description = "The inspection ID."))
)]
pub async fn submit_handler(
    State(app_state): State<Arc<AppState>>,
    Path(inspection_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let controller = open_controller(&app_state, inspection_id).await?;
    let ack = controller
        .submit()
        .await
        .map_err(|e| session_failure(inspection_id, "submit", e))?;
    let stats = controller.stats().await.ok_or_else(|| {
        (
            StatusCode::CONFLICT,
            format!("Session for inspection {} was closed", inspection_id),
        )
    })?;
    Ok(Json(SubmitResponse {
        success: true,
        submission_id: ack.id,
        stats,
    }))
}

//=========================================================================================
// Read-only Handlers
//=========================================================================================

/// List every empty checkpoint/sample slot in checkpoint then sample order.
#[utoipa::path(
    get,
    path = "/inspections/{id}/completeness",
    responses(
        (status = 200, description = "Completeness report"),
        (status = 404, description = "No open or loaded session")
    ),
    params(("id" = Uuid, Path, description = "The inspection ID."))
)]
pub async fn completeness_handler(
    State(app_state): State<Arc<AppState>>,
    Path(inspection_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let controller = open_controller(&app_state, inspection_id).await?;
    let report = controller.completeness().await.ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("Inspection {} is not loaded", inspection_id),
        )
    })?;
    Ok(Json(report))
}

/// Parse a free-text specification into nominal, unit and tolerance.
#[utoipa::path(
    get,
    path = "/specifications/parse",
    params(SpecificationQuery),
    responses(
        (status = 200, description = "Parsed specification", body = SpecificationResponse)
    )
)]
pub async fn parse_specification_handler(
    Query(query): Query<SpecificationQuery>,
) -> Json<SpecificationResponse> {
    let tolerance = parse_tolerance(&query.text);
    Json(SpecificationResponse {
        tolerance_plus: tolerance.plus,
        tolerance_minus: tolerance.minus,
        specification: parse_specification(&query.text),
    })
}
