//! Tests for the inspection REST handlers.
//!
//! Handlers are called directly with extractor values against the mock store;
//! no HTTP server is started. Only status codes and state changes are checked.

mod common;

use api_lib::web::protocol::{ReadingUpdate, RemarksUpdate, SpecificationQuery, VisualCheckUpdate};
use api_lib::web::rest::{
    close_session_handler, completeness_handler, get_session_handler, load_session_handler,
    parse_specification_handler, reset_readings_handler, save_handler, submit_handler,
    update_reading_handler, update_remarks_handler, update_visual_check_handler,
};
use api_lib::web::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use common::{app_state, inspection_id};
use qc_inspection_core::{CheckpointVerdict, ReadingValue, SessionPhase};
use std::sync::Arc;
use uuid::Uuid;

fn status<R: IntoResponse, E: IntoResponse>(result: Result<R, E>) -> StatusCode {
    match result {
        Ok(r) => r.into_response().status(),
        Err(e) => e.into_response().status(),
    }
}

async fn record(
    state: &Arc<AppState>,
    checkpoint: &str,
    sample: u32,
    value: ReadingValue,
) -> StatusCode {
    status(
        update_reading_handler(
            State(state.clone()),
            Path(inspection_id()),
            Json(ReadingUpdate {
                checkpoint_id: checkpoint.to_string(),
                sample_number: sample,
                value: Some(value),
            }),
        )
        .await,
    )
}

async fn verdict(state: &Arc<AppState>, sample: u32, verdict: &str) -> StatusCode {
    status(
        update_visual_check_handler(
            State(state.clone()),
            Path(inspection_id()),
            Json(VisualCheckUpdate {
                checkpoint_id: "finish".to_string(),
                sample_number: sample,
                verdict: verdict.to_string(),
            }),
        )
        .await,
    )
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn load_unknown_inspection_is_404() {
    let state = app_state();
    let unknown = Uuid::new_v4();
    for _ in 0..3 {
        let result = load_session_handler(State(state.clone()), Path(unknown)).await;
        assert_eq!(status(result), StatusCode::NOT_FOUND);
    }
    assert_eq!(state.open_session_count().await, 0);

    let result = get_session_handler(State(state), Path(unknown)).await;
    assert_eq!(status(result), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_settings_come_from_config() {
    let state = app_state();
    let settings = state.session_config();
    assert!(!settings.autosave);
    assert_eq!(settings.autosave_delay, state.config.autosave_delay);
}

#[tokio::test]
async fn session_must_be_opened_first() {
    let state = app_state();
    let result = get_session_handler(State(state.clone()), Path(inspection_id())).await;
    assert_eq!(status(result), StatusCode::NOT_FOUND);
    assert_eq!(
        record(&state, "volt", 1, ReadingValue::Number(3.3)).await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn open_edit_and_close() {
    let state = app_state();
    let result = load_session_handler(State(state.clone()), Path(inspection_id())).await;
    assert_eq!(status(result), StatusCode::OK);
    assert_eq!(state.open_session_count().await, 1);

    assert_eq!(
        record(&state, "volt", 1, ReadingValue::Number(3.35)).await,
        StatusCode::OK
    );
    let controller = state.session(inspection_id()).await.unwrap();
    assert_eq!(controller.phase().await, SessionPhase::Ready);
    assert!(controller.is_dirty().await);

    let result = close_session_handler(State(state.clone()), Path(inspection_id())).await;
    assert_eq!(status(result), StatusCode::NO_CONTENT);
    assert_eq!(state.open_session_count().await, 0);

    let result = close_session_handler(State(state), Path(inspection_id())).await;
    assert_eq!(status(result), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_checkpoint_or_sample_is_422() {
    let state = app_state();
    let _ = load_session_handler(State(state.clone()), Path(inspection_id())).await;

    assert_eq!(
        record(&state, "nope", 1, ReadingValue::Number(1.0)).await,
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        record(&state, "volt", 9, ReadingValue::Number(3.3)).await,
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn bad_visual_verdict_is_400() {
    let state = app_state();
    let _ = load_session_handler(State(state.clone()), Path(inspection_id())).await;
    assert_eq!(verdict(&state, 1, "MAYBE").await, StatusCode::BAD_REQUEST);
    assert_eq!(verdict(&state, 1, "NG").await, StatusCode::OK);

    let controller = state.session(inspection_id()).await.unwrap();
    let session = controller.snapshot().await.unwrap();
    assert_eq!(
        session.checkpoints()["finish"].result(),
        CheckpointVerdict::Rejected
    );
}

#[tokio::test]
async fn reset_and_completeness() {
    let state = app_state();
    let _ = load_session_handler(State(state.clone()), Path(inspection_id())).await;
    record(&state, "volt", 1, ReadingValue::Number(3.3)).await;

    let result = completeness_handler(State(state.clone()), Path(inspection_id())).await;
    assert_eq!(status(result), StatusCode::OK);
    let controller = state.session(inspection_id()).await.unwrap();
    assert_eq!(controller.completeness().await.unwrap().missing_count, 3);

    let result = reset_readings_handler(State(state.clone()), Path(inspection_id())).await;
    assert_eq!(status(result), StatusCode::OK);
    assert_eq!(controller.completeness().await.unwrap().missing_count, 4);
}

// ---------------------------------------------------------------------------
// Save and submit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn save_then_reload_restores_draft() {
    let state = app_state();
    let _ = load_session_handler(State(state.clone()), Path(inspection_id())).await;
    record(&state, "volt", 2, ReadingValue::Text("3.29".to_string())).await;
    let result = update_remarks_handler(
        State(state.clone()),
        Path(inspection_id()),
        Json(RemarksUpdate {
            remarks: "first pass".to_string(),
        }),
    )
    .await;
    assert_eq!(status(result), StatusCode::NO_CONTENT);

    let result = save_handler(State(state.clone()), Path(inspection_id())).await;
    assert_eq!(status(result), StatusCode::OK);

    let _ = close_session_handler(State(state.clone()), Path(inspection_id())).await;
    let result = load_session_handler(State(state.clone()), Path(inspection_id())).await;
    assert_eq!(status(result), StatusCode::OK);

    let controller = state.session(inspection_id()).await.unwrap();
    let session = controller.snapshot().await.unwrap();
    assert_eq!(session.remarks(), "first pass");
    assert_eq!(
        session.checkpoints()["volt"].sample(2).unwrap().value,
        Some(ReadingValue::Text("3.29".to_string()))
    );
}

#[tokio::test]
async fn submit_is_gated_then_terminal() {
    let state = app_state();
    let _ = load_session_handler(State(state.clone()), Path(inspection_id())).await;

    let result = submit_handler(State(state.clone()), Path(inspection_id())).await;
    assert_eq!(status(result), StatusCode::UNPROCESSABLE_ENTITY);

    for n in 1..=2 {
        record(&state, "volt", n, ReadingValue::Number(3.3)).await;
        verdict(&state, n, "OK").await;
    }
    let result = submit_handler(State(state.clone()), Path(inspection_id())).await;
    assert_eq!(status(result), StatusCode::OK);

    assert_eq!(
        record(&state, "volt", 1, ReadingValue::Number(3.3)).await,
        StatusCode::UNPROCESSABLE_ENTITY
    );
    let result = submit_handler(State(state.clone()), Path(inspection_id())).await;
    assert_eq!(status(result), StatusCode::CONFLICT);
    let result = save_handler(State(state), Path(inspection_id())).await;
    assert_eq!(status(result), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Specification parsing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn parses_specification_text() {
    let Json(parsed) = parse_specification_handler(Query(SpecificationQuery {
        text: "3.3V +/-0.1".to_string(),
    }))
    .await;
    assert_eq!(parsed.tolerance_plus, 0.1);
    assert_eq!(parsed.specification.unwrap().unit.as_deref(), Some("V"));

    let Json(parsed) = parse_specification_handler(Query(SpecificationQuery {
        text: "No visible scratches".to_string(),
    }))
    .await;
    assert_eq!(parsed.tolerance_plus, 0.0);
    assert!(parsed.specification.is_none());
}
