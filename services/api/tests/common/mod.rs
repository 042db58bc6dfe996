//! Shared fixtures for the API integration tests.

#![allow(dead_code)]

use api_lib::adapters::MockInspectionRepository;
use api_lib::config::Config;
use api_lib::web::{router, AppState};
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use qc_inspection_core::FormRegistry;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

pub const FORMS: &str = r#"[
    {
        "part_code": "PSU-33",
        "checkpoints": [
            {
                "id": "volt",
                "name": "Output Voltage",
                "specification": "3.3V +/-0.1",
                "checking_type": "functional",
                "unit": "V"
            },
            {
                "id": "finish",
                "name": "Surface Finish",
                "specification": "No scratches",
                "checking_type": "visual"
            }
        ]
    }
]"#;

pub const INSPECTION_ID: &str = "3f2a8c1e-5b7d-4e90-8a1c-2d3e4f5a6b7c";

pub fn fixtures() -> String {
    format!(
        r#"[{{
            "id": "{INSPECTION_ID}",
            "batch_info": {{
                "batch_number": "PSU-2024-0417",
                "part_code": "PSU-33",
                "lot_size": 500,
                "sample_size": 2
            }}
        }}]"#
    )
}

pub fn inspection_id() -> Uuid {
    Uuid::parse_str(INSPECTION_ID).unwrap()
}

/// State over the inline fixtures with autosave off.
pub fn app_state() -> Arc<AppState> {
    state_from(FORMS, &fixtures())
}

/// State over the data files shipped with the service.
pub fn bundled_state() -> Arc<AppState> {
    state_from(
        include_str!("../../data/forms.json"),
        include_str!("../../data/inspections.json"),
    )
}

fn state_from(forms: &str, inspections: &str) -> Arc<AppState> {
    let forms = Arc::new(FormRegistry::from_json(forms).unwrap());
    let repository =
        MockInspectionRepository::from_json(inspections, forms, Duration::ZERO).unwrap();
    let config = Config::from_lookup(|key| (key == "AUTOSAVE_ENABLED").then(|| "false".to_string()))
        .unwrap();
    Arc::new(AppState::new(Arc::new(repository), Arc::new(config)))
}

pub fn build_test_app(state: Arc<AppState>) -> Router {
    router(state)
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
