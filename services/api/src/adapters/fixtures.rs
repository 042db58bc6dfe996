//! services/api/src/adapters/fixtures.rs
//!
//! Loads the JSON data files the service starts from: the form registry and,
//! for the mock data source, the seeded inspections.

use crate::adapters::mock::MockInspectionRepository;
use crate::error::ApiError;
use qc_inspection_core::{FormLookup, FormRegistry};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub async fn load_form_registry(path: &Path) -> Result<FormRegistry, ApiError> {
    let json = tokio::fs::read_to_string(path).await?;
    let registry = FormRegistry::from_json(&json)
        .map_err(|e| ApiError::DataFile(format!("{}: {}", path.display(), e)))?;
    info!("Loaded {} inspection forms from {}", registry.len(), path.display());
    Ok(registry)
}

pub async fn load_mock_repository(
    path: &Path,
    forms: Arc<dyn FormLookup>,
    latency: Duration,
) -> Result<MockInspectionRepository, ApiError> {
    let json = tokio::fs::read_to_string(path).await?;
    let repository = MockInspectionRepository::from_json(&json, forms, latency)
        .map_err(|e| ApiError::DataFile(format!("{}: {}", path.display(), e)))?;
    info!(
        "Seeded mock store with {} inspections from {}",
        repository.inspection_ids().await.len(),
        path.display()
    );
    Ok(repository)
}
