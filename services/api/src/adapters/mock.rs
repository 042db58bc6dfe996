//! services/api/src/adapters/mock.rs
//!
//! An in-memory implementation of the `InspectionRepository` port, seeded from a
//! JSON fixture file. Used for local development and demos in place of Postgres.

use async_trait::async_trait;
use chrono::Utc;
use qc_inspection_core::{
    BatchInfo, DraftReadings, FormLookup, InspectionRepository, InspectionSubmission,
    LoadedInspection, PortError, PortResult, SavedReadings, SubmissionAck,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// Fixture Format
//=========================================================================================

/// One inspection as written in the fixture file.
#[derive(Debug, Deserialize)]
pub struct InspectionFixture {
    pub id: Uuid,
    pub batch_info: BatchInfo,
    #[serde(default)]
    pub saved_readings: Option<SavedReadings>,
}

struct MockRecord {
    batch_info: BatchInfo,
    draft: Option<SavedReadings>,
    submission: Option<(Uuid, InspectionSubmission)>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A fixture-backed repository. Every call waits `latency` first to mimic a
/// remote API.
pub struct MockInspectionRepository {
    forms: Arc<dyn FormLookup>,
    records: RwLock<HashMap<Uuid, MockRecord>>,
    latency: Duration,
}

impl MockInspectionRepository {
    /// Creates a new `MockInspectionRepository`.
    pub fn new(
        fixtures: Vec<InspectionFixture>,
        forms: Arc<dyn FormLookup>,
        latency: Duration,
    ) -> Self {
        let records = fixtures
            .into_iter()
            .map(|f| {
                let record = MockRecord {
                    batch_info: f.batch_info,
                    draft: f.saved_readings,
                    submission: None,
                };
                (f.id, record)
            })
            .collect();
        Self {
            forms,
            records: RwLock::new(records),
            latency,
        }
    }

    /// Parses a JSON array of [`InspectionFixture`]s.
    pub fn from_json(
        json: &str,
        forms: Arc<dyn FormLookup>,
        latency: Duration,
    ) -> Result<Self, serde_json::Error> {
        let fixtures: Vec<InspectionFixture> = serde_json::from_str(json)?;
        Ok(Self::new(fixtures, forms, latency))
    }

    pub async fn inspection_ids(&self) -> Vec<Uuid> {
        self.records.read().await.keys().copied().collect()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn not_found(inspection_id: Uuid) -> PortError {
    PortError::NotFound(format!("Inspection {} not found", inspection_id))
}

//=========================================================================================
// `InspectionRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl InspectionRepository for MockInspectionRepository {
    async fn get_inspection_by_id(&self, inspection_id: Uuid) -> PortResult<LoadedInspection> {
        self.simulate_latency().await;
        let records = self.records.read().await;
        let record = records
            .get(&inspection_id)
            .ok_or_else(|| not_found(inspection_id))?;

        Ok(LoadedInspection {
            inspection_form: self.forms.form_for_part(&record.batch_info.part_code),
            batch_info: record.batch_info.clone(),
            saved_readings: record.draft.clone(),
        })
    }

    async fn save_draft_readings(
        &self,
        inspection_id: Uuid,
        draft: &DraftReadings,
    ) -> PortResult<()> {
        self.simulate_latency().await;
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&inspection_id)
            .ok_or_else(|| not_found(inspection_id))?;

        record.draft = Some(SavedReadings {
            checkpoints: draft.checkpoints.clone(),
            remarks: draft.remarks.clone(),
            last_saved: Some(Utc::now()),
        });
        debug!("Mock store saved draft for inspection {}", inspection_id);
        Ok(())
    }

    async fn submit_inspection(
        &self,
        inspection_id: Uuid,
        submission: &InspectionSubmission,
    ) -> PortResult<SubmissionAck> {
        self.simulate_latency().await;
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&inspection_id)
            .ok_or_else(|| not_found(inspection_id))?;

        // Resubmitting overwrites the record but keeps its id.
        let id = record
            .submission
            .as_ref()
            .map(|(id, _)| *id)
            .unwrap_or_else(Uuid::new_v4);
        record.submission = Some((id, submission.clone()));
        debug!("Mock store recorded submission {} for inspection {}", id, inspection_id);
        Ok(SubmissionAck { id: Some(id) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_inspection_core::{
        CheckpointResultMap, FormRegistry, InspectionController, SessionConfig, SessionPhase,
        VisualVerdict,
    };

    const FORMS: &str = r#"[
        {
            "part_code": "HSG-01",
            "checkpoints": [
                { "id": "finish", "name": "Surface Finish", "checking_type": "visual" }
            ]
        }
    ]"#;

    const FIXTURES: &str = r#"[
        {
            "id": "6f1c9a52-3d1e-4c6b-9a57-1b2f0c3d4e5f",
            "batch_info": {
                "batch_number": "B-2024-001",
                "part_code": "HSG-01",
                "lot_size": 100,
                "sample_size": 2
            }
        },
        {
            "id": "0b7e2d4a-8c1f-4e3a-b5d6-7f8091a2b3c4",
            "batch_info": {
                "batch_number": "B-2024-002",
                "part_code": "UNKNOWN",
                "lot_size": 50,
                "sample_size": 1
            }
        }
    ]"#;

    fn repository() -> MockInspectionRepository {
        let forms = Arc::new(FormRegistry::from_json(FORMS).unwrap());
        MockInspectionRepository::from_json(FIXTURES, forms, Duration::ZERO).unwrap()
    }

    fn known_id() -> Uuid {
        Uuid::parse_str("6f1c9a52-3d1e-4c6b-9a57-1b2f0c3d4e5f").unwrap()
    }

    #[tokio::test]
    async fn loads_fixture_with_form() {
        let repo = repository();
        let loaded = repo.get_inspection_by_id(known_id()).await.unwrap();
        assert_eq!(loaded.batch_info.batch_number, "B-2024-001");
        assert_eq!(loaded.inspection_form.unwrap().checkpoints.len(), 1);
        assert!(loaded.saved_readings.is_none());
        assert_eq!(repo.inspection_ids().await.len(), 2);
    }

    #[tokio::test]
    async fn unknown_part_code_has_no_form() {
        let repo = repository();
        let id = Uuid::parse_str("0b7e2d4a-8c1f-4e3a-b5d6-7f8091a2b3c4").unwrap();
        let loaded = repo.get_inspection_by_id(id).await.unwrap();
        assert!(loaded.inspection_form.is_none());
    }

    #[tokio::test]
    async fn unknown_inspection_is_not_found() {
        let repo = repository();
        let err = repo.get_inspection_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        let draft = DraftReadings {
            checkpoints: CheckpointResultMap::new(),
            remarks: String::new(),
        };
        assert!(repo.save_draft_readings(Uuid::new_v4(), &draft).await.is_err());
    }

    #[tokio::test]
    async fn saved_draft_is_returned_on_next_load() {
        let repo = Arc::new(repository());
        let controller = InspectionController::new(repo.clone(), SessionConfig::default());
        controller.load(known_id()).await.unwrap();
        controller
            .update_visual_check("finish", 1, VisualVerdict::Ng)
            .await;
        controller.update_remarks("dent on sample 1").await;
        controller.save_progress().await.unwrap();

        let reopened = InspectionController::new(repo, SessionConfig::default());
        reopened.load(known_id()).await.unwrap();
        let session = reopened.snapshot().await.unwrap();
        assert_eq!(session.remarks(), "dent on sample 1");
        assert_eq!(reopened.stats().await.unwrap().failed, 1);
        assert!(session.last_saved().is_some());
    }

    #[tokio::test]
    async fn resubmission_keeps_the_same_id() {
        let repo = Arc::new(repository());
        let controller = InspectionController::new(repo.clone(), SessionConfig::default());
        controller.load(known_id()).await.unwrap();
        for n in 1..=2 {
            controller
                .update_visual_check("finish", n, VisualVerdict::Ok)
                .await;
        }
        let first = controller.submit().await.unwrap();
        assert_eq!(controller.phase().await, SessionPhase::Submitted);

        let reopened = InspectionController::new(repo, SessionConfig::default());
        reopened.load(known_id()).await.unwrap();
        for n in 1..=2 {
            reopened
                .update_visual_check("finish", n, VisualVerdict::Ok)
                .await;
        }
        let second = reopened.submit().await.unwrap();
        assert_eq!(first.id, second.id);
    }
}
