//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `InspectionRepository` port from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.
//!
//! Drafts and submissions are stored as JSONB and upserted, so repeating a
//! save or submit is harmless.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use qc_inspection_core::{
    BatchInfo, CheckpointResultMap, DraftReadings, FormLookup, InspectionRepository,
    InspectionSubmission, LoadedInspection, PortError, PortResult, SavedReadings, SubmissionAck,
};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `InspectionRepository` port.
#[derive(Clone)]
pub struct PgInspectionRepository {
    pool: PgPool,
    forms: Arc<dyn FormLookup>,
}

impl PgInspectionRepository {
    /// Creates a new `PgInspectionRepository`.
    pub fn new(pool: PgPool, forms: Arc<dyn FormLookup>) -> Self {
        Self { pool, forms }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn ensure_exists(&self, inspection_id: Uuid) -> PortResult<()> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM inspections WHERE id = $1)")
                .bind(inspection_id)
                .fetch_one(&self.pool)
                .await
                .map_err(unexpected)?;
        if exists {
            Ok(())
        } else {
            Err(not_found(inspection_id))
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found(inspection_id: Uuid) -> PortError {
    PortError::NotFound(format!("Inspection {} not found", inspection_id))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct InspectionRecord {
    batch_number: String,
    part_code: String,
    part_name: Option<String>,
    supplier: Option<String>,
    lot_size: i32,
    sample_size: i32,
    inspection_date: Option<NaiveDate>,
}
impl InspectionRecord {
    fn to_domain(self) -> BatchInfo {
        BatchInfo {
            batch_number: self.batch_number,
            part_code: self.part_code,
            part_name: self.part_name,
            supplier: self.supplier,
            lot_size: self.lot_size.max(0) as u32,
            sample_size: self.sample_size.max(0) as u32,
            inspection_date: self.inspection_date,
        }
    }
}

#[derive(FromRow)]
struct DraftRecord {
    checkpoints: Json<CheckpointResultMap>,
    remarks: String,
    last_saved: DateTime<Utc>,
}
impl DraftRecord {
    fn to_domain(self) -> SavedReadings {
        SavedReadings {
            checkpoints: self.checkpoints.0,
            remarks: self.remarks,
            last_saved: Some(self.last_saved),
        }
    }
}

//=========================================================================================
// `InspectionRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl InspectionRepository for PgInspectionRepository {
    async fn get_inspection_by_id(&self, inspection_id: Uuid) -> PortResult<LoadedInspection> {
        let batch_info = sqlx::query_as::<_, InspectionRecord>(
            "SELECT batch_number, part_code, part_name, supplier, lot_size, sample_size, inspection_date \
             FROM inspections WHERE id = $1",
        )
        .bind(inspection_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| not_found(inspection_id))?
        .to_domain();

        let saved_readings = sqlx::query_as::<_, DraftRecord>(
            "SELECT checkpoints, remarks, last_saved FROM inspection_drafts WHERE inspection_id = $1",
        )
        .bind(inspection_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(DraftRecord::to_domain);

        Ok(LoadedInspection {
            inspection_form: self.forms.form_for_part(&batch_info.part_code),
            batch_info,
            saved_readings,
        })
    }

    async fn save_draft_readings(
        &self,
        inspection_id: Uuid,
        draft: &DraftReadings,
    ) -> PortResult<()> {
        self.ensure_exists(inspection_id).await?;
        sqlx::query(
            "INSERT INTO inspection_drafts (inspection_id, checkpoints, remarks, last_saved) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (inspection_id) DO UPDATE \
             SET checkpoints = EXCLUDED.checkpoints, remarks = EXCLUDED.remarks, last_saved = EXCLUDED.last_saved",
        )
        .bind(inspection_id)
        .bind(Json(&draft.checkpoints))
        .bind(&draft.remarks)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn submit_inspection(
        &self,
        inspection_id: Uuid,
        submission: &InspectionSubmission,
    ) -> PortResult<SubmissionAck> {
        self.ensure_exists(inspection_id).await?;
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO inspection_submissions (id, inspection_id, payload, submitted_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (inspection_id) DO UPDATE \
             SET payload = EXCLUDED.payload, submitted_at = EXCLUDED.submitted_at \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(inspection_id)
        .bind(Json(submission))
        .bind(submission.submitted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(SubmissionAck { id: Some(id) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_sizes_are_clamped() {
        let record = InspectionRecord {
            batch_number: "B-1".to_string(),
            part_code: "P".to_string(),
            part_name: None,
            supplier: None,
            lot_size: -5,
            sample_size: 3,
            inspection_date: None,
        };
        let batch = record.to_domain();
        assert_eq!(batch.lot_size, 0);
        assert_eq!(batch.sample_size, 3);
    }
}
