//! crates/qc_inspection_core/src/session.rs
//!
//! The inspection session: the aggregate root that owns one inspection's
//! readings, remarks and save/submit bookkeeping. It is synchronous; the
//! controller drives it and talks to the repository.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::completeness::{check_readings_complete, CompletenessReport};
use crate::domain::{
    BatchInfo, CheckpointResult, CheckpointResultMap, CheckpointVerdict, DraftReadings,
    InspectionForm, InspectionStats, InspectionSubmission, LoadedInspection, ReadingValue,
    SampleReading, VisualVerdict,
};
use crate::error::{SessionError, SessionResult};
use crate::ports::PortError;
use crate::stats::compute_stats;
use crate::validator::validate_reading;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Unloaded,
    Loading,
    Ready,
    Saving,
    Submitting,
    Submitted,
}

/// A draft captured for saving, tagged with the edit revision it reflects.
#[derive(Debug, Clone)]
pub struct PendingSave {
    pub draft: DraftReadings,
    pub revision: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectionSession {
    inspection_id: Uuid,
    batch_info: BatchInfo,
    form: InspectionForm,
    checkpoints: CheckpointResultMap,
    remarks: String,
    dirty: bool,
    saves_in_flight: u32,
    submitting: bool,
    submitted: bool,
    last_saved: Option<DateTime<Utc>>,
    last_error: Option<String>,
    #[serde(skip)]
    revision: u64,
}

impl InspectionSession {
    /// Builds a session from a loaded inspection, hydrating a saved draft if
    /// there is one and blank slots otherwise.
    pub fn from_loaded(inspection_id: Uuid, loaded: LoadedInspection) -> SessionResult<Self> {
        let LoadedInspection {
            batch_info,
            inspection_form,
            saved_readings,
        } = loaded;
        let form = inspection_form.ok_or_else(|| SessionError::NoForm(batch_info.part_code.clone()))?;

        let sample_size = batch_info.sample_size;
        let checkpoints = form
            .checkpoints
            .iter()
            .map(|definition| {
                let saved = saved_readings
                    .as_ref()
                    .and_then(|s| s.checkpoints.get(&definition.id));
                (
                    definition.id.clone(),
                    CheckpointResult::hydrate(definition, saved, sample_size),
                )
            })
            .collect();

        let (remarks, last_saved) = saved_readings
            .map(|s| (s.remarks, s.last_saved))
            .unwrap_or_default();

        Ok(Self {
            inspection_id,
            batch_info,
            form,
            checkpoints,
            remarks,
            dirty: false,
            saves_in_flight: 0,
            submitting: false,
            submitted: false,
            last_saved,
            last_error: None,
            revision: 0,
        })
    }

    pub fn inspection_id(&self) -> Uuid {
        self.inspection_id
    }

    pub fn batch_info(&self) -> &BatchInfo {
        &self.batch_info
    }

    pub fn form(&self) -> &InspectionForm {
        &self.form
    }

    pub fn checkpoints(&self) -> &CheckpointResultMap {
        &self.checkpoints
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.submitted {
            SessionPhase::Submitted
        } else if self.submitting {
            SessionPhase::Submitting
        } else if self.saves_in_flight > 0 {
            SessionPhase::Saving
        } else {
            SessionPhase::Ready
        }
    }

    /// Closed to edits once submitted and while a submit is in flight.
    fn is_editable(&self) -> bool {
        !self.submitted && !self.submitting
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    //=====================================================================================
    // Edits
    //=====================================================================================

    /// Records a reading and returns the checkpoint's new verdict.
    ///
    /// Blank text clears the slot. Returns `None` without changing anything if
    /// the session is submitted or submitting, the checkpoint is unknown or the
    /// sample number is outside `1..=sample_size`.
    pub fn update_reading(
        &mut self,
        checkpoint_id: &str,
        sample_number: u32,
        value: Option<ReadingValue>,
    ) -> Option<CheckpointVerdict> {
        if !self.is_editable() {
            return None;
        }
        let definition = self.form.checkpoint(checkpoint_id)?;
        let value = value.filter(|v| !matches!(v, ReadingValue::Text(s) if s.trim().is_empty()));
        let reading = SampleReading {
            sample_number,
            status: value.as_ref().map(|v| validate_reading(v, definition)),
            recorded_at: value.as_ref().map(|_| Utc::now()),
            value,
        };
        let verdict = self.checkpoints.get_mut(checkpoint_id)?.record(
            definition,
            self.batch_info.sample_size,
            reading,
        )?;
        self.touch();
        Some(verdict)
    }

    pub fn update_visual_check(
        &mut self,
        checkpoint_id: &str,
        sample_number: u32,
        verdict: VisualVerdict,
    ) -> Option<CheckpointVerdict> {
        self.update_reading(checkpoint_id, sample_number, Some(verdict.into()))
    }

    /// Returns `false` if the session is submitted or submitting.
    pub fn update_remarks(&mut self, remarks: impl Into<String>) -> bool {
        if !self.is_editable() {
            return false;
        }
        self.remarks = remarks.into();
        self.touch();
        true
    }

    /// Clears every reading back to an empty slot. Remarks are kept.
    pub fn reset_readings(&mut self) -> bool {
        if !self.is_editable() {
            return false;
        }
        let sample_size = self.batch_info.sample_size;
        for definition in &self.form.checkpoints {
            self.checkpoints.insert(
                definition.id.clone(),
                CheckpointResult::blank(definition.id.clone(), sample_size),
            );
        }
        self.touch();
        true
    }

    //=====================================================================================
    // Projections
    //=====================================================================================

    pub fn completeness(&self) -> CompletenessReport {
        check_readings_complete(
            &self.checkpoints,
            &self.form.checkpoints,
            self.batch_info.sample_size,
        )
    }

    pub fn stats(&self) -> InspectionStats {
        compute_stats(&self.checkpoints, &self.completeness())
    }

    pub fn draft(&self) -> DraftReadings {
        DraftReadings {
            checkpoints: self.checkpoints.clone(),
            remarks: self.remarks.clone(),
        }
    }

    //=====================================================================================
    // Save / submit bookkeeping
    //=====================================================================================

    pub fn begin_save(&mut self) -> SessionResult<PendingSave> {
        if self.submitted {
            return Err(SessionError::AlreadySubmitted);
        }
        self.saves_in_flight += 1;
        Ok(PendingSave {
            draft: self.draft(),
            revision: self.revision,
        })
    }

    /// Applies the outcome of a save started at `revision`. The dirty flag is
    /// only cleared if nothing was edited while the save was in flight.
    pub fn finish_save(
        &mut self,
        revision: u64,
        outcome: Result<(), PortError>,
        saved_at: DateTime<Utc>,
    ) -> SessionResult<DateTime<Utc>> {
        self.saves_in_flight = self.saves_in_flight.saturating_sub(1);
        match outcome {
            Ok(()) => {
                self.last_saved = Some(saved_at);
                self.last_error = None;
                if self.revision == revision {
                    self.dirty = false;
                }
                Ok(saved_at)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Builds the submission record. Refuses while readings are missing.
    pub fn begin_submit(&mut self, submitted_at: DateTime<Utc>) -> SessionResult<InspectionSubmission> {
        if self.submitted {
            return Err(SessionError::AlreadySubmitted);
        }
        if self.submitting {
            return Err(SessionError::SubmitInProgress);
        }
        let completeness = self.completeness();
        if !completeness.is_complete {
            let err = SessionError::Incomplete {
                missing: completeness.missing_count,
            };
            self.last_error = Some(err.to_string());
            return Err(err);
        }
        self.submitting = true;
        Ok(InspectionSubmission {
            checkpoints: self.checkpoints.clone(),
            remarks: self.remarks.clone(),
            total_samples: self.batch_info.sample_size,
            lot_size: self.batch_info.lot_size,
            submitted_at,
            stats: compute_stats(&self.checkpoints, &completeness),
        })
    }

    /// On failure every edit is kept and the session returns to `Ready`.
    pub fn finish_submit<T>(&mut self, outcome: Result<T, PortError>) -> SessionResult<T> {
        self.submitting = false;
        match outcome {
            Ok(ack) => {
                self.submitted = true;
                self.dirty = false;
                self.last_error = None;
                Ok(ack)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }
}
