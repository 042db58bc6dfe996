//! crates/qc_inspection_core/src/domain.rs
//!
//! Defines the core data structures of an inspection: checkpoint definitions,
//! sample readings and the per-checkpoint results built from them.
//! These structs carry no I/O; adapters decide how they are stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::aggregator::calculate_checkpoint_result;
use crate::validator::validate_reading;

//=========================================================================================
// Checkpoint Definitions (read-only, owned by the form registry)
//=========================================================================================

/// Numeric acceptance data attached to a measurement checkpoint.
///
/// Explicit `min`/`max` win over `nominal` ± tolerance, which in turn win over
/// whatever can be parsed out of the specification text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance_plus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance_minus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// How a checkpoint is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "checking_type", rename_all = "snake_case")]
pub enum CheckpointKind {
    /// Judged by eye, recorded as an OK/NG verdict.
    Visual,
    /// Measured with an instrument and compared against numeric limits.
    #[serde(alias = "measurement")]
    Functional(MeasurementLimits),
}

/// A single inspection attribute evaluated across all samples of a lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub specification: String,
    #[serde(flatten)]
    pub kind: CheckpointKind,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default = "default_mandatory")]
    pub mandatory: bool,
}

fn default_mandatory() -> bool {
    true
}

impl CheckpointDefinition {
    pub fn is_visual(&self) -> bool {
        matches!(self.kind, CheckpointKind::Visual)
    }
}

/// The set of checkpoints to inspect for one part code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionForm {
    pub part_code: String,
    #[serde(default)]
    pub title: Option<String>,
    pub checkpoints: Vec<CheckpointDefinition>,
}

impl InspectionForm {
    pub fn checkpoint(&self, checkpoint_id: &str) -> Option<&CheckpointDefinition> {
        self.checkpoints.iter().find(|c| c.id == checkpoint_id)
    }
}

/// Batch metadata sourced from the incoming-material record. Never edited here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchInfo {
    pub batch_number: String,
    pub part_code: String,
    #[serde(default)]
    pub part_name: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    pub lot_size: u32,
    pub sample_size: u32,
    #[serde(default)]
    pub inspection_date: Option<NaiveDate>,
}

//=========================================================================================
// Readings
//=========================================================================================

/// The verdict recorded for a visual checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualVerdict {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NG")]
    Ng,
}

impl VisualVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualVerdict::Ok => "OK",
            VisualVerdict::Ng => "NG",
        }
    }
}

impl fmt::Display for VisualVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualVerdict {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("OK") => Ok(VisualVerdict::Ok),
            v if v.eq_ignore_ascii_case("NG") => Ok(VisualVerdict::Ng),
            _ => Err(()),
        }
    }
}

/// A raw value as captured from the operator: a number, or free text
/// (numeric strings and visual verdicts both arrive as text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Number(f64),
    Text(String),
}

impl ReadingValue {
    /// Interprets the value as a finite number, if it is one.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            ReadingValue::Number(n) => *n,
            ReadingValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then_some(n)
    }

    /// Interprets the value as an OK/NG verdict, if it is one.
    pub fn as_verdict(&self) -> Option<VisualVerdict> {
        match self {
            ReadingValue::Text(s) => s.parse().ok(),
            ReadingValue::Number(_) => None,
        }
    }
}

impl From<VisualVerdict> for ReadingValue {
    fn from(verdict: VisualVerdict) -> Self {
        ReadingValue::Text(verdict.as_str().to_string())
    }
}

impl From<f64> for ReadingValue {
    fn from(n: f64) -> Self {
        ReadingValue::Number(n)
    }
}

impl From<&str> for ReadingValue {
    fn from(s: &str) -> Self {
        ReadingValue::Text(s.to_string())
    }
}

/// Classification of a single reading against its checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    Pass,
    Fail,
    Invalid,
}

/// One sample slot of one checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleReading {
    pub sample_number: u32,
    pub value: Option<ReadingValue>,
    pub status: Option<ReadingStatus>,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl SampleReading {
    pub fn empty(sample_number: u32) -> Self {
        Self {
            sample_number,
            value: None,
            status: None,
            recorded_at: None,
        }
    }

    /// A slot counts as present whenever a value was recorded, including `0`.
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// Aggregate verdict of a checkpoint across its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CheckpointVerdict {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

/// The readings of one checkpoint for one inspection, plus their aggregate.
///
/// `result` is only ever written by [`CheckpointResult::record`],
/// [`CheckpointResult::recompute`] and the constructors, so it always matches
/// the current samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointResult {
    pub checkpoint_id: String,
    samples: BTreeMap<u32, SampleReading>,
    result: CheckpointVerdict,
}

impl CheckpointResult {
    /// Creates a blank result with one empty slot per sample.
    pub fn blank(checkpoint_id: impl Into<String>, sample_size: u32) -> Self {
        let samples = (1..=sample_size)
            .map(|n| (n, SampleReading::empty(n)))
            .collect();
        Self {
            checkpoint_id: checkpoint_id.into(),
            samples,
            result: CheckpointVerdict::Pending,
        }
    }

    /// Rebuilds a result from previously saved readings, filling gaps with empty
    /// slots and dropping samples outside `1..=sample_size`. Statuses and the
    /// aggregate are recomputed rather than trusted.
    pub fn hydrate(
        definition: &CheckpointDefinition,
        saved: Option<&CheckpointResult>,
        sample_size: u32,
    ) -> Self {
        let mut result = Self::blank(definition.id.clone(), sample_size);
        if let Some(saved) = saved {
            for (number, reading) in saved.samples.iter() {
                if let Some(slot) = result.samples.get_mut(number) {
                    slot.status = reading
                        .value
                        .as_ref()
                        .map(|v| validate_reading(v, definition));
                    slot.value = reading.value.clone();
                    slot.recorded_at = reading.recorded_at;
                }
            }
        }
        result.recompute(definition, sample_size);
        result
    }

    pub fn samples(&self) -> &BTreeMap<u32, SampleReading> {
        &self.samples
    }

    pub fn sample(&self, sample_number: u32) -> Option<&SampleReading> {
        self.samples.get(&sample_number)
    }

    pub fn result(&self) -> CheckpointVerdict {
        self.result
    }

    /// Stores a new reading for an existing slot and recomputes the aggregate.
    /// Returns `None` when the slot does not exist.
    pub fn record(
        &mut self,
        definition: &CheckpointDefinition,
        sample_size: u32,
        reading: SampleReading,
    ) -> Option<CheckpointVerdict> {
        let slot = self.samples.get_mut(&reading.sample_number)?;
        *slot = reading;
        self.recompute(definition, sample_size);
        Some(self.result)
    }

    pub fn recompute(&mut self, definition: &CheckpointDefinition, sample_size: u32) {
        self.result = calculate_checkpoint_result(&self.samples, definition, sample_size);
    }
}

/// Checkpoint id → result for one inspection.
pub type CheckpointResultMap = BTreeMap<String, CheckpointResult>;

//=========================================================================================
// Collaborator payloads
//=========================================================================================

/// A previously saved, not yet submitted, set of readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedReadings {
    pub checkpoints: CheckpointResultMap,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub last_saved: Option<DateTime<Utc>>,
}

/// Everything needed to open an inspection session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedInspection {
    pub batch_info: BatchInfo,
    /// `None` when no form is registered for the batch's part code.
    pub inspection_form: Option<InspectionForm>,
    #[serde(default)]
    pub saved_readings: Option<SavedReadings>,
}

/// The draft persisted by autosave and manual save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftReadings {
    pub checkpoints: CheckpointResultMap,
    pub remarks: String,
}

/// Derived statistics of an inspection; always a projection of current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionStats {
    pub total_checkpoints: usize,
    pub completed: usize,
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
    /// Percentage of checkpoints accepted, `0.0` when there are none.
    pub pass_rate: f64,
    pub readings_complete: bool,
    pub missing_readings: usize,
}

/// The final record sent on submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionSubmission {
    pub checkpoints: CheckpointResultMap,
    pub remarks: String,
    pub total_samples: u32,
    pub lot_size: u32,
    pub submitted_at: DateTime<Utc>,
    pub stats: InspectionStats,
}

/// Acknowledgement of a submission; `id` is the stored record, if the store returns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionAck {
    pub id: Option<Uuid>,
}
