//! crates/qc_inspection_core/src/completeness.rs
//!
//! Reports which checkpoint × sample slots of an inspection are still empty.

use serde::{Deserialize, Serialize};

use crate::domain::{CheckpointDefinition, CheckpointResultMap};

/// One empty slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingReading {
    pub checkpoint_id: String,
    pub checkpoint: String,
    pub sample: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessReport {
    pub is_complete: bool,
    pub missing_count: usize,
    /// Checkpoint order, then ascending sample number.
    pub details: Vec<MissingReading>,
}

impl CompletenessReport {
    /// The first empty slot, e.g. to move the cursor there.
    pub fn first_missing(&self) -> Option<&MissingReading> {
        self.details.first()
    }
}

/// Scans every definition × sample `1..=sample_size`.
///
/// A slot is present when it holds any value; numeric `0` counts. Checkpoints
/// with no entry in `readings` contribute all of their slots as missing.
pub fn check_readings_complete(
    readings: &CheckpointResultMap,
    definitions: &[CheckpointDefinition],
    sample_size: u32,
) -> CompletenessReport {
    let details: Vec<MissingReading> = definitions
        .iter()
        .flat_map(|definition| {
            let result = readings.get(&definition.id);
            (1..=sample_size).filter_map(move |sample| {
                let present = result
                    .and_then(|r| r.sample(sample))
                    .is_some_and(|s| s.is_present());
                (!present).then(|| MissingReading {
                    checkpoint_id: definition.id.clone(),
                    checkpoint: definition.name.clone(),
                    sample,
                })
            })
        })
        .collect();

    CompletenessReport {
        is_complete: details.is_empty(),
        missing_count: details.len(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CheckpointKind, CheckpointResult, MeasurementLimits, ReadingValue, SampleReading,
    };

    fn definition(id: &str, name: &str) -> CheckpointDefinition {
        CheckpointDefinition {
            id: id.to_string(),
            name: name.to_string(),
            specification: "10 ±1".to_string(),
            kind: CheckpointKind::Functional(MeasurementLimits::default()),
            unit: None,
            instrument: None,
            mandatory: true,
        }
    }

    fn fill(
        result: &mut CheckpointResult,
        definition: &CheckpointDefinition,
        sample: u32,
        value: ReadingValue,
    ) {
        result.record(
            definition,
            3,
            SampleReading {
                sample_number: sample,
                value: Some(value),
                status: None,
                recorded_at: None,
            },
        );
    }

    fn fixture() -> (Vec<CheckpointDefinition>, CheckpointResultMap) {
        let defs = vec![definition("a", "Length"), definition("b", "Width")];
        let mut map = CheckpointResultMap::new();
        for def in &defs {
            let mut result = CheckpointResult::blank(def.id.clone(), 3);
            for sample in 1..=3 {
                fill(&mut result, def, sample, ReadingValue::Number(10.0));
            }
            map.insert(def.id.clone(), result);
        }
        (defs, map)
    }

    #[test]
    fn single_missing_slot_is_pinpointed() {
        let (defs, mut map) = fixture();
        let mut result = CheckpointResult::blank("b", 3);
        for sample in [1, 3] {
            fill(&mut result, &defs[1], sample, ReadingValue::Number(10.0));
        }
        map.insert("b".to_string(), result);

        let report = check_readings_complete(&map, &defs, 3);
        assert!(!report.is_complete);
        assert_eq!(report.missing_count, 1);
        assert_eq!(
            report.details,
            vec![MissingReading {
                checkpoint_id: "b".to_string(),
                checkpoint: "Width".to_string(),
                sample: 2,
            }]
        );
    }

    #[test]
    fn zero_is_a_present_value() {
        let (defs, mut map) = fixture();
        let mut result = CheckpointResult::blank("a", 3);
        for sample in 1..=3 {
            fill(&mut result, &defs[0], sample, ReadingValue::Number(0.0));
        }
        map.insert("a".to_string(), result);

        let report = check_readings_complete(&map, &defs, 3);
        assert!(report.is_complete);
        assert_eq!(report.missing_count, 0);
    }

    #[test]
    fn details_follow_checkpoint_then_sample_order() {
        let defs = vec![definition("a", "Length"), definition("b", "Width")];
        let map = CheckpointResultMap::new();

        let report = check_readings_complete(&map, &defs, 2);
        let order: Vec<(&str, u32)> = report
            .details
            .iter()
            .map(|m| (m.checkpoint_id.as_str(), m.sample))
            .collect();
        assert_eq!(order, vec![("a", 1), ("a", 2), ("b", 1), ("b", 2)]);
        assert_eq!(report.first_missing().map(|m| m.sample), Some(1));
    }

    #[test]
    fn is_complete_iff_nothing_missing() {
        let (defs, full) = fixture();
        for empty_slots in 0..=6u32 {
            let mut map = full.clone();
            for k in 0..empty_slots {
                let def = &defs[(k / 3) as usize];
                let mut result = map.remove(&def.id).unwrap();
                let sample = k % 3 + 1;
                let emptied = SampleReading::empty(sample);
                result.record(def, 3, emptied);
                map.insert(def.id.clone(), result);
            }
            let report = check_readings_complete(&map, &defs, 3);
            assert_eq!(report.missing_count, empty_slots as usize);
            assert_eq!(report.is_complete, report.missing_count == 0);
        }
    }
}
