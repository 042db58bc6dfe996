//! crates/qc_inspection_core/src/stats.rs

use crate::completeness::CompletenessReport;
use crate::domain::{CheckpointResultMap, CheckpointVerdict, InspectionStats};

/// Projects checkpoint verdicts and slot completeness into summary counts.
pub fn compute_stats(
    checkpoints: &CheckpointResultMap,
    completeness: &CompletenessReport,
) -> InspectionStats {
    let total = checkpoints.len();
    let count = |verdict| {
        checkpoints
            .values()
            .filter(|c| c.result() == verdict)
            .count()
    };
    let passed = count(CheckpointVerdict::Accepted);
    let failed = count(CheckpointVerdict::Rejected);
    let pending = total - passed - failed;

    let pass_rate = if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    };

    InspectionStats {
        total_checkpoints: total,
        completed: passed + failed,
        passed,
        failed,
        pending,
        pass_rate,
        readings_complete: completeness.is_complete,
        missing_readings: completeness.missing_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completeness::check_readings_complete;
    use crate::domain::{CheckpointDefinition, CheckpointKind, CheckpointResult, SampleReading};

    fn visual(id: &str) -> CheckpointDefinition {
        CheckpointDefinition {
            id: id.to_string(),
            name: id.to_uppercase(),
            specification: String::new(),
            kind: CheckpointKind::Visual,
            unit: None,
            instrument: None,
            mandatory: true,
        }
    }

    #[test]
    fn counts_and_pass_rate() {
        let defs = vec![visual("a"), visual("b"), visual("c"), visual("d")];
        let verdicts = ["OK", "NG", "OK", ""];
        let mut map = CheckpointResultMap::new();
        for (def, verdict) in defs.iter().zip(verdicts) {
            let mut result = CheckpointResult::blank(def.id.clone(), 1);
            if !verdict.is_empty() {
                result.record(
                    def,
                    1,
                    SampleReading {
                        sample_number: 1,
                        value: Some(verdict.into()),
                        status: None,
                        recorded_at: None,
                    },
                );
            }
            map.insert(def.id.clone(), result);
        }

        let completeness = check_readings_complete(&map, &defs, 1);
        let stats = compute_stats(&map, &completeness);
        assert_eq!(stats.total_checkpoints, 4);
        assert_eq!(stats.passed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.pass_rate, 50.0);
        assert!(!stats.readings_complete);
        assert_eq!(stats.missing_readings, 1);
    }

    #[test]
    fn empty_inspection_has_zero_pass_rate() {
        let map = CheckpointResultMap::new();
        let completeness = check_readings_complete(&map, &[], 5);
        let stats = compute_stats(&map, &completeness);
        assert_eq!(stats.pass_rate, 0.0);
        assert!(stats.readings_complete);
    }
}
