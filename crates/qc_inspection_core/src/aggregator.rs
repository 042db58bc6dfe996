//! crates/qc_inspection_core/src/aggregator.rs
//!
//! Folds the sample readings of one checkpoint into its aggregate verdict.

use std::collections::BTreeMap;

use crate::domain::{
    CheckpointDefinition, CheckpointKind, CheckpointVerdict, ReadingStatus, SampleReading,
    VisualVerdict,
};

/// Computes the verdict of a checkpoint from scratch.
///
/// A single failing sample rejects the checkpoint. Otherwise the checkpoint is
/// accepted once every slot `1..=sample_size` holds a valid reading, and is
/// pending until then. Sampling-plan (AQL) acceptance numbers are not applied here.
pub fn calculate_checkpoint_result(
    samples: &BTreeMap<u32, SampleReading>,
    definition: &CheckpointDefinition,
    sample_size: u32,
) -> CheckpointVerdict {
    let rejected = match &definition.kind {
        CheckpointKind::Visual => samples.values().any(|s| {
            s.value
                .as_ref()
                .and_then(|v| v.as_verdict())
                .is_some_and(|v| v == VisualVerdict::Ng)
        }),
        CheckpointKind::Functional(_) => samples
            .values()
            .any(|s| s.status == Some(ReadingStatus::Fail)),
    };
    if rejected {
        return CheckpointVerdict::Rejected;
    }

    let all_filled = sample_size > 0
        && (1..=sample_size).all(|n| {
            samples
                .get(&n)
                .is_some_and(|s| s.is_present() && s.status != Some(ReadingStatus::Invalid))
        });

    if all_filled {
        CheckpointVerdict::Accepted
    } else {
        CheckpointVerdict::Pending
    }
}
