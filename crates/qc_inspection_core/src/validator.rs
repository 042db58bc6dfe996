//! crates/qc_inspection_core/src/validator.rs
//!
//! Classifies a single reading against its checkpoint definition.

use serde::{Deserialize, Serialize};

use crate::domain::{
    CheckpointDefinition, CheckpointKind, MeasurementLimits, ReadingStatus, ReadingValue,
    VisualVerdict,
};
use crate::tolerance::parse_specification;

/// Absorbs float noise from `nominal ± tolerance` arithmetic at the limits.
const LIMIT_EPSILON: f64 = 1e-9;

/// The inclusive acceptance window of a measurement checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub min: f64,
    pub max: f64,
}

impl Limits {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min - LIMIT_EPSILON && value <= self.max + LIMIT_EPSILON
    }
}

/// Works out the acceptance window of a checkpoint.
///
/// Explicit `min`/`max` come first, then `nominal` ± tolerance, then the
/// specification text. A one-sided explicit limit leaves the other side open.
/// Visual checkpoints and checkpoints with nothing parseable have no limits.
pub fn resolve_limits(definition: &CheckpointDefinition) -> Option<Limits> {
    let CheckpointKind::Functional(limits) = &definition.kind else {
        return None;
    };
    explicit_limits(limits)
        .or_else(|| nominal_limits(limits))
        .or_else(|| {
            parse_specification(&definition.specification).map(|spec| Limits {
                min: spec.min(),
                max: spec.max(),
            })
        })
}

fn explicit_limits(limits: &MeasurementLimits) -> Option<Limits> {
    match (limits.min, limits.max) {
        (None, None) => None,
        (min, max) => Some(Limits {
            min: min.unwrap_or(f64::NEG_INFINITY),
            max: max.unwrap_or(f64::INFINITY),
        }),
    }
}

fn nominal_limits(limits: &MeasurementLimits) -> Option<Limits> {
    let nominal = limits.nominal?;
    let plus = limits.tolerance_plus.unwrap_or(0.0);
    let minus = limits.tolerance_minus.unwrap_or(plus);
    Some(Limits {
        min: nominal - minus,
        max: nominal + plus,
    })
}

/// Classifies `value` for `definition`. Total: every input yields a status.
///
/// Out-of-range readings are an expected `Fail`, not an error. A numeric
/// reading on a checkpoint without derivable limits passes, since the
/// specification gives nothing to fail against.
pub fn validate_reading(value: &ReadingValue, definition: &CheckpointDefinition) -> ReadingStatus {
    match &definition.kind {
        CheckpointKind::Visual => match value.as_verdict() {
            Some(VisualVerdict::Ok) => ReadingStatus::Pass,
            Some(VisualVerdict::Ng) => ReadingStatus::Fail,
            None => ReadingStatus::Invalid,
        },
        CheckpointKind::Functional(_) => {
            let Some(measured) = value.as_number() else {
                return ReadingStatus::Invalid;
            };
            match resolve_limits(definition) {
                Some(limits) if !limits.contains(measured) => ReadingStatus::Fail,
                _ => ReadingStatus::Pass,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn functional(spec: &str, limits: MeasurementLimits) -> CheckpointDefinition {
        CheckpointDefinition {
            id: "cp-volt".to_string(),
            name: "Output Voltage".to_string(),
            specification: spec.to_string(),
            kind: CheckpointKind::Functional(limits),
            unit: Some("V".to_string()),
            instrument: Some("Multimeter".to_string()),
            mandatory: true,
        }
    }

    fn visual() -> CheckpointDefinition {
        CheckpointDefinition {
            id: "cp-finish".to_string(),
            name: "Surface Finish".to_string(),
            specification: "No visible scratches".to_string(),
            kind: CheckpointKind::Visual,
            unit: None,
            instrument: None,
            mandatory: true,
        }
    }

    #[test]
    fn output_voltage_scenario() {
        let cp = functional("3.3V +/-0.1", MeasurementLimits::default());
        assert_eq!(validate_reading(&3.35.into(), &cp), ReadingStatus::Pass);
        assert_eq!(validate_reading(&3.45.into(), &cp), ReadingStatus::Fail);
        assert_eq!(validate_reading(&3.19.into(), &cp), ReadingStatus::Fail);
    }

    #[test]
    fn limits_are_inclusive() {
        let cp = functional("3.3V +/-0.1", MeasurementLimits::default());
        assert_eq!(validate_reading(&3.4.into(), &cp), ReadingStatus::Pass);
        assert_eq!(validate_reading(&3.2.into(), &cp), ReadingStatus::Pass);
    }

    #[test]
    fn numeric_text_is_parsed() {
        let cp = functional("3.3V +/-0.1", MeasurementLimits::default());
        assert_eq!(validate_reading(&" 3.31 ".into(), &cp), ReadingStatus::Pass);
        assert_eq!(validate_reading(&"abc".into(), &cp), ReadingStatus::Invalid);
        assert_eq!(validate_reading(&"".into(), &cp), ReadingStatus::Invalid);
        assert_eq!(validate_reading(&"NaN".into(), &cp), ReadingStatus::Invalid);
        assert_eq!(validate_reading(&"OK".into(), &cp), ReadingStatus::Invalid);
    }

    #[test]
    fn explicit_limits_override_spec_text() {
        let cp = functional(
            "3.3V +/-0.1",
            MeasurementLimits {
                min: Some(3.0),
                max: Some(3.6),
                ..Default::default()
            },
        );
        assert_eq!(validate_reading(&3.55.into(), &cp), ReadingStatus::Pass);
        assert_eq!(validate_reading(&3.65.into(), &cp), ReadingStatus::Fail);
    }

    #[test]
    fn one_sided_limit_is_open_on_the_other_side() {
        let cp = functional(
            "",
            MeasurementLimits {
                min: Some(50.0),
                ..Default::default()
            },
        );
        assert_eq!(validate_reading(&1e6.into(), &cp), ReadingStatus::Pass);
        assert_eq!(validate_reading(&49.9.into(), &cp), ReadingStatus::Fail);
    }

    #[test]
    fn nominal_and_tolerance_fields() {
        let cp = functional(
            "see drawing",
            MeasurementLimits {
                nominal: Some(250.0),
                tolerance_plus: Some(0.5),
                tolerance_minus: Some(0.2),
                ..Default::default()
            },
        );
        let limits = resolve_limits(&cp).unwrap();
        assert!((limits.min - 249.8).abs() < 1e-9);
        assert!((limits.max - 250.5).abs() < 1e-9);
        assert_eq!(validate_reading(&249.7.into(), &cp), ReadingStatus::Fail);
    }

    #[test]
    fn unparseable_spec_has_no_bound() {
        let cp = functional("per customer sample", MeasurementLimits::default());
        assert_eq!(resolve_limits(&cp), None);
        assert_eq!(validate_reading(&123.0.into(), &cp), ReadingStatus::Pass);
        assert_eq!(validate_reading(&"x".into(), &cp), ReadingStatus::Invalid);
    }

    #[test]
    fn visual_sentinels() {
        let cp = visual();
        assert_eq!(validate_reading(&"OK".into(), &cp), ReadingStatus::Pass);
        assert_eq!(validate_reading(&"NG".into(), &cp), ReadingStatus::Fail);
        assert_eq!(validate_reading(&"ng".into(), &cp), ReadingStatus::Fail);
        assert_eq!(validate_reading(&"maybe".into(), &cp), ReadingStatus::Invalid);
        assert_eq!(validate_reading(&1.0.into(), &cp), ReadingStatus::Invalid);
        assert_eq!(resolve_limits(&cp), None);
    }

    #[test]
    fn validation_does_not_touch_the_definition() {
        let cp = functional("3.3V +/-0.1", MeasurementLimits::default());
        let before = cp.clone();
        let _ = validate_reading(&3.35.into(), &cp);
        assert_eq!(cp, before);
    }
}
