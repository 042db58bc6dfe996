//! crates/qc_inspection_core/src/forms.rs
//!
//! A static registry of inspection forms keyed by part code.

use std::collections::HashMap;
use tracing::warn;

use crate::domain::{CheckpointKind, InspectionForm};
use crate::ports::FormLookup;

#[derive(Debug, Clone, Default)]
pub struct FormRegistry {
    forms: HashMap<String, InspectionForm>,
}

impl FormRegistry {
    pub fn new(forms: impl IntoIterator<Item = InspectionForm>) -> Self {
        let forms = forms
            .into_iter()
            .inspect(warn_on_inverted_limits)
            .map(|form| (form.part_code.clone(), form))
            .collect();
        Self { forms }
    }

    /// Parses a JSON array of forms.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let forms: Vec<InspectionForm> = serde_json::from_str(json)?;
        Ok(Self::new(forms))
    }

    pub fn get(&self, part_code: &str) -> Option<&InspectionForm> {
        self.forms.get(part_code)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl FormLookup for FormRegistry {
    fn form_for_part(&self, part_code: &str) -> Option<InspectionForm> {
        self.get(part_code).cloned()
    }
}

fn warn_on_inverted_limits(form: &InspectionForm) {
    for checkpoint in &form.checkpoints {
        if let CheckpointKind::Functional(limits) = &checkpoint.kind {
            if let (Some(min), Some(max)) = (limits.min, limits.max) {
                if min > max {
                    warn!(
                        "Checkpoint {} of part {} has min {} above max {}; every reading will fail",
                        checkpoint.id, form.part_code, min, max
                    );
                }
            }
        }
    }
}
