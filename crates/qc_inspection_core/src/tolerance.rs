//! crates/qc_inspection_core/src/tolerance.rs
//!
//! Parses the free-text specification strings found on QC spec sheets
//! (e.g. `"250mm +/-0.5"`, `"12 +0.2/-0.1"`) into numeric bounds.
//!
//! Spec sheets are inconsistent, so nothing here fails: text that does not
//! match a known pattern simply provides no numeric bound.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use regex::Regex;

const NUMBER: &str = r"(\d+(?:\.\d+)?|\.\d+)";

/// Tolerance markers in priority order; the first one that matches wins.
static TOLERANCE_PATTERNS: LazyLock<[(ToleranceForm, Regex); 3]> = LazyLock::new(|| {
    [
        (ToleranceForm::PlusMinus, compile(&format!(r"\+\s*/\s*-\s*{NUMBER}"))),
        (ToleranceForm::PlusMinusSign, compile(&format!(r"±\s*{NUMBER}"))),
        (
            ToleranceForm::Asymmetric,
            compile(&format!(r"\+\s*{NUMBER}\s*/\s*-\s*{NUMBER}")),
        ),
    ]
});

/// Leading nominal value followed by an optional unit token.
static NOMINAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"^\s*(-?{NUMBER})\s*([^\s\d+±/.-][^\s+±/]*)?")));

fn compile(pattern: &str) -> Regex {
    // The patterns are fixed at compile time; a failure here is a programming error.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid tolerance pattern {pattern}: {e}"))
}

#[derive(Debug, Clone, Copy)]
enum ToleranceForm {
    PlusMinus,
    PlusMinusSign,
    Asymmetric,
}

/// Allowed deviation above and below a nominal value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub plus: f64,
    pub minus: f64,
}

/// A nominal value with its unit and tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub nominal: f64,
    pub unit: Option<String>,
    pub tolerance_plus: f64,
    pub tolerance_minus: f64,
}

impl Specification {
    pub fn min(&self) -> f64 {
        self.nominal - self.tolerance_minus
    }

    pub fn max(&self) -> f64 {
        self.nominal + self.tolerance_plus
    }
}

/// Finds the first tolerance marker in `text` and the byte offset where it starts.
fn find_tolerance(text: &str) -> Option<(Tolerance, usize)> {
    TOLERANCE_PATTERNS.iter().find_map(|(form, re)| {
        let caps = re.captures(text)?;
        let start = caps.get(0)?.start();
        let first = caps.get(1)?.as_str().parse::<f64>().ok()?;
        let tolerance = match form {
            ToleranceForm::PlusMinus | ToleranceForm::PlusMinusSign => Tolerance {
                plus: first,
                minus: first,
            },
            ToleranceForm::Asymmetric => Tolerance {
                plus: first,
                minus: caps.get(2)?.as_str().parse::<f64>().ok()?,
            },
        };
        Some((tolerance, start))
    })
}

/// Extracts the tolerance from `text`, or `{plus: 0, minus: 0}` if there is none.
pub fn parse_tolerance(text: &str) -> Tolerance {
    find_tolerance(text)
        .map(|(tolerance, _)| tolerance)
        .unwrap_or_default()
}

/// Extracts nominal, unit and tolerance from `text`.
///
/// Returns `None` when the text has no recognizable tolerance marker or no
/// leading nominal value before it.
pub fn parse_specification(text: &str) -> Option<Specification> {
    let (tolerance, marker_start) = find_tolerance(text)?;
    let head = &text[..marker_start];
    let caps = NOMINAL_PATTERN.captures(head)?;
    let nominal = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let unit = caps
        .get(3)
        .map(|m| m.as_str().trim().to_string())
        .filter(|u| !u.is_empty());

    Some(Specification {
        nominal,
        unit,
        tolerance_plus: tolerance.plus,
        tolerance_minus: tolerance.minus,
    })
}
