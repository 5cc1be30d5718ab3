use thiserror::Error;

use crate::predictor::SymptomField;

/// Problems found while building a `RuleCatalog`.
///
/// Every variant names the offending rule so catalog authors can find it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("Rule with empty id (title: {title:?})")]
    EmptyId { title: String },

    #[error("Duplicate rule id: {0}")]
    DuplicateId(String),

    #[error("Rule {rule}: base probability {value} outside 0-100")]
    ProbabilityOutOfRange { rule: String, value: f32 },

    #[error("Rule {rule}: repair cost min {min} exceeds max {max}")]
    InvertedCostRange { rule: String, min: u64, max: u64 },

    #[error("Rule {rule}: empty `{group}` group would match without any observation")]
    EmptyGroup { rule: String, group: &'static str },

    #[error("Rule {rule}: `one_of` list for {field} is empty")]
    EmptyLabelList { rule: String, field: SymptomField },

    #[error("Rule {rule}: {label:?} is not a valid value for {field}")]
    UnknownLabel {
        rule: String,
        field: SymptomField,
        label: String,
    },

    #[error("Rule {rule}: critical bound {critical} for {field} lies outside the region its test accepts")]
    MisplacedCritical {
        rule: String,
        field: SymptomField,
        critical: f64,
    },

    #[error("Rule {rule}: {field} is {expected}, the condition tests it otherwise")]
    FieldKindMismatch {
        rule: String,
        field: SymptomField,
        expected: &'static str,
    },
}

impl From<CatalogError> for String {
    fn from(err: CatalogError) -> Self {
        err.to_string()
    }
}
