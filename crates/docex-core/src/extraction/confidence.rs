//! Confidence scoring and rule-based validation of extracted fields.

use std::collections::HashSet;

use tracing::debug;

use crate::models::extraction::clamp_unit;
use crate::models::{DocType, DocumentProfiles, ExtractedField, QualityAssurance};

/// Score for values longer than three characters.
const LONG_VALUE_SCORE: f64 = 0.7;
/// Score for short, non-empty values.
const SHORT_VALUE_SCORE: f64 = 0.5;
/// Deducted per failed rule.
const FAILED_RULE_PENALTY: f64 = 0.1;
/// Added per passed rule.
const PASSED_RULE_BONUS: f64 = 0.05;

/// Heuristic confidence from the shape of the value alone.
///
/// Missing values score 0.0, values longer than three characters 0.7 and
/// anything else 0.5. The confidence already on the field is ignored.
pub fn score_confidence(field: &ExtractedField) -> f64 {
    if field.is_missing() {
        0.0
    } else if field.value.chars().count() > 3 {
        LONG_VALUE_SCORE
    } else {
        SHORT_VALUE_SCORE
    }
}

/// Validate required-field presence using the default document profiles.
///
/// `doc_type` is a label such as `"invoice"`; unknown labels have no rules.
pub fn validate_fields(fields: &[ExtractedField], doc_type: &str) -> QualityAssurance {
    FieldValidator::default().validate(fields, doc_type)
}

/// Mean field confidence plus a bonus per passed rule minus a penalty per
/// failed rule, clamped into [0.0, 1.0].
pub fn aggregate_confidence(fields: &[ExtractedField], qa: &QualityAssurance) -> f64 {
    let base = if fields.is_empty() {
        0.0
    } else {
        fields.iter().map(|f| f.confidence()).sum::<f64>() / fields.len() as f64
    };
    let penalty = FAILED_RULE_PENALTY * qa.failed_rules.len() as f64;
    let bonus = PASSED_RULE_BONUS * qa.passed_rules.len() as f64;

    clamp_unit(base + bonus - penalty)
}

/// Checks extracted fields against per-type required-field rules.
#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    profiles: DocumentProfiles,
}

impl FieldValidator {
    /// Create a validator over a custom profile table.
    pub fn new(profiles: DocumentProfiles) -> Self {
        Self { profiles }
    }

    /// Validate against the rules for a type label.
    pub fn validate(&self, fields: &[ExtractedField], doc_type: &str) -> QualityAssurance {
        match DocType::from_label(doc_type) {
            Some(doc_type) => self.validate_type(fields, doc_type),
            None => {
                debug!("No validation rules for document type {:?}", doc_type);
                QualityAssurance::default()
            }
        }
    }

    /// Validate against the rules for a known type.
    ///
    /// A field counts as present by name alone, even if its value is
    /// `NOT_FOUND`.
    pub fn validate_type(&self, fields: &[ExtractedField], doc_type: DocType) -> QualityAssurance {
        let present: HashSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();

        let mut passed_rules = Vec::new();
        let mut failed_rules = Vec::new();
        for required in self.profiles.required_fields(doc_type) {
            if present.contains(required.as_str()) {
                passed_rules.push(format!("{}_present", required));
            } else {
                failed_rules.push(format!("{}_missing", required));
            }
        }

        debug!(
            "Validated {} fields as {}: {} passed, {} failed",
            fields.len(),
            doc_type,
            passed_rules.len(),
            failed_rules.len()
        );

        QualityAssurance {
            notes: failed_rules.join("; "),
            passed_rules,
            failed_rules,
        }
    }
}
