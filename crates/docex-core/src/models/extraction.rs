//! Extraction result models.

use serde::{Deserialize, Deserializer, Serialize};

use super::document::DocType;

/// Value the model is asked to return for a field it cannot find.
pub const NOT_FOUND: &str = "NOT_FOUND";

/// Axis-aligned bounding box on a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Where a field value was found in the source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Page number (1-indexed).
    pub page: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

/// A single named value extracted from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    /// Field key, as requested from the model.
    pub name: String,

    /// Extracted value, or [`NOT_FOUND`].
    pub value: String,

    /// Confidence in [0.0, 1.0].
    #[serde(deserialize_with = "deserialize_confidence")]
    confidence: f64,

    /// Provenance of the value. Not populated yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,
}

impl ExtractedField {
    /// Create a field; `confidence` is clamped into [0.0, 1.0].
    pub fn new(name: impl Into<String>, value: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            confidence: clamp_unit(confidence),
            source: None,
        }
    }

    /// Attach a source location.
    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Replace the confidence, clamping into [0.0, 1.0].
    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = clamp_unit(confidence);
    }

    /// Whether the value is empty or the not-found sentinel.
    pub fn is_missing(&self) -> bool {
        self.value.is_empty() || self.value == NOT_FOUND
    }
}

/// Outcome of the rule-based validation step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityAssurance {
    /// Identifiers of rules that passed, in evaluation order.
    pub passed_rules: Vec<String>,

    /// Identifiers of rules that failed, in evaluation order.
    pub failed_rules: Vec<String>,

    /// Human-readable summary (failed rules joined by `"; "`).
    pub notes: String,
}

impl QualityAssurance {
    /// Whether every rule passed.
    pub fn is_clean(&self) -> bool {
        self.failed_rules.is_empty()
    }
}

/// Result of a full extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Classified document type.
    pub doc_type: DocType,

    /// Extracted fields, in model response order.
    pub fields: Vec<ExtractedField>,

    /// Aggregated confidence in [0.0, 1.0].
    pub overall_confidence: f64,

    /// Validation outcome.
    pub qa: QualityAssurance,

    /// Wall-clock time of the whole call, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}

impl ExtractionResult {
    /// First field with the given name.
    pub fn field(&self, name: &str) -> Option<&ExtractedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Serialize as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Clamp into [0.0, 1.0]; NaN maps to 0.0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn deserialize_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(ExtractedField::new("a", "b", 1.7).confidence(), 1.0);
        assert_eq!(ExtractedField::new("a", "b", -0.2).confidence(), 0.0);
        assert_eq!(ExtractedField::new("a", "b", f64::NAN).confidence(), 0.0);

        let mut field = ExtractedField::new("a", "b", 0.4);
        field.set_confidence(3.0);
        assert_eq!(field.confidence(), 1.0);
    }

    #[test]
    fn test_deserialize_clamps() {
        let field: ExtractedField =
            serde_json::from_str(r#"{"name":"x","value":"y","confidence":4.5}"#).unwrap();
        assert_eq!(field.confidence(), 1.0);
        assert!(field.source.is_none());
    }

    #[test]
    fn test_result_json_shape() {
        let result = ExtractionResult {
            doc_type: DocType::MedicalBill,
            fields: vec![ExtractedField::new("patient_name", "Sarah Johnson", 0.7)],
            overall_confidence: 0.75,
            qa: QualityAssurance {
                passed_rules: vec!["patient_name_present".into()],
                failed_rules: vec!["provider_name_missing".into()],
                notes: "provider_name_missing".into(),
            },
            processing_time: Some(1.5),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "doc_type": "medical_bill",
                "fields": [
                    { "name": "patient_name", "value": "Sarah Johnson", "confidence": 0.7 }
                ],
                "overall_confidence": 0.75,
                "qa": {
                    "passed_rules": ["patient_name_present"],
                    "failed_rules": ["provider_name_missing"],
                    "notes": "provider_name_missing"
                },
                "processing_time": 1.5
            })
        );
        assert_eq!(result.field("patient_name").unwrap().value, "Sarah Johnson");
        assert!(result.field("provider_name").is_none());
    }

    #[test]
    fn test_is_missing() {
        assert!(ExtractedField::new("a", "", 0.0).is_missing());
        assert!(ExtractedField::new("a", NOT_FOUND, 0.0).is_missing());
        assert!(!ExtractedField::new("a", "not_found", 0.0).is_missing());
    }
}
