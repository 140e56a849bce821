//! Best-effort parsing of free-text model responses.
//!
//! Model output is untrusted: it may be prose, malformed JSON or a label
//! outside the expected set. Every parser here returns a [`ParseOutcome`]
//! instead of failing, so callers decide what a degraded result means.

use std::fmt;

use docex_llm::LlmError;
use serde_json::Value;
use tracing::trace;

use crate::models::{DocType, ExtractedField};

/// Result of parsing an untrusted model response.
#[derive(Debug)]
pub enum ParseOutcome<T> {
    /// The response had the expected shape.
    Parsed(T),
    /// The response was unusable; the caller falls back to a default.
    Degraded(DegradeReason),
}

/// Why a model response could not be used.
#[derive(Debug)]
pub enum DegradeReason {
    /// No `[ ... ]` span in the response.
    NoJsonArray,
    /// The bracketed span was not valid JSON.
    InvalidJson(String),
    /// The model request itself failed.
    Request(LlmError),
    /// The classifier answered with a label we do not know.
    UnrecognizedLabel(String),
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoJsonArray => write!(f, "no JSON array in response"),
            Self::InvalidJson(e) => write!(f, "invalid JSON: {}", e),
            Self::Request(e) => write!(f, "request failed: {}", e),
            Self::UnrecognizedLabel(label) => write!(f, "unrecognized label {:?}", label),
        }
    }
}

impl<T> ParseOutcome<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// The degradation reason, if any.
    pub fn reason(&self) -> Option<&DegradeReason> {
        match self {
            Self::Parsed(_) => None,
            Self::Degraded(reason) => Some(reason),
        }
    }

    /// The parsed value, or `default` when degraded.
    pub fn into_value_or(self, default: T) -> T {
        match self {
            Self::Parsed(value) => value,
            Self::Degraded(_) => default,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseOutcome<U> {
        match self {
            Self::Parsed(value) => ParseOutcome::Parsed(f(value)),
            Self::Degraded(reason) => ParseOutcome::Degraded(reason),
        }
    }
}

impl<T: Default> ParseOutcome<T> {
    /// The parsed value, or `T::default()` when degraded.
    pub fn into_value_or_default(self) -> T {
        self.into_value_or(T::default())
    }
}

/// Normalize a classifier response into a document type.
pub fn normalize_doc_type(response: &str) -> ParseOutcome<DocType> {
    let label = response.trim().to_lowercase();
    match DocType::from_label(&label) {
        Some(doc_type) => ParseOutcome::Parsed(doc_type),
        None => ParseOutcome::Degraded(DegradeReason::UnrecognizedLabel(label)),
    }
}

/// Parse the JSON array of `{name, value, confidence}` objects in a response.
///
/// The array spans from the first `[` to the last `]`. Elements that are not
/// objects, or lack a string `name` or a scalar `value`, are skipped. A
/// missing or non-numeric `confidence` becomes `default_confidence`. Order
/// and duplicate names are preserved.
pub fn parse_field_array(response: &str, default_confidence: f64) -> ParseOutcome<Vec<ExtractedField>> {
    let (start, end) = match (response.find('['), response.rfind(']')) {
        (Some(start), Some(end)) if end > start => (start, end),
        _ => return ParseOutcome::Degraded(DegradeReason::NoJsonArray),
    };

    let items: Vec<Value> = match serde_json::from_str(&response[start..=end]) {
        Ok(items) => items,
        Err(e) => return ParseOutcome::Degraded(DegradeReason::InvalidJson(e.to_string())),
    };

    let fields = items
        .iter()
        .filter_map(|item| {
            let field = field_from_json(item, default_confidence);
            if field.is_none() {
                trace!("Skipping malformed field entry: {}", item);
            }
            field
        })
        .collect();

    ParseOutcome::Parsed(fields)
}

fn field_from_json(item: &Value, default_confidence: f64) -> Option<ExtractedField> {
    let object = item.as_object()?;
    let name = object.get("name")?.as_str()?;
    let value = match object.get("value")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(default_confidence);

    Some(ExtractedField::new(name, value, confidence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_array_inside_prose() {
        let fields = parse_field_array(
            r#"Here you go: [{"name":"x","value":"y"}] thanks"#,
            0.7,
        )
        .into_value_or_default();
        assert_eq!(fields, vec![ExtractedField::new("x", "y", 0.7)]);
    }

    #[test]
    fn test_no_bracket() {
        let outcome = parse_field_array("I could not find anything", 0.7);
        assert!(matches!(
            outcome.reason(),
            Some(DegradeReason::NoJsonArray)
        ));
    }

    #[test]
    fn test_close_before_open() {
        let outcome = parse_field_array("] nothing [", 0.7);
        assert!(matches!(
            outcome.reason(),
            Some(DegradeReason::NoJsonArray)
        ));
    }

    #[test]
    fn test_malformed_json() {
        let outcome = parse_field_array(r#"[{"name": "x", "value": }]"#, 0.7);
        assert!(matches!(
            outcome.reason(),
            Some(DegradeReason::InvalidJson(_))
        ));
        assert!(outcome.into_value_or_default().is_empty());
    }

    #[test]
    fn test_markdown_fenced_response() {
        let response = "```json\n[\n  {\"name\": \"total_amount\", \"value\": \"$1,200.00\", \"confidence\": 0.95}\n]\n```";
        let fields = parse_field_array(response, 0.7).into_value_or_default();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].value, "$1,200.00");
        assert_eq!(fields[0].confidence(), 0.95);
    }

    #[test]
    fn test_skips_malformed_entries_and_keeps_order() {
        let response = r#"[
            {"name": "b", "value": "2", "confidence": 0.9},
            {"value": "orphan"},
            "just a string",
            {"name": "a"},
            {"name": "a", "value": "1"},
            {"name": "b", "value": "3", "confidence": "high"}
        ]"#;
        let fields = parse_field_array(response, 0.7).into_value_or_default();
        let summary: Vec<(&str, &str, f64)> = fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str(), f.confidence()))
            .collect();
        assert_eq!(
            summary,
            vec![("b", "2", 0.9), ("a", "1", 0.7), ("b", "3", 0.7)]
        );
    }

    #[test]
    fn test_scalar_values_are_stringified() {
        let response = r#"[{"name":"total","value":1200.5},{"name":"paid","value":true},{"name":"n","value":null}]"#;
        let fields = parse_field_array(response, 0.7).into_value_or_default();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].value, "1200.5");
        assert_eq!(fields[1].value, "true");
    }

    #[test]
    fn test_model_confidence_clamped() {
        let fields = parse_field_array(r#"[{"name":"x","value":"y","confidence":9}]"#, 0.7)
            .into_value_or_default();
        assert_eq!(fields[0].confidence(), 1.0);
    }

    #[test]
    fn test_normalize_doc_type() {
        assert!(matches!(
            normalize_doc_type("  Invoice\n"),
            ParseOutcome::Parsed(DocType::Invoice)
        ));
        assert!(matches!(
            normalize_doc_type("MEDICAL_BILL"),
            ParseOutcome::Parsed(DocType::MedicalBill)
        ));

        let outcome = normalize_doc_type("unknown_type");
        assert!(outcome.is_degraded());
        assert_eq!(outcome.into_value_or(DocType::Invoice), DocType::Invoice);
        assert!(normalize_doc_type("The document is an invoice.").is_degraded());
    }
}
