//! Extraction agent orchestrating reading, classification, extraction and QA.

use std::sync::Arc;
use std::time::Instant;

use docex_llm::LanguageModel;
use tracing::{debug, info, warn};

use super::confidence::{FieldValidator, aggregate_confidence, score_confidence};
use super::parser::{DegradeReason, ParseOutcome, normalize_doc_type, parse_field_array};
use super::prompts::{classification_prompt, extraction_prompt, truncate_chars};
use crate::Result;
use crate::models::{DocType, DocexConfig, ExtractedField, ExtractionResult};
use crate::reader::DocumentReader;

/// Runs the full extraction pipeline for one document at a time.
///
/// The agent holds no per-call state, so one instance can serve calls from
/// several threads as long as the model backend allows it.
pub struct DocumentExtractionAgent {
    model: Arc<dyn LanguageModel>,
    reader: DocumentReader,
    validator: FieldValidator,
    config: DocexConfig,
}

impl DocumentExtractionAgent {
    /// Create an agent; `model` also serves as the OCR model for images.
    pub fn new(model: Arc<dyn LanguageModel>, config: DocexConfig) -> Self {
        let reader = DocumentReader::new(config.reader.clone()).with_vision_model(model.clone());
        let validator = FieldValidator::new(config.document_types.clone());
        Self {
            model,
            reader,
            validator,
            config,
        }
    }

    /// Create an agent backed by Gemini with an explicit API key.
    #[cfg(feature = "gemini")]
    pub fn gemini(api_key: &str, config: DocexConfig) -> Result<Self> {
        let backend = docex_llm::GeminiBackend::new(api_key, config.llm.gemini())?;
        Ok(Self::new(Arc::new(backend), config))
    }

    /// Replace the document reader.
    pub fn with_reader(mut self, reader: DocumentReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn config(&self) -> &DocexConfig {
        &self.config
    }

    /// Extract, score and validate fields from an uploaded file.
    ///
    /// `field_list` overrides the default fields for the classified type;
    /// an empty list counts as not supplied. Only reader failures are
    /// returned as errors; model failures degrade to defaults.
    pub fn extract(
        &self,
        bytes: &[u8],
        filename: &str,
        field_list: Option<&[String]>,
    ) -> Result<ExtractionResult> {
        let start = Instant::now();

        let (text, file_kind) = self.reader.read(bytes, filename)?;
        debug!("Read {} chars of {} text", text.chars().count(), file_kind.as_str());

        let doc_type = self
            .classify_doc_type(&text)
            .into_value_or(DocType::default());

        let fields_to_extract = match field_list {
            Some(fields) if !fields.is_empty() => fields.to_vec(),
            _ => self.default_fields(doc_type),
        };

        let mut fields = self
            .extract_fields(&text, doc_type, &fields_to_extract)
            .into_value_or_default();

        for field in &mut fields {
            let score = score_confidence(field);
            field.set_confidence(score);
        }

        let qa = self.validator.validate_type(&fields, doc_type);
        let overall_confidence = aggregate_confidence(&fields, &qa);
        let processing_time = start.elapsed().as_secs_f64();

        info!(
            "Extracted {} fields from {} as {} (confidence {:.2}, {:.2}s)",
            fields.len(),
            filename,
            doc_type,
            overall_confidence,
            processing_time
        );
        if !qa.is_clean() {
            info!("Validation notes: {}", qa.notes);
        }

        Ok(ExtractionResult {
            doc_type,
            fields,
            overall_confidence,
            qa,
            processing_time: Some(processing_time),
        })
    }

    /// Ask the model which kind of document `text` is.
    ///
    /// Degraded outcomes should be treated as [`DocType::Invoice`].
    pub fn classify_doc_type(&self, text: &str) -> ParseOutcome<DocType> {
        let prompt = classification_prompt(truncate_chars(text, self.config.extraction.classify_chars));

        let outcome = match self.model.generate(&prompt) {
            Ok(response) => normalize_doc_type(&response),
            Err(e) => ParseOutcome::Degraded(DegradeReason::Request(e)),
        };

        match &outcome {
            ParseOutcome::Parsed(doc_type) => debug!("Classified document as {}", doc_type),
            ParseOutcome::Degraded(reason) => {
                warn!("Classification degraded ({}), defaulting to {}", reason, DocType::default())
            }
        }
        outcome
    }

    /// Default field list for a document type.
    pub fn default_fields(&self, doc_type: DocType) -> Vec<String> {
        self.config.document_types.default_fields(doc_type).to_vec()
    }

    /// Ask the model for `fields` and parse its JSON answer.
    ///
    /// Degraded outcomes should be treated as an empty field list.
    pub fn extract_fields(
        &self,
        text: &str,
        doc_type: DocType,
        fields: &[String],
    ) -> ParseOutcome<Vec<ExtractedField>> {
        let prompt = extraction_prompt(
            doc_type,
            truncate_chars(text, self.config.extraction.extract_chars),
            fields,
        );

        let outcome = match self.model.generate(&prompt) {
            Ok(response) => {
                parse_field_array(&response, self.config.extraction.default_model_confidence)
            }
            Err(e) => ParseOutcome::Degraded(DegradeReason::Request(e)),
        };

        match &outcome {
            ParseOutcome::Parsed(parsed) => {
                debug!("Model returned {} of {} requested fields", parsed.len(), fields.len())
            }
            ParseOutcome::Degraded(reason) => warn!("Extraction error: {}", reason),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DocexError, ReaderError};
    use crate::models::NOT_FOUND;
    use crate::testing::{PNG_BYTES, ScriptedModel};
    use pretty_assertions::assert_eq;

    const BILL_RESPONSE: &str = r#"Sure! [
        {"name": "patient_name", "value": "Sarah Johnson", "confidence": 0.95},
        {"name": "provider_name", "value": "ABC Medical Center", "confidence": 0.9},
        {"name": "total_charges", "value": "$85", "confidence": 0.8}
    ]"#;

    fn agent(model: ScriptedModel) -> (Arc<ScriptedModel>, DocumentExtractionAgent) {
        let model = Arc::new(model);
        let agent = DocumentExtractionAgent::new(model.clone(), DocexConfig::default());
        (model, agent)
    }

    fn extraction_prompt_of(model: &ScriptedModel) -> String {
        model
            .prompts()
            .into_iter()
            .find(|p| p.starts_with("Extract these fields"))
            .expect("extraction prompt sent")
    }

    #[test]
    fn test_medical_bill_end_to_end() {
        let (model, agent) =
            agent(ScriptedModel::new("medical_bill", BILL_RESPONSE).with_ocr("Patient: Sarah"));

        let result = agent.extract(PNG_BYTES, "bill.png", None).unwrap();

        assert!(extraction_prompt_of(&model).starts_with(
            "Extract these fields from this medical_bill document: patient_name, provider_name, total_charges"
        ));
        assert_eq!(result.doc_type, DocType::MedicalBill);
        let scores: Vec<f64> = result.fields.iter().map(|f| f.confidence()).collect();
        assert_eq!(scores, vec![0.7, 0.7, 0.5]);
        assert_eq!(
            result.qa.passed_rules,
            vec!["patient_name_present", "provider_name_present"]
        );
        assert!(result.qa.failed_rules.is_empty());
        // mean 0.6333 + 2 * 0.05
        assert!((result.overall_confidence - (1.9 / 3.0 + 0.1)).abs() < 1e-9);
        assert!(result.processing_time.unwrap() >= 0.0);
    }

    #[test]
    fn test_caller_fields_take_precedence() {
        let (model, agent) = agent(
            ScriptedModel::new("invoice", r#"[{"name":"iban","value":"NOT_FOUND"}]"#)
                .with_ocr("Invoice"),
        );
        let fields = vec!["iban".to_string(), "due_date".to_string()];

        let result = agent.extract(PNG_BYTES, "inv.png", Some(fields.as_slice())).unwrap();

        assert!(extraction_prompt_of(&model)
            .starts_with("Extract these fields from this invoice document: iban, due_date\n"));
        assert_eq!(result.fields[0].value, NOT_FOUND);
        assert_eq!(result.fields[0].confidence(), 0.0);
        assert_eq!(
            result.qa.failed_rules,
            vec!["invoice_number_missing", "total_amount_missing"]
        );
        assert_eq!(result.overall_confidence, 0.0);
    }

    #[test]
    fn test_empty_field_list_uses_defaults() {
        let (model, agent) = agent(ScriptedModel::new("prescription", "[]").with_ocr("Rx"));
        let empty: Vec<String> = Vec::new();
        agent.extract(PNG_BYTES, "rx.png", Some(empty.as_slice())).unwrap();
        assert!(extraction_prompt_of(&model).starts_with(
            "Extract these fields from this prescription document: patient_name, prescriber_name, medications"
        ));
    }

    #[test]
    fn test_unrecognized_label_defaults_to_invoice() {
        let (_, agent) = agent(ScriptedModel::new("unknown_type", "[]").with_ocr("?"));
        let result = agent.extract(PNG_BYTES, "x.png", None).unwrap();
        assert_eq!(result.doc_type, DocType::Invoice);
        assert_eq!(result.qa.notes, "invoice_number_missing; total_amount_missing");
    }

    #[test]
    fn test_classification_mixed_case() {
        let (_, agent) = agent(ScriptedModel::new("  Invoice \n", "[]"));
        assert!(matches!(
            agent.classify_doc_type("text"),
            ParseOutcome::Parsed(DocType::Invoice)
        ));
    }

    #[test]
    fn test_model_failures_degrade() {
        let (_, agent) = agent(ScriptedModel::default().with_ocr("some text"));

        assert!(matches!(
            agent.classify_doc_type("text").reason(),
            Some(DegradeReason::Request(e)) if e.is_timeout()
        ));

        let result = agent.extract(PNG_BYTES, "scan.png", None).unwrap();
        assert_eq!(result.doc_type, DocType::Invoice);
        assert!(result.fields.is_empty());
        assert_eq!(result.qa.failed_rules.len(), 2);
        assert_eq!(result.overall_confidence, 0.0);
    }

    #[test]
    fn test_unparseable_extraction_yields_no_fields() {
        let (_, agent) = agent(ScriptedModel::new("invoice", "[{oops}]").with_ocr("text"));
        let result = agent.extract(PNG_BYTES, "scan.png", None).unwrap();
        assert!(result.fields.is_empty());
    }

    #[test]
    fn test_text_is_truncated() {
        let text = format!("{}TAIL", "a".repeat(3000));
        let (model, agent) = agent(ScriptedModel::new("invoice", "[]").with_ocr(&text));
        agent.extract(PNG_BYTES, "long.png", None).unwrap();

        let prompts = model.prompts();
        let classify = prompts.iter().find(|p| p.contains("Classify this document")).unwrap();
        assert!(classify.contains(&"a".repeat(2000)));
        assert!(!classify.contains(&"a".repeat(2001)));

        let extract = extraction_prompt_of(&model);
        assert!(extract.contains(&"a".repeat(3000)));
        assert!(!extract.contains("TAIL"));
    }

    #[test]
    fn test_unsupported_file_is_an_error() {
        let (model, agent) = agent(ScriptedModel::new("invoice", "[]"));
        let err = agent.extract(b"a,b,c", "data.csv", None).unwrap_err();
        assert!(matches!(
            err,
            DocexError::Reader(ReaderError::UnsupportedFileType(ref ext)) if ext == "csv"
        ));
        assert!(model.prompts().is_empty());
    }

    #[test]
    fn test_extract_is_repeatable() {
        let (_, agent) =
            agent(ScriptedModel::new("medical_bill", BILL_RESPONSE).with_ocr("Patient: Sarah"));
        let first = agent.extract(PNG_BYTES, "bill.png", None).unwrap();
        let second = agent.extract(PNG_BYTES, "bill.png", None).unwrap();
        assert_eq!(first.fields, second.fields);
        assert_eq!(first.qa, second.qa);
        assert_eq!(first.overall_confidence, second.overall_confidence);
    }

    #[test]
    fn test_custom_profiles_from_config() {
        let mut config = DocexConfig::default();
        config.document_types = crate::models::DocumentProfiles::empty();
        let model = Arc::new(ScriptedModel::new("invoice", "[]").with_ocr("x"));
        let agent = DocumentExtractionAgent::new(model, config);

        assert!(agent.default_fields(DocType::Invoice).is_empty());
        let result = agent.extract(PNG_BYTES, "x.png", None).unwrap();
        assert_eq!(result.qa, Default::default());
    }
}
