//! Configuration structures for the extraction pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::document::DocType;

/// Main configuration for the docex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocexConfig {
    /// Language model connection.
    pub llm: LlmConfig,

    /// Field extraction settings.
    pub extraction: ExtractionConfig,

    /// Document reading settings.
    pub reader: ReaderConfig,

    /// Per-document-type field tables.
    pub document_types: DocumentProfiles,
}

/// Language model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier.
    pub model: String,

    /// Base URL of the model API.
    pub api_base: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Sampling temperature.
    pub temperature: f32,

    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
            temperature: 0.0,
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

#[cfg(feature = "gemini")]
impl LlmConfig {
    /// Connection settings for the Gemini backend.
    pub fn gemini(&self) -> docex_llm::GeminiConfig {
        docex_llm::GeminiConfig {
            model: self.model.clone(),
            api_base: self.api_base.clone(),
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Characters of document text sent to the classifier.
    pub classify_chars: usize,

    /// Characters of document text sent to the field extractor.
    pub extract_chars: usize,

    /// Confidence assigned when the model omits one.
    pub default_model_confidence: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            classify_chars: 2000,
            extract_chars: 3000,
            default_model_confidence: 0.7,
        }
    }
}

/// Document reading configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Fail on OCR errors instead of returning the error text as content.
    pub strict_ocr: bool,
}

/// Default and required fields for one document type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentProfile {
    /// Fields requested when the caller supplies none.
    pub default_fields: Vec<String>,

    /// Fields whose presence is checked during validation.
    pub required_fields: Vec<String>,
}

impl DocumentProfile {
    pub fn new(default_fields: &[&str], required_fields: &[&str]) -> Self {
        Self {
            default_fields: default_fields.iter().map(|s| s.to_string()).collect(),
            required_fields: required_fields.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Table of document profiles keyed by type.
///
/// A type with no entry has no default fields and no required fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentProfiles(BTreeMap<DocType, DocumentProfile>);

impl DocumentProfiles {
    /// An empty table.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Add or replace the profile for a type.
    pub fn with_profile(mut self, doc_type: DocType, profile: DocumentProfile) -> Self {
        self.0.insert(doc_type, profile);
        self
    }

    pub fn get(&self, doc_type: DocType) -> Option<&DocumentProfile> {
        self.0.get(&doc_type)
    }

    /// Default field list for a type (empty if unknown).
    pub fn default_fields(&self, doc_type: DocType) -> &[String] {
        self.get(doc_type)
            .map(|p| p.default_fields.as_slice())
            .unwrap_or(&[])
    }

    /// Required field list for a type (empty if unknown).
    pub fn required_fields(&self, doc_type: DocType) -> &[String] {
        self.get(doc_type)
            .map(|p| p.required_fields.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for DocumentProfiles {
    fn default() -> Self {
        Self::empty()
            .with_profile(
                DocType::Invoice,
                DocumentProfile::new(
                    &["invoice_number", "date", "vendor_name", "total_amount"],
                    &["invoice_number", "total_amount"],
                ),
            )
            .with_profile(
                DocType::MedicalBill,
                DocumentProfile::new(
                    &["patient_name", "provider_name", "total_charges"],
                    &["patient_name", "provider_name"],
                ),
            )
            .with_profile(
                DocType::Prescription,
                DocumentProfile::new(
                    &["patient_name", "prescriber_name", "medications"],
                    &["patient_name", "prescriber_name"],
                ),
            )
    }
}

impl DocexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
