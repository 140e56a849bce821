//! Core library for LLM-assisted document field extraction.
//!
//! This crate provides:
//! - Document reading (PDF text layer, image OCR through a vision model)
//! - Document-type classification and field extraction via prompt templates
//! - Per-field confidence scoring and required-field validation
//! - Extraction result models serializable to JSON

pub mod error;
pub mod extraction;
pub mod models;
pub mod pdf;
pub mod reader;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{DocexError, PdfError, ReaderError, Result};
pub use extraction::{
    DocumentExtractionAgent, FieldValidator, ParseOutcome, aggregate_confidence, score_confidence,
    validate_fields,
};
pub use models::{
    DocType, DocexConfig, ExtractedField, ExtractionResult, FileKind, NOT_FOUND, QualityAssurance,
};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use reader::{DocumentReader, get_text_and_type};

/// Re-export language model types.
pub use docex_llm::{ImageInput, LanguageModel, LlmError};

#[cfg(feature = "gemini")]
pub use docex_llm::{GeminiBackend, GeminiConfig};
