//! Data models for extraction results and configuration.

pub mod config;
pub mod document;
pub mod extraction;

pub use config::{DocexConfig, DocumentProfile, DocumentProfiles, ExtractionConfig, LlmConfig, ReaderConfig};
pub use document::{DocType, FileKind};
pub use extraction::{
    BoundingBox, ExtractedField, ExtractionResult, NOT_FOUND, QualityAssurance, SourceLocation,
};
