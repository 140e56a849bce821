//! LLM-driven field extraction and quality assurance.

mod agent;
pub mod confidence;
pub mod parser;
pub mod prompts;

pub use agent::DocumentExtractionAgent;
pub use confidence::{FieldValidator, aggregate_confidence, score_confidence, validate_fields};
pub use parser::{DegradeReason, ParseOutcome, normalize_doc_type, parse_field_array};
