//! Language model abstraction layer for docex.
//!
//! This crate provides a unified interface for sending prompts to a
//! large language model:
//! - plain text prompts (`generate`)
//! - prompts with an attached image for OCR-style requests (`generate_with_image`)
//!
//! The Gemini REST backend is available behind the `gemini` feature.

mod backend;
mod error;
mod image;

pub use backend::LanguageModel;
pub use error::LlmError;
pub use image::ImageInput;

#[cfg(feature = "gemini")]
pub use backend::gemini::{GeminiBackend, GeminiConfig};

/// Result type for language model operations.
pub type Result<T> = std::result::Result<T, LlmError>;
