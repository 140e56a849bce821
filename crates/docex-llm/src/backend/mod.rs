//! Language model backend implementations.

#[cfg(feature = "gemini")]
pub mod gemini;

use crate::{ImageInput, Result};

/// Trait for language model backends.
///
/// Backends are treated as untrusted text-to-text functions: callers must
/// not assume any particular shape for the returned text.
pub trait LanguageModel: Send + Sync {
    /// Short human-readable backend name, e.g. `"Gemini"`.
    fn name(&self) -> &str;

    /// Send a text prompt and return the model's raw text response.
    fn generate(&self, prompt: &str) -> Result<String>;

    /// Send a text prompt together with an image.
    fn generate_with_image(&self, prompt: &str, image: &ImageInput) -> Result<String>;
}
