//! Image OCR through a vision-capable language model.

use docex_llm::{ImageInput, LanguageModel};
use tracing::{debug, warn};

use crate::extraction::prompts::OCR_PROMPT;

/// Text returned for images when no vision model is configured.
pub const API_KEY_REQUIRED: &str = "[Error: API key required for image processing]";

/// Outcome of an OCR attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrOutcome {
    /// Recognised text.
    Text(String),
    /// OCR could not run or the model call failed.
    Failed(OcrFailure),
}

/// A failed OCR attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrFailure {
    /// Backend name, or `None` when no model was configured.
    pub backend: Option<String>,
    pub message: String,
}

impl OcrFailure {
    /// Bracketed text standing in for the document content.
    pub fn inline_text(&self) -> String {
        match &self.backend {
            Some(backend) => format!("[{} OCR Error: {}]", backend, self.message),
            None => API_KEY_REQUIRED.to_string(),
        }
    }
}

/// Run OCR on encoded image bytes.
pub fn run_ocr(bytes: &[u8], model: Option<&dyn LanguageModel>) -> OcrOutcome {
    let Some(model) = model else {
        warn!("No vision model configured, skipping OCR");
        return OcrOutcome::Failed(OcrFailure {
            backend: None,
            message: "API key required for image processing".to_string(),
        });
    };

    let failed = |message: String| {
        warn!("OCR failed: {}", message);
        OcrOutcome::Failed(OcrFailure {
            backend: Some(model.name().to_string()),
            message,
        })
    };

    let format = match image::guess_format(bytes) {
        Ok(format) => format,
        Err(e) => return failed(e.to_string()),
    };
    let image = ImageInput::new(format.to_mime_type(), bytes.to_vec());
    debug!("Sending {} image ({} bytes) for OCR", image.mime_type, image.len());

    match model.generate_with_image(OCR_PROMPT, &image) {
        Ok(text) => OcrOutcome::Text(text),
        Err(e) => failed(e.to_string()),
    }
}
