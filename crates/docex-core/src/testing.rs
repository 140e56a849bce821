//! Deterministic language model stub for tests.

use std::sync::Mutex;

use docex_llm::{ImageInput, LanguageModel, LlmError, Result};

/// PNG signature, enough for format sniffing.
pub(crate) const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Answers each kind of prompt with a fixed reply; `None` fails the request.
#[derive(Default)]
pub(crate) struct ScriptedModel {
    pub classify: Option<String>,
    pub extract: Option<String>,
    pub ocr: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(classify: &str, extract: &str) -> Self {
        Self {
            classify: Some(classify.to_string()),
            extract: Some(extract.to_string()),
            ..Self::default()
        }
    }

    pub fn with_ocr(mut self, text: &str) -> Self {
        self.ocr = Some(text.to_string());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn reply(reply: &Option<String>) -> Result<String> {
        reply
            .clone()
            .ok_or_else(|| LlmError::Timeout("scripted timeout".to_string()))
    }
}

impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "Scripted"
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("Classify this document") {
            Self::reply(&self.classify)
        } else {
            Self::reply(&self.extract)
        }
    }

    fn generate_with_image(&self, prompt: &str, _image: &ImageInput) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Self::reply(&self.ocr)
    }
}
