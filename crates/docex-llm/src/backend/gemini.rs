//! Gemini REST backend using the `generateContent` endpoint.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::LlmError;
use crate::{ImageInput, LanguageModel, Result};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Connection settings for the Gemini backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Model identifier.
    pub model: String,

    /// Base URL of the REST API (no trailing slash).
    pub api_base: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 60,
            temperature: 0.0,
        }
    }
}

/// Backend calling Google's Gemini models over HTTPS.
pub struct GeminiBackend {
    client: reqwest::blocking::Client,
    api_key: String,
    config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiBackend {
    /// Create a backend with an explicit API key.
    pub fn new(api_key: impl Into<String>, config: GeminiConfig) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        debug!(
            "Created Gemini backend for model {} (timeout {}s)",
            config.model, config.timeout_secs
        );

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    /// Create a backend reading the API key from an environment variable.
    pub fn from_env(var: &str, config: GeminiConfig) -> Result<Self> {
        let api_key = std::env::var(var).map_err(|_| LlmError::MissingApiKey)?;
        Self::new(api_key, config)
    }

    /// The configuration this backend was built with.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    fn send(&self, parts: Vec<Part<'_>>) -> Result<String> {
        let request = build_request(parts, self.config.temperature);

        trace!("POST {}", self.endpoint());
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().map_err(map_reqwest_error)?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response_text(&body)?;
        debug!("Gemini returned {} characters", text.len());
        Ok(text)
    }
}

impl LanguageModel for GeminiBackend {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        self.send(vec![Part::Text { text: prompt }])
    }

    fn generate_with_image(&self, prompt: &str, image: &ImageInput) -> Result<String> {
        self.send(vec![
            Part::Text { text: prompt },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: &image.mime_type,
                    data: BASE64.encode(&image.data),
                },
            },
        ])
    }
}

fn build_request(parts: Vec<Part<'_>>, temperature: f32) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: vec![Content { role: "user", parts }],
        generation_config: GenerationConfig { temperature },
    }
}

fn map_reqwest_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(e.to_string())
    } else {
        LlmError::Request(e.to_string())
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(body: &str) -> Result<String> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}
