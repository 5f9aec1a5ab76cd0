//! Client for the Gemini `generateContent` endpoint.
//!
//! One request per call: build a single-message payload, POST it with a
//! bounded timeout, and pull the first candidate's first text part out of the
//! reply. No retries and no streaming.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::config::GeminiConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    #[error("Gemini API error: {status} {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("Empty response from Gemini")]
    EmptyResponse,

    #[error("Gemini request timed out after {0}s")]
    Timeout(u64),

    #[error("failed to send Gemini request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to decode Gemini response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Optional knobs on top of the bare prompt.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        self.generate_with(prompt, &GenerationOptions::default())
            .await
    }

    pub async fn generate_with(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GeminiError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GeminiError::MissingApiKey)?;

        let payload = GenerateContentRequest::new(prompt, options);
        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "sending Gemini request"
        );

        let exchange = self.exchange(api_key, &payload);
        timeout(Duration::from_secs(self.config.timeout_secs), exchange)
            .await
            .map_err(|_| GeminiError::Timeout(self.config.timeout_secs))?
    }

    // Send, status check and body read; the caller bounds all of it.
    async fn exchange(
        &self,
        api_key: &str,
        payload: &GenerateContentRequest,
    ) -> Result<String, GeminiError> {
        let response = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(payload)
            .send()
            .await
            .map_err(GeminiError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response body>".to_string());
            warn!(%status, "Gemini returned an error status");
            return Err(GeminiError::Upstream { status, body });
        }

        let body: GenerateContentResponse =
            response.json().await.map_err(GeminiError::Decode)?;
        body.first_text().ok_or(GeminiError::EmptyResponse)
    }
}

// Wire types. Only the fields this client reads or writes are modelled.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    fn new(prompt: &str, options: &GenerationOptions) -> Self {
        Self {
            contents: vec![Content::text(prompt)],
            system_instruction: options.system_instruction.as_deref().map(Content::text),
            generation_config: options
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(text: &str) -> Self {
        Self {
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<String> {
        let text = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()?
            .trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}
