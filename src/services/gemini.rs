// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Gemini `generateContent` client, used for progress analysis.

use crate::error::AppError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

/// Client for a single Gemini model.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed building Gemini HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API root (local fakes in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(&self.api_key)
        )
    }

    /// Send a single-turn prompt and return the text of the first candidate.
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    pub async fn generate_text(&self, prompt: &str) -> Result<String, AppError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![ContentPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: 0.7,
                max_output_tokens: 2048,
            }),
        };

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(self.build_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::AiApi(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::AiApi(format!("Failed to read Gemini response: {e}")))?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            return Err(map_api_error(status.as_u16(), &response_text));
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!(error = %e, "Failed to parse Gemini response");
            AppError::AiApi(format!("Failed to parse Gemini response: {e}"))
        })?;

        let content = extract_content(parsed)?;
        debug!(len = content.len(), "Received Gemini response");
        Ok(content)
    }
}

fn extract_content(response: GeminiResponse) -> Result<String, AppError> {
    if let Some(err) = response.error {
        return Err(AppError::AiApi(format!("Gemini API error: {}", err.message)));
    }

    let candidate = response
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| AppError::AiApi("No candidates in Gemini response".to_string()))?;

    let text = candidate
        .content
        .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
        .filter(|t| !t.trim().is_empty());

    match text {
        Some(text) => Ok(text),
        None => Err(AppError::AiApi(format!(
            "Empty Gemini response (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ))),
    }
}

fn map_api_error(status: u16, response_text: &str) -> AppError {
    let message = serde_json::from_str::<GeminiResponse>(response_text)
        .ok()
        .and_then(|r| r.error)
        .map_or_else(|| response_text.to_string(), |e| e.message);

    match status {
        429 => AppError::AiApi(
            "AI service quota exceeded. Please wait a moment and try again.".to_string(),
        ),
        _ => AppError::AiApi(format!("Gemini API error ({status}): {message}")),
    }
}
