// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! xAI Grok chat completions client (OpenAI-compatible wire format).
//!
//! Used for short coaching suggestions (text) and for reading workouts
//! off a whiteboard photo (vision).

use crate::error::AppError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

const API_BASE_URL: &str = "https://api.x.ai/v1";
pub const CHAT_MODEL: &str = "grok-4-latest";
pub const VISION_MODEL: &str = "grok-2-vision-latest";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const COACH_SYSTEM_PROMPT: &str = "You are a supportive CrossFit coach giving quick, actionable advice. Keep responses brief and motivating.";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Object { message: String },
    Text(String),
}

/// Client for the xAI chat completions endpoint.
#[derive(Clone)]
pub struct GrokClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GrokClient {
    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed building xAI HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API root (local fakes in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Ask the coach persona a short question.
    #[instrument(skip(self, prompt), fields(model = CHAT_MODEL))]
    pub async fn coach_reply(&self, prompt: &str) -> Result<String, AppError> {
        let request = ChatCompletionRequest {
            model: CHAT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(COACH_SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Text(prompt.to_string()),
                },
            ],
            temperature: 0.7,
            max_tokens: 400,
        };

        self.complete(&request).await
    }

    /// Send a prompt together with an image given as a `data:` URL.
    #[instrument(skip(self, prompt, image_data_url), fields(model = VISION_MODEL))]
    pub async fn describe_image(
        &self,
        prompt: &str,
        image_data_url: &str,
    ) -> Result<String, AppError> {
        let request = ChatCompletionRequest {
            model: VISION_MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_data_url.to_string(),
                        },
                    },
                ]),
            }],
            temperature: 0.2,
            max_tokens: 2000,
        };

        self.complete(&request).await
    }

    async fn complete(&self, request: &ChatCompletionRequest<'_>) -> Result<String, AppError> {
        debug!("Sending request to xAI API");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::AiApi(format!("xAI request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::AiApi(format!("Failed to read xAI response: {e}")))?;

        if !status.is_success() {
            error!(status = %status, "xAI API error");
            return Err(parse_error_response(status.as_u16(), &body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to parse xAI response");
            AppError::AiApi(format!("Failed to parse xAI response: {e}"))
        })?;

        extract_message(parsed)
    }
}

fn extract_message(response: ChatCompletionResponse) -> Result<String, AppError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::AiApi("No response from AI".to_string()))
}

fn parse_error_response(status: u16, body: &str) -> AppError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|r| match r.error {
            ErrorDetail::Object { message } | ErrorDetail::Text(message) => message,
        })
        .unwrap_or_else(|_| body.to_string());

    match status {
        429 => AppError::AiApi("AI rate limit reached. Please try again shortly.".to_string()),
        _ => AppError::AiApi(format!("xAI API error ({status}): {message}")),
    }
}
