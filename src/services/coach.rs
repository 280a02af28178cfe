// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI coaching features: programming scans, progress analysis, and
//! daily suggestions.
//!
//! Each feature needs its provider key; a missing key surfaces as
//! `AppError::AiNotConfigured` at call time rather than at startup.

use crate::config::Config;
use crate::error::AppError;
use crate::models::suggestion::week_start;
use crate::models::{AiCoachPreferences, AiSuggestion, SuggestionKind, Weekday};
use crate::services::gemini::GeminiClient;
use crate::services::grok::GrokClient;
use crate::services::progress::{build_progress_summary, ProgressReport};
use base64::Engine;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Largest decoded image accepted for scanning.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const SCAN_PROMPT: &str = r#"You are a CrossFit coach analyzing a handwritten workout or programming notes.

Look at this image and extract any workout programming you can see. This could include:
- WODs (Workout of the Day)
- Strength work (squats, deadlifts, presses, etc.)
- Skill work (gymnastics movements)
- Conditioning pieces
- EMOM, AMRAP, For Time workouts
- Any other CrossFit-style programming

For each workout or component you identify, provide:
1. A title/name for the workout
2. The type (WOD, Strength, Skill, Conditioning, Warmup, etc.)
3. A clear, formatted description of the workout
4. Any additional notes (scaling options, intended stimulus, etc.)

Format your response as JSON array like this:
[
  {
    "title": "Back Squat",
    "type": "Strength",
    "description": "5x5 Back Squat @ 75%",
    "notes": "Rest 2-3 min between sets"
  },
  {
    "title": "Fran",
    "type": "WOD",
    "description": "21-15-9\nThrusters (95/65)\nPull-ups",
    "notes": "For Time. Scale to jumping pull-ups if needed."
  }
]

If you cannot read the handwriting or the image doesn't contain workout programming, respond with an empty array [].

IMPORTANT: Only respond with valid JSON. No additional text before or after the JSON."#;

/// One workout read off a scanned image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedWorkout {
    pub title: String,
    #[serde(rename = "type", default)]
    pub workout_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ScanError {
    #[error("image must be a base64 data URL: {0}")]
    InvalidImage(String),
    #[error("image exceeds {} MB", MAX_IMAGE_BYTES / (1024 * 1024))]
    ImageTooLarge,
    #[error("could not parse the workout data")]
    Unparseable,
    #[error("unexpected response format from AI")]
    UnexpectedFormat,
    #[error("could not identify any workouts in the image; try a clearer photo")]
    NoWorkouts,
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::InvalidImage(_) | ScanError::ImageTooLarge | ScanError::NoWorkouts => {
                AppError::BadRequest(err.to_string())
            }
            ScanError::Unparseable | ScanError::UnexpectedFormat => {
                AppError::AiApi(err.to_string())
            }
        }
    }
}

/// Media type of a validated `data:image/...;base64,` URL.
pub fn parse_data_url(data_url: &str) -> Result<String, ScanError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| ScanError::InvalidImage("missing data: prefix".to_string()))?;

    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ScanError::InvalidImage("missing payload".to_string()))?;

    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| ScanError::InvalidImage("payload must be base64".to_string()))?;

    if !mime.starts_with("image/") || mime.len() <= "image/".len() {
        return Err(ScanError::InvalidImage(format!("unsupported type {mime:?}")));
    }

    // Base64 expands by 4/3; reject before decoding.
    if payload.len() > MAX_IMAGE_BYTES / 3 * 4 + 4 {
        return Err(ScanError::ImageTooLarge);
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ScanError::InvalidImage(e.to_string()))?;

    if bytes.is_empty() {
        return Err(ScanError::InvalidImage("empty image".to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ScanError::ImageTooLarge);
    }

    Ok(mime.to_string())
}

/// Parse the model's reply, tolerating a markdown code fence around the JSON.
pub fn parse_scanned_workouts(raw: &str) -> Result<Vec<ScannedWorkout>, ScanError> {
    let mut text = raw.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        text = stripped;
    } else if let Some(stripped) = text.strip_prefix("```") {
        text = stripped;
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped;
    }
    let text = text.trim();

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|_| ScanError::Unparseable)?;
    if !value.is_array() {
        return Err(ScanError::UnexpectedFormat);
    }

    let workouts: Vec<ScannedWorkout> =
        serde_json::from_value(value).map_err(|_| ScanError::UnexpectedFormat)?;
    if workouts.is_empty() {
        return Err(ScanError::NoWorkouts);
    }
    Ok(workouts)
}

/// Prompt for one shared coaching suggestion.
pub fn suggestion_prompt(kind: SuggestionKind, today: NaiveDate) -> String {
    match kind {
        SuggestionKind::Today => format!(
            "You are a CrossFit coach giving a brief daily motivation and focus for TODAY ({}, {}).\n\n\
             In 2-3 sentences, provide:\n\
             1. An energizing focus point for today's training\n\
             2. A quick tip for maximizing today's workout (recovery, mindset, or nutrition)\n\n\
             Be direct, motivating, and actionable. This is general advice for all athletes.",
            Weekday::of(today).name(),
            today
        ),
        SuggestionKind::Tomorrow => {
            let tomorrow = today + Duration::days(1);
            format!(
                "You are a CrossFit coach giving preparation advice for TOMORROW ({}, {}).\n\n\
                 In 2-3 sentences, provide:\n\
                 1. How to prepare tonight for tomorrow's training\n\
                 2. A recovery or nutrition tip to optimize tomorrow's performance\n\n\
                 Be specific and actionable. This is general advice for all athletes.",
                Weekday::of(tomorrow).name(),
                tomorrow
            )
        }
        SuggestionKind::Week => {
            let start = week_start(today);
            format!(
                "You are a CrossFit coach planning the training week ({} to {}).\n\n\
                 In 3-4 sentences, provide:\n\
                 1. A weekly training focus or theme\n\
                 2. How to balance intensity throughout the week\n\
                 3. One specific goal to achieve by week's end\n\n\
                 Be motivating and give practical guidance. This is general advice for all athletes.",
                start,
                start + Duration::days(6)
            )
        }
    }
}

fn period_label(days: u32) -> &'static str {
    match days {
        30 => "month",
        90 => "3 months",
        180 => "6 months",
        _ => "year",
    }
}

/// Prompt asking for a structured progress analysis.
pub fn analysis_prompt(
    report: &ProgressReport,
    preferences: Option<&AiCoachPreferences>,
) -> String {
    let summary = build_progress_summary(report, preferences);
    let goal_alignment = preferences
        .and_then(|p| p.goals.as_deref())
        .filter(|g| !g.trim().is_empty())
        .map(|goals| {
            format!(
                "**GOAL ALIGNMENT:**\nHow their current progress aligns with their stated goal: \"{goals}\""
            )
        })
        .unwrap_or_default();

    format!(
        "You are an experienced CrossFit coach analyzing an athlete's progress data.\n\n\
         {summary}\n\n\
         Provide a comprehensive analysis in this EXACT format:\n\n\
         **PROGRESS SUMMARY:**\n\
         A 2-3 sentence overview of their overall progress and what stands out.\n\n\
         **STRENGTHS:**\n\
         - List 2-3 specific things they're doing well based on the data\n\n\
         **AREAS FOR IMPROVEMENT:**\n\
         - List 2-3 specific areas where they could improve, with actionable advice\n\n\
         **RECOMMENDATIONS:**\n\
         Based on the data, give 3 specific recommendations for the next {period}:\n\
         1. [Specific goal with numbers if possible]\n\
         2. [Specific goal with numbers if possible]\n\
         3. [Specific goal with numbers if possible]\n\n\
         {goal_alignment}\n\n\
         Be specific, use their actual numbers, and be encouraging but honest. Keep it concise.",
        period = period_label(report.days),
    )
}

/// AI operations tracked by the in-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiTask {
    Scan,
    Analysis,
}

/// Marks a user's AI request as running until dropped.
pub struct InFlightGuard {
    map: Arc<DashMap<(String, AiTask), ()>>,
    key: (String, AiTask),
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.map.remove(&self.key);
    }
}

/// Entry point for all AI-backed features.
#[derive(Clone)]
pub struct AiCoach {
    grok: Option<GrokClient>,
    gemini: Option<GeminiClient>,
    in_flight: Arc<DashMap<(String, AiTask), ()>>,
}

impl AiCoach {
    pub fn new(grok: Option<GrokClient>, gemini: Option<GeminiClient>) -> Self {
        Self {
            grok,
            gemini,
            in_flight: Arc::new(DashMap::new()),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let grok = config
            .xai_api_key
            .as_deref()
            .map(GrokClient::new)
            .transpose()?;
        let gemini = config
            .gemini_api_key
            .as_deref()
            .map(GeminiClient::new)
            .transpose()?;
        let coach = Self::new(grok, gemini);

        tracing::info!(
            grok = coach.grok.is_some(),
            gemini = coach.gemini.is_some(),
            "AI coach initialized"
        );
        Ok(coach)
    }

    fn grok(&self) -> Result<&GrokClient, AppError> {
        self.grok
            .as_ref()
            .ok_or(AppError::AiNotConfigured("XAI_API_KEY"))
    }

    fn gemini(&self) -> Result<&GeminiClient, AppError> {
        self.gemini
            .as_ref()
            .ok_or(AppError::AiNotConfigured("GEMINI_API_KEY"))
    }

    /// Reserve `task` for `user_id`; fails with 409 while one is running.
    pub fn begin(&self, user_id: &str, task: AiTask) -> Result<InFlightGuard, AppError> {
        let key = (user_id.to_string(), task);
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(
                "an AI request is already in progress".to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(InFlightGuard {
                    map: self.in_flight.clone(),
                    key,
                })
            }
        }
    }

    /// Extract workouts from a photo of whiteboard or handwritten programming.
    pub async fn scan_programming(
        &self,
        user_id: &str,
        image_data_url: &str,
    ) -> Result<Vec<ScannedWorkout>, AppError> {
        let mime = parse_data_url(image_data_url)?;
        let grok = self.grok()?;
        let _guard = self.begin(user_id, AiTask::Scan)?;

        tracing::info!(user_id, mime = %mime, "Scanning programming image");

        let raw = grok.describe_image(SCAN_PROMPT, image_data_url).await?;
        let workouts = parse_scanned_workouts(&raw).inspect_err(|e| {
            tracing::warn!(user_id, error = %e, "Scan response rejected");
        })?;

        tracing::info!(user_id, count = workouts.len(), "Scan complete");
        Ok(workouts)
    }

    /// Free-text coaching analysis of a progress report.
    pub async fn analyze_progress(
        &self,
        user_id: &str,
        report: &ProgressReport,
        preferences: Option<&AiCoachPreferences>,
    ) -> Result<String, AppError> {
        let gemini = self.gemini()?;
        let _guard = self.begin(user_id, AiTask::Analysis)?;

        tracing::info!(user_id, days = report.days, "Generating progress analysis");
        gemini.generate_text(&analysis_prompt(report, preferences)).await
    }

    /// Generate the shared suggestions for `kinds`, in order.
    pub async fn generate_suggestions(
        &self,
        kinds: &[SuggestionKind],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Vec<AiSuggestion>, AppError> {
        let grok = self.grok()?;
        let mut suggestions = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            let content = grok.coach_reply(&suggestion_prompt(kind, today)).await?;
            suggestions.push(AiSuggestion {
                id: kind.document_id(today),
                kind,
                content,
                target_date: kind.target_date(today),
                generated_at: now,
            });
            tracing::debug!(kind = kind.as_str(), "Generated suggestion");
        }

        Ok(suggestions)
    }
}
