// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AI coach routes: programming scans and shared daily suggestions.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{AiSuggestion, SuggestionKind};
use crate::routes::current_user;
use crate::services::coach::{parse_data_url, MAX_IMAGE_BYTES};
use crate::services::ScannedWorkout;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Room for a maximum-size image after base64 expansion, plus the JSON envelope.
const SCAN_BODY_LIMIT: usize = MAX_IMAGE_BYTES / 3 * 4 + 64 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/ai/scan",
            post(scan_programming).layer(DefaultBodyLimit::max(SCAN_BODY_LIMIT)),
        )
        .route("/api/ai/suggestions", get(get_suggestions))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// `data:image/...;base64,...`
    pub image: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub workouts: Vec<ScannedWorkout>,
}

/// Read workouts off a photo of a whiteboard or notebook.
async fn scan_programming(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ScanRequest>,
) -> Result<Json<ScanResponse>> {
    parse_data_url(&body.image)?;

    let profile = current_user(&state, &user.user_id).await?;
    if !profile.has_ai_coach_access() && !profile.role.can_program_workouts() {
        return Err(AppError::forbidden("AI coach is not enabled for this account"));
    }

    let workouts = state
        .coach
        .scan_programming(&profile.id, &body.image)
        .await?;
    Ok(Json(ScanResponse { workouts }))
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsResponse {
    pub today: Option<AiSuggestion>,
    pub tomorrow: Option<AiSuggestion>,
    pub week: Option<AiSuggestion>,
}

/// Current suggestions. Missing ones have not been generated yet.
async fn get_suggestions(State(state): State<Arc<AppState>>) -> Result<Json<SuggestionsResponse>> {
    let today = Utc::now().date_naive();

    let today_id = SuggestionKind::Today.document_id(today);
    let tomorrow_id = SuggestionKind::Tomorrow.document_id(today);
    let week_id = SuggestionKind::Week.document_id(today);
    let (today_doc, tomorrow_doc, week_doc) = futures_util::try_join!(
        state.db.get_suggestion(&today_id),
        state.db.get_suggestion(&tomorrow_id),
        state.db.get_suggestion(&week_id),
    )?;

    Ok(Json(SuggestionsResponse {
        today: today_doc,
        tomorrow: tomorrow_doc,
        week: week_doc,
    }))
}
