// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress analytics and AI analysis.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::AppUser;
use crate::routes::{current_user, is_gym_staff};
use crate::services::progress::window_days;
use crate::services::{compute_progress, ProgressReport};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/progress", get(get_progress))
        .route("/api/progress/analysis", post(analyze_progress))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressQuery {
    pub days: Option<u32>,
    /// Another athlete, for coaches
    pub user_id: Option<String>,
}

async fn build_report(state: &AppState, user_id: &str, days: u32) -> Result<ProgressReport> {
    let (lifts, wods, skills) = futures_util::try_join!(
        state.db.list_lift_results(user_id),
        state.db.list_workout_logs(user_id),
        state.db.list_skill_logs(user_id),
    )?;
    Ok(compute_progress(&lifts, &wods, &skills, days, Utc::now()))
}

/// Coaches may view athletes in gyms they staff.
async fn require_progress_access(state: &AppState, caller: &AppUser, athlete_id: &str) -> Result<()> {
    if !caller.role.can_view_member_progress() {
        return Err(AppError::forbidden("coaches only"));
    }
    let gyms = state.db.list_gyms_for_user(athlete_id).await?;
    if gyms.iter().any(|gym| is_gym_staff(gym, caller)) {
        Ok(())
    } else {
        Err(AppError::forbidden("athlete is not in a gym you coach"))
    }
}

async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ProgressReport>> {
    let days = window_days(query.days).map_err(AppError::BadRequest)?;

    let athlete_id = match query.user_id {
        Some(other) if other != user.user_id => {
            let caller = current_user(&state, &user.user_id).await?;
            require_progress_access(&state, &caller, &other).await?;
            other
        }
        _ => user.user_id.clone(),
    };

    Ok(Json(build_report(&state, &athlete_id, days).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub analysis: String,
    pub report: ProgressReport,
}

/// Free-text coaching analysis of the caller's own progress.
async fn analyze_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<AnalysisResponse>> {
    let days = window_days(query.days).map_err(AppError::BadRequest)?;

    let profile = current_user(&state, &user.user_id).await?;
    if !profile.has_ai_coach_access() {
        return Err(AppError::forbidden("AI coach is not enabled for this account"));
    }

    let report = build_report(&state, &profile.id, days).await?;
    let analysis = state
        .coach
        .analyze_progress(&profile.id, &report, profile.ai_coach_preferences.as_ref())
        .await?;

    Ok(Json(AnalysisResponse { analysis, report }))
}
