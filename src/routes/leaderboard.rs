// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboards across all gyms.

use crate::db::firestore::HISTORY_LIMIT;
use crate::error::{AppError, Result};
use crate::models::{Category, Gender};
use crate::services::matching::{SimilarName, DEFAULT_SIMILARITY_THRESHOLD};
use crate::services::{build_leaderboards, find_similar_names, normalize_workout_name};
use crate::services::{LeaderboardFilter, WorkoutLeaderboard};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Most name suggestions returned.
const MAX_SUGGESTIONS: usize = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/leaderboard/similar", get(similar_workouts))
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub workout: Option<String>,
    pub gender: Option<Gender>,
    pub category: Option<Category>,
}

async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<WorkoutLeaderboard>>> {
    let workout = query
        .workout
        .filter(|w| !normalize_workout_name(w).is_empty());
    let normalized = workout.as_deref().map(normalize_workout_name);

    let entries = state
        .db
        .list_leaderboard_entries(normalized.as_deref(), HISTORY_LIMIT)
        .await?;

    let filter = LeaderboardFilter {
        workout,
        gender: query.gender,
        category: query.category,
    };
    Ok(Json(build_leaderboards(entries, &filter)))
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub name: String,
    pub threshold: Option<f64>,
}

fn threshold(requested: Option<f64>) -> Result<f64> {
    match requested {
        None => Ok(DEFAULT_SIMILARITY_THRESHOLD),
        Some(t) if (0.0..=1.0).contains(&t) => Ok(t),
        Some(t) => Err(AppError::BadRequest(format!(
            "threshold must be between 0 and 1, got {t}"
        ))),
    }
}

/// Workout names already on the leaderboard that resemble `name`.
async fn similar_workouts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SimilarQuery>,
) -> Result<Json<Vec<SimilarName>>> {
    let threshold = threshold(query.threshold)?;
    if normalize_workout_name(&query.name).is_empty() {
        return Err(AppError::BadRequest("name must not be blank".to_string()));
    }

    let entries = state.db.list_leaderboard_entries(None, HISTORY_LIMIT).await?;
    let mut matches = find_similar_names(
        &query.name,
        entries.iter().map(|e| e.original_workout_name.as_str()),
        threshold,
    );
    matches.truncate(MAX_SUGGESTIONS);
    Ok(Json(matches))
}
