// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduler-triggered routes.
//!
//! These endpoints are called by a cron scheduler, not directly by users.
//! They are protected by the shared cron secret (see `middleware::cron_auth`).

use crate::error::Result;
use crate::models::SuggestionBatch;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Task routes (called by the scheduler).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/ai-suggestions", post(generate_suggestions))
}

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionTaskQuery {
    /// Defaults to the scheduled batch for today
    pub batch: Option<SuggestionBatch>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionTaskResponse {
    pub batch: SuggestionBatch,
    pub generated: Vec<String>,
}

/// Generate and store the shared coaching suggestions.
async fn generate_suggestions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SuggestionTaskQuery>,
) -> Result<Json<SuggestionTaskResponse>> {
    let now = Utc::now();
    let today = now.date_naive();
    let batch = query
        .batch
        .unwrap_or_else(|| SuggestionBatch::scheduled_for(today));

    tracing::info!(batch = ?batch, date = %today, "Generating AI suggestions");

    let suggestions = state
        .coach
        .generate_suggestions(batch.kinds(), today, now)
        .await?;

    let mut generated = Vec::with_capacity(suggestions.len());
    for suggestion in &suggestions {
        state.db.upsert_suggestion(suggestion).await?;
        generated.push(suggestion.id.clone());
    }

    tracing::info!(count = generated.len(), "AI suggestions stored");
    Ok(Json(SuggestionTaskResponse { batch, generated }))
}
