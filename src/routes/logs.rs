// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Training logs: WOD results, lifts and skill practice.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::log::{percentage_weights, PercentageWeight};
use crate::models::{
    AppUser, Category, LeaderboardEntry, LiftResult, ResultType, SkillLog, WodScore, WorkoutLog,
};
use crate::routes::{current_user, new_id};
use crate::services::leaderboard::{is_lift_personal_record, is_wod_personal_record};
use crate::services::normalize_workout_name;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/logs/wods", post(log_wod).get(list_wods))
        .route("/api/logs/wods/{log_id}", put(update_wod).delete(delete_wod))
        .route("/api/logs/lifts", post(log_lift).get(list_lifts))
        .route("/api/logs/lifts/{lift_id}", delete(delete_lift))
        .route("/api/lifts/{lift_name}/percentages", get(lift_percentages))
        .route("/api/logs/skills", post(log_skill).get(list_skills))
}

// ─── WODs ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogWodRequest {
    #[serde(default)]
    pub scheduled_workout_id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub wod_title: String,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub wod_description: String,
    pub workout_date: DateTime<Utc>,
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
    pub result_type: ResultType,
    #[validate(range(min = 1, max = 86400))]
    #[serde(default)]
    pub time_in_seconds: Option<u32>,
    #[validate(range(max = 10000))]
    #[serde(default)]
    pub rounds: Option<u32>,
    #[validate(range(max = 100000))]
    #[serde(default)]
    pub reps: Option<u32>,
    #[validate(range(exclusive_min = 0.0, max = 2000.0))]
    #[serde(default)]
    pub weight: Option<f64>,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub category: Category,
}

impl LogWodRequest {
    fn score(&self) -> WodScore {
        WodScore {
            time_in_seconds: self.time_in_seconds,
            rounds: self.rounds,
            reps: self.reps,
            weight: self.weight,
        }
    }

    fn check(&self) -> Result<()> {
        self.validate()?;
        if self.wod_title.trim().is_empty() {
            return Err(AppError::BadRequest("wodTitle must not be blank".to_string()));
        }
        self.score()
            .check(self.result_type)
            .map_err(AppError::BadRequest)
    }

    /// Replace the content of an existing log, keeping its identity.
    fn apply_to(self, log: &mut WorkoutLog) {
        log.scheduled_workout_id = self.scheduled_workout_id;
        log.wod_title = self.wod_title.trim().to_string();
        log.wod_description = self.wod_description;
        log.workout_date = self.workout_date;
        if let Some(completed) = self.completed_date {
            log.completed_date = completed;
        }
        log.result_type = self.result_type;
        log.time_in_seconds = self.time_in_seconds;
        log.rounds = self.rounds;
        log.reps = self.reps;
        log.weight = self.weight;
        log.notes = self.notes;
        log.category = self.category;
    }

    fn into_log(self, user_id: &str, now: DateTime<Utc>) -> WorkoutLog {
        WorkoutLog {
            id: new_id(),
            user_id: user_id.to_string(),
            scheduled_workout_id: self.scheduled_workout_id,
            wod_title: self.wod_title.trim().to_string(),
            wod_description: self.wod_description,
            workout_date: self.workout_date,
            completed_date: self.completed_date.unwrap_or(now),
            result_type: self.result_type,
            time_in_seconds: self.time_in_seconds,
            rounds: self.rounds,
            reps: self.reps,
            weight: self.weight,
            notes: self.notes,
            category: self.category,
            is_personal_record: false,
            created_at: now,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLogView {
    #[serde(flatten)]
    pub log: WorkoutLog,
    pub result_summary: String,
}

impl From<WorkoutLog> for WorkoutLogView {
    fn from(log: WorkoutLog) -> Self {
        Self {
            result_summary: log.result_summary(),
            log,
        }
    }
}

/// Gym name shown on leaderboard entries for programmed workouts.
async fn gym_name_for(state: &AppState, scheduled_workout_id: Option<&str>) -> Result<Option<String>> {
    let Some(workout_id) = scheduled_workout_id else {
        return Ok(None);
    };
    let Some(gym_id) = state
        .db
        .get_scheduled_workout(workout_id)
        .await?
        .and_then(|w| w.gym_id)
    else {
        return Ok(None);
    };
    Ok(state.db.get_gym(&gym_id).await?.map(|gym| gym.name))
}

/// Record a WOD result, flag PRs and publish it to the leaderboard
/// unless the athlete is hidden.
async fn log_wod(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<LogWodRequest>,
) -> Result<(StatusCode, Json<WorkoutLogView>)> {
    body.check()?;

    let profile = current_user(&state, &user.user_id).await?;
    let history = state.db.list_workout_logs(&profile.id).await?;

    let mut log = body.into_log(&profile.id, Utc::now());
    log.is_personal_record = is_wod_personal_record(&log, &history);

    let entry = leaderboard_entry_for(&state, &log, &profile).await?;

    state.db.save_workout_log(&log, entry.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(log.into())))
}

/// Leaderboard entry for a log, or None when the athlete is hidden.
async fn leaderboard_entry_for(
    state: &AppState,
    log: &WorkoutLog,
    profile: &AppUser,
) -> Result<Option<LeaderboardEntry>> {
    if profile.hide_from_leaderboards {
        return Ok(None);
    }
    let gym_name = gym_name_for(state, log.scheduled_workout_id.as_deref()).await?;
    Ok(Some(LeaderboardEntry::from_log(log, profile, gym_name)))
}

/// Replace one of the caller's results. PR status and the leaderboard
/// entry are recomputed from the new score.
async fn update_wod(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(log_id): Path<String>,
    Json(body): Json<LogWodRequest>,
) -> Result<Json<WorkoutLogView>> {
    body.check()?;

    let mut log = load_own_log(&state, &user.user_id, &log_id).await?;
    let profile = current_user(&state, &user.user_id).await?;
    let mut history = state.db.list_workout_logs(&profile.id).await?;
    history.retain(|l| l.id != log.id);

    body.apply_to(&mut log);
    log.is_personal_record = is_wod_personal_record(&log, &history);

    let entry = leaderboard_entry_for(&state, &log, &profile).await?;
    state.db.save_workout_log(&log, entry.as_ref()).await?;
    Ok(Json(log.into()))
}

async fn list_wods(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<WorkoutLogView>>> {
    let logs = state.db.list_workout_logs(&user.user_id).await?;
    Ok(Json(logs.into_iter().map(WorkoutLogView::from).collect()))
}

async fn load_own_log(state: &AppState, user_id: &str, log_id: &str) -> Result<WorkoutLog> {
    let log = state
        .db
        .get_workout_log(log_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("workout log {log_id}")))?;
    if log.user_id != user_id {
        return Err(AppError::forbidden("not your workout log"));
    }
    Ok(log)
}

/// Delete one of the caller's logs along with its leaderboard entry.
async fn delete_wod(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(log_id): Path<String>,
) -> Result<StatusCode> {
    load_own_log(&state, &user.user_id, &log_id).await?;
    state.db.delete_workout_log(&log_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Lifts ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogLiftRequest {
    #[validate(length(min = 1, max = 100))]
    pub lift_title: String,
    #[validate(range(exclusive_min = 0.0, max = 2000.0))]
    pub weight: f64,
    #[validate(range(min = 1, max = 100))]
    pub reps: u32,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiftResultView {
    #[serde(flatten)]
    pub lift: LiftResult,
    pub estimated_one_rep_max: f64,
}

impl From<LiftResult> for LiftResultView {
    fn from(lift: LiftResult) -> Self {
        Self {
            estimated_one_rep_max: (lift.estimated_one_rep_max() * 10.0).round() / 10.0,
            lift,
        }
    }
}

async fn log_lift(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<LogLiftRequest>,
) -> Result<(StatusCode, Json<LiftResultView>)> {
    body.validate()?;
    if body.lift_title.trim().is_empty() {
        return Err(AppError::BadRequest("liftTitle must not be blank".to_string()));
    }

    let profile = current_user(&state, &user.user_id).await?;
    let history = state.db.list_lift_results(&profile.id).await?;

    let mut lift = LiftResult {
        id: new_id(),
        user_id: profile.id.clone(),
        user_name: profile.display_label(),
        lift_title: body.lift_title.trim().to_string(),
        weight: body.weight,
        reps: body.reps,
        date: body.date.unwrap_or_else(Utc::now),
        notes: body.notes,
        is_personal_record: false,
    };
    lift.is_personal_record = is_lift_personal_record(&lift, &history);

    state.db.save_lift_result(&lift).await?;
    tracing::info!(
        user_id = %profile.id,
        lift = %lift.lift_title,
        personal_record = lift.is_personal_record,
        "Lift logged"
    );
    Ok((StatusCode::CREATED, Json(lift.into())))
}

async fn delete_lift(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(lift_id): Path<String>,
) -> Result<StatusCode> {
    let lift = state
        .db
        .get_lift_result(&lift_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("lift result {lift_id}")))?;
    if lift.user_id != user.user_id {
        return Err(AppError::forbidden("not your lift result"));
    }

    state.db.delete_lift_result(&lift_id).await?;
    tracing::info!(user_id = %user.user_id, lift_id = %lift_id, "Lift deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct LiftFilter {
    /// Matched on normalized name
    pub lift: Option<String>,
}

async fn list_lifts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(filter): Query<LiftFilter>,
) -> Result<Json<Vec<LiftResultView>>> {
    let wanted = filter.lift.as_deref().map(normalize_workout_name);
    let lifts = state.db.list_lift_results(&user.user_id).await?;

    Ok(Json(
        lifts
            .into_iter()
            .filter(|l| {
                wanted
                    .as_deref()
                    .is_none_or(|name| normalize_workout_name(&l.lift_title) == name)
            })
            .map(LiftResultView::from)
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentageTable {
    pub lift_title: String,
    pub one_rep_max: f64,
    pub percentages: Vec<PercentageWeight>,
}

/// Best estimated 1RM for a lift, from any rep scheme.
fn best_one_rep_max<'a>(lifts: &'a [LiftResult], lift_name: &str) -> Option<(&'a LiftResult, f64)> {
    let wanted = normalize_workout_name(lift_name);
    lifts
        .iter()
        .filter(|l| normalize_workout_name(&l.lift_title) == wanted)
        .map(|l| (l, l.estimated_one_rep_max()))
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

async fn lift_percentages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(lift_name): Path<String>,
) -> Result<Json<PercentageTable>> {
    let lifts = state.db.list_lift_results(&user.user_id).await?;
    let (best, one_rep_max) = best_one_rep_max(&lifts, &lift_name)
        .ok_or_else(|| AppError::NotFound(format!("no results for {lift_name}")))?;

    let one_rep_max = (one_rep_max * 10.0).round() / 10.0;
    Ok(Json(PercentageTable {
        lift_title: best.lift_title.clone(),
        one_rep_max,
        percentages: percentage_weights(one_rep_max),
    }))
}

// ─── Skills ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogSkillRequest {
    #[validate(length(min = 1, max = 100))]
    pub skill_name: String,
    #[validate(range(max = 10000))]
    #[serde(default)]
    pub reps: Option<u32>,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

async fn log_skill(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<LogSkillRequest>,
) -> Result<(StatusCode, Json<SkillLog>)> {
    body.validate()?;
    if body.skill_name.trim().is_empty() {
        return Err(AppError::BadRequest("skillName must not be blank".to_string()));
    }

    let skill = SkillLog {
        id: new_id(),
        user_id: user.user_id.clone(),
        skill_name: body.skill_name.trim().to_string(),
        reps: body.reps,
        notes: body.notes,
        date: body.date.unwrap_or_else(Utc::now),
    };
    state.db.save_skill_log(&skill).await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

async fn list_skills(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SkillLog>>> {
    Ok(Json(state.db.list_skill_logs(&user.user_id).await?))
}
