// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod admin;
pub mod ai;
pub mod auth;
pub mod groups;
pub mod gyms;
pub mod leaderboard;
pub mod logs;
pub mod progress;
pub mod schedule;
pub mod tasks;
pub mod users;

use crate::error::{AppError, Result};
use crate::middleware::auth::require_auth;
use crate::middleware::cron_auth::{require_cron_secret, CRON_SECRET_HEADER};
use crate::models::{AppUser, Gym, UserRole};
use crate::AppState;
use axum::http::{header, HeaderName, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(CRON_SECRET_HEADER),
        ]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes());

    // Scheduler-triggered routes (cron secret required)
    let task_routes = tasks::routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_cron_secret,
    ));

    // Protected routes (session required)
    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(admin::routes())
        .merge(gyms::routes())
        .merge(groups::routes())
        .merge(schedule::routes())
        .merge(logs::routes())
        .merge(leaderboard::routes())
        .merge(progress::routes())
        .merge(ai::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(task_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

// ─── Shared Handler Helpers ──────────────────────────────────

/// Load the caller's profile. A valid session without a profile is treated
/// as signed out.
pub(crate) async fn current_user(state: &AppState, user_id: &str) -> Result<AppUser> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

pub(crate) async fn load_gym(state: &AppState, gym_id: &str) -> Result<Gym> {
    state
        .db
        .get_gym(gym_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("gym {gym_id}")))
}

/// Require a minimum platform role.
pub(crate) fn require_role(user: &AppUser, minimum: UserRole) -> Result<()> {
    if user.role.has_permission(minimum) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "requires {} role",
            minimum.display_name()
        )))
    }
}

/// Gym staff (owner or coach) or a platform super admin.
pub(crate) fn is_gym_staff(gym: &Gym, user: &AppUser) -> bool {
    gym.is_staff(&user.id) || user.role == UserRole::SuperAdmin
}

pub(crate) fn require_gym_staff(gym: &Gym, user: &AppUser) -> Result<()> {
    if is_gym_staff(gym, user) {
        Ok(())
    } else {
        Err(AppError::forbidden("gym staff only"))
    }
}

pub(crate) fn require_gym_member(gym: &Gym, user: &AppUser) -> Result<()> {
    if gym.is_member(&user.id) || user.role == UserRole::SuperAdmin {
        Ok(())
    } else {
        Err(AppError::forbidden("gym members only"))
    }
}

/// Fresh document ID.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
