// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes: exchange a Firebase ID token for a session cookie.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::{AppUser, UserRole};
use crate::services::firebase_auth::{FirebaseIdentity, TokenError};
use crate::AppState;

/// Non-HttpOnly hint so the frontend knows a session exists.
pub const LOGGED_IN_COOKIE: &str = "wod_logged_in";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/session", post(create_session))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[validate(length(min = 1, max = 4096))]
    id_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub user: AppUser,
    pub new_user: bool,
}

fn session_cookie(config: &Config, name: &'static str, value: String, http_only: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(http_only)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

fn removal_cookie(config: &Config, name: &'static str, http_only: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(http_only)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::ZERO)
        .build()
}

/// Verified sign-ins from configured addresses become super admins.
fn grants_super_admin(config: &Config, identity: &FirebaseIdentity) -> bool {
    identity.email_verified
        && identity
            .email
            .as_deref()
            .is_some_and(|email| config.is_super_admin_email(email))
}

/// Find the profile for a verified identity, creating it on first sign-in.
async fn get_or_create_user(state: &AppState, identity: &FirebaseIdentity) -> Result<(AppUser, bool)> {
    let super_admin = grants_super_admin(&state.config, identity);

    if let Some(mut user) = state.db.get_user(&identity.uid).await? {
        if super_admin && user.role != UserRole::SuperAdmin {
            user.role = UserRole::SuperAdmin;
            state.db.upsert_user(&user).await?;
            tracing::info!(user_id = %user.id, "Promoted configured super admin");
        }
        return Ok((user, false));
    }

    let email = identity
        .email
        .clone()
        .ok_or_else(|| AppError::BadRequest("account has no email address".to_string()))?;

    let mut user = AppUser::new(&identity.uid, email);
    user.display_name = identity.name.clone();
    if super_admin {
        user.role = UserRole::SuperAdmin;
    }
    state.db.upsert_user(&user).await?;

    tracing::info!(user_id = %user.id, role = ?user.role, "Created user profile on first sign-in");
    Ok((user, true))
}

/// Verify a Firebase ID token and start a session.
async fn create_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SessionRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    body.validate()?;

    let identity = state
        .token_verifier
        .verify_id_token(&body.id_token)
        .await
        .map_err(|err| match err {
            TokenError::Invalid(reason) => {
                tracing::warn!(reason = %reason, "Rejected Firebase ID token");
                AppError::InvalidToken
            }
            TokenError::Unavailable(reason) => {
                AppError::Internal(anyhow::anyhow!("token verification unavailable: {reason}"))
            }
        })?;

    let (user, new_user) = get_or_create_user(&state, &identity).await?;

    let token = create_jwt(&user.id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let jar = jar
        .add(session_cookie(&state.config, SESSION_COOKIE, token.clone(), true))
        .add(session_cookie(&state.config, LOGGED_IN_COOKIE, "1".to_string(), false));

    tracing::info!(user_id = %user.id, new_user, "Session created");

    Ok((
        jar,
        Json(SessionResponse {
            token,
            user,
            new_user,
        }),
    ))
}

/// Clear session cookies.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar
        .add(removal_cookie(&state.config, SESSION_COOKIE, true))
        .add(removal_cookie(&state.config, LOGGED_IN_COOKIE, false));

    (jar, StatusCode::NO_CONTENT)
}
