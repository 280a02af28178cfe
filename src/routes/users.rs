// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes for the signed-in user.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{AiCoachPreferences, AppUser, Gender};
use crate::routes::current_user;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me).put(update_me))
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AppUser>> {
    Ok(Json(current_user(&state, &user.user_id).await?))
}

/// Partial profile update. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 30))]
    pub username: Option<String>,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 100))]
    pub display_name: Option<String>,
    pub gender: Option<Gender>,
    pub hide_from_leaderboards: Option<bool>,
    #[validate(nested)]
    pub ai_coach_preferences: Option<CoachPreferencesInput>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CoachPreferencesInput {
    #[validate(length(max = 1000))]
    pub goals: Option<String>,
    #[validate(length(max = 1000))]
    pub injuries: Option<String>,
}

/// Blank strings clear an optional field.
fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl UpdateProfileRequest {
    fn apply(self, profile: &mut AppUser) {
        if let Some(username) = self.username {
            profile.username = non_blank(username);
        }
        if let Some(first_name) = self.first_name {
            profile.first_name = non_blank(first_name);
        }
        if let Some(last_name) = self.last_name {
            profile.last_name = non_blank(last_name);
        }
        if let Some(display_name) = self.display_name {
            profile.display_name = non_blank(display_name);
        }
        if let Some(gender) = self.gender {
            profile.gender = Some(gender);
        }
        if let Some(hide) = self.hide_from_leaderboards {
            profile.hide_from_leaderboards = hide;
        }
        if let Some(prefs) = self.ai_coach_preferences {
            profile.ai_coach_preferences = Some(AiCoachPreferences {
                goals: prefs.goals.and_then(non_blank),
                injuries: prefs.injuries.and_then(non_blank),
            });
        }
    }
}

/// Update the current user's profile.
///
/// Turning on `hideFromLeaderboards` removes the user's existing
/// leaderboard entries.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<AppUser>> {
    body.validate()?;

    let mut profile = current_user(&state, &user.user_id).await?;
    let was_hidden = profile.hide_from_leaderboards;

    body.apply(&mut profile);
    state.db.upsert_user(&profile).await?;

    if profile.hide_from_leaderboards && !was_hidden {
        let removed = state
            .db
            .delete_leaderboard_entries_for_user(&profile.id)
            .await?;
        tracing::info!(user_id = %profile.id, removed, "User hidden from leaderboards");
    }

    Ok(Json(profile))
}
