// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym applications and platform administration.
//!
//! Any signed-in user may apply to register a gym. Super admins review
//! applications; approval creates the gym and makes the applicant its
//! owner. Super admins also assign platform roles directly.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{AppUser, ApplicationStatus, Gym, GymApplication, GymContact, UserRole};
use crate::routes::{current_user, new_id, require_role};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/gym-applications", post(submit_application))
        .route("/api/gym-applications/mine", get(my_applications))
        .route("/api/admin/gym-applications", get(list_applications))
        .route(
            "/api/admin/gym-applications/{application_id}/approve",
            post(approve_application),
        )
        .route(
            "/api/admin/gym-applications/{application_id}/reject",
            post(reject_application),
        )
        .route("/api/admin/users/{user_id}/role", put(set_role))
}

async fn require_super_admin(state: &AppState, user: &AuthUser) -> Result<AppUser> {
    let caller = current_user(state, &user.user_id).await?;
    require_role(&caller, UserRole::SuperAdmin)?;
    Ok(caller)
}

// ─── Applications ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    #[validate(length(min = 1, max = 100))]
    pub gym_name: String,
    /// Minutes east of UTC
    #[validate(range(min = -720, max = 840))]
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[validate(nested)]
    #[serde(default)]
    pub contact: GymContact,
}

impl SubmitApplicationRequest {
    fn check(&self) -> Result<()> {
        self.validate()?;
        if self.gym_name.trim().is_empty() {
            return Err(AppError::BadRequest("gymName must not be blank".to_string()));
        }
        Ok(())
    }
}

/// Apply to register a gym. One pending application per user.
async fn submit_application(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SubmitApplicationRequest>,
) -> Result<(StatusCode, Json<GymApplication>)> {
    body.check()?;

    let applicant = current_user(&state, &user.user_id).await?;
    let existing = state
        .db
        .list_gym_applications_for_user(&applicant.id)
        .await?;
    if existing
        .iter()
        .any(|a| a.status == ApplicationStatus::Pending)
    {
        return Err(AppError::Conflict(
            "an application is already pending".to_string(),
        ));
    }

    let application = GymApplication {
        id: new_id(),
        user_id: applicant.id.clone(),
        user_email: applicant.email.clone(),
        user_display_name: Some(applicant.display_label()),
        gym_name: body.gym_name.trim().to_string(),
        utc_offset_minutes: body.utc_offset_minutes,
        contact: body.contact,
        status: ApplicationStatus::Pending,
        submitted_at: Utc::now(),
        reviewed_at: None,
        reviewed_by: None,
        approved_gym_id: None,
        rejection_reason: None,
    };
    state.db.upsert_gym_application(&application).await?;

    tracing::info!(
        application_id = %application.id,
        user_id = %applicant.id,
        "Gym application submitted"
    );
    Ok((StatusCode::CREATED, Json(application)))
}

async fn my_applications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<GymApplication>>> {
    Ok(Json(
        state
            .db
            .list_gym_applications_for_user(&user.user_id)
            .await?,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListApplicationsQuery {
    pub status: Option<ApplicationStatus>,
}

async fn list_applications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<Json<Vec<GymApplication>>> {
    require_super_admin(&state, &user).await?;
    Ok(Json(state.db.list_gym_applications(query.status).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedApplication {
    pub application: GymApplication,
    pub gym: Gym,
}

async fn approve_application(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(application_id): Path<String>,
) -> Result<Json<ApprovedApplication>> {
    let reviewer = require_super_admin(&state, &user).await?;
    let (application, gym) = state
        .db
        .approve_gym_application(&application_id, &reviewer.id)
        .await?;
    Ok(Json(ApprovedApplication { application, gym }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RejectApplicationRequest {
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

async fn reject_application(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(application_id): Path<String>,
    Json(body): Json<RejectApplicationRequest>,
) -> Result<Json<GymApplication>> {
    body.validate()?;
    let reason = body.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::BadRequest("a rejection reason is required".to_string()));
    }

    let reviewer = require_super_admin(&state, &user).await?;
    let reviewer_id = reviewer.id.clone();
    let (application, _) = state
        .db
        .modify_gym_application(&application_id, move |application| {
            if application.status != ApplicationStatus::Pending {
                return Err(AppError::Conflict(
                    "application was already reviewed".to_string(),
                ));
            }
            application.reject(&reviewer_id, &reason);
            Ok(())
        })
        .await?;

    tracing::info!(
        application_id = %application.id,
        rejected_by = %reviewer.id,
        "Gym application rejected"
    );
    Ok(Json(application))
}

// ─── Roles ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: UserRole,
}

/// Assign a platform role. Super admins cannot change their own role.
async fn set_role(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<AppUser>> {
    if user_id == user.user_id {
        return Err(AppError::BadRequest("cannot change your own role".to_string()));
    }
    let admin = require_super_admin(&state, &user).await?;

    let role = body.role;
    let (target, previous) = state
        .db
        .modify_user(&user_id, move |target| {
            Ok(std::mem::replace(&mut target.role, role))
        })
        .await?;

    tracing::info!(
        user_id = %target.id,
        previous = ?previous,
        role = ?target.role,
        changed_by = %admin.id,
        "Role changed"
    );
    Ok(Json(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_request_checks() {
        let ok: SubmitApplicationRequest = serde_json::from_str(
            r#"{"gymName":"CrossFit Harbor","utcOffsetMinutes":-300,
                "contact":{"city":"Portland","website":"https://harbor.example.com"}}"#,
        )
        .unwrap();
        assert!(ok.check().is_ok());

        let blank: SubmitApplicationRequest =
            serde_json::from_str(r#"{"gymName":"   "}"#).unwrap();
        assert!(matches!(blank.check(), Err(AppError::BadRequest(_))));

        let bad_offset: SubmitApplicationRequest =
            serde_json::from_str(r#"{"gymName":"Box","utcOffsetMinutes":2000}"#).unwrap();
        assert!(bad_offset.check().is_err());
    }

    #[test]
    fn test_only_super_admins_pass_role_check() {
        let mut user = AppUser::new("u1", "u1@example.com");
        for role in [UserRole::Athlete, UserRole::Coach, UserRole::Owner] {
            user.role = role;
            assert!(matches!(
                require_role(&user, UserRole::SuperAdmin),
                Err(AppError::Forbidden(_))
            ));
        }
        user.role = UserRole::SuperAdmin;
        assert!(require_role(&user, UserRole::SuperAdmin).is_ok());
    }

    #[test]
    fn test_role_request_wire_names() {
        let body: SetRoleRequest = serde_json::from_str(r#"{"role":"owner"}"#).unwrap();
        assert_eq!(body.role, UserRole::Owner);
        assert!(serde_json::from_str::<SetRoleRequest>(r#"{"role":"root"}"#).is_err());
    }

    #[test]
    fn test_list_query_status() {
        let query: ListApplicationsQuery =
            serde_json::from_str(r#"{"status":"rejected"}"#).unwrap();
        assert_eq!(query.status, Some(ApplicationStatus::Rejected));
    }
}
