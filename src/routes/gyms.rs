// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gym routes: creation, membership requests and staff management.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    Gym, GymContact, GymMembershipRequest, MembershipRequestStatus, UserRole, WorkoutGroup,
};
use crate::routes::{current_user, load_gym, new_id, require_gym_staff, require_role};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Cap on the gym directory listing.
const GYM_DIRECTORY_LIMIT: u32 = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/gyms", get(list_gyms).post(create_gym))
        .route("/api/gyms/{gym_id}", get(get_gym).put(update_gym))
        .route("/api/gyms/{gym_id}/join", post(request_to_join))
        .route("/api/gyms/{gym_id}/requests", get(list_requests))
        .route(
            "/api/gyms/{gym_id}/requests/{request_id}/approve",
            post(approve_request),
        )
        .route(
            "/api/gyms/{gym_id}/requests/{request_id}/deny",
            post(deny_request),
        )
        .route("/api/gyms/{gym_id}/coaches/{user_id}", put(add_coach))
        .route("/api/gyms/{gym_id}/members/{user_id}", delete(remove_member))
}

// ─── Gyms ────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListGymsQuery {
    /// Whole directory instead of the caller's gyms
    #[serde(default)]
    pub all: bool,
}

async fn list_gyms(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListGymsQuery>,
) -> Result<Json<Vec<Gym>>> {
    let gyms = if query.all {
        state.db.list_gyms(GYM_DIRECTORY_LIMIT).await?
    } else {
        state.db.list_gyms_for_user(&user.user_id).await?
    };
    Ok(Json(gyms))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGymRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Minutes east of UTC
    #[validate(range(min = -720, max = 840))]
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[validate(nested)]
    #[serde(default)]
    pub contact: GymContact,
}

/// Create a gym owned by the caller, together with its default group.
async fn create_gym(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateGymRequest>,
) -> Result<(StatusCode, Json<Gym>)> {
    body.validate()?;
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("gym name must not be blank".to_string()));
    }

    let owner = current_user(&state, &user.user_id).await?;
    if !owner.role.can_manage_gyms() {
        return Err(AppError::forbidden("only gym owners can create gyms"));
    }

    let mut gym = Gym::new(name, &owner.id, body.utc_offset_minutes);
    gym.contact = body.contact;
    let default_group = WorkoutGroup::default_for_gym(&gym.id, &owner.id);

    state.db.create_gym(&gym, &default_group).await?;
    Ok((StatusCode::CREATED, Json(gym)))
}

async fn get_gym(
    State(state): State<Arc<AppState>>,
    Path(gym_id): Path<String>,
) -> Result<Json<Gym>> {
    Ok(Json(load_gym(&state, &gym_id).await?))
}

/// Gym settings edit. Absent fields are left unchanged; `contact` replaces
/// the stored details as a whole.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGymRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(range(min = -720, max = 840))]
    pub utc_offset_minutes: Option<i32>,
    #[validate(nested)]
    pub contact: Option<GymContact>,
}

impl UpdateGymRequest {
    fn apply(&self, gym: &mut Gym) {
        if let Some(name) = &self.name {
            gym.name = name.trim().to_string();
        }
        if let Some(offset) = self.utc_offset_minutes {
            gym.utc_offset_minutes = offset;
        }
        if let Some(contact) = &self.contact {
            gym.contact = contact.clone();
        }
    }
}

/// Edit gym settings. Owner or super admin.
async fn update_gym(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(gym_id): Path<String>,
    Json(body): Json<UpdateGymRequest>,
) -> Result<Json<Gym>> {
    body.validate()?;
    if body.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("gym name must not be blank".to_string()));
    }

    let gym = load_gym(&state, &gym_id).await?;
    let caller = current_user(&state, &user.user_id).await?;
    if !gym.is_owner(&caller.id) {
        require_role(&caller, UserRole::SuperAdmin)?;
    }

    let (gym, _) = state
        .db
        .modify_gym(&gym_id, move |gym| {
            body.apply(gym);
            Ok(())
        })
        .await?;

    tracing::info!(gym_id = %gym.id, updated_by = %caller.id, "Gym updated");
    Ok(Json(gym))
}

// ─── Membership Requests ─────────────────────────────────────

/// Ask to join a gym. Staff approve or deny the request.
async fn request_to_join(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(gym_id): Path<String>,
) -> Result<(StatusCode, Json<GymMembershipRequest>)> {
    let gym = load_gym(&state, &gym_id).await?;
    if gym.is_member(&user.user_id) {
        return Err(AppError::Conflict("already a member of this gym".to_string()));
    }
    if state
        .db
        .find_pending_request(&gym_id, &user.user_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("a request is already pending".to_string()));
    }

    let profile = current_user(&state, &user.user_id).await?;
    let request = GymMembershipRequest {
        id: new_id(),
        gym_id: gym.id.clone(),
        gym_name: gym.name.clone(),
        user_id: profile.id.clone(),
        user_email: profile.email.clone(),
        user_display_name: Some(profile.display_label()),
        status: MembershipRequestStatus::Pending,
        requested_at: Utc::now(),
        processed_at: None,
        processed_by: None,
    };
    state.db.upsert_membership_request(&request).await?;

    tracing::info!(gym_id = %gym.id, user_id = %profile.id, "Membership requested");
    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<MembershipRequestStatus>,
}

async fn list_requests(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(gym_id): Path<String>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<Vec<GymMembershipRequest>>> {
    let gym = load_gym(&state, &gym_id).await?;
    let caller = current_user(&state, &user.user_id).await?;
    require_gym_staff(&gym, &caller)?;

    let requests = state
        .db
        .list_membership_requests(&gym_id, query.status)
        .await?;
    Ok(Json(requests))
}

/// Load a pending request belonging to `gym_id`, checking the caller is staff.
async fn pending_request_for_staff(
    state: &AppState,
    user: &AuthUser,
    gym_id: &str,
    request_id: &str,
) -> Result<GymMembershipRequest> {
    let gym = load_gym(state, gym_id).await?;
    let caller = current_user(state, &user.user_id).await?;
    require_gym_staff(&gym, &caller)?;

    let request = state
        .db
        .get_membership_request(request_id)
        .await?
        .filter(|r| r.gym_id == gym_id)
        .ok_or_else(|| AppError::NotFound(format!("membership request {request_id}")))?;

    if request.status != MembershipRequestStatus::Pending {
        return Err(AppError::Conflict("request was already processed".to_string()));
    }
    Ok(request)
}

async fn approve_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((gym_id, request_id)): Path<(String, String)>,
) -> Result<Json<Gym>> {
    let mut request = pending_request_for_staff(&state, &user, &gym_id, &request_id).await?;
    request.resolve(MembershipRequestStatus::Approved, &user.user_id);

    let gym = state.db.approve_membership(&request).await?;

    tracing::info!(
        gym_id = %gym_id,
        member_id = %request.user_id,
        approved_by = %user.user_id,
        "Membership approved"
    );
    Ok(Json(gym))
}

async fn deny_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((gym_id, request_id)): Path<(String, String)>,
) -> Result<Json<GymMembershipRequest>> {
    let mut request = pending_request_for_staff(&state, &user, &gym_id, &request_id).await?;
    request.resolve(MembershipRequestStatus::Denied, &user.user_id);
    state.db.upsert_membership_request(&request).await?;

    tracing::info!(gym_id = %gym_id, user_id = %request.user_id, "Membership denied");
    Ok(Json(request))
}

// ─── Staff ───────────────────────────────────────────────────

/// Make a user a coach of the gym. Owner only.
async fn add_coach(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((gym_id, coach_id)): Path<(String, String)>,
) -> Result<Json<Gym>> {
    let gym = load_gym(&state, &gym_id).await?;
    let caller = current_user(&state, &user.user_id).await?;
    if !gym.is_owner(&caller.id) {
        require_role(&caller, UserRole::SuperAdmin)?;
    }

    let mut coach = state
        .db
        .get_user(&coach_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {coach_id}")))?;

    let new_coach = coach_id.clone();
    let (gym, _) = state
        .db
        .modify_gym(&gym_id, move |gym| Ok(gym.add_coach(&new_coach)))
        .await?;

    if !coach.role.can_program_workouts() {
        coach.role = UserRole::Coach;
        state.db.upsert_user(&coach).await?;
    }

    tracing::info!(gym_id = %gym_id, coach_id = %coach_id, "Coach added");
    Ok(Json(gym))
}

/// Remove a member or coach from the gym and from all its groups.
async fn remove_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((gym_id, member_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let gym = load_gym(&state, &gym_id).await?;
    let caller = current_user(&state, &user.user_id).await?;
    require_gym_staff(&gym, &caller)?;

    state.db.remove_gym_member(&gym_id, &member_id).await?;

    tracing::info!(gym_id = %gym_id, member_id = %member_id, removed_by = %caller.id, "Member removed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_gym_offset_bounds() {
        let ok: CreateGymRequest =
            serde_json::from_str(r#"{"name":"CrossFit North","utcOffsetMinutes":-480}"#).unwrap();
        assert!(ok.validate().is_ok());

        let bad: CreateGymRequest =
            serde_json::from_str(r#"{"name":"CrossFit North","utcOffsetMinutes":900}"#).unwrap();
        assert!(bad.validate().is_err());

        let unnamed: CreateGymRequest = serde_json::from_str(r#"{"name":""}"#).unwrap();
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_update_gym_keeps_absent_fields() {
        let body: UpdateGymRequest = serde_json::from_str(
            r#"{"name":" Harbor Box ","contact":{"city":"Oslo","phone":"555-0100"}}"#,
        )
        .unwrap();
        assert!(body.validate().is_ok());

        let mut gym = Gym::new("Box", "owner", -300);
        gym.member_ids.push("m1".to_string());
        body.apply(&mut gym);

        assert_eq!(gym.name, "Harbor Box");
        assert_eq!(gym.utc_offset_minutes, -300);
        assert_eq!(gym.contact.city.as_deref(), Some("Oslo"));
        assert_eq!(gym.member_ids, vec!["m1".to_string()]);
    }

    #[test]
    fn test_update_gym_validation() {
        let body: UpdateGymRequest =
            serde_json::from_str(r#"{"utcOffsetMinutes":900}"#).unwrap();
        assert!(body.validate().is_err());

        let body: UpdateGymRequest =
            serde_json::from_str(r#"{"contact":{"website":"nope"}}"#).unwrap();
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_list_requests_query_status() {
        let query: ListRequestsQuery = serde_json::from_str(r#"{"status":"pending"}"#).unwrap();
        assert_eq!(query.status, Some(MembershipRequestStatus::Pending));
    }
}
