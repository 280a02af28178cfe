// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout group routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{AppUser, DefaultTimeSlot, GroupType, MembershipType, WorkoutGroup};
use crate::routes::{current_user, is_gym_staff, load_gym, new_id, require_gym_member, require_gym_staff};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Longest signup cutoff a group may set (one day).
const MAX_CUTOFF_MINUTES: u32 = 24 * 60;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/gyms/{gym_id}/groups", get(list_groups).post(create_group))
        .route("/api/groups/{group_id}", put(update_group).delete(delete_group))
        .route("/api/groups/{group_id}/members", post(add_member))
        .route(
            "/api/groups/{group_id}/members/{user_id}",
            delete(remove_member),
        )
}

async fn list_groups(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(gym_id): Path<String>,
) -> Result<Json<Vec<WorkoutGroup>>> {
    let gym = load_gym(&state, &gym_id).await?;
    let caller = current_user(&state, &user.user_id).await?;
    require_gym_member(&gym, &caller)?;

    let mut groups = state.db.list_groups_for_gym(&gym_id).await?;
    groups.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(groups))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotInput {
    #[validate(range(max = 23))]
    pub hour: u8,
    #[validate(range(max = 59))]
    pub minute: u8,
    /// 0 means unlimited
    pub capacity: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub membership_type: MembershipType,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub hide_details_by_default: bool,
    #[validate(range(max = MAX_CUTOFF_MINUTES))]
    #[serde(default)]
    pub signup_cutoff_minutes: u32,
    #[validate(nested)]
    #[serde(default)]
    pub default_time_slots: Vec<TimeSlotInput>,
}

fn time_slot_templates(inputs: &[TimeSlotInput]) -> Vec<DefaultTimeSlot> {
    inputs
        .iter()
        .map(|slot| DefaultTimeSlot {
            id: new_id(),
            hour: slot.hour,
            minute: slot.minute,
            capacity: slot
                .capacity
                .unwrap_or(crate::models::group::DEFAULT_SLOT_CAPACITY),
        })
        .collect()
}

/// Create a custom group in a gym. Auto-assign groups start with every
/// current gym member.
async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(gym_id): Path<String>,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<WorkoutGroup>)> {
    body.validate()?;

    let gym = load_gym(&state, &gym_id).await?;
    let caller = current_user(&state, &user.user_id).await?;
    require_gym_staff(&gym, &caller)?;

    let mut member_ids = vec![caller.id.clone()];
    if body.membership_type == MembershipType::AutoAssignAll {
        for id in std::iter::once(&gym.owner_id)
            .chain(&gym.coach_ids)
            .chain(&gym.member_ids)
        {
            if !member_ids.contains(id) {
                member_ids.push(id.clone());
            }
        }
    }

    let group = WorkoutGroup {
        id: new_id(),
        gym_id: Some(gym.id.clone()),
        name: body.name.trim().to_string(),
        group_type: GroupType::Custom,
        membership_type: body.membership_type,
        member_ids,
        coach_ids: vec![caller.id.clone()],
        owner_id: caller.id.clone(),
        is_public: body.is_public,
        is_deletable: true,
        hide_details_by_default: body.hide_details_by_default,
        signup_cutoff_minutes: body.signup_cutoff_minutes,
        default_time_slots: time_slot_templates(&body.default_time_slots),
        created_at: Utc::now(),
    };
    state.db.upsert_group(&group).await?;

    tracing::info!(gym_id = %gym.id, group_id = %group.id, "Group created");
    Ok((StatusCode::CREATED, Json(group)))
}

async fn load_group(state: &AppState, group_id: &str) -> Result<WorkoutGroup> {
    state
        .db
        .get_group(group_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("group {group_id}")))
}

/// Gym staff manage gym groups; personal groups belong to their owner.
async fn can_manage_group(state: &AppState, group: &WorkoutGroup, caller: &AppUser) -> Result<bool> {
    match &group.gym_id {
        Some(gym_id) => {
            let gym = load_gym(state, gym_id).await?;
            Ok(is_gym_staff(&gym, caller))
        }
        None => Ok(group.owner_id == caller.id),
    }
}

/// Group settings edit. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub membership_type: Option<MembershipType>,
    pub is_public: Option<bool>,
    pub hide_details_by_default: Option<bool>,
    #[validate(range(max = MAX_CUTOFF_MINUTES))]
    pub signup_cutoff_minutes: Option<u32>,
    #[validate(nested)]
    pub default_time_slots: Option<Vec<TimeSlotInput>>,
}

/// Resolved group edit. Slot templates get their IDs once so a retried
/// write stores the same document.
#[derive(Debug, Clone, Default)]
struct GroupChanges {
    name: Option<String>,
    membership_type: Option<MembershipType>,
    is_public: Option<bool>,
    hide_details_by_default: Option<bool>,
    signup_cutoff_minutes: Option<u32>,
    default_time_slots: Option<Vec<DefaultTimeSlot>>,
}

impl From<UpdateGroupRequest> for GroupChanges {
    fn from(body: UpdateGroupRequest) -> Self {
        Self {
            name: body.name.map(|n| n.trim().to_string()),
            membership_type: body.membership_type,
            is_public: body.is_public,
            hide_details_by_default: body.hide_details_by_default,
            signup_cutoff_minutes: body.signup_cutoff_minutes,
            default_time_slots: body.default_time_slots.as_deref().map(time_slot_templates),
        }
    }
}

impl GroupChanges {
    fn apply(&self, group: &mut WorkoutGroup) {
        if let Some(name) = &self.name {
            group.name = name.clone();
        }
        if let Some(membership_type) = self.membership_type {
            group.membership_type = membership_type;
        }
        if let Some(is_public) = self.is_public {
            group.is_public = is_public;
        }
        if let Some(hide) = self.hide_details_by_default {
            group.hide_details_by_default = hide;
        }
        if let Some(cutoff) = self.signup_cutoff_minutes {
            group.signup_cutoff_minutes = cutoff;
        }
        if let Some(slots) = &self.default_time_slots {
            group.default_time_slots = slots.clone();
        }
    }
}

async fn update_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<String>,
    Json(body): Json<UpdateGroupRequest>,
) -> Result<Json<WorkoutGroup>> {
    body.validate()?;
    if body.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("group name must not be blank".to_string()));
    }

    let group = load_group(&state, &group_id).await?;
    let caller = current_user(&state, &user.user_id).await?;
    if !can_manage_group(&state, &group, &caller).await? {
        return Err(AppError::forbidden("cannot manage this group"));
    }

    let changes = GroupChanges::from(body);
    let (group, _) = state
        .db
        .modify_group(&group_id, move |group| {
            changes.apply(group);
            Ok(())
        })
        .await?;

    tracing::info!(group_id = %group.id, updated_by = %caller.id, "Group updated");
    Ok(Json(group))
}

async fn delete_group(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<String>,
) -> Result<StatusCode> {
    let group = load_group(&state, &group_id).await?;
    let caller = current_user(&state, &user.user_id).await?;
    if !can_manage_group(&state, &group, &caller).await? {
        return Err(AppError::forbidden("cannot manage this group"));
    }
    if !group.is_deletable {
        return Err(AppError::forbidden("this group cannot be deleted"));
    }

    state.db.delete_group(&group_id).await?;
    tracing::info!(group_id = %group_id, "Group deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
}

async fn add_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(group_id): Path<String>,
    Json(body): Json<AddMemberRequest>,
) -> Result<Json<WorkoutGroup>> {
    body.validate()?;

    let group = load_group(&state, &group_id).await?;
    let caller = current_user(&state, &user.user_id).await?;
    if !can_manage_group(&state, &group, &caller).await? {
        return Err(AppError::forbidden("cannot manage this group"));
    }

    // Gym groups only take members of that gym
    if let Some(gym_id) = &group.gym_id {
        let gym = load_gym(&state, gym_id).await?;
        if !gym.is_member(&body.user_id) {
            return Err(AppError::BadRequest("user is not a member of this gym".to_string()));
        }
    }

    let (group, _) = state
        .db
        .modify_group(&group_id, move |group| {
            if group.add_member(&body.user_id) {
                Ok(())
            } else {
                Err(AppError::Conflict("already in this group".to_string()))
            }
        })
        .await?;
    Ok(Json(group))
}

/// Staff can remove anyone; members can remove themselves.
async fn remove_member(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((group_id, member_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let group = load_group(&state, &group_id).await?;
    if member_id != user.user_id {
        let caller = current_user(&state, &user.user_id).await?;
        if !can_manage_group(&state, &group, &caller).await? {
            return Err(AppError::forbidden("cannot manage this group"));
        }
    }

    state
        .db
        .modify_group(&group.id, move |group| {
            if group.remove_member(&member_id) {
                Ok(())
            } else {
                Err(AppError::NotFound(format!("member {member_id}")))
            }
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_group_validation() {
        let body: CreateGroupRequest = serde_json::from_str(
            r#"{"name":"Competitors","membershipType":"invite-only","signupCutoffMinutes":60,
                "defaultTimeSlots":[{"hour":6,"minute":0},{"hour":17,"minute":30,"capacity":0}]}"#,
        )
        .unwrap();
        assert!(body.validate().is_ok());

        let templates = time_slot_templates(&body.default_time_slots);
        assert_eq!(templates[0].capacity, 20);
        assert_eq!(templates[1].capacity, 0);
        assert_ne!(templates[0].id, templates[1].id);

        let bad_hour: CreateGroupRequest = serde_json::from_str(
            r#"{"name":"Late","defaultTimeSlots":[{"hour":24,"minute":0}]}"#,
        )
        .unwrap();
        assert!(bad_hour.validate().is_err());

        let bad_cutoff: CreateGroupRequest =
            serde_json::from_str(r#"{"name":"X","signupCutoffMinutes":5000}"#).unwrap();
        assert!(bad_cutoff.validate().is_err());
    }

    #[test]
    fn test_group_edit_changes_only_given_fields() {
        let body: UpdateGroupRequest = serde_json::from_str(
            r#"{"name":" Barbell Club ","signupCutoffMinutes":30,
                "defaultTimeSlots":[{"hour":18,"minute":0,"capacity":12}]}"#,
        )
        .unwrap();
        assert!(body.validate().is_ok());

        let mut group = WorkoutGroup::default_for_gym("g1", "owner");
        group.member_ids.push("m1".to_string());
        let changes = GroupChanges::from(body);
        changes.apply(&mut group);

        assert_eq!(group.name, "Barbell Club");
        assert_eq!(group.signup_cutoff_minutes, 30);
        assert!(group.is_auto_assign());
        assert_eq!(group.member_ids, vec!["owner".to_string(), "m1".to_string()]);
        assert_eq!(group.default_time_slots.len(), 1);
        assert_eq!(group.default_time_slots[0].capacity, 12);

        // Reapplying stores the same slot IDs
        let first_id = group.default_time_slots[0].id.clone();
        changes.apply(&mut group);
        assert_eq!(group.default_time_slots[0].id, first_id);
    }

    #[test]
    fn test_group_edit_validation() {
        let bad: UpdateGroupRequest =
            serde_json::from_str(r#"{"defaultTimeSlots":[{"hour":6,"minute":75}]}"#).unwrap();
        assert!(bad.validate().is_err());

        let bad: UpdateGroupRequest = serde_json::from_str(r#"{"name":""}"#).unwrap();
        assert!(bad.validate().is_err());
    }
}
