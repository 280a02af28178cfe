// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Programming and class signups.
//!
//! Workouts are stored once and expanded into dated occurrences for the
//! requested range. Athletes only see workouts programmed for groups they
//! belong to; staff see everything in their gyms.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::schedule::{
    check_signup_open, effective_cutoff_minutes, slots_from_groups, WorkoutType,
    MAX_OCCURRENCE_DAYS,
};
use crate::models::{
    AppUser, Recurrence, ScheduledWorkout, TimeSlot, WorkoutComponent, WorkoutGroup,
};
use crate::routes::groups::TimeSlotInput;
use crate::routes::{current_user, is_gym_staff, load_gym, new_id, require_gym_staff};
use crate::time_utils::parse_date_param;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/schedule", post(create_workout).get(get_schedule))
        .route(
            "/api/schedule/{workout_id}",
            put(update_workout).delete(delete_workout),
        )
        .route(
            "/api/schedule/{workout_id}/slots/{slot_id}/signup",
            post(sign_up).delete(cancel_signup),
        )
}

// ─── Visibility ──────────────────────────────────────────────

/// What the caller may see: gyms they staff and groups they belong to.
struct Viewer {
    user: AppUser,
    staff_gym_ids: HashSet<String>,
    group_ids: HashSet<String>,
}

impl Viewer {
    fn is_staff_for(&self, workout: &ScheduledWorkout) -> bool {
        workout
            .gym_id
            .as_ref()
            .is_some_and(|gym_id| self.staff_gym_ids.contains(gym_id))
    }

    fn can_see(&self, workout: &ScheduledWorkout) -> bool {
        if workout.created_by == self.user.id {
            return true;
        }
        match &workout.gym_id {
            None => false,
            Some(_) => {
                self.is_staff_for(workout)
                    || workout.group_ids.iter().any(|id| self.group_ids.contains(id))
            }
        }
    }

    /// Class rosters are shown to staff and the workout's author.
    fn sees_roster(&self, workout: &ScheduledWorkout) -> bool {
        workout.created_by == self.user.id || self.is_staff_for(workout)
    }

    /// Staff and the author always see full details.
    fn sees_details(&self, workout: &ScheduledWorkout, now: DateTime<Utc>) -> bool {
        workout.created_by == self.user.id
            || self.is_staff_for(workout)
            || !workout.details_hidden(now)
    }
}

async fn load_viewer(state: &AppState, user_id: &str) -> Result<(Viewer, Vec<String>)> {
    let user = current_user(state, user_id).await?;
    let (gyms, groups) = futures_util::try_join!(
        state.db.list_gyms_for_user(user_id),
        state.db.list_groups_for_user(user_id),
    )?;

    let staff_gym_ids = gyms
        .iter()
        .filter(|gym| is_gym_staff(gym, &user))
        .map(|gym| gym.id.clone())
        .collect();
    let gym_ids = gyms.into_iter().map(|gym| gym.id).collect();
    let group_ids = groups.into_iter().map(|group| group.id).collect();

    Ok((
        Viewer {
            user,
            staff_gym_ids,
            group_ids,
        },
        gym_ids,
    ))
}

// ─── Views ───────────────────────────────────────────────────

/// A class time on one occurrence date.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub id: String,
    pub hour: u8,
    pub minute: u8,
    pub capacity: u32,
    pub signup_count: usize,
    /// None when the slot is unlimited
    pub spots_remaining: Option<u32>,
    pub is_full: bool,
    pub is_signed_up: bool,
    /// Roster, for staff only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendee_ids: Option<Vec<String>>,
}

impl SlotView {
    fn new(slot: &TimeSlot, date: NaiveDate, user_id: &str, with_roster: bool) -> Self {
        let attendees = slot.signups_on(date);
        Self {
            id: slot.id.clone(),
            hour: slot.hour,
            minute: slot.minute,
            capacity: slot.capacity,
            signup_count: attendees.len(),
            spots_remaining: slot.spots_remaining(date),
            is_full: slot.is_full(date),
            is_signed_up: slot.is_signed_up(date, user_id),
            attendee_ids: with_roster.then(|| attendees.to_vec()),
        }
    }
}

/// One dated occurrence of a scheduled workout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOccurrence {
    pub date: NaiveDate,
    /// Slots are reported separately; `timeSlots` here is always empty
    pub workout: ScheduledWorkout,
    pub details_hidden: bool,
    pub slots: Vec<SlotView>,
}

fn occurrence_view(
    workout: &ScheduledWorkout,
    date: NaiveDate,
    viewer: &Viewer,
    now: DateTime<Utc>,
) -> ScheduleOccurrence {
    let with_details = viewer.sees_details(workout, now);
    let with_roster = viewer.sees_roster(workout);

    let mut shown = if with_details {
        workout.clone()
    } else {
        workout.redacted()
    };
    shown.time_slots = Vec::new();

    let mut slots: Vec<SlotView> = workout
        .time_slots
        .iter()
        .map(|slot| SlotView::new(slot, date, &viewer.user.id, with_roster))
        .collect();
    slots.sort_by_key(|s| (s.hour, s.minute));

    ScheduleOccurrence {
        date,
        workout: shown,
        details_hidden: !with_details,
        slots,
    }
}

// ─── Create ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkoutRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub workout_type: WorkoutType,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub components: Vec<WorkoutComponent>,
    #[serde(default)]
    pub group_ids: Vec<String>,
    #[serde(default)]
    pub gym_id: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub recurrence: Recurrence,
    /// Explicit class times; defaults to the groups' templates
    #[validate(nested)]
    #[serde(default)]
    pub time_slots: Option<Vec<TimeSlotInput>>,
    #[serde(default)]
    pub hide_details: Option<bool>,
    #[serde(default)]
    pub reveal_at: Option<DateTime<Utc>>,
}

impl CreateWorkoutRequest {
    /// Checks that need no storage access.
    fn check(&self) -> Result<()> {
        self.validate()?;
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest("title must not be blank".to_string()));
        }
        self.recurrence.validate().map_err(AppError::BadRequest)?;
        if self.end_date.is_some_and(|end| end < self.start_date) {
            return Err(AppError::BadRequest(
                "endDate must not be before startDate".to_string(),
            ));
        }
        if self.gym_id.is_some() && self.group_ids.is_empty() {
            return Err(AppError::BadRequest(
                "gym workouts need at least one group".to_string(),
            ));
        }
        if self.gym_id.is_none() && !self.group_ids.is_empty() {
            return Err(AppError::BadRequest(
                "personal workouts cannot target groups".to_string(),
            ));
        }
        Ok(())
    }
}

fn explicit_slots(inputs: &[TimeSlotInput]) -> Vec<TimeSlot> {
    inputs
        .iter()
        .map(|slot| TimeSlot {
            id: new_id(),
            hour: slot.hour,
            minute: slot.minute,
            capacity: slot.capacity.unwrap_or(0),
            signups: BTreeMap::new(),
        })
        .collect()
}

/// Program a workout for gym groups, or a personal workout.
async fn create_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateWorkoutRequest>,
) -> Result<(StatusCode, Json<ScheduledWorkout>)> {
    body.check()?;
    let caller = current_user(&state, &user.user_id).await?;

    let groups: Vec<WorkoutGroup> = match &body.gym_id {
        Some(gym_id) => {
            let gym = load_gym(&state, gym_id).await?;
            require_gym_staff(&gym, &caller)?;

            let groups = state.db.get_groups(&body.group_ids).await?;
            let unknown = body
                .group_ids
                .iter()
                .find(|id| !groups.iter().any(|g| &g.id == *id && g.gym_id.as_ref() == Some(gym_id)));
            if let Some(id) = unknown {
                return Err(AppError::BadRequest(format!("group {id} is not in this gym")));
            }
            groups
        }
        None => Vec::new(),
    };

    let time_slots = match &body.time_slots {
        Some(inputs) => explicit_slots(inputs),
        None => slots_from_groups(&groups),
    };
    let hide_details = body
        .hide_details
        .unwrap_or_else(|| groups.iter().any(|g| g.hide_details_by_default));

    let workout = ScheduledWorkout {
        id: new_id(),
        title: body.title.trim().to_string(),
        description: body.description,
        workout_type: body.workout_type,
        components: body.components,
        group_ids: body.group_ids,
        gym_id: body.gym_id,
        created_by: caller.id.clone(),
        start_date: body.start_date,
        end_date: body.end_date,
        recurrence: body.recurrence,
        time_slots,
        hide_details,
        reveal_at: body.reveal_at,
        created_at: Utc::now(),
    };
    state.db.upsert_scheduled_workout(&workout).await?;

    tracing::info!(
        workout_id = %workout.id,
        gym_id = ?workout.gym_id,
        slots = workout.time_slots.len(),
        "Workout scheduled"
    );
    Ok((StatusCode::CREATED, Json(workout)))
}

// ─── Read ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: String,
    pub end: String,
}

/// Parse and bound a date range.
fn parse_range(query: &RangeQuery) -> Result<(NaiveDate, NaiveDate)> {
    let start = parse_date_param("start", &query.start)?;
    let end = parse_date_param("end", &query.end)?;
    if end < start {
        return Err(AppError::BadRequest("end must not be before start".to_string()));
    }
    if (end - start).num_days() >= MAX_OCCURRENCE_DAYS {
        return Err(AppError::BadRequest(format!(
            "range must be shorter than {MAX_OCCURRENCE_DAYS} days"
        )));
    }
    Ok((start, end))
}

/// Every visible occurrence in `[start, end]`, in date order.
async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<ScheduleOccurrence>>> {
    let (start, end) = parse_range(&query)?;
    let (viewer, gym_ids) = load_viewer(&state, &user.user_id).await?;

    let (per_gym, own) = futures_util::try_join!(
        try_join_all(
            gym_ids
                .iter()
                .map(|gym_id| state.db.list_scheduled_workouts_for_gym(gym_id))
        ),
        state.db.list_scheduled_workouts_by_creator(&viewer.user.id),
    )?;

    let mut seen = HashSet::new();
    let now = Utc::now();
    let mut occurrences: Vec<ScheduleOccurrence> = per_gym
        .into_iter()
        .flatten()
        .chain(own)
        .filter(|w| seen.insert(w.id.clone()) && viewer.can_see(w))
        .flat_map(|w| {
            w.occurrences_between(start, end)
                .into_iter()
                .map(|date| occurrence_view(&w, date, &viewer, now))
                .collect::<Vec<_>>()
        })
        .collect();

    occurrences.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| first_slot(a).cmp(&first_slot(b)))
            .then_with(|| a.workout.created_at.cmp(&b.workout.created_at))
    });
    Ok(Json(occurrences))
}

fn first_slot(occurrence: &ScheduleOccurrence) -> Option<(u8, u8)> {
    occurrence.slots.first().map(|s| (s.hour, s.minute))
}

// ─── Edit & Delete ───────────────────────────────────────────

async fn load_workout(state: &AppState, workout_id: &str) -> Result<ScheduledWorkout> {
    state
        .db
        .get_scheduled_workout(workout_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("scheduled workout {workout_id}")))
}

/// The author, or staff of the workout's gym.
async fn require_author_or_staff(
    state: &AppState,
    user_id: &str,
    workout: &ScheduledWorkout,
) -> Result<()> {
    if workout.created_by == user_id {
        return Ok(());
    }
    let gym_id = workout
        .gym_id
        .as_deref()
        .ok_or_else(|| AppError::forbidden("not your workout"))?;
    let gym = load_gym(state, gym_id).await?;
    let caller = current_user(state, user_id).await?;
    require_gym_staff(&gym, &caller)
}

/// Workout edit. Absent fields are left unchanged. Targeting and class
/// slots are fixed once created so existing signups stay valid.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkoutRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub workout_type: Option<WorkoutType>,
    #[validate(length(max = 20))]
    pub components: Option<Vec<WorkoutComponent>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub recurrence: Option<Recurrence>,
    pub hide_details: Option<bool>,
    pub reveal_at: Option<DateTime<Utc>>,
}

impl UpdateWorkoutRequest {
    /// Apply onto the stored workout and re-check the merged result.
    fn apply(&self, workout: &mut ScheduledWorkout) -> Result<()> {
        if let Some(title) = &self.title {
            workout.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            workout.description = description.clone();
        }
        if let Some(workout_type) = self.workout_type {
            workout.workout_type = workout_type;
        }
        if let Some(components) = &self.components {
            workout.components = components.clone();
        }
        if let Some(start) = self.start_date {
            workout.start_date = start;
        }
        if let Some(end) = self.end_date {
            workout.end_date = Some(end);
        }
        if let Some(recurrence) = &self.recurrence {
            workout.recurrence = recurrence.clone();
        }
        if let Some(hide) = self.hide_details {
            workout.hide_details = hide;
        }
        if let Some(reveal_at) = self.reveal_at {
            workout.reveal_at = Some(reveal_at);
        }

        if workout.title.is_empty() {
            return Err(AppError::BadRequest("title must not be blank".to_string()));
        }
        workout.recurrence.validate().map_err(AppError::BadRequest)?;
        if workout.end_date.is_some_and(|end| end < workout.start_date) {
            return Err(AppError::BadRequest(
                "endDate must not be before startDate".to_string(),
            ));
        }
        Ok(())
    }
}

async fn update_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workout_id): Path<String>,
    Json(body): Json<UpdateWorkoutRequest>,
) -> Result<Json<ScheduledWorkout>> {
    body.validate()?;
    let workout = load_workout(&state, &workout_id).await?;
    require_author_or_staff(&state, &user.user_id, &workout).await?;

    let (workout, _) = state
        .db
        .modify_scheduled_workout(&workout_id, move |workout| body.apply(workout))
        .await?;

    tracing::info!(workout_id = %workout.id, updated_by = %user.user_id, "Workout updated");
    Ok(Json(workout))
}

/// The author or gym staff may delete a workout.
async fn delete_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workout_id): Path<String>,
) -> Result<StatusCode> {
    let workout = load_workout(&state, &workout_id).await?;
    require_author_or_staff(&state, &user.user_id, &workout).await?;

    state.db.delete_scheduled_workout(&workout_id).await?;
    tracing::info!(workout_id = %workout_id, "Workout deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Signups ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupQuery {
    pub date: String,
}

/// Signup cutoff and local offset for a workout's classes.
async fn signup_rules(state: &AppState, workout: &ScheduledWorkout) -> Result<(u32, FixedOffset)> {
    let groups = state.db.get_groups(&workout.group_ids).await?;
    let cutoff = effective_cutoff_minutes(&groups);
    let offset = match &workout.gym_id {
        Some(gym_id) => load_gym(state, gym_id).await?.local_offset(),
        None => Utc.fix(),
    };
    Ok((cutoff, offset))
}

async fn visible_workout(
    state: &AppState,
    user_id: &str,
    workout_id: &str,
) -> Result<(ScheduledWorkout, Viewer)> {
    let workout = load_workout(state, workout_id).await?;
    let (viewer, _) = load_viewer(state, user_id).await?;
    if !viewer.can_see(&workout) {
        return Err(AppError::NotFound(format!("scheduled workout {workout_id}")));
    }
    Ok((workout, viewer))
}

/// Reserve a spot in a class on one occurrence date.
async fn sign_up(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((workout_id, slot_id)): Path<(String, String)>,
    Query(query): Query<SignupQuery>,
) -> Result<Json<SlotView>> {
    let date = parse_date_param("date", &query.date)?;
    let (workout, viewer) = visible_workout(&state, &user.user_id, &workout_id).await?;
    let (cutoff, offset) = signup_rules(&state, &workout).await?;
    let with_roster = viewer.sees_roster(&workout);
    let now = Utc::now();

    let (user_id, wanted_slot) = (user.user_id.clone(), slot_id.clone());
    let (_, view) = state
        .db
        .modify_scheduled_workout(&workout_id, move |workout| {
            if !workout.should_occur(date) {
                return Err(crate::models::SignupError::NotScheduled(date).into());
            }
            let slot = workout
                .slot_mut(&wanted_slot)
                .ok_or_else(|| crate::models::SignupError::UnknownSlot(wanted_slot.clone()))?;
            let starts_at = slot
                .starts_at(date, offset)
                .ok_or_else(|| AppError::BadRequest("invalid class time".to_string()))?;

            check_signup_open(now, starts_at, cutoff)?;
            slot.sign_up(date, &user_id)?;
            Ok(SlotView::new(slot, date, &user_id, with_roster))
        })
        .await?;

    tracing::info!(
        workout_id = %workout_id,
        slot_id = %slot_id,
        date = %date,
        user_id = %user.user_id,
        "Signed up for class"
    );
    Ok(Json(view))
}

/// Give up a spot. Cancelling is allowed after the signup cutoff.
async fn cancel_signup(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((workout_id, slot_id)): Path<(String, String)>,
    Query(query): Query<SignupQuery>,
) -> Result<Json<SlotView>> {
    let date = parse_date_param("date", &query.date)?;
    let (workout, viewer) = visible_workout(&state, &user.user_id, &workout_id).await?;
    let with_roster = viewer.sees_roster(&workout);

    let (user_id, wanted_slot) = (user.user_id.clone(), slot_id.clone());
    let (_, view) = state
        .db
        .modify_scheduled_workout(&workout_id, move |workout| {
            let slot = workout
                .slot_mut(&wanted_slot)
                .ok_or_else(|| crate::models::SignupError::UnknownSlot(wanted_slot.clone()))?;
            slot.cancel(date, &user_id)?;
            Ok(SlotView::new(slot, date, &user_id, with_roster))
        })
        .await?;

    tracing::info!(
        workout_id = %workout_id,
        slot_id = %slot_id,
        date = %date,
        user_id = %user.user_id,
        "Cancelled class signup"
    );
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Weekday;
    use std::collections::BTreeSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn viewer(user_id: &str, staff_gyms: &[&str], groups: &[&str]) -> Viewer {
        Viewer {
            user: AppUser::new(user_id, format!("{user_id}@example.com")),
            staff_gym_ids: staff_gyms.iter().map(|s| s.to_string()).collect(),
            group_ids: groups.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn workout() -> ScheduledWorkout {
        ScheduledWorkout {
            id: "w1".to_string(),
            title: "Murph".to_string(),
            description: "1 mile run, 100 pull-ups".to_string(),
            workout_type: WorkoutType::Wod,
            components: Vec::new(),
            group_ids: vec!["grp".to_string()],
            gym_id: Some("gym".to_string()),
            created_by: "coach".to_string(),
            start_date: date(2025, 3, 10),
            end_date: None,
            recurrence: Recurrence::Weekly {
                selected_days: BTreeSet::from([Weekday::Monday]),
            },
            time_slots: vec![TimeSlot {
                id: "s6".to_string(),
                hour: 6,
                minute: 0,
                capacity: 2,
                signups: BTreeMap::from([(
                    "2025-03-10".to_string(),
                    vec!["athlete".to_string()],
                )]),
            }],
            hide_details: true,
            reveal_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_visibility_by_group_and_staff() {
        let w = workout();
        assert!(viewer("athlete", &[], &["grp"]).can_see(&w));
        assert!(!viewer("athlete", &[], &["other"]).can_see(&w));
        assert!(viewer("owner", &["gym"], &[]).can_see(&w));
        assert!(viewer("coach", &[], &[]).can_see(&w));

        let mut personal = workout();
        personal.gym_id = None;
        personal.group_ids.clear();
        assert!(!viewer("athlete", &[], &["grp"]).can_see(&personal));
    }

    #[test]
    fn test_workout_edit_keeps_signups() {
        let mut w = workout();
        let body: UpdateWorkoutRequest = serde_json::from_str(
            r#"{"title":"Murph (partitioned)","recurrence":{"type":"daily"},"endDate":"2025-03-20"}"#,
        )
        .unwrap();
        assert!(body.validate().is_ok());
        body.apply(&mut w).unwrap();

        assert_eq!(w.title, "Murph (partitioned)");
        assert_eq!(w.recurrence, Recurrence::Daily);
        assert_eq!(w.end_date, Some(date(2025, 3, 20)));
        assert_eq!(w.time_slots[0].signups_on(date(2025, 3, 10)), ["athlete".to_string()]);
        assert_eq!(w.group_ids, vec!["grp".to_string()]);
    }

    #[test]
    fn test_workout_edit_rechecks_merged_dates() {
        let mut w = workout();
        let body: UpdateWorkoutRequest =
            serde_json::from_str(r#"{"endDate":"2000-01-01"}"#).unwrap();
        assert!(matches!(body.apply(&mut w), Err(AppError::BadRequest(_))));

        let mut w = workout();
        let body: UpdateWorkoutRequest =
            serde_json::from_str(r#"{"recurrence":{"type":"weekly","selectedDays":[]}}"#).unwrap();
        assert!(matches!(body.apply(&mut w), Err(AppError::BadRequest(_))));

        let body: UpdateWorkoutRequest = serde_json::from_str(r#"{"title":""}"#).unwrap();
        assert!(body.validate().is_err());
    }

    #[test]
    fn test_roster_shown_to_author_and_staff() {
        let w = workout();
        assert!(viewer("coach", &[], &[]).sees_roster(&w));
        assert!(viewer("owner", &["gym"], &[]).sees_roster(&w));
        assert!(!viewer("athlete", &[], &["grp"]).sees_roster(&w));

        let author_view = occurrence_view(&w, date(2025, 3, 10), &viewer("coach", &[], &[]), Utc::now());
        assert_eq!(
            author_view.slots[0].attendee_ids.as_deref(),
            Some(&["athlete".to_string()][..])
        );
    }

    #[test]
    fn test_hidden_details_redacted_for_athletes() {
        let w = workout();
        let now = Utc::now();

        let athlete_view = occurrence_view(&w, date(2025, 3, 10), &viewer("athlete", &[], &["grp"]), now);
        assert!(athlete_view.details_hidden);
        assert_eq!(athlete_view.workout.title, crate::models::schedule::HIDDEN_TITLE);
        assert!(athlete_view.workout.time_slots.is_empty());
        assert!(athlete_view.slots[0].is_signed_up);
        assert_eq!(athlete_view.slots[0].spots_remaining, Some(1));
        assert!(athlete_view.slots[0].attendee_ids.is_none());

        let staff_view = occurrence_view(&w, date(2025, 3, 10), &viewer("owner", &["gym"], &[]), now);
        assert!(!staff_view.details_hidden);
        assert_eq!(staff_view.workout.title, "Murph");
        assert_eq!(
            staff_view.slots[0].attendee_ids.as_deref(),
            Some(&["athlete".to_string()][..])
        );
    }

    #[test]
    fn test_parse_range_bounds() {
        let ok = RangeQuery {
            start: "2025-03-01".to_string(),
            end: "2025-03-31".to_string(),
        };
        assert_eq!(parse_range(&ok).unwrap(), (date(2025, 3, 1), date(2025, 3, 31)));

        let backwards = RangeQuery {
            start: "2025-03-31".to_string(),
            end: "2025-03-01".to_string(),
        };
        assert!(matches!(parse_range(&backwards), Err(AppError::BadRequest(_))));

        let too_long = RangeQuery {
            start: "2025-01-01".to_string(),
            end: "2026-06-01".to_string(),
        };
        assert!(matches!(parse_range(&too_long), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_create_request_checks() {
        let ok: CreateWorkoutRequest = serde_json::from_str(
            r#"{"title":"Fran","startDate":"2025-03-10","gymId":"gym","groupIds":["grp"],
                "recurrence":{"type":"daily"}}"#,
        )
        .unwrap();
        assert!(ok.check().is_ok());

        let ends_early: CreateWorkoutRequest = serde_json::from_str(
            r#"{"title":"Fran","startDate":"2025-03-10","endDate":"2025-03-01"}"#,
        )
        .unwrap();
        assert!(ends_early.check().is_err());

        let no_days: CreateWorkoutRequest = serde_json::from_str(
            r#"{"title":"Fran","startDate":"2025-03-10","recurrence":{"type":"weekly","selectedDays":[]}}"#,
        )
        .unwrap();
        assert!(no_days.check().is_err());

        let gym_without_groups: CreateWorkoutRequest =
            serde_json::from_str(r#"{"title":"Fran","startDate":"2025-03-10","gymId":"gym"}"#)
                .unwrap();
        assert!(gym_without_groups.check().is_err());

        let personal_with_groups: CreateWorkoutRequest = serde_json::from_str(
            r#"{"title":"Fran","startDate":"2025-03-10","groupIds":["grp"]}"#,
        )
        .unwrap();
        assert!(personal_with_groups.check().is_err());
    }

    #[test]
    fn test_explicit_slots_default_unlimited() {
        let inputs: Vec<TimeSlotInput> =
            serde_json::from_str(r#"[{"hour":9,"minute":30},{"hour":12,"minute":0,"capacity":8}]"#)
                .unwrap();
        let slots = explicit_slots(&inputs);
        assert_eq!(slots[0].capacity, 0);
        assert_eq!(slots[1].capacity, 8);
        assert!(slots.iter().all(|s| s.signups.is_empty()));
    }
}
