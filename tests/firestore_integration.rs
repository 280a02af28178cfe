// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with `FIRESTORE_EMULATOR_HOST` pointing at a local emulator.
//!
//! Every test uses fresh ids, so runs against a shared emulator do not
//! interfere with each other.

use chrono::{NaiveDate, Utc};
use futures_util::{stream, StreamExt};
use std::collections::BTreeMap;
use wod_tracker::db::firestore::HISTORY_LIMIT;
use wod_tracker::error::AppError;
use wod_tracker::models::schedule::WorkoutType;
use wod_tracker::models::{
    AppUser, ApplicationStatus, Category, Gym, GymApplication, GymContact, GymMembershipRequest,
    LeaderboardEntry, MembershipRequestStatus, Recurrence, ResultType, ScheduledWorkout,
    SignupError, TimeSlot, UserRole, WorkoutGroup, WorkoutLog,
};
use wod_tracker::services::normalize_workout_name;

mod common;
use common::test_db;

fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

fn test_gym(owner_id: &str) -> Gym {
    let mut gym = Gym::new("CrossFit Emulator", owner_id, -300);
    gym.id = unique_id("gym");
    gym
}

fn timed_log(user_id: &str, title: &str, seconds: u32) -> WorkoutLog {
    let now = Utc::now();
    WorkoutLog {
        id: unique_id("log"),
        user_id: user_id.to_string(),
        scheduled_workout_id: None,
        wod_title: title.to_string(),
        wod_description: String::new(),
        workout_date: now,
        completed_date: now,
        result_type: ResultType::Time,
        time_in_seconds: Some(seconds),
        rounds: None,
        reps: None,
        weight: None,
        notes: None,
        category: Category::Scaled,
        is_personal_record: false,
        created_at: now,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// GYM TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_create_gym_with_default_group() {
    require_emulator!();

    let db = test_db().await;
    let owner = unique_id("owner");
    let gym = test_gym(&owner);
    let group = WorkoutGroup::default_for_gym(&gym.id, &owner);

    db.create_gym(&gym, &group).await.unwrap();

    let stored = db.get_gym(&gym.id).await.unwrap().expect("gym stored");
    assert_eq!(stored.name, "CrossFit Emulator");
    assert!(stored.is_owner(&owner));

    let groups = db.list_groups_for_gym(&gym.id).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert!(groups[0].is_auto_assign());
    assert!(!groups[0].is_deletable);

    let owned = db.list_gyms_for_user(&owner).await.unwrap();
    assert!(owned.iter().any(|g| g.id == gym.id));
}

#[tokio::test]
async fn test_approve_membership_joins_auto_assign_groups() {
    require_emulator!();

    let db = test_db().await;
    let owner = unique_id("owner");
    let athlete = unique_id("athlete");
    let gym = test_gym(&owner);
    let group = WorkoutGroup::default_for_gym(&gym.id, &owner);
    db.create_gym(&gym, &group).await.unwrap();

    let mut request = GymMembershipRequest {
        id: unique_id("req"),
        gym_id: gym.id.clone(),
        gym_name: gym.name.clone(),
        user_id: athlete.clone(),
        user_email: "athlete@example.com".to_string(),
        user_display_name: None,
        status: MembershipRequestStatus::Pending,
        requested_at: Utc::now(),
        processed_at: None,
        processed_by: None,
    };
    db.upsert_membership_request(&request).await.unwrap();

    let pending = db.find_pending_request(&gym.id, &athlete).await.unwrap();
    assert_eq!(pending.map(|r| r.id), Some(request.id.clone()));

    request.resolve(MembershipRequestStatus::Approved, &owner);
    let updated = db.approve_membership(&request).await.unwrap();
    assert!(updated.is_member(&athlete));

    let group = db.get_group(&group.id).await.unwrap().expect("group");
    assert!(group.member_ids.contains(&athlete));

    let stored = db
        .get_membership_request(&request.id)
        .await
        .unwrap()
        .expect("request");
    assert_eq!(stored.status, MembershipRequestStatus::Approved);
    assert_eq!(stored.processed_by.as_deref(), Some(owner.as_str()));
    assert!(db
        .find_pending_request(&gym.id, &athlete)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_remove_member_strips_every_group() {
    require_emulator!();

    let db = test_db().await;
    let owner = unique_id("owner");
    let coach = unique_id("coach");
    let mut gym = test_gym(&owner);
    gym.coach_ids.push(coach.clone());
    let default_group = WorkoutGroup::default_for_gym(&gym.id, &owner);
    db.create_gym(&gym, &default_group).await.unwrap();

    let mut barbell = WorkoutGroup::default_for_gym(&gym.id, &owner);
    barbell.id = unique_id("group");
    barbell.name = "Barbell".to_string();
    barbell.coach_ids.push(coach.clone());
    db.upsert_group(&barbell).await.unwrap();

    let added = coach.clone();
    db.modify_group(&default_group.id, move |g| Ok(g.add_member(&added)))
        .await
        .unwrap();

    let updated = db.remove_gym_member(&gym.id, &coach).await.unwrap();
    assert!(!updated.is_member(&coach));

    for group in db.list_groups_for_gym(&gym.id).await.unwrap() {
        assert!(!group.member_ids.contains(&coach), "{}", group.name);
        assert!(!group.coach_ids.contains(&coach), "{}", group.name);
    }

    let again = db.remove_gym_member(&gym.id, &coach).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));
    let owner_removal = db.remove_gym_member(&gym.id, &owner).await;
    assert!(matches!(owner_removal, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn test_gym_application_approval_creates_owned_gym() {
    require_emulator!();

    let db = test_db().await;
    let applicant = AppUser::new(unique_id("applicant"), "applicant@example.com");
    db.upsert_user(&applicant).await.unwrap();

    let application = GymApplication {
        id: unique_id("app"),
        user_id: applicant.id.clone(),
        user_email: applicant.email.clone(),
        user_display_name: None,
        gym_name: "CrossFit Applied".to_string(),
        utc_offset_minutes: -420,
        contact: GymContact {
            city: Some("Denver".to_string()),
            ..GymContact::default()
        },
        status: ApplicationStatus::Pending,
        submitted_at: Utc::now(),
        reviewed_at: None,
        reviewed_by: None,
        approved_gym_id: None,
        rejection_reason: None,
    };
    db.upsert_gym_application(&application).await.unwrap();

    let (approved, gym) = db
        .approve_gym_application(&application.id, "admin")
        .await
        .unwrap();
    assert_eq!(approved.status, ApplicationStatus::Approved);
    assert_eq!(approved.approved_gym_id.as_deref(), Some(gym.id.as_str()));
    assert!(gym.is_owner(&applicant.id));
    assert_eq!(gym.contact.city.as_deref(), Some("Denver"));

    let owner = db.get_user(&applicant.id).await.unwrap().expect("user");
    assert_eq!(owner.role, UserRole::Owner);
    assert_eq!(db.list_groups_for_gym(&gym.id).await.unwrap().len(), 1);

    let twice = db.approve_gym_application(&application.id, "admin").await;
    assert!(matches!(twice, Err(AppError::Conflict(_))));
}

// ═══════════════════════════════════════════════════════════════════════════
// LOG & LEADERBOARD TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_log_with_leaderboard_entry_and_delete() {
    require_emulator!();

    let db = test_db().await;
    let mut user = AppUser::new(unique_id("user"), "user@example.com");
    user.display_name = Some("Emu Lator".to_string());
    db.upsert_user(&user).await.unwrap();

    // Unique workout name keeps the leaderboard query isolated
    let title = format!("Fran {}", uuid::Uuid::new_v4().simple());
    let now = Utc::now();
    let log = WorkoutLog {
        id: unique_id("log"),
        user_id: user.id.clone(),
        scheduled_workout_id: None,
        wod_title: title.clone(),
        wod_description: "21-15-9".to_string(),
        workout_date: now,
        completed_date: now,
        result_type: ResultType::Time,
        time_in_seconds: Some(245),
        rounds: None,
        reps: None,
        weight: None,
        notes: None,
        category: Category::Rx,
        is_personal_record: true,
        created_at: now,
    };
    let entry = LeaderboardEntry::from_log(&log, &user, None);
    db.save_workout_log(&log, Some(&entry)).await.unwrap();

    let logs = db.list_workout_logs(&user.id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].time_in_seconds, Some(245));

    let key = normalize_workout_name(&title);
    let entries = db.list_leaderboard_entries(Some(key.as_str()), 10).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user_name, "Emu Lator");

    db.delete_workout_log(&log.id).await.unwrap();
    assert!(db.get_workout_log(&log.id).await.unwrap().is_none());
    assert!(db
        .list_leaderboard_entries(Some(key.as_str()), 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_hiding_user_removes_leaderboard_entries() {
    require_emulator!();

    let db = test_db().await;
    let user = AppUser::new(unique_id("user"), "hidden@example.com");

    for seconds in [300, 280] {
        let log = timed_log(&user.id, "Grace", seconds);
        let entry = LeaderboardEntry::from_log(&log, &user, None);
        db.save_workout_log(&log, Some(&entry)).await.unwrap();
    }

    let removed = db.delete_leaderboard_entries_for_user(&user.id).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(db.list_workout_logs(&user.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_leaderboard_removal_pages_past_history_limit() {
    require_emulator!();

    let db = test_db().await;
    let user = AppUser::new(unique_id("user"), "prolific@example.com");
    let total = HISTORY_LIMIT as usize + 5;

    let saved: Vec<_> = stream::iter(0..total)
        .map(|i| {
            let db = db.clone();
            let user = user.clone();
            async move {
                let log = timed_log(&user.id, "Helen", 600 + i as u32);
                let entry = LeaderboardEntry::from_log(&log, &user, None);
                db.save_workout_log(&log, Some(&entry)).await
            }
        })
        .buffer_unordered(50)
        .collect()
        .await;
    assert!(saved.iter().all(Result::is_ok));

    let removed = db.delete_leaderboard_entries_for_user(&user.id).await.unwrap();
    assert_eq!(removed, total);
    assert_eq!(db.delete_leaderboard_entries_for_user(&user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_saving_without_entry_unpublishes_result() {
    require_emulator!();

    let db = test_db().await;
    let user = AppUser::new(unique_id("user"), "edit@example.com");
    let title = format!("Diane {}", uuid::Uuid::new_v4().simple());
    let key = normalize_workout_name(&title);

    let mut log = timed_log(&user.id, &title, 400);
    let entry = LeaderboardEntry::from_log(&log, &user, None);
    db.save_workout_log(&log, Some(&entry)).await.unwrap();
    assert_eq!(db.list_leaderboard_entries(Some(key.as_str()), 10).await.unwrap().len(), 1);

    log.time_in_seconds = Some(380);
    db.save_workout_log(&log, None).await.unwrap();
    assert!(db
        .list_leaderboard_entries(Some(key.as_str()), 10)
        .await
        .unwrap()
        .is_empty());
    let stored = db.get_workout_log(&log.id).await.unwrap().expect("log");
    assert_eq!(stored.time_in_seconds, Some(380));
}

// ═══════════════════════════════════════════════════════════════════════════
// SIGNUP TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_slot_signups_respect_capacity() {
    require_emulator!();

    let db = test_db().await;
    let date = NaiveDate::from_ymd_opt(2030, 6, 3).unwrap();
    let workout = ScheduledWorkout {
        id: unique_id("workout"),
        title: "Murph".to_string(),
        description: String::new(),
        workout_type: WorkoutType::Wod,
        components: Vec::new(),
        group_ids: Vec::new(),
        gym_id: None,
        created_by: unique_id("coach"),
        start_date: date,
        end_date: None,
        recurrence: Recurrence::Daily,
        time_slots: vec![TimeSlot {
            id: "s1".to_string(),
            hour: 6,
            minute: 0,
            capacity: 2,
            signups: BTreeMap::new(),
        }],
        hide_details: false,
        reveal_at: None,
        created_at: Utc::now(),
    };
    db.upsert_scheduled_workout(&workout).await.unwrap();

    for user in ["a", "b"] {
        db.modify_scheduled_workout(&workout.id, move |w| {
            w.slot_mut("s1")
                .expect("slot")
                .sign_up(date, user)
                .map_err(Into::into)
        })
        .await
        .unwrap();
    }

    let full = db
        .modify_scheduled_workout(&workout.id, move |w| {
            w.slot_mut("s1")
                .expect("slot")
                .sign_up(date, "c")
                .map_err(Into::into)
        })
        .await;
    assert!(full.is_err());

    let stored = db
        .get_scheduled_workout(&workout.id)
        .await
        .unwrap()
        .expect("workout");
    let slot = stored.slot("s1").expect("slot");
    assert_eq!(slot.signups_on(date), ["a", "b"]);
    assert_eq!(slot.spots_remaining(date), Some(0));
    // Other occurrences are independent
    assert!(!slot.is_full(date.succ_opt().unwrap()));

    assert_eq!(
        stored.clone().slot_mut("s1").unwrap().cancel(date, "c"),
        Err(SignupError::NotSignedUp)
    );
}

#[tokio::test]
async fn test_concurrent_signups_never_overbook() {
    require_emulator!();

    let db = test_db().await;
    let date = NaiveDate::from_ymd_opt(2030, 6, 4).unwrap();
    let workout = ScheduledWorkout {
        id: unique_id("workout"),
        title: "Karen".to_string(),
        description: String::new(),
        workout_type: WorkoutType::Wod,
        components: Vec::new(),
        group_ids: Vec::new(),
        gym_id: None,
        created_by: unique_id("coach"),
        start_date: date,
        end_date: None,
        recurrence: Recurrence::Once,
        time_slots: vec![TimeSlot {
            id: "s1".to_string(),
            hour: 17,
            minute: 30,
            capacity: 2,
            signups: BTreeMap::new(),
        }],
        hide_details: false,
        reveal_at: None,
        created_at: Utc::now(),
    };
    db.upsert_scheduled_workout(&workout).await.unwrap();

    let attempts: Vec<_> = (0..6)
        .map(|i| {
            let db = db.clone();
            let workout_id = workout.id.clone();
            tokio::spawn(async move {
                let user = format!("athlete-{i}");
                db.modify_scheduled_workout(&workout_id, move |w| {
                    w.slot_mut("s1")
                        .expect("slot")
                        .sign_up(date, &user)
                        .map_err(Into::into)
                })
                .await
            })
        })
        .collect();

    let mut accepted = 0;
    for attempt in attempts {
        if attempt.await.unwrap().is_ok() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 2);

    let stored = db
        .get_scheduled_workout(&workout.id)
        .await
        .unwrap()
        .expect("workout");
    assert_eq!(stored.slot("s1").expect("slot").signups_on(date).len(), 2);
}
