// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout name matching, role hierarchy and leaderboard ranking.

use chrono::{Duration, TimeZone, Utc};
use wod_tracker::models::{AppUser, Category, Gender, LeaderboardEntry, ResultType, UserRole, WorkoutLog};
use wod_tracker::services::matching::levenshtein_distance;
use wod_tracker::services::{
    build_leaderboards, normalize_workout_name, similarity_score, LeaderboardFilter,
};

const NAMES: [&str; 12] = [
    "Fran", "fran", "F r a n", "F-R-A-N", "Grace", "Helen", "Murph", "DT", "Cindy",
    "Annie", "", "Fight Gone Bad",
];

#[test]
fn test_fran_spellings_share_a_key() {
    let key = normalize_workout_name("Fran");
    for name in ["fran", "F r a n", "F-R-A-N", "  FRAN  ", "f_r_a_n", "\"Fran\""] {
        assert_eq!(normalize_workout_name(name), key, "{name:?}");
    }
}

#[test]
fn test_similarity_identity_and_symmetry() {
    for a in NAMES {
        assert_eq!(similarity_score(a, a), 1.0, "{a:?}");
        for b in NAMES {
            assert_eq!(similarity_score(a, b), similarity_score(b, a), "{a:?} vs {b:?}");
            let score = similarity_score(a, b);
            assert!((0.0..=1.0).contains(&score));
        }
    }
}

#[test]
fn test_levenshtein_metric_properties() {
    for a in NAMES {
        for b in NAMES {
            let ab = levenshtein_distance(a, b);
            assert_eq!(ab == 0, a == b, "{a:?} vs {b:?}");
            for c in NAMES {
                assert!(
                    levenshtein_distance(a, c) <= ab + levenshtein_distance(b, c),
                    "triangle inequality for {a:?}, {b:?}, {c:?}"
                );
            }
        }
    }
}

#[test]
fn test_permission_matrix() {
    for role in UserRole::ALL {
        for minimum in UserRole::ALL {
            assert_eq!(
                role.has_permission(minimum),
                role.level() >= minimum.level(),
                "{role:?} vs {minimum:?}"
            );
        }
    }
    assert!(UserRole::Coach.can_program_workouts());
    assert!(!UserRole::Coach.can_manage_gyms());
    assert!(UserRole::Owner.can_manage_gyms());
    assert!(!UserRole::Athlete.can_view_member_progress());
}

fn athlete(id: &str, gender: Gender) -> AppUser {
    let mut user = AppUser::new(id, format!("{id}@example.com"));
    user.display_name = Some(id.to_string());
    user.gender = Some(gender);
    user
}

fn fran(id: &str, seconds: u32, day: i64, category: Category) -> WorkoutLog {
    let completed = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + Duration::days(day);
    WorkoutLog {
        id: id.to_string(),
        user_id: String::new(),
        scheduled_workout_id: None,
        wod_title: "F-R-A-N".to_string(),
        wod_description: String::new(),
        workout_date: completed,
        completed_date: completed,
        result_type: ResultType::Time,
        time_in_seconds: Some(seconds),
        rounds: None,
        reps: None,
        weight: None,
        notes: None,
        category,
        is_personal_record: false,
        created_at: completed,
    }
}

fn entry(user: &AppUser, log_id: &str, seconds: u32, day: i64, category: Category) -> LeaderboardEntry {
    let mut log = fran(log_id, seconds, day, category);
    log.user_id = user.id.clone();
    LeaderboardEntry::from_log(&log, user, Some("CrossFit North".to_string()))
}

#[test]
fn test_ranking_keeps_each_athletes_best_time() {
    let jane = athlete("jane", Gender::Female);
    let joe = athlete("joe", Gender::Male);
    let ann = athlete("ann", Gender::Female);

    let entries = vec![
        entry(&jane, "j1", 240, 0, Category::Rx),
        entry(&jane, "j2", 200, 5, Category::Rx),
        entry(&joe, "o1", 200, 2, Category::Rx),
        entry(&ann, "a1", 310, 1, Category::Scaled),
    ];

    let boards = build_leaderboards(entries.clone(), &LeaderboardFilter::default());
    assert_eq!(boards.len(), 1);
    let board = &boards[0];
    assert_eq!(board.normalized_name, "fran");

    let ranked: Vec<(&str, usize)> = board
        .entries
        .iter()
        .map(|r| (r.entry.user_id.as_str(), r.rank))
        .collect();
    // Equal times: earlier completion ranks first
    assert_eq!(ranked, vec![("joe", 1), ("jane", 2), ("ann", 3)]);
    assert_eq!(board.entries[0].result, "3:20");

    let women = LeaderboardFilter {
        workout: Some("fran".to_string()),
        gender: Some(Gender::Female),
        category: None,
    };
    let boards = build_leaderboards(entries.clone(), &women);
    assert_eq!(boards[0].entries.len(), 2);
    assert_eq!(boards[0].entries[0].entry.user_id, "jane");

    let rx = LeaderboardFilter {
        category: Some(Category::Rx),
        ..Default::default()
    };
    let boards = build_leaderboards(entries, &rx);
    assert!(boards[0].entries.iter().all(|r| r.entry.category == Category::Rx));
}

#[test]
fn test_unmatched_workout_filter_is_empty() {
    let jane = athlete("jane", Gender::Female);
    let filter = LeaderboardFilter {
        workout: Some("Grace".to_string()),
        ..Default::default()
    };
    assert!(build_leaderboards(vec![entry(&jane, "j1", 240, 0, Category::Rx)], &filter).is_empty());
}
