// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard ranking and personal-record detection.

use crate::models::{Category, Gender, LeaderboardEntry, LiftResult, ResultType, WorkoutLog};
use crate::services::matching::normalize_workout_name;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Narrowing applied before ranking.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardFilter {
    /// Matched on normalized name
    pub workout: Option<String>,
    pub gender: Option<Gender>,
    pub category: Option<Category>,
}

impl LeaderboardFilter {
    fn accepts(&self, entry: &LeaderboardEntry, workout_key: Option<&str>) -> bool {
        workout_key.is_none_or(|key| entry.normalized_workout_name == key)
            && self.gender.is_none_or(|g| entry.user_gender == Some(g))
            && self.category.is_none_or(|c| entry.category == c)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub rank: usize,
    pub result: String,
    pub entry: LeaderboardEntry,
}

/// Ranked results for one workout and scoring type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLeaderboard {
    pub normalized_name: String,
    pub display_name: String,
    pub result_type: ResultType,
    pub entries: Vec<RankedEntry>,
}

/// Ordering where the better result sorts first.
///
/// Scored results compare by performance, then earlier completion wins.
/// Unscored (`other`) results list most recent first.
pub fn compare_entries(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    match (a.performance_key(), b.performance_key()) {
        (Some(ka), Some(kb)) => kb
            .cmp(&ka)
            .then_with(|| a.completed_date.cmp(&b.completed_date)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.completed_date.cmp(&a.completed_date),
    }
}

/// Group entries by workout, keep each user's best, and rank.
pub fn build_leaderboards(
    entries: Vec<LeaderboardEntry>,
    filter: &LeaderboardFilter,
) -> Vec<WorkoutLeaderboard> {
    let workout_key = filter.workout.as_deref().map(normalize_workout_name);

    let mut groups: BTreeMap<(String, ResultType), HashMap<String, LeaderboardEntry>> =
        BTreeMap::new();

    for entry in entries {
        if !filter.accepts(&entry, workout_key.as_deref()) {
            continue;
        }

        let best_by_user = groups
            .entry((entry.normalized_workout_name.clone(), entry.result_type))
            .or_default();

        match best_by_user.get(&entry.user_id) {
            Some(current) if compare_entries(current, &entry) != Ordering::Greater => {}
            _ => {
                best_by_user.insert(entry.user_id.clone(), entry);
            }
        }
    }

    let mut boards: Vec<WorkoutLeaderboard> = groups
        .into_iter()
        .map(|((normalized_name, result_type), best_by_user)| {
            let mut ranked: Vec<LeaderboardEntry> = best_by_user.into_values().collect();
            ranked.sort_by(compare_entries);

            let display_name = ranked
                .first()
                .map(|e| e.original_workout_name.clone())
                .unwrap_or_else(|| normalized_name.clone());

            WorkoutLeaderboard {
                normalized_name,
                display_name,
                result_type,
                entries: ranked
                    .into_iter()
                    .enumerate()
                    .map(|(i, entry)| RankedEntry {
                        rank: i + 1,
                        result: entry.result_summary(),
                        entry,
                    })
                    .collect(),
            }
        })
        .collect();

    // Busiest boards first
    boards.sort_by(|a, b| {
        b.entries
            .len()
            .cmp(&a.entries.len())
            .then_with(|| a.normalized_name.cmp(&b.normalized_name))
    });
    boards
}

/// A new WOD log is a PR when it beats every earlier log of the same
/// workout scored the same way. The first scored attempt counts.
pub fn is_wod_personal_record(new_log: &WorkoutLog, history: &[WorkoutLog]) -> bool {
    let Some(new_key) = new_log.performance_key() else {
        return false;
    };
    let name = normalize_workout_name(&new_log.wod_title);

    history
        .iter()
        .filter(|log| {
            log.id != new_log.id
                && log.result_type == new_log.result_type
                && normalize_workout_name(&log.wod_title) == name
        })
        .filter_map(WorkoutLog::performance_key)
        .all(|previous| new_key > previous)
}

/// A lift is a PR when its estimated 1RM beats every earlier result for
/// the same lift.
pub fn is_lift_personal_record(new_lift: &LiftResult, history: &[LiftResult]) -> bool {
    let name = normalize_workout_name(&new_lift.lift_title);
    let estimate = new_lift.estimated_one_rep_max();

    estimate > 0.0
        && history
            .iter()
            .filter(|l| l.id != new_lift.id && normalize_workout_name(&l.lift_title) == name)
            .all(|l| estimate > l.estimated_one_rep_max())
}
