// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard entries, denormalized from workout logs.

use super::log::{Category, Performance, ResultType, WodScore, WorkoutLog};
use super::user::{AppUser, Gender};
use crate::services::matching::normalize_workout_name;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public copy of a workout result. Document ID = workout log ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_gender: Option<Gender>,
    #[serde(default)]
    pub gym_name: Option<String>,
    pub workout_log_id: String,
    pub normalized_workout_name: String,
    pub original_workout_name: String,
    #[serde(default)]
    pub scheduled_workout_id: Option<String>,
    pub result_type: ResultType,
    #[serde(default)]
    pub time_in_seconds: Option<u32>,
    #[serde(default)]
    pub rounds: Option<u32>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub category: Category,
    pub completed_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn from_log(log: &WorkoutLog, user: &AppUser, gym_name: Option<String>) -> Self {
        Self {
            id: log.id.clone(),
            user_id: user.id.clone(),
            user_name: user.display_label(),
            user_gender: user.gender,
            gym_name,
            workout_log_id: log.id.clone(),
            normalized_workout_name: normalize_workout_name(&log.wod_title),
            original_workout_name: log.wod_title.clone(),
            scheduled_workout_id: log.scheduled_workout_id.clone(),
            result_type: log.result_type,
            time_in_seconds: log.time_in_seconds,
            rounds: log.rounds,
            reps: log.reps,
            weight: log.weight,
            category: log.category,
            completed_date: log.completed_date,
            created_at: Utc::now(),
        }
    }

    pub fn score(&self) -> WodScore {
        WodScore {
            time_in_seconds: self.time_in_seconds,
            rounds: self.rounds,
            reps: self.reps,
            weight: self.weight,
        }
    }

    pub fn performance_key(&self) -> Option<Performance> {
        self.score().performance_key(self.result_type)
    }

    pub fn result_summary(&self) -> String {
        self.score().summary(self.result_type)
    }
}
