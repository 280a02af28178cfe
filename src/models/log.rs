// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout logs: WOD results, lift results and skill practice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use validator::Validate;

/// How a WOD result is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultType {
    Time,
    Rounds,
    Weight,
    Reps,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "RX")]
    Rx,
    #[default]
    Scaled,
    #[serde(rename = "Just for Fun")]
    JustForFun,
}

/// Scored WOD result fields, shared by logs and leaderboard entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WodScore {
    #[serde(default)]
    pub time_in_seconds: Option<u32>,
    #[serde(default)]
    pub rounds: Option<u32>,
    #[validate(range(max = 100000))]
    #[serde(default)]
    pub reps: Option<u32>,
    #[validate(range(min = 0.0, max = 2000.0))]
    #[serde(default)]
    pub weight: Option<f64>,
}

impl WodScore {
    /// Check that the fields required by `result_type` are present.
    pub fn check(&self, result_type: ResultType) -> Result<(), String> {
        let ok = match result_type {
            ResultType::Time => self.time_in_seconds.is_some_and(|t| t > 0),
            ResultType::Rounds => self.rounds.is_some(),
            ResultType::Weight => self.weight.is_some_and(|w| w > 0.0),
            ResultType::Reps => self.reps.is_some(),
            ResultType::Other => true,
        };
        if ok {
            Ok(())
        } else {
            Err(format!("missing score for result type {:?}", result_type))
        }
    }

    /// Comparable score where higher is always better; `None` for unscored results.
    pub fn performance_key(&self, result_type: ResultType) -> Option<Performance> {
        match result_type {
            ResultType::Time => self
                .time_in_seconds
                .map(|t| Performance::new(-f64::from(t), 0.0)),
            ResultType::Rounds => self.rounds.map(|r| {
                Performance::new(f64::from(r), f64::from(self.reps.unwrap_or(0)))
            }),
            ResultType::Reps => self.reps.map(|r| Performance::new(f64::from(r), 0.0)),
            ResultType::Weight => self.weight.map(|w| Performance::new(w, 0.0)),
            ResultType::Other => None,
        }
    }

    pub fn summary(&self, result_type: ResultType) -> String {
        match result_type {
            ResultType::Time => self
                .time_in_seconds
                .map(format_duration)
                .unwrap_or_else(|| "-".to_string()),
            ResultType::Rounds => match (self.rounds, self.reps) {
                (Some(r), Some(reps)) if reps > 0 => format!("{} rounds + {} reps", r, reps),
                (Some(r), _) => format!("{} rounds", r),
                _ => "-".to_string(),
            },
            ResultType::Weight => self
                .weight
                .map(|w| format!("{} lbs", format_weight(w)))
                .unwrap_or_else(|| "-".to_string()),
            ResultType::Reps => self
                .reps
                .map(|r| format!("{} reps", r))
                .unwrap_or_else(|| "-".to_string()),
            ResultType::Other => "Completed".to_string(),
        }
    }
}

/// Ordered WOD performance. Compares the primary measure first, so
/// leftover reps only break ties between equal round counts.
#[derive(Debug, Clone, Copy)]
pub struct Performance {
    primary: f64,
    secondary: f64,
}

impl Performance {
    fn new(primary: f64, secondary: f64) -> Self {
        Self { primary, secondary }
    }
}

impl Ord for Performance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.primary
            .total_cmp(&other.primary)
            .then_with(|| self.secondary.total_cmp(&other.secondary))
    }
}

impl PartialOrd for Performance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Performance {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Performance {}

/// `m:ss`, or `h:mm:ss` past an hour.
pub fn format_duration(total_seconds: u32) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{:.0}", weight)
    } else {
        format!("{:.1}", weight)
    }
}

/// A completed WOD.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLog {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub scheduled_workout_id: Option<String>,
    pub wod_title: String,
    #[serde(default)]
    pub wod_description: String,
    pub workout_date: DateTime<Utc>,
    pub completed_date: DateTime<Utc>,
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
    pub notes: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub is_personal_record: bool,
    pub created_at: DateTime<Utc>,
}

impl WorkoutLog {
    pub fn score(&self) -> WodScore {
        WodScore {
            time_in_seconds: self.time_in_seconds,
            rounds: self.rounds,
            reps: self.reps,
            weight: self.weight,
        }
    }

    pub fn result_summary(&self) -> String {
        self.score().summary(self.result_type)
    }

    pub fn performance_key(&self) -> Option<Performance> {
        self.score().performance_key(self.result_type)
    }
}

/// Percentages of a 1RM offered as training loads.
pub const PERCENTAGE_STEPS: [u32; 11] = [50, 55, 60, 65, 70, 75, 80, 85, 90, 95, 100];

/// A single set of a barbell lift.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiftResult {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    pub lift_title: String,
    pub weight: f64,
    pub reps: u32,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_personal_record: bool,
}

impl LiftResult {
    /// Epley estimate; a single is its own max.
    pub fn estimated_one_rep_max(&self) -> f64 {
        estimated_one_rep_max(self.weight, self.reps)
    }
}

pub fn estimated_one_rep_max(weight: f64, reps: u32) -> f64 {
    if reps <= 1 {
        weight
    } else {
        weight * (1.0 + f64::from(reps) / 30.0)
    }
}

/// Training load at a percentage of a one-rep max.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentageWeight {
    pub percent: u32,
    pub weight: f64,
}

/// Loads from 50% to 100% of `one_rep_max` in 5% steps, rounded to 0.1.
pub fn percentage_weights(one_rep_max: f64) -> Vec<PercentageWeight> {
    PERCENTAGE_STEPS
        .iter()
        .map(|&percent| PercentageWeight {
            percent,
            weight: (one_rep_max * f64::from(percent) / 100.0 * 10.0).round() / 10.0,
        })
        .collect()
}

/// Practice log for a gymnastics or other skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillLog {
    pub id: String,
    pub user_id: String,
    pub skill_name: String,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_summary_formats() {
        let time = WodScore {
            time_in_seconds: Some(185),
            ..Default::default()
        };
        assert_eq!(time.summary(ResultType::Time), "3:05");

        let long = WodScore {
            time_in_seconds: Some(3725),
            ..Default::default()
        };
        assert_eq!(long.summary(ResultType::Time), "1:02:05");

        let rounds = WodScore {
            rounds: Some(5),
            reps: Some(3),
            ..Default::default()
        };
        assert_eq!(rounds.summary(ResultType::Rounds), "5 rounds + 3 reps");

        let weight = WodScore {
            weight: Some(225.0),
            ..Default::default()
        };
        assert_eq!(weight.summary(ResultType::Weight), "225 lbs");

        let reps = WodScore {
            reps: Some(50),
            ..Default::default()
        };
        assert_eq!(reps.summary(ResultType::Reps), "50 reps");
    }

    #[test]
    fn test_performance_key_orders_better_results_higher() {
        let fast = WodScore {
            time_in_seconds: Some(180),
            ..Default::default()
        };
        let slow = WodScore {
            time_in_seconds: Some(240),
            ..Default::default()
        };
        assert!(fast.performance_key(ResultType::Time) > slow.performance_key(ResultType::Time));

        let more_rounds = WodScore {
            rounds: Some(6),
            reps: Some(0),
            ..Default::default()
        };
        let more_reps = WodScore {
            rounds: Some(5),
            reps: Some(30),
            ..Default::default()
        };
        assert!(
            more_rounds.performance_key(ResultType::Rounds)
                > more_reps.performance_key(ResultType::Rounds)
        );
        assert_eq!(fast.performance_key(ResultType::Other), None);
    }

    #[test]
    fn test_rounds_compare_before_leftover_reps() {
        let two_rounds = WodScore {
            rounds: Some(2),
            reps: Some(0),
            ..Default::default()
        };
        let one_round = WodScore {
            rounds: Some(1),
            reps: Some(1500),
            ..Default::default()
        };
        assert!(
            two_rounds.performance_key(ResultType::Rounds)
                > one_round.performance_key(ResultType::Rounds)
        );

        let with_reps = WodScore {
            reps: Some(1),
            ..two_rounds.clone()
        };
        assert!(
            with_reps.performance_key(ResultType::Rounds)
                > two_rounds.performance_key(ResultType::Rounds)
        );
    }

    #[test]
    fn test_score_check() {
        let empty = WodScore::default();
        assert!(empty.check(ResultType::Time).is_err());
        assert!(empty.check(ResultType::Other).is_ok());
    }

    #[test]
    fn test_epley() {
        assert_eq!(estimated_one_rep_max(225.0, 1), 225.0);
        assert!((estimated_one_rep_max(200.0, 5) - 233.333).abs() < 0.01);
        assert!((estimated_one_rep_max(100.0, 10) - 133.333).abs() < 0.01);
    }

    #[test]
    fn test_percentage_weights() {
        let table = percentage_weights(300.0);
        assert_eq!(table.len(), 11);
        assert_eq!(table[0], PercentageWeight { percent: 50, weight: 150.0 });
        assert_eq!(table[10], PercentageWeight { percent: 100, weight: 300.0 });
        assert_eq!(table[5].weight, 225.0);
    }

    #[test]
    fn test_category_wire_names() {
        assert_eq!(serde_json::to_string(&Category::Rx).unwrap(), "\"RX\"");
        assert_eq!(
            serde_json::to_string(&Category::JustForFun).unwrap(),
            "\"Just for Fun\""
        );
    }
}
