// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress analytics over a trailing window of training history.
//!
//! Scores are heuristics on a 0-100 scale:
//! - strength: PRs and lift volume
//! - conditioning: WOD volume and RX rate
//! - consistency: sessions per week

use crate::models::{AiCoachPreferences, Category, LiftResult, SkillLog, WorkoutLog};
use crate::services::matching::normalize_workout_name;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Window lengths offered to athletes, in days.
pub const ALLOWED_WINDOWS: [u32; 4] = [30, 90, 180, 365];
pub const DEFAULT_WINDOW_DAYS: u32 = 90;

/// Lifts reported, by number of sessions logged.
const TOP_LIFTS: usize = 10;
/// Lifts included in the AI summary.
const SUMMARY_LIFTS: usize = 5;
/// Percent change beyond which a lift counts as trending.
const TREND_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    fn from_change(percent_change: f64) -> Self {
        if percent_change > TREND_THRESHOLD {
            Trend::Up
        } else if percent_change < -TREND_THRESHOLD {
            Trend::Down
        } else {
            Trend::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiftStats {
    pub lift_name: String,
    pub current_max: f64,
    pub previous_max: f64,
    pub percent_change: f64,
    pub total_sessions: usize,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WodStats {
    pub total_wods: usize,
    pub rx_percentage: f64,
    /// Mean percent time drop from first to last attempt of repeated timed WODs
    pub avg_time_improvement: f64,
    pub consistency_score: f64,
    pub weekly_average: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallScores {
    pub strength_score: u32,
    pub conditioning_score: u32,
    pub consistency_score: u32,
    pub overall_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub days: u32,
    pub lift_stats: Vec<LiftStats>,
    pub wod_stats: Option<WodStats>,
    pub overall: OverallScores,
}

/// Validate a requested window, defaulting when absent.
pub fn window_days(requested: Option<u32>) -> Result<u32, String> {
    match requested {
        None => Ok(DEFAULT_WINDOW_DAYS),
        Some(days) if ALLOWED_WINDOWS.contains(&days) => Ok(days),
        Some(days) => Err(format!(
            "days must be one of {:?}, got {}",
            ALLOWED_WINDOWS, days
        )),
    }
}

/// Compute all progress statistics for one athlete.
pub fn compute_progress(
    lifts: &[LiftResult],
    wods: &[WorkoutLog],
    skills: &[SkillLog],
    days: u32,
    now: DateTime<Utc>,
) -> ProgressReport {
    let window_start = now - Duration::days(i64::from(days));

    ProgressReport {
        days,
        lift_stats: lift_stats(lifts, window_start),
        wod_stats: wod_stats(wods, window_start, days),
        overall: overall_scores(lifts, wods, skills, window_start, days),
    }
}

fn max_weight<'a>(lifts: impl Iterator<Item = &'a LiftResult>) -> Option<f64> {
    lifts.map(|l| l.weight).reduce(f64::max)
}

/// Per-lift max, change versus before the window, and trend.
pub fn lift_stats(lifts: &[LiftResult], window_start: DateTime<Utc>) -> Vec<LiftStats> {
    let mut by_lift: HashMap<String, Vec<&LiftResult>> = HashMap::new();
    for lift in lifts {
        by_lift
            .entry(normalize_workout_name(&lift.lift_title))
            .or_default()
            .push(lift);
    }

    let mut stats: Vec<LiftStats> = by_lift
        .into_values()
        .filter_map(|mut records| {
            records.sort_by(|a, b| b.date.cmp(&a.date));
            let latest = records.first()?;

            let current_max = records
                .iter()
                .find(|r| r.reps == 1)
                .map(|r| r.weight)
                .or_else(|| max_weight(records.iter().copied()))?;

            let older: Vec<&LiftResult> = records
                .iter()
                .copied()
                .filter(|r| r.date < window_start)
                .collect();

            let previous_max = if older.is_empty() {
                current_max
            } else {
                max_weight(older.iter().copied().filter(|r| r.reps == 1))
                    .filter(|w| *w > 0.0)
                    .or_else(|| max_weight(older.iter().copied()))
                    .unwrap_or(0.0)
            };

            let percent_change = if previous_max > 0.0 {
                (current_max - previous_max) / previous_max * 100.0
            } else {
                0.0
            };

            Some(LiftStats {
                lift_name: latest.lift_title.clone(),
                current_max,
                previous_max,
                percent_change,
                total_sessions: records.len(),
                trend: Trend::from_change(percent_change),
            })
        })
        .collect();

    stats.sort_by(|a, b| {
        b.total_sessions
            .cmp(&a.total_sessions)
            .then_with(|| a.lift_name.cmp(&b.lift_name))
    });
    stats.truncate(TOP_LIFTS);
    stats
}

/// 3-6 sessions a week scores 100; fewer ramps down, more is not rewarded further.
pub fn consistency_score(weekly_average: f64) -> f64 {
    let score = if (3.0..=6.0).contains(&weekly_average) {
        100.0
    } else if weekly_average >= 2.0 {
        70.0 + (weekly_average - 2.0) * 30.0
    } else if weekly_average >= 1.0 {
        40.0 + (weekly_average - 1.0) * 30.0
    } else {
        weekly_average * 40.0
    };
    score.clamp(0.0, 100.0)
}

/// WOD volume, RX rate and time improvement inside the window.
pub fn wod_stats(wods: &[WorkoutLog], window_start: DateTime<Utc>, days: u32) -> Option<WodStats> {
    let recent: Vec<&WorkoutLog> = wods
        .iter()
        .filter(|w| w.completed_date >= window_start)
        .collect();

    if recent.is_empty() {
        return None;
    }

    let total = recent.len();
    let rx = recent.iter().filter(|w| w.category == Category::Rx).count();
    let rx_percentage = rx as f64 / total as f64 * 100.0;

    let weeks = f64::from(days) / 7.0;
    let weekly_average = total as f64 / weeks;

    let mut timed: HashMap<String, Vec<&WorkoutLog>> = HashMap::new();
    for wod in recent.iter().copied() {
        if wod.time_in_seconds.is_some_and(|t| t > 0) && !wod.wod_title.is_empty() {
            timed
                .entry(normalize_workout_name(&wod.wod_title))
                .or_default()
                .push(wod);
        }
    }

    let improvements: Vec<f64> = timed
        .into_values()
        .filter(|records| records.len() >= 2)
        .filter_map(|mut records| {
            records.sort_by_key(|r| r.completed_date);
            let first = f64::from(records.first()?.time_in_seconds?);
            let last = f64::from(records.last()?.time_in_seconds?);
            (first > 0.0).then(|| (first - last) / first * 100.0)
        })
        .collect();

    let avg_time_improvement = if improvements.is_empty() {
        0.0
    } else {
        improvements.iter().sum::<f64>() / improvements.len() as f64
    };

    Some(WodStats {
        total_wods: total,
        rx_percentage,
        avg_time_improvement,
        consistency_score: consistency_score(weekly_average),
        weekly_average,
    })
}

/// Composite 0-100 scores for the window.
pub fn overall_scores(
    lifts: &[LiftResult],
    wods: &[WorkoutLog],
    skills: &[SkillLog],
    window_start: DateTime<Utc>,
    days: u32,
) -> OverallScores {
    let recent_lifts: Vec<&LiftResult> =
        lifts.iter().filter(|l| l.date >= window_start).collect();
    let recent_wods: Vec<&WorkoutLog> = wods
        .iter()
        .filter(|w| w.completed_date >= window_start)
        .collect();
    let recent_skills = skills.iter().filter(|s| s.date >= window_start).count();

    let lift_prs = recent_lifts
        .iter()
        .filter(|lift| {
            let name = normalize_workout_name(&lift.lift_title);
            let previous_max = max_weight(lifts.iter().filter(|other| {
                other.date < lift.date && normalize_workout_name(&other.lift_title) == name
            }))
            .unwrap_or(0.0);
            lift.weight > previous_max
        })
        .count();

    let strength = (lift_prs as f64 * 10.0 + recent_lifts.len() as f64 * 2.0).min(100.0);

    let rx_ratio = if recent_wods.is_empty() {
        0.0
    } else {
        recent_wods
            .iter()
            .filter(|w| w.category == Category::Rx)
            .count() as f64
            / recent_wods.len() as f64
    };
    let conditioning = (recent_wods.len() as f64 * 5.0 + rx_ratio * 50.0).min(100.0);

    let total_activities = recent_lifts.len() + recent_wods.len() + recent_skills;
    let per_week = total_activities as f64 / (f64::from(days) / 7.0);
    let consistency = (per_week * 15.0).min(100.0);

    let overall = strength * 0.35 + conditioning * 0.35 + consistency * 0.3;

    OverallScores {
        strength_score: strength.round() as u32,
        conditioning_score: conditioning.round() as u32,
        consistency_score: consistency.round() as u32,
        overall_score: overall.round() as u32,
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

fn signed(value: f64) -> &'static str {
    if value > 0.0 {
        "+"
    } else {
        ""
    }
}

/// Plain-text digest of a report, used as the AI coach's input.
pub fn build_progress_summary(
    report: &ProgressReport,
    preferences: Option<&AiCoachPreferences>,
) -> String {
    let mut summary = format!(
        "ATHLETE PROGRESS ANALYSIS (Last {} days)\n\n",
        report.days
    );

    let o = &report.overall;
    let _ = write!(
        summary,
        "OVERALL SCORES:\n\
         - Strength Score: {}/100\n\
         - Conditioning Score: {}/100\n\
         - Consistency Score: {}/100\n\
         - Overall Score: {}/100\n\n",
        o.strength_score, o.conditioning_score, o.consistency_score, o.overall_score
    );

    if !report.lift_stats.is_empty() {
        summary.push_str("TOP LIFTS:\n");
        for lift in report.lift_stats.iter().take(SUMMARY_LIFTS) {
            let _ = writeln!(
                summary,
                "- {}: {}lb ({}{:.1}% from previous period, {} sessions)",
                lift.lift_name,
                format_number(lift.current_max),
                signed(lift.percent_change),
                lift.percent_change,
                lift.total_sessions
            );
        }
        summary.push('\n');
    }

    if let Some(wod) = &report.wod_stats {
        let _ = write!(
            summary,
            "WOD STATS:\n\
             - Total WODs: {}\n\
             - RX Rate: {:.0}%\n\
             - Weekly Average: {:.1} workouts/week\n\
             - Time Improvement: {}{:.1}%\n\n",
            wod.total_wods,
            wod.rx_percentage,
            wod.weekly_average,
            signed(wod.avg_time_improvement),
            wod.avg_time_improvement
        );
    }

    if let Some(prefs) = preferences {
        if let Some(goals) = prefs.goals.as_deref().filter(|g| !g.trim().is_empty()) {
            let _ = write!(summary, "ATHLETE'S GOALS: {}\n\n", goals);
        }
        if let Some(injuries) = prefs.injuries.as_deref().filter(|i| !i.trim().is_empty()) {
            let _ = write!(summary, "INJURIES/LIMITATIONS: {}\n\n", injuries);
        }
    }

    summary
}
