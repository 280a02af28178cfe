// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduled workouts: recurrence, class time slots and signups.
//!
//! A scheduled workout is stored once and expanded into occurrences on
//! read. Signups are keyed by the occurrence date (`YYYY-MM-DD`) so one
//! recurring document can carry independent rosters for each day.

use super::group::{DefaultTimeSlot, WorkoutGroup};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Upper bound on occurrences produced by a single range expansion.
pub const MAX_OCCURRENCE_DAYS: i64 = 366;

/// Day of week, Sunday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Sun => Weekday::Sunday,
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
        }
    }
}

/// Which day of the month a monthly workout lands on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MonthlyOption {
    /// Day of month; months too short for it use their last day
    SpecificDay { day: u32 },
    /// 1st..4th occurrence of a weekday
    NthWeekday { week: u8, weekday: Weekday },
    LastWeekday { weekday: Weekday },
    LastDayOfMonth,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Recurrence {
    #[default]
    Once,
    Daily,
    Weekly {
        #[serde(rename = "selectedDays")]
        selected_days: BTreeSet<Weekday>,
    },
    Monthly {
        option: MonthlyOption,
    },
}

impl Recurrence {
    /// Reject patterns that can never produce an occurrence.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Recurrence::Weekly { selected_days } if selected_days.is_empty() => {
                Err("weekly recurrence needs at least one day".to_string())
            }
            Recurrence::Monthly {
                option: MonthlyOption::SpecificDay { day },
            } if !(1..=31).contains(day) => Err(format!("invalid day of month: {day}")),
            Recurrence::Monthly {
                option: MonthlyOption::NthWeekday { week, .. },
            } if !(1..=4).contains(week) => Err(format!("invalid week of month: {week}")),
            _ => Ok(()),
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

impl MonthlyOption {
    fn matches(&self, date: NaiveDate) -> bool {
        let day = date.day();
        let last_day = days_in_month(date.year(), date.month());
        match *self {
            MonthlyOption::SpecificDay { day: wanted } => day == wanted.min(last_day),
            MonthlyOption::NthWeekday { week, weekday } => {
                Weekday::of(date) == weekday && (day - 1) / 7 + 1 == u32::from(week)
            }
            MonthlyOption::LastWeekday { weekday } => {
                Weekday::of(date) == weekday && day + 7 > last_day
            }
            MonthlyOption::LastDayOfMonth => day == last_day,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkoutType {
    #[default]
    Wod,
    Lift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentType {
    Warmup,
    Strength,
    Wod,
    Skill,
    Cooldown,
    Other,
}

/// One section of a class (warmup, strength piece, WOD, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutComponent {
    pub component_type: ComponentType,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Reasons a slot signup is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignupError {
    #[error("already signed up for this class")]
    AlreadySignedUp,
    #[error("class is full")]
    Full,
    #[error("not signed up for this class")]
    NotSignedUp,
    #[error("signups closed {cutoff_minutes} minutes before class")]
    Closed { cutoff_minutes: u32 },
    #[error("workout does not occur on {0}")]
    NotScheduled(NaiveDate),
    #[error("unknown time slot: {0}")]
    UnknownSlot(String),
}

/// A class time on a scheduled workout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: String,
    pub hour: u8,
    pub minute: u8,
    /// 0 means unlimited
    #[serde(default)]
    pub capacity: u32,
    /// Occurrence date (`YYYY-MM-DD`) -> user ids in signup order
    #[serde(default)]
    pub signups: BTreeMap<String, Vec<String>>,
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl TimeSlot {
    pub fn from_template(template: &DefaultTimeSlot) -> Self {
        Self {
            id: template.id.clone(),
            hour: template.hour,
            minute: template.minute,
            capacity: template.capacity,
            signups: BTreeMap::new(),
        }
    }

    pub fn signups_on(&self, date: NaiveDate) -> &[String] {
        self.signups
            .get(&date_key(date))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_signed_up(&self, date: NaiveDate, user_id: &str) -> bool {
        self.signups_on(date).iter().any(|id| id == user_id)
    }

    pub fn is_full(&self, date: NaiveDate) -> bool {
        self.capacity != 0 && self.signups_on(date).len() >= self.capacity as usize
    }

    /// Open spots for the date; `None` when the slot is unlimited.
    pub fn spots_remaining(&self, date: NaiveDate) -> Option<u32> {
        if self.capacity == 0 {
            return None;
        }
        let taken = u32::try_from(self.signups_on(date).len()).unwrap_or(u32::MAX);
        Some(self.capacity.saturating_sub(taken))
    }

    pub fn sign_up(&mut self, date: NaiveDate, user_id: &str) -> Result<(), SignupError> {
        if self.is_signed_up(date, user_id) {
            return Err(SignupError::AlreadySignedUp);
        }
        if self.is_full(date) {
            return Err(SignupError::Full);
        }
        self.signups
            .entry(date_key(date))
            .or_default()
            .push(user_id.to_string());
        Ok(())
    }

    pub fn cancel(&mut self, date: NaiveDate, user_id: &str) -> Result<(), SignupError> {
        let key = date_key(date);
        let Some(list) = self.signups.get_mut(&key) else {
            return Err(SignupError::NotSignedUp);
        };
        let before = list.len();
        list.retain(|id| id != user_id);
        if list.len() == before {
            return Err(SignupError::NotSignedUp);
        }
        if list.is_empty() {
            self.signups.remove(&key);
        }
        Ok(())
    }

    /// Class start on `date` in the gym's local time, as a UTC instant.
    pub fn starts_at(&self, date: NaiveDate, offset: FixedOffset) -> Option<DateTime<Utc>> {
        let time = NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)?;
        offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Refuse signups once `now` is within `cutoff_minutes` of the class start.
/// A cutoff of 0 keeps signups open.
pub fn check_signup_open(
    now: DateTime<Utc>,
    class_start: DateTime<Utc>,
    cutoff_minutes: u32,
) -> Result<(), SignupError> {
    if cutoff_minutes == 0 {
        return Ok(());
    }
    if now >= class_start - Duration::minutes(i64::from(cutoff_minutes)) {
        return Err(SignupError::Closed { cutoff_minutes });
    }
    Ok(())
}

/// Strictest cutoff across the groups a workout is programmed for.
pub fn effective_cutoff_minutes<'a>(groups: impl IntoIterator<Item = &'a WorkoutGroup>) -> u32 {
    groups
        .into_iter()
        .map(|g| g.signup_cutoff_minutes)
        .max()
        .unwrap_or(0)
}

/// Time slots for a new workout, merged from its groups' templates.
/// Slots at the same time collapse into one with the largest capacity
/// (unlimited wins).
pub fn slots_from_groups<'a>(groups: impl IntoIterator<Item = &'a WorkoutGroup>) -> Vec<TimeSlot> {
    let mut by_time: BTreeMap<(u8, u8), TimeSlot> = BTreeMap::new();

    for template in groups.into_iter().flat_map(|g| g.default_time_slots.iter()) {
        by_time
            .entry((template.hour, template.minute))
            .and_modify(|slot| {
                if slot.capacity != 0 && (template.capacity == 0 || template.capacity > slot.capacity)
                {
                    slot.capacity = template.capacity;
                }
            })
            .or_insert_with(|| TimeSlot::from_template(template));
    }

    by_time.into_values().collect()
}

/// Workout programmed for one or more groups, possibly recurring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledWorkout {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub workout_type: WorkoutType,
    #[serde(default)]
    pub components: Vec<WorkoutComponent>,
    #[serde(default)]
    pub group_ids: Vec<String>,
    #[serde(default)]
    pub gym_id: Option<String>,
    pub created_by: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
    #[serde(default)]
    pub hide_details: bool,
    #[serde(default)]
    pub reveal_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub const HIDDEN_TITLE: &str = "Workout details hidden";

impl ScheduledWorkout {
    /// Whether the workout happens on `date`.
    pub fn should_occur(&self, date: NaiveDate) -> bool {
        if date < self.start_date {
            return false;
        }
        if self.end_date.is_some_and(|end| date > end) {
            return false;
        }

        match &self.recurrence {
            Recurrence::Once => date == self.start_date,
            Recurrence::Daily => true,
            Recurrence::Weekly { selected_days } => selected_days.contains(&Weekday::of(date)),
            Recurrence::Monthly { option } => option.matches(date),
        }
    }

    /// Dates in `[from, to]` on which the workout occurs.
    pub fn occurrences_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        from.iter_days()
            .take_while(|d| *d <= to)
            .take(MAX_OCCURRENCE_DAYS as usize)
            .filter(|d| self.should_occur(*d))
            .collect()
    }

    /// Whether details are still hidden from athletes at `now`.
    pub fn details_hidden(&self, now: DateTime<Utc>) -> bool {
        self.hide_details && self.reveal_at.is_none_or(|reveal| now < reveal)
    }

    /// Copy with title, description and components removed.
    pub fn redacted(&self) -> Self {
        Self {
            title: HIDDEN_TITLE.to_string(),
            description: String::new(),
            components: Vec::new(),
            ..self.clone()
        }
    }

    pub fn slot(&self, slot_id: &str) -> Option<&TimeSlot> {
        self.time_slots.iter().find(|s| s.id == slot_id)
    }

    pub fn slot_mut(&mut self, slot_id: &str) -> Option<&mut TimeSlot> {
        self.time_slots.iter_mut().find(|s| s.id == slot_id)
    }
}
