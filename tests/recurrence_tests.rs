// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recurrence rules checked over a full year of dates.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use std::collections::BTreeSet;
use wod_tracker::models::schedule::WorkoutType;
use wod_tracker::models::{MonthlyOption, Recurrence, ScheduledWorkout, Weekday};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn workout(recurrence: Recurrence, end_date: Option<NaiveDate>) -> ScheduledWorkout {
    ScheduledWorkout {
        id: "w".to_string(),
        title: "Cindy".to_string(),
        description: String::new(),
        workout_type: WorkoutType::Wod,
        components: Vec::new(),
        group_ids: Vec::new(),
        gym_id: None,
        created_by: "coach".to_string(),
        start_date: date(2025, 2, 14),
        end_date,
        recurrence,
        time_slots: Vec::new(),
        hide_details: false,
        reveal_at: None,
        created_at: Utc::now(),
    }
}

fn recurrences() -> Vec<Recurrence> {
    vec![
        Recurrence::Once,
        Recurrence::Daily,
        Recurrence::Weekly {
            selected_days: BTreeSet::from([Weekday::Monday, Weekday::Thursday, Weekday::Saturday]),
        },
        Recurrence::Monthly {
            option: MonthlyOption::SpecificDay { day: 30 },
        },
        Recurrence::Monthly {
            option: MonthlyOption::NthWeekday {
                week: 3,
                weekday: Weekday::Wednesday,
            },
        },
        Recurrence::Monthly {
            option: MonthlyOption::LastWeekday {
                weekday: Weekday::Sunday,
            },
        },
        Recurrence::Monthly {
            option: MonthlyOption::LastDayOfMonth,
        },
    ]
}

fn year() -> impl Iterator<Item = NaiveDate> {
    date(2025, 1, 1).iter_days().take(365)
}

#[test]
fn test_never_before_start_or_after_end() {
    let end = date(2025, 9, 30);
    for recurrence in recurrences() {
        let w = workout(recurrence, Some(end));
        for day in year() {
            if day < w.start_date || day > end {
                assert!(!w.should_occur(day), "{:?} on {day}", w.recurrence);
            }
        }
    }
}

#[test]
fn test_once_is_a_single_day() {
    let w = workout(Recurrence::Once, None);
    let days: Vec<NaiveDate> = year().filter(|d| w.should_occur(*d)).collect();
    assert_eq!(days, vec![w.start_date]);
}

#[test]
fn test_weekly_only_on_selected_days() {
    let selected = BTreeSet::from([Weekday::Monday, Weekday::Thursday, Weekday::Saturday]);
    let w = workout(
        Recurrence::Weekly {
            selected_days: selected.clone(),
        },
        None,
    );
    for day in year().filter(|d| *d >= w.start_date) {
        assert_eq!(
            w.should_occur(day),
            selected.contains(&Weekday::of(day)),
            "{day}"
        );
    }
}

#[test]
fn test_monthly_options_occur_once_per_month() {
    for recurrence in recurrences()
        .into_iter()
        .filter(|r| matches!(r, Recurrence::Monthly { .. }))
    {
        let w = workout(recurrence, None);
        for month in 3..=12 {
            let count = year()
                .filter(|d| d.month() == month && w.should_occur(*d))
                .count();
            assert_eq!(count, 1, "{:?} in month {month}", w.recurrence);
        }
    }
}

#[test]
fn test_specific_day_clamps_in_short_months() {
    let w = workout(
        Recurrence::Monthly {
            option: MonthlyOption::SpecificDay { day: 30 },
        },
        None,
    );
    // 2025-02-28 is after the start date and February has no 30th
    assert!(w.should_occur(date(2025, 2, 28)));
    assert!(w.should_occur(date(2025, 4, 30)));
    assert!(!w.should_occur(date(2025, 5, 31)));
}

#[test]
fn test_occurrences_between_matches_should_occur() {
    for recurrence in recurrences() {
        let w = workout(recurrence, None);
        let from = date(2025, 1, 1);
        let to = from + Duration::days(200);
        let expected: Vec<NaiveDate> = from
            .iter_days()
            .take_while(|d| *d <= to)
            .filter(|d| w.should_occur(*d))
            .collect();
        assert_eq!(w.occurrences_between(from, to), expected);
    }
}
