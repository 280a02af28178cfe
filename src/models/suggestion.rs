// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generated coaching suggestions shared by all athletes.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionKind {
    Today,
    Tomorrow,
    Week,
}

impl SuggestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionKind::Today => "today",
            SuggestionKind::Tomorrow => "tomorrow",
            SuggestionKind::Week => "week",
        }
    }

    /// Day the suggestion is for: today, tomorrow, or the Sunday starting this week.
    pub fn target_date(self, today: NaiveDate) -> NaiveDate {
        match self {
            SuggestionKind::Today => today,
            SuggestionKind::Tomorrow => today + Duration::days(1),
            SuggestionKind::Week => week_start(today),
        }
    }

    /// Document ID, unique per kind and target date.
    pub fn document_id(self, today: NaiveDate) -> String {
        format!("{}_{}", self.as_str(), self.target_date(today))
    }
}

/// Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Which suggestions a generation run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionBatch {
    Today,
    Tomorrow,
    Week,
    /// Today and tomorrow
    Daily,
    /// Today, tomorrow and the week
    All,
}

impl SuggestionBatch {
    /// Scheduled runs refresh the weekly plan on Sundays only.
    pub fn scheduled_for(today: NaiveDate) -> Self {
        if today.weekday() == chrono::Weekday::Sun {
            SuggestionBatch::All
        } else {
            SuggestionBatch::Daily
        }
    }

    pub fn kinds(self) -> &'static [SuggestionKind] {
        match self {
            SuggestionBatch::Today => &[SuggestionKind::Today],
            SuggestionBatch::Tomorrow => &[SuggestionKind::Tomorrow],
            SuggestionBatch::Week => &[SuggestionKind::Week],
            SuggestionBatch::Daily => &[SuggestionKind::Today, SuggestionKind::Tomorrow],
            SuggestionBatch::All => &[
                SuggestionKind::Today,
                SuggestionKind::Tomorrow,
                SuggestionKind::Week,
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSuggestion {
    pub id: String,
    pub kind: SuggestionKind,
    pub content: String,
    pub target_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_is_sunday() {
        // 2025-03-12 is a Wednesday
        assert_eq!(week_start(date(2025, 3, 12)), date(2025, 3, 9));
        assert_eq!(week_start(date(2025, 3, 9)), date(2025, 3, 9));
    }

    #[test]
    fn test_scheduled_batch() {
        assert_eq!(SuggestionBatch::scheduled_for(date(2025, 3, 9)), SuggestionBatch::All);
        assert_eq!(
            SuggestionBatch::scheduled_for(date(2025, 3, 10)),
            SuggestionBatch::Daily
        );
        assert_eq!(SuggestionBatch::Daily.kinds().len(), 2);
    }

    #[test]
    fn test_document_ids() {
        let today = date(2025, 3, 12);
        assert_eq!(SuggestionKind::Today.document_id(today), "today_2025-03-12");
        assert_eq!(
            SuggestionKind::Tomorrow.document_id(today),
            "tomorrow_2025-03-13"
        );
        assert_eq!(SuggestionKind::Week.document_id(today), "week_2025-03-09");
    }
}
