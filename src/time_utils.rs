// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for calendar dates in request parameters.

use crate::error::AppError;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Parse a `YYYY-MM-DD` query or path parameter.
pub fn parse_date_param(name: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("{name} must be a YYYY-MM-DD date, got {value:?}")))
}

/// Calendar day at `now` in the given local offset.
pub fn local_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}
