//! Day normalization and view ranges.
//!
//! Every date the service touches is a whole UTC day. Week and month views
//! are half-open `[start, end)` ranges of days.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};

use crate::error::{CalendarError, Result};

/// Wire layout for dates in requests.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Truncate an instant to its UTC calendar day.
pub fn normalize_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// UTC midnight at the start of `day`.
pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Parse a `YYYY-MM-DD` day.
pub fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DAY_FORMAT)
        .map_err(|_| CalendarError::InvalidInput("invalid date (YYYY-MM-DD)".to_string()))
}

/// Monday-to-Monday range of the ISO week containing `day`.
pub fn week_bounds(day: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    // Same as (weekday + 6) % 7 with Sunday = 0: Monday maps to offset 0.
    let offset = u64::from(day.weekday().num_days_from_monday());
    let monday = day.checked_sub_days(Days::new(offset)).ok_or_else(out_of_range)?;
    let next_monday = monday.checked_add_days(Days::new(7)).ok_or_else(out_of_range)?;
    Ok((monday, next_monday))
}

/// First day of the month of `day` up to the first day of the next month.
pub fn month_bounds(day: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let first = day.with_day(1).ok_or_else(out_of_range)?;
    let next = first.checked_add_months(Months::new(1)).ok_or_else(out_of_range)?;
    Ok((first, next))
}

fn out_of_range() -> CalendarError {
    CalendarError::InvalidInput("date out of supported range".to_string())
}

/// Serde adapter writing a day as UTC midnight in RFC 3339.
///
/// Reading accepts either RFC 3339 (truncated to its UTC day) or `YYYY-MM-DD`.
pub mod day_format {
    use chrono::{DateTime, NaiveDate, SecondsFormat};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{day_start, DAY_FORMAT};

    pub fn serialize<S: Serializer>(day: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&day_start(*day).to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(instant) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(instant.naive_utc().date());
        }
        NaiveDate::parse_from_str(&raw, DAY_FORMAT).map_err(de::Error::custom)
    }
}
