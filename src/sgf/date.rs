//! Fuzzy dates from the SGF `DT` property
//!
//! `DT` values may be partial (`2024`, `2024-03`) and may list several
//! comma-separated dates for multi-day games (`2024-03-01,02`). Only the
//! first date matters for ingestion; it becomes the game's start instant.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Regex for the leading date of a `DT` value
static FUZZY_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Matches: YYYY, YYYY-MM or YYYY-MM-DD
    Regex::new(r"^(\d{4})(?:-(\d{2})(?:-(\d{2}))?)?$").expect("Invalid fuzzy date regex")
});

/// A possibly partial calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

/// Why a `DT` value could not be read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date '{value}'")]
pub struct DateError {
    pub value: String,
}

impl FuzzyDate {
    /// Parse the first date of a `DT` property value
    pub fn parse(value: &str) -> Result<Self, DateError> {
        let invalid = || DateError {
            value: value.to_string(),
        };

        let first = value.split(',').next().unwrap_or_default().trim();
        let caps = FUZZY_DATE_REGEX.captures(first).ok_or_else(invalid)?;

        let year = caps[1].parse::<i32>().map_err(|_| invalid())?;
        let month = caps
            .get(2)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| invalid())?;
        let day = caps
            .get(3)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| invalid())?;

        let date = Self { year, month, day };

        // Reject impossible calendar dates like 2023-02-30
        date.first_day().ok_or_else(invalid)?;
        Ok(date)
    }

    /// First calendar day covered by this date
    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.unwrap_or(1), self.day.unwrap_or(1))
    }

    /// Earliest instant covered by this date, at midnight UTC
    pub fn start_instant(&self) -> DateTime<Utc> {
        let day = self.first_day().unwrap_or(NaiveDate::MIN);
        Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
    }

    /// RFC 3339 text of [`Self::start_instant`], e.g. `2024-03-01T00:00:00Z`
    pub fn to_rfc3339(&self) -> String {
        self.start_instant()
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl fmt::Display for FuzzyDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{:02}", month)?;
            if let Some(day) = self.day {
                write!(f, "-{:02}", day)?;
            }
        }
        Ok(())
    }
}
