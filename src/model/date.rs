//! Transaction dates and the calendar weeks they fall into.
//!
//! Dates in exported statements are written day-first (`31/01/2024`), so the parser splits the
//! date into its parts itself rather than guessing with a list of `strftime` patterns. A four-digit
//! leading part is read as an ISO `YYYY-MM-DD` date, which is never ambiguous.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use std::error::Error as StdError;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DateError(String);

impl Display for DateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for DateError {}

/// A parsed transaction timestamp. Most sources only carry a date, in which case the time is
/// midnight.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TransactionDate(NaiveDateTime);

impl TransactionDate {
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    /// The start of the week this transaction falls in.
    pub fn week_start(&self) -> Option<WeekStart> {
        WeekStart::of(self.date())
    }
}

impl FromStr for TransactionDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DateError(String::from("The date is empty")));
        }

        let (date_part, time_part) = match s.split_once(['T', ' ']) {
            Some((d, t)) => (d, Some(t.trim())),
            None => (s, None),
        };

        let date = parse_date(date_part)?;
        let time = match time_part {
            None | Some("") => NaiveTime::MIN,
            Some(t) => NaiveTime::parse_from_str(t, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
                .map_err(|e| DateError(format!("Invalid time '{t}': {e}")))?,
        };

        Ok(Self(date.and_time(time)))
    }
}

/// Parses `DD/MM/YYYY`, `DD-MM-YY`, `DD.MM.YYYY` (any of the three separators) or `YYYY-MM-DD`.
fn parse_date(s: &str) -> Result<NaiveDate, DateError> {
    let parts: Vec<&str> = s.split(['/', '-', '.']).collect();
    let [first, second, third] = parts.as_slice() else {
        return Err(DateError(format!(
            "Expected a date with three parts like 31/01/2024, got '{s}'"
        )));
    };

    let (year, month, day) = if first.len() == 4 {
        (*first, *second, *third)
    } else {
        (*third, *second, *first)
    };

    let number = |part: &str, what: &str| -> Result<u32, DateError> {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DateError(format!("Invalid {what} '{part}' in date '{s}'")));
        }
        part.parse::<u32>()
            .map_err(|e| DateError(format!("Invalid {what} '{part}' in date '{s}': {e}")))
    };

    let day = number(day, "day")?;
    let month = number(month, "month")?;
    let year = match year.len() {
        // Two-digit years follow the strftime `%y` pivot: 00-68 are 20xx, 69-99 are 19xx.
        2 => {
            let yy = number(year, "year")?;
            if yy <= 68 {
                2000 + yy
            } else {
                1900 + yy
            }
        }
        4 => number(year, "year")?,
        _ => {
            return Err(DateError(format!(
                "Invalid year '{year}' in date '{s}', expected 2 or 4 digits"
            )))
        }
    };

    let year = i32::try_from(year).map_err(|e| DateError(e.to_string()))?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateError(format!("'{s}' is not a valid calendar date")))
}

impl Display for TransactionDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.time() == NaiveTime::MIN {
            write!(f, "{}", self.0.format("%Y-%m-%d"))
        } else {
            write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
        }
    }
}

impl Serialize for TransactionDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// The Monday that starts a calendar week. Weeks run Monday 00:00 through Sunday 23:59:59.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct WeekStart(NaiveDate);

impl WeekStart {
    /// Returns the Monday on or before `date`. This is `None` only for dates in the first days
    /// of the range `chrono` can represent.
    pub fn of(date: NaiveDate) -> Option<Self> {
        // Day 1 of the common era, 0001-01-01, is a Monday in the proleptic Gregorian calendar.
        let days = date.num_days_from_ce();
        let offset = (days - 1).rem_euclid(7);
        NaiveDate::from_num_days_from_ce_opt(days - offset).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The first instant of the week.
    pub fn start_instant(&self) -> NaiveDateTime {
        self.0.and_time(NaiveTime::MIN)
    }

    /// Whether `date` falls within this week.
    pub fn contains(&self, date: NaiveDate) -> bool {
        WeekStart::of(date) == Some(*self)
    }
}

impl Display for WeekStart {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl Serialize for WeekStart {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
