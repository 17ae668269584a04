use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing `MM-YYYY` month values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonthParseError {
    #[error("expected MM-YYYY, got '{0}'")]
    Format(String),
    #[error("month must be between 01 and 12, got {0}")]
    MonthOutOfRange(u32),
    #[error("year out of range: {0}")]
    YearOutOfRange(i32),
}

/// Errors produced while building a query window
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("`from` ({from}) must be less than or equal to `to` ({to})")]
    Inverted { from: Month, to: Month },
}

/// A whole calendar month.
///
/// Field order matters: the derived `Ord` compares year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthParseError> {
        if !(1..=12).contains(&month) {
            return Err(MonthParseError::MonthOutOfRange(month));
        }
        // Must be representable as a NaiveDate for storage
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(MonthParseError::YearOutOfRange(year));
        }
        Ok(Self { year, month })
    }

    /// Month containing the given date; the day is discarded
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month, the form months are stored in
    pub fn first_day(&self) -> NaiveDate {
        // Validated in `new`/`from_date`
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Signed number of month steps from `self` to `other`
    pub fn months_until(&self, other: Month) -> i64 {
        (other.year as i64 - self.year as i64) * 12 + (other.month as i64 - self.month as i64)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

impl FromStr for Month {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (month, year) = trimmed
            .split_once('-')
            .ok_or_else(|| MonthParseError::Format(s.to_string()))?;

        if month.len() != 2 || year.len() != 4 {
            return Err(MonthParseError::Format(s.to_string()));
        }
        if !month.bytes().all(|b| b.is_ascii_digit()) || !year.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(MonthParseError::Format(s.to_string()));
        }

        let month: u32 = month
            .parse()
            .map_err(|_| MonthParseError::Format(s.to_string()))?;
        let year: i32 = year
            .parse()
            .map_err(|_| MonthParseError::Format(s.to_string()))?;

        Month::new(year, month)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive range of whole months `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    from: Month,
    to: Month,
}

impl Window {
    pub fn new(from: Month, to: Month) -> Result<Self, WindowError> {
        if from > to {
            return Err(WindowError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> Month {
        self.from
    }

    pub fn to(&self) -> Month {
        self.to
    }

    pub fn contains(&self, month: Month) -> bool {
        self.from <= month && month <= self.to
    }

    /// Number of months in the window, both ends included
    pub fn len_months(&self) -> u32 {
        (self.from.months_until(self.to) + 1) as u32
    }
}
