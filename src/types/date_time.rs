use std::{fmt, str::FromStr};

use chrono::{NaiveDate, SecondsFormat, Utc};

use crate::{Error, Result};

/// A UTC instant with millisecond precision, stored as milliseconds since the
/// Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DateTime(i64);

impl DateTime {
    pub const UNIX_EPOCH: Self = Self(0);
    pub const MIN: Self = Self(i64::MIN);
    pub const MAX: Self = Self(i64::MAX);

    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    #[inline]
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }

    pub fn to_chrono(self) -> Option<chrono::DateTime<Utc>> {
        chrono::DateTime::<Utc>::from_timestamp_millis(self.0)
    }

    /// RFC 3339 rendering with millisecond precision and a `Z` suffix, or
    /// `None` when the instant is outside the representable calendar range.
    pub fn try_to_rfc3339(self) -> Option<String> {
        self.to_chrono()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Parses an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date taken as
    /// midnight UTC.
    pub fn parse_rfc3339(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.timestamp_millis()));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Self(naive.and_utc().timestamp_millis()))
            .ok_or_else(|| Error::Format(format!("'{s}' is not a valid date-time")))
    }
}

impl FromStr for DateTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_rfc3339(s)
    }
}

impl From<chrono::DateTime<Utc>> for DateTime {
    fn from(dt: chrono::DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_to_rfc3339() {
            Some(text) => f.write_str(&text),
            None => write!(f, "{}ms", self.0),
        }
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DateTime({self})")
    }
}
