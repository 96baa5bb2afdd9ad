// Time utility functions

use crate::Error;

use crate::error::{self, FFError};
use crate::Result;
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use std;
use std::fmt::{Display, Formatter};
use std::ops::Add;

enum Time {
    Second,
    Minute,
    Hour,
    Day,
}

impl Time {
    fn to_seconds(&self) -> u64 {
        match self {
            Time::Second => 1,
            Time::Minute => 60,
            Time::Hour => 3600,
            Time::Day => 86400,
        }
    }
}

impl TryFrom<char> for Time {
    type Error = Error;

    fn try_from(time: char) -> std::result::Result<Self, Self::Error> {
        match time {
            's' => Ok(Time::Second),
            'm' => Ok(Time::Minute),
            'h' => Ok(Time::Hour),
            'd' => Ok(Time::Day),
            _ => Err(error::gen(format!(
                "Unknown char time format: {} - valid types are s, m, h, d",
                time
            ))),
        }
    }
}

/// Source of the current instant. Every request samples it exactly once, so
/// all freshness math in a call agrees on what "now" is.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<K: Clock + ?Sized> Clock for &K {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Seconds(u64);

impl Seconds {
    pub fn new(seconds: u64) -> Self {
        Seconds(seconds)
    }

    pub fn to_duration(self) -> std::time::Duration {
        std::time::Duration::from_secs(self.0)
    }
}

/// Shift a point in time forward by a number of seconds.
impl Add<Seconds> for DateTime<Utc> {
    type Output = DateTime<Utc>;

    fn add(self, rhs: Seconds) -> Self::Output {
        i64::try_from(rhs.0)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|delta| self.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Display for Seconds {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Convert a string with time format to seconds.
/// A string with time format can be anything like:
/// 1s, 2s, 2 seconds, 2 second, 2seconds, 2second, 2 s
/// The same would apply for minutes, hours and days
/// Processing stops at the first non-digit character
fn string_to_seconds(str_fmt: &str) -> Result<Seconds> {
    let mut seconds: u64 = 0;
    for c in str_fmt.chars() {
        if let Some(digit) = c.to_digit(10) {
            seconds = seconds.saturating_mul(10).saturating_add(digit as u64);
        } else {
            if c.is_whitespace() {
                continue;
            }
            seconds = seconds.saturating_mul(Time::try_from(c)?.to_seconds());
            break;
        }
    }
    Ok(Seconds(seconds))
}

impl TryFrom<&str> for Seconds {
    type Error = FFError;

    fn try_from(str_fmt: &str) -> std::result::Result<Self, Self::Error> {
        match string_to_seconds(str_fmt) {
            Ok(seconds) => Ok(seconds),
            Err(err) => Err(FFError::TimeConversionError(format!(
                "Could not convert {} to time format: {}",
                str_fmt, err,
            ))),
        }
    }
}

// Obsolete HTTP-date forms still accepted by recipients, always in GMT.
const RFC_850_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Parse a timestamp as found in stored entries (ISO-8601) or in HTTP date
/// headers: IMF-fixdate (`Wed, 21 Oct 2015 07:28:00 GMT`), RFC 850
/// (`Wednesday, 21-Oct-15 07:28:00 GMT`) or asctime
/// (`Wed Oct 21 07:28:00 2015`).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|date| date.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, RFC_850_FORMAT).map(|date| date.and_utc())
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, ASCTIME_FORMAT).map(|date| date.and_utc())
        })
        .map_err(|err| {
            FFError::TimeConversionError(format!(
                "Could not convert {} to date format: {}",
                value, err
            ))
            .into()
        })
}

/// ISO-8601 in UTC with millisecond precision: `2024-01-01T00:00:00.000Z`
pub fn to_iso_string(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}
