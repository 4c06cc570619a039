//! Local calendar handling
//!
//! Admission dates and times are recorded by the legacy settlement procedure
//! as text in the hospital's local calendar (`DD/MM/YYYY` and `HH:MM:SS`).
//! This module provides:
//! - `Timezone`: a serializable wrapper around `chrono_tz::Tz`
//! - `Clock`: an injectable source of the current instant
//! - `LocalCalendar`: formats the current instant in the hospital timezone

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::CoreError;

/// Date format expected by the settlement procedure
pub const ADMISSION_DATE_FORMAT: &str = "%d/%m/%Y";

/// Time format expected by the settlement procedure
pub const ADMISSION_TIME_FORMAT: &str = "%H:%M:%S";

/// Timezone wrapper for the hospital's local calendar
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for Timezone {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s.trim())
            .map(Timezone)
            .map_err(|_| CoreError::Configuration(format!("Invalid timezone: {}", s)))
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name())
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Converts a UTC datetime to the local timezone
    pub fn to_local(&self, utc: DateTime<Utc>) -> DateTime<Tz> {
        utc.with_timezone(&self.0)
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::America::Lima)
    }
}

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant, for deterministic tests
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The hospital's local calendar
#[derive(Clone)]
pub struct LocalCalendar {
    timezone: Timezone,
    clock: Arc<dyn Clock>,
}

impl LocalCalendar {
    /// Creates a calendar reading the given clock in the given timezone
    pub fn new(timezone: Timezone, clock: Arc<dyn Clock>) -> Self {
        Self { timezone, clock }
    }

    /// Creates a calendar backed by the system clock
    pub fn system(timezone: Timezone) -> Self {
        Self::new(timezone, Arc::new(SystemClock))
    }

    pub fn timezone(&self) -> Timezone {
        self.timezone
    }

    /// Current local date formatted as `DD/MM/YYYY`
    pub fn today(&self) -> String {
        self.timezone
            .to_local(self.clock.now())
            .format(ADMISSION_DATE_FORMAT)
            .to_string()
    }

    /// Current local time formatted as `HH:MM:SS`
    pub fn time_of_day(&self) -> String {
        self.timezone
            .to_local(self.clock.now())
            .format(ADMISSION_TIME_FORMAT)
            .to_string()
    }
}

impl fmt::Debug for LocalCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCalendar")
            .field("timezone", &self.timezone)
            .finish_non_exhaustive()
    }
}

impl Default for LocalCalendar {
    fn default() -> Self {
        Self::system(Timezone::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_local_date_crosses_midnight() {
        // 03:30 UTC is still the previous evening in Lima (UTC-5)
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 2, 3, 30, 0).unwrap());
        let calendar = LocalCalendar::new(Timezone::default(), Arc::new(clock));

        assert_eq!(calendar.today(), "01/03/2024");
        assert_eq!(calendar.time_of_day(), "22:30:00");
    }

    #[test]
    fn test_timezone_parse() {
        let tz: Timezone = " America/Lima ".parse().unwrap();
        assert_eq!(tz.to_string(), "America/Lima");
        assert!("Mars/Olympus".parse::<Timezone>().is_err());
    }
}
