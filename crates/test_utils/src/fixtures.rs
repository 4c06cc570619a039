//! Pre-built Test Fixtures
//!
//! Consistent, predictable test data for the admission domain.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

use core_kernel::{AccountId, EpisodeId, FixedClock, LocalCalendar, OperatorId, PatientId, Timezone};

/// Fixture identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn episode_id() -> EpisodeId {
        EpisodeId::parse("H-1001").expect("valid episode id")
    }

    pub fn patient_id() -> PatientId {
        PatientId::parse("P55").expect("valid patient id")
    }

    pub fn operator() -> OperatorId {
        OperatorId::parse("nurse01").expect("valid operator")
    }

    pub fn account_id(raw: &str) -> AccountId {
        AccountId::parse(raw).expect("valid account id")
    }
}

/// Insurance codes as stored by the admission desk
pub struct InsuranceFixtures;

impl InsuranceFixtures {
    /// Codes that require a settled account
    pub const ELIGIBLE: [&'static str; 3] = ["0", "02", "17"];

    /// SOAT with the leading space legacy rows carry
    pub fn padded_soat() -> &'static str {
        " 02"
    }

    /// A plan that never settles
    pub fn ineligible() -> &'static str {
        "05"
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// 2024-07-15 14:05:09 UTC, which is 15/07/2024 09:05:09 in Lima
    pub fn admission_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 14, 5, 9).unwrap()
    }

    /// An account opening time before `admission_instant`
    pub fn days_before_admission(days: i64) -> DateTime<Utc> {
        Self::admission_instant() - chrono::Duration::days(days)
    }

    /// Lima calendar frozen at `admission_instant`
    pub fn lima_calendar() -> LocalCalendar {
        LocalCalendar::new(
            Timezone::default(),
            Arc::new(FixedClock(Self::admission_instant())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lima_calendar_formats() {
        let calendar = TemporalFixtures::lima_calendar();
        assert_eq!(calendar.today(), "15/07/2024");
        assert_eq!(calendar.time_of_day(), "09:05:09");
    }

    #[test]
    fn test_ordering_of_instants() {
        assert!(TemporalFixtures::days_before_admission(3) < TemporalFixtures::admission_instant());
    }
}
