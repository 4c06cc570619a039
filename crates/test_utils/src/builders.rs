//! Test Data Builders
//!
//! Builders for admission test data with sensible defaults, so that tests
//! only spell out the fields they care about.

use chrono::{DateTime, NaiveDateTime, Utc};
use fake::faker::name::en::Name;
use fake::Fake;

use core_kernel::{AccountId, EpisodeId, OperatorId, PatientId};
use domain_admission::{AccountStatus, AssuranceInput, BillingAccount, HospitalizationEpisode};

use crate::fixtures::{IdFixtures, InsuranceFixtures, TemporalFixtures};

/// Builder for hospitalization episodes
pub struct EpisodeBuilder {
    episode: HospitalizationEpisode,
}

impl Default for EpisodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EpisodeBuilder {
    /// Episode H-1001 for patient P55 under padded SOAT, with a random physician
    pub fn new() -> Self {
        let mut episode = HospitalizationEpisode::new(
            IdFixtures::episode_id(),
            IdFixtures::patient_id(),
            InsuranceFixtures::padded_soat(),
        );
        episode.admitting_physician = Some(Name().fake());
        episode.admitted_at = Some(TemporalFixtures::admission_instant().naive_utc());
        episode.department_code = Some("2090".to_string());
        episode.origin_code = Some("HO".to_string());

        Self { episode }
    }

    pub fn with_episode_id(mut self, raw: &str) -> Self {
        self.episode.episode_id = EpisodeId::parse(raw).expect("valid episode id");
        self
    }

    pub fn with_patient(mut self, patient_id: PatientId) -> Self {
        self.episode.patient_id = Some(patient_id);
        self
    }

    /// Leaves the stored patient empty
    pub fn without_patient(mut self) -> Self {
        self.episode.patient_id = None;
        self
    }

    pub fn with_insurance_code(mut self, code: impl Into<String>) -> Self {
        self.episode.insurance_code = Some(code.into());
        self
    }

    pub fn without_insurance(mut self) -> Self {
        self.episode.insurance_code = None;
        self
    }

    /// Sets a previously linked account
    pub fn linked_to(mut self, account_id: AccountId) -> Self {
        self.episode.account_id = Some(account_id);
        self
    }

    pub fn admitted_at(mut self, at: NaiveDateTime) -> Self {
        self.episode.admitted_at = Some(at);
        self
    }

    pub fn build(self) -> HospitalizationEpisode {
        self.episode
    }
}

/// Builder for billing accounts
pub struct AccountBuilder {
    account_id: AccountId,
    patient_id: PatientId,
    status: AccountStatus,
    opened_at: DateTime<Utc>,
}

impl AccountBuilder {
    /// An active account for P55 opened a week before admission
    pub fn new(account_id: &str) -> Self {
        Self {
            account_id: IdFixtures::account_id(account_id),
            patient_id: IdFixtures::patient_id(),
            status: AccountStatus::Active,
            opened_at: TemporalFixtures::days_before_admission(7),
        }
    }

    pub fn for_patient(mut self, patient_id: PatientId) -> Self {
        self.patient_id = patient_id;
        self
    }

    pub fn with_status(mut self, code: &str) -> Self {
        self.status = AccountStatus::from_code(code);
        self
    }

    pub fn opened_at(mut self, at: DateTime<Utc>) -> Self {
        self.opened_at = at;
        self
    }

    pub fn opened_days_before_admission(self, days: i64) -> Self {
        self.opened_at(TemporalFixtures::days_before_admission(days))
    }

    pub fn build(self) -> BillingAccount {
        BillingAccount {
            account_id: self.account_id,
            patient_id: self.patient_id,
            status: self.status,
            opened_at: self.opened_at,
        }
    }
}

/// Builder for caller input to an assurance call
pub struct AssuranceInputBuilder {
    input: AssuranceInput,
}

impl Default for AssuranceInputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssuranceInputBuilder {
    /// Input naming P55 and nurse01; every settlement field left to defaults
    pub fn new() -> Self {
        Self {
            input: AssuranceInput {
                patient_id: Some(IdFixtures::patient_id().to_string()),
                operating_user: Some(IdFixtures::operator().to_string()),
                ..AssuranceInput::default()
            },
        }
    }

    pub fn with_patient(mut self, raw: &str) -> Self {
        self.input.patient_id = Some(raw.to_string());
        self
    }

    pub fn without_patient(mut self) -> Self {
        self.input.patient_id = None;
        self
    }

    pub fn with_operator(mut self, operator: &OperatorId) -> Self {
        self.input.operating_user = Some(operator.to_string());
        self
    }

    pub fn without_operator(mut self) -> Self {
        self.input.operating_user = None;
        self
    }

    pub fn with_insurance_code(mut self, code: &str) -> Self {
        self.input.insurance_code = Some(code.to_string());
        self
    }

    pub fn with_admission(mut self, date: &str, time: &str) -> Self {
        self.input.admission_date = Some(date.to_string());
        self.input.admission_time = Some(time.to_string());
        self
    }

    pub fn build(self) -> AssuranceInput {
        self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_builder_defaults() {
        let episode = EpisodeBuilder::new().build();
        assert_eq!(episode.episode_id.as_str(), "H-1001");
        assert_eq!(episode.insurance_code.as_deref(), Some(" 02"));
        assert!(episode.admitting_physician.is_some());
        assert!(episode.account_id.is_none());
    }

    #[test]
    fn test_account_builder_status() {
        let closed = AccountBuilder::new("A1").with_status("C").build();
        assert!(!closed.is_active());
        assert!(AccountBuilder::new("A2").build().is_active());
    }

    #[test]
    fn test_input_builder_requires_only_identity() {
        let input = AssuranceInputBuilder::new().build();
        assert_eq!(input.patient_id.as_deref(), Some("P55"));
        assert_eq!(input.operating_user.as_deref(), Some("nurse01"));
        assert!(input.company_code.is_none());
    }
}
