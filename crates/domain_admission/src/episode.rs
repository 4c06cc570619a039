//! Hospitalization episodes
//!
//! Episodes are created by the admission desk. The assurance workflow only
//! reads the billing-relevant projection and writes back the linked account
//! and the operating user.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, EpisodeId, OperatorId, PatientId};

use crate::insurance::{classify, InsuranceEligibility};

/// A hospitalization admission record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalizationEpisode {
    pub episode_id: EpisodeId,
    pub patient_id: Option<PatientId>,
    /// Raw stored insurance code, possibly padded
    pub insurance_code: Option<String>,
    pub company_code: Option<String>,
    pub department_code: Option<String>,
    pub admitting_physician: Option<String>,
    pub admitted_at: Option<NaiveDateTime>,
    pub observation: Option<String>,
    pub origin_code: Option<String>,
    pub operating_user: Option<OperatorId>,
    pub fua_number: Option<String>,
    pub billing_service_code: Option<String>,
    pub account_id: Option<AccountId>,
}

impl HospitalizationEpisode {
    /// Creates an episode with only its identity, patient and insurance set
    pub fn new(episode_id: EpisodeId, patient_id: PatientId, insurance_code: impl Into<String>) -> Self {
        Self {
            episode_id,
            patient_id: Some(patient_id),
            insurance_code: Some(insurance_code.into()),
            company_code: None,
            department_code: None,
            admitting_physician: None,
            admitted_at: None,
            observation: None,
            origin_code: None,
            operating_user: None,
            fua_number: None,
            billing_service_code: None,
            account_id: None,
        }
    }

    /// Projects the fields the assurance workflow reads
    pub fn billing_profile(&self) -> EpisodeBillingProfile {
        EpisodeBillingProfile {
            episode_id: self.episode_id.clone(),
            patient_id: self.patient_id.clone(),
            insurance_code: self.insurance_code.clone(),
            account_id: self.account_id.clone(),
        }
    }
}

/// Billing-relevant projection of an episode, read inside the assurance transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeBillingProfile {
    pub episode_id: EpisodeId,
    pub patient_id: Option<PatientId>,
    pub insurance_code: Option<String>,
    pub account_id: Option<AccountId>,
}

impl EpisodeBillingProfile {
    /// Classifies the stored insurance code; a missing code is unrecognized
    pub fn eligibility(&self) -> InsuranceEligibility {
        classify(self.insurance_code.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insurance::InsurancePlan;

    #[test]
    fn test_profile_eligibility_uses_stored_code() {
        let mut episode = HospitalizationEpisode::new(
            EpisodeId::parse("H-1").unwrap(),
            PatientId::parse("P1").unwrap(),
            " 17 ",
        );
        let eligibility = episode.billing_profile().eligibility();
        assert_eq!(eligibility.plan, InsurancePlan::OtherPrograms);
        assert!(eligibility.requires_settlement);

        episode.insurance_code = None;
        assert!(!episode.billing_profile().eligibility().requires_settlement);
    }
}
