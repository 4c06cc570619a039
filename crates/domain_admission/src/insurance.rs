//! Insurance policy classification
//!
//! Only a fixed set of insurance plans needs a billing account opened through
//! settlement before charges can accumulate. Everything else is billed
//! elsewhere and the assurance workflow leaves it alone.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Insurance plan recorded on a hospitalization episode
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum InsurancePlan {
    /// Self-paying patient (code "0")
    Paying,
    /// Traffic accident insurance, SOAT (code "02")
    Soat,
    /// Other public programs (code "17")
    OtherPrograms,
    /// Any other code, including an empty one
    Unrecognized(String),
}

impl InsurancePlan {
    /// Parses a raw stored code; surrounding whitespace is ignored
    pub fn from_code(raw: &str) -> Self {
        match raw.trim() {
            "0" => InsurancePlan::Paying,
            "02" => InsurancePlan::Soat,
            "17" => InsurancePlan::OtherPrograms,
            other => InsurancePlan::Unrecognized(other.to_string()),
        }
    }

    /// Returns the storage code
    pub fn code(&self) -> &str {
        match self {
            InsurancePlan::Paying => "0",
            InsurancePlan::Soat => "02",
            InsurancePlan::OtherPrograms => "17",
            InsurancePlan::Unrecognized(code) => code,
        }
    }

    /// Returns true if episodes under this plan need a settled billing account
    pub fn requires_settlement(&self) -> bool {
        match self {
            InsurancePlan::Paying | InsurancePlan::Soat | InsurancePlan::OtherPrograms => true,
            InsurancePlan::Unrecognized(_) => false,
        }
    }
}

impl fmt::Display for InsurancePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsurancePlan::Paying => write!(f, "paying (0)"),
            InsurancePlan::Soat => write!(f, "SOAT (02)"),
            InsurancePlan::OtherPrograms => write!(f, "other programs (17)"),
            InsurancePlan::Unrecognized(code) => write!(f, "unrecognized ({:?})", code),
        }
    }
}

impl From<String> for InsurancePlan {
    fn from(raw: String) -> Self {
        InsurancePlan::from_code(&raw)
    }
}

impl From<InsurancePlan> for String {
    fn from(plan: InsurancePlan) -> String {
        plan.code().to_string()
    }
}

/// Billing-eligibility decision for an insurance code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsuranceEligibility {
    pub plan: InsurancePlan,
    pub requires_settlement: bool,
}

/// Classifies a raw insurance code. Total over all input.
pub fn classify(insurance_code: &str) -> InsuranceEligibility {
    let plan = InsurancePlan::from_code(insurance_code);
    let requires_settlement = plan.requires_settlement();
    InsuranceEligibility {
        plan,
        requires_settlement,
    }
}
