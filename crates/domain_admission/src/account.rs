//! Billing accounts
//!
//! Accounts are opened exclusively by the settlement procedure. This module
//! only models them and decides which one is current for a patient.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, PatientId};

/// Storage code of an account open for charge accumulation
pub const ACTIVE_STATUS_CODE: &str = "A";

/// Account status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    /// Open for charge accumulation
    Active,
    /// Closed, settled, voided or any other stored status
    Inactive(String),
}

impl AccountStatus {
    /// Parses a raw stored status; surrounding whitespace is ignored
    pub fn from_code(raw: &str) -> Self {
        match raw.trim() {
            ACTIVE_STATUS_CODE => AccountStatus::Active,
            other => AccountStatus::Inactive(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            AccountStatus::Active => ACTIVE_STATUS_CODE,
            AccountStatus::Inactive(code) => code,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

/// A patient billing account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingAccount {
    pub account_id: AccountId,
    pub patient_id: PatientId,
    pub status: AccountStatus,
    pub opened_at: DateTime<Utc>,
}

impl BillingAccount {
    /// Creates an active account
    pub fn active(account_id: AccountId, patient_id: PatientId, opened_at: DateTime<Utc>) -> Self {
        Self {
            account_id,
            patient_id,
            status: AccountStatus::Active,
            opened_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Picks the authoritative account among a patient's accounts
///
/// Only active accounts qualify. The most recently opened one wins; equal
/// timestamps fall back to the greatest account id so the choice never
/// depends on row order.
pub fn select_current(accounts: impl IntoIterator<Item = BillingAccount>) -> Option<BillingAccount> {
    accounts
        .into_iter()
        .filter(BillingAccount::is_active)
        .max_by(|a, b| {
            a.opened_at
                .cmp(&b.opened_at)
                .then_with(|| a.account_id.cmp(&b.account_id))
        })
}
