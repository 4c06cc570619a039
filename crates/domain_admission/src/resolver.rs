//! Active account resolution

use tracing::debug;

use core_kernel::{PatientId, PortError};

use crate::account::{select_current, BillingAccount};
use crate::ports::RecordTransaction;

/// Finds the patient's current active billing account
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountResolver;

impl AccountResolver {
    pub fn new() -> Self {
        Self
    }

    /// Returns the most recently opened active account, if any
    ///
    /// Pure read inside the caller's transaction. Storage failures are
    /// propagated unchanged.
    pub async fn resolve_active_account<Tx: RecordTransaction>(
        &self,
        tx: &mut Tx,
        patient_id: &PatientId,
    ) -> Result<Option<BillingAccount>, PortError> {
        let accounts = tx.active_accounts(patient_id).await?;
        let candidates = accounts.len();
        let current = select_current(accounts);

        debug!(
            %patient_id,
            candidates,
            account_id = current.as_ref().map(|a| a.account_id.as_str()),
            "Resolved active account"
        );
        Ok(current)
    }
}
