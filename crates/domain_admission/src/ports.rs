//! Admission Domain Ports
//!
//! This module defines the interfaces the assurance workflow needs from the
//! outside world. Two adapters implement them:
//!
//! - **PostgreSQL** (`infra_db`): hospitalization and account tables plus the
//!   legacy settlement function
//! - **In-memory** (`adapters::memory`): for tests and local demos
//!
//! # Transactions
//!
//! Every read and write of one assurance call goes through a single
//! `RecordTransaction`. Components never open their own transactions; they
//! receive the handle explicitly:
//!
//! ```rust,ignore
//! let mut tx = store.begin().await?;
//! let account = resolver.resolve_active_account(&mut tx, &patient_id).await?;
//! tx.link_account(&episode_id, &account.account_id, &operator).await?;
//! tx.commit().await?;
//! ```
//!
//! A transaction dropped without `commit` must leave no trace.

use async_trait::async_trait;
use std::sync::Arc;

use core_kernel::{
    AccountId, DomainPort, EpisodeId, HealthCheckable, OperatorId, PatientId, PortError,
};

use crate::account::BillingAccount;
use crate::episode::EpisodeBillingProfile;
use crate::settlement::{ProcedureReply, SettlementRequest};

/// Entry point to the record store
#[async_trait]
pub trait RecordStore: DomainPort + HealthCheckable {
    /// Transaction handle produced by this store
    type Tx: RecordTransaction;

    /// Opens a transaction with at least read-committed isolation
    async fn begin(&self) -> Result<Self::Tx, PortError>;
}

/// Operations available inside one record store transaction
#[async_trait]
pub trait RecordTransaction: Send {
    /// Reads the billing projection of an episode, keyed by its trimmed id
    async fn episode_billing_profile(
        &mut self,
        episode_id: &EpisodeId,
    ) -> Result<Option<EpisodeBillingProfile>, PortError>;

    /// Reads the patient's active accounts, most recently opened first
    async fn active_accounts(
        &mut self,
        patient_id: &PatientId,
    ) -> Result<Vec<BillingAccount>, PortError>;

    /// Writes the linked account and operating user onto the episode
    ///
    /// Returns the number of episode rows updated.
    async fn link_account(
        &mut self,
        episode_id: &EpisodeId,
        account_id: &AccountId,
        operator: &OperatorId,
    ) -> Result<u64, PortError>;

    /// Serializes concurrent assurance calls for the same patient until the
    /// transaction ends. Stores without such a facility do nothing.
    async fn lock_patient(&mut self, _patient_id: &PatientId) -> Result<(), PortError> {
        Ok(())
    }

    async fn commit(self) -> Result<(), PortError>;

    async fn rollback(self) -> Result<(), PortError>;
}

/// The legacy settlement procedure, treated as a black box
///
/// It runs inside the caller's transaction so that an account opened by it
/// disappears together with everything else on rollback.
#[async_trait]
pub trait SettlementProcedure<Tx: RecordTransaction>: DomainPort {
    /// Invokes the procedure exactly once and returns its raw reply
    async fn invoke(
        &self,
        tx: &mut Tx,
        request: &SettlementRequest,
    ) -> Result<ProcedureReply, PortError>;
}

#[async_trait]
impl<Tx, P> SettlementProcedure<Tx> for Arc<P>
where
    Tx: RecordTransaction,
    P: SettlementProcedure<Tx>,
{
    async fn invoke(
        &self,
        tx: &mut Tx,
        request: &SettlementRequest,
    ) -> Result<ProcedureReply, PortError> {
        self.as_ref().invoke(tx, request).await
    }
}
