//! In-memory record store and scripted settlement procedure
//!
//! The store serializes transactions: `begin` takes an exclusive lock that is
//! held until the transaction commits, rolls back or is dropped. Writes are
//! staged on a private copy and published only on commit, so a dropped
//! transaction leaves no trace.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use core_kernel::{
    AccountId, DomainPort, EpisodeId, HealthCheckResult, HealthCheckable,
    OperatorId, PatientId, PortError,
};

use crate::account::BillingAccount;
use crate::episode::{EpisodeBillingProfile, HospitalizationEpisode};
use crate::ports::{RecordStore, RecordTransaction, SettlementProcedure};
use crate::settlement::{ProcedureReply, SettlementRequest};

const MEMORY_ADAPTER_ID: &str = "memory-record-store";

/// Points at which a failure can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Begin,
    ReadEpisode,
    ReadAccounts,
    LinkAccount,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    episodes: HashMap<EpisodeId, HospitalizationEpisode>,
    accounts: Vec<BillingAccount>,
}

#[derive(Debug, Default)]
struct Counters {
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
    link_writes: AtomicUsize,
}

/// Transactional in-memory record store
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Mutex<HashSet<FailurePoint>>>,
    counters: Arc<Counters>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an episode
    pub async fn insert_episode(&self, episode: HospitalizationEpisode) {
        self.state
            .lock()
            .await
            .episodes
            .insert(episode.episode_id.clone(), episode);
    }

    /// Inserts an account as if it had been settled earlier
    pub async fn insert_account(&self, account: BillingAccount) {
        self.state.lock().await.accounts.push(account);
    }

    /// Committed state of an episode; the id is trimmed before lookup
    pub async fn episode(&self, episode_id: &str) -> Option<HospitalizationEpisode> {
        let id = EpisodeId::parse(episode_id).ok()?;
        self.state.lock().await.episodes.get(&id).cloned()
    }

    /// Committed accounts of a patient, in insertion order
    pub async fn accounts_of(&self, patient_id: &str) -> Vec<BillingAccount> {
        self.state
            .lock()
            .await
            .accounts
            .iter()
            .filter(|a| a.patient_id.as_str() == patient_id.trim())
            .cloned()
            .collect()
    }

    /// Makes every later call reaching `point` fail with a connection error
    pub async fn fail_at(&self, point: FailurePoint) {
        self.faults.lock().await.insert(point);
    }

    /// Removes all injected failures
    pub async fn heal(&self) {
        self.faults.lock().await.clear();
    }

    pub fn commits(&self) -> usize {
        self.counters.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.counters.rollbacks.load(Ordering::SeqCst)
    }

    /// Number of link writes attempted, committed or not
    pub fn link_writes(&self) -> usize {
        self.counters.link_writes.load(Ordering::SeqCst)
    }

    async fn check(&self, point: FailurePoint) -> Result<(), PortError> {
        check(&self.faults, point).await
    }
}

async fn check(faults: &Mutex<HashSet<FailurePoint>>, point: FailurePoint) -> Result<(), PortError> {
    if faults.lock().await.contains(&point) {
        return Err(PortError::connection(format!("injected failure at {:?}", point)));
    }
    Ok(())
}

impl DomainPort for InMemoryRecordStore {}

#[async_trait]
impl HealthCheckable for InMemoryRecordStore {
    /// Unhealthy while `begin` is set to fail
    async fn health_check(&self) -> HealthCheckResult {
        match self.check(FailurePoint::Begin).await {
            Ok(()) => HealthCheckResult::healthy(MEMORY_ADAPTER_ID, 0),
            Err(e) => HealthCheckResult::unhealthy(MEMORY_ADAPTER_ID, 0, e.to_string()),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, PortError> {
        self.check(FailurePoint::Begin).await?;
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTransaction {
            guard,
            staged,
            faults: Arc::clone(&self.faults),
            counters: Arc::clone(&self.counters),
        })
    }
}

/// Transaction over the in-memory store
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    faults: Arc<Mutex<HashSet<FailurePoint>>>,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for MemoryTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransaction")
            .field("episodes", &self.staged.episodes.len())
            .field("accounts", &self.staged.accounts.len())
            .finish_non_exhaustive()
    }
}

impl MemoryTransaction {
    /// Opens an active account for the patient, newer than every existing one
    pub fn open_account(&mut self, patient_id: &PatientId, account_id: AccountId) -> BillingAccount {
        let now = Utc::now();
        let opened_at = match self.staged.accounts.iter().map(|a| a.opened_at).max() {
            Some(latest) if latest >= now => latest + Duration::seconds(1),
            _ => now,
        };
        let account = BillingAccount::active(account_id, patient_id.clone(), opened_at);
        self.staged.accounts.push(account.clone());
        account
    }
}

#[async_trait]
impl RecordTransaction for MemoryTransaction {
    async fn episode_billing_profile(
        &mut self,
        episode_id: &EpisodeId,
    ) -> Result<Option<EpisodeBillingProfile>, PortError> {
        check(&self.faults, FailurePoint::ReadEpisode).await?;
        Ok(self
            .staged
            .episodes
            .get(episode_id)
            .map(HospitalizationEpisode::billing_profile))
    }

    async fn active_accounts(
        &mut self,
        patient_id: &PatientId,
    ) -> Result<Vec<BillingAccount>, PortError> {
        check(&self.faults, FailurePoint::ReadAccounts).await?;
        let mut accounts: Vec<BillingAccount> = self
            .staged
            .accounts
            .iter()
            .filter(|a| &a.patient_id == patient_id && a.is_active())
            .cloned()
            .collect();
        accounts.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));
        Ok(accounts)
    }

    async fn link_account(
        &mut self,
        episode_id: &EpisodeId,
        account_id: &AccountId,
        operator: &OperatorId,
    ) -> Result<u64, PortError> {
        self.counters.link_writes.fetch_add(1, Ordering::SeqCst);
        check(&self.faults, FailurePoint::LinkAccount).await?;
        match self.staged.episodes.get_mut(episode_id) {
            Some(episode) => {
                episode.account_id = Some(account_id.clone());
                episode.operating_user = Some(operator.clone());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn commit(self) -> Result<(), PortError> {
        check(&self.faults, FailurePoint::Commit).await?;
        let MemoryTransaction { mut guard, staged, counters, .. } = self;
        *guard = staged;
        counters.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self) -> Result<(), PortError> {
        self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// One scripted answer of the settlement double
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Open an account with this number and report success
    Open(String),
    /// Open an account, then let a concurrent caller open a newer one
    OpenRaced { opened: String, newer: String },
    /// Report a refusal with this message
    Refuse(String),
    /// Return no rows
    Empty,
    /// Fail to reach the procedure
    Unreachable(String),
    /// Open an account, then never answer
    Hang(String),
}

/// Settlement procedure double answering from a script
///
/// Replies are consumed in order; once exhausted, `fallback` answers every
/// further call.
#[derive(Debug)]
pub struct ScriptedSettlement {
    replies: Mutex<VecDeque<ScriptedReply>>,
    fallback: ScriptedReply,
    calls: Mutex<Vec<SettlementRequest>>,
}

impl ScriptedSettlement {
    pub fn with_replies(replies: impl IntoIterator<Item = ScriptedReply>, fallback: ScriptedReply) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Opens the given account numbers in order, then refuses
    pub fn opening<I, S>(account_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_replies(
            account_ids.into_iter().map(|id| ScriptedReply::Open(id.into())),
            ScriptedReply::Refuse("No account numbers left in script".to_string()),
        )
    }

    /// Refuses every call with the given message
    pub fn refusing(message: impl Into<String>) -> Self {
        Self::with_replies(Vec::new(), ScriptedReply::Refuse(message.into()))
    }

    /// Requests received so far
    pub async fn calls(&self) -> Vec<SettlementRequest> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

impl DomainPort for ScriptedSettlement {}

#[async_trait]
impl SettlementProcedure<MemoryTransaction> for ScriptedSettlement {
    async fn invoke(
        &self,
        tx: &mut MemoryTransaction,
        request: &SettlementRequest,
    ) -> Result<ProcedureReply, PortError> {
        self.calls.lock().await.push(request.clone());
        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let parse = |raw: &str| {
            AccountId::parse(raw).map_err(|e| PortError::validation_field(e.to_string(), "account_id"))
        };

        match reply {
            ScriptedReply::Open(id) => {
                tx.open_account(&request.patient_id, parse(&id)?);
                Ok(ProcedureReply::opened(id))
            }
            ScriptedReply::OpenRaced { opened, newer } => {
                tx.open_account(&request.patient_id, parse(&opened)?);
                tx.open_account(&request.patient_id, parse(&newer)?);
                Ok(ProcedureReply::opened(opened))
            }
            ScriptedReply::Refuse(message) => Ok(ProcedureReply::refused(0, message)),
            ScriptedReply::Empty => Ok(ProcedureReply::default()),
            ScriptedReply::Unreachable(message) => Err(PortError::connection(message)),
            ScriptedReply::Hang(id) => {
                tx.open_account(&request.patient_id, parse(&id)?);
                tokio::time::sleep(std::time::Duration::from_secs(24 * 60 * 60)).await;
                Ok(ProcedureReply::opened(id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(id: &str) -> HospitalizationEpisode {
        HospitalizationEpisode::new(
            EpisodeId::parse(id).unwrap(),
            PatientId::parse("P1").unwrap(),
            "02",
        )
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_no_trace() {
        let store = InMemoryRecordStore::new();
        store.insert_episode(episode("H-1")).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.link_account(
                &EpisodeId::parse("H-1").unwrap(),
                &AccountId::parse("A1").unwrap(),
                &OperatorId::parse("u1").unwrap(),
            )
            .await
            .unwrap();
        }

        assert!(store.episode("H-1").await.unwrap().account_id.is_none());
        assert_eq!(store.commits(), 0);
    }

    #[tokio::test]
    async fn test_opened_accounts_are_newest() {
        let store = InMemoryRecordStore::new();
        let patient = PatientId::parse("P1").unwrap();
        let mut tx = store.begin().await.unwrap();
        let first = tx.open_account(&patient, AccountId::parse("A1").unwrap());
        let second = tx.open_account(&patient, AccountId::parse("A2").unwrap());
        assert!(second.opened_at > first.opened_at);

        let accounts = tx.active_accounts(&patient).await.unwrap();
        assert_eq!(accounts[0].account_id.as_str(), "A2");
        tx.commit().await.unwrap();
        assert_eq!(store.accounts_of("P1").await.len(), 2);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = InMemoryRecordStore::new();
        store.fail_at(FailurePoint::Begin).await;
        assert!(store.begin().await.unwrap_err().is_transient());
        store.heal().await;
        assert!(store.begin().await.is_ok());
    }
}
