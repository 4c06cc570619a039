//! Account Assurance Orchestrator
//!
//! Links a hospitalization episode to its patient's current billing account,
//! opening one through settlement when the episode's insurance requires it.
//!
//! # Workflow
//!
//! All steps run inside one record store transaction:
//!
//! 1. Read the episode's stored patient and insurance code
//! 2. Classify the insurance; ineligible episodes end as `NotApplicable`
//! 3. Resolve the patient's active account
//! 4. Adopt it, or open a new one through the settlement procedure
//! 5. Re-resolve the most recently opened active account and link it
//!
//! A settlement refusal, a storage fault or an exceeded time budget rolls the
//! transaction back, so no episode is ever left half-linked. Two concurrent
//! calls for the same patient may both open an account; the second link
//! always points at the newest one (see `AssuranceConfig::serialize_per_patient`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use core_kernel::{
    AccountId, EpisodeId, HealthCheckResult, LocalCalendar, OperatorId, PatientId, PortError,
};

use crate::error::AssuranceError;
use crate::ports::{RecordStore, RecordTransaction, SettlementProcedure};
use crate::resolver::AccountResolver;
use crate::settlement::{present, SettlementDefaults, SettlementInvoker, SettlementOutcome};

/// Caller-supplied data for one assurance call
///
/// Only `patient_id` and `operating_user` are required; the rest feed the
/// settlement request and fall back to `SettlementDefaults`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssuranceInput {
    pub patient_id: Option<String>,
    pub insurance_code: Option<String>,
    pub company_code: Option<String>,
    pub department_code: Option<String>,
    pub observation: Option<String>,
    pub admission_date: Option<String>,
    pub admission_time: Option<String>,
    pub physician_name: Option<String>,
    pub origin_code: Option<String>,
    pub operating_user: Option<String>,
    pub fua_number: Option<String>,
    pub billing_service_code: Option<String>,
}

/// Terminal state of an assurance call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssuranceResult {
    /// The episode's insurance does not need a settled account; nothing was written
    NotApplicable { insurance_code: String },
    /// The patient already had an active account and the episode now points at it
    LinkedExisting { account_id: AccountId },
    /// A new account was opened through settlement and linked
    CreatedAndLinked { account_id: AccountId },
    /// The settlement procedure refused; nothing was written
    Failed { message: String },
}

impl AssuranceResult {
    /// Stable tag of the outcome
    pub fn tag(&self) -> &'static str {
        match self {
            AssuranceResult::NotApplicable { .. } => "not_applicable",
            AssuranceResult::LinkedExisting { .. } => "linked_existing",
            AssuranceResult::CreatedAndLinked { .. } => "created_and_linked",
            AssuranceResult::Failed { .. } => "failed",
        }
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        match self {
            AssuranceResult::LinkedExisting { account_id }
            | AssuranceResult::CreatedAndLinked { account_id } => Some(account_id),
            _ => None,
        }
    }

    /// Returns true if the episode is linked to an account
    pub fn is_linked(&self) -> bool {
        self.account_id().is_some()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AssuranceResult::Failed { .. })
    }

    /// Operator-facing description of the outcome
    pub fn message(&self) -> String {
        match self {
            AssuranceResult::NotApplicable { insurance_code } => format!(
                "Insurance code '{}' does not require a billing account",
                insurance_code
            ),
            AssuranceResult::LinkedExisting { account_id } => {
                format!("Episode linked to existing account {}", account_id)
            }
            AssuranceResult::CreatedAndLinked { account_id } => {
                format!("Account {} opened and linked to the episode", account_id)
            }
            AssuranceResult::Failed { message } => message.clone(),
        }
    }
}

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct AssuranceConfig {
    /// Budget for everything between `begin` and `commit`
    pub transaction_timeout: Duration,
    /// Take a per-patient lock before resolving accounts
    pub serialize_per_patient: bool,
    pub defaults: SettlementDefaults,
}

impl Default for AssuranceConfig {
    fn default() -> Self {
        Self {
            transaction_timeout: Duration::from_secs(30),
            serialize_per_patient: false,
            defaults: SettlementDefaults::default(),
        }
    }
}

/// Object-safe facade over the orchestrator
#[async_trait]
pub trait AccountAssurance: Send + Sync {
    async fn assure_account(
        &self,
        episode_id: &str,
        input: &AssuranceInput,
    ) -> Result<AssuranceResult, AssuranceError>;

    /// Health of the underlying record store
    async fn store_health(&self) -> HealthCheckResult;
}

/// Input that passed validation
#[derive(Debug)]
struct ValidatedRequest<'a> {
    episode_id: EpisodeId,
    patient_id: PatientId,
    operator: OperatorId,
    input: &'a AssuranceInput,
}

/// Which branch produced the account before re-resolution
enum Adopted {
    Existing(AccountId),
    Created(AccountId),
}

impl Adopted {
    fn account_id(&self) -> &AccountId {
        match self {
            Adopted::Existing(id) | Adopted::Created(id) => id,
        }
    }
}

/// The account assurance workflow over a record store and a settlement procedure
pub struct AccountAssuranceService<S, P> {
    store: S,
    resolver: AccountResolver,
    invoker: SettlementInvoker<P>,
    calendar: LocalCalendar,
    config: AssuranceConfig,
}

impl<S, P> AccountAssuranceService<S, P>
where
    S: RecordStore,
    P: SettlementProcedure<S::Tx>,
{
    pub fn new(store: S, procedure: P, calendar: LocalCalendar, config: AssuranceConfig) -> Self {
        Self {
            store,
            resolver: AccountResolver::new(),
            invoker: SettlementInvoker::new(procedure),
            calendar,
            config,
        }
    }

    pub fn config(&self) -> &AssuranceConfig {
        &self.config
    }

    /// Ensures the episode is linked to its patient's current active account
    ///
    /// # Arguments
    ///
    /// * `episode_id` - Raw episode identifier; surrounding whitespace is ignored
    /// * `input` - Caller data; `patient_id` and `operating_user` are required
    ///
    /// # Errors
    ///
    /// * `Validation` - missing episode id, patient id or operating user (no I/O done)
    /// * `EpisodeNotFound` - the episode does not exist
    /// * `OperationFailed` - storage fault; the transaction was rolled back
    /// * `TimedOut` - the transaction exceeded its budget and was rolled back
    #[instrument(skip_all, fields(episode_id = %episode_id.trim()))]
    pub async fn assure_account(
        &self,
        episode_id: &str,
        input: &AssuranceInput,
    ) -> Result<AssuranceResult, AssuranceError> {
        let request = validate(episode_id, input)?;

        let mut tx = self.store.begin().await.map_err(|e| self.storage_failure(e))?;

        let work = tokio::time::timeout(
            self.config.transaction_timeout,
            self.assure_in_transaction(&mut tx, &request),
        )
        .await;

        match work {
            Ok(Ok(result)) if result.is_failed() => {
                self.abandon(tx).await;
                Ok(result)
            }
            Ok(Ok(result)) => {
                tx.commit().await.map_err(|e| self.storage_failure(e))?;
                info!(
                    outcome = result.tag(),
                    account_id = result.account_id().map(AccountId::as_str),
                    "Account assurance completed"
                );
                Ok(result)
            }
            Ok(Err(err)) => {
                self.abandon(tx).await;
                Err(err)
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.transaction_timeout.as_millis() as u64,
                    "Account assurance timed out, rolling back"
                );
                self.abandon(tx).await;
                Err(AssuranceError::TimedOut(self.config.transaction_timeout))
            }
        }
    }

    async fn assure_in_transaction(
        &self,
        tx: &mut S::Tx,
        request: &ValidatedRequest<'_>,
    ) -> Result<AssuranceResult, AssuranceError> {
        let profile = tx
            .episode_billing_profile(&request.episode_id)
            .await
            .map_err(|e| self.storage_failure(e))?
            .ok_or_else(|| AssuranceError::EpisodeNotFound(request.episode_id.clone()))?;

        let eligibility = profile.eligibility();
        if !eligibility.requires_settlement {
            debug!(plan = %eligibility.plan, "Insurance does not require settlement");
            return Ok(AssuranceResult::NotApplicable {
                insurance_code: eligibility.plan.code().to_string(),
            });
        }

        let patient_id = match profile.patient_id {
            Some(stored) => {
                if stored != request.patient_id {
                    warn!(
                        stored = %stored,
                        supplied = %request.patient_id,
                        "Caller patient differs from stored episode patient, using stored"
                    );
                }
                stored
            }
            None => request.patient_id.clone(),
        };

        if self.config.serialize_per_patient {
            tx.lock_patient(&patient_id)
                .await
                .map_err(|e| self.storage_failure(e))?;
        }

        let existing = self
            .resolver
            .resolve_active_account(tx, &patient_id)
            .await
            .map_err(|e| self.storage_failure(e))?;

        let adopted = match existing {
            Some(account) => Adopted::Existing(account.account_id),
            None => {
                let settlement = self.config.defaults.apply(
                    &patient_id,
                    &request.operator,
                    Some(eligibility.plan.code()),
                    request.input,
                    &self.calendar,
                );
                match self
                    .invoker
                    .settle(tx, &settlement)
                    .await
                    .map_err(|e| self.storage_failure(e))?
                {
                    SettlementOutcome::Success { account_id } => Adopted::Created(account_id),
                    SettlementOutcome::Failure { message } => {
                        return Ok(AssuranceResult::Failed { message });
                    }
                }
            }
        };

        // Another transaction may have opened a newer account since step 3.
        let current = self
            .resolver
            .resolve_active_account(tx, &patient_id)
            .await
            .map_err(|e| self.storage_failure(e))?
            .ok_or_else(|| {
                self.storage_failure(PortError::internal(format!(
                    "no active account visible for patient {} after adopting {}",
                    patient_id,
                    adopted.account_id()
                )))
            })?;

        if &current.account_id != adopted.account_id() {
            warn!(
                adopted = %adopted.account_id(),
                current = %current.account_id,
                "Newer active account found, linking it instead"
            );
        }

        let updated = tx
            .link_account(&request.episode_id, &current.account_id, &request.operator)
            .await
            .map_err(|e| self.storage_failure(e))?;
        if updated == 0 {
            return Err(AssuranceError::EpisodeNotFound(request.episode_id.clone()));
        }

        Ok(match adopted {
            Adopted::Existing(_) => AssuranceResult::LinkedExisting {
                account_id: current.account_id,
            },
            Adopted::Created(_) => AssuranceResult::CreatedAndLinked {
                account_id: current.account_id,
            },
        })
    }

    async fn abandon(&self, tx: S::Tx) {
        if let Err(e) = tx.rollback().await {
            error!(error = %e, "Rollback failed; the store discards the transaction on disconnect");
        }
    }

    fn storage_failure(&self, source: PortError) -> AssuranceError {
        error!(error = ?source, "Record store failure during account assurance");
        AssuranceError::storage(source)
    }
}

#[async_trait]
impl<S, P> AccountAssurance for AccountAssuranceService<S, P>
where
    S: RecordStore,
    P: SettlementProcedure<S::Tx>,
{
    async fn assure_account(
        &self,
        episode_id: &str,
        input: &AssuranceInput,
    ) -> Result<AssuranceResult, AssuranceError> {
        AccountAssuranceService::assure_account(self, episode_id, input).await
    }

    async fn store_health(&self) -> HealthCheckResult {
        self.store.health_check().await
    }
}

fn validate<'a>(
    episode_id: &str,
    input: &'a AssuranceInput,
) -> Result<ValidatedRequest<'a>, AssuranceError> {
    let episode_id = EpisodeId::parse(episode_id)
        .map_err(|e| AssuranceError::validation("episode_id", e.to_string()))?;
    let patient_id = present(&input.patient_id)
        .ok_or_else(|| AssuranceError::validation("patient_id", "patient id is required"))
        .and_then(|raw| {
            PatientId::parse(raw).map_err(|e| AssuranceError::validation("patient_id", e.to_string()))
        })?;
    let operator = present(&input.operating_user)
        .ok_or_else(|| AssuranceError::validation("operating_user", "operating user is required"))
        .and_then(|raw| {
            OperatorId::parse(raw)
                .map_err(|e| AssuranceError::validation("operating_user", e.to_string()))
        })?;

    Ok(ValidatedRequest {
        episode_id,
        patient_id,
        operator,
        input,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(patient: Option<&str>, user: Option<&str>) -> AssuranceInput {
        AssuranceInput {
            patient_id: patient.map(str::to_string),
            operating_user: user.map(str::to_string),
            ..AssuranceInput::default()
        }
    }

    #[test]
    fn test_validation_requires_episode() {
        let err = validate("   ", &input(Some("P1"), Some("u1"))).unwrap_err();
        assert!(matches!(err, AssuranceError::Validation { field: "episode_id", .. }));
    }

    #[test]
    fn test_validation_requires_patient_and_operator() {
        let err = validate("H-1", &input(None, Some("u1"))).unwrap_err();
        assert!(matches!(err, AssuranceError::Validation { field: "patient_id", .. }));

        let err = validate("H-1", &input(Some("P1"), Some("  "))).unwrap_err();
        assert!(matches!(err, AssuranceError::Validation { field: "operating_user", .. }));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_validation_trims() {
        let padded = input(Some(" P55"), Some("u1 "));
        let ok = validate(" H-1001 ", &padded).unwrap();
        assert_eq!(ok.episode_id.as_str(), "H-1001");
        assert_eq!(ok.patient_id.as_str(), "P55");
        assert_eq!(ok.operator.as_str(), "u1");
    }

    #[test]
    fn test_result_tags() {
        let id = AccountId::parse("A1").unwrap();
        assert_eq!(
            AssuranceResult::NotApplicable { insurance_code: "20".into() }.tag(),
            "not_applicable"
        );
        assert_eq!(AssuranceResult::LinkedExisting { account_id: id.clone() }.tag(), "linked_existing");
        assert_eq!(AssuranceResult::CreatedAndLinked { account_id: id }.tag(), "created_and_linked");
        assert!(AssuranceResult::Failed { message: "x".into() }.is_failed());
    }
}
