//! PostgreSQL Admission Adapters
//!
//! Internal (database) adapters for the admission domain ports:
//!
//! - `PostgresRecordStore` implements `RecordStore`, handing out
//!   `PostgresRecordTransaction`s backed by one `sqlx::Transaction` each
//! - `PostgresSettlementProcedure` implements `SettlementProcedure` by calling
//!   the settlement function on the transaction's connection
//!
//! Row types from `repositories::admission` are converted to domain types
//! here, and `DatabaseError`s become `PortError`s.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresRecordStore, PostgresSettlementProcedure};
//! use domain_admission::{AccountAssuranceService, AssuranceConfig};
//!
//! let service = AccountAssuranceService::new(
//!     PostgresRecordStore::new(pool),
//!     PostgresSettlementProcedure::new(),
//!     calendar,
//!     AssuranceConfig::default(),
//! );
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;
use tracing::{debug, instrument, warn};

use core_kernel::{
    AccountId, DomainPort, EpisodeId, HealthCheckResult, HealthCheckable, OperatorId,
    PatientId, PortError,
};
use domain_admission::{
    AccountStatus, BillingAccount, EpisodeBillingProfile, ProcedureReply, ProcedureRow,
    RecordStore, RecordTransaction, SettlementProcedure, SettlementRequest,
};

use crate::error::DatabaseError;
use crate::repositories::admission::{
    AdmissionRepository, BillingAccountRow, EpisodeBillingRow, SettlementArgs, SettlementRow,
};

const ADAPTER_ID: &str = "postgres-record-store";

/// Status reported for a settlement the function aborted with `RAISE EXCEPTION`
pub const RAISED_SETTLEMENT_STATUS: i32 = 0;

/// PostgreSQL-backed implementation of `RecordStore`
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
    repository: AdmissionRepository,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            repository: AdmissionRepository::new(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PostgresRecordStore {}

#[async_trait]
impl HealthCheckable for PostgresRecordStore {
    /// Runs `SELECT 1` on a pooled connection
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();

        let result = match self.pool.acquire().await {
            Ok(mut conn) => self.repository.ping(&mut conn).await,
            Err(e) => Err(DatabaseError::from(e)),
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(()) => HealthCheckResult::healthy(ADAPTER_ID, latency_ms),
            Err(e) => HealthCheckResult::unhealthy(
                ADAPTER_ID,
                latency_ms,
                format!("Database error: {}", e),
            ),
        }
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    type Tx = PostgresRecordTransaction;

    async fn begin(&self) -> Result<Self::Tx, PortError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::from(DatabaseError::transaction(e)))?;

        Ok(PostgresRecordTransaction {
            tx,
            repository: self.repository,
        })
    }
}

/// One open database transaction
///
/// Dropping it without `commit` rolls the transaction back.
pub struct PostgresRecordTransaction {
    tx: Transaction<'static, Postgres>,
    repository: AdmissionRepository,
}

impl std::fmt::Debug for PostgresRecordTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresRecordTransaction").finish_non_exhaustive()
    }
}

#[async_trait]
impl RecordTransaction for PostgresRecordTransaction {
    #[instrument(skip_all, fields(episode_id = %episode_id))]
    async fn episode_billing_profile(
        &mut self,
        episode_id: &EpisodeId,
    ) -> Result<Option<EpisodeBillingProfile>, PortError> {
        let row = self
            .repository
            .find_episode(&mut self.tx, episode_id.as_str())
            .await?;

        debug!(found = row.is_some(), "Episode lookup");
        row.map(row_to_profile).transpose()
    }

    #[instrument(skip_all, fields(patient_id = %patient_id))]
    async fn active_accounts(
        &mut self,
        patient_id: &PatientId,
    ) -> Result<Vec<BillingAccount>, PortError> {
        let rows = self
            .repository
            .find_active_accounts(&mut self.tx, patient_id.as_str())
            .await?;

        debug!(count = rows.len(), "Active accounts loaded");
        rows.into_iter().map(row_to_account).collect()
    }

    #[instrument(skip_all, fields(episode_id = %episode_id, account_id = %account_id))]
    async fn link_account(
        &mut self,
        episode_id: &EpisodeId,
        account_id: &AccountId,
        operator: &OperatorId,
    ) -> Result<u64, PortError> {
        let updated = self
            .repository
            .update_episode_account(
                &mut self.tx,
                episode_id.as_str(),
                account_id.as_str(),
                operator.as_str(),
            )
            .await?;

        debug!(updated, "Episode account written");
        Ok(updated)
    }

    async fn lock_patient(&mut self, patient_id: &PatientId) -> Result<(), PortError> {
        self.repository
            .lock_patient(&mut self.tx, patient_id.as_str())
            .await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), PortError> {
        self.tx
            .commit()
            .await
            .map_err(|e| PortError::from(DatabaseError::transaction(e)))
    }

    async fn rollback(self) -> Result<(), PortError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| PortError::from(DatabaseError::transaction(e)))
    }
}

/// Calls the settlement function inside a `PostgresRecordTransaction`
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresSettlementProcedure {
    repository: AdmissionRepository,
}

impl PostgresSettlementProcedure {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for PostgresSettlementProcedure {}

#[async_trait]
impl SettlementProcedure<PostgresRecordTransaction> for PostgresSettlementProcedure {
    #[instrument(skip_all, fields(patient_id = %request.patient_id))]
    async fn invoke(
        &self,
        tx: &mut PostgresRecordTransaction,
        request: &SettlementRequest,
    ) -> Result<ProcedureReply, PortError> {
        let args = settlement_args(request);

        match self.repository.settle(&mut tx.tx, &args).await {
            Ok(rows) => Ok(ProcedureReply {
                rows: rows.into_iter().map(settlement_row).collect(),
            }),
            Err(DatabaseError::RaisedException(message)) => {
                warn!(%message, "Settlement function raised");
                Ok(ProcedureReply::refused(RAISED_SETTLEMENT_STATUS, message))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn settlement_args(request: &SettlementRequest) -> SettlementArgs<'_> {
    SettlementArgs {
        patient_id: request.patient_id.as_str(),
        insurance_code: &request.insurance_code,
        company_code: &request.company_code,
        department_code: &request.department_code,
        observation: &request.observation,
        admission_date: &request.admission_date,
        admission_time: &request.admission_time,
        physician_name: &request.physician_name,
        origin_code: request.origin.code(),
        operator: request.operator.as_str(),
        fua_number: &request.fua_number,
        billing_service_code: &request.billing_service_code,
    }
}

fn settlement_row(row: SettlementRow) -> ProcedureRow {
    ProcedureRow {
        status: row.status,
        account_id: row.account_id,
        message: row.message,
    }
}

/// Converts a hospitalization row; blank patient or account columns read as absent
fn row_to_profile(row: EpisodeBillingRow) -> Result<EpisodeBillingProfile, PortError> {
    let episode_id = EpisodeId::parse(&row.episode_id).map_err(|e| PortError::Transformation {
        message: e.to_string(),
    })?;

    Ok(EpisodeBillingProfile {
        episode_id,
        patient_id: row.patient_id.as_deref().and_then(|p| PatientId::parse(p).ok()),
        insurance_code: row.insurance_code,
        account_id: row.account_id.as_deref().and_then(|a| AccountId::parse(a).ok()),
    })
}

fn row_to_account(row: BillingAccountRow) -> Result<BillingAccount, PortError> {
    let transform = |e: core_kernel::IdentifierError| PortError::Transformation {
        message: e.to_string(),
    };

    Ok(BillingAccount {
        account_id: AccountId::parse(&row.account_id).map_err(transform)?,
        patient_id: PatientId::parse(&row.patient_id).map_err(transform)?,
        status: AccountStatus::from_code(&row.status),
        opened_at: row.opened_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domain_admission::StaffOrigin;

    #[test]
    fn test_profile_treats_blank_columns_as_absent() {
        let profile = row_to_profile(EpisodeBillingRow {
            episode_id: "H-1001".to_string(),
            patient_id: Some("   ".to_string()),
            insurance_code: Some(" 02".to_string()),
            account_id: Some(String::new()),
        })
        .unwrap();

        assert_eq!(profile.episode_id.as_str(), "H-1001");
        assert!(profile.patient_id.is_none());
        assert!(profile.account_id.is_none());
        assert_eq!(profile.insurance_code.as_deref(), Some(" 02"));
    }

    #[test]
    fn test_blank_episode_id_is_a_transformation_error() {
        let result = row_to_profile(EpisodeBillingRow {
            episode_id: " ".to_string(),
            patient_id: None,
            insurance_code: None,
            account_id: None,
        });
        assert!(matches!(result, Err(PortError::Transformation { .. })));
    }

    #[test]
    fn test_account_row_conversion() {
        let opened_at = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        let account = row_to_account(BillingAccountRow {
            account_id: "CTA100001".to_string(),
            patient_id: "P55".to_string(),
            status: "A".to_string(),
            opened_at,
        })
        .unwrap();

        assert!(account.is_active());
        assert_eq!(account.account_id.as_str(), "CTA100001");
        assert_eq!(account.opened_at, opened_at);
    }

    #[test]
    fn test_settlement_args_follow_request_order() {
        let request = SettlementRequest {
            patient_id: PatientId::parse("P55").unwrap(),
            insurance_code: "02".to_string(),
            company_code: "0".to_string(),
            department_code: "2090".to_string(),
            observation: ".".to_string(),
            admission_date: "15/07/2024".to_string(),
            admission_time: "09:05:09".to_string(),
            physician_name: String::new(),
            origin: StaffOrigin::Hospitalization,
            operator: OperatorId::parse("nurse01").unwrap(),
            fua_number: ".".to_string(),
            billing_service_code: ".".to_string(),
        };

        let args = settlement_args(&request);
        assert_eq!(args.patient_id, "P55");
        assert_eq!(args.origin_code, "HO");
        assert_eq!(args.operator, "nurse01");
        assert_eq!(args.admission_time, "09:05:09");
    }
}
