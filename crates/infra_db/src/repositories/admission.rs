//! Admission repository implementation
//!
//! SQL access to the hospitalization and billing account tables and to the
//! legacy settlement function. Every query runs on a connection borrowed from
//! the caller's transaction; this module never opens or ends transactions.
//!
//! Episode and patient identifiers are stored space-padded by the legacy
//! admission desk, so lookups compare against the trimmed column.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::error::DatabaseError;

/// Name of the settlement function in the database
pub const SETTLEMENT_FUNCTION: &str = "settle_hospital_account";

/// Billing-relevant columns of a hospitalization row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EpisodeBillingRow {
    pub episode_id: String,
    pub patient_id: Option<String>,
    pub insurance_code: Option<String>,
    pub account_id: Option<String>,
}

/// A row of `billing_accounts`
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BillingAccountRow {
    pub account_id: String,
    pub patient_id: String,
    pub status: String,
    pub opened_at: DateTime<Utc>,
}

/// A row returned by the settlement function
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SettlementRow {
    pub status: i32,
    pub account_id: Option<String>,
    pub message: Option<String>,
}

/// Settlement arguments in the function's positional order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementArgs<'a> {
    pub patient_id: &'a str,
    pub insurance_code: &'a str,
    pub company_code: &'a str,
    pub department_code: &'a str,
    pub observation: &'a str,
    pub admission_date: &'a str,
    pub admission_time: &'a str,
    pub physician_name: &'a str,
    pub origin_code: &'a str,
    pub operator: &'a str,
    pub fua_number: &'a str,
    pub billing_service_code: &'a str,
}

/// Queries over the admission tables
///
/// Stateless; each method takes the connection of the transaction it runs in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissionRepository;

impl AdmissionRepository {
    pub fn new() -> Self {
        Self
    }

    /// Reads and locks the hospitalization row with the given trimmed id
    ///
    /// The row lock is held until the transaction ends, so two assurance
    /// calls for the same episode run one after the other.
    pub async fn find_episode(
        &self,
        conn: &mut PgConnection,
        episode_id: &str,
    ) -> Result<Option<EpisodeBillingRow>, DatabaseError> {
        let row = sqlx::query_as::<_, EpisodeBillingRow>(
            r#"
            SELECT TRIM(episode_id) AS episode_id,
                   patient_id,
                   insurance_code,
                   account_id
            FROM hospitalizations
            WHERE TRIM(episode_id) = $1
            FOR UPDATE
            "#,
        )
        .bind(episode_id)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }

    /// Lists the patient's active accounts, most recently opened first
    pub async fn find_active_accounts(
        &self,
        conn: &mut PgConnection,
        patient_id: &str,
    ) -> Result<Vec<BillingAccountRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, BillingAccountRow>(
            r#"
            SELECT TRIM(account_id) AS account_id,
                   TRIM(patient_id) AS patient_id,
                   status::TEXT AS status,
                   opened_at
            FROM billing_accounts
            WHERE TRIM(patient_id) = $1
              AND status = 'A'
            ORDER BY opened_at DESC, account_id DESC
            "#,
        )
        .bind(patient_id)
        .fetch_all(conn)
        .await?;

        Ok(rows)
    }

    /// Records the linked account and operating user on the episode
    ///
    /// Returns the number of rows updated.
    pub async fn update_episode_account(
        &self,
        conn: &mut PgConnection,
        episode_id: &str,
        account_id: &str,
        operator: &str,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE hospitalizations
            SET account_id = $2,
                operating_user = $3
            WHERE TRIM(episode_id) = $1
            "#,
        )
        .bind(episode_id)
        .bind(account_id)
        .bind(operator)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Takes a transaction-scoped advisory lock keyed by the patient id
    pub async fn lock_patient(
        &self,
        conn: &mut PgConnection,
        patient_id: &str,
    ) -> Result<(), DatabaseError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(patient_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Calls the settlement function once and returns every row it produced
    pub async fn settle(
        &self,
        conn: &mut PgConnection,
        args: &SettlementArgs<'_>,
    ) -> Result<Vec<SettlementRow>, DatabaseError> {
        let sql = format!(
            "SELECT status, account_id, message FROM {}($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            SETTLEMENT_FUNCTION
        );

        let rows = sqlx::query_as::<_, SettlementRow>(&sql)
            .bind(args.patient_id)
            .bind(args.insurance_code)
            .bind(args.company_code)
            .bind(args.department_code)
            .bind(args.observation)
            .bind(args.admission_date)
            .bind(args.admission_time)
            .bind(args.physician_name)
            .bind(args.origin_code)
            .bind(args.operator)
            .bind(args.fua_number)
            .bind(args.billing_service_code)
            .fetch_all(conn)
            .await?;

        Ok(rows)
    }

    /// Checks that the database answers a trivial query
    pub async fn ping(&self, conn: &mut PgConnection) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(conn)
            .await?;
        Ok(())
    }
}
