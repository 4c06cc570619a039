//! Database Test Utilities
//!
//! Helpers for PostgreSQL integration tests: a throwaway container with the
//! admission schema applied, plus seeding and inspection queries.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

use domain_admission::{BillingAccount, HospitalizationEpisode};

const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "admission_test";

type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Configuration for test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    /// Creates the database connection URL
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A PostgreSQL test container with the admission schema applied
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a new PostgreSQL container for testing
    ///
    /// # Errors
    ///
    /// Returns an error if the container fails to start or the schema fails to apply
    pub async fn new() -> TestResult<Self> {
        let container = Postgres::default()
            .with_user(POSTGRES_USER)
            .with_password(POSTGRES_PASSWORD)
            .with_db_name(POSTGRES_DB)
            .with_tag(POSTGRES_TAG)
            .start()
            .await?;

        let port = container.get_host_port_ipv4(5432).await?;
        let host = container.get_host().await?.to_string();

        let config = TestDatabaseConfig {
            host,
            port,
            ..TestDatabaseConfig::default()
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.connection_url())
            .await?;

        let test_db = Self {
            _container: container,
            config,
            pool,
        };
        test_db.init_schema().await?;

        Ok(test_db)
    }

    async fn init_schema(&self) -> TestResult<()> {
        let schema = include_str!("../../../migrations/0001_hospital_accounts.sql");
        sqlx::raw_sql(schema).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts an episode; `episode_id` is stored as given, so pass padding
    /// through `raw_episode_id` to mimic legacy rows
    pub async fn insert_episode(
        &self,
        episode: &HospitalizationEpisode,
        raw_episode_id: Option<&str>,
    ) -> TestResult<()> {
        sqlx::query(
            r#"
            INSERT INTO hospitalizations (
                episode_id, patient_id, insurance_code, company_code, department_code,
                admitting_physician, admitted_at, observation, origin_code,
                operating_user, fua_number, billing_service_code, account_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(raw_episode_id.unwrap_or(episode.episode_id.as_str()))
        .bind(episode.patient_id.as_ref().map(|p| p.as_str()))
        .bind(episode.insurance_code.as_deref())
        .bind(episode.company_code.as_deref())
        .bind(episode.department_code.as_deref())
        .bind(episode.admitting_physician.as_deref())
        .bind(episode.admitted_at)
        .bind(episode.observation.as_deref())
        .bind(episode.origin_code.as_deref())
        .bind(episode.operating_user.as_ref().map(|o| o.as_str()))
        .bind(episode.fua_number.as_deref())
        .bind(episode.billing_service_code.as_deref())
        .bind(episode.account_id.as_ref().map(|a| a.as_str()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_account(&self, account: &BillingAccount) -> TestResult<()> {
        sqlx::query(
            "INSERT INTO billing_accounts (account_id, patient_id, status, opened_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(account.account_id.as_str())
        .bind(account.patient_id.as_str())
        .bind(account.status.code())
        .bind(account.opened_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns the linked account and operating user stored on an episode
    pub async fn episode_link(&self, episode_id: &str) -> TestResult<(Option<String>, Option<String>)> {
        let row: (Option<String>, Option<String>) = sqlx::query_as(
            "SELECT account_id, operating_user FROM hospitalizations WHERE TRIM(episode_id) = $1",
        )
        .bind(episode_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn account_count(&self, patient_id: &str) -> TestResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM billing_accounts WHERE TRIM(patient_id) = $1",
        )
        .bind(patient_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Replaces the settlement function with one that always raises
    pub async fn install_raising_settlement(&self, message: &str) -> TestResult<()> {
        let sql = format!(
            r#"
            CREATE OR REPLACE FUNCTION settle_hospital_account(
                p_patient_id TEXT, p_insurance_code TEXT, p_company_code TEXT,
                p_department_code TEXT, p_observation TEXT, p_admission_date TEXT,
                p_admission_time TEXT, p_physician_name TEXT, p_origin TEXT,
                p_operator TEXT, p_fua_number TEXT, p_billing_service_code TEXT
            )
            RETURNS TABLE (status INTEGER, account_id TEXT, message TEXT)
            LANGUAGE plpgsql
            AS $$
            BEGIN
                RAISE EXCEPTION '{}';
            END;
            $$;
            "#,
            message.replace('\'', "''")
        );
        sqlx::raw_sql(&sql).execute(&self.pool).await?;
        Ok(())
    }
}

/// Creates an isolated test database for a single test
pub async fn create_isolated_test_database() -> TestResult<TestDatabase> {
    TestDatabase::new().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_connection_url() {
        let config = TestDatabaseConfig::default();
        let url = config.connection_url();

        assert!(url.starts_with("postgres://"));
        assert!(url.contains(POSTGRES_USER));
        assert!(url.contains(POSTGRES_DB));
    }
}
