//! API configuration

use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use core_kernel::{CoreError, LocalCalendar, Timezone};
use domain_admission::{AssuranceConfig, SettlementDefaults};

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level, used when `RUST_LOG` is unset
    pub log_level: String,
    pub max_connections: u32,
    /// Apply the bundled schema at startup; off where the legacy schema exists
    pub run_migrations: bool,
    /// IANA zone of the hospital, for admission dates and times
    pub timezone: String,
    pub transaction_timeout_secs: u64,
    pub serialize_per_patient: bool,
    pub default_insurance_code: String,
    pub default_company_code: String,
    pub default_department_code: String,
    pub default_origin_code: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let defaults = SettlementDefaults::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/admission".to_string(),
            log_level: "info".to_string(),
            max_connections: 10,
            run_migrations: false,
            timezone: Timezone::default().to_string(),
            transaction_timeout_secs: 30,
            serialize_per_patient: false,
            default_insurance_code: defaults.insurance_code,
            default_company_code: defaults.company_code,
            default_department_code: defaults.department_code,
            default_origin_code: defaults.origin_code,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables
    ///
    /// Unset variables keep their defaults. `DATABASE_URL` is honoured when
    /// `API_DATABASE_URL` is absent.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let database_url = std::env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port)?
            .set_default("database_url", database_url)?
            .set_default("log_level", defaults.log_level)?
            .set_default("max_connections", defaults.max_connections)?
            .set_default("run_migrations", defaults.run_migrations)?
            .set_default("timezone", defaults.timezone)?
            .set_default("transaction_timeout_secs", defaults.transaction_timeout_secs)?
            .set_default("serialize_per_patient", defaults.serialize_per_patient)?
            .set_default("default_insurance_code", defaults.default_insurance_code)?
            .set_default("default_company_code", defaults.default_company_code)?
            .set_default("default_department_code", defaults.default_department_code)?
            .set_default("default_origin_code", defaults.default_origin_code)?
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Wall-clock calendar in the configured zone
    pub fn calendar(&self) -> Result<LocalCalendar, CoreError> {
        Ok(LocalCalendar::system(Timezone::from_str(&self.timezone)?))
    }

    /// Orchestrator settings derived from this configuration
    pub fn assurance_config(&self) -> AssuranceConfig {
        AssuranceConfig {
            transaction_timeout: Duration::from_secs(self.transaction_timeout_secs),
            serialize_per_patient: self.serialize_per_patient,
            defaults: SettlementDefaults {
                insurance_code: self.default_insurance_code.clone(),
                company_code: self.default_company_code.clone(),
                department_code: self.default_department_code.clone(),
                origin_code: self.default_origin_code.clone(),
                ..SettlementDefaults::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assurance_config_carries_overrides() {
        let config = ApiConfig {
            transaction_timeout_secs: 5,
            serialize_per_patient: true,
            default_department_code: "3100".to_string(),
            ..ApiConfig::default()
        };

        let assurance = config.assurance_config();
        assert_eq!(assurance.transaction_timeout, Duration::from_secs(5));
        assert!(assurance.serialize_per_patient);
        assert_eq!(assurance.defaults.department_code, "3100");
        assert_eq!(assurance.defaults.insurance_code, "02");
        assert_eq!(assurance.defaults.fua_number, ".");
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let config = ApiConfig {
            timezone: "Mars/Olympus".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.calendar().is_err());
        assert!(ApiConfig::default().calendar().is_ok());
    }

    #[test]
    fn test_server_addr() {
        assert_eq!(ApiConfig::default().server_addr(), "0.0.0.0:8080");
    }
}
