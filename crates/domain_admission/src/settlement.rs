//! Settlement of new billing accounts
//!
//! Billing accounts are opened by a legacy stored procedure that owns account
//! numbering. This module describes what is sent to it (`SettlementRequest`),
//! how caller-supplied fields are defaulted (`SettlementDefaults`), and how its
//! raw reply is interpreted (`SettlementInvoker`, `SettlementOutcome`).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use core_kernel::{AccountId, LocalCalendar, OperatorId, PatientId, PortError};

use crate::assurance::AssuranceInput;
use crate::ports::{RecordTransaction, SettlementProcedure};

/// Status value the procedure reports when it opened an account
pub const SETTLEMENT_SUCCESS_STATUS: i32 = 1;

/// Origin of the attending staff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum StaffOrigin {
    /// Hospitalization ward (code "HO")
    Hospitalization,
    Other(String),
}

impl StaffOrigin {
    pub fn from_code(raw: &str) -> Self {
        match raw.trim() {
            "HO" => StaffOrigin::Hospitalization,
            other => StaffOrigin::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            StaffOrigin::Hospitalization => "HO",
            StaffOrigin::Other(code) => code,
        }
    }
}

impl From<String> for StaffOrigin {
    fn from(raw: String) -> Self {
        StaffOrigin::from_code(&raw)
    }
}

impl From<StaffOrigin> for String {
    fn from(origin: StaffOrigin) -> String {
        origin.code().to_string()
    }
}

/// Fully resolved parameters of one settlement call, in procedure order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub patient_id: PatientId,
    pub insurance_code: String,
    pub company_code: String,
    pub department_code: String,
    pub observation: String,
    /// `DD/MM/YYYY` in the hospital's local calendar
    pub admission_date: String,
    pub admission_time: String,
    pub physician_name: String,
    pub origin: StaffOrigin,
    pub operator: OperatorId,
    pub fua_number: String,
    pub billing_service_code: String,
}

/// Values used for settlement fields the caller left out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementDefaults {
    pub insurance_code: String,
    pub company_code: String,
    pub department_code: String,
    pub observation: String,
    pub physician_name: String,
    pub origin_code: String,
    pub fua_number: String,
    pub billing_service_code: String,
}

impl Default for SettlementDefaults {
    fn default() -> Self {
        Self {
            insurance_code: "02".to_string(),
            company_code: "0".to_string(),
            department_code: "2090".to_string(),
            observation: ".".to_string(),
            physician_name: String::new(),
            origin_code: "HO".to_string(),
            fua_number: ".".to_string(),
            billing_service_code: ".".to_string(),
        }
    }
}

impl SettlementDefaults {
    /// Builds the settlement request for a patient, filling every blank or
    /// missing caller field. Date and time come from the local calendar.
    ///
    /// The stored insurance code takes precedence over the caller's.
    pub fn apply(
        &self,
        patient_id: &PatientId,
        operator: &OperatorId,
        stored_insurance_code: Option<&str>,
        input: &AssuranceInput,
        calendar: &LocalCalendar,
    ) -> SettlementRequest {
        let pick = |value: &Option<String>, default: &str| {
            present(value).unwrap_or(default).to_string()
        };

        SettlementRequest {
            patient_id: patient_id.clone(),
            insurance_code: stored_insurance_code
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| pick(&input.insurance_code, &self.insurance_code)),
            company_code: pick(&input.company_code, &self.company_code),
            department_code: pick(&input.department_code, &self.department_code),
            observation: pick(&input.observation, &self.observation),
            admission_date: present(&input.admission_date)
                .map(str::to_string)
                .unwrap_or_else(|| calendar.today()),
            admission_time: present(&input.admission_time)
                .map(str::to_string)
                .unwrap_or_else(|| calendar.time_of_day()),
            physician_name: pick(&input.physician_name, &self.physician_name),
            origin: StaffOrigin::from_code(&pick(&input.origin_code, &self.origin_code)),
            operator: operator.clone(),
            fua_number: pick(&input.fua_number, &self.fua_number),
            billing_service_code: pick(&input.billing_service_code, &self.billing_service_code),
        }
    }
}

/// Returns the trimmed value unless it is missing or blank
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// One row returned by the settlement procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureRow {
    pub status: i32,
    pub account_id: Option<String>,
    pub message: Option<String>,
}

/// Raw row set returned by the settlement procedure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureReply {
    pub rows: Vec<ProcedureRow>,
}

impl ProcedureReply {
    /// Reply of a procedure that opened the given account
    pub fn opened(account_id: impl Into<String>) -> Self {
        Self {
            rows: vec![ProcedureRow {
                status: SETTLEMENT_SUCCESS_STATUS,
                account_id: Some(account_id.into()),
                message: None,
            }],
        }
    }

    /// Reply of a procedure that refused to open an account
    pub fn refused(status: i32, message: impl Into<String>) -> Self {
        Self {
            rows: vec![ProcedureRow {
                status,
                account_id: None,
                message: Some(message.into()),
            }],
        }
    }
}

/// Interpreted result of a settlement call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    Success { account_id: AccountId },
    Failure { message: String },
}

impl SettlementOutcome {
    /// Interprets the first row of a procedure reply
    pub fn from_reply(reply: ProcedureReply) -> Self {
        let Some(row) = reply.rows.into_iter().next() else {
            return SettlementOutcome::Failure {
                message: "Settlement procedure returned no rows".to_string(),
            };
        };

        if row.status != SETTLEMENT_SUCCESS_STATUS {
            let message = row
                .message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Settlement procedure reported status {}", row.status));
            return SettlementOutcome::Failure { message };
        }

        match row.account_id.as_deref().map(AccountId::parse) {
            Some(Ok(account_id)) => SettlementOutcome::Success { account_id },
            _ => SettlementOutcome::Failure {
                message: "Settlement procedure reported success without an account".to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SettlementOutcome::Success { .. })
    }
}

/// Calls the settlement procedure and interprets its reply
#[derive(Debug, Clone)]
pub struct SettlementInvoker<P> {
    procedure: P,
}

impl<P> SettlementInvoker<P> {
    pub fn new(procedure: P) -> Self {
        Self { procedure }
    }

    /// Invokes the procedure once inside the caller's transaction
    ///
    /// # Errors
    ///
    /// Returns the port error when the procedure could not be reached; a
    /// procedure that answered with a refusal yields `SettlementOutcome::Failure`.
    pub async fn settle<Tx>(
        &self,
        tx: &mut Tx,
        request: &SettlementRequest,
    ) -> Result<SettlementOutcome, PortError>
    where
        Tx: RecordTransaction,
        P: SettlementProcedure<Tx>,
    {
        debug!(
            patient_id = %request.patient_id,
            insurance_code = %request.insurance_code,
            origin = request.origin.code(),
            "Invoking settlement procedure"
        );

        let outcome = SettlementOutcome::from_reply(self.procedure.invoke(tx, request).await?);

        if let SettlementOutcome::Failure { message } = &outcome {
            warn!(patient_id = %request.patient_id, %message, "Settlement refused");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_kernel::{FixedClock, Timezone};
    use std::sync::Arc;

    fn calendar() -> LocalCalendar {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 7, 15, 14, 5, 9).unwrap());
        LocalCalendar::new(Timezone::default(), Arc::new(clock))
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let patient = PatientId::parse("P55").unwrap();
        let operator = OperatorId::parse("nurse01").unwrap();
        let request = SettlementDefaults::default().apply(
            &patient,
            &operator,
            None,
            &AssuranceInput::default(),
            &calendar(),
        );

        assert_eq!(request.insurance_code, "02");
        assert_eq!(request.company_code, "0");
        assert_eq!(request.department_code, "2090");
        assert_eq!(request.observation, ".");
        assert_eq!(request.physician_name, "");
        assert_eq!(request.origin, StaffOrigin::Hospitalization);
        assert_eq!(request.fua_number, ".");
        assert_eq!(request.billing_service_code, ".");
        assert_eq!(request.admission_date, "15/07/2024");
        assert_eq!(request.admission_time, "09:05:09");
    }

    #[test]
    fn test_caller_values_win_and_blanks_default() {
        let input = AssuranceInput {
            company_code: Some(" 7 ".to_string()),
            department_code: Some("   ".to_string()),
            origin_code: Some("EM".to_string()),
            admission_date: Some("01/02/2024".to_string()),
            ..AssuranceInput::default()
        };
        let request = SettlementDefaults::default().apply(
            &PatientId::parse("P1").unwrap(),
            &OperatorId::parse("u1").unwrap(),
            None,
            &input,
            &calendar(),
        );

        assert_eq!(request.company_code, "7");
        assert_eq!(request.department_code, "2090");
        assert_eq!(request.origin, StaffOrigin::Other("EM".to_string()));
        assert_eq!(request.admission_date, "01/02/2024");
    }

    #[test]
    fn test_stored_insurance_code_wins_over_caller() {
        let input = AssuranceInput {
            insurance_code: Some("20".to_string()),
            ..AssuranceInput::default()
        };
        let patient = PatientId::parse("P1").unwrap();
        let operator = OperatorId::parse("u1").unwrap();
        let defaults = SettlementDefaults::default();

        let request = defaults.apply(&patient, &operator, Some(" 17 "), &input, &calendar());
        assert_eq!(request.insurance_code, "17");

        let request = defaults.apply(&patient, &operator, Some("  "), &input, &calendar());
        assert_eq!(request.insurance_code, "20");
    }

    #[test]
    fn test_reply_interpretation() {
        assert_eq!(
            SettlementOutcome::from_reply(ProcedureReply::opened(" A900 ")),
            SettlementOutcome::Success { account_id: AccountId::parse("A900").unwrap() }
        );
        assert_eq!(
            SettlementOutcome::from_reply(ProcedureReply::refused(0, "Paciente sin historia")),
            SettlementOutcome::Failure { message: "Paciente sin historia".to_string() }
        );
        assert!(!SettlementOutcome::from_reply(ProcedureReply::default()).is_success());
        assert!(!SettlementOutcome::from_reply(ProcedureReply::opened("  ")).is_success());
    }

    #[test]
    fn test_refusal_without_message_mentions_status() {
        let outcome = SettlementOutcome::from_reply(ProcedureReply {
            rows: vec![ProcedureRow { status: -3, account_id: None, message: None }],
        });
        assert_eq!(
            outcome,
            SettlementOutcome::Failure { message: "Settlement procedure reported status -3".to_string() }
        );
    }
}
