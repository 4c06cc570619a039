//! Account assurance DTOs

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use domain_admission::{AssuranceInput, AssuranceResult};

/// Body of `POST /api/v1/hospitalizations/:episode_id/account`
///
/// Every field is optional at this layer; the domain decides which ones are
/// required. Limits follow the legacy column widths.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssureAccountRequest {
    #[validate(length(max = 20))]
    pub patient_id: Option<String>,
    #[validate(custom(function = "short_code"))]
    pub insurance_code: Option<String>,
    #[validate(length(max = 10))]
    pub company_code: Option<String>,
    #[validate(length(max = 10))]
    pub department_code: Option<String>,
    #[validate(length(max = 250))]
    pub observation: Option<String>,
    /// `DD/MM/YYYY`
    #[serde(alias = "date")]
    #[validate(length(max = 10))]
    pub admission_date: Option<String>,
    /// `HH:MM:SS`
    #[serde(alias = "time")]
    #[validate(length(max = 8))]
    pub admission_time: Option<String>,
    #[validate(length(max = 120))]
    pub physician_name: Option<String>,
    #[validate(custom(function = "short_code"))]
    pub origin_code: Option<String>,
    #[validate(length(max = 30))]
    pub operating_user: Option<String>,
    #[validate(length(max = 30))]
    pub fua_number: Option<String>,
    #[validate(length(max = 10))]
    pub billing_service_code: Option<String>,
}

const SHORT_CODE_MAX: usize = 4;

/// Legacy code columns are padded, so only the trimmed code counts
fn short_code(value: &str) -> Result<(), ValidationError> {
    if value.trim().chars().count() > SHORT_CODE_MAX {
        return Err(ValidationError::new("length"));
    }
    Ok(())
}

impl From<AssureAccountRequest> for AssuranceInput {
    fn from(request: AssureAccountRequest) -> Self {
        AssuranceInput {
            patient_id: request.patient_id,
            insurance_code: request.insurance_code,
            company_code: request.company_code,
            department_code: request.department_code,
            observation: request.observation,
            admission_date: request.admission_date,
            admission_time: request.admission_time,
            physician_name: request.physician_name,
            origin_code: request.origin_code,
            operating_user: request.operating_user,
            fua_number: request.fua_number,
            billing_service_code: request.billing_service_code,
        }
    }
}

/// Result of an assurance call that reached a terminal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssureAccountResponse {
    /// True when the episode is linked to an account
    pub ok: bool,
    /// `not_applicable`, `linked_existing` or `created_and_linked`
    pub outcome: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl From<&AssuranceResult> for AssureAccountResponse {
    fn from(result: &AssuranceResult) -> Self {
        Self {
            ok: result.is_linked(),
            outcome: result.tag().to_string(),
            message: result.message(),
            account_id: result.account_id().map(|id| id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::AccountId;

    #[test]
    fn test_request_accepts_camel_case_and_short_aliases() {
        let request: AssureAccountRequest = serde_json::from_str(
            r#"{"patientId":"P55","operatingUser":"nurse01","date":"15/07/2024","fuaNumber":"F-1"}"#,
        )
        .unwrap();

        assert_eq!(request.patient_id.as_deref(), Some("P55"));
        assert_eq!(request.admission_date.as_deref(), Some("15/07/2024"));

        let input = AssuranceInput::from(request);
        assert_eq!(input.operating_user.as_deref(), Some("nurse01"));
        assert_eq!(input.fua_number.as_deref(), Some("F-1"));
    }

    #[test]
    fn test_overlong_fields_fail_validation() {
        let request = AssureAccountRequest {
            insurance_code: Some("02020".to_string()),
            ..AssureAccountRequest::default()
        };
        assert!(request.validate().is_err());
        assert!(AssureAccountRequest::default().validate().is_ok());
    }

    #[test]
    fn test_padded_codes_pass_validation() {
        let request = AssureAccountRequest {
            insurance_code: Some(" 02  ".to_string()),
            origin_code: Some("  HO    ".to_string()),
            ..AssureAccountRequest::default()
        };
        assert!(request.validate().is_ok());

        let request = AssureAccountRequest {
            origin_code: Some(" HOSP1 ".to_string()),
            ..AssureAccountRequest::default()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_response_omits_missing_account() {
        let response = AssureAccountResponse::from(&AssuranceResult::NotApplicable {
            insurance_code: "20".to_string(),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ok"], false);
        assert!(json.get("accountId").is_none());

        let linked = AssureAccountResponse::from(&AssuranceResult::CreatedAndLinked {
            account_id: AccountId::parse("A900").unwrap(),
        });
        let json = serde_json::to_value(&linked).unwrap();
        assert_eq!(json["accountId"], "A900");
        assert_eq!(json["outcome"], "created_and_linked");
    }
}
