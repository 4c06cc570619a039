//! Custom Test Assertions
//!
//! Assertion helpers for assurance results that give more meaningful
//! failure messages than a bare `assert_eq!`.

use domain_admission::{AssuranceError, AssuranceResult};

/// Asserts that the episode was linked to a pre-existing account
pub fn assert_linked_existing(result: &AssuranceResult, expected: &str) {
    match result {
        AssuranceResult::LinkedExisting { account_id } => assert_eq!(
            account_id.as_str(),
            expected,
            "Linked to the wrong existing account"
        ),
        other => panic!("Expected linked_existing({}), got {:?}", expected, other),
    }
}

/// Asserts that a new account was opened and linked
pub fn assert_created_and_linked(result: &AssuranceResult, expected: &str) {
    match result {
        AssuranceResult::CreatedAndLinked { account_id } => assert_eq!(
            account_id.as_str(),
            expected,
            "Linked to the wrong new account"
        ),
        other => panic!("Expected created_and_linked({}), got {:?}", expected, other),
    }
}

pub fn assert_not_applicable(result: &AssuranceResult) {
    assert!(
        matches!(result, AssuranceResult::NotApplicable { .. }),
        "Expected not_applicable, got {:?}",
        result
    );
}

/// Asserts a settlement refusal whose message contains `fragment`
pub fn assert_failed_with(result: &AssuranceResult, fragment: &str) {
    match result {
        AssuranceResult::Failed { message } => assert!(
            message.contains(fragment),
            "Failure message {:?} does not mention {:?}",
            message,
            fragment
        ),
        other => panic!("Expected failed, got {:?}", other),
    }
}

/// Asserts a validation error on the named field
pub fn assert_validation_error<T: std::fmt::Debug>(
    result: &Result<T, AssuranceError>,
    expected_field: &str,
) {
    match result {
        Err(AssuranceError::Validation { field, .. }) => assert_eq!(
            *field, expected_field,
            "Validation failed on an unexpected field"
        ),
        other => panic!("Expected validation error on {}, got {:?}", expected_field, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::AccountId;

    #[test]
    fn test_linked_assertions() {
        let account_id = AccountId::parse("A1").unwrap();
        assert_linked_existing(&AssuranceResult::LinkedExisting { account_id: account_id.clone() }, "A1");
        assert_created_and_linked(&AssuranceResult::CreatedAndLinked { account_id }, "A1");
    }

    #[test]
    #[should_panic(expected = "Expected not_applicable")]
    fn test_not_applicable_rejects_failures() {
        assert_not_applicable(&AssuranceResult::Failed { message: "x".to_string() });
    }

    #[test]
    fn test_validation_assertion() {
        let result: Result<(), AssuranceError> = Err(AssuranceError::validation("patient_id", "required"));
        assert_validation_error(&result, "patient_id");
    }
}
