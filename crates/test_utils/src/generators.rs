//! Property-Based Test Generators
//!
//! proptest strategies for admission data that respects the stored-data
//! quirks of the legacy tables (padded codes and identifiers).

use proptest::prelude::*;

use crate::fixtures::InsuranceFixtures;

/// Strategy for surrounding whitespace as legacy CHAR columns produce it
pub fn padding_strategy() -> impl Strategy<Value = String> {
    "[ ]{0,3}"
}

/// Strategy for insurance codes that require settlement, possibly padded
pub fn eligible_insurance_code_strategy() -> impl Strategy<Value = String> {
    (
        padding_strategy(),
        prop::sample::select(InsuranceFixtures::ELIGIBLE.to_vec()),
        padding_strategy(),
    )
        .prop_map(|(left, code, right)| format!("{}{}{}", left, code, right))
}

/// Strategy for insurance codes that never require settlement
pub fn ineligible_insurance_code_strategy() -> impl Strategy<Value = String> {
    "[ 0-9A-Z]{0,4}".prop_filter("eligible codes excluded", |code| {
        !InsuranceFixtures::ELIGIBLE.contains(&code.trim())
    })
}

/// Strategy for non-blank identifiers such as episode or patient ids
pub fn identifier_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{1,2}-?[0-9]{1,8}"
}

/// Strategy for identifiers with surrounding padding
pub fn padded_identifier_strategy() -> impl Strategy<Value = (String, String)> {
    (padding_strategy(), identifier_strategy(), padding_strategy())
        .prop_map(|(left, id, right)| (format!("{}{}{}", left, id, right), id))
}

/// Strategy for blank strings, which callers treat as absent
pub fn blank_strategy() -> impl Strategy<Value = String> {
    "[ \t]{0,4}"
}
