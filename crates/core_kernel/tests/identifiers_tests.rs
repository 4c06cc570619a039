//! Tests for trimmed string identifiers

use core_kernel::{AccountId, EpisodeId, OperatorId, PatientId};
use proptest::prelude::*;

#[test]
fn test_kinds() {
    assert_eq!(EpisodeId::kind(), "episode id");
    assert_eq!(PatientId::kind(), "patient id");
    assert_eq!(AccountId::kind(), "account id");
    assert_eq!(OperatorId::kind(), "operating user");
}

#[test]
fn test_from_str_matches_parse() {
    let parsed: PatientId = " P55".parse().unwrap();
    assert_eq!(parsed, PatientId::parse("P55 ").unwrap());
}

#[test]
fn test_into_string() {
    let id = AccountId::parse("A900").unwrap();
    let raw: String = id.into();
    assert_eq!(raw, "A900");
}

proptest! {
    #[test]
    fn padding_never_changes_identity(
        core in "[A-Z0-9-]{1,12}",
        left in " {0,4}",
        right in " {0,4}",
    ) {
        let padded = format!("{}{}{}", left, core, right);
        let id = EpisodeId::parse(&padded).unwrap();
        prop_assert_eq!(id.as_str(), core.as_str());
    }
}
