//! Property tests for insurance classification

use proptest::prelude::*;
use std::sync::Arc;

use core_kernel::{EpisodeId, LocalCalendar, PatientId};

use domain_admission::adapters::{InMemoryRecordStore, ScriptedSettlement};
use domain_admission::{
    classify, AccountAssuranceService, AssuranceConfig, AssuranceInput, HospitalizationEpisode,
    InsurancePlan,
};
use test_utils::{
    assert_validation_error, blank_strategy, eligible_insurance_code_strategy,
    ineligible_insurance_code_strategy, padded_identifier_strategy, InsuranceFixtures,
};

const ELIGIBLE: [&str; 3] = InsuranceFixtures::ELIGIBLE;

fn current_thread_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn service(
    store: &InMemoryRecordStore,
    settlement: &Arc<ScriptedSettlement>,
) -> AccountAssuranceService<InMemoryRecordStore, Arc<ScriptedSettlement>> {
    AccountAssuranceService::new(
        store.clone(),
        Arc::clone(settlement),
        LocalCalendar::default(),
        AssuranceConfig::default(),
    )
}

proptest! {
    #[test]
    fn classify_is_total(code in ".*") {
        let eligibility = classify(&code);
        prop_assert_eq!(
            eligibility.requires_settlement,
            ELIGIBLE.contains(&code.trim())
        );
    }

    #[test]
    fn eligible_codes_survive_padding(code in eligible_insurance_code_strategy()) {
        let eligibility = classify(&code);
        prop_assert!(eligibility.requires_settlement);
        prop_assert_eq!(eligibility.plan.code(), code.trim());
    }

    #[test]
    fn ineligible_codes_never_write(
        code in ineligible_insurance_code_strategy(),
        (padded_episode, episode) in padded_identifier_strategy(),
    ) {
        current_thread_runtime().block_on(async {
            let store = InMemoryRecordStore::new();
            let settlement = Arc::new(ScriptedSettlement::opening(["A1"]));
            store
                .insert_episode(HospitalizationEpisode::new(
                    EpisodeId::parse(&episode).unwrap(),
                    PatientId::parse("P1").unwrap(),
                    code.clone(),
                ))
                .await;

            let input = AssuranceInput {
                patient_id: Some("P1".to_string()),
                operating_user: Some("u1".to_string()),
                ..AssuranceInput::default()
            };

            let result = service(&store, &settlement)
                .assure_account(&padded_episode, &input)
                .await
                .unwrap();
            assert_eq!(result.tag(), "not_applicable");
            assert_eq!(store.link_writes(), 0);
            assert_eq!(settlement.call_count().await, 0);
        });
    }

    #[test]
    fn blank_operator_is_rejected_before_any_transaction(operator in blank_strategy()) {
        current_thread_runtime().block_on(async {
            let store = InMemoryRecordStore::new();
            let settlement = Arc::new(ScriptedSettlement::opening(["A1"]));
            let input = AssuranceInput {
                patient_id: Some("P1".to_string()),
                operating_user: Some(operator.clone()),
                ..AssuranceInput::default()
            };

            let result = service(&store, &settlement).assure_account("H-1", &input).await;
            assert_validation_error(&result, "operating_user");
            assert_eq!(store.commits() + store.rollbacks(), 0);
        });
    }
}

#[test]
fn test_plan_labels() {
    assert_eq!(InsurancePlan::Soat.to_string(), "SOAT (02)");
    assert_eq!(
        InsurancePlan::from_code("99").to_string(),
        "unrecognized (\"99\")"
    );
}
