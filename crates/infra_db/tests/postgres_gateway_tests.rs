//! PostgreSQL gateway tests
//!
//! These start a PostgreSQL container and need Docker:
//! `cargo test -p infra_db -- --ignored`

use domain_admission::{
    AccountAssuranceService, AssuranceConfig, AssuranceError, RecordStore, RecordTransaction,
};
use infra_db::{PostgresRecordStore, PostgresSettlementProcedure};
use test_utils::{
    assert_created_and_linked, assert_failed_with, assert_linked_existing, assert_not_applicable,
    create_isolated_test_database, AccountBuilder, AssuranceInputBuilder, EpisodeBuilder,
    IdFixtures, InsuranceFixtures, TemporalFixtures, TestDatabase,
};

fn service(
    db: &TestDatabase,
    config: AssuranceConfig,
) -> AccountAssuranceService<PostgresRecordStore, PostgresSettlementProcedure> {
    AccountAssuranceService::new(
        PostgresRecordStore::new(db.pool.clone()),
        PostgresSettlementProcedure::new(),
        TemporalFixtures::lima_calendar(),
        config,
    )
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_padded_episode_gets_new_account() {
    let db = create_isolated_test_database().await.unwrap();
    db.insert_episode(&EpisodeBuilder::new().build(), Some(" H-1001  "))
        .await
        .unwrap();

    let result = service(&db, AssuranceConfig::default())
        .assure_account("H-1001", &AssuranceInputBuilder::new().build())
        .await
        .unwrap();

    assert_created_and_linked(&result, "CTA100000");
    let (account, operator) = db.episode_link("H-1001").await.unwrap();
    assert_eq!(account.as_deref(), Some("CTA100000"));
    assert_eq!(operator.as_deref(), Some("nurse01"));
    assert_eq!(db.account_count("P55").await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_newest_active_account_is_reused() {
    let db = create_isolated_test_database().await.unwrap();
    db.insert_episode(&EpisodeBuilder::new().build(), None).await.unwrap();
    db.insert_account(&AccountBuilder::new("A-OLD").opened_days_before_admission(30).build())
        .await
        .unwrap();
    db.insert_account(&AccountBuilder::new("A-NEW").opened_days_before_admission(2).build())
        .await
        .unwrap();
    db.insert_account(
        &AccountBuilder::new("A-CLOSED")
            .with_status("C")
            .opened_days_before_admission(1)
            .build(),
    )
    .await
    .unwrap();

    let service = service(&db, AssuranceConfig::default());
    let input = AssuranceInputBuilder::new().build();

    let first = service.assure_account("H-1001", &input).await.unwrap();
    let second = service.assure_account("H-1001", &input).await.unwrap();

    assert_linked_existing(&first, "A-NEW");
    assert_eq!(first, second);
    assert_eq!(db.account_count("P55").await.unwrap(), 3);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_ineligible_insurance_writes_nothing() {
    let db = create_isolated_test_database().await.unwrap();
    db.insert_episode(
        &EpisodeBuilder::new()
            .with_insurance_code(InsuranceFixtures::ineligible())
            .build(),
        None,
    )
    .await
    .unwrap();

    let result = service(&db, AssuranceConfig::default())
        .assure_account("H-1001", &AssuranceInputBuilder::new().build())
        .await
        .unwrap();

    assert_not_applicable(&result);
    assert_eq!(db.episode_link("H-1001").await.unwrap(), (None, None));
    assert_eq!(db.account_count("P55").await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_raised_settlement_is_a_refusal() {
    let db = create_isolated_test_database().await.unwrap();
    db.insert_episode(&EpisodeBuilder::new().build(), None).await.unwrap();
    db.install_raising_settlement("Paciente sin historia clinica")
        .await
        .unwrap();

    let result = service(&db, AssuranceConfig::default())
        .assure_account("H-1001", &AssuranceInputBuilder::new().build())
        .await
        .unwrap();

    assert_failed_with(&result, "sin historia");
    assert_eq!(db.episode_link("H-1001").await.unwrap(), (None, None));
    assert_eq!(db.account_count("P55").await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_unknown_episode() {
    let db = create_isolated_test_database().await.unwrap();

    let error = service(&db, AssuranceConfig::default())
        .assure_account("H-404", &AssuranceInputBuilder::new().build())
        .await
        .unwrap_err();

    assert!(matches!(error, AssuranceError::EpisodeNotFound(_)));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_per_patient_lock_serializes_calls() {
    let db = create_isolated_test_database().await.unwrap();
    db.insert_episode(&EpisodeBuilder::new().build(), None).await.unwrap();
    db.insert_episode(&EpisodeBuilder::new().with_episode_id("H-1002").build(), None)
        .await
        .unwrap();

    let config = AssuranceConfig {
        serialize_per_patient: true,
        ..AssuranceConfig::default()
    };
    let service = service(&db, config);
    let input = AssuranceInputBuilder::new().build();

    let (first, second) = tokio::join!(
        service.assure_account("H-1001", &input),
        service.assure_account("H-1002", &input),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.account_id(), second.account_id());
    assert_eq!(db.account_count("P55").await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_dropped_transaction_leaves_no_trace() {
    let db = create_isolated_test_database().await.unwrap();
    db.insert_episode(&EpisodeBuilder::new().build(), None).await.unwrap();
    let store = PostgresRecordStore::new(db.pool.clone());

    {
        let mut tx = store.begin().await.unwrap();
        let updated = tx
            .link_account(
                &IdFixtures::episode_id(),
                &IdFixtures::account_id("A-GHOST"),
                &IdFixtures::operator(),
            )
            .await
            .unwrap();
        assert_eq!(updated, 1);
    }

    assert_eq!(db.episode_link("H-1001").await.unwrap(), (None, None));
}
