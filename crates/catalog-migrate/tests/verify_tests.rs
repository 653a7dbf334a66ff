//! Post-run verification

use catalog_migrate::{MigrateConfig, MigrationDriver, Verifier};
use catalog_model::{ItemId, Violation};
use catalog_test_utils::{doc, empty_store, legacy_doc, migrated_doc, seeded_store, three_doc_store};
use serde_json::json;

#[tokio::test]
async fn migrated_collection_passes() {
    let store = seeded_store((0..10).map(|i| legacy_doc(&format!("b{i}"), "Book", 10.0)));
    MigrationDriver::new(store.clone(), MigrateConfig::new().with_progress_every(0))
        .run()
        .await
        .unwrap();

    let report = Verifier::new(store).verify(None).await.unwrap();
    assert!(report.passed());
    assert_eq!((report.checked, report.migrated_ok), (10, 10));
}

#[tokio::test]
async fn leftovers_fail_verification() {
    let report = Verifier::new(three_doc_store()).verify(None).await.unwrap();
    assert!(!report.passed());
    assert_eq!(report.legacy_remaining, 2);
    assert_eq!(report.migrated_ok, 1);
    assert_eq!(report.malformed, 0);
}

#[tokio::test]
async fn broken_invariants_are_listed() {
    let bad = doc(json!({
        "_id": "bad",
        "title": {"display": "Sale", "english": "Sale", "odia": ""},
        "price": {"original": 100, "discounted": 50, "discountPercent": 10},
        "language": "English",
    }));
    let store = seeded_store([bad, migrated_doc("good", "Fine", 10.0, 10.0)]);

    let report = Verifier::new(store).verify(None).await.unwrap();
    assert_eq!(report.migrated_ok, 1);
    assert_eq!(report.violations.len(), 1);

    let entry = &report.violations[0];
    assert_eq!(entry.id, Some(ItemId::new("bad")));
    assert!(entry
        .violations
        .iter()
        .any(|v| matches!(v, Violation::DiscountPercent { .. })));
    assert!(entry
        .violations
        .contains(&Violation::EmptyTitleVariant { variant: "odia" }));
}

#[tokio::test]
async fn sample_limits_documents_checked() {
    let store = seeded_store((0..20).map(|i| migrated_doc(&format!("m{i:02}"), "Book", 5.0, 5.0)));

    let report = Verifier::new(store).verify(Some(7)).await.unwrap();
    assert_eq!(report.checked, 7);
    assert!(report.passed());
}

#[tokio::test]
async fn unreachable_store_aborts() {
    let store = empty_store();
    store.set_unreachable(true);
    assert!(Verifier::new(store).verify(None).await.unwrap_err().is_connection());
}
