//! Rollback runs, including the mixed-state guard

use catalog_migrate::{census, MigrateConfig, MigrationDriver, MigrationError, RollbackDriver};
use catalog_test_utils::{legacy_doc, migrated_doc, seeded_store, stored};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

fn quiet() -> MigrateConfig {
    MigrateConfig::new()
        .with_retry_backoff(Duration::ZERO)
        .with_progress_every(0)
}

#[tokio::test]
async fn migrate_then_rollback_restores_flat_fields() {
    let store = seeded_store([
        legacy_doc("a", "Test", 100.0),
        legacy_doc("b", "ଗଣିତ", 45.5),
    ]);

    MigrationDriver::new(store.clone(), quiet()).run().await.unwrap();
    let summary = RollbackDriver::new(store.clone(), quiet()).run().await.unwrap();
    assert_eq!((summary.scanned, summary.migrated, summary.failed), (2, 2, 0));
    assert_eq!(summary.attention_line(), "rollback: no documents require manual attention");

    let a = stored(&store, "a");
    assert_eq!(a["title"], json!("Test"));
    assert_eq!(a["price"].as_f64(), Some(100.0));
    for field in ["language", "academicGrade", "tags"] {
        assert!(!a.contains_key(field), "{field} left behind");
    }
    let b = stored(&store, "b");
    assert_eq!(b["title"], json!("ଗଣିତ"));
    assert_eq!(b["price"].as_f64(), Some(45.5));

    let counts = census(&*store).await.unwrap();
    assert_eq!((counts.legacy, counts.migrated), (2, 0));
}

#[tokio::test]
async fn migrate_rollback_migrate_keeps_display_and_price() {
    let store = seeded_store([legacy_doc("a", "Round Trip", 42.0)]);

    MigrationDriver::new(store.clone(), quiet()).run().await.unwrap();
    let first = stored(&store, "a");
    RollbackDriver::new(store.clone(), quiet()).run().await.unwrap();
    MigrationDriver::new(store.clone(), quiet()).run().await.unwrap();
    let again = stored(&store, "a");

    assert_eq!(again["title"]["display"], json!("Round Trip"));
    assert_eq!(again["price"]["original"].as_f64(), Some(42.0));
    assert_eq!(again, first);
}

#[tokio::test]
async fn rollback_keeps_the_price_customers_paid() {
    let store = seeded_store([migrated_doc("a", "Sale", 100.0, 80.0)]);

    RollbackDriver::new(store.clone(), quiet()).run().await.unwrap();
    assert_eq!(stored(&store, "a")["price"], json!(80));
}

#[tokio::test]
async fn mixed_collection_is_refused() {
    let store = seeded_store([legacy_doc("a", "Old", 1.0), migrated_doc("b", "New", 2.0, 2.0)]);

    let err = RollbackDriver::new(store.clone(), quiet())
        .run()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MigrationError::MixedState {
            legacy: 1,
            migrated: 1
        }
    ));
    assert_eq!(store.replace_count(), 0);
}

#[tokio::test]
async fn forced_rollback_finishes_mixed_collection() {
    let store = seeded_store([legacy_doc("a", "Old", 1.0), migrated_doc("b", "New", 2.0, 2.0)]);

    let summary = RollbackDriver::new(store.clone(), quiet().with_force(true))
        .run()
        .await
        .unwrap();
    assert_eq!((summary.migrated, summary.skipped), (1, 1));
    assert_eq!(stored(&store, "b")["title"], json!("New"));
}

#[tokio::test]
async fn second_rollback_writes_nothing() {
    let store = seeded_store([migrated_doc("a", "One", 3.0, 3.0)]);
    let driver = RollbackDriver::new(store.clone(), quiet());

    driver.run().await.unwrap();
    let summary = driver.run().await.unwrap();
    assert_eq!((summary.migrated, summary.skipped), (0, 1));
    assert_eq!(store.replace_count(), 1);
}

#[tokio::test]
async fn dry_rollback_writes_nothing() {
    let store = seeded_store([migrated_doc("a", "One", 3.0, 3.0)]);
    let before = store.snapshot();

    let summary = RollbackDriver::new(store.clone(), quiet().with_dry_run(true))
        .run()
        .await
        .unwrap();
    assert_eq!(summary.migrated, 1);
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn unreachable_store_is_fatal() {
    let store = seeded_store([migrated_doc("a", "One", 3.0, 3.0)]);
    store.set_unreachable(true);

    let err = RollbackDriver::new(store, quiet()).run().await.unwrap_err();
    assert!(err.is_connection());
}
