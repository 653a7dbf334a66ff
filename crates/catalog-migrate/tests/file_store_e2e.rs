//! Full migrate / reconcile / verify / rollback cycle on a directory store

use catalog_migrate::{
    census, CatalogApi, IndexManager, MigrateConfig, MigrationDriver, RollbackDriver, Verifier,
};
use catalog_model::ItemId;
use catalog_store::{connect, CatalogStore, FileStore};
use catalog_test_utils::{legacy_doc, malformed_doc};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn migrate_and_roll_back_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).await.unwrap());
    for doc in [
        legacy_doc("a", "Test", 100.0),
        legacy_doc("b", "ଓଡ଼ିଆ ବହି", 80.0),
        legacy_doc("c", "Mixed ମିଶ୍ରିତ", 60.0),
        malformed_doc("d"),
    ] {
        store.insert(doc).await.unwrap();
    }
    let config = MigrateConfig::new().with_progress_every(0).with_batch_size(2);

    let summary = MigrationDriver::new(store.clone(), config.clone())
        .run()
        .await
        .unwrap();
    assert_eq!((summary.migrated, summary.failed), (3, 1));

    let report = IndexManager::new(store.clone()).reconcile().await.unwrap();
    assert!(report.is_clean());

    let verification = Verifier::new(store.clone()).verify(None).await.unwrap();
    assert_eq!(verification.migrated_ok, 3);
    assert_eq!(verification.malformed, 1);
    assert!(verification.violations.is_empty());

    // survives a reopen through the connection string
    let url = format!("file://{}", dir.path().display());
    let reopened = connect(&url).await.unwrap();
    let counts = census(&*reopened).await.unwrap();
    assert_eq!((counts.legacy, counts.migrated, counts.malformed), (0, 3, 1));

    let mixed = CatalogApi::new(reopened.clone())
        .get_item(&ItemId::new("c"))
        .await
        .unwrap()
        .unwrap();
    assert!(mixed.title.english.is_some());
    assert!(mixed.title.odia.is_some());

    let summary = RollbackDriver::new(reopened.clone(), config).run().await.unwrap();
    assert_eq!((summary.migrated, summary.failed), (3, 1));
    IndexManager::new(reopened.clone())
        .restore_legacy()
        .await
        .unwrap();

    let counts = census(&*reopened).await.unwrap();
    assert_eq!((counts.legacy, counts.migrated), (3, 0));
    assert_eq!(reopened.count().await.unwrap(), 4);
}
