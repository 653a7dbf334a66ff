//! Index reconciliation and restore

use catalog_migrate::indexes::{legacy_indexes, migrated_indexes, CATALOG_TEXT_INDEX};
use catalog_migrate::IndexManager;
use catalog_store::{CatalogStore, FileStore, IndexSpec, MemoryStore, TextOptions};
use pretty_assertions::assert_eq;
use std::sync::Arc;

async fn with_legacy_indexes(store: &dyn CatalogStore) {
    for spec in legacy_indexes() {
        store.create_index(spec).await.unwrap();
    }
}

fn names(specs: &[IndexSpec]) -> Vec<String> {
    let mut names: Vec<String> = specs.iter().map(|s| s.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn reconcile_swaps_index_sets() {
    let store = Arc::new(MemoryStore::new());
    with_legacy_indexes(&*store).await;
    let manager = IndexManager::new(store.clone());

    let report = manager.reconcile().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.dropped.len(), 2);
    assert_eq!(report.created.len(), migrated_indexes().len());

    let current = store.list_indexes().await.unwrap();
    assert_eq!(names(&current), names(&migrated_indexes()));
}

#[tokio::test]
async fn reconcile_twice_converges() {
    let store = Arc::new(MemoryStore::new());
    with_legacy_indexes(&*store).await;
    let manager = IndexManager::new(store.clone());

    manager.reconcile().await.unwrap();
    let first = store.list_indexes().await.unwrap();

    let report = manager.reconcile().await.unwrap();
    assert!(report.dropped.is_empty());
    assert!(report.created.is_empty());
    assert_eq!(report.absent.len(), 2);
    assert_eq!(report.existing.len(), migrated_indexes().len());
    assert_eq!(store.list_indexes().await.unwrap(), first);
}

#[tokio::test]
async fn conflicting_index_does_not_stop_the_rest() {
    let store = Arc::new(MemoryStore::new());
    store
        .create_index(IndexSpec::ascending("tags_1", "labels"))
        .await
        .unwrap();

    let report = IndexManager::new(store.clone()).reconcile().await.unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.conflicts, vec!["tags_1".to_string()]);
    assert_eq!(report.created.len(), migrated_indexes().len() - 1);

    let check = IndexManager::new(store).verify().await.unwrap();
    assert_eq!(check.mismatched, vec!["tags_1".to_string()]);
}

#[tokio::test]
async fn stored_text_index_has_no_language_override() {
    let store = Arc::new(MemoryStore::new());
    IndexManager::new(store.clone()).reconcile().await.unwrap();

    let text = store
        .list_indexes()
        .await
        .unwrap()
        .into_iter()
        .find(|spec| spec.name == CATALOG_TEXT_INDEX)
        .unwrap();
    assert_eq!(text.text, Some(TextOptions::without_language_override()));
}

#[tokio::test]
async fn verify_reports_missing_and_stale() {
    let store = Arc::new(MemoryStore::new());
    with_legacy_indexes(&*store).await;
    let manager = IndexManager::new(store.clone());

    let before = manager.verify().await.unwrap();
    assert!(!before.is_ok());
    assert_eq!(before.stale.len(), 2);
    assert_eq!(before.missing.len(), migrated_indexes().len());

    manager.reconcile().await.unwrap();
    assert!(manager.verify().await.unwrap().is_ok());
}

#[tokio::test]
async fn restore_legacy_reverses_reconcile() {
    let store = Arc::new(MemoryStore::new());
    with_legacy_indexes(&*store).await;
    let manager = IndexManager::new(store.clone());

    manager.reconcile().await.unwrap();
    let report = manager.restore_legacy().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.dropped.len(), migrated_indexes().len());

    let current = store.list_indexes().await.unwrap();
    assert_eq!(names(&current), names(&legacy_indexes()));
}

#[tokio::test]
async fn unreachable_store_aborts() {
    let store = Arc::new(MemoryStore::new());
    store.set_unreachable(true);

    let err = IndexManager::new(store).reconcile().await.unwrap_err();
    assert!(err.is_connection());
}

#[tokio::test]
async fn file_store_catalogue_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Arc::new(FileStore::open(dir.path()).await.unwrap());
        IndexManager::new(store).reconcile().await.unwrap();
    }

    let reopened = Arc::new(FileStore::open(dir.path()).await.unwrap());
    assert!(IndexManager::new(reopened).verify().await.unwrap().is_ok());
}
