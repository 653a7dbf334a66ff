//! Cursor-driven rewrite pass shared by the migration and rollback drivers
//!
//! One pass reads every document once through a forward-only cursor, asks a
//! planner what to do with it, and batches the resulting conditional
//! replaces. A document's failure is counted and the pass moves on; only a
//! lost connection aborts it, and then the counts so far travel with the
//! error.

use crate::config::MigrateConfig;
use crate::error::MigrationError;
use crate::progress::Progress;
use crate::summary::{FailureKind, RunMode, RunSummary, Tally};
use catalog_model::{Document, ItemId, ModelError};
use catalog_store::{CatalogStore, ReplaceOp, StoreError};
use futures::StreamExt;
use std::time::Instant;

/// What to do with one scanned document
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Plan {
    /// Already in the target shape
    Skip,
    /// Replace with the transformed document
    Rewrite(ReplaceOp),
    /// Cannot be transformed; needs manual attention
    Fail {
        id: Option<ItemId>,
        kind: FailureKind,
        message: String,
    },
}

impl Plan {
    pub(crate) fn failed(id: Option<ItemId>, err: &ModelError) -> Self {
        Plan::Fail {
            id,
            kind: FailureKind::from(err),
            message: err.to_string(),
        }
    }
}

/// Run one pass over the whole collection
pub(crate) async fn run_pass<P>(
    store: &dyn CatalogStore,
    config: &MigrateConfig,
    mode: RunMode,
    plan: P,
) -> Result<RunSummary, MigrationError>
where
    P: Fn(Document) -> Plan,
{
    store.ping().await.map_err(MigrationError::FatalConnection)?;

    tracing::info!(
        "Starting {mode} pass on {} (dry_run={}, batch_size={})",
        store.describe(),
        config.dry_run,
        config.batch_size
    );

    let started = Instant::now();
    let mut tally = Tally::default();
    let mut progress = Progress::new(mode, config.progress_every);
    let mut batch: Vec<ReplaceOp> = Vec::with_capacity(config.batch_size);
    let mut cursor = store.scan();

    while let Some(next) = cursor.next().await {
        tally.scanned += 1;
        let doc = match next {
            Ok(doc) => doc,
            Err(e) => match reread(store, config, e).await {
                Ok(Some(doc)) => doc,
                Ok(None) => {
                    tracing::debug!("Document deleted while being read");
                    tally.skipped += 1;
                    continue;
                }
                Err(e) if e.is_fatal() => {
                    return Err(interrupted(tally, mode, config, started, e));
                }
                Err(e) => {
                    tracing::warn!("Unreadable document: {}", e);
                    tally.fail(e.document_id().cloned(), FailureKind::from(&e), e.to_string());
                    continue;
                }
            },
        };

        match plan(doc) {
            Plan::Skip => tally.skipped += 1,
            Plan::Fail { id, kind, message } => {
                tracing::warn!(
                    "Document {} failed: {}",
                    id.as_ref().map_or("<no id>", ItemId::as_str),
                    message
                );
                tally.fail(id, kind, message);
            }
            Plan::Rewrite(op) if config.dry_run => {
                tracing::debug!("Would rewrite {}", op.id);
                tally.migrated += 1;
            }
            Plan::Rewrite(op) => {
                batch.push(op);
                if batch.len() >= config.batch_size {
                    if let Err(e) = flush(store, config, &mut batch, &mut tally).await {
                        return Err(interrupted(tally, mode, config, started, e));
                    }
                }
            }
        }

        if let Some(line) = progress.tick(&tally) {
            println!("{line}");
        }
    }
    if let Err(e) = flush(store, config, &mut batch, &mut tally).await {
        return Err(interrupted(tally, mode, config, started, e));
    }

    let summary = tally.finish(mode, config.dry_run, started.elapsed());
    tracing::info!(
        "Finished {mode} pass: scanned={} migrated={} skipped={} failed={} in {}ms",
        summary.scanned,
        summary.migrated,
        summary.skipped,
        summary.failed,
        summary.elapsed_ms
    );
    Ok(summary)
}

/// Abort a pass on a fatal store error, keeping what it has counted
fn interrupted(
    tally: Tally,
    mode: RunMode,
    config: &MigrateConfig,
    started: Instant,
    source: StoreError,
) -> MigrationError {
    tracing::error!(
        "Aborting {mode} pass after {} documents: {}",
        tally.scanned,
        source
    );
    MigrationError::Interrupted {
        partial: Box::new(tally.finish(mode, config.dry_run, started.elapsed())),
        source,
    }
}

/// Read a document again by id after the cursor failed on it
///
/// Only transient failures that name their document are retried; `Ok(None)`
/// means the document was deleted in the meantime.
async fn reread(
    store: &dyn CatalogStore,
    config: &MigrateConfig,
    first: StoreError,
) -> Result<Option<Document>, StoreError> {
    if !first.is_retryable() {
        return Err(first);
    }
    let Some(id) = first.document_id().cloned() else {
        return Err(first);
    };

    let mut last = first;
    for attempt in 2..=config.max_attempts {
        tokio::time::sleep(config.retry_backoff * (attempt - 1)).await;
        match store.get(&id).await {
            Ok(doc) => return Ok(doc),
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    "Read of {} failed (attempt {attempt}/{}): {}",
                    id,
                    config.max_attempts,
                    e
                );
                last = StoreError::read(id.clone(), e);
            }
            Err(e) => return Err(StoreError::read(id, e)),
        }
    }
    Err(last)
}

/// Write the pending batch, retrying transient per-document failures
///
/// A fatal error is returned as is; documents before it in the batch are
/// already counted.
async fn flush(
    store: &dyn CatalogStore,
    config: &MigrateConfig,
    batch: &mut Vec<ReplaceOp>,
    tally: &mut Tally,
) -> Result<(), StoreError> {
    if batch.is_empty() {
        return Ok(());
    }

    let results = store.replace_batch(batch).await;
    for (op, result) in batch.iter().zip(results) {
        let outcome = match result {
            Err(e) if e.is_retryable() => retry(store, config, op, e).await,
            other => other,
        };
        match outcome {
            Ok(()) => {
                tracing::debug!("Rewrote {}", op.id);
                tally.migrated += 1;
            }
            Err(e) if e.is_conflict() => {
                tracing::warn!("Skipping {}: {}", op.id, e);
                tally.skipped += 1;
                tally.conflicts += 1;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!("Write to {} failed: {}", op.id, e);
                tally.fail(Some(op.id.clone()), FailureKind::from(&e), e.to_string());
            }
        }
    }
    batch.clear();
    Ok(())
}

/// Repeat a failed write until it succeeds, fails permanently, or attempts
/// run out; returns the last error in the latter cases
async fn retry(
    store: &dyn CatalogStore,
    config: &MigrateConfig,
    op: &ReplaceOp,
    mut last: StoreError,
) -> Result<(), StoreError> {
    for attempt in 2..=config.max_attempts {
        tokio::time::sleep(config.retry_backoff * (attempt - 1)).await;
        match store.replace(op).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    "Write to {} failed (attempt {attempt}/{}): {}",
                    op.id,
                    config.max_attempts,
                    e
                );
                last = e;
            }
            Err(e) => return Err(e),
        }
    }
    Err(last)
}
