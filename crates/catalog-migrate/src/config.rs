//! Run configuration
//!
//! Passed explicitly into the drivers; nothing reads mode flags from global
//! state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Migration / rollback run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrateConfig {
    /// Transform and count, but write nothing
    pub dry_run: bool,
    /// Conditional replaces sent to the store per batch (min 1)
    pub batch_size: usize,
    /// Total attempts per document read or write before it counts as failed
    pub max_attempts: u32,
    /// Backoff before retry `n` is `retry_backoff * n`
    pub retry_backoff: Duration,
    /// Progress line cadence in scanned documents; 0 disables progress lines
    pub progress_every: u64,
    /// Roll back even when the collection holds both shapes
    pub force: bool,
    /// Reconcile indexes after a live run
    pub reconcile_indexes: bool,
    /// Documents checked by post-run verification; `None` checks all
    pub verify_sample: Option<usize>,
}

impl MigrateConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With dry-run mode
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// With batch size (clamped to at least 1)
    #[inline]
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// With read/write attempts per document (clamped to at least 1)
    #[inline]
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// With retry backoff step
    #[inline]
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// With progress cadence
    #[inline]
    #[must_use]
    pub fn with_progress_every(mut self, every: u64) -> Self {
        self.progress_every = every;
        self
    }

    /// With forced rollback
    #[inline]
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// With index reconciliation toggle
    #[inline]
    #[must_use]
    pub fn with_reconcile_indexes(mut self, reconcile: bool) -> Self {
        self.reconcile_indexes = reconcile;
        self
    }

    /// With verification sample size
    #[inline]
    #[must_use]
    pub fn with_verify_sample(mut self, sample: Option<usize>) -> Self {
        self.verify_sample = sample;
        self
    }
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            batch_size: 100,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(50),
            progress_every: 1000,
            force: false,
            reconcile_indexes: true,
            verify_sample: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_clamp() {
        let config = MigrateConfig::new()
            .with_batch_size(0)
            .with_max_attempts(0)
            .with_dry_run(true);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.max_attempts, 1);
        assert!(config.dry_run);
    }

    #[test]
    fn defaults() {
        let config = MigrateConfig::default();
        assert!(!config.dry_run);
        assert!(!config.force);
        assert!(config.reconcile_indexes);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.verify_sample, None);
    }
}
