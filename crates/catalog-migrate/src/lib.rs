//! Catalog Migrate - online reshaping of the catalog collection
//!
//! Moves every catalog document from the flat legacy shape to the nested
//! migrated shape while the collection keeps serving reads and writes:
//! - [`MigrationDriver`]: one idempotent, resumable pass over the collection
//! - [`RollbackDriver`]: the inverse pass, guarded against mixed state
//! - [`IndexManager`]: swaps the secondary indexes between shapes
//! - [`Verifier`]: checks stored documents against the migrated invariants
//! - [`CatalogApi`]: shape-agnostic reads and normalized writes
//!
//! # Preconditions
//!
//! Only one driver may run against a collection at a time. Nothing in this
//! crate enforces that; run the binary under whatever mutual exclusion the
//! deployment provides.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use catalog_migrate::prelude::*;
//!
//! let store = catalog_store::connect("memory://").await?;
//! let summary = MigrationDriver::new(store.clone(), MigrateConfig::new())
//!     .run()
//!     .await?;
//! println!("{}", summary.attention_line());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api;
pub mod census;
pub mod config;
pub mod driver;
pub mod error;
pub mod indexes;
pub mod progress;
pub mod rollback;
pub mod summary;
pub mod verify;

mod pass;

pub use api::CatalogApi;
pub use census::{census, Census};
pub use config::MigrateConfig;
pub use driver::MigrationDriver;
pub use error::{ApiError, MigrationError};
pub use indexes::{IndexCheck, IndexManager, IndexReport};
pub use rollback::RollbackDriver;
pub use summary::{FailureKind, FailureRecord, RunMode, RunSummary};
pub use verify::{VerificationReport, Verifier};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        CatalogApi, IndexManager, MigrateConfig, MigrationDriver, MigrationError, RollbackDriver,
        RunSummary, Verifier,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
