//! # Retrace
//!
//! Rebuild a table's shape from the migrations that were applied to it and
//! work out what a new migration has to change.
//!
//! Retrace provides:
//! - A shape model for one table: columns, foreign keys, unique indexes
//! - Ordered replay of migration history, following table renames
//! - A differ that compares the desired shape against the recorded one
//! - Deterministic update operations ready for code generation
//!
//! ## Quick Start
//!
//! ```rust
//! use retrace::prelude::*;
//!
//! # fn main() -> Result<(), MigrationError> {
//! let source = InMemorySource::new().with_migration(
//!     "m240101_000000_create_orders",
//!     [TableOperation::create_table(
//!         "orders",
//!         [
//!             ("id", ColumnSpec::of_type(ColumnType::Pk)),
//!             ("name", ColumnSpec::of_type(ColumnType::String).length(64)),
//!         ],
//!     )],
//! );
//! let history = InMemoryHistory::new([HistoryEntry::new("m240101_000000_create_orders", 100)]);
//!
//! let updater = Updater::new(UpdaterConfig::new("orders"), history, source)?;
//! let desired = TableShape::new()
//!     .column("id", ColumnSpec::of_type(ColumnType::Pk))
//!     .column("name", ColumnSpec::of_type(ColumnType::String).length(64));
//!
//! assert!(!updater.is_update_required(&desired)?);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Shape model, dialects and configuration.
pub mod schema {
    pub use retrace_schema::*;
}

/// History replay, diffing and update planning.
pub mod migrate {
    pub use retrace_migrate::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::migrate::{
        EmitKind, HistoryEntry, HistoryStore, InMemoryHistory, InMemorySource, MigrationError,
        ModificationSet, OperationSource, UpdateOutcome, UpdatePlan, Updater,
    };
    pub use crate::schema::{
        ColumnSpec, ColumnType, Dialect, ForeignKeySpec, RetraceConfig, TableOperation,
        TableShape, UpdaterConfig,
    };
}

// Re-export key types at the crate root
pub use migrate::{MigrationError, Updater};
pub use schema::{RetraceConfig, SchemaError, TableShape};
