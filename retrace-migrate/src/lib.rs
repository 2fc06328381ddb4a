//! # retrace-migrate
//!
//! Update engine for retrace.
//!
//! This crate answers one question for a single table: given the migrations
//! already applied, what does a new migration have to contain so the table
//! matches its desired shape?
//!
//! - Reading applied-migration history in a stable newest-first order
//! - Walking that history backwards, following table renames
//! - Rebuilding the table's shape from the recorded operations
//! - Diffing the rebuilt shape against the desired one
//! - Emitting update operations in a fixed, deterministic order
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ History Tbl  │────▶│ History Walker │────▶│ Reconstruct │
//! └──────────────┘     └────────────────┘     └─────────────┘
//!                              ▲                     │
//!                              │                     ▼
//!                      ┌────────────────┐     ┌─────────────┐
//!                      │ Migration Src  │     │ Shape Differ│
//!                      └────────────────┘     └─────────────┘
//!                                                    │
//!                                                    ▼
//!                                            ┌─────────────┐
//!                                            │  Emitter    │
//!                                            └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use retrace_migrate::{HistoryEntry, InMemoryHistory, InMemorySource, Updater};
//! use retrace_schema::{ColumnSpec, ColumnType, TableOperation, TableShape, UpdaterConfig};
//!
//! # fn main() -> Result<(), retrace_migrate::MigrationError> {
//! let source = InMemorySource::new().with_migration(
//!     "m240101_000000_create_orders",
//!     [TableOperation::create_table(
//!         "orders",
//!         [("id", ColumnSpec::of_type(ColumnType::Pk))],
//!     )],
//! );
//! let history = InMemoryHistory::new([HistoryEntry::new("m240101_000000_create_orders", 100)]);
//!
//! let updater = Updater::new(UpdaterConfig::new("orders"), history, source)?;
//! let desired = TableShape::new()
//!     .column("id", ColumnSpec::of_type(ColumnType::Pk))
//!     .column("note", ColumnSpec::of_type(ColumnType::Text));
//!
//! let plan = updater.plan(&desired)?;
//! assert!(plan.requires_migration());
//! assert_eq!(plan.operations().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Migration Files
//!
//! [`FileOperationSource`] reads one TOML file per migration:
//!
//! ```text
//! migrations/
//! ├── m240101_000000_create_orders.toml
//! └── m240102_000000_add_note.toml
//! ```

pub mod diff;
pub mod emit;
pub mod engine;
pub mod error;
pub mod history;
pub mod reconstruct;
pub mod source;
pub mod walker;

// Re-exports
pub use diff::{ColumnAlteration, Difference, ModificationSet, PropertyMismatch, ShapeDiffer, diff};
pub use emit::{Argument, EmitKind, EmitOptions, EmittedOperation, OperationEmitter};
pub use engine::{UpdateOutcome, UpdatePlan, Updater};
pub use error::{MigrateResult, MigrationError};
pub use history::{
    HistoryEntry, HistoryReader, HistoryStore, InMemoryHistory, MigrationRecord, canonical_version,
    compare_records,
};
pub use reconstruct::{apply, reconstruct};
pub use source::{FileOperationSource, InMemorySource, OperationSource, parse_operations};
pub use walker::{HistoryWalker, StopReason, WalkOutcome};
