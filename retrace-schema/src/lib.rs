//! # retrace-schema
//!
//! Shape model and configuration for retrace.
//!
//! This crate provides:
//! - Column, foreign-key and table-shape types describing one table
//! - The structural operations a migration can record against a table
//! - Database dialects with their primary-key marker strategies
//! - Configuration parser for `retrace.toml` files
//!
//! ## Example
//!
//! ```rust
//! use retrace_schema::{ColumnSpec, ColumnType, TableOperation, TableShape};
//!
//! let desired = TableShape::new()
//!     .column("id", ColumnSpec::of_type(ColumnType::Pk))
//!     .column("name", ColumnSpec::of_type(ColumnType::String).length(64).not_null())
//!     .unique_index("uq_orders_name", ["name"]);
//!
//! let op = TableOperation::add_column("orders", "note", ColumnSpec::of_type(ColumnType::Text));
//! assert!(op.concerns("orders"));
//! assert_eq!(desired.columns.len(), 2);
//! ```

pub mod ast;
pub mod config;
pub mod dialect;
pub mod error;

pub use ast::*;
pub use config::{DEFAULT_BASE_MIGRATION, RetraceConfig, UpdaterConfig};
pub use dialect::{Dialect, PrimaryKeyMarker};
pub use error::{SchemaError, SchemaResult};
