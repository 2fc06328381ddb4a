//! Flattening a modification set into ordered migration operations.
//!
//! Output is grouped by category in a fixed order: `addColumn`,
//! `alterColumn`, `dropColumn`, `addForeignKey`, `dropForeignKey`,
//! `createIndex`, `dropIndex`. Arguments are structured values; turning them
//! into source text is left to the code generator.

use std::fmt;

use retrace_schema::{ColumnSpec, Dialect, Property, UpdaterConfig};
use serde::{Deserialize, Serialize};

use crate::diff::ModificationSet;

/// Migration method an emitted operation maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmitKind {
    /// Add a column.
    AddColumn,
    /// Replace a column definition.
    AlterColumn,
    /// Drop a column.
    DropColumn,
    /// Add a foreign key.
    AddForeignKey,
    /// Drop a foreign key.
    DropForeignKey,
    /// Create a unique index.
    CreateIndex,
    /// Drop an index.
    DropIndex,
}

impl EmitKind {
    /// Get the migration method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddColumn => "addColumn",
            Self::AlterColumn => "alterColumn",
            Self::DropColumn => "dropColumn",
            Self::AddForeignKey => "addForeignKey",
            Self::DropForeignKey => "dropForeignKey",
            Self::CreateIndex => "createIndex",
            Self::DropIndex => "dropIndex",
        }
    }
}

impl fmt::Display for EmitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positional argument of an emitted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// Table name.
    Table(String),
    /// Column name.
    Column(String),
    /// Constraint or index name.
    Name(String),
    /// Column list.
    Columns(Vec<String>),
    /// Column definition.
    Definition(ColumnSpec),
    /// Referential action; `None` is an explicit null placeholder.
    Action(Option<String>),
    /// Unique flag of an index.
    Unique(bool),
}

/// One operation of the generated migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedOperation {
    /// Migration method.
    pub kind: EmitKind,
    /// Positional arguments.
    pub arguments: Vec<Argument>,
}

impl EmittedOperation {
    fn new(kind: EmitKind, arguments: Vec<Argument>) -> Self {
        Self { kind, arguments }
    }

    /// Column the operation targets, if any.
    pub fn column(&self) -> Option<&str> {
        self.arguments.iter().find_map(|arg| match arg {
            Argument::Column(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

/// Options controlling column normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    /// Dialect whose primary-key markers are recognized.
    pub dialect: Dialect,
    /// Whether dialect-specific primary keys become general key types.
    pub general_schema: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            general_schema: true,
        }
    }
}

impl From<&UpdaterConfig> for EmitOptions {
    fn from(config: &UpdaterConfig) -> Self {
        Self {
            dialect: config.dialect,
            general_schema: config.general_schema,
        }
    }
}

/// Turns a modification set into ordered migration operations.
#[derive(Debug, Clone)]
pub struct OperationEmitter {
    table: String,
    options: EmitOptions,
}

impl OperationEmitter {
    /// Create an emitter for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            options: EmitOptions::default(),
        }
    }

    /// Set the emit options.
    pub fn with_options(mut self, options: EmitOptions) -> Self {
        self.options = options;
        self
    }

    fn table(&self) -> Argument {
        Argument::Table(self.table.clone())
    }

    /// Emit one operation per modification, grouped by category.
    pub fn emit(&self, set: &ModificationSet) -> Vec<EmittedOperation> {
        let mut ops = Vec::with_capacity(set.len());

        for (name, spec) in &set.add_columns {
            ops.push(EmittedOperation::new(
                EmitKind::AddColumn,
                vec![
                    self.table(),
                    Argument::Column(name.clone()),
                    Argument::Definition(self.normalize_column(spec)),
                ],
            ));
        }

        for alter in &set.alter_columns {
            ops.push(EmittedOperation::new(
                EmitKind::AlterColumn,
                vec![
                    self.table(),
                    Argument::Column(alter.name.clone()),
                    Argument::Definition(self.normalize_column(&alter.spec)),
                ],
            ));
        }

        for name in &set.drop_columns {
            ops.push(EmittedOperation::new(
                EmitKind::DropColumn,
                vec![self.table(), Argument::Column(name.clone())],
            ));
        }

        for (name, fk) in &set.add_foreign_keys {
            let mut arguments = vec![
                Argument::Name(name.clone()),
                self.table(),
                Argument::Columns(fk.columns.clone()),
                Argument::Table(fk.ref_table.clone()),
                Argument::Columns(fk.ref_columns.clone()),
            ];
            if fk.on_delete.is_some() || fk.on_update.is_some() {
                arguments.push(Argument::Action(fk.on_delete.clone()));
            }
            if fk.on_update.is_some() {
                arguments.push(Argument::Action(fk.on_update.clone()));
            }
            ops.push(EmittedOperation::new(EmitKind::AddForeignKey, arguments));
        }

        for name in &set.drop_foreign_keys {
            ops.push(EmittedOperation::new(
                EmitKind::DropForeignKey,
                vec![Argument::Name(name.clone()), self.table()],
            ));
        }

        for (name, columns) in &set.create_indexes {
            ops.push(EmittedOperation::new(
                EmitKind::CreateIndex,
                vec![
                    Argument::Name(name.clone()),
                    self.table(),
                    Argument::Columns(columns.clone()),
                    Argument::Unique(true),
                ],
            ));
        }

        for name in &set.drop_indexes {
            ops.push(EmittedOperation::new(
                EmitKind::DropIndex,
                vec![Argument::Name(name.clone()), self.table()],
            ));
        }

        ops
    }

    /// Normalize a column definition for the configured dialect.
    ///
    /// With `general_schema` on, an integer column whose trailing SQL holds
    /// the dialect's primary-key marker becomes a key type with the marker
    /// removed; its NOT NULL is kept. Columns that already have a key type
    /// drop the NOT NULL the type implies, except on SQL Server.
    pub fn normalize_column(&self, spec: &ColumnSpec) -> ColumnSpec {
        if !self.options.general_schema {
            return spec.clone();
        }

        let mut spec = spec.clone();
        let dialect = self.options.dialect;

        if spec.column_type().is_some_and(|t| t.is_primary_key()) {
            if !dialect.primary_key_needs_not_null() {
                spec.remove(Property::NotNull);
            }
            return spec;
        }

        let key_type = spec.column_type().and_then(|t| t.primary_key_variant());
        let marker = spec
            .append_sql()
            .map(|append| dialect.primary_key_marker(append));

        if let (Some(key_type), Some(marker)) = (key_type, marker) {
            if marker.is_primary_key {
                spec.set(Property::Type, key_type);
                match marker.remainder {
                    Some(rest) => {
                        spec.set(Property::Append, rest);
                    }
                    None => {
                        spec.remove(Property::Append);
                    }
                }
            }
        }

        spec
    }
}
