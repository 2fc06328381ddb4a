//! Sources of the structural operations recorded by each migration.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use retrace_schema::{ColumnSpec, ColumnType, ForeignKeySpec, Property, PropertyValue, TableOperation};
use serde::Deserialize;

use crate::error::{MigrateResult, MigrationError};

/// Resolves a migration identifier to the operations it performed.
pub trait OperationSource {
    /// Get the ordered operations of one migration.
    ///
    /// Failing to locate or load the migration is fatal for the run.
    fn operations_for(&self, id: &str) -> MigrateResult<Vec<TableOperation>>;
}

impl<T: OperationSource + ?Sized> OperationSource for &T {
    fn operations_for(&self, id: &str) -> MigrateResult<Vec<TableOperation>> {
        (**self).operations_for(id)
    }
}

impl<T: OperationSource + ?Sized> OperationSource for Box<T> {
    fn operations_for(&self, id: &str) -> MigrateResult<Vec<TableOperation>> {
        (**self).operations_for(id)
    }
}

/// Operations kept in memory, keyed by migration identifier.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    migrations: IndexMap<String, Vec<TableOperation>>,
}

impl InMemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration, builder style.
    pub fn with_migration(
        mut self,
        id: impl Into<String>,
        operations: impl IntoIterator<Item = TableOperation>,
    ) -> Self {
        self.insert(id, operations);
        self
    }

    /// Register a migration, replacing any previous one with the same id.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        operations: impl IntoIterator<Item = TableOperation>,
    ) {
        self.migrations
            .insert(id.into(), operations.into_iter().collect());
    }
}

impl OperationSource for InMemorySource {
    fn operations_for(&self, id: &str) -> MigrateResult<Vec<TableOperation>> {
        self.migrations
            .get(id)
            .cloned()
            .ok_or_else(|| MigrationError::migration_load(id, "migration is not registered"))
    }
}

/// Loads operations from `<dir>/<id>.toml` files.
///
/// ```toml
/// [[operations]]
/// kind = "create_table"
/// table = "orders"
/// columns.id = { type = "pk" }
/// columns.total = { type = "decimal", length = "10,2", not_null = true }
///
/// [[operations]]
/// kind = "add_foreign_key"
/// table = "orders"
/// name = "fk_orders_customer"
/// columns = ["customer_id"]
/// ref_table = "customers"
/// ref_columns = ["id"]
/// on_delete = "CASCADE"
/// ```
#[derive(Debug, Clone)]
pub struct FileOperationSource {
    migrations_dir: PathBuf,
}

impl FileOperationSource {
    /// Create a source reading from the given directory.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }

    /// Get the migrations directory.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Path of the file holding a migration.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.migrations_dir.join(format!("{}.toml", id))
    }
}

impl OperationSource for FileOperationSource {
    fn operations_for(&self, id: &str) -> MigrateResult<Vec<TableOperation>> {
        let path = self.path_for(id);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            MigrationError::migration_load(id, format!("{}: {}", path.display(), e))
        })?;

        parse_operations(&content).map_err(|e| MigrationError::migration_load(id, e.to_string()))
    }
}

/// Parse the contents of a migration operations file.
pub fn parse_operations(content: &str) -> Result<Vec<TableOperation>, toml::de::Error> {
    let file: MigrationFileDef = toml::from_str(content)?;
    Ok(file
        .operations
        .into_iter()
        .map(OperationDef::into_operation)
        .collect())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MigrationFileDef {
    #[serde(default)]
    operations: Vec<OperationDef>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum OperationDef {
    CreateTable {
        table: String,
        #[serde(default)]
        columns: IndexMap<String, ColumnDef>,
    },
    DropTable {
        table: String,
    },
    RenameTable {
        table: String,
        new_name: String,
    },
    AddColumn {
        table: String,
        name: String,
        column: ColumnDef,
    },
    DropColumn {
        table: String,
        name: String,
    },
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    AlterColumn {
        table: String,
        name: String,
        column: ColumnDef,
    },
    AddPrimaryKey {
        table: String,
        columns: Vec<String>,
    },
    DropPrimaryKey {
        table: String,
    },
    AddForeignKey {
        table: String,
        name: String,
        columns: Vec<String>,
        ref_table: String,
        ref_columns: Vec<String>,
        #[serde(default)]
        on_update: Option<String>,
        #[serde(default)]
        on_delete: Option<String>,
    },
    DropForeignKey {
        table: String,
        name: String,
    },
    CreateUniqueIndex {
        table: String,
        name: String,
        columns: Vec<String>,
    },
    DropIndex {
        table: String,
        name: String,
    },
    AddColumnComment {
        table: String,
        name: String,
        comment: String,
    },
    DropColumnComment {
        table: String,
        name: String,
    },
}

impl OperationDef {
    fn into_operation(self) -> TableOperation {
        match self {
            Self::CreateTable { table, columns } => TableOperation::create_table(
                table,
                columns.into_iter().map(|(n, c)| (n, ColumnSpec::from(c))),
            ),
            Self::DropTable { table } => TableOperation::drop_table(table),
            Self::RenameTable { table, new_name } => TableOperation::rename_table(table, new_name),
            Self::AddColumn {
                table,
                name,
                column,
            } => TableOperation::add_column(table, name, column.into()),
            Self::DropColumn { table, name } => TableOperation::drop_column(table, name),
            Self::RenameColumn { table, from, to } => {
                TableOperation::rename_column(table, from, to)
            }
            Self::AlterColumn {
                table,
                name,
                column,
            } => TableOperation::alter_column(table, name, column.into()),
            Self::AddPrimaryKey { table, columns } => {
                TableOperation::add_primary_key(table, columns)
            }
            Self::DropPrimaryKey { table } => TableOperation::drop_primary_key(table),
            Self::AddForeignKey {
                table,
                name,
                columns,
                ref_table,
                ref_columns,
                on_update,
                on_delete,
            } => {
                let mut spec = ForeignKeySpec::new(columns, ref_table, ref_columns);
                spec.on_update = on_update;
                spec.on_delete = on_delete;
                TableOperation::add_foreign_key(table, name, spec)
            }
            Self::DropForeignKey { table, name } => TableOperation::drop_foreign_key(table, name),
            Self::CreateUniqueIndex {
                table,
                name,
                columns,
            } => TableOperation::create_unique_index(table, name, columns),
            Self::DropIndex { table, name } => TableOperation::drop_index(table, name),
            Self::AddColumnComment {
                table,
                name,
                comment,
            } => TableOperation::add_column_comment(table, name, comment),
            Self::DropColumnComment { table, name } => {
                TableOperation::drop_column_comment(table, name)
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnDef {
    #[serde(rename = "type")]
    column_type: Option<ColumnType>,
    length: Option<ScalarDef>,
    not_null: Option<bool>,
    unsigned: Option<bool>,
    default: Option<DefaultDef>,
    comment: Option<String>,
    append: Option<String>,
    primary_key: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScalarDef {
    Bool(bool),
    Integer(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DefaultDef {
    Expression { expression: String },
    Scalar(ScalarDef),
}

impl From<ScalarDef> for PropertyValue {
    fn from(value: ScalarDef) -> Self {
        match value {
            ScalarDef::Bool(b) => PropertyValue::Bool(b),
            ScalarDef::Integer(i) => PropertyValue::Integer(i),
            ScalarDef::Text(s) => PropertyValue::Text(s),
        }
    }
}

impl From<ColumnDef> for ColumnSpec {
    fn from(def: ColumnDef) -> Self {
        let mut spec = ColumnSpec::new();
        if let Some(t) = def.column_type {
            spec.set(Property::Type, t);
        }
        if let Some(length) = def.length {
            spec.set(Property::Length, length);
        }
        if let Some(not_null) = def.not_null {
            spec.set(Property::NotNull, not_null);
        }
        if let Some(unsigned) = def.unsigned {
            spec.set(Property::Unsigned, unsigned);
        }
        match def.default {
            Some(DefaultDef::Expression { expression }) => {
                spec.set(Property::Default, PropertyValue::Expression(expression));
            }
            Some(DefaultDef::Scalar(value)) => {
                spec.set(Property::Default, value);
            }
            None => {}
        }
        if let Some(comment) = def.comment {
            spec.set(Property::Comment, comment);
        }
        if let Some(append) = def.append {
            spec.set(Property::Append, append);
        }
        if let Some(primary_key) = def.primary_key {
            spec.set(Property::PrimaryKey, primary_key);
        }
        spec
    }
}
