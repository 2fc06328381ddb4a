//! Structural operations recorded by migrations.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::column::ColumnSpec;
use super::shape::ForeignKeySpec;

/// One structural change a migration performed on a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Create the table with its initial columns.
    CreateTable {
        /// Columns in declaration order.
        columns: IndexMap<String, ColumnSpec>,
    },
    /// Drop the table.
    DropTable,
    /// Rename the table.
    RenameTable {
        /// Name the table is known by after the migration.
        new_name: String,
    },
    /// Add a column.
    AddColumn {
        /// Column name.
        name: String,
        /// Column definition.
        spec: ColumnSpec,
    },
    /// Drop a column.
    DropColumn {
        /// Column name.
        name: String,
    },
    /// Rename a column.
    RenameColumn {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// Replace a column's definition.
    AlterColumn {
        /// Column name.
        name: String,
        /// Complete new definition.
        spec: ColumnSpec,
    },
    /// Set the primary key.
    AddPrimaryKey {
        /// Key columns.
        columns: Vec<String>,
    },
    /// Drop the primary key.
    DropPrimaryKey,
    /// Add a foreign key.
    AddForeignKey {
        /// Constraint name.
        name: String,
        /// Key definition.
        #[serde(flatten)]
        spec: ForeignKeySpec,
    },
    /// Drop a foreign key.
    DropForeignKey {
        /// Constraint name.
        name: String,
    },
    /// Create a unique index.
    CreateUniqueIndex {
        /// Index name.
        name: String,
        /// Indexed columns.
        columns: Vec<String>,
    },
    /// Drop an index.
    DropIndex {
        /// Index name.
        name: String,
    },
    /// Set a column comment.
    AddColumnComment {
        /// Column name.
        name: String,
        /// Comment text.
        comment: String,
    },
    /// Clear a column comment.
    DropColumnComment {
        /// Column name.
        name: String,
    },
}

impl Operation {
    /// Get the operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateTable { .. } => "createTable",
            Self::DropTable => "dropTable",
            Self::RenameTable { .. } => "renameTable",
            Self::AddColumn { .. } => "addColumn",
            Self::DropColumn { .. } => "dropColumn",
            Self::RenameColumn { .. } => "renameColumn",
            Self::AlterColumn { .. } => "alterColumn",
            Self::AddPrimaryKey { .. } => "addPrimaryKey",
            Self::DropPrimaryKey => "dropPrimaryKey",
            Self::AddForeignKey { .. } => "addForeignKey",
            Self::DropForeignKey { .. } => "dropForeignKey",
            Self::CreateUniqueIndex { .. } => "createIndex",
            Self::DropIndex { .. } => "dropIndex",
            Self::AddColumnComment { .. } => "addCommentOnColumn",
            Self::DropColumnComment { .. } => "dropCommentFromColumn",
        }
    }
}

/// An operation together with the table it was issued against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOperation {
    /// Table the migration addressed.
    pub table: String,
    /// The change itself.
    #[serde(flatten)]
    pub operation: Operation,
}

impl TableOperation {
    /// Create a new table operation.
    pub fn new(table: impl Into<String>, operation: Operation) -> Self {
        Self {
            table: table.into(),
            operation,
        }
    }

    /// Name under which this operation is tracked.
    ///
    /// A rename is tracked under the name the table carries afterwards, so
    /// that walking history backwards meets it while following the new name.
    pub fn subject(&self) -> &str {
        match &self.operation {
            Operation::RenameTable { new_name } => new_name,
            _ => &self.table,
        }
    }

    /// Check whether this operation concerns the given table.
    pub fn concerns(&self, subject: &str) -> bool {
        self.subject() == subject
    }

    /// `createTable` with the given columns.
    pub fn create_table<I, N>(table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = (N, ColumnSpec)>,
        N: Into<String>,
    {
        let columns = columns.into_iter().map(|(n, s)| (n.into(), s)).collect();
        Self::new(table, Operation::CreateTable { columns })
    }

    /// `dropTable`.
    pub fn drop_table(table: impl Into<String>) -> Self {
        Self::new(table, Operation::DropTable)
    }

    /// `renameTable` from `table` to `new_name`.
    pub fn rename_table(table: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self::new(
            table,
            Operation::RenameTable {
                new_name: new_name.into(),
            },
        )
    }

    /// `addColumn`.
    pub fn add_column(table: impl Into<String>, name: impl Into<String>, spec: ColumnSpec) -> Self {
        Self::new(
            table,
            Operation::AddColumn {
                name: name.into(),
                spec,
            },
        )
    }

    /// `dropColumn`.
    pub fn drop_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(table, Operation::DropColumn { name: name.into() })
    }

    /// `renameColumn`.
    pub fn rename_column(
        table: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self::new(
            table,
            Operation::RenameColumn {
                from: from.into(),
                to: to.into(),
            },
        )
    }

    /// `alterColumn`.
    pub fn alter_column(
        table: impl Into<String>,
        name: impl Into<String>,
        spec: ColumnSpec,
    ) -> Self {
        Self::new(
            table,
            Operation::AlterColumn {
                name: name.into(),
                spec,
            },
        )
    }

    /// `addPrimaryKey`.
    pub fn add_primary_key<I>(table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::new(
            table,
            Operation::AddPrimaryKey {
                columns: columns.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// `dropPrimaryKey`.
    pub fn drop_primary_key(table: impl Into<String>) -> Self {
        Self::new(table, Operation::DropPrimaryKey)
    }

    /// `addForeignKey`.
    pub fn add_foreign_key(
        table: impl Into<String>,
        name: impl Into<String>,
        spec: ForeignKeySpec,
    ) -> Self {
        Self::new(
            table,
            Operation::AddForeignKey {
                name: name.into(),
                spec,
            },
        )
    }

    /// `dropForeignKey`.
    pub fn drop_foreign_key(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(table, Operation::DropForeignKey { name: name.into() })
    }

    /// `createIndex` with the unique flag set.
    pub fn create_unique_index<I>(table: impl Into<String>, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::new(
            table,
            Operation::CreateUniqueIndex {
                name: name.into(),
                columns: columns.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// `dropIndex`.
    pub fn drop_index(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(table, Operation::DropIndex { name: name.into() })
    }

    /// `addCommentOnColumn`.
    pub fn add_column_comment(
        table: impl Into<String>,
        name: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self::new(
            table,
            Operation::AddColumnComment {
                name: name.into(),
                comment: comment.into(),
            },
        )
    }

    /// `dropCommentFromColumn`.
    pub fn drop_column_comment(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(table, Operation::DropColumnComment { name: name.into() })
    }
}

impl fmt::Display for TableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.operation.name(), self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ColumnType;

    #[test]
    fn test_rename_is_tracked_under_new_name() {
        let op = TableOperation::rename_table("orders", "orders_v2");
        assert_eq!(op.subject(), "orders_v2");
        assert!(op.concerns("orders_v2"));
        assert!(!op.concerns("orders"));
    }

    #[test]
    fn test_other_operations_tracked_under_table() {
        let op = TableOperation::add_column("orders", "note", ColumnSpec::of_type(ColumnType::Text));
        assert!(op.concerns("orders"));
        assert_eq!(op.to_string(), "addColumn(orders)");
    }

    #[test]
    fn test_create_table_keeps_column_order() {
        let op = TableOperation::create_table(
            "orders",
            [
                ("id", ColumnSpec::of_type(ColumnType::Pk)),
                ("total", ColumnSpec::of_type(ColumnType::Decimal)),
                ("created_at", ColumnSpec::of_type(ColumnType::Timestamp)),
            ],
        );

        let Operation::CreateTable { columns } = &op.operation else {
            panic!("Expected CreateTable");
        };
        let names: Vec<&str> = columns.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "total", "created_at"]);
    }

    #[test]
    fn test_operation_serializes_with_kind_tag() {
        let op = TableOperation::drop_column("orders", "note");
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["kind"], "drop_column");
        assert_eq!(json["table"], "orders");
        assert_eq!(json["name"], "note");
    }
}
