//! Table shapes: the structural description of one table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::column::ColumnSpec;

/// A foreign key definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeySpec {
    /// Referencing columns on this table.
    pub columns: Vec<String>,
    /// Referenced table.
    pub ref_table: String,
    /// Referenced columns.
    pub ref_columns: Vec<String>,
    /// ON UPDATE action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
    /// ON DELETE action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

impl ForeignKeySpec {
    /// Create a foreign key without referential actions.
    pub fn new<C, R>(columns: C, ref_table: impl Into<String>, ref_columns: R) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ref_table: ref_table.into(),
            ref_columns: ref_columns.into_iter().map(Into::into).collect(),
            on_update: None,
            on_delete: None,
        }
    }

    /// Set the ON UPDATE action.
    pub fn on_update(mut self, action: impl Into<String>) -> Self {
        self.on_update = Some(action.into());
        self
    }

    /// Set the ON DELETE action.
    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }
}

/// Columns, primary key, foreign keys and unique indexes of one table.
///
/// Foreign keys and unique indexes are keyed by name; inserting a second
/// entry under an existing name replaces the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableShape {
    /// Columns by name, in first-seen order.
    #[serde(default)]
    pub columns: IndexMap<String, ColumnSpec>,
    /// Primary key columns (empty = none).
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Foreign keys by constraint name.
    #[serde(default)]
    pub foreign_keys: IndexMap<String, ForeignKeySpec>,
    /// Unique indexes by index name.
    #[serde(default)]
    pub unique_indexes: IndexMap<String, Vec<String>>,
}

impl TableShape {
    /// Create an empty shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, builder style.
    pub fn column(mut self, name: impl Into<String>, spec: ColumnSpec) -> Self {
        self.columns.insert(name.into(), spec);
        self
    }

    /// Set the primary key, builder style.
    pub fn primary_key<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a foreign key, builder style.
    pub fn foreign_key(mut self, name: impl Into<String>, spec: ForeignKeySpec) -> Self {
        self.foreign_keys.insert(name.into(), spec);
        self
    }

    /// Add a unique index, builder style.
    pub fn unique_index<I>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.unique_indexes
            .insert(name.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    /// Check whether the shape describes nothing at all.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
            && self.primary_key.is_empty()
            && self.foreign_keys.is_empty()
            && self.unique_indexes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ColumnType;

    #[test]
    fn test_table_shape_builder() {
        let shape = TableShape::new()
            .column("id", ColumnSpec::of_type(ColumnType::Pk))
            .column("customer_id", ColumnSpec::of_type(ColumnType::Integer))
            .foreign_key(
                "fk_orders_customer",
                ForeignKeySpec::new(["customer_id"], "customers", ["id"]).on_delete("CASCADE"),
            )
            .unique_index("uq_orders_number", ["number"]);

        assert_eq!(shape.columns.len(), 2);
        assert_eq!(
            shape.foreign_keys["fk_orders_customer"].on_delete.as_deref(),
            Some("CASCADE")
        );
        assert_eq!(shape.unique_indexes["uq_orders_number"], vec!["number"]);
        assert!(!shape.is_empty());
    }

    #[test]
    fn test_duplicate_index_name_last_wins() {
        let shape = TableShape::new()
            .unique_index("uq", ["a"])
            .unique_index("uq", ["b", "c"]);

        assert_eq!(shape.unique_indexes.len(), 1);
        assert_eq!(shape.unique_indexes["uq"], vec!["b", "c"]);
    }

    #[test]
    fn test_shape_serializes_deterministically() {
        let build = || {
            TableShape::new()
                .column("id", ColumnSpec::of_type(ColumnType::Pk))
                .column("name", ColumnSpec::of_type(ColumnType::String).length(64))
                .primary_key(["id"])
        };

        let first = serde_json::to_string(&build()).unwrap();
        let second = serde_json::to_string(&build()).unwrap();
        assert_eq!(first, second);
        assert!(first.find("\"id\"").unwrap() < first.find("\"name\"").unwrap());
    }
}
