//! Shape diffing for generating update migrations.

use std::fmt;

use indexmap::IndexMap;
use retrace_schema::{ColumnSpec, ForeignKeySpec, Property, PropertyValue, TableShape};

/// The first property found to differ on a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMismatch {
    /// Property name.
    pub property: Property,
    /// Value in the desired shape.
    pub desired: PropertyValue,
    /// Value reconstructed from history (`None` when absent).
    pub actual: Option<PropertyValue>,
}

/// A column whose definition must be replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAlteration {
    /// Column name.
    pub name: String,
    /// Complete desired definition.
    pub spec: ColumnSpec,
    /// What triggered the alteration.
    pub mismatch: PropertyMismatch,
}

/// Additions, removals and alterations needed to reach the desired shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModificationSet {
    /// Columns to add.
    pub add_columns: IndexMap<String, ColumnSpec>,
    /// Columns to alter.
    pub alter_columns: Vec<ColumnAlteration>,
    /// Columns to drop.
    pub drop_columns: Vec<String>,
    /// Foreign keys to add.
    pub add_foreign_keys: IndexMap<String, ForeignKeySpec>,
    /// Foreign keys to drop.
    pub drop_foreign_keys: Vec<String>,
    /// Unique indexes to create.
    pub create_indexes: IndexMap<String, Vec<String>>,
    /// Indexes to drop.
    pub drop_indexes: Vec<String>,
}

impl ModificationSet {
    /// Check if there are any differences.
    pub fn is_empty(&self) -> bool {
        self.add_columns.is_empty()
            && self.alter_columns.is_empty()
            && self.drop_columns.is_empty()
            && self.add_foreign_keys.is_empty()
            && self.drop_foreign_keys.is_empty()
            && self.create_indexes.is_empty()
            && self.drop_indexes.is_empty()
    }

    /// Check whether a new migration is required.
    pub fn has_changes(&self) -> bool {
        !self.is_empty()
    }

    /// Total number of modifications.
    pub fn len(&self) -> usize {
        self.add_columns.len()
            + self.alter_columns.len()
            + self.drop_columns.len()
            + self.add_foreign_keys.len()
            + self.drop_foreign_keys.len()
            + self.create_indexes.len()
            + self.drop_indexes.len()
    }

    /// Get a human-readable summary of the set.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if !self.add_columns.is_empty() {
            parts.push(format!("Add {} columns", self.add_columns.len()));
        }
        if !self.alter_columns.is_empty() {
            parts.push(format!("Alter {} columns", self.alter_columns.len()));
        }
        if !self.drop_columns.is_empty() {
            parts.push(format!("Drop {} columns", self.drop_columns.len()));
        }
        if !self.add_foreign_keys.is_empty() {
            parts.push(format!("Add {} foreign keys", self.add_foreign_keys.len()));
        }
        if !self.drop_foreign_keys.is_empty() {
            parts.push(format!("Drop {} foreign keys", self.drop_foreign_keys.len()));
        }
        if !self.create_indexes.is_empty() {
            parts.push(format!("Create {} unique indexes", self.create_indexes.len()));
        }
        if !self.drop_indexes.is_empty() {
            parts.push(format!("Drop {} indexes", self.drop_indexes.len()));
        }

        if parts.is_empty() {
            "No changes".to_string()
        } else {
            parts.join(", ")
        }
    }

    /// List every difference in reporting order.
    pub fn differences(&self) -> Vec<Difference> {
        let mut out = Vec::with_capacity(self.len());

        out.extend(self.add_columns.keys().cloned().map(Difference::MissingColumn));
        out.extend(self.alter_columns.iter().map(|alter| match &alter.mismatch.actual {
            None | Some(PropertyValue::Null) => Difference::MissingProperty {
                column: alter.name.clone(),
                property: alter.mismatch.property,
                desired: alter.mismatch.desired.clone(),
            },
            Some(actual) => Difference::DifferentProperty {
                column: alter.name.clone(),
                property: alter.mismatch.property,
                desired: alter.mismatch.desired.clone(),
                actual: actual.clone(),
            },
        }));
        out.extend(self.drop_columns.iter().cloned().map(Difference::ExcessiveColumn));
        out.extend(
            self.add_foreign_keys
                .keys()
                .cloned()
                .map(Difference::MissingForeignKey),
        );
        out.extend(
            self.drop_foreign_keys
                .iter()
                .cloned()
                .map(Difference::ExcessiveForeignKey),
        );
        out.extend(
            self.create_indexes
                .keys()
                .cloned()
                .map(Difference::MissingUniqueIndex),
        );
        out.extend(self.drop_indexes.iter().cloned().map(Difference::ExcessiveUniqueIndex));

        out
    }
}

/// One reportable difference between desired and reconstructed shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difference {
    /// Column exists only in the desired shape.
    MissingColumn(String),
    /// Desired property has no value in history.
    MissingProperty {
        /// Column name.
        column: String,
        /// Property name.
        property: Property,
        /// Desired value.
        desired: PropertyValue,
    },
    /// Property values disagree.
    DifferentProperty {
        /// Column name.
        column: String,
        /// Property name.
        property: Property,
        /// Desired value.
        desired: PropertyValue,
        /// Reconstructed value.
        actual: PropertyValue,
    },
    /// Column exists only in history.
    ExcessiveColumn(String),
    /// Foreign key exists only in the desired shape.
    MissingForeignKey(String),
    /// Foreign key exists only in history.
    ExcessiveForeignKey(String),
    /// Unique index exists only in the desired shape.
    MissingUniqueIndex(String),
    /// Unique index exists only in history.
    ExcessiveUniqueIndex(String),
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn(name) => write!(f, "missing column '{}'", name),
            Self::MissingProperty {
                column,
                property,
                desired,
            } => write!(
                f,
                "missing '{}' column property: {} (DB: {})",
                column, property, desired
            ),
            Self::DifferentProperty {
                column,
                property,
                desired,
                actual,
            } => write!(
                f,
                "different '{}' column property: {} (DB: {} <> MIG: {})",
                column, property, desired, actual
            ),
            Self::ExcessiveColumn(name) => write!(f, "excessive column '{}'", name),
            Self::MissingForeignKey(name) => write!(f, "missing foreign key '{}'", name),
            Self::ExcessiveForeignKey(name) => write!(f, "excessive foreign key '{}'", name),
            Self::MissingUniqueIndex(name) => write!(f, "missing unique index '{}'", name),
            Self::ExcessiveUniqueIndex(name) => write!(f, "excessive unique index '{}'", name),
        }
    }
}

/// Shape differ comparing a desired shape with a reconstructed one.
pub struct ShapeDiffer<'a> {
    /// Desired state.
    desired: &'a TableShape,
    /// State reconstructed from history.
    actual: Option<&'a TableShape>,
}

impl<'a> ShapeDiffer<'a> {
    /// Create a differ with only the desired shape.
    pub fn new(desired: &'a TableShape) -> Self {
        Self {
            desired,
            actual: None,
        }
    }

    /// Set the reconstructed shape.
    pub fn with_actual(mut self, actual: &'a TableShape) -> Self {
        self.actual = Some(actual);
        self
    }

    /// Compute the modification set.
    ///
    /// Every category is always examined. Primary keys are not compared:
    /// the desired shape carries them through column types.
    pub fn diff(&self) -> ModificationSet {
        let empty = TableShape::new();
        let desired = self.desired;
        let actual = self.actual.unwrap_or(&empty);
        let mut result = ModificationSet::default();

        for (name, spec) in &desired.columns {
            match actual.columns.get(name) {
                None => {
                    result.add_columns.insert(name.clone(), spec.clone());
                }
                Some(existing) => {
                    if let Some(mismatch) = first_mismatch(spec, existing) {
                        result.alter_columns.push(ColumnAlteration {
                            name: name.clone(),
                            spec: spec.clone(),
                            mismatch,
                        });
                    }
                }
            }
        }

        for name in actual.columns.keys() {
            if !desired.columns.contains_key(name) {
                result.drop_columns.push(name.clone());
            }
        }

        for (name, fk) in &desired.foreign_keys {
            if !actual.foreign_keys.contains_key(name) {
                result.add_foreign_keys.insert(name.clone(), fk.clone());
            }
        }

        for name in actual.foreign_keys.keys() {
            if !desired.foreign_keys.contains_key(name) {
                result.drop_foreign_keys.push(name.clone());
            }
        }

        for (name, columns) in &desired.unique_indexes {
            if !actual.unique_indexes.contains_key(name) {
                result.create_indexes.insert(name.clone(), columns.clone());
            }
        }

        for name in actual.unique_indexes.keys() {
            if !desired.unique_indexes.contains_key(name) {
                result.drop_indexes.push(name.clone());
            }
        }

        for difference in result.differences() {
            tracing::debug!(%difference, "shape difference");
        }

        result
    }
}

/// Diff a desired shape against a reconstructed one.
pub fn diff(desired: &TableShape, actual: &TableShape) -> ModificationSet {
    ShapeDiffer::new(desired).with_actual(actual).diff()
}

/// Find the first desired property that history does not match.
///
/// A non-null desired value needs a non-null equal value in history; a
/// desired null matches an absent or null property.
fn first_mismatch(desired: &ColumnSpec, actual: &ColumnSpec) -> Option<PropertyMismatch> {
    desired.iter().find_map(|(property, value)| {
        let existing = actual.get(property);
        let differs = match existing {
            None | Some(PropertyValue::Null) => !value.is_null(),
            Some(existing) => existing != value,
        };

        differs.then(|| PropertyMismatch {
            property,
            desired: value.clone(),
            actual: existing.cloned(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use retrace_schema::ColumnType;

    fn orders() -> TableShape {
        TableShape::new()
            .column("id", ColumnSpec::of_type(ColumnType::Pk))
            .column("name", ColumnSpec::of_type(ColumnType::String).length(64).not_null())
            .foreign_key(
                "fk_orders_customer",
                ForeignKeySpec::new(["customer_id"], "customers", ["id"]),
            )
            .unique_index("uq_orders_name", ["name"])
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let shape = orders();
        let result = diff(&shape, &shape);
        assert!(result.is_empty());
        assert!(!result.has_changes());
        assert_eq!(result.summary(), "No changes");
    }

    #[test]
    fn test_missing_column_is_added() {
        let desired = TableShape::new()
            .column("id", ColumnSpec::of_type(ColumnType::Integer))
            .column("name", ColumnSpec::of_type(ColumnType::String));
        let actual = TableShape::new().column("id", ColumnSpec::of_type(ColumnType::Integer));

        let result = diff(&desired, &actual);
        assert_eq!(result.len(), 1);
        assert_eq!(
            result.add_columns["name"],
            ColumnSpec::of_type(ColumnType::String)
        );
    }

    #[test]
    fn test_excessive_column_is_dropped() {
        let desired = TableShape::new().column("id", ColumnSpec::of_type(ColumnType::Pk));
        let actual = orders();

        let result = diff(&desired, &actual);
        assert_eq!(result.drop_columns, vec!["name"]);
        assert_eq!(result.drop_foreign_keys, vec!["fk_orders_customer"]);
        assert_eq!(result.drop_indexes, vec!["uq_orders_name"]);
        assert!(result.add_columns.is_empty());
        assert!(result.alter_columns.is_empty());
    }

    #[test]
    fn test_alteration_carries_full_desired_spec() {
        let desired_spec = ColumnSpec::of_type(ColumnType::String)
            .length(128)
            .not_null()
            .comment("display");
        let desired = TableShape::new().column("name", desired_spec.clone());
        let actual = TableShape::new().column("name", ColumnSpec::of_type(ColumnType::Text));

        let result = diff(&desired, &actual);
        assert_eq!(result.alter_columns.len(), 1);

        let alter = &result.alter_columns[0];
        assert_eq!(alter.spec, desired_spec);
        assert_eq!(alter.mismatch.property, Property::Type);
        assert_eq!(
            alter.mismatch.actual,
            Some(PropertyValue::Type(ColumnType::Text))
        );
    }

    #[test]
    fn test_missing_property_triggers_alteration() {
        let desired = TableShape::new()
            .column("id", ColumnSpec::of_type(ColumnType::Integer).unsigned());
        let actual = TableShape::new().column("id", ColumnSpec::of_type(ColumnType::Integer));

        let result = diff(&desired, &actual);
        assert_eq!(result.alter_columns[0].mismatch.property, Property::Unsigned);
        assert_eq!(result.alter_columns[0].mismatch.actual, None);
    }

    #[test]
    fn test_extra_property_in_history_is_ignored() {
        let desired = TableShape::new().column("id", ColumnSpec::of_type(ColumnType::Integer));
        let actual = TableShape::new()
            .column("id", ColumnSpec::of_type(ColumnType::Integer).comment("legacy"));

        assert!(diff(&desired, &actual).is_empty());
    }

    #[test]
    fn test_desired_null_matches_absent() {
        let desired = TableShape::new().column(
            "id",
            ColumnSpec::of_type(ColumnType::Integer).with(Property::Comment, PropertyValue::Null),
        );
        let actual = TableShape::new().column("id", ColumnSpec::of_type(ColumnType::Integer));

        assert!(diff(&desired, &actual).is_empty());
    }

    #[test]
    fn test_desired_null_differs_from_value() {
        let desired = TableShape::new().column(
            "id",
            ColumnSpec::of_type(ColumnType::Integer).with(Property::Comment, PropertyValue::Null),
        );
        let actual = TableShape::new()
            .column("id", ColumnSpec::of_type(ColumnType::Integer).comment("old"));

        let result = diff(&desired, &actual);
        assert_eq!(result.alter_columns.len(), 1);
        assert_eq!(result.alter_columns[0].mismatch.property, Property::Comment);
    }

    #[test]
    fn test_value_against_null_history_is_missing() {
        let desired = TableShape::new()
            .column("id", ColumnSpec::of_type(ColumnType::Integer).comment("new"));
        let actual = TableShape::new().column(
            "id",
            ColumnSpec::of_type(ColumnType::Integer).with(Property::Comment, PropertyValue::Null),
        );

        let result = diff(&desired, &actual);
        assert_eq!(
            result.differences(),
            vec![Difference::MissingProperty {
                column: "id".to_string(),
                property: Property::Comment,
                desired: PropertyValue::from("new"),
            }]
        );
    }

    #[test]
    fn test_default_kinds_compared_structurally() {
        let desired = TableShape::new()
            .column("at", ColumnSpec::new().default_expression("NOW()"));
        let actual = TableShape::new().column("at", ColumnSpec::new().default_value("NOW()"));

        assert_eq!(diff(&desired, &actual).alter_columns.len(), 1);
    }

    #[test]
    fn test_foreign_key_only_in_actual_is_dropped_once() {
        let desired = TableShape::new().column("id", ColumnSpec::of_type(ColumnType::Pk));
        let actual = TableShape::new()
            .column("id", ColumnSpec::of_type(ColumnType::Pk))
            .foreign_key("fk_x", ForeignKeySpec::new(["id"], "x", ["id"]));

        let result = diff(&desired, &actual);
        assert_eq!(result.drop_foreign_keys, vec!["fk_x"]);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_foreign_keys_compared_by_name_only() {
        let desired = TableShape::new()
            .foreign_key("fk_x", ForeignKeySpec::new(["a"], "x", ["id"]).on_delete("CASCADE"));
        let actual = TableShape::new().foreign_key("fk_x", ForeignKeySpec::new(["b"], "y", ["id"]));

        assert!(diff(&desired, &actual).is_empty());
    }

    #[test]
    fn test_primary_key_not_diffed() {
        let desired = TableShape::new().primary_key(["id"]);
        let actual = TableShape::new().primary_key(["id", "name"]);

        assert!(diff(&desired, &actual).is_empty());
    }

    #[test]
    fn test_differ_without_actual() {
        let desired = orders();
        let result = ShapeDiffer::new(&desired).diff();

        assert_eq!(result.add_columns.len(), 2);
        assert_eq!(result.add_foreign_keys.len(), 1);
        assert_eq!(result.create_indexes.len(), 1);
        assert_eq!(
            result.summary(),
            "Add 2 columns, Add 1 foreign keys, Create 1 unique indexes"
        );
    }

    #[test]
    fn test_difference_display() {
        let different = Difference::DifferentProperty {
            column: "id".to_string(),
            property: Property::Type,
            desired: PropertyValue::Type(ColumnType::BigInt),
            actual: PropertyValue::Type(ColumnType::Integer),
        };
        assert_eq!(
            different.to_string(),
            "different 'id' column property: type (DB: \"bigint\" <> MIG: \"integer\")"
        );
        assert_eq!(
            Difference::ExcessiveForeignKey("fk".to_string()).to_string(),
            "excessive foreign key 'fk'"
        );
    }
}
