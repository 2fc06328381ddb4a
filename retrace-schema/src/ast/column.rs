//! Column types and column property specifications.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Logical column types understood by the migration-authoring convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Auto-incrementing integer primary key.
    Pk,
    /// Unsigned auto-incrementing integer primary key.
    Upk,
    /// Auto-incrementing big integer primary key.
    BigPk,
    /// Unsigned auto-incrementing big integer primary key.
    UBigPk,
    /// Fixed-length character string.
    Char,
    /// Variable-length character string.
    String,
    /// Long text.
    Text,
    /// Tiny integer.
    TinyInt,
    /// Small integer.
    SmallInt,
    /// Integer.
    Integer,
    /// Big integer.
    BigInt,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Exact decimal.
    Decimal,
    /// Date and time.
    DateTime,
    /// Timestamp.
    Timestamp,
    /// Time of day.
    Time,
    /// Calendar date.
    Date,
    /// Binary data.
    Binary,
    /// Boolean.
    Boolean,
    /// Money amount.
    Money,
    /// JSON document.
    Json,
}

impl ColumnType {
    /// Get the type name as written in migrations.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pk => "pk",
            Self::Upk => "upk",
            Self::BigPk => "bigpk",
            Self::UBigPk => "ubigpk",
            Self::Char => "char",
            Self::String => "string",
            Self::Text => "text",
            Self::TinyInt => "tinyint",
            Self::SmallInt => "smallint",
            Self::Integer => "integer",
            Self::BigInt => "bigint",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Time => "time",
            Self::Date => "date",
            Self::Binary => "binary",
            Self::Boolean => "boolean",
            Self::Money => "money",
            Self::Json => "json",
        }
    }

    /// Whether the type itself declares a primary key.
    pub fn is_primary_key(&self) -> bool {
        matches!(self, Self::Pk | Self::Upk | Self::BigPk | Self::UBigPk)
    }

    /// The primary-key type a plain integer column turns into when its
    /// trailing SQL carries a primary-key marker.
    pub fn primary_key_variant(&self) -> Option<ColumnType> {
        match self {
            Self::Integer => Some(Self::Pk),
            Self::BigInt => Some(Self::BigPk),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized column property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    /// Logical column type.
    Type,
    /// Length, size or precision.
    Length,
    /// NOT NULL flag.
    NotNull,
    /// UNSIGNED flag.
    Unsigned,
    /// Default value, literal or expression.
    Default,
    /// Column comment.
    Comment,
    /// Raw trailing SQL fragment.
    Append,
    /// Database-specific primary-key marker.
    PrimaryKey,
}

impl Property {
    /// Get the property name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Length => "length",
            Self::NotNull => "not_null",
            Self::Unsigned => "unsigned",
            Self::Default => "default",
            Self::Comment => "comment",
            Self::Append => "append",
            Self::PrimaryKey => "primary_key",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value held by a column property.
///
/// `Null` is a present-but-empty value and is distinct from an absent
/// property: a desired `comment = NULL` still differs from an existing
/// comment, while an absent desired property is never compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    /// Explicit null.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Integer literal.
    Integer(i64),
    /// String literal.
    Text(String),
    /// Column type.
    Type(ColumnType),
    /// Raw SQL expression (e.g. `CURRENT_TIMESTAMP`).
    Expression(String),
}

impl PropertyValue {
    /// Create a raw SQL expression value.
    pub fn expression(sql: impl Into<String>) -> Self {
        Self::Expression(sql.into())
    }

    /// Check whether this is an explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the string payload of a text or expression value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Expression(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
            Self::Integer(i) => write!(f, "\"{}\"", i),
            Self::Text(s) | Self::Expression(s) => write!(f, "\"{}\"", s),
            Self::Type(t) => write!(f, "\"{}\"", t),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ColumnType> for PropertyValue {
    fn from(value: ColumnType) -> Self {
        Self::Type(value)
    }
}

/// The property map describing one column.
///
/// Properties keep their insertion order, which is also the order the
/// differ walks them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSpec {
    properties: IndexMap<Property, PropertyValue>,
}

impl ColumnSpec {
    /// Create an empty column spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a spec holding only a column type.
    pub fn of_type(column_type: ColumnType) -> Self {
        Self::new().with(Property::Type, column_type)
    }

    /// Set a property, builder style.
    pub fn with(mut self, property: Property, value: impl Into<PropertyValue>) -> Self {
        self.set(property, value);
        self
    }

    /// Set the length/size.
    pub fn length(self, length: impl Into<PropertyValue>) -> Self {
        self.with(Property::Length, length)
    }

    /// Mark the column NOT NULL.
    pub fn not_null(self) -> Self {
        self.with(Property::NotNull, true)
    }

    /// Mark the column UNSIGNED.
    pub fn unsigned(self) -> Self {
        self.with(Property::Unsigned, true)
    }

    /// Set a literal default value.
    pub fn default_value(self, value: impl Into<PropertyValue>) -> Self {
        self.with(Property::Default, value)
    }

    /// Set a raw SQL default expression.
    pub fn default_expression(self, sql: impl Into<String>) -> Self {
        self.with(Property::Default, PropertyValue::expression(sql))
    }

    /// Set the column comment.
    pub fn comment(self, comment: impl Into<String>) -> Self {
        self.with(Property::Comment, comment.into())
    }

    /// Set the trailing SQL fragment.
    pub fn append(self, sql: impl Into<String>) -> Self {
        self.with(Property::Append, sql.into())
    }

    /// Mark the column as carrying the primary key.
    pub fn primary_key(self) -> Self {
        self.with(Property::PrimaryKey, true)
    }

    /// Set a property, returning the previous value.
    pub fn set(
        &mut self,
        property: Property,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.properties.insert(property, value.into())
    }

    /// Remove a property, preserving the order of the rest.
    pub fn remove(&mut self, property: Property) -> Option<PropertyValue> {
        self.properties.shift_remove(&property)
    }

    /// Get a property value.
    pub fn get(&self, property: Property) -> Option<&PropertyValue> {
        self.properties.get(&property)
    }

    /// Check whether a property is present (null counts as present).
    pub fn contains(&self, property: Property) -> bool {
        self.properties.contains_key(&property)
    }

    /// Get the column type, if set.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self.get(Property::Type) {
            Some(PropertyValue::Type(t)) => Some(*t),
            _ => None,
        }
    }

    /// Get the trailing SQL fragment, if set and non-null.
    pub fn append_sql(&self) -> Option<&str> {
        self.get(Property::Append).and_then(PropertyValue::as_str)
    }

    /// Iterate over properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Property, &PropertyValue)> {
        self.properties.iter().map(|(p, v)| (*p, v))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if the spec carries no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
