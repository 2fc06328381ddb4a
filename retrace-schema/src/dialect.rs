//! Database dialects and their primary-key marker strategies.
//!
//! Columns reconstructed from raw DDL may carry the primary key inside
//! their trailing SQL (`append`), spelled differently per database. Each
//! dialect family maps to one pure strategy that detects the marker and
//! strips it from the fragment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Supported database dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL / MariaDB.
    #[default]
    MySql,
    /// CUBRID.
    Cubrid,
    /// PostgreSQL.
    #[serde(alias = "postgres", alias = "pgsql")]
    PostgreSql,
    /// Oracle.
    #[serde(alias = "oci")]
    Oracle,
    /// SQLite.
    #[serde(alias = "sqlite3")]
    Sqlite,
    /// Microsoft SQL Server.
    #[serde(alias = "sqlsrv")]
    MsSql,
}

/// Outcome of looking for a primary-key marker in trailing SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeyMarker {
    /// Whether the fragment declared a primary key.
    pub is_primary_key: bool,
    /// What is left of the fragment (`None` when blank).
    pub remainder: Option<String>,
}

type MarkerStrategy = fn(&str) -> PrimaryKeyMarker;

impl Dialect {
    /// Get the dialect name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Cubrid => "cubrid",
            Self::PostgreSql => "postgresql",
            Self::Oracle => "oracle",
            Self::Sqlite => "sqlite",
            Self::MsSql => "mssql",
        }
    }

    fn primary_key_strategy(self) -> MarkerStrategy {
        match self {
            Self::MsSql => mssql_marker,
            Self::PostgreSql | Self::Oracle => postgres_marker,
            Self::Sqlite => sqlite_marker,
            Self::MySql | Self::Cubrid => mysql_marker,
        }
    }

    /// Detect and strip this dialect's primary-key marker.
    pub fn primary_key_marker(&self, append: &str) -> PrimaryKeyMarker {
        (self.primary_key_strategy())(append)
    }

    /// Whether NOT NULL must still be emitted for a primary-key column.
    ///
    /// SQL Server does not imply NOT NULL for identity keys.
    pub fn primary_key_needs_not_null(&self) -> bool {
        matches!(self, Self::MsSql)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Self::MySql),
            "cubrid" => Ok(Self::Cubrid),
            "postgresql" | "postgres" | "pgsql" => Ok(Self::PostgreSql),
            "oracle" | "oci" => Ok(Self::Oracle),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "mssql" | "sqlsrv" => Ok(Self::MsSql),
            _ => Err(SchemaError::unknown_dialect(s)),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_uppercase().contains(needle)
}

fn unmarked(append: &str) -> PrimaryKeyMarker {
    PrimaryKeyMarker {
        is_primary_key: false,
        remainder: (!append.trim().is_empty()).then(|| append.to_string()),
    }
}

fn strip_markers(append: &str, markers: &[&str]) -> PrimaryKeyMarker {
    let mut upper = append.to_ascii_uppercase();
    for marker in markers {
        upper = upper.replace(marker, "");
    }
    let collapsed = upper.split_whitespace().collect::<Vec<_>>().join(" ");

    PrimaryKeyMarker {
        is_primary_key: true,
        remainder: (!collapsed.is_empty()).then_some(collapsed),
    }
}

fn mssql_marker(append: &str) -> PrimaryKeyMarker {
    if contains_ignore_case(append, "IDENTITY") && contains_ignore_case(append, "PRIMARY KEY") {
        strip_markers(append, &["PRIMARY KEY", "IDENTITY"])
    } else {
        unmarked(append)
    }
}

fn postgres_marker(append: &str) -> PrimaryKeyMarker {
    if contains_ignore_case(append, "PRIMARY KEY") {
        strip_markers(append, &["PRIMARY KEY"])
    } else {
        unmarked(append)
    }
}

fn sqlite_marker(append: &str) -> PrimaryKeyMarker {
    if contains_ignore_case(append, "PRIMARY KEY") {
        strip_markers(append, &["PRIMARY KEY", "AUTOINCREMENT"])
    } else {
        unmarked(append)
    }
}

fn mysql_marker(append: &str) -> PrimaryKeyMarker {
    if contains_ignore_case(append, "PRIMARY KEY") {
        strip_markers(append, &["PRIMARY KEY", "AUTO_INCREMENT"])
    } else {
        unmarked(append)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_strips_auto_increment() {
        let marker = Dialect::MySql.primary_key_marker("AUTO_INCREMENT PRIMARY KEY");
        assert!(marker.is_primary_key);
        assert_eq!(marker.remainder, None);
    }

    #[test]
    fn test_mysql_keeps_other_sql() {
        let marker = Dialect::MySql.primary_key_marker("primary key  auto_increment COMMENT 'x'");
        assert!(marker.is_primary_key);
        assert_eq!(marker.remainder.as_deref(), Some("COMMENT 'X'"));
    }

    #[test]
    fn test_mssql_requires_identity() {
        let marker = Dialect::MsSql.primary_key_marker("PRIMARY KEY");
        assert!(!marker.is_primary_key);
        assert_eq!(marker.remainder.as_deref(), Some("PRIMARY KEY"));

        let marker = Dialect::MsSql.primary_key_marker("IDENTITY PRIMARY KEY");
        assert!(marker.is_primary_key);
        assert_eq!(marker.remainder, None);
    }

    #[test]
    fn test_sqlite_strips_autoincrement() {
        let marker = Dialect::Sqlite.primary_key_marker("PRIMARY KEY AUTOINCREMENT NOT NULL");
        assert!(marker.is_primary_key);
        assert_eq!(marker.remainder.as_deref(), Some("NOT NULL"));
    }

    #[test]
    fn test_postgres_leaves_auto_increment() {
        let marker = Dialect::PostgreSql.primary_key_marker("PRIMARY KEY AUTO_INCREMENT");
        assert!(marker.is_primary_key);
        assert_eq!(marker.remainder.as_deref(), Some("AUTO_INCREMENT"));
    }

    #[test]
    fn test_no_marker() {
        let marker = Dialect::Oracle.primary_key_marker("");
        assert_eq!(
            marker,
            PrimaryKeyMarker {
                is_primary_key: false,
                remainder: None
            }
        );
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("pgsql".parse::<Dialect>().unwrap(), Dialect::PostgreSql);
        assert_eq!("SQLSRV".parse::<Dialect>().unwrap(), Dialect::MsSql);
        assert!("db2".parse::<Dialect>().is_err());
    }
}
