//! Configuration file parsing for `retrace.toml`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dialect::Dialect;
use crate::error::{SchemaError, SchemaResult};

/// Identifier of the bootstrap entry every history table starts with.
pub const DEFAULT_BASE_MIGRATION: &str = "m000000_000000_base";

/// Main configuration structure for `retrace.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetraceConfig {
    /// Update generation settings.
    #[serde(default)]
    pub updater: UpdaterConfig,
}

impl RetraceConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content);

        toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })
    }
}

/// Settings for reconstructing and diffing one table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdaterConfig {
    /// Table to synchronize.
    #[serde(default)]
    pub table: String,

    /// Directory holding migration operation files.
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,

    /// History entry that is never replayed.
    ///
    /// An empty string in `retrace.toml` replays every entry.
    #[serde(
        default = "default_base_migration",
        deserialize_with = "deserialize_base_migration",
        serialize_with = "serialize_base_migration"
    )]
    pub base_migration: Option<String>,

    /// Database dialect of the target.
    #[serde(default)]
    pub dialect: Dialect,

    /// Normalize dialect-specific primary-key markers on emitted columns.
    #[serde(default = "default_general_schema")]
    pub general_schema: bool,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            table: String::new(),
            migrations_dir: default_migrations_dir(),
            base_migration: default_base_migration(),
            dialect: Dialect::default(),
            general_schema: default_general_schema(),
        }
    }
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("./migrations")
}

fn default_base_migration() -> Option<String> {
    Some(DEFAULT_BASE_MIGRATION.to_string())
}

fn deserialize_base_migration<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = String::deserialize(deserializer)?;
    Ok((!id.trim().is_empty()).then_some(id))
}

fn serialize_base_migration<S>(id: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(id.as_deref().unwrap_or_default())
}

fn default_general_schema() -> bool {
    true
}

impl UpdaterConfig {
    /// Create a configuration for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Set the migrations directory.
    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = dir.into();
        self
    }

    /// Set the base migration identifier (`None` keeps every entry).
    pub fn base_migration(mut self, id: Option<String>) -> Self {
        self.base_migration = id;
        self
    }

    /// Set the database dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Enable or disable primary-key marker normalization.
    pub fn general_schema(mut self, enabled: bool) -> Self {
        self.general_schema = enabled;
        self
    }

    /// Check the settings required before any history is read.
    pub fn validate(&self) -> SchemaResult<()> {
        if self.table.trim().is_empty() {
            return Err(SchemaError::invalid_config("no table name given"));
        }
        Ok(())
    }
}

static ENV_VAR: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid")
});

/// Expand environment variables in the format `${VAR_NAME}`.
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    for cap in ENV_VAR.captures_iter(content) {
        let var_name = &cap[1];
        let full_match = &cap[0];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetraceConfig::default();
        assert_eq!(config.updater.dialect, Dialect::MySql);
        assert_eq!(
            config.updater.base_migration.as_deref(),
            Some(DEFAULT_BASE_MIGRATION)
        );
        assert!(config.updater.general_schema);
    }

    #[test]
    fn test_parse_updater_section() {
        let config = RetraceConfig::from_str(
            r#"
            [updater]
            table = "orders"
            migrations_dir = "db/migrations"
            dialect = "postgres"
            general_schema = false
            "#,
        )
        .unwrap();

        assert_eq!(config.updater.table, "orders");
        assert_eq!(config.updater.migrations_dir, PathBuf::from("db/migrations"));
        assert_eq!(config.updater.dialect, Dialect::PostgreSql);
        assert!(!config.updater.general_schema);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = RetraceConfig::from_str(
            r#"
            [updater]
            tabel = "orders"
            "#,
        );
        assert!(matches!(result, Err(SchemaError::TomlError { .. })));
    }

    #[test]
    fn test_validate_requires_table() {
        assert!(UpdaterConfig::default().validate().is_err());
        assert!(UpdaterConfig::new("   ").validate().is_err());
        assert!(UpdaterConfig::new("orders").validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = UpdaterConfig::new("orders")
            .dialect(Dialect::Sqlite)
            .general_schema(false)
            .base_migration(None)
            .migrations_dir("./m");

        assert_eq!(config.dialect, Dialect::Sqlite);
        assert!(config.base_migration.is_none());
        assert_eq!(config.migrations_dir, PathBuf::from("./m"));
    }

    #[test]
    fn test_empty_base_migration_disables_exclusion() {
        let config = RetraceConfig::from_str(
            r#"
            [updater]
            table = "orders"
            base_migration = ""
            "#,
        )
        .unwrap();
        assert!(config.updater.base_migration.is_none());

        let config = RetraceConfig::from_str(
            r#"
            [updater]
            table = "orders"
            base_migration = "m000000_000000_init"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.updater.base_migration.as_deref(),
            Some("m000000_000000_init")
        );
    }

    #[test]
    fn test_base_migration_round_trips_through_toml() {
        let config = UpdaterConfig::new("orders").base_migration(None);
        let rendered = toml::to_string(&RetraceConfig { updater: config }).unwrap();
        let parsed = RetraceConfig::from_str(&rendered).unwrap();
        assert!(parsed.updater.base_migration.is_none());
    }

    #[test]
    fn test_expand_env_vars_leaves_unknown() {
        let expanded = expand_env_vars("table = \"${RETRACE_SURELY_UNSET_VAR}\"");
        assert_eq!(expanded, "table = \"${RETRACE_SURELY_UNSET_VAR}\"");
    }
}
