//! Error types for the update engine.

use retrace_schema::SchemaError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that abort an update run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Invalid or missing setup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A migration from history could not be resolved to its operations.
    #[error("Failed to load migration '{id}': {reason}")]
    MigrationLoad {
        /// Migration identifier.
        id: String,
        /// Why loading failed.
        reason: String,
    },

    /// The history store failed.
    #[error("History error: {0}")]
    History(String),

    /// Configuration or shape model error.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl MigrationError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a migration load error.
    pub fn migration_load(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MigrationLoad {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a history error.
    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }

    /// Check if the error means the setup itself is wrong, as opposed to
    /// missing or unreadable history.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Schema(SchemaError::InvalidConfig { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MigrationError::migration_load("m240101_120000_orders", "file not found");
        let msg = err.to_string();
        assert!(msg.contains("m240101_120000_orders"));
        assert!(msg.contains("file not found"));
    }

    #[test]
    fn test_is_configuration() {
        assert!(MigrationError::configuration("no table").is_configuration());
        assert!(
            MigrationError::from(SchemaError::invalid_config("no table")).is_configuration()
        );
        assert!(!MigrationError::history("gone").is_configuration());
    }
}
