//! Error types for the shape model and configuration.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while loading configuration or building shapes.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(retrace::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(retrace::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },

    /// Missing or invalid setup.
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(retrace::schema::invalid_config),
        help("set `table` in the [updater] section of retrace.toml")
    )]
    InvalidConfig { message: String },

    /// Dialect name that has no primary-key strategy.
    #[error("unknown database dialect `{name}`")]
    #[diagnostic(code(retrace::schema::unknown_dialect))]
    UnknownDialect { name: String },
}

impl SchemaError {
    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an unknown dialect error.
    pub fn unknown_dialect(name: impl Into<String>) -> Self {
        Self::UnknownDialect { name: name.into() }
    }
}
