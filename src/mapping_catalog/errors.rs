//! # Mapping Error Types
//!
//! Errors raised while loading, validating and querying the object mapping
//! table.
//!
//! ## Error Categories
//!
//! - **Lookup Errors**: a type or a (type, field) pair has no mapping
//! - **Definition Errors**: a mapping definition references tables, columns
//!   or codecs that do not exist, or breaks the key/join invariants
//! - **Configuration Errors**: file I/O and YAML parsing while loading
//!
//! Lookup errors are configuration or programming errors. They are reported
//! immediately and never retried.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MappingError {
    #[error("No object mapping found for type `{type_name}`")]
    UnknownType { type_name: String },
    #[error("No field mapping found for `{type_name}.{field}`")]
    UnknownField { type_name: String, field: String },
    #[error("Invalid mapping: table '{table}' is not defined")]
    UnknownTable { table: String },
    #[error("Invalid mapping: column '{column}' not found in table '{table}'")]
    UnknownColumn { table: String, column: String },
    #[error("Invalid mapping: table '{table}' is defined more than once")]
    DuplicateTable { table: String },
    #[error("Invalid mapping: type `{type_name}` is mapped more than once")]
    DuplicateObject { type_name: String },
    #[error("Invalid mapping: field `{type_name}.{field}` is mapped more than once")]
    DuplicateField { type_name: String, field: String },
    #[error("Invalid mapping: type `{type_name}` has {count} key fields but is not declared with a composite key")]
    MultipleKeys { type_name: String, count: usize },
    #[error("Invalid join for `{type_name}.{field}`: {message}")]
    InvalidJoin {
        type_name: String,
        field: String,
        message: String,
    },
    #[error("Invalid mapping: columns of type `{type_name}` span tables {tables:?}")]
    MixedTables {
        type_name: String,
        tables: Vec<String>,
    },
    #[error("Field `{type_name}.{field}` is not bound to a column")]
    NotAColumn { type_name: String, field: String },
    #[error("Declared field `{type_name}.{field}` has no mapping")]
    UnmappedField { type_name: String, field: String },
    #[error("Codec '{codec}' for column '{table}.{column}' is not provided by the storage layer")]
    UnknownCodec {
        table: String,
        column: String,
        codec: String,
    },
    #[error("Invalid column reference '{reference}': expected `table.column`")]
    InvalidColumnReference { reference: String },
    #[error("Invalid type expression '{expr}'")]
    InvalidTypeExpression { expr: String },
    #[error("Invalid mapping configuration: {message}")]
    InvalidConfig { message: String },
    #[error("Failed to read mapping definition: {error}")]
    ConfigRead { error: String },
    #[error("Failed to parse mapping definition: {error}")]
    ConfigParse { error: String },
}

impl MappingError {
    pub fn unknown_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        MappingError::UnknownField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    pub fn invalid_join(
        type_name: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MappingError::InvalidJoin {
            type_name: type_name.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a ConfigRead error that names the file and what was being loaded
    ///
    /// # Example
    /// ```ignore
    /// MappingError::config_read_with_context("world.yaml", "No such file", "While loading mappings")
    /// ```
    pub fn config_read_with_context(
        path: impl Into<String>,
        error: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        MappingError::ConfigRead {
            error: format!(
                "'{}': {}\n  Context: {}",
                path.into(),
                error.into(),
                context.into()
            ),
        }
    }
}
