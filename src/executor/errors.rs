use thiserror::Error;

use crate::mapping_catalog::MappingError;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("`{field}` must resolve to at most one row, found {matches}")]
    AmbiguousKey { field: String, matches: usize },

    #[error("Type `{type_name}` is not backed by a table")]
    UnknownTable { type_name: String },

    #[error("Cannot compare `{path}` ({found}) with {expected}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Invalid LIKE pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unsupported plan node {node} in {context}")]
    UnsupportedPlan { node: String, context: String },

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl ExecutionError {
    pub fn unsupported(node: impl Into<String>, context: impl Into<String>) -> Self {
        ExecutionError::UnsupportedPlan {
            node: node.into(),
            context: context.into(),
        }
    }
}
