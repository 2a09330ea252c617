use thiserror::Error;

use crate::mapping_catalog::MappingError;

/// What is wrong with one argument of one operation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ArgumentProblem {
    #[error("argument is not declared")]
    Unexpected,
    #[error("argument is supplied more than once")]
    Duplicate,
    #[error("required argument is missing")]
    Missing,
    #[error("expected {expected}, found {found}")]
    WrongKind { expected: String, found: String },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ElaborationError {
    #[error("Invalid argument `{argument}` for `{operation}`: {problem}")]
    ArgumentShapeMismatch {
        operation: String,
        argument: String,
        problem: ArgumentProblem,
    },
    #[error("Cannot elaborate `{operation}`: {source}")]
    UnknownField {
        operation: String,
        #[source]
        source: MappingError,
    },
}

impl ElaborationError {
    pub fn mismatch(
        operation: impl Into<String>,
        argument: impl Into<String>,
        problem: ArgumentProblem,
    ) -> Self {
        ElaborationError::ArgumentShapeMismatch {
            operation: operation.into(),
            argument: argument.into(),
            problem,
        }
    }

    pub fn unknown_field(operation: impl Into<String>, source: MappingError) -> Self {
        ElaborationError::UnknownField {
            operation: operation.into(),
            source,
        }
    }

    /// Operation the error was raised for.
    pub fn operation(&self) -> &str {
        match self {
            ElaborationError::ArgumentShapeMismatch { operation, .. }
            | ElaborationError::UnknownField { operation, .. } => operation,
        }
    }
}

/// Every elaboration problem found in one request.
#[derive(Debug, Clone, Error, PartialEq, Default)]
#[error("{}", render(.0))]
pub struct ElaborationErrors(pub Vec<ElaborationError>);

impl ElaborationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElaborationError> {
        self.0.iter()
    }

    pub fn push(&mut self, error: ElaborationError) {
        self.0.push(error);
    }
}

fn render(errors: &[ElaborationError]) -> String {
    match errors {
        [] => "no elaboration errors".to_string(),
        [single] => single.to_string(),
        many => {
            let lines: Vec<String> = many.iter().map(|error| format!("  - {}", error)).collect();
            format!("{} elaboration errors:\n{}", many.len(), lines.join("\n"))
        }
    }
}
