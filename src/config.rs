use serde::{Deserialize, Serialize};
use std::{env, fmt, str::FromStr};
use thiserror::Error;
use validator::Validate;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// How a "greater or equal" lower bound is written into a predicate.
///
/// Both forms exclude rows whose column is null: the comparison is unknown
/// either way and filters keep only rows on which the predicate is true.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangePredicate {
    /// `NOT (column < bound)`
    #[default]
    NegatedLessThan,
    /// `column >= bound`
    GreaterOrEqual,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown range predicate `{0}` (expected negated_less_than or greater_or_equal)")]
pub struct ParseRangePredicateError(pub String);

impl FromStr for RangePredicate {
    type Err = ParseRangePredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "negated_less_than" => Ok(RangePredicate::NegatedLessThan),
            "greater_or_equal" => Ok(RangePredicate::GreaterOrEqual),
            _ => Err(ParseRangePredicateError(s.to_string())),
        }
    }
}

impl fmt::Display for RangePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangePredicate::NegatedLessThan => f.write_str("negated_less_than"),
            RangePredicate::GreaterOrEqual => f.write_str("greater_or_equal"),
        }
    }
}

/// Elaboration policy with validation
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct ElaboratorConfig {
    /// Whether `cities` name patterns match case-sensitively
    pub case_sensitive_patterns: bool,

    /// Predicate form used by range queries
    pub range_predicate: RangePredicate,

    /// Maximum number of errors reported for one request (1-256)
    #[validate(range(
        min = 1,
        max = 256,
        message = "Max errors must be between 1 and 256"
    ))]
    pub max_errors: usize,
}

impl Default for ElaboratorConfig {
    fn default() -> Self {
        Self {
            case_sensitive_patterns: true,
            range_predicate: RangePredicate::NegatedLessThan,
            max_errors: 32,
        }
    }
}

impl ElaboratorConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            case_sensitive_patterns: parse_env_var("QUERYMAP_CASE_SENSITIVE_PATTERNS", "true")?,
            range_predicate: parse_env_var("QUERYMAP_RANGE_PREDICATE", "negated_less_than")?,
            max_errors: parse_env_var("QUERYMAP_MAX_ERRORS", "32")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
