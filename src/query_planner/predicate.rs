use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::Literal;

/// Reference to a field, relative to the object type the predicate is
/// evaluated against. Multi-segment paths walk object fields
/// (`country.name` from a city).
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct FieldPath(pub Vec<String>);

impl FieldPath {
    pub fn new(field: impl Into<String>) -> Self {
        FieldPath(vec![field.into()])
    }

    /// Parse a dotted path: `country.name`.
    pub fn parse(dotted: &str) -> Self {
        FieldPath(dotted.split('.').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        FieldPath::parse(value)
    }
}

/// Boolean condition over the fields of the current object.
///
/// Comparisons against null are unknown, and `Filter`/`Unique` keep only
/// rows on which the predicate is true.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Predicate {
    Eql { path: FieldPath, value: Literal },
    Lt { path: FieldPath, value: Literal },
    GtEql { path: FieldPath, value: Literal },
    In { path: FieldPath, values: Vec<Literal> },
    /// SQL `LIKE`: `%` matches any run of characters, `_` one character
    Like {
        path: FieldPath,
        pattern: String,
        case_sensitive: bool,
    },
    IsNull(FieldPath),
    Not(Box<Predicate>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Every field path referenced, in left-to-right order.
    pub fn paths(&self) -> Vec<&FieldPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a FieldPath>) {
        match self {
            Predicate::Eql { path, .. }
            | Predicate::Lt { path, .. }
            | Predicate::GtEql { path, .. }
            | Predicate::In { path, .. }
            | Predicate::Like { path, .. }
            | Predicate::IsNull(path) => out.push(path),
            Predicate::Not(inner) => inner.collect_paths(out),
            Predicate::And(operands) | Predicate::Or(operands) => {
                for operand in operands {
                    operand.collect_paths(out);
                }
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eql { path, value } => write!(f, "{} = {}", path, value),
            Predicate::Lt { path, value } => write!(f, "{} < {}", path, value),
            Predicate::GtEql { path, value } => write!(f, "{} >= {}", path, value),
            Predicate::In { path, values } => {
                write!(f, "{} IN {}", path, Literal::List(values.clone()))
            }
            Predicate::Like {
                path,
                pattern,
                case_sensitive,
            } => {
                let op = if *case_sensitive { "LIKE" } else { "ILIKE" };
                write!(f, "{} {} {}", path, op, Literal::from(pattern.as_str()))
            }
            Predicate::IsNull(path) => write!(f, "{} IS NULL", path),
            Predicate::Not(inner) => write!(f, "NOT ({})", inner),
            Predicate::And(operands) => write_joined(f, operands, " AND "),
            Predicate::Or(operands) => write_joined(f, operands, " OR "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, operands: &[Predicate], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", operand)?;
    }
    f.write_str(")")
}
