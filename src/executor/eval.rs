//! Three-valued predicate evaluation over physical rows.

use std::{cmp::Ordering, collections::HashMap};

use regex::Regex;

use super::{dataset::Row, errors::ExecutionError, Dataset};
use crate::{
    mapping_catalog::{MappingTable, TypeRef},
    query_planner::predicate::{FieldPath, Predicate},
    value::Literal,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    fn from_bool(b: bool) -> Self {
        if b {
            Truth::True
        } else {
            Truth::False
        }
    }

    fn negate(self) -> Self {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }

    pub fn is_true(self) -> bool {
        self == Truth::True
    }
}

/// Translate a LIKE pattern into an anchored regex.
///
/// `\` escapes the next character, so `100\%` matches the literal `100%`.
/// A trailing lone `\` matches itself.
pub fn like_to_regex(pattern: &str, case_sensitive: bool) -> Result<Regex, ExecutionError> {
    let mut source = String::from(if case_sensitive { "(?s)^" } else { "(?is)^" });
    let mut buf = [0u8; 4];
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            '\\' => {
                let literal = chars.next().unwrap_or('\\');
                source.push_str(&regex::escape(literal.encode_utf8(&mut buf)));
            }
            other => source.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    source.push('$');
    Regex::new(&source).map_err(|source| ExecutionError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// LIKE patterns of one predicate, compiled once per filter.
#[derive(Debug, Default)]
pub struct Patterns(HashMap<(String, bool), Regex>);

impl Patterns {
    pub fn compile(predicate: &Predicate) -> Result<Self, ExecutionError> {
        let mut patterns = Patterns::default();
        patterns.collect(predicate)?;
        Ok(patterns)
    }

    fn collect(&mut self, predicate: &Predicate) -> Result<(), ExecutionError> {
        match predicate {
            Predicate::Like {
                pattern,
                case_sensitive,
                ..
            } => {
                let key = (pattern.clone(), *case_sensitive);
                if !self.0.contains_key(&key) {
                    let regex = like_to_regex(pattern, *case_sensitive)?;
                    self.0.insert(key, regex);
                }
            }
            Predicate::Not(inner) => self.collect(inner)?,
            Predicate::And(operands) | Predicate::Or(operands) => {
                for operand in operands {
                    self.collect(operand)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn is_match(&self, pattern: &str, case_sensitive: bool, text: &str) -> Result<bool, ExecutionError> {
        match self.0.get(&(pattern.to_string(), case_sensitive)) {
            Some(regex) => Ok(regex.is_match(text)),
            None => Ok(like_to_regex(pattern, case_sensitive)?.is_match(text)),
        }
    }
}

/// Reads field values from rows of a mapped type.
#[derive(Debug, Clone, Copy)]
pub struct RowReader<'a> {
    mapping: &'a MappingTable,
    dataset: &'a Dataset,
}

impl<'a> RowReader<'a> {
    pub fn new(mapping: &'a MappingTable, dataset: &'a Dataset) -> Self {
        Self { mapping, dataset }
    }

    /// Value of `path` for `row`. Multi-segment paths follow joins to the
    /// first matching row; a missing row reads as null.
    pub fn read(
        &self,
        owner: &TypeRef,
        row: &'a Row,
        path: &FieldPath,
    ) -> Result<Literal, ExecutionError> {
        let resolved = self.mapping.resolve_path(owner, path.segments())?;
        let mut current = row;
        for join in &resolved.joins {
            let key = match current.get(&join.parent.column) {
                Some(key) if !key.is_null() => key,
                _ => return Ok(Literal::Null),
            };
            let next = self.dataset.rows(&join.child.table).iter().find(|candidate| {
                candidate
                    .get(&join.child.column)
                    .is_some_and(|value| value.compare(key) == Some(Ordering::Equal))
            });
            match next {
                Some(next) => current = next,
                None => return Ok(Literal::Null),
            }
        }
        Ok(current
            .get(&resolved.column.column)
            .cloned()
            .unwrap_or(Literal::Null))
    }

    pub fn evaluate(
        &self,
        owner: &TypeRef,
        row: &'a Row,
        predicate: &Predicate,
        patterns: &Patterns,
    ) -> Result<Truth, ExecutionError> {
        Ok(match predicate {
            Predicate::Eql { path, value } => {
                let left = self.read(owner, row, path)?;
                compare(path, &left, value)?.map_or(Truth::Unknown, |o| {
                    Truth::from_bool(o == Ordering::Equal)
                })
            }
            Predicate::Lt { path, value } => {
                let left = self.read(owner, row, path)?;
                compare(path, &left, value)?
                    .map_or(Truth::Unknown, |o| Truth::from_bool(o == Ordering::Less))
            }
            Predicate::GtEql { path, value } => {
                let left = self.read(owner, row, path)?;
                compare(path, &left, value)?
                    .map_or(Truth::Unknown, |o| Truth::from_bool(o != Ordering::Less))
            }
            Predicate::In { path, values } => {
                let left = self.read(owner, row, path)?;
                let mut saw_unknown = false;
                for value in values {
                    match compare(path, &left, value)? {
                        Some(Ordering::Equal) => return Ok(Truth::True),
                        Some(_) => {}
                        None => saw_unknown = true,
                    }
                }
                if saw_unknown {
                    Truth::Unknown
                } else {
                    Truth::False
                }
            }
            Predicate::Like {
                path,
                pattern,
                case_sensitive,
            } => match self.read(owner, row, path)? {
                Literal::Null => Truth::Unknown,
                Literal::String(text) => {
                    Truth::from_bool(patterns.is_match(pattern, *case_sensitive, &text)?)
                }
                other => {
                    return Err(ExecutionError::TypeMismatch {
                        path: path.to_string(),
                        expected: "String".to_string(),
                        found: other.kind().to_string(),
                    })
                }
            },
            Predicate::IsNull(path) => Truth::from_bool(self.read(owner, row, path)?.is_null()),
            Predicate::Not(inner) => self.evaluate(owner, row, inner, patterns)?.negate(),
            Predicate::And(operands) => {
                let mut result = Truth::True;
                for operand in operands {
                    match self.evaluate(owner, row, operand, patterns)? {
                        Truth::False => return Ok(Truth::False),
                        Truth::Unknown => result = Truth::Unknown,
                        Truth::True => {}
                    }
                }
                result
            }
            Predicate::Or(operands) => {
                let mut result = Truth::False;
                for operand in operands {
                    match self.evaluate(owner, row, operand, patterns)? {
                        Truth::True => return Ok(Truth::True),
                        Truth::Unknown => result = Truth::Unknown,
                        Truth::False => {}
                    }
                }
                result
            }
        })
    }
}

/// `None` when either side is null.
fn compare(
    path: &FieldPath,
    left: &Literal,
    right: &Literal,
) -> Result<Option<Ordering>, ExecutionError> {
    if left.is_null() || right.is_null() {
        return Ok(None);
    }
    left.compare(right)
        .map(Some)
        .ok_or_else(|| ExecutionError::TypeMismatch {
            path: path.to_string(),
            expected: right.kind().to_string(),
            found: left.kind().to_string(),
        })
}
