//! Predicate Combinators
//!
//! Small constructors for [`Predicate`] trees so the elaboration rules read
//! like the predicates they build.
//!
//! # Example
//! ```ignore
//! use crate::query_planner::combinators::{and, lt, not};
//!
//! let adult_and_old = and(vec![
//!     not(lt("population", 500_000)),
//!     not(lt("indepyear", 1900)),
//! ]);
//! ```

use super::predicate::{FieldPath, Predicate};
use crate::value::Literal;

/// Combine predicates with AND.
///
/// - Empty vec → None
/// - Single predicate → Some(predicate)
/// - Multiple → Some(pred1 AND pred2 AND ...)
pub fn and(predicates: Vec<Predicate>) -> Option<Predicate> {
    combine(predicates, Predicate::And)
}

/// Combine predicates with OR, same shape rules as [`and`].
pub fn or(predicates: Vec<Predicate>) -> Option<Predicate> {
    combine(predicates, Predicate::Or)
}

fn combine(
    predicates: Vec<Predicate>,
    op: fn(Vec<Predicate>) -> Predicate,
) -> Option<Predicate> {
    match predicates.len() {
        0 => None,
        1 => predicates.into_iter().next(),
        _ => Some(op(predicates)),
    }
}

pub fn not(predicate: Predicate) -> Predicate {
    Predicate::Not(Box::new(predicate))
}

pub fn eql(path: impl Into<FieldPath>, value: impl Into<Literal>) -> Predicate {
    Predicate::Eql {
        path: path.into(),
        value: value.into(),
    }
}

pub fn lt(path: impl Into<FieldPath>, value: impl Into<Literal>) -> Predicate {
    Predicate::Lt {
        path: path.into(),
        value: value.into(),
    }
}

pub fn gt_eql(path: impl Into<FieldPath>, value: impl Into<Literal>) -> Predicate {
    Predicate::GtEql {
        path: path.into(),
        value: value.into(),
    }
}

pub fn in_list(path: impl Into<FieldPath>, values: Vec<Literal>) -> Predicate {
    Predicate::In {
        path: path.into(),
        values,
    }
}

pub fn like(path: impl Into<FieldPath>, pattern: impl Into<String>, case_sensitive: bool) -> Predicate {
    Predicate::Like {
        path: path.into(),
        pattern: pattern.into(),
        case_sensitive,
    }
}
