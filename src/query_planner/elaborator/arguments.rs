//! Matching supplied bindings against a declared argument signature.
//!
//! Binding happens in two steps. [`bind_arguments`] checks the whole
//! request against the signature, fills declared defaults and records every
//! problem it finds. The typed getters on [`BoundArguments`] then destructure
//! the values into an operation's argument record.

use std::collections::{HashMap, HashSet};

use log::trace;

use super::errors::{ArgumentProblem, ElaborationError, ElaborationErrors};
use crate::{
    mapping_catalog::{type_registry::ArgumentDef, TypeExpr},
    value::{Binding, Literal},
};

/// Argument values after defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArguments {
    operation: String,
    values: HashMap<String, Literal>,
}

pub fn bind_arguments(
    operation: &str,
    signature: &[ArgumentDef],
    supplied: &[Binding],
    errors: &mut ElaborationErrors,
) -> BoundArguments {
    let mut values = HashMap::new();
    let mut seen = HashSet::new();

    for binding in supplied {
        if !seen.insert(binding.name.as_str()) {
            errors.push(ElaborationError::mismatch(
                operation,
                &binding.name,
                ArgumentProblem::Duplicate,
            ));
            continue;
        }
        let Some(def) = signature.iter().find(|d| d.name == binding.name) else {
            errors.push(ElaborationError::mismatch(
                operation,
                &binding.name,
                ArgumentProblem::Unexpected,
            ));
            continue;
        };
        if binding.value.is_null() {
            if def.is_required() {
                errors.push(ElaborationError::mismatch(
                    operation,
                    &def.name,
                    ArgumentProblem::Missing,
                ));
                continue;
            }
        } else if !conforms(&binding.value, &def.ty) {
            errors.push(ElaborationError::mismatch(
                operation,
                &def.name,
                ArgumentProblem::WrongKind {
                    expected: def.ty.to_string(),
                    found: binding.value.kind().to_string(),
                },
            ));
            continue;
        }
        values.insert(def.name.clone(), binding.value.clone());
    }

    for def in signature {
        if seen.contains(def.name.as_str()) {
            continue;
        }
        match &def.default {
            Some(default) => {
                trace!("`{}`: defaulting `{}` to {}", operation, def.name, default);
                values.insert(def.name.clone(), default.clone());
            }
            None if def.is_required() => errors.push(ElaborationError::mismatch(
                operation,
                &def.name,
                ArgumentProblem::Missing,
            )),
            None => {
                values.insert(def.name.clone(), Literal::Null);
            }
        }
    }

    BoundArguments {
        operation: operation.to_string(),
        values,
    }
}

/// Does a non-null value fit the declared type?
fn conforms(value: &Literal, ty: &TypeExpr) -> bool {
    match (ty.nullable_inner(), value) {
        (_, Literal::Null) => ty.is_nullable(),
        (TypeExpr::List(item), Literal::List(items)) => {
            items.iter().all(|element| conforms(element, item))
        }
        (TypeExpr::Named(name), value) => matches!(
            (name.as_str(), value),
            ("Int", Literal::Int(_))
                | ("Float", Literal::Int(_) | Literal::Float(_))
                | ("String", Literal::String(_))
                | ("Boolean", Literal::Boolean(_))
                | ("ID", Literal::String(_) | Literal::Int(_))
        ),
        _ => false,
    }
}

impl BoundArguments {
    fn get(&self, name: &str) -> &Literal {
        self.values.get(name).unwrap_or(&Literal::Null)
    }

    fn wrong_kind(&self, name: &str, expected: &str, found: &Literal) -> ElaborationError {
        ElaborationError::mismatch(
            &self.operation,
            name,
            ArgumentProblem::WrongKind {
                expected: expected.to_string(),
                found: found.kind().to_string(),
            },
        )
    }

    fn missing(&self, name: &str) -> ElaborationError {
        ElaborationError::mismatch(&self.operation, name, ArgumentProblem::Missing)
    }

    pub fn int(&self, name: &str) -> Result<i64, ElaborationError> {
        match self.get(name) {
            Literal::Null => Err(self.missing(name)),
            other => other
                .as_i64()
                .ok_or_else(|| self.wrong_kind(name, "Int", other)),
        }
    }

    pub fn string(&self, name: &str) -> Result<String, ElaborationError> {
        match self.get(name) {
            Literal::Null => Err(self.missing(name)),
            other => other
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| self.wrong_kind(name, "String", other)),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ElaborationError> {
        match self.get(name) {
            Literal::Null => Err(self.missing(name)),
            other => other
                .as_bool()
                .ok_or_else(|| self.wrong_kind(name, "Boolean", other)),
        }
    }

    /// `None` when the argument is absent or null.
    pub fn optional_string_list(&self, name: &str) -> Result<Option<Vec<String>>, ElaborationError> {
        match self.get(name) {
            Literal::Null => Ok(None),
            Literal::List(items) => items
                .iter()
                .map(|item| match item {
                    Literal::String(s) => Ok(s.clone()),
                    other => Err(self.wrong_kind(name, "[String!]", other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            other => Err(self.wrong_kind(name, "[String!]", other)),
        }
    }
}
