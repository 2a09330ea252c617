//! Selection elaboration.
//!
//! Rewrites a generic top-level selection (operation name, argument
//! bindings, unelaborated child) into the operator subtree its arguments
//! call for. Problems are collected across the whole request and returned
//! together.

pub mod arguments;
pub mod errors;
pub mod operation;

use log::{debug, trace, warn};

use self::{
    arguments::bind_arguments,
    errors::{ArgumentProblem, ElaborationError, ElaborationErrors},
    operation::{Operation, OperationKind},
};
use crate::{
    config::ElaboratorConfig,
    mapping_catalog::{Catalog, FieldMapping, MappingError, MappingTable, TypeRef, TypeRegistry},
    query_planner::operator::{Operator, Select},
    value::Binding,
};

/// Elaborates requests against one mapping table and type registry.
///
/// Holds only shared borrows, so one instance can serve any number of
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct Elaborator<'a> {
    mapping: &'a MappingTable,
    registry: &'a TypeRegistry,
    config: ElaboratorConfig,
}

impl<'a> Elaborator<'a> {
    pub fn new(
        mapping: &'a MappingTable,
        registry: &'a TypeRegistry,
        config: ElaboratorConfig,
    ) -> Self {
        Self {
            mapping,
            registry,
            config,
        }
    }

    pub fn for_catalog(catalog: &'a Catalog, config: ElaboratorConfig) -> Self {
        Self::new(catalog.mapping(), catalog.registry(), config)
    }

    pub fn config(&self) -> &ElaboratorConfig {
        &self.config
    }

    /// Elaborate one top-level operation.
    ///
    /// Returns the rewritten child subtree. Names without a rewrite rule
    /// return `child` untouched.
    pub fn elaborate(
        &self,
        operation: &str,
        bindings: &[Binding],
        child: Operator,
    ) -> Result<Operator, ElaborationErrors> {
        let mut errors = ElaborationErrors::default();
        let plan = self.elaborate_operation(operation, bindings, child, &mut errors);
        self.finish(plan, errors)
    }

    /// Elaborate every top-level selection of a request.
    ///
    /// `root` is a single `Select` or a `Group` of them. Each selection
    /// keeps its name and arguments and gets its child replaced by the
    /// elaborated subtree.
    pub fn elaborate_query(&self, root: Operator) -> Result<Operator, ElaborationErrors> {
        let mut errors = ElaborationErrors::default();
        let plan = match root {
            Operator::Group(selections) => Operator::Group(
                selections
                    .into_iter()
                    .map(|selection| self.elaborate_top_level(selection, &mut errors))
                    .collect(),
            ),
            other => self.elaborate_top_level(other, &mut errors),
        };
        self.finish(plan, errors)
    }

    fn finish(
        &self,
        plan: Operator,
        mut errors: ElaborationErrors,
    ) -> Result<Operator, ElaborationErrors> {
        if errors.is_empty() {
            trace!("Elaborated plan:\n{}", plan);
            return Ok(plan);
        }
        if errors.len() > self.config.max_errors {
            warn!(
                "Dropping {} of {} elaboration errors",
                errors.len() - self.config.max_errors,
                errors.len()
            );
            errors.0.truncate(self.config.max_errors);
        }
        Err(errors)
    }

    fn elaborate_top_level(&self, node: Operator, errors: &mut ElaborationErrors) -> Operator {
        match node {
            Operator::Select(Select { field, args, child }) => {
                let child = self.elaborate_operation(&field, &args, *child, errors);
                Operator::Select(Select {
                    field,
                    args,
                    child: Box::new(child),
                })
            }
            other => other,
        }
    }

    fn elaborate_operation(
        &self,
        operation: &str,
        bindings: &[Binding],
        child: Operator,
        errors: &mut ElaborationErrors,
    ) -> Operator {
        let kind = match operation.parse::<OperationKind>() {
            Ok(kind) => kind,
            Err(_) => {
                debug!("No rewrite rule for `{}`, passing child through", operation);
                return child;
            }
        };

        let query_type = self.registry.query_type();
        let (field_def, target) = match (
            self.registry.field(query_type, operation),
            self.registry.field_target(query_type, operation),
        ) {
            (Some(field_def), Some(target)) => (field_def, target),
            _ => {
                errors.push(ElaborationError::unknown_field(
                    operation,
                    MappingError::unknown_field(query_type.name(), operation),
                ));
                return child;
            }
        };
        if let Err(e) = self.mapping.field_mapping(query_type, operation) {
            errors.push(ElaborationError::unknown_field(operation, e));
            return child;
        }

        let before = errors.len();
        let bound = bind_arguments(operation, &field_def.args, bindings, errors);
        let argument_errors = errors.len() > before;

        let child = self.elaborate_selections(operation, &target, child, errors);
        if argument_errors {
            return child;
        }

        let op = match Operation::decode(kind, &bound) {
            Ok(op) => op,
            Err(e) => {
                errors.push(e);
                return child;
            }
        };

        debug!("Elaborating `{}` over `{}`", kind, target);
        let plan = op.rewrite(child, &self.config);
        for path in plan.wrapper_paths() {
            if let Err(e) = self.mapping.resolve_path(&target, path.segments()) {
                errors.push(ElaborationError::unknown_field(operation, e));
            }
        }
        plan
    }

    /// Check the sub-selections of `owner` against the mapping and put an
    /// explicit `Join` under every object field.
    fn elaborate_selections(
        &self,
        operation: &str,
        owner: &TypeRef,
        node: Operator,
        errors: &mut ElaborationErrors,
    ) -> Operator {
        match node {
            Operator::Group(items) => Operator::Group(
                items
                    .into_iter()
                    .map(|item| self.elaborate_selections(operation, owner, item, errors))
                    .collect(),
            ),
            Operator::Select(select) => self.elaborate_field(operation, owner, select, errors),
            other => other,
        }
    }

    fn elaborate_field(
        &self,
        operation: &str,
        owner: &TypeRef,
        select: Select,
        errors: &mut ElaborationErrors,
    ) -> Operator {
        let Select { field, args, child } = select;

        let mapping = match self.mapping.field_mapping(owner, &field) {
            Ok(mapping) if !mapping.is_hidden() => mapping,
            Ok(_) => {
                errors.push(ElaborationError::unknown_field(
                    operation,
                    MappingError::unknown_field(owner.name(), &field),
                ));
                return Operator::Select(Select { field, args, child });
            }
            Err(e) => {
                errors.push(ElaborationError::unknown_field(operation, e));
                return Operator::Select(Select { field, args, child });
            }
        };

        match self.registry.field(owner, &field) {
            Some(field_def) => {
                bind_arguments(operation, &field_def.args, &args, errors);
            }
            None => {
                for binding in &args {
                    errors.push(ElaborationError::mismatch(
                        operation,
                        &binding.name,
                        ArgumentProblem::Unexpected,
                    ));
                }
            }
        }

        let child = match mapping {
            FieldMapping::ObjectField { join, .. } => match self.mapping.target_of(owner, &field) {
                Some(target) => self
                    .elaborate_selections(operation, target, *child, errors)
                    .join(join.clone()),
                None => {
                    errors.push(ElaborationError::unknown_field(
                        operation,
                        MappingError::unknown_field(owner.name(), &field),
                    ));
                    *child
                }
            },
            _ => *child,
        };

        Operator::Select(Select {
            field,
            args,
            child: Box::new(child),
        })
    }
}
