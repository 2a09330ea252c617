//! Reference executor.
//!
//! Evaluates elaborated plans against in-memory rows. Rows of a type that
//! share key values form one entity; the fields of an entity are read from
//! its first row, and its object fields join from all of its rows.

pub mod dataset;
pub mod errors;
pub mod eval;

use std::cmp::Ordering;

use log::{debug, trace};

pub use dataset::{Dataset, Row};
pub use errors::ExecutionError;
use eval::{Patterns, RowReader};

use crate::{
    mapping_catalog::{Catalog, FieldMapping, MappingError, MappingTable, TypeRef, TypeRegistry},
    query_planner::{
        operator::{Operator, OrderItem, Select, SortDirection},
        predicate::Predicate,
    },
    value::Literal,
};

/// Result of executing a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Scalar(Literal),
    /// Selected fields in selection order
    Object(Vec<(String, Value)>),
    List(Vec<Value>),
}

impl Value {
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.iter().find(|(name, _)| name == field).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Scalar(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Scalar(literal) => serde_json::to_value(literal).unwrap_or_default(),
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect(),
            ),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

/// Rows of one logical object, grouped by its key.
#[derive(Debug, Clone)]
struct Entity<'a> {
    rows: Vec<&'a Row>,
}

impl<'a> Entity<'a> {
    fn first(&self) -> Option<&'a Row> {
        self.rows.first().copied()
    }
}

/// Entities left after the wrapping operators, with the selection set to
/// project them through. `unique` marks a single-value result.
struct Shaped<'a, 'n> {
    entities: Vec<Entity<'a>>,
    selection: &'n Operator,
    unique: bool,
}

pub struct Executor<'a> {
    mapping: &'a MappingTable,
    registry: &'a TypeRegistry,
    dataset: &'a Dataset,
}

impl<'a> Executor<'a> {
    pub fn new(mapping: &'a MappingTable, registry: &'a TypeRegistry, dataset: &'a Dataset) -> Self {
        Self {
            mapping,
            registry,
            dataset,
        }
    }

    pub fn for_catalog(catalog: &'a Catalog, dataset: &'a Dataset) -> Self {
        Self::new(catalog.mapping(), catalog.registry(), dataset)
    }

    fn reader(&self) -> RowReader<'a> {
        RowReader::new(self.mapping, self.dataset)
    }

    /// Execute an elaborated request: a top-level `Select` or a `Group` of
    /// them. Returns an object keyed by the selected operation names.
    pub fn execute(&self, plan: &Operator) -> Result<Value, ExecutionError> {
        let selections: Vec<&Select> = match plan {
            Operator::Select(select) => vec![select],
            Operator::Group(items) => items
                .iter()
                .map(|item| match item {
                    Operator::Select(select) => Ok(select),
                    other => Err(ExecutionError::unsupported(
                        node_name(other),
                        "top-level group",
                    )),
                })
                .collect::<Result<_, _>>()?,
            Operator::Empty => vec![],
            other => {
                return Err(ExecutionError::unsupported(
                    node_name(other),
                    "request root",
                ))
            }
        };

        let mut fields = Vec::with_capacity(selections.len());
        for select in selections {
            let value = self.execute_root(select)?;
            fields.push((select.field.clone(), value));
        }
        Ok(Value::Object(fields))
    }

    fn execute_root(&self, select: &Select) -> Result<Value, ExecutionError> {
        let query_type = self.registry.query_type();
        let field_def = self.registry.field(query_type, &select.field).ok_or_else(|| {
            MappingError::unknown_field(query_type.name(), &select.field)
        })?;
        let target = self
            .registry
            .field_target(query_type, &select.field)
            .ok_or_else(|| MappingError::unknown_field(query_type.name(), &select.field))?;

        let table = self
            .mapping
            .object_mapping(&target)?
            .table()
            .ok_or_else(|| ExecutionError::UnknownTable {
                type_name: target.to_string(),
            })?;
        let rows: Vec<&'a Row> = self.dataset.rows(table).iter().collect();
        let entities = self.group_entities(&target, rows)?;
        debug!(
            "Executing `{}` over {} `{}` entities",
            select.field,
            entities.len(),
            target
        );
        self.evaluate(
            &select.field,
            &target,
            &select.child,
            entities,
            field_def.ty.is_list(),
        )
    }

    fn group_entities(
        &self,
        type_ref: &TypeRef,
        rows: Vec<&'a Row>,
    ) -> Result<Vec<Entity<'a>>, ExecutionError> {
        let key_columns: Vec<String> = self
            .mapping
            .object_mapping(type_ref)?
            .key_columns()
            .into_iter()
            .map(|column| column.column.clone())
            .collect();

        if key_columns.is_empty() {
            return Ok(rows.into_iter().map(|row| Entity { rows: vec![row] }).collect());
        }

        let mut keys: Vec<Vec<Literal>> = Vec::new();
        let mut entities: Vec<Entity<'a>> = Vec::new();
        for row in rows {
            let key: Vec<Literal> = key_columns
                .iter()
                .map(|column| row.get(column).cloned().unwrap_or(Literal::Null))
                .collect();
            match keys.iter().position(|existing| *existing == key) {
                Some(i) => entities[i].rows.push(row),
                None => {
                    keys.push(key);
                    entities.push(Entity { rows: vec![row] });
                }
            }
        }
        Ok(entities)
    }

    /// Apply the wrapping operators above a selection set, then project.
    fn evaluate(
        &self,
        field: &str,
        owner: &TypeRef,
        node: &Operator,
        entities: Vec<Entity<'a>>,
        many: bool,
    ) -> Result<Value, ExecutionError> {
        let shaped = self.apply(field, owner, node, entities)?;
        if many && !shaped.unique {
            let items = shaped
                .entities
                .iter()
                .map(|entity| self.project(owner, shaped.selection, entity))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Value::List(items));
        }
        match shaped.entities.first() {
            Some(entity) => self.project(owner, shaped.selection, entity),
            None => Ok(Value::Null),
        }
    }

    /// Walk down to the selection set, then apply each wrapping operator to
    /// the output of its input, innermost first.
    fn apply<'n>(
        &self,
        field: &str,
        owner: &TypeRef,
        node: &'n Operator,
        entities: Vec<Entity<'a>>,
    ) -> Result<Shaped<'a, 'n>, ExecutionError> {
        match node {
            Operator::Filter(filter) => {
                let mut shaped = self.apply(field, owner, &filter.input, entities)?;
                shaped.entities = self.filter(owner, &filter.predicate, shaped.entities)?;
                Ok(shaped)
            }
            Operator::Unique(unique) => {
                let mut shaped = self.apply(field, owner, &unique.input, entities)?;
                shaped.entities = self.filter(owner, &unique.predicate, shaped.entities)?;
                if shaped.entities.len() > 1 {
                    return Err(ExecutionError::AmbiguousKey {
                        field: field.to_string(),
                        matches: shaped.entities.len(),
                    });
                }
                shaped.unique = true;
                Ok(shaped)
            }
            Operator::OrderBy(order_by) => {
                let mut shaped = self.apply(field, owner, &order_by.input, entities)?;
                shaped.entities = self.order(owner, &order_by.items, shaped.entities)?;
                Ok(shaped)
            }
            Operator::Limit(limit) => {
                let mut shaped = self.apply(field, owner, &limit.input, entities)?;
                shaped
                    .entities
                    .truncate(usize::try_from(limit.count).unwrap_or(usize::MAX));
                Ok(shaped)
            }
            Operator::Empty | Operator::Select(_) | Operator::Group(_) => Ok(Shaped {
                entities,
                selection: node,
                unique: false,
            }),
            Operator::Join(_) => Err(ExecutionError::unsupported("Join", field)),
        }
    }

    /// Keep the rows satisfying `predicate`; entities left without rows drop.
    fn filter(
        &self,
        owner: &TypeRef,
        predicate: &Predicate,
        entities: Vec<Entity<'a>>,
    ) -> Result<Vec<Entity<'a>>, ExecutionError> {
        let patterns = Patterns::compile(predicate)?;
        let reader = self.reader();
        let mut kept = Vec::with_capacity(entities.len());
        for entity in entities {
            let mut rows = Vec::with_capacity(entity.rows.len());
            for row in entity.rows {
                if reader.evaluate(owner, row, predicate, &patterns)?.is_true() {
                    rows.push(row);
                }
            }
            if !rows.is_empty() {
                kept.push(Entity { rows });
            }
        }
        trace!("Filter({}) kept {} entities", predicate, kept.len());
        Ok(kept)
    }

    fn order(
        &self,
        owner: &TypeRef,
        items: &[OrderItem],
        entities: Vec<Entity<'a>>,
    ) -> Result<Vec<Entity<'a>>, ExecutionError> {
        let reader = self.reader();
        let mut keyed = Vec::with_capacity(entities.len());
        for entity in entities {
            let mut key = Vec::with_capacity(items.len());
            for item in items {
                let value = match entity.first() {
                    Some(row) => reader.read(owner, row, &item.path)?,
                    None => Literal::Null,
                };
                key.push(value);
            }
            keyed.push((key, entity));
        }

        keyed.sort_by(|(a, _), (b, _)| {
            for (item, (left, right)) in items.iter().zip(a.iter().zip(b.iter())) {
                let cmp = compare_for_order(item, left, right);
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            Ordering::Equal
        });
        Ok(keyed.into_iter().map(|(_, entity)| entity).collect())
    }

    /// Build the object for one entity from a selection set.
    fn project(
        &self,
        owner: &TypeRef,
        selection: &Operator,
        entity: &Entity<'a>,
    ) -> Result<Value, ExecutionError> {
        let selects: Vec<&Select> = match selection {
            Operator::Empty => vec![],
            Operator::Select(select) => vec![select],
            Operator::Group(items) => items
                .iter()
                .map(|item| match item {
                    Operator::Select(select) => Ok(select),
                    other => Err(ExecutionError::unsupported(node_name(other), "selection set")),
                })
                .collect::<Result<_, _>>()?,
            other => return Err(ExecutionError::unsupported(node_name(other), "selection set")),
        };

        let mut fields = Vec::with_capacity(selects.len());
        for select in selects {
            let value = self.project_field(owner, select, entity)?;
            fields.push((select.field.clone(), value));
        }
        Ok(Value::Object(fields))
    }

    fn project_field(
        &self,
        owner: &TypeRef,
        select: &Select,
        entity: &Entity<'a>,
    ) -> Result<Value, ExecutionError> {
        match self.mapping.field_mapping(owner, &select.field)? {
            FieldMapping::Field { column, .. } | FieldMapping::Attribute { column, .. } => {
                let value = entity
                    .first()
                    .and_then(|row| row.get(&column.column))
                    .cloned()
                    .unwrap_or(Literal::Null);
                Ok(match value {
                    Literal::Null => Value::Null,
                    other => Value::Scalar(other),
                })
            }
            FieldMapping::ObjectField { join, .. } => {
                let target = self
                    .mapping
                    .target_of(owner, &select.field)
                    .ok_or_else(|| MappingError::unknown_field(owner.name(), &select.field))?;
                let many = self
                    .registry
                    .field(owner, &select.field)
                    .is_some_and(|def| def.ty.is_list());

                let parent_keys: Vec<&Literal> = entity
                    .rows
                    .iter()
                    .filter_map(|row| row.get(&join.parent.column))
                    .filter(|key| !key.is_null())
                    .collect();
                let rows: Vec<&'a Row> = self
                    .dataset
                    .rows(&join.child.table)
                    .iter()
                    .filter(|row| {
                        row.get(&join.child.column).is_some_and(|value| {
                            parent_keys
                                .iter()
                                .any(|key| value.compare(key) == Some(Ordering::Equal))
                        })
                    })
                    .collect();
                let entities = self.group_entities(target, rows)?;

                let input = match select.child.as_ref() {
                    Operator::Join(join_op) => join_op.input.as_ref(),
                    other => other,
                };
                self.evaluate(&select.field, target, input, entities, many)
            }
            FieldMapping::Root { .. } => Err(ExecutionError::unsupported(
                format!("Select({})", select.field),
                owner.name(),
            )),
        }
    }
}

fn compare_for_order(item: &OrderItem, left: &Literal, right: &Literal) -> Ordering {
    let null_first = if item.nulls_last {
        Ordering::Greater
    } else {
        Ordering::Less
    };
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => null_first,
        (false, true) => null_first.reverse(),
        (false, false) => {
            // Incomparable kinds are treated as equal
            let cmp = left.compare(right).unwrap_or(Ordering::Equal);
            match item.direction {
                SortDirection::Asc => cmp,
                SortDirection::Desc => cmp.reverse(),
            }
        }
    }
}

fn node_name(node: &Operator) -> String {
    node.to_string().lines().next().unwrap_or_default().to_string()
}
