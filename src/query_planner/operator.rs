use serde::{Deserialize, Serialize};
use std::fmt;

use super::predicate::{FieldPath, Predicate};
use crate::{mapping_catalog::Join, value::Binding};

/// Node of the relational query plan handed to the executor.
///
/// Every node owns its children; plans are trees built fresh per request.
/// Wrapping nodes (`Filter`, `Unique`, `OrderBy`, `Limit`, `Join`) apply to
/// the rows produced by their input.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Operator {
    Empty,

    /// Field selection, with the arguments supplied for it.
    Select(Select),

    /// Sibling selections on the same object.
    Group(Vec<Operator>),

    Filter(Filter),

    /// The input must resolve to at most one row. Zero rows is an absent
    /// value; more than one is reported by the executor.
    Unique(Unique),

    /// Rows of the input come from the target side of a relational edge.
    Join(JoinOp),

    OrderBy(OrderBy),

    Limit(Limit),
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Select {
    pub field: String,
    pub args: Vec<Binding>,
    pub child: Box<Operator>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Filter {
    pub predicate: Predicate,
    pub input: Box<Operator>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Unique {
    pub predicate: Predicate,
    pub input: Box<Operator>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct JoinOp {
    pub join: Join,
    pub input: Box<Operator>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OrderBy {
    pub items: Vec<OrderItem>,
    pub input: Box<Operator>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub path: FieldPath,
    pub direction: SortDirection,
    /// Nulls sort after every value
    pub nulls_last: bool,
}

impl OrderItem {
    pub fn asc(path: impl Into<FieldPath>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Asc,
            nulls_last: true,
        }
    }

    pub fn desc(path: impl Into<FieldPath>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Desc,
            nulls_last: true,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Limit {
    pub count: u64,
    pub input: Box<Operator>,
}

impl Operator {
    pub fn select(field: impl Into<String>, args: Vec<Binding>, child: Operator) -> Self {
        Operator::Select(Select {
            field: field.into(),
            args,
            child: Box::new(child),
        })
    }

    /// Leaf selection of a field without arguments or sub-selections.
    pub fn leaf(field: impl Into<String>) -> Self {
        Operator::select(field, Vec::new(), Operator::Empty)
    }

    /// Group of sibling selections; a single selection stays unwrapped.
    pub fn group(mut selections: Vec<Operator>) -> Self {
        match selections.len() {
            0 => Operator::Empty,
            1 => selections.remove(0),
            _ => Operator::Group(selections),
        }
    }

    pub fn filter(self, predicate: Predicate) -> Self {
        Operator::Filter(Filter {
            predicate,
            input: Box::new(self),
        })
    }

    pub fn unique(self, predicate: Predicate) -> Self {
        Operator::Unique(Unique {
            predicate,
            input: Box::new(self),
        })
    }

    pub fn join(self, join: Join) -> Self {
        Operator::Join(JoinOp {
            join,
            input: Box::new(self),
        })
    }

    pub fn order_by(self, items: Vec<OrderItem>) -> Self {
        Operator::OrderBy(OrderBy {
            items,
            input: Box::new(self),
        })
    }

    pub fn limit(self, count: u64) -> Self {
        Operator::Limit(Limit {
            count,
            input: Box::new(self),
        })
    }

    pub fn children(&self) -> Vec<&Operator> {
        match self {
            Operator::Empty => vec![],
            Operator::Select(select) => vec![select.child.as_ref()],
            Operator::Group(items) => items.iter().collect(),
            Operator::Filter(filter) => vec![filter.input.as_ref()],
            Operator::Unique(unique) => vec![unique.input.as_ref()],
            Operator::Join(join) => vec![join.input.as_ref()],
            Operator::OrderBy(order_by) => vec![order_by.input.as_ref()],
            Operator::Limit(limit) => vec![limit.input.as_ref()],
        }
    }

    /// Field paths read by the predicates and sort keys wrapping the
    /// selection set, outermost first.
    pub fn wrapper_paths(&self) -> Vec<&FieldPath> {
        match self {
            Operator::Filter(filter) => {
                let mut paths = filter.predicate.paths();
                paths.extend(filter.input.wrapper_paths());
                paths
            }
            Operator::Unique(unique) => {
                let mut paths = unique.predicate.paths();
                paths.extend(unique.input.wrapper_paths());
                paths
            }
            Operator::OrderBy(order_by) => {
                let mut paths: Vec<&FieldPath> =
                    order_by.items.iter().map(|item| &item.path).collect();
                paths.extend(order_by.input.wrapper_paths());
                paths
            }
            Operator::Limit(limit) => limit.input.wrapper_paths(),
            Operator::Join(join) => join.input.wrapper_paths(),
            Operator::Empty | Operator::Select(_) | Operator::Group(_) => Vec::new(),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Operator::node_count)
            .sum::<usize>()
    }

    fn fmt_with_tree(
        &self,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
        is_root: bool,
    ) -> fmt::Result {
        let (branch, next_prefix) = if is_last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };

        if is_root {
            writeln!(f, "{}", self.variant_name())?;
        } else {
            writeln!(f, "{}{}{}", prefix, branch, self.variant_name())?;
        }

        let child_prefix = if is_root {
            String::new()
        } else {
            format!("{}{}", prefix, next_prefix)
        };
        let children = self.children();
        let n = children.len();
        for (i, child) in children.into_iter().enumerate() {
            child.fmt_with_tree(f, &child_prefix, i + 1 == n, false)?;
        }
        Ok(())
    }

    fn variant_name(&self) -> String {
        match self {
            Operator::Empty => "Empty".to_string(),
            Operator::Select(select) if select.args.is_empty() => {
                format!("Select({})", select.field)
            }
            Operator::Select(select) => {
                let args: Vec<String> = select.args.iter().map(ToString::to_string).collect();
                format!("Select({}, [{}])", select.field, args.join(", "))
            }
            Operator::Group(_) => "Group".to_string(),
            Operator::Filter(filter) => format!("Filter({})", filter.predicate),
            Operator::Unique(unique) => format!("Unique({})", unique.predicate),
            Operator::Join(join) => format!("Join({})", join.join),
            Operator::OrderBy(order_by) => {
                let items: Vec<String> = order_by
                    .items
                    .iter()
                    .map(|item| match item.direction {
                        SortDirection::Asc => format!("{} ASC", item.path),
                        SortDirection::Desc => format!("{} DESC", item.path),
                    })
                    .collect();
                format!("OrderBy({})", items.join(", "))
            }
            Operator::Limit(limit) => format!("Limit({})", limit.count),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with_tree(f, "", true, true)
    }
}
