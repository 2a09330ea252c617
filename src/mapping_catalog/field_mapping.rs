use serde::{Deserialize, Serialize};
use std::fmt;

use super::column_ref::ColumnRef;

/// Join between the owning type's column (`parent`) and the target type's
/// column (`child`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub parent: ColumnRef,
    pub child: ColumnRef,
}

impl Join {
    pub fn new(parent: ColumnRef, child: ColumnRef) -> Self {
        Self { parent, child }
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.parent, self.child)
    }
}

/// Binding of one logical field to the physical layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldMapping {
    /// Top-level entry point; the target type's own mapping says where rows
    /// come from.
    Root { field: String },

    /// Column used for joins or uniqueness, not part of the public field set.
    Attribute {
        field: String,
        column: ColumnRef,
        key: bool,
    },

    /// Column exposed as a queryable scalar field.
    Field {
        field: String,
        column: ColumnRef,
        key: bool,
    },

    /// Relational edge to another object type.
    ObjectField { field: String, join: Join },
}

impl FieldMapping {
    pub fn field_name(&self) -> &str {
        match self {
            FieldMapping::Root { field }
            | FieldMapping::Attribute { field, .. }
            | FieldMapping::Field { field, .. }
            | FieldMapping::ObjectField { field, .. } => field,
        }
    }

    pub fn column(&self) -> Option<&ColumnRef> {
        match self {
            FieldMapping::Attribute { column, .. } | FieldMapping::Field { column, .. } => {
                Some(column)
            }
            _ => None,
        }
    }

    pub fn join(&self) -> Option<&Join> {
        match self {
            FieldMapping::ObjectField { join, .. } => Some(join),
            _ => None,
        }
    }

    pub fn is_key(&self) -> bool {
        match self {
            FieldMapping::Attribute { key, .. } | FieldMapping::Field { key, .. } => *key,
            _ => false,
        }
    }

    /// Attributes are internal: they can be filtered and joined on but are
    /// not part of the public field set.
    pub fn is_hidden(&self) -> bool {
        matches!(self, FieldMapping::Attribute { .. })
    }
}
