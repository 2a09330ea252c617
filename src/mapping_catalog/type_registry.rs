//! Queryable representation of the logical type graph.
//!
//! The registry is produced from a [`SchemaDefinition`], which an external
//! schema parser (or the bundled YAML) fills in. It answers three questions
//! during mapping construction and elaboration: which types exist, what a
//! field's type is, and what arguments a field declares.

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};

use super::errors::MappingError;
use crate::value::Literal;

/// Stable handle to a named logical type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeRef(pub String);

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        TypeRef(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves type names to handles.
#[cfg_attr(test, mockall::automock)]
pub trait TypeResolver {
    fn resolve_type(&self, name: &str) -> Option<TypeRef>;
}

/// Type expression of a field or argument: `Int`, `String!`, `[City!]!`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(String),
    List(Box<TypeExpr>),
    NonNull(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn is_nullable(&self) -> bool {
        !matches!(self, TypeExpr::NonNull(_))
    }

    /// True for list types, with or without a non-null wrapper.
    pub fn is_list(&self) -> bool {
        match self {
            TypeExpr::List(_) => true,
            TypeExpr::NonNull(inner) => inner.is_list(),
            TypeExpr::Named(_) => false,
        }
    }

    /// Innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            TypeExpr::Named(name) => name,
            TypeExpr::List(inner) | TypeExpr::NonNull(inner) => inner.base_name(),
        }
    }

    /// Strip one non-null wrapper.
    pub fn nullable_inner(&self) -> &TypeExpr {
        match self {
            TypeExpr::NonNull(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::List(inner) => write!(f, "[{}]", inner),
            TypeExpr::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

impl FromStr for TypeExpr {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MappingError::InvalidTypeExpression {
            expr: s.to_string(),
        };
        let s = s.trim();
        if let Some(inner) = s.strip_suffix('!') {
            let inner: TypeExpr = inner.parse().map_err(|_| invalid())?;
            if matches!(inner, TypeExpr::NonNull(_)) {
                return Err(invalid());
            }
            return Ok(TypeExpr::NonNull(Box::new(inner)));
        }
        if let Some(inner) = s.strip_prefix('[') {
            let inner = inner.strip_suffix(']').ok_or_else(invalid)?;
            let item: TypeExpr = inner.parse().map_err(|_| invalid())?;
            return Ok(TypeExpr::List(Box::new(item)));
        }
        if !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_') {
            Ok(TypeExpr::Named(s.to_string()))
        } else {
            Err(invalid())
        }
    }
}

/// Declared argument of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDef {
    pub name: String,
    pub ty: TypeExpr,
    pub default: Option<Literal>,
}

impl ArgumentDef {
    /// Non-null and without a default: the caller must supply it.
    pub fn is_required(&self) -> bool {
        !self.ty.is_nullable() && self.default.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeExpr,
    pub args: Vec<ArgumentDef>,
}

impl FieldDef {
    pub fn arg(&self, name: &str) -> Option<&ArgumentDef> {
        self.args.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

impl ObjectType {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Serialized form of the type graph.
///
/// ```yaml
/// query_type: Query
/// types:
///   - name: Query
///     fields:
///       - name: city
///         type: City
///         args:
///           - { name: id, type: Int }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default = "default_query_type")]
    pub query_type: String,
    pub types: Vec<ObjectTypeDefinition>,
}

fn default_query_type() -> String {
    "Query".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectTypeDefinition {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub args: Vec<ArgumentDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub default: Option<Literal>,
}

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

#[derive(Debug, Clone)]
pub struct TypeRegistry {
    query_type: TypeRef,
    types: HashMap<String, ObjectType>,
}

impl TypeRegistry {
    pub fn from_definition(definition: SchemaDefinition) -> Result<Self, MappingError> {
        let mut types = HashMap::new();
        for type_def in definition.types {
            let mut fields = Vec::with_capacity(type_def.fields.len());
            for field_def in type_def.fields {
                let args = field_def
                    .args
                    .into_iter()
                    .map(|arg| {
                        Ok(ArgumentDef {
                            name: arg.name,
                            ty: arg.ty.parse()?,
                            // an explicit `default: null` means no default
                            default: arg.default.filter(|d| !d.is_null()),
                        })
                    })
                    .collect::<Result<Vec<_>, MappingError>>()?;
                fields.push(FieldDef {
                    name: field_def.name,
                    ty: field_def.ty.parse()?,
                    args,
                });
            }
            types.insert(
                type_def.name.clone(),
                ObjectType {
                    name: type_def.name,
                    fields,
                },
            );
        }

        let registry = TypeRegistry {
            query_type: TypeRef(definition.query_type),
            types,
        };
        registry.check_references()?;
        log::debug!(
            "Built type registry with {} object types (query type `{}`)",
            registry.types.len(),
            registry.query_type
        );
        Ok(registry)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, MappingError> {
        let definition: SchemaDefinition =
            serde_yaml::from_str(content).map_err(|e| MappingError::ConfigParse {
                error: e.to_string(),
            })?;
        Self::from_definition(definition)
    }

    /// Every field type names a builtin scalar or a declared object type.
    fn check_references(&self) -> Result<(), MappingError> {
        if !self.types.contains_key(self.query_type.name()) {
            return Err(MappingError::UnknownType {
                type_name: self.query_type.0.clone(),
            });
        }
        for object in self.types.values() {
            for field in &object.fields {
                let base = field.ty.base_name();
                if !self.is_scalar(base) && !self.types.contains_key(base) {
                    return Err(MappingError::UnknownType {
                        type_name: base.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn query_type(&self) -> &TypeRef {
        &self.query_type
    }

    pub fn is_scalar(&self, name: &str) -> bool {
        BUILTIN_SCALARS.contains(&name)
    }

    pub fn object_type(&self, type_ref: &TypeRef) -> Option<&ObjectType> {
        self.types.get(type_ref.name())
    }

    pub fn field(&self, type_ref: &TypeRef, field: &str) -> Option<&FieldDef> {
        self.object_type(type_ref)?.field(field)
    }

    /// Object type a field points at, if the field is object-typed.
    pub fn field_target(&self, type_ref: &TypeRef, field: &str) -> Option<TypeRef> {
        let base = self.field(type_ref, field)?.ty.base_name();
        self.types.contains_key(base).then(|| TypeRef(base.to_string()))
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve_type(&self, name: &str) -> Option<TypeRef> {
        self.types.contains_key(name).then(|| TypeRef(name.to_string()))
    }
}
