/// Mapping definition management.
///
/// Object mappings are defined in YAML next to the type schema they bind:
///
/// ```yaml
/// schema:
///   query_type: Query
///   types:
///     - name: Query
///       fields:
///         - { name: city, type: City, args: [{ name: id, type: Int }] }
///     - name: City
///       fields:
///         - { name: name, type: "String!" }
/// mapping:
///   tables:
///     - name: city
///       columns:
///         - { name: id, codec: int4 }
///         - { name: name, codec: varchar }
///   objects:
///     - type: Query
///       fields:
///         - { kind: root, name: city }
///     - type: City
///       fields:
///         - { kind: attribute, name: id, column: city.id, key: true }
///         - { kind: field, name: name, column: city.name }
/// ```
///
/// Column references are written `table.column`. An `object` field names
/// its target type and a join whose `parent` column belongs to the owning
/// type's table and whose `child` column belongs to the target's table.
use serde::{Deserialize, Serialize};

use super::type_registry::SchemaDefinition;

/// Type schema plus its physical mapping, as stored in one YAML document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDefinition {
    /// Optional catalog name (used in log output)
    #[serde(default)]
    pub name: Option<String>,
    pub schema: SchemaDefinition,
    pub mapping: MappingDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingDefinition {
    pub tables: Vec<TableDefinition>,
    pub objects: Vec<ObjectMappingDefinition>,
}

/// Physical table definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    /// Storage codec identifier, resolved through the codec provider
    pub codec: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMappingDefinition {
    /// Logical type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Optional: treat every key-marked field as part of one composite key.
    /// Without it at most one field may be marked `key: true`.
    #[serde(default)]
    pub composite_key: bool,
    pub fields: Vec<FieldMappingDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldMappingDefinition {
    Root {
        name: String,
    },
    Attribute {
        name: String,
        column: String,
        #[serde(default)]
        key: bool,
    },
    Field {
        name: String,
        column: String,
        #[serde(default)]
        key: bool,
    },
    Object {
        name: String,
        target: String,
        join: JoinDefinition,
    },
}

impl FieldMappingDefinition {
    pub fn name(&self) -> &str {
        match self {
            FieldMappingDefinition::Root { name }
            | FieldMappingDefinition::Attribute { name, .. }
            | FieldMappingDefinition::Field { name, .. }
            | FieldMappingDefinition::Object { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinDefinition {
    pub parent: String,
    pub child: String,
}
