pub mod column_ref;
pub mod config;
pub mod errors;
pub mod field_mapping;
pub mod object_mapping;
pub mod type_registry;
pub mod validation;
pub mod world;

use std::path::Path;

use log::info;

pub use column_ref::{CodecId, CodecProvider, ColumnCodec, ColumnRef, OpaqueCodecs, ValueCodec};
pub use config::CatalogDefinition;
pub use errors::MappingError;
pub use field_mapping::{FieldMapping, Join};
pub use object_mapping::{MappingTable, ObjectMapping, ResolvedPath, TableSchema};
pub use type_registry::{TypeExpr, TypeRef, TypeRegistry, TypeResolver};
pub use world::world_catalog;

/// A type registry together with the mapping table bound to it.
#[derive(Debug, Clone)]
pub struct Catalog {
    name: Option<String>,
    registry: TypeRegistry,
    mapping: MappingTable,
}

impl Catalog {
    pub fn from_definition(
        definition: CatalogDefinition,
        codecs: &dyn CodecProvider,
    ) -> Result<Self, MappingError> {
        let registry = TypeRegistry::from_definition(definition.schema)?;
        let mapping = MappingTable::build(definition.mapping, &registry, codecs)?;
        validation::validate_against_registry(&mapping, &registry)?;
        info!(
            "Loaded catalog `{}` ({} mapped types)",
            definition.name.as_deref().unwrap_or("<unnamed>"),
            mapping.object_mappings().len()
        );
        Ok(Catalog {
            name: definition.name,
            registry,
            mapping,
        })
    }

    pub fn from_yaml_str(content: &str, codecs: &dyn CodecProvider) -> Result<Self, MappingError> {
        let definition: CatalogDefinition =
            serde_yaml::from_str(content).map_err(|e| MappingError::ConfigParse {
                error: e.to_string(),
            })?;
        Self::from_definition(definition, codecs)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(
        path: P,
        codecs: &dyn CodecProvider,
    ) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MappingError::config_read_with_context(
                path.display().to_string(),
                e.to_string(),
                "While loading catalog definition",
            )
        })?;
        Self::from_yaml_str(&content, codecs)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }
}
