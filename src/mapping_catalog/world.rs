//! The bundled "world" catalog: countries, cities and the languages spoken
//! in them.
//!
//! The catalog is built once per process from the embedded YAML definition
//! and shared read-only afterwards.

use lazy_static::lazy_static;

use super::{column_ref::OpaqueCodecs, errors::MappingError, Catalog};

const WORLD_DEFINITION: &str = include_str!("world.yaml");

lazy_static! {
    static ref WORLD: Result<Catalog, MappingError> =
        Catalog::from_yaml_str(WORLD_DEFINITION, &OpaqueCodecs::postgres_basic());
}

/// Process-wide world catalog.
pub fn world_catalog() -> Result<&'static Catalog, MappingError> {
    WORLD.as_ref().map_err(Clone::clone)
}
