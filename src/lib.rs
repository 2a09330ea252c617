//! querymap - declarative query elaboration over a relational mapping
//!
//! This crate compiles field-selection requests into relational query plans:
//! - Object mapping of logical types onto physical tables and join keys
//! - A composable operator algebra (filter, unique, join, order, limit)
//! - Argument-driven elaboration of top-level operations
//! - A reference in-memory executor for elaborated plans

pub mod config;
pub mod executor;
pub mod mapping_catalog;
pub mod query_planner;
pub mod value;

use thiserror::Error;

pub use config::ElaboratorConfig;
pub use mapping_catalog::{world_catalog, Catalog, MappingError};
pub use query_planner::{ElaborationError, ElaborationErrors, Elaborator, Operator};
pub use value::{Binding, Literal};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Catalog unavailable: {0}")]
    Catalog(#[from] MappingError),

    #[error(transparent)]
    Elaboration(#[from] ElaborationErrors),
}

/// Elaborate one operation against the bundled world catalog with the
/// default configuration.
pub fn elaborate(operation: &str, bindings: &[Binding], child: Operator) -> Result<Operator, Error> {
    let catalog = world_catalog()?;
    let plan = Elaborator::for_catalog(catalog, ElaboratorConfig::default())
        .elaborate(operation, bindings, child)?;
    Ok(plan)
}
