//! Structural checks on a built mapping table.
//!
//! [`validate_mapping`] runs on every [`MappingTable`] construction and
//! checks the table on its own. [`validate_against_registry`] additionally
//! checks the mapping against the declared type graph and runs when a full
//! catalog is loaded.

use std::collections::BTreeSet;

use log::warn;

use super::{
    errors::MappingError,
    field_mapping::FieldMapping,
    object_mapping::{MappingTable, ObjectMapping},
    type_registry::TypeRegistry,
};

pub fn validate_mapping(table: &MappingTable) -> Result<(), MappingError> {
    for object in table.object_mappings() {
        check_single_table(object)?;
        check_keys(object)?;
        check_joins(table, object)?;
    }
    Ok(())
}

/// Column-bound fields of one type live in one table.
fn check_single_table(object: &ObjectMapping) -> Result<(), MappingError> {
    let tables: BTreeSet<&str> = object
        .fields
        .iter()
        .filter_map(FieldMapping::column)
        .map(|c| c.table.as_str())
        .collect();
    if tables.len() > 1 {
        return Err(MappingError::MixedTables {
            type_name: object.type_ref.0.clone(),
            tables: tables.into_iter().map(str::to_string).collect(),
        });
    }
    Ok(())
}

fn check_keys(object: &ObjectMapping) -> Result<(), MappingError> {
    let count = object.fields.iter().filter(|f| f.is_key()).count();
    if count > 1 && !object.composite_key {
        return Err(MappingError::MultipleKeys {
            type_name: object.type_ref.0.clone(),
            count,
        });
    }
    if count == 0 && object.table().is_some() {
        // Unique lookups on a keyless type can only be checked by the executor.
        warn!("Type `{}` has no key field", object.type_ref);
    }
    Ok(())
}

/// Join parent sits on the owner's table, join child on the target's table.
fn check_joins(table: &MappingTable, object: &ObjectMapping) -> Result<(), MappingError> {
    for field in &object.fields {
        let FieldMapping::ObjectField { field: name, join } = field else {
            continue;
        };

        if let Some(own_table) = object.table() {
            if join.parent.table != own_table {
                return Err(MappingError::invalid_join(
                    object.type_ref.name(),
                    name,
                    format!(
                        "parent column {} is not on table '{}'",
                        join.parent, own_table
                    ),
                ));
            }
        }

        let target = table
            .target_of(&object.type_ref, name)
            .ok_or_else(|| MappingError::invalid_join(object.type_ref.name(), name, "no target type"))?;
        let target_mapping = table.object_mapping(target)?;
        if let Some(target_table) = target_mapping.table() {
            if join.child.table != target_table {
                return Err(MappingError::invalid_join(
                    object.type_ref.name(),
                    name,
                    format!(
                        "child column {} is not on table '{}' of `{}`",
                        join.child, target_table, target
                    ),
                ));
            }
        }
        if join.parent.codec != join.child.codec {
            warn!(
                "Join `{}.{}` compares columns with different codecs ({:?} vs {:?})",
                object.type_ref, name, join.parent.codec, join.child.codec
            );
        }
    }
    Ok(())
}

/// Declared fields and mappings line up.
///
/// Every field of a mapped type must have a mapping, every non-hidden
/// mapping must be a declared field, and query-type entry points must be
/// `Root` mappings.
pub fn validate_against_registry(
    table: &MappingTable,
    registry: &TypeRegistry,
) -> Result<(), MappingError> {
    for object in table.object_mappings() {
        let declared = registry
            .object_type(&object.type_ref)
            .ok_or_else(|| MappingError::UnknownType {
                type_name: object.type_ref.0.clone(),
            })?;

        for field in &declared.fields {
            let mapping = object
                .field(&field.name)
                .ok_or_else(|| MappingError::UnmappedField {
                    type_name: declared.name.clone(),
                    field: field.name.clone(),
                })?;
            let is_root = matches!(mapping, FieldMapping::Root { .. });
            if is_root != (&object.type_ref == registry.query_type()) {
                return Err(MappingError::InvalidConfig {
                    message: format!(
                        "`{}.{}`: root mappings belong to the query type only",
                        declared.name, field.name
                    ),
                });
            }
            if let Some(target) = table.target_of(&object.type_ref, &field.name) {
                if target.name() != field.ty.base_name() {
                    return Err(MappingError::invalid_join(
                        declared.name.as_str(),
                        field.name.as_str(),
                        format!(
                            "mapped to `{}` but declared as `{}`",
                            target, field.ty
                        ),
                    ));
                }
            }
        }

        for mapping in object.public_fields() {
            if declared.field(mapping.field_name()).is_none() {
                return Err(MappingError::unknown_field(
                    declared.name.as_str(),
                    mapping.field_name(),
                ));
            }
        }
    }
    Ok(())
}
