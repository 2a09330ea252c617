use std::collections::HashMap;

use log::{debug, trace};

use super::{
    column_ref::{CodecProvider, ColumnRef, ValueCodec},
    config::{FieldMappingDefinition, MappingDefinition, ObjectMappingDefinition, TableDefinition},
    errors::MappingError,
    field_mapping::{FieldMapping, Join},
    type_registry::{TypeRef, TypeResolver},
    validation,
};

/// Field mappings of one logical object type, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMapping {
    pub type_ref: TypeRef,
    pub fields: Vec<FieldMapping>,
    /// All key-marked fields together form the key
    pub composite_key: bool,
}

impl ObjectMapping {
    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.field_name() == name)
    }

    pub fn key_columns(&self) -> Vec<&ColumnRef> {
        self.fields
            .iter()
            .filter(|f| f.is_key())
            .filter_map(FieldMapping::column)
            .collect()
    }

    /// Table backing this type, taken from its column-bound fields.
    ///
    /// `None` for types without columns (the query type).
    pub fn table(&self) -> Option<&str> {
        self.fields
            .iter()
            .find_map(FieldMapping::column)
            .map(|c| c.table.as_str())
    }

    /// Fields visible to callers (attributes excluded).
    pub fn public_fields(&self) -> impl Iterator<Item = &FieldMapping> {
        self.fields.iter().filter(|f| !f.is_hidden())
    }
}

/// Physical table with its columns and their codecs.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnRef>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnRef> {
        self.columns.iter().find(|c| c.column == name)
    }
}

/// Result of walking a field path through object fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    /// Type that owns the terminal column
    pub owner: TypeRef,
    pub column: ColumnRef,
    /// Joins crossed on the way, outermost first
    pub joins: Vec<Join>,
}

/// The complete, immutable set of object mappings.
#[derive(Debug, Clone)]
pub struct MappingTable {
    objects: Vec<ObjectMapping>,
    index: HashMap<TypeRef, usize>,
    tables: HashMap<String, TableSchema>,
    /// Target type of every object field, keyed by (owner, field)
    targets: HashMap<(TypeRef, String), TypeRef>,
}

impl MappingTable {
    /// Build and validate the mapping table from its definition.
    pub fn build(
        definition: MappingDefinition,
        resolver: &dyn TypeResolver,
        codecs: &dyn CodecProvider,
    ) -> Result<Self, MappingError> {
        let tables = build_tables(definition.tables, codecs)?;

        let mut objects = Vec::with_capacity(definition.objects.len());
        let mut index = HashMap::new();
        let mut targets = HashMap::new();

        for object_def in definition.objects {
            let type_ref = resolve(resolver, &object_def.type_name)?;
            if index.contains_key(&type_ref) {
                return Err(MappingError::DuplicateObject {
                    type_name: object_def.type_name,
                });
            }
            let object = build_object(&type_ref, object_def, &tables, resolver, &mut targets)?;
            trace!(
                "Mapped type `{}` with {} fields",
                type_ref,
                object.fields.len()
            );
            index.insert(type_ref, objects.len());
            objects.push(object);
        }

        let table = MappingTable {
            objects,
            index,
            tables,
            targets,
        };
        validation::validate_mapping(&table)?;
        debug!(
            "Built mapping table: {} object types over {} tables",
            table.objects.len(),
            table.tables.len()
        );
        Ok(table)
    }

    pub fn object_mappings(&self) -> &[ObjectMapping] {
        &self.objects
    }

    pub fn object_mapping(&self, type_ref: &TypeRef) -> Result<&ObjectMapping, MappingError> {
        self.index
            .get(type_ref)
            .map(|&i| &self.objects[i])
            .ok_or_else(|| MappingError::UnknownType {
                type_name: type_ref.0.clone(),
            })
    }

    pub fn field_mapping(
        &self,
        type_ref: &TypeRef,
        field: &str,
    ) -> Result<&FieldMapping, MappingError> {
        self.object_mapping(type_ref)?
            .field(field)
            .ok_or_else(|| MappingError::unknown_field(type_ref.name(), field))
    }

    /// The two column references of an object field.
    pub fn join_for(&self, type_ref: &TypeRef, field: &str) -> Result<&Join, MappingError> {
        self.field_mapping(type_ref, field)?
            .join()
            .ok_or_else(|| MappingError::invalid_join(type_ref.name(), field, "not an object field"))
    }

    /// Type an object field leads to.
    pub fn target_of(&self, type_ref: &TypeRef, field: &str) -> Option<&TypeRef> {
        self.targets.get(&(type_ref.clone(), field.to_string()))
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    /// Walk `segments` from `type_ref`, following object fields, down to a
    /// column-bound field.
    pub fn resolve_path<S: AsRef<str>>(
        &self,
        type_ref: &TypeRef,
        segments: &[S],
    ) -> Result<ResolvedPath, MappingError> {
        let Some((last, init)) = segments.split_last() else {
            return Err(MappingError::NotAColumn {
                type_name: type_ref.0.clone(),
                field: String::new(),
            });
        };

        let mut owner = type_ref.clone();
        let mut joins = Vec::new();
        for segment in init {
            let segment = segment.as_ref();
            let join = self.join_for(&owner, segment)?.clone();
            let next = self
                .target_of(&owner, segment)
                .cloned()
                .ok_or_else(|| MappingError::unknown_field(owner.name(), segment))?;
            joins.push(join);
            owner = next;
        }

        let last = last.as_ref();
        let column = self
            .field_mapping(&owner, last)?
            .column()
            .cloned()
            .ok_or_else(|| MappingError::NotAColumn {
                type_name: owner.0.clone(),
                field: last.to_string(),
            })?;

        Ok(ResolvedPath {
            owner,
            column,
            joins,
        })
    }
}

fn resolve(resolver: &dyn TypeResolver, name: &str) -> Result<TypeRef, MappingError> {
    resolver
        .resolve_type(name)
        .ok_or_else(|| MappingError::UnknownType {
            type_name: name.to_string(),
        })
}

fn build_tables(
    definitions: Vec<TableDefinition>,
    codecs: &dyn CodecProvider,
) -> Result<HashMap<String, TableSchema>, MappingError> {
    let mut tables = HashMap::new();
    for table_def in definitions {
        if tables.contains_key(&table_def.name) {
            return Err(MappingError::DuplicateTable {
                table: table_def.name,
            });
        }
        let columns = table_def
            .columns
            .iter()
            .map(|col| {
                let codec: ValueCodec =
                    codecs
                        .codec(&col.codec)
                        .ok_or_else(|| MappingError::UnknownCodec {
                            table: table_def.name.clone(),
                            column: col.name.clone(),
                            codec: col.codec.clone(),
                        })?;
                Ok(ColumnRef::new(&table_def.name, &col.name, codec))
            })
            .collect::<Result<Vec<_>, MappingError>>()?;
        tables.insert(
            table_def.name.clone(),
            TableSchema {
                name: table_def.name,
                columns,
            },
        );
    }
    Ok(tables)
}

fn column_ref(
    tables: &HashMap<String, TableSchema>,
    reference: &str,
) -> Result<ColumnRef, MappingError> {
    let (table, column) =
        reference
            .split_once('.')
            .ok_or_else(|| MappingError::InvalidColumnReference {
                reference: reference.to_string(),
            })?;
    let schema = tables.get(table).ok_or_else(|| MappingError::UnknownTable {
        table: table.to_string(),
    })?;
    schema
        .column(column)
        .cloned()
        .ok_or_else(|| MappingError::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
}

fn build_object(
    type_ref: &TypeRef,
    definition: ObjectMappingDefinition,
    tables: &HashMap<String, TableSchema>,
    resolver: &dyn TypeResolver,
    targets: &mut HashMap<(TypeRef, String), TypeRef>,
) -> Result<ObjectMapping, MappingError> {
    let mut fields: Vec<FieldMapping> = Vec::with_capacity(definition.fields.len());
    for field_def in definition.fields {
        if fields.iter().any(|f| f.field_name() == field_def.name()) {
            return Err(MappingError::DuplicateField {
                type_name: type_ref.0.clone(),
                field: field_def.name().to_string(),
            });
        }
        let mapping = match field_def {
            FieldMappingDefinition::Root { name } => FieldMapping::Root { field: name },
            FieldMappingDefinition::Attribute { name, column, key } => FieldMapping::Attribute {
                field: name,
                column: column_ref(tables, &column)?,
                key,
            },
            FieldMappingDefinition::Field { name, column, key } => FieldMapping::Field {
                field: name,
                column: column_ref(tables, &column)?,
                key,
            },
            FieldMappingDefinition::Object { name, target, join } => {
                let target = resolve(resolver, &target)?;
                targets.insert((type_ref.clone(), name.clone()), target);
                FieldMapping::ObjectField {
                    field: name,
                    join: Join::new(
                        column_ref(tables, &join.parent)?,
                        column_ref(tables, &join.child)?,
                    ),
                }
            }
        };
        fields.push(mapping);
    }

    Ok(ObjectMapping {
        type_ref: type_ref.clone(),
        fields,
        composite_key: definition.composite_key,
    })
}
