//! Data type generation
//!
//! Record types for every entity: the stored record, its optionalized and
//! relation-carrying projections, the target typedesc, and insert/update
//! payloads.

use tracing::{debug, info};

use crate::schema::{Cardinality, Entity, EntityField, FieldType, Module};
use crate::syntax::{
    Comment, EnumDecl, Import, ModuleMember, RecordField, SourceFile, TypeBody, TypeDefinition,
    TypeDesc,
};

/// Generate the data type file for a module.
///
/// Returns `None` for a module without entities.
pub fn generate_types(module: &Module) -> Option<SourceFile> {
    if module.is_empty() {
        debug!(module = ?module.name, "No entities, skipping type generation");
        return None;
    }

    let mut builder = SourceFile::builder();
    let comment = Comment::autogenerated(None);

    let uses_time = module
        .entities()
        .iter()
        .flat_map(|e| &e.fields)
        .any(|f| f.field_type.is_time());
    if uses_time {
        builder.import(Import::new("ballerina", "time").with_leading_comment(comment));
    } else {
        builder.leading_comment(comment);
    }

    for enum_type in &module.enums {
        builder.member(ModuleMember::Enum(EnumDecl {
            name: enum_type.name.clone(),
            members: enum_type.members.clone(),
        }));
    }

    for entity in module.entities() {
        for definition in entity_types(entity, module) {
            builder.member(ModuleMember::Type(definition));
        }
        debug!(entity = ?entity.name, "Generated entity types");
    }

    info!(
        module = ?module.name,
        entities = module.entities().len(),
        enums = module.enums.len(),
        "Type generation complete"
    );
    Some(builder.finish())
}

/// Map a field type to its type descriptor
pub(crate) fn type_desc(field_type: &FieldType) -> TypeDesc {
    match field_type {
        FieldType::Int => TypeDesc::named("int"),
        FieldType::String => TypeDesc::named("string"),
        FieldType::Boolean => TypeDesc::named("boolean"),
        FieldType::Float => TypeDesc::named("float"),
        FieldType::Decimal => TypeDesc::named("decimal"),
        FieldType::ByteArray => TypeDesc::named("byte").array(),
        FieldType::Date => TypeDesc::qualified("time", "Date"),
        FieldType::TimeOfDay => TypeDesc::qualified("time", "TimeOfDay"),
        FieldType::Utc => TypeDesc::qualified("time", "Utc"),
        FieldType::Civil => TypeDesc::qualified("time", "Civil"),
        FieldType::Enum(name) | FieldType::Other(name) => TypeDesc::named(name.clone()),
    }
}

fn field_type_desc(field: &EntityField) -> TypeDesc {
    let ty = type_desc(&field.field_type);
    if field.is_nullable {
        ty.optional()
    } else {
        ty
    }
}

fn entity_types(entity: &Entity, module: &Module) -> Vec<TypeDefinition> {
    let name = &entity.name;
    let optionalized = format!("{name}Optionalized");
    let mut definitions = Vec::with_capacity(6);

    definitions.push(TypeDefinition {
        name: name.clone(),
        body: TypeBody::Record(
            entity
                .fields
                .iter()
                .map(|f| RecordField::Field {
                    readonly: f.is_key,
                    ty: field_type_desc(f),
                    name: f.name.clone(),
                    optional: false,
                })
                .collect(),
        ),
    });

    definitions.push(TypeDefinition {
        name: optionalized.clone(),
        body: TypeBody::Record(entity.fields.iter().map(optional_field).collect()),
    });

    let relation_fields: Vec<RecordField> = entity
        .relations
        .iter()
        .filter(|r| module.entity(&r.target).is_some())
        .map(|r| {
            let target = TypeDesc::named(format!("{}Optionalized", r.target));
            RecordField::Field {
                readonly: false,
                ty: match r.cardinality {
                    Cardinality::One => target,
                    Cardinality::Many => target.array(),
                },
                name: r.name.clone(),
                optional: true,
            }
        })
        .collect();

    let target = if relation_fields.is_empty() {
        optionalized.clone()
    } else {
        let with_relations = format!("{name}WithRelations");
        let mut fields = vec![RecordField::Inclusion(TypeDesc::named(optionalized))];
        fields.extend(relation_fields);
        definitions.push(TypeDefinition {
            name: with_relations.clone(),
            body: TypeBody::Record(fields),
        });
        with_relations
    };

    definitions.push(TypeDefinition {
        name: format!("{name}TargetType"),
        body: TypeBody::Alias(TypeDesc::Typedesc(Box::new(TypeDesc::named(target)))),
    });

    definitions.push(TypeDefinition {
        name: format!("{name}Insert"),
        body: TypeBody::Alias(TypeDesc::named(name.clone())),
    });

    definitions.push(TypeDefinition {
        name: format!("{name}Update"),
        body: TypeBody::Record(entity.non_key_fields().into_iter().map(optional_field).collect()),
    });

    definitions
}

fn optional_field(field: &EntityField) -> RecordField {
    RecordField::Field {
        readonly: false,
        ty: field_type_desc(field),
        name: field.name.clone(),
        optional: true,
    }
}
