//! Client members shared by every client flavour: class fields, the five
//! resource functions per entity, native SQL access and `close`.

use minijinja::{context, Value};

use crate::codegen::{snippets, types::type_desc};
use crate::datasource::{Access, DatasourcePolicy};
use crate::error::PersistGenError;
use crate::schema::{Cardinality, Entity};
use crate::syntax::{
    identifier, string_literal, ClassMember, Function, Param, PathSegment, Qualifier, Snippet,
    TypeDesc,
};

const RESOURCE: &[Qualifier] = &[Qualifier::Isolated, Qualifier::Resource];
const REMOTE: &[Qualifier] = &[Qualifier::Remote, Qualifier::Isolated];
const PUBLIC: &[Qualifier] = &[Qualifier::Public, Qualifier::Isolated];

pub(crate) fn persist_error() -> TypeDesc {
    TypeDesc::qualified("persist", "Error")
}

fn parameterized_query() -> TypeDesc {
    TypeDesc::qualified("sql", "ParameterizedQuery")
}

/// How an entity's key appears in paths, arguments and return types
struct KeyShape {
    path: Vec<PathSegment>,
    /// Argument passed to the runtime, `id` or `{"a": a, "b": b}`
    argument: String,
    /// Client path suffix, `[id]` or `[a]/[b]`
    client_path: String,
    ty: TypeDesc,
    /// Projection of an inserted record onto its key
    inserted: String,
}

fn key_shape(entity: &Entity) -> Result<KeyShape, PersistGenError> {
    let keys = entity.key_fields();
    let path = keys
        .iter()
        .map(|k| PathSegment::Param {
            ty: type_desc(&k.field_type),
            name: k.name.clone(),
        })
        .collect();
    let client_path = keys
        .iter()
        .map(|k| format!("[{}]", identifier(&k.name)))
        .collect::<Vec<_>>()
        .join("/");

    match keys.as_slice() {
        [] => Err(PersistGenError::MissingKey {
            entity: entity.name.clone(),
        }),
        [key] => Ok(KeyShape {
            path,
            argument: identifier(&key.name).into_owned(),
            client_path,
            ty: type_desc(&key.field_type),
            inserted: format!("inserted.{}", identifier(&key.name)),
        }),
        keys => Ok(KeyShape {
            path,
            argument: format!(
                "{{{}}}",
                keys.iter()
                    .map(|k| format!("{}: {}", string_literal(&k.name), identifier(&k.name)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            client_path,
            ty: TypeDesc::Tuple(keys.iter().map(|k| type_desc(&k.field_type)).collect()),
            inserted: format!(
                "[{}]",
                keys.iter()
                    .map(|k| format!("inserted.{}", identifier(&k.name)))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }),
    }
}

/// Fail early for entities whose key cannot be addressed
pub(crate) fn check_key(entity: &Entity) -> Result<(), PersistGenError> {
    key_shape(entity).map(|_| ())
}

fn external(policy: &DatasourcePolicy, method: Option<&str>) -> Result<Snippet, PersistGenError> {
    snippets::annotation(
        snippets::CLIENT_EXTERNAL,
        context! { processor => policy.processor_class(), method => method },
    )
}

/// `*persist:AbstractPersistClient`, the connection, per-entity clients and metadata
pub(crate) fn fields(
    policy: &DatasourcePolicy,
    entities: &[&Entity],
) -> Result<Vec<ClassMember>, PersistGenError> {
    let client_type = format!("{}:Client", policy.connector_prefix());
    let metadata: Vec<Value> = entities.iter().map(|e| metadata_context(e, entities)).collect();

    Ok(vec![
        ClassMember::Field(snippets::member(snippets::CLIENT_ABSTRACT, context! {})?),
        ClassMember::Field(snippets::member(
            snippets::CLIENT_DB_FIELD,
            context! { client_type => client_type },
        )?),
        ClassMember::Field(snippets::member(
            snippets::CLIENT_PERSIST_CLIENTS,
            context! {},
        )?),
        ClassMember::Field(snippets::member(
            snippets::CLIENT_METADATA,
            context! { entities => metadata },
        )?),
    ])
}

fn metadata_context(entity: &Entity, entities: &[&Entity]) -> Value {
    let mut fields: Vec<Value> = entity
        .fields
        .iter()
        .map(|f| {
            context! {
                key => identifier(&f.name).into_owned(),
                value => format!("{{columnName: {}}}", string_literal(&f.name)),
            }
        })
        .collect();

    let mut joins = Vec::new();
    for relation in &entity.relations {
        let Some(target) = entities.iter().find(|e| e.name == relation.target) else {
            continue;
        };

        for field in &target.fields {
            fields.push(context! {
                key => string_literal(&format!("{}.{}", relation.name, field.name)),
                value => format!(
                    "{{relation: {{entityName: {}, refField: {}}}}}",
                    string_literal(&relation.name),
                    string_literal(&field.name)
                ),
            });
        }

        let (ref_columns, join_columns): (Vec<String>, Vec<String>) = relation
            .foreign_keys
            .iter()
            .map(|fk| {
                let column = string_literal(&fk.column);
                let references = string_literal(&fk.references);
                if relation.owner {
                    (references, column)
                } else {
                    (column, references)
                }
            })
            .unzip();

        joins.push(context! {
            key => identifier(&relation.name).into_owned(),
            name => &relation.name,
            entity => &target.name,
            ref_table => target.table_name(),
            ref_columns => ref_columns,
            join_columns => join_columns,
            kind => match relation.cardinality {
                Cardinality::One => "ONE_TO_ONE",
                Cardinality::Many => "ONE_TO_MANY",
            },
        });
    }

    let keys: Vec<String> = entity
        .key_fields()
        .iter()
        .map(|k| string_literal(&k.name))
        .collect();

    context! {
        constant => entity.constant_name(),
        name => &entity.name,
        table => entity.table_name(),
        fields => fields,
        keys => keys,
        joins => joins,
    }
}

/// Statements opening the connection and registering one SQL client per entity
pub(crate) fn init_body(
    policy: &DatasourcePolicy,
    entities: &[&Entity],
) -> Result<Vec<Snippet>, PersistGenError> {
    let connect_args = match policy.access {
        Access::Direct => {
            "host = host, user = user, password = password, database = database, port = port, options = connectionOptions"
        }
        Access::Bridged => "url = url, user = user, password = password, options = connectionOptions",
    };
    let constants: Vec<String> = entities.iter().map(|e| e.constant_name()).collect();

    snippets::statements(
        snippets::CLIENT_INIT,
        context! {
            client_type => format!("{}:Client", policy.connector_prefix()),
            connect_args => connect_args,
            constants => constants,
            specifics => policy.sql_specifics,
            custom_schema => policy.custom_schema,
        },
    )
}

/// Read-collection, read-by-key, create, update and delete, in that order
pub(crate) fn crud_functions(
    policy: &DatasourcePolicy,
    entity: &Entity,
) -> Result<Vec<Function>, PersistGenError> {
    let key = key_shape(entity)?;
    let resource = entity.resource_name();
    let constant = entity.constant_name();
    let record = TypeDesc::named(entity.name.clone());

    let collection_path = vec![PathSegment::Name(resource.clone())];
    let mut key_path = collection_path.clone();
    key_path.extend(key.path.iter().cloned());

    let target_type = || {
        Param::new(TypeDesc::named(format!("{}TargetType", entity.name)), "targetType")
            .with_default("<>")
    };
    let target = || TypeDesc::named("targetType");

    let get_all = Function::resource(
        "get",
        collection_path.clone(),
        RESOURCE,
        Some(TypeDesc::Stream(
            Box::new(target()),
            Box::new(persist_error().optional()),
        )),
    )
    .with_param(target_type())
    .with_params(
        ["whereClause", "orderByClause", "limitClause", "groupByClause"]
            .into_iter()
            .map(|name| Param::new(parameterized_query(), name).with_default("``")),
    )
    .external(external(policy, Some("query"))?);

    let get_one = Function::resource(
        "get",
        key_path.clone(),
        RESOURCE,
        Some(target().or(persist_error())),
    )
    .with_param(target_type())
    .external(external(policy, Some("queryOne"))?);

    let insert_type = format!("{}Insert", entity.name);
    let post = Function::resource(
        "post",
        collection_path,
        RESOURCE,
        Some(key.ty.clone().array().or(persist_error())),
    )
    .with_param(Param::new(TypeDesc::named(insert_type.clone()).array(), "data"))
    .with_statements(snippets::statements(
        snippets::CLIENT_POST,
        context! {
            constant => &constant,
            insert_type => insert_type,
            inserted_keys => &key.inserted,
        },
    )?);

    let put = Function::resource(
        "put",
        key_path.clone(),
        RESOURCE,
        Some(record.clone().or(persist_error())),
    )
    .with_param(Param::new(
        TypeDesc::named(format!("{}Update", entity.name)),
        "value",
    ))
    .with_statements(snippets::statements(
        snippets::CLIENT_PUT,
        context! {
            constant => &constant,
            resource => &resource,
            key_arg => &key.argument,
            key_path => &key.client_path,
        },
    )?);

    let delete = Function::resource("delete", key_path, RESOURCE, Some(record.or(persist_error())))
        .with_statements(snippets::statements(
            snippets::CLIENT_DELETE,
            context! {
                entity => &entity.name,
                constant => &constant,
                resource => &resource,
                key_arg => &key.argument,
                key_path => &key.client_path,
            },
        )?);

    Ok(vec![get_all, get_one, post, put, delete])
}

pub(crate) fn query_native_sql(policy: &DatasourcePolicy) -> Result<Function, PersistGenError> {
    Ok(Function::new(
        "queryNativeSQL",
        REMOTE,
        Some(TypeDesc::Stream(
            Box::new(TypeDesc::named("rowType")),
            Box::new(persist_error().optional()),
        )),
    )
    .with_param(Param::new(parameterized_query(), "sqlQuery"))
    .with_param(
        Param::new(TypeDesc::Typedesc(Box::new(TypeDesc::OpenRecord)), "rowType").with_default("<>"),
    )
    .external(external(policy, None)?))
}

pub(crate) fn execute_native_sql(policy: &DatasourcePolicy) -> Result<Function, PersistGenError> {
    Ok(Function::new(
        "executeNativeSQL",
        REMOTE,
        Some(TypeDesc::qualified("psql", "ExecutionResult").or(persist_error())),
    )
    .with_param(Param::new(parameterized_query(), "sqlQuery"))
    .external(external(policy, None)?))
}

pub(crate) fn close() -> Result<Function, PersistGenError> {
    Ok(
        Function::new("close", PUBLIC, Some(persist_error().optional()))
            .with_statements(snippets::statements(snippets::CLIENT_CLOSE, context! {})?),
    )
}

/// Qualifiers of `init`
pub(crate) fn init_qualifiers() -> &'static [Qualifier] {
    PUBLIC
}
