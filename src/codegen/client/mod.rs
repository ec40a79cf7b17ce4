//! Client generation
//!
//! One algorithm assembles every client; what differs between the live
//! database client and the in-memory test client is captured by
//! [`ClientSyntax`].

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::datasource::{Datasource, DatasourcePolicy};
use crate::error::PersistGenError;
use crate::schema::{Entity, Module};
use crate::syntax::{
    ClassDef, ClassMember, Comment, ConstDecl, Function, Import, ModuleMember, Qualifier,
    SourceFile,
};

mod db;
mod mock;
pub(crate) mod resources;

pub use db::DbClientSyntax;
pub use mock::{MockClientSyntax, MOCK_CLIENT_NAME};

/// Default name of the generated client class
pub const CLIENT_NAME: &str = "Client";

/// Datasource-specific pieces of a generated client
pub trait ClientSyntax {
    /// Name of the generated client class
    fn client_name(&self) -> &str;

    fn policy(&self) -> &'static DatasourcePolicy;

    /// `init` opening the underlying connection
    fn init_function(&self, entities: &[&Entity]) -> Result<Function, PersistGenError>;

    fn imports(&self) -> Vec<Import> {
        let policy = self.policy();
        let mut connectors = vec![
            Import::new("ballerinax", policy.connector_module),
            Import::new("ballerinax", policy.driver_module).with_prefix("_"),
            Import::new("ballerinax", "persist.sql").with_prefix("psql"),
        ];
        connectors.sort_by(|a, b| a.module.cmp(&b.module));

        let mut imports = vec![
            Import::new("ballerina", "jballerina.java")
                .with_leading_comment(Comment::autogenerated(Some("model"))),
            Import::new("ballerina", "persist"),
            Import::new("ballerina", "sql"),
        ];
        imports.extend(connectors);
        imports
    }

    /// One constant per entity naming its resource
    fn constants(&self, entities: &[&Entity]) -> Vec<ModuleMember> {
        entities
            .iter()
            .map(|e| {
                ModuleMember::Const(ConstDecl {
                    name: e.constant_name(),
                    value: e.resource_name(),
                })
            })
            .collect()
    }

    fn fields(&self, entities: &[&Entity]) -> Result<Vec<ClassMember>, PersistGenError> {
        resources::fields(self.policy(), entities)
    }

    /// Read-collection, read-by-key, create, update and delete for one entity
    fn crud_functions(&self, entity: &Entity) -> Result<Vec<Function>, PersistGenError> {
        resources::crud_functions(self.policy(), entity)
    }

    fn query_native_sql_function(&self) -> Result<Function, PersistGenError> {
        resources::query_native_sql(self.policy())
    }

    fn execute_native_sql_function(&self) -> Result<Function, PersistGenError> {
        resources::execute_native_sql(self.policy())
    }

    fn close_function(&self) -> Result<Function, PersistGenError> {
        resources::close()
    }
}

/// An entity left out of the client, with the fields that caused it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntity {
    pub entity: String,
    pub unsupported_fields: Vec<String>,
}

/// Generated client plus the entities it does not cover
#[derive(Debug, Clone)]
pub struct ClientArtifact {
    pub source: SourceFile,
    pub skipped: Vec<SkippedEntity>,
}

/// Generate the database client for a module
pub fn generate_client(
    module: &Module,
    datasource: Datasource,
    client_name: &str,
) -> Result<ClientArtifact, PersistGenError> {
    generate_with(&DbClientSyntax::new(datasource, client_name), module)
}

/// Generate the in-memory test client for a module
pub fn generate_mock_client(module: &Module) -> Result<ClientArtifact, PersistGenError> {
    generate_with(&MockClientSyntax, module)
}

/// Assemble a client from any [`ClientSyntax`]
pub fn generate_with(
    syntax: &dyn ClientSyntax,
    module: &Module,
) -> Result<ClientArtifact, PersistGenError> {
    if module.is_empty() {
        return Err(PersistGenError::EmptySchema {
            module: module.name.clone(),
        });
    }

    info!(
        module = ?module.name,
        datasource = syntax.policy().identifier,
        client = syntax.client_name(),
        "Generating client"
    );

    let mut entities: Vec<&Entity> = Vec::new();
    let mut skipped = Vec::new();
    for entity in module.entities() {
        if entity.contains_unsupported_types() {
            let unsupported_fields: Vec<String> = entity
                .unsupported_fields()
                .iter()
                .map(|f| f.name.clone())
                .collect();
            warn!(
                entity = ?entity.name,
                fields = ?unsupported_fields,
                "Skipping entity with unsupported field types"
            );
            skipped.push(SkippedEntity {
                entity: entity.name.clone(),
                unsupported_fields,
            });
            continue;
        }
        resources::check_key(entity)?;
        entities.push(entity);
    }
    check_name_collisions(&entities)?;

    let mut builder = SourceFile::builder();
    for import in syntax.imports() {
        builder.import(import);
    }
    for constant in syntax.constants(&entities) {
        builder.member(constant);
    }

    let mut client = ClassDef::new(
        syntax.client_name(),
        &[Qualifier::Public, Qualifier::Isolated, Qualifier::Client],
    );
    for field in syntax.fields(&entities)? {
        client.push_member(field);
    }
    client.push_member(ClassMember::Function(syntax.init_function(&entities)?));

    for entity in &entities {
        for function in syntax.crud_functions(entity)? {
            client.push_member(ClassMember::Function(function));
        }
        debug!(entity = ?entity.name, resource = ?entity.resource_name(), "Generated resource functions");
    }

    client.push_member(ClassMember::Function(syntax.query_native_sql_function()?));
    client.push_member(ClassMember::Function(syntax.execute_native_sql_function()?));
    client.push_member(ClassMember::Function(syntax.close_function()?));
    builder.member(ModuleMember::Class(client));

    info!(
        entities = entities.len(),
        skipped = skipped.len(),
        "Client generation complete"
    );

    Ok(ClientArtifact {
        source: builder.finish(),
        skipped,
    })
}

/// Entities sharing a resource path or constant would emit duplicate members
fn check_name_collisions(entities: &[&Entity]) -> Result<(), PersistGenError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for entity in entities {
        for name in [entity.resource_name(), entity.constant_name()] {
            if let Some(first) = seen.get(&name) {
                error!(first = ?first, second = ?entity.name, name = ?name, "Entity name collision");
                return Err(PersistGenError::NameCollision {
                    first: first.to_string(),
                    second: entity.name.clone(),
                    name,
                });
            }
            seen.insert(name, &entity.name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntityField, FieldType};
    use crate::syntax::{validate, FunctionKind, PathSegment};

    fn employee() -> Entity {
        Entity::new("Employee")
            .with_field(EntityField::new("empNo", FieldType::String).key())
            .with_field(EntityField::new("firstName", FieldType::String))
            .with_field(EntityField::new("hireDate", FieldType::Date))
    }

    fn department() -> Entity {
        Entity::new("Department")
            .with_field(EntityField::new("deptNo", FieldType::Int).key())
            .with_field(EntityField::new("name", FieldType::String))
    }

    fn blob() -> Entity {
        Entity::new("Blob")
            .with_field(EntityField::new("id", FieldType::Int).key())
            .with_field(EntityField::new("data", FieldType::Other("json".to_string())).unsupported())
    }

    fn module() -> Module {
        Module::new("hr")
            .with_entity(employee())
            .with_entity(blob())
            .with_entity(department())
    }

    fn client(artifact: &ClientArtifact) -> &ClassDef {
        artifact.source.class(CLIENT_NAME).expect("client class")
    }

    fn count(class: &ClassDef, name: &str) -> usize {
        class.functions().filter(|f| f.name() == name).count()
    }

    #[test]
    fn test_empty_module_fails() {
        for ds in Datasource::ALL {
            let err = generate_client(&Module::new("empty"), ds, CLIENT_NAME).unwrap_err();
            assert!(matches!(err, PersistGenError::EmptySchema { ref module } if module == "empty"));
        }
        assert!(matches!(
            generate_mock_client(&Module::new("empty")),
            Err(PersistGenError::EmptySchema { .. })
        ));
    }

    #[test]
    fn test_function_counts_for_every_datasource() {
        for ds in Datasource::ALL {
            let artifact = generate_client(&module(), ds, CLIENT_NAME).unwrap();
            let class = client(&artifact);

            assert_eq!(count(class, "init"), 1);
            assert_eq!(count(class, "queryNativeSQL"), 1);
            assert_eq!(count(class, "executeNativeSQL"), 1);
            assert_eq!(count(class, "close"), 1);
            assert_eq!(class.functions().filter(|f| f.is_resource()).count(), 2 * 5);
            assert_eq!(class.functions().count(), 2 * 5 + 4);
        }
    }

    #[test]
    fn test_function_order() {
        let artifact = generate_client(&module(), Datasource::MySql, CLIENT_NAME).unwrap();
        let names: Vec<_> = client(&artifact).functions().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "init", "get", "get", "post", "put", "delete", "get", "get", "post", "put",
                "delete", "queryNativeSQL", "executeNativeSQL", "close"
            ]
        );

        let resources: Vec<_> = client(&artifact)
            .functions()
            .filter_map(|f| match &f.kind {
                FunctionKind::Resource { path, .. } => match &path[0] {
                    PathSegment::Name(name) => Some(name.as_str()),
                    PathSegment::Param { .. } => None,
                },
                FunctionKind::Named(_) => None,
            })
            .collect();
        assert_eq!(&resources[..5], &["employees"; 5]);
        assert_eq!(&resources[5..], &["departments"; 5]);
    }

    #[test]
    fn test_unsupported_entity_is_absent() {
        let artifact = generate_client(&module(), Datasource::PostgreSql, CLIENT_NAME).unwrap();
        assert_eq!(
            artifact.skipped,
            vec![SkippedEntity {
                entity: "Blob".to_string(),
                unsupported_fields: vec!["data".to_string()],
            }]
        );

        let text = artifact.source.to_string();
        assert!(!text.contains("blobs"));
        assert!(!text.contains("BLOB"));
        assert!(!text.contains("Blob"));
    }

    #[test]
    fn test_all_entities_unsupported_still_generates_utilities() {
        let module = Module::new("odd").with_entity(blob());
        let artifact = generate_client(&module, Datasource::MySql, CLIENT_NAME).unwrap();
        let class = client(&artifact);
        assert_eq!(class.functions().count(), 4);
        assert!(validate(&artifact.source.to_string()).is_empty());
    }

    #[test]
    fn test_missing_key_fails() {
        let module = Module::new("m").with_entity(
            Entity::new("Loose").with_field(EntityField::new("a", FieldType::Int)),
        );
        assert!(matches!(
            generate_client(&module, Datasource::MySql, CLIENT_NAME),
            Err(PersistGenError::MissingKey { .. })
        ));
    }

    #[test]
    fn test_rendered_client_is_well_formed() {
        for ds in Datasource::ALL {
            let artifact = generate_client(&module(), ds, CLIENT_NAME).unwrap();
            let text = artifact.source.to_string();
            assert_eq!(validate(&text), vec![], "{ds}:\n{text}");
        }
    }

    #[test]
    fn test_deterministic_output() {
        for ds in Datasource::ALL {
            let first = generate_client(&module(), ds, CLIENT_NAME).unwrap();
            let second = generate_client(&module(), ds, CLIENT_NAME).unwrap();
            assert_eq!(first.source.to_string(), second.source.to_string());
        }
    }

    #[test]
    fn test_mysql_client_text() {
        let module = Module::new("hr").with_entity(employee());
        let text = generate_client(&module, Datasource::MySql, CLIENT_NAME)
            .unwrap()
            .source
            .to_string();

        assert!(text.starts_with(
            "// AUTO-GENERATED FILE. DO NOT MODIFY.\n\n\
             // This file is an auto-generated file by Ballerina persistence layer for model.\n\
             // It should not be modified by hand.\n\n\
             import ballerina/jballerina.java;\n\
             import ballerina/persist;\n\
             import ballerina/sql;\n\
             import ballerinax/mysql;\n\
             import ballerinax/mysql.driver as _;\n\
             import ballerinax/persist.sql as psql;\n\n\
             const EMPLOYEE = \"employees\";\n\n\
             public isolated client class Client {\n    \
             *persist:AbstractPersistClient;\n\n    \
             private final mysql:Client dbClient;\n"
        ));
        assert!(text.contains(
            "    isolated resource function get employees(EmployeeTargetType targetType = <>, sql:ParameterizedQuery whereClause = ``, sql:ParameterizedQuery orderByClause = ``, sql:ParameterizedQuery limitClause = ``, sql:ParameterizedQuery groupByClause = ``) returns stream<targetType, persist:Error?> = @java:Method {\n        \
             'class: \"io.ballerina.stdlib.persist.sql.datastore.MySQLProcessor\",\n        \
             name: \"query\"\n    \
             } external;\n"
        ));
        assert!(text.contains(
            "    isolated resource function post employees(EmployeeInsert[] data) returns string[]|persist:Error {\n        \
             psql:SQLClient sqlClient;\n        \
             lock {\n            \
             sqlClient = self.persistClients.get(EMPLOYEE);\n        \
             }\n        \
             _ = check sqlClient.runBatchInsertQuery(data);\n        \
             return from EmployeeInsert inserted in data\n            \
             select inserted.empNo;\n    \
             }\n"
        ));
        assert!(text.contains(
            "    isolated resource function delete employees/[string empNo]() returns Employee|persist:Error {\n        \
             Employee result = check self->/employees/[empNo].get();\n"
        ));
        assert!(text.contains(
            "    remote isolated function queryNativeSQL(sql:ParameterizedQuery sqlQuery, typedesc<record {}> rowType = <>) returns stream<rowType, persist:Error?> = @java:Method {\n"
        ));
        assert!(text.ends_with(
            "    public isolated function close() returns persist:Error? {\n        \
             error? result = self.dbClient.close();\n        \
             if result is error {\n            \
             return <persist:Error>error(result.message());\n        \
             }\n        \
             return result;\n    \
             }\n}\n"
        ));
    }

    #[test]
    fn test_h2_client_imports_jdbc() {
        let artifact = generate_client(&module(), Datasource::H2, CLIENT_NAME).unwrap();
        let modules: Vec<_> = artifact
            .source
            .imports()
            .iter()
            .map(|i| format!("{}/{}", i.org, i.module))
            .collect();
        assert_eq!(
            modules,
            vec![
                "ballerina/jballerina.java",
                "ballerina/persist",
                "ballerina/sql",
                "ballerinax/h2.driver",
                "ballerinax/java.jdbc",
                "ballerinax/persist.sql",
            ]
        );
        assert!(artifact
            .source
            .to_string()
            .contains("private final jdbc:Client dbClient;"));
    }

    #[test]
    fn test_mock_client() {
        let artifact = generate_mock_client(&module()).unwrap();
        let class = artifact.source.class(MOCK_CLIENT_NAME).expect("mock client");
        assert_eq!(class.functions().count(), 2 * 5 + 4);

        let init = class.functions().find(|f| f.name() == "init").unwrap();
        let params: Vec<_> = init.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(params, vec!["url", "user", "password", "connectionOptions"]);

        let text = artifact.source.to_string();
        assert!(text.contains("public isolated client class H2Client {"));
        assert!(text.contains("H2Processor"));
        assert!(text.contains("psql:H2_SPECIFICS"));
        assert!(validate(&text).is_empty());
    }

    #[test]
    fn test_colliding_entity_names_fail() {
        let item = |name: &str| {
            Entity::new(name).with_field(EntityField::new("id", FieldType::Int).key())
        };
        let module = Module::new("shop").with_entity(item("Item")).with_entity(item("ITEM"));

        let err = generate_client(&module, Datasource::MySql, CLIENT_NAME).unwrap_err();
        assert!(matches!(
            err,
            PersistGenError::NameCollision { ref first, ref second, ref name }
                if first == "Item" && second == "ITEM" && name == "items"
        ));
        assert!(matches!(
            generate_mock_client(&module),
            Err(PersistGenError::NameCollision { .. })
        ));

        // a skipped entity cannot collide
        let module = Module::new("shop").with_entity(item("Item")).with_entity(
            item("ITEM").with_field(
                EntityField::new("data", FieldType::Other("json".to_string())).unsupported(),
            ),
        );
        let artifact = generate_client(&module, Datasource::MySql, CLIENT_NAME).unwrap();
        assert_eq!(artifact.skipped.len(), 1);
    }

    #[test]
    fn test_reserved_word_field_names_are_quoted() {
        let module = Module::new("shop").with_entity(
            Entity::new("Item")
                .with_field(EntityField::new("type", FieldType::String).key())
                .with_field(EntityField::new("order", FieldType::Int)),
        );
        for ds in Datasource::ALL {
            let text = generate_client(&module, ds, CLIENT_NAME).unwrap().source.to_string();
            assert!(text.contains("resource function get items/[string 'type]("), "{ds}");
            assert!(text.contains("inserted.'type"), "{ds}");
            assert!(text.contains("'type: {columnName: \"type\"}"), "{ds}");
            assert!(text.contains("'order: {columnName: \"order\"}"), "{ds}");
            assert!(!text.contains(" type]"), "{ds}");
            assert!(validate(&text).is_empty(), "{ds}");
        }
    }
}
