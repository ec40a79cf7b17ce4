use crate::codegen::client::{resources, ClientSyntax};
use crate::datasource::{Datasource, DatasourcePolicy};
use crate::error::PersistGenError;
use crate::schema::Entity;
use crate::syntax::Function;

/// Client backed by a configured database connection
#[derive(Debug, Clone)]
pub struct DbClientSyntax {
    datasource: Datasource,
    client_name: String,
}

impl DbClientSyntax {
    pub fn new(datasource: Datasource, client_name: impl Into<String>) -> Self {
        Self {
            datasource,
            client_name: client_name.into(),
        }
    }
}

impl ClientSyntax for DbClientSyntax {
    fn client_name(&self) -> &str {
        &self.client_name
    }

    fn policy(&self) -> &'static DatasourcePolicy {
        self.datasource.policy()
    }

    /// Connection parameters come from the configurable declarations
    fn init_function(&self, entities: &[&Entity]) -> Result<Function, PersistGenError> {
        Ok(Function::new(
            "init",
            resources::init_qualifiers(),
            Some(resources::persist_error().optional()),
        )
        .with_statements(resources::init_body(self.policy(), entities)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntityField, FieldType};

    #[test]
    fn test_init_has_no_params() {
        let entity = Entity::new("E").with_field(EntityField::new("id", FieldType::Int).key());
        let syntax = DbClientSyntax::new(Datasource::MsSql, "Client");
        let init = syntax.init_function(&[&entity]).unwrap();
        assert!(init.params.is_empty());
        assert_eq!(init.returns.as_ref().unwrap().to_string(), "persist:Error?");
        assert_eq!(init.statements().len(), 4);
    }
}
