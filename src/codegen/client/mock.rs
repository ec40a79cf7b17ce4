use crate::codegen::client::{resources, ClientSyntax};
use crate::datasource::{Datasource, DatasourcePolicy};
use crate::error::PersistGenError;
use crate::schema::Entity;
use crate::syntax::{Function, Param, TypeDesc};

/// Name of the in-memory test client class
pub const MOCK_CLIENT_NAME: &str = "H2Client";

/// In-memory H2 client whose connection parameters are passed to `init`
#[derive(Debug, Clone, Copy, Default)]
pub struct MockClientSyntax;

impl ClientSyntax for MockClientSyntax {
    fn client_name(&self) -> &str {
        MOCK_CLIENT_NAME
    }

    fn policy(&self) -> &'static DatasourcePolicy {
        Datasource::H2.policy()
    }

    fn init_function(&self, entities: &[&Entity]) -> Result<Function, PersistGenError> {
        let string = || TypeDesc::named("string");
        Ok(Function::new(
            "init",
            resources::init_qualifiers(),
            Some(resources::persist_error().optional()),
        )
        .with_params([
            Param::new(string(), "url"),
            Param::new(string().optional(), "user").with_default("()"),
            Param::new(string().optional(), "password").with_default("()"),
            Param::new(TypeDesc::qualified("jdbc", "Options").optional(), "connectionOptions")
                .with_default("{}"),
        ])
        .with_statements(resources::init_body(self.policy(), entities)?))
    }
}
