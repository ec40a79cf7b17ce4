//! Database configuration scaffolding: the `configurable` declarations read by
//! the generated client and a sample values file to fill them in.

use minijinja::context;
use tracing::{debug, error};

use crate::codegen::snippets;
use crate::datasource::{ConnectionDefaults, Datasource};
use crate::error::PersistGenError;
use crate::syntax::{Comment, Import, ModuleMember, SourceFile};

/// Sample connection values for one module, kept in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSample {
    /// Table path, one entry per dotted segment of the module name
    module: Vec<String>,
    values: toml::Table,
}

impl ConfigSample {
    pub fn new(module_name: &str) -> Self {
        Self {
            module: module_name.split('.').map(str::to_string).collect(),
            values: toml::Table::new(),
        }
    }

    pub fn string(mut self, key: &str, value: &str) -> Self {
        self.values
            .insert(key.to_string(), toml::Value::String(value.to_string()));
        self
    }

    pub fn integer(mut self, key: &str, value: i64) -> Self {
        self.values.insert(key.to_string(), toml::Value::Integer(value));
        self
    }

    pub fn keys(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    pub fn value(&self, key: &str) -> Option<&toml::Value> {
        self.values.get(key)
    }

    /// Whole document with the values nested under the module table
    pub fn to_table(&self) -> toml::Table {
        let mut table = self.values.clone();
        for segment in self.module.iter().rev() {
            let mut parent = toml::Table::new();
            parent.insert(segment.clone(), toml::Value::Table(table));
            table = parent;
        }
        table
    }

    pub fn render(&self) -> Result<String, PersistGenError> {
        Ok(toml::to_string(&self.to_table())?)
    }
}

/// Generate the `configurable` declarations for a datasource
pub fn generate_config_decl(datasource: Datasource) -> Result<SourceFile, PersistGenError> {
    let policy = datasource.policy();
    let mut builder = SourceFile::builder();
    builder.import(
        Import::new("ballerinax", policy.connector_module)
            .with_leading_comment(Comment::autogenerated(None)),
    );

    let names: &[&str] = if policy.is_bridged() {
        &[
            snippets::CONFIG_URL,
            snippets::CONFIG_USER,
            snippets::CONFIG_PASSWORD,
        ]
    } else {
        &[
            snippets::CONFIG_PORT,
            snippets::CONFIG_HOST,
            snippets::CONFIG_USER,
            snippets::CONFIG_DATABASE,
            snippets::CONFIG_PASSWORD,
        ]
    };
    for name in names {
        builder.member(ModuleMember::Snippet(snippets::member(name, context! {})?));
    }
    builder.member(ModuleMember::Snippet(snippets::member(
        snippets::CONFIG_OPTIONS,
        context! { prefix => policy.connector_prefix() },
    )?));
    if policy.custom_schema {
        builder.member(ModuleMember::Snippet(snippets::member(
            snippets::CONFIG_DEFAULT_SCHEMA,
            context! {},
        )?));
    }

    debug!(datasource = %datasource, "Generated configurable declarations");
    Ok(builder.finish())
}

/// Generate the sample values file for a module. Credentials are always blank.
pub fn generate_config_sample(
    module_name: &str,
    datasource: Datasource,
) -> Result<ConfigSample, PersistGenError> {
    if module_name.trim().is_empty() {
        error!("Module name for config sample is empty");
        return Err(PersistGenError::Config(
            "Module name is required for the config sample".to_string(),
        ));
    }

    let doc = ConfigSample::new(module_name);
    let doc = match datasource.policy().defaults {
        ConnectionDefaults::Url { url } => doc
            .string("url", url)
            .string("user", "")
            .string("password", ""),
        ConnectionDefaults::Network { host, port, user } => doc
            .string("host", host)
            .integer("port", i64::from(port))
            .string("user", user)
            .string("password", "")
            .string("database", ""),
    };

    debug!(module = module_name, datasource = %datasource, "Generated config sample");
    Ok(doc)
}
