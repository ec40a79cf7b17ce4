use thiserror::Error;

/// persistgen errors
#[derive(Error, Debug)]
pub enum PersistGenError {
    #[error("Module '{module}' does not contain any entities")]
    EmptySchema { module: String },

    #[error("Unsupported datasource: {0}")]
    UnsupportedDatasource(String),

    #[error("Malformed snippet '{snippet}': {message}")]
    MalformedSnippet { snippet: String, message: String },

    #[error("Entity '{entity}' has no key fields")]
    MissingKey { entity: String },

    #[error("Script cannot be embedded in a template literal: {script}")]
    UnembeddableScript { script: String },

    #[error("Entities '{first}' and '{second}' both map to '{name}'")]
    NameCollision {
        first: String,
        second: String,
        name: String,
    },

    #[error("Failed to serialize config sample: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
