//! # persistgen
//!
//! Generate persistence client sources from an entity model
//!
//! This crate provides a CLI tool and library that build the client, data
//! types, database configuration and test wiring for a persistence module as
//! structural source trees, rendered to text only at the edge.

pub mod codegen;
pub mod config;
pub mod datasource;
pub mod error;
pub mod schema;
pub mod syntax;

pub mod prelude {
    pub use crate::codegen::{
        generate_client, generate_config_decl, generate_config_sample, generate_mock_client,
        generate_test_init, generate_types, Artifact, ClientArtifact, SkippedEntity,
    };
    pub use crate::config::GenConfig;
    pub use crate::datasource::{Datasource, DatasourcePolicy};
    pub use crate::error::PersistGenError;
    pub use crate::schema::{
        Cardinality, Entity, EntityField, EnumType, FieldType, ForeignKey, Module, Relation,
    };
}
