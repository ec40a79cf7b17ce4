//! Code generation
//!
//! Generators are pure: each returns a source tree built from the entity
//! model and the datasource policy. [`write_artifact`] is the only place
//! output touches the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::PersistGenError;
use crate::syntax::SourceFile;

pub mod client;
pub mod config_file;
mod snippets;
pub mod test_init;
pub mod types;

pub use client::{
    generate_client, generate_mock_client, ClientArtifact, ClientSyntax, SkippedEntity,
    CLIENT_NAME, MOCK_CLIENT_NAME,
};
pub use config_file::{generate_config_decl, generate_config_sample, ConfigSample};
pub use test_init::{generate_test_init, split_statements};
pub use types::generate_types;

/// A generated file, ready to be written out
#[derive(Debug, Clone)]
pub enum Artifact {
    Client(SourceFile),
    Types(SourceFile),
    ConfigDecl(SourceFile),
    ConfigSample(ConfigSample),
    TestInit(SourceFile),
}

impl Artifact {
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Client(_) => "persist_client.bal",
            Artifact::Types(_) => "persist_types.bal",
            Artifact::ConfigDecl(_) => "persist_db_config.bal",
            Artifact::ConfigSample(_) => "Config.toml",
            Artifact::TestInit(_) => "persist_test_init.bal",
        }
    }

    /// File contents
    pub fn render(&self) -> Result<String, PersistGenError> {
        match self {
            Artifact::Client(source)
            | Artifact::Types(source)
            | Artifact::ConfigDecl(source)
            | Artifact::TestInit(source) => Ok(source.to_string()),
            Artifact::ConfigSample(sample) => sample.render(),
        }
    }
}

/// Write an artifact under `output_dir`, creating the directory if needed
pub fn write_artifact(output_dir: &Path, artifact: &Artifact) -> Result<PathBuf, PersistGenError> {
    fs::create_dir_all(output_dir)?;
    debug!(path = ?output_dir, "Created output directory");

    let path = output_dir.join(artifact.file_name());
    fs::write(&path, artifact.render()?)?;
    info!(path = ?path, "Wrote artifact");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::Datasource;

    #[test]
    fn test_file_names() {
        let decl = generate_config_decl(Datasource::MySql).unwrap();
        assert_eq!(Artifact::ConfigDecl(decl).file_name(), "persist_db_config.bal");

        let sample = generate_config_sample("hr", Datasource::MySql).unwrap();
        let artifact = Artifact::ConfigSample(sample.clone());
        assert_eq!(artifact.file_name(), "Config.toml");
        assert_eq!(artifact.render().unwrap(), sample.render().unwrap());
    }

    #[test]
    fn test_write_artifact() {
        let dir = std::env::temp_dir().join(format!("persistgen-test-{}", std::process::id()));
        let artifact = Artifact::TestInit(generate_test_init(&["DROP TABLE t"]).unwrap());

        let path = write_artifact(&dir, &artifact).unwrap();
        assert_eq!(path, dir.join("persist_test_init.bal"));
        assert_eq!(fs::read_to_string(&path).unwrap(), artifact.render().unwrap());

        fs::remove_dir_all(&dir).unwrap();
    }
}
