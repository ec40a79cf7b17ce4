use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::{fs, path::PathBuf};
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use persistgen::codegen::{
    generate_config_decl, generate_config_sample, generate_test_init, split_statements,
    write_artifact, Artifact,
};
use persistgen::config::GenConfig;
use persistgen::datasource::Datasource;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDatasource {
    Mysql,
    Mssql,
    Postgresql,
    H2,
}

impl From<CliDatasource> for Datasource {
    fn from(datasource: CliDatasource) -> Self {
        match datasource {
            CliDatasource::Mysql => Datasource::MySql,
            CliDatasource::Mssql => Datasource::MsSql,
            CliDatasource::Postgresql => Datasource::PostgreSql,
            CliDatasource::H2 => Datasource::H2,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "persistgen")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output directory (overrides PERSIST_OUTPUT_DIR)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Path to .env file for generator defaults
    #[arg(long, default_value = "./.env", global = true)]
    env_file: PathBuf,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the configurable declarations for a datasource
    Config {
        /// Target datasource (overrides PERSIST_DATASOURCE)
        #[arg(long, value_enum)]
        datasource: Option<CliDatasource>,
    },
    /// Write a sample Config.toml with default connection values
    ConfigSample {
        /// Target datasource (overrides PERSIST_DATASOURCE)
        #[arg(long, value_enum)]
        datasource: Option<CliDatasource>,

        /// Module name used as the table header (overrides PERSIST_MODULE)
        #[arg(long)]
        module: Option<String>,
    },
    /// Write test database wiring from a SQL script
    TestInit {
        /// SQL script, statements separated by `;`
        #[arg(long)]
        script: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        error!(error = ?e, "Fatal error");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("persistgen v{}", env!("CARGO_PKG_VERSION"));

    let mut config =
        GenConfig::load(&cli.env_file).context("Failed to load generator configuration")?;
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    debug!(config = ?config, "Loaded configuration");

    let artifact = match cli.command {
        Command::Config { datasource } => {
            let datasource = datasource.map(Datasource::from).unwrap_or(config.datasource);
            info!(datasource = %datasource, "Generating database configuration");
            Artifact::ConfigDecl(generate_config_decl(datasource)?)
        }
        Command::ConfigSample { datasource, module } => {
            let datasource = datasource.map(Datasource::from).unwrap_or(config.datasource);
            if module.is_some() {
                config.module = module;
            }
            let module = config.require_module()?;
            info!(datasource = %datasource, module = ?module, "Generating config sample");
            Artifact::ConfigSample(generate_config_sample(module, datasource)?)
        }
        Command::TestInit { script } => {
            let text = fs::read_to_string(&script)
                .with_context(|| format!("Failed to read script {}", script.display()))?;
            let statements = split_statements(&text);
            info!(script = ?script, statements = statements.len(), "Generating test init");
            Artifact::TestInit(generate_test_init(&statements)?)
        }
    };

    let path = write_artifact(&config.output_dir, &artifact).with_context(|| {
        format!(
            "Failed to write {} to {}",
            artifact.file_name(),
            config.output_dir.display()
        )
    })?;
    info!(path = ?path, "Generation complete");

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}
