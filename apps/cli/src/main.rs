//! tableau-send entry point.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tableau_send_protocol::OverwritePolicy;

#[derive(Parser)]
#[command(name = "tableau-send", version)]
#[command(about = "Publish Tableau extracts to Tableau Server", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a .hyper or .tde extract as a datasource
    Publish {
        file: PathBuf,

        /// Datasource name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,

        /// Target project path or unique name
        #[arg(long, conflicts_with = "project_id")]
        project: Option<String>,

        /// Target project id
        #[arg(long)]
        project_id: Option<String>,

        /// abort, overwrite or append
        #[arg(long)]
        overwrite: Option<OverwritePolicy>,
    },
    /// Print the site's project hierarchy
    Projects,
    /// List the site's datasources
    Datasources,
    /// Write a configuration file with default values
    InitConfig {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::config_path);

    if let Commands::InitConfig { force } = cli.command {
        return commands::init_config(&config_path, force);
    }

    let mut config = config::Config::load(&config_path)?;
    tracing::debug!(path = %config_path.display(), host = %config.host, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Publish {
            file,
            name,
            project,
            project_id,
            overwrite,
        } => {
            if project_id.is_some() {
                config.project_id = project_id;
            } else if project.is_some() {
                config.project_id = None;
                config.project = project;
            }
            if let Some(policy) = overwrite {
                config.overwrite = policy;
            }
            if name.is_some() {
                config.datasource_name = name;
            }
            rt.block_on(commands::publish(&config, &file))
        }
        Commands::Projects => rt.block_on(commands::projects(&config)),
        Commands::Datasources => rt.block_on(commands::datasources(&config)),
        Commands::InitConfig { .. } => Ok(()),
    }
}
