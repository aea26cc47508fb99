//! CLI commands.

mod exists;
mod fetch;
mod images;
mod maintenance;
mod remove;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vmvault_image_hosts::{CatalogImageHost, ImageHost, ImageResolver};
use vmvault_image_vault::{DaemonImageVault, VaultConfig};

use crate::error::CliError;
use crate::logging::{init_logging, LogFormat};
use crate::output::OutputFormat;

/// vaultctl - fetch and manage virtual machine images through the local
/// hypervisor daemon.
#[derive(Debug, Parser)]
#[command(name = "vaultctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Daemon control socket [env: VMVAULT_SOCKET].
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    /// Daemon project namespace [env: VMVAULT_PROJECT].
    #[arg(long, global = true)]
    project: Option<String>,

    /// Image catalog file [env: VMVAULT_CATALOG].
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Log level [env: VMVAULT_LOG_LEVEL].
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch an image, downloading it through the daemon if needed.
    #[command(after_help = fetch::INTERRUPT_HELP)]
    Fetch(fetch::FetchArgs),

    /// Remove an instance record.
    Remove(remove::RemoveArgs),

    /// Check whether an instance record exists.
    Exists(exists::ExistsArgs),

    /// Prune expired images.
    Prune,

    /// Update cached images.
    Update(maintenance::UpdateArgs),

    /// List catalog images.
    Images(images::ImagesArgs),
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let mut config = VaultConfig::from_env()?;

        if let Some(socket) = self.socket {
            config.socket_path = socket;
        }
        if let Some(project) = self.project {
            config.project = project;
        }
        if let Some(catalog) = self.catalog {
            config.catalog_path = catalog;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        init_logging(&config.log_level, self.log_format)?;

        let ctx = CommandContext {
            config,
            format: OutputFormat::parse(&self.format),
        };

        match self.command {
            Commands::Fetch(args) => args.run(ctx).await,
            Commands::Remove(args) => args.run(ctx).await,
            Commands::Exists(args) => args.run(ctx).await,
            Commands::Prune => maintenance::prune(ctx).await,
            Commands::Update(args) => args.run(ctx).await,
            Commands::Images(args) => args.run(ctx),
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: VaultConfig,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load the image catalog.
    pub fn catalog(&self) -> Result<Arc<CatalogImageHost>> {
        let path = &self.config.catalog_path;
        if !path.exists() {
            return Err(CliError::CatalogMissing(path.clone()).into());
        }

        let host = CatalogImageHost::load(path)
            .with_context(|| format!("Failed to load image catalog from {}", path.display()))?;
        Ok(Arc::new(host))
    }

    /// Vault over the configured daemon socket and catalog.
    pub fn vault(&self) -> Result<DaemonImageVault> {
        let catalog: Arc<dyn ImageHost> = self.catalog()?;
        Ok(DaemonImageVault::connect(
            ImageResolver::new(vec![catalog]),
            &self.config,
        ))
    }

    /// Vault for operations that never consult the catalog.
    pub fn vault_without_catalog(&self) -> DaemonImageVault {
        DaemonImageVault::connect(ImageResolver::new(Vec::new()), &self.config)
    }
}
