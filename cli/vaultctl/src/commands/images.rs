//! Catalog listing command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use vmvault_image_hosts::{ImageHost, VmImageInfo};
use vmvault_image_vault::VaultError;

use crate::output::print_output;

use super::CommandContext;

#[derive(Debug, Args)]
pub struct ImagesArgs {
    /// Only list images of this remote.
    #[arg(long)]
    remote: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct ImageRow {
    #[tabled(rename = "Remote")]
    remote: String,

    #[tabled(rename = "ID")]
    id: String,

    #[tabled(rename = "Aliases")]
    aliases: String,

    #[tabled(rename = "Release")]
    release_title: String,

    #[tabled(rename = "Version")]
    version: String,

    #[tabled(rename = "Supported")]
    supported: bool,
}

impl ImageRow {
    fn new(remote: &str, info: &VmImageInfo) -> Self {
        Self {
            remote: remote.to_string(),
            id: info.id.short().to_string(),
            aliases: info.aliases.join(","),
            release_title: info.release_title.clone(),
            version: info.version.clone(),
            supported: info.supported,
        }
    }
}

impl ImagesArgs {
    pub fn run(self, ctx: CommandContext) -> Result<()> {
        let catalog = ctx.catalog()?;

        if let Some(remote) = self.remote.as_deref() {
            if !catalog.supported_remotes().iter().any(|r| r == remote) {
                return Err(VaultError::RemoteUnknown(remote.to_string()).into());
            }
        }

        let rows: Vec<ImageRow> = catalog
            .images(self.remote.as_deref())
            .map(|(remote, info)| ImageRow::new(remote, info))
            .collect();

        print_output(&rows, ctx.format);
        Ok(())
    }
}
