//! Instance existence check.

use anyhow::Result;
use clap::Args;
use serde_json::json;
use vmvault_image_vault::VmImageVault;

use crate::output::{print_single, OutputFormat};

use super::CommandContext;

#[derive(Debug, Args)]
pub struct ExistsArgs {
    /// Instance name.
    name: String,
}

impl ExistsArgs {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let exists = ctx.vault_without_catalog().has_record_for(&self.name).await?;

        match ctx.format {
            OutputFormat::Table => println!("{exists}"),
            OutputFormat::Json => print_single(&json!({"name": self.name, "exists": exists})),
        }

        Ok(())
    }
}
