//! Instance removal command.

use anyhow::Result;
use clap::Args;
use serde_json::json;
use vmvault_image_vault::VmImageVault;

use crate::output::{print_single, print_success, OutputFormat};

use super::CommandContext;

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Instance name.
    name: String,
}

impl RemoveArgs {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        ctx.vault_without_catalog().remove(&self.name).await?;

        match ctx.format {
            OutputFormat::Table => print_success(&format!("Instance '{}' removed", self.name)),
            OutputFormat::Json => print_single(&json!({"name": self.name, "removed": true})),
        }

        Ok(())
    }
}
