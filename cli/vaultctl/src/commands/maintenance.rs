//! Image maintenance commands.

use anyhow::Result;
use clap::Args;
use vmvault_image_vault::{FetchType, VmImage, VmImageVault};

use crate::output::print_info;

use super::CommandContext;

pub async fn prune(ctx: CommandContext) -> Result<()> {
    ctx.vault_without_catalog().prune_expired_images().await?;
    print_info("The daemon expires cached images on its own.");
    Ok(())
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Also update kernel and initrd.
    #[arg(long)]
    kernel: bool,
}

impl UpdateArgs {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let fetch_type = if self.kernel {
            FetchType::ImageKernelAndInitrd
        } else {
            FetchType::ImageOnly
        };

        ctx.vault_without_catalog()
            .update_images(fetch_type, &|image: VmImage| image, &mut |_, _| true)
            .await?;
        print_info("The daemon refreshes cached images on its own.");
        Ok(())
    }
}
