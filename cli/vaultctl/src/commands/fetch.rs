//! Image fetch command.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use vmvault_daemon_client::DownloadStage;
use vmvault_image_hosts::Query;
use vmvault_image_vault::{FetchType, VaultError, VmImage, VmImageVault};

use crate::error::CliError;
use crate::output::{print_single, print_success, OutputFormat, ProgressLine};

use super::CommandContext;

pub const INTERRUPT_HELP: &str = "Ctrl-C takes effect at the next download progress update. \
Before the download starts (instance check, image lookup, download request), \
an interrupt waits for the pending daemon request, up to the request timeout \
(VMVAULT_REQUEST_TIMEOUT_MS, 30s by default).";

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Image alias or hash prefix, e.g. "bionic".
    release: String,

    /// Remote to look the alias up in (default remote if omitted).
    #[arg(long)]
    remote: Option<String>,

    /// Instance the image is for; an existing instance reuses its image.
    #[arg(long)]
    name: Option<String>,

    /// Also fetch kernel and initrd.
    #[arg(long)]
    kernel: bool,
}

impl FetchArgs {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let vault = ctx.vault()?;

        let query = Query::alias(self.name.unwrap_or_default(), self.release)
            .with_remote(self.remote.unwrap_or_default());
        let fetch_type = if self.kernel {
            FetchType::ImageKernelAndInitrd
        } else {
            FetchType::ImageOnly
        };

        // Ctrl-C is only honoured between polls; the vault then deletes the
        // daemon-side operation.
        let interrupted = Arc::new(AtomicBool::new(false));
        let handler_flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
            .context("Failed to install Ctrl-C handler")?;

        let mut progress = ProgressLine::default();
        let mut monitor = |stage: DownloadStage, percent: i32| {
            if interrupted.load(Ordering::SeqCst) {
                return false;
            }
            progress.update(stage, percent);
            true
        };

        let result = vault
            .fetch_image(fetch_type, &query, &keep, &mut monitor)
            .await;
        progress.finish();

        let image = match result {
            Ok(image) => image,
            Err(e @ VaultError::AbortedDownload { .. }) => {
                tracing::debug!(error = %e, "Fetch interrupted");
                return Err(CliError::Cancelled.into());
            }
            Err(e) => return Err(e.into()),
        };

        match ctx.format {
            OutputFormat::Table => print_success(&format!(
                "Image {} ({} {}) is ready",
                image.id.short(),
                image.original_release,
                image.release_date
            )),
            OutputFormat::Json => print_single(&image),
        }

        Ok(())
    }
}

fn keep(image: VmImage) -> VmImage {
    image
}
