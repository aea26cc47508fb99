//! Error handling and display for the CLI.

use std::path::PathBuf;

use colored::Colorize;
use thiserror::Error;
use vmvault_image_vault::{ConfigError, VaultError};

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Image catalog not found at {}", .0.display())]
    CatalogMissing(PathBuf),

    #[error("Download cancelled")]
    Cancelled,
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(hint) = hint_for(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return match cli_err {
            CliError::CatalogMissing(_) => Some("Pass --catalog or set VMVAULT_CATALOG."),
            CliError::Cancelled => {
                Some("The unfinished download was removed from the daemon; run fetch again to retry.")
            }
        };
    }

    if err.downcast_ref::<ConfigError>().is_some() {
        return Some("Timeouts are given in milliseconds, e.g. VMVAULT_POLL_INTERVAL_MS=500.");
    }

    match err.downcast_ref::<VaultError>()? {
        VaultError::Transport { .. } => {
            Some("Check that the daemon is running and --socket points at its control socket.")
        }
        VaultError::RemoteUnknown(_) | VaultError::AliasUnknown(_) => {
            Some("Run `vaultctl images` to list the known remotes and aliases.")
        }
        VaultError::UnsupportedQueryType => Some("Only image aliases can be fetched."),
        VaultError::Host(_) => Some("Check the image catalog file for errors."),
        _ => None,
    }
}
