//! # vmvault-image-vault
//!
//! Materializes virtual machine images through the local hypervisor daemon.
//!
//! `DaemonImageVault` resolves a query to an image, checks whether the
//! daemon already has it (or an instance created from it), and otherwise
//! starts a server-side download and drives it to completion.
//!
//! ## Modules
//!
//! - `image`: the image descriptor and fetch options
//! - `vault`: the `VmImageVault` capability and the daemon implementation
//! - `config`: environment configuration
//! - `error`: the vault error taxonomy

mod config;
mod error;
mod image;
mod vault;

pub use config::{ConfigError, VaultConfig};
pub use error::VaultError;
pub use image::{FetchType, PrepareAction, VmImage};
pub use vault::{DaemonImageVault, VmImageVault};
