//! # vmvault-image-hosts
//!
//! Turns an image query ("bionic" on remote "release") into concrete image
//! metadata.
//!
//! ## Modules
//!
//! - `query`: what the caller asks for
//! - `info`: what an image host knows about an image
//! - `host`: the `ImageHost` capability implemented by every catalog source
//! - `resolver`: ordered lookup across hosts with the remote -> host map
//! - `catalog`: a host backed by a TOML catalog file

mod catalog;
mod host;
mod info;
mod query;
mod resolver;

pub use catalog::CatalogImageHost;
pub use host::{HostError, ImageHost};
pub use info::VmImageInfo;
pub use query::{Query, QueryType};
pub use resolver::{ImageResolver, ResolveError};
