//! # vmvault-id
//!
//! Typed identifiers shared by the daemon client and the image vault.
//!
//! ## Design Principles
//!
//! - Identifiers handed out by the daemon are opaque; we validate only
//!   what we rely on (non-empty, no whitespace)
//! - Content hashes have a canonical lowercase hex form with strict parsing
//! - Both types roundtrip through serde as plain strings
//!
//! ## Formats
//!
//! - `OperationId`: whatever the daemon returns, usually a UUID
//!   (`0a19a412-03d0-4118-bee8-a3095f06d4da`)
//! - `Fingerprint`: sha256 hex, or a prefix of one when used as a lookup key
//!   (`e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855`)

mod error;
mod types;

pub use error::IdError;
pub use types::*;
