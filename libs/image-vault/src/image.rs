//! Image descriptors.

use serde::Serialize;
use vmvault_id::Fingerprint;
use vmvault_image_hosts::VmImageInfo;

/// A locally materialized image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VmImage {
    /// Content hash the daemon stores the image under.
    pub id: Fingerprint,
    pub stream_location: String,
    /// Human label, e.g. "18.04 LTS".
    pub original_release: String,
    /// Image build version.
    pub release_date: String,
    pub aliases: Vec<String>,
}

impl From<&VmImageInfo> for VmImage {
    fn from(info: &VmImageInfo) -> Self {
        Self {
            id: info.id.clone(),
            stream_location: info.stream_location.clone(),
            original_release: info.release_title.clone(),
            release_date: info.version.clone(),
            aliases: info.aliases.clone(),
        }
    }
}

/// Which artifacts to fetch.
///
/// The daemon manages kernels itself, so the daemon vault treats both alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchType {
    #[default]
    ImageOnly,
    ImageKernelAndInitrd,
}

/// Hook applied to an image before it is handed back.
pub type PrepareAction = dyn Fn(VmImage) -> VmImage + Send + Sync;
