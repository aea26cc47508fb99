//! Download progress reporting.
//!
//! The daemon reports image download progress as a free-form string in the
//! operation metadata, e.g. `"rootfs: 25% (1.20MB/s)"`. Only the rootfs stage
//! carries a meaningful byte-level percentage; the metadata stage always
//! reports as indeterminate.

use std::fmt;

/// Percent value passed to a monitor when no byte-level progress is known.
pub const INDETERMINATE: i32 = -1;

/// Caller-supplied progress callback.
///
/// Receives the current stage and a percentage (or [`INDETERMINATE`]) once per
/// poll. Returning `false` cancels the download.
pub type ProgressMonitor<'a> = dyn FnMut(DownloadStage, i32) -> bool + Send + 'a;

/// Sub-stage of an image download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStage {
    /// The operation has not reported any progress yet.
    Waiting,
    /// Fetching image metadata.
    Metadata,
    /// Transferring the image content.
    Rootfs,
    /// A stage this client does not know about.
    Other,
}

impl fmt::Display for DownloadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadStage::Waiting => write!(f, "waiting"),
            DownloadStage::Metadata => write!(f, "metadata"),
            DownloadStage::Rootfs => write!(f, "rootfs"),
            DownloadStage::Other => write!(f, "other"),
        }
    }
}

/// Progress of the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub stage: DownloadStage,
    /// Completion percentage, absent when the stage reports none.
    pub percent: Option<u8>,
}

impl DownloadProgress {
    /// Progress of an operation that reported nothing.
    pub const WAITING: Self = Self {
        stage: DownloadStage::Waiting,
        percent: None,
    };

    /// Parse a `download_progress` string.
    pub fn parse(raw: &str) -> Self {
        let Some((label, rest)) = raw.split_once(':') else {
            return Self {
                stage: DownloadStage::Other,
                percent: None,
            };
        };

        let stage = match label.trim() {
            "metadata" => DownloadStage::Metadata,
            "rootfs" => DownloadStage::Rootfs,
            _ => DownloadStage::Other,
        };

        let percent = match stage {
            DownloadStage::Metadata => None,
            _ => parse_percent(rest),
        };

        Self { stage, percent }
    }

    /// Percentage as handed to a monitor.
    pub fn monitor_percent(&self) -> i32 {
        self.percent.map(i32::from).unwrap_or(INDETERMINATE)
    }
}

fn parse_percent(s: &str) -> Option<u8> {
    let (number, _) = s.trim_start().split_once('%')?;
    number.trim().parse::<u8>().ok().filter(|p| *p <= 100)
}
