//! Output formatting for CLI commands.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};
use vmvault_daemon_client::{DownloadStage, INDETERMINATE};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

/// Print data in the specified format.
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No items found.".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => println!("{}", format_json(data, "[]")),
    }
}

/// Print a single item as JSON.
pub fn print_single<T: Serialize>(data: &T) {
    println!("{}", format_json(data, "{}"));
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue().bold(), message);
}

fn format_json<T: Serialize + ?Sized>(data: &T, fallback: &str) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| fallback.to_string())
}

/// Single-line download progress on stderr.
#[derive(Debug, Default)]
pub struct ProgressLine {
    last: Option<String>,
}

impl ProgressLine {
    /// Redraw the line if the reported state changed.
    pub fn update(&mut self, stage: DownloadStage, percent: i32) {
        let line = render(stage, percent);
        if self.last.as_deref() == Some(line.as_str()) {
            return;
        }

        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\r\x1b[2K{line}");
        let _ = stderr.flush();
        self.last = Some(line);
    }

    /// End the progress line, if one was drawn.
    pub fn finish(&mut self) {
        if self.last.take().is_some() {
            eprintln!();
        }
    }
}

fn render(stage: DownloadStage, percent: i32) -> String {
    match (stage, percent) {
        (DownloadStage::Waiting, _) => "Waiting for download to start".to_string(),
        (DownloadStage::Metadata, _) => "Retrieving image metadata".to_string(),
        (stage, INDETERMINATE) => format!("Downloading ({stage})"),
        (DownloadStage::Rootfs, percent) => format!("Downloading image: {percent}%"),
        (stage, percent) => format!("Downloading ({stage}): {percent}%"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DownloadStage::Waiting, INDETERMINATE, "Waiting for download to start")]
    #[case(DownloadStage::Metadata, INDETERMINATE, "Retrieving image metadata")]
    #[case(DownloadStage::Rootfs, 25, "Downloading image: 25%")]
    #[case(DownloadStage::Rootfs, INDETERMINATE, "Downloading (rootfs)")]
    #[case(DownloadStage::Other, 40, "Downloading (other): 40%")]
    fn test_render(#[case] stage: DownloadStage, #[case] percent: i32, #[case] expected: &str) {
        assert_eq!(render(stage, percent), expected);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::parse("yaml"), OutputFormat::Table);
    }
}
