//! Log subscriber setup.

use anyhow::Result;
use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Install the global subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let env = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    // stdout is reserved for command output
    let base = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env)
            .with(base.json())
            .try_init()?,
        LogFormat::Compact => tracing_subscriber::registry()
            .with(env)
            .with(base.compact())
            .try_init()?,
    }

    Ok(())
}
