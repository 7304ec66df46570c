use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "torneo=info";

/// Compact lines for a terminal, JSON lines when the output is collected.
/// `RUST_LOG` overrides the default filter.
pub fn init_logging(json: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().with_target(false).json()))
        .with((!json).then(|| fmt::layer().with_target(false).compact()))
        .try_init()
        .context("install tracing subscriber")
}
