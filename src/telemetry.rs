//! Log setup for the service binary.
//!
//! The filter is taken from `SORATRA_LOG`, then `RUST_LOG`, and falls back to
//! `info`.

use std::env;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. Fails if one is already installed or the
/// filter does not parse.
pub fn init() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter()?)
        .try_init()?;
    Ok(())
}

fn filter() -> anyhow::Result<EnvFilter> {
    let directives = env::var("SORATRA_LOG")
        .or_else(|_| env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    Ok(EnvFilter::try_new(directives)?)
}
