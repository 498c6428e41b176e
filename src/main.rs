use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use soratra::analysis::{AnalysisClient, DisabledClient, HttpAnalysisClient};
use soratra::config::Cli;
use soratra::server::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    soratra::telemetry::init()?;

    let config = cli.editor_config()?;
    let client: Arc<dyn AnalysisClient> = if config.analysis.enabled {
        tracing::info!(backend = %config.analysis.backend_url, "using analysis backend");
        Arc::new(HttpAnalysisClient::new(&config.analysis)?)
    } else {
        tracing::warn!("analysis backend disabled, results fall back to defaults");
        Arc::new(DisabledClient)
    };

    let state = Arc::new(AppState::new(config, client));
    let app = router(state);

    let listener = TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    tracing::info!("Listening on http://{}", cli.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
