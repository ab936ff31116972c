use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use grid_predictor::artifact::Artifact;
use grid_predictor::config::Config;
use grid_predictor::lookup::HttpLookupProvider;
use grid_predictor::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = Config::from_env();

    let artifact = Artifact::load(&cfg.artifact_path)?;
    // Warmup forward so a broken artifact fails here, not on the first request.
    let _ = artifact
        .predictor
        .predict_raw(&vec![0.0; artifact.predictor.in_dim()])?;
    info!(
        "loaded artifact {}; {} drivers, {} constructors, {} circuits, feature order {:?}",
        cfg.artifact_path,
        artifact.driver_options().len(),
        artifact.constructor_options().len(),
        artifact.circuit_options().len(),
        artifact.feature_names
    );
    if cfg.openweather_api_key.is_none() {
        info!("OPENWEATHER_API_KEY not set; weather enrichment disabled");
    }
    if cfg.newsapi_key.is_none() {
        info!("NEWSAPI_KEY not set; news enrichment disabled");
    }

    let state = AppState {
        artifact: Arc::new(artifact),
        lookups: Arc::new(HttpLookupProvider::new(
            cfg.openweather_api_key.clone(),
            cfg.newsapi_key.clone(),
        )),
    };
    let app = server::router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}
