//! Binary entrypoint: parse CLI/env overrides, load `config.toml`, wire
//! the shared [`embedfix_gateway::state::AppState`], and serve the route
//! table. Grounded on
//! `rsform-weaver/crates/weaver-index/src/server.rs::run` for the
//! bind-and-serve shape, and on that crate's `telemetry.rs` for the
//! `tracing-subscriber` + `EnvFilter` setup (trimmed to stdout-only since
//! this gateway has no log-rotation requirement).

use axum::extract::Request;
use clap::Parser;
use tower::{Layer, ServiceExt};
use tower_http::normalize_path::NormalizePathLayer;
use tracing_subscriber::EnvFilter;

use embedfix_gateway::config::{Cli, Config};
use embedfix_gateway::router::router;
use embedfix_gateway::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = cli.apply(Config::load(&cli.workdir)?);
    tracing::info!(host = %config.host, port = config.port, "starting embedfix-gateway");

    let state = AppState::build(config.clone()).await?;
    let app = router(state);
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;
    Ok(())
}
