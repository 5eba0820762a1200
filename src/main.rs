use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use trackbridge::config;
use trackbridge::extractor::IssueUrlExtractor;
use trackbridge::linking::LinkingEngine;
use trackbridge::trello::TrelloClient;
use trackbridge::web::{self, AppState};
use trackbridge::youtrack::YouTrackClient;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let trello = TrelloClient::new(
        cfg.trello.api_key.clone(),
        cfg.trello.api_token.clone(),
        cfg.request_timeout(),
    )?;
    let youtrack = YouTrackClient::new(
        cfg.youtrack_url()?,
        cfg.youtrack.token.clone(),
        cfg.youtrack.accept_invalid_certs,
        cfg.request_timeout(),
    )?;
    let engine = LinkingEngine::new(
        Arc::new(trello),
        Arc::new(youtrack),
        Arc::new(IssueUrlExtractor),
    );

    let state = Arc::new(AppState {
        engine,
        board_id: cfg.trello.board_id.clone(),
        doing_list_name: cfg.trello.doing_list_name.clone(),
    });
    let app = web::build_router(state, Path::new(&cfg.server.static_dir));

    let addr = cfg.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(addr = %listener.local_addr()?, board = %cfg.trello.board_id, "starting web server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
