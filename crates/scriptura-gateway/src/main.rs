use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use scriptura_agent::OpenAiProvider;
use scriptura_core::ScripturaConfig;
use scriptura_messenger::GraphApi;

mod app;
mod http;

/// Messenger webhook relay answering Bible questions in French and Malagasy.
#[derive(Parser, Debug)]
#[command(name = "scriptura-gateway", version)]
struct Cli {
    /// Path to the TOML config file (defaults to ./scriptura.toml).
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "scriptura_gateway=info,scriptura_messenger=info,scriptura_agent=info,\
                 scriptura_store=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > ./scriptura.toml, then SCRIPTURA_* and deployment env vars
    let config = ScripturaConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        ScripturaConfig::default()
    });

    if config.backend.api_key.is_empty() {
        warn!("No backend API key configured, every question will get the apology reply");
    }
    if config.messenger.page_access_token.is_empty() {
        warn!("No page access token configured, replies cannot be delivered");
    }
    if config.messenger.app_secret.is_none() {
        warn!("No app secret configured, webhook signatures are not verified");
    }

    let provider = OpenAiProvider::new(
        config.backend.api_key.clone(),
        Some(config.backend.base_url.clone()),
        Duration::from_millis(config.backend.attempt_timeout_ms),
    )?;
    info!(
        base_url = %config.backend.base_url,
        model = %config.backend.model,
        budget_ms = config.backend.budget_ms,
        "completion backend configured"
    );

    let api = GraphApi::new(&config.messenger)?;

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let state = Arc::new(app::AppState::new(config, Arc::new(provider), Arc::new(api)));
    let router = app::build_router(Arc::clone(&state));

    // spawn the admission/cache sweeper in background
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let sweeper = state.sweeper();
    let sweeper_task = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Scriptura gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // signal sweeper to stop
    let _ = shutdown_tx.send(true);
    let _ = sweeper_task.await;
    info!("Scriptura gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
