use anyhow::Context;
use tracing::info;

use manapalm_core::bootstrap::bootstrap_from_env;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("manapalm failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let boot = bootstrap_from_env()?;
    let config = &boot.config;
    info!(
        host = %config.host,
        port = config.port,
        proxy = %config.proxy.as_deref().unwrap_or(""),
        allowed_origins = ?config.allowed_origins,
        max_retries = config.max_retries,
        openai_key = config.openai.api_key.is_some(),
        gemini_key = config.google.api_key.is_some(),
        openrouter_key = config.openrouter.api_key.is_some(),
        identity = config.identity.is_some(),
        "config loaded"
    );

    let bind = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(addr = %bind, "listening");

    axum::serve(listener, boot.core.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("manapalm=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        // No signal handler: run until the process is killed.
        Err(_) => std::future::pending::<()>().await,
    }
}
