use clap::Parser; // for cli
use contact_gateway::{
    config::Args,
    models::QueuedSubmission,
    observability::init_tracing,
    rate_limit::RateLimiter,
    routes::create_router,
    state::AppState,
    sweeper::spawn_sweeper,
    worker::delivery_worker,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

// this is main async function with tokio
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // parse cli arguments
    let args = Args::parse();
    init_tracing(args.log_format);

    let rate_config = args.rate_limit_config()?;
    let rate_limiter = RateLimiter::new(rate_config);
    let (submit_tx, submit_rx) = mpsc::channel::<QueuedSubmission>(100);

    let state = Arc::new(AppState {
        rate_limiter: rate_limiter.clone(),
        submit_tx,
        trust_forwarded_for: args.trust_forwarded_for,
    });

    // spawn the background tasks
    let worker = tokio::spawn(delivery_worker(
        submit_rx,
        reqwest::Client::new(),
        args.webhook_url.clone(),
    ));
    let sweeper = spawn_sweeper(rate_limiter, rate_config.sweep_interval());

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Contact gateway running on http://localhost:{}", args.port);
    tracing::info!(
        "Rate limit: {} requests per {} seconds (sweep every {} seconds)",
        rate_config.max_requests(),
        rate_config.window().as_secs(),
        rate_config.sweep_interval().as_secs()
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    // router (and with it the last submit_tx) is gone, so the worker drains and exits
    sweeper.shutdown().await?;
    worker.await?;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
