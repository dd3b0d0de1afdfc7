use std::{net::SocketAddr, sync::Arc, time::Duration};

use coach_relay::{
    config::{AppConfig, AppMode},
    routes,
    services::openai::OpenAiClient,
    state::AppState,
};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing(config.mode);

    if config.openai_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set, /api/chat will answer 500");
    }

    let port = config.port;
    let completions = Arc::new(OpenAiClient::new(config.openai_base_url.clone()));
    let state = Arc::new(AppState::new(config, completions));

    // Forget clients that have gone quiet.
    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(limiter.window().max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            let removed = limiter.purge_expired().await;
            if removed > 0 {
                tracing::debug!(removed, "purged idle rate-limit entries");
            }
        }
    });

    let app = routes::create_router(state);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server listening on http://localhost:{port}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn init_tracing(mode: AppMode) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(mode.default_log_filter()));
    let registry = tracing_subscriber::registry().with(filter);

    match mode {
        AppMode::Development => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
        AppMode::Production => registry
            .with(tracing_subscriber::fmt::layer().compact().with_ansi(false))
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
