mod api;
mod middleware;
mod sessions;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use wander_providers::{FoursquareClient, FoursquareCredentials, IpdataClient};
use wander_suggest::QueryOptions;

use crate::{
    api::{build_app, AppState},
    sessions::SessionStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = wander_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let foursquare = Arc::new(
        FoursquareClient::new(
            FoursquareCredentials {
                client_id: config.foursquare_client_id.clone(),
                client_secret: config.foursquare_client_secret.clone(),
            },
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .open_now(config.open_now)
        .with_retries(config.max_retries, config.retry_backoff_base_ms),
    );
    let ipdata = Arc::new(
        IpdataClient::new(
            &config.ipdata_api_key,
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .with_retries(config.max_retries, config.retry_backoff_base_ms),
    );

    let state = AppState {
        locator: ipdata,
        search: foursquare.clone(),
        details: foursquare,
        sessions: SessionStore::new(Duration::from_secs(config.session_ttl_secs)),
        options: Arc::new(QueryOptions::from_config(&config)),
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "wander-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
