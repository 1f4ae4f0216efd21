use crate::config::Config;
use crate::geo::{RecordStore, Resolver};
use crate::handlers::{find_country, health_check, readiness_check, AppState, SharedState};
use crate::middleware::logging_middleware;
use crate::rate_limiter::RateLimiter;
use axum::routing::get;
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub struct Server {
    app: Router,
    limiter: RateLimiter,
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        let limiter = RateLimiter::new(config.rate_limit);
        let app = build_router(&config, limiter.clone());

        Self {
            app,
            limiter,
            config,
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let listener =
            tokio::net::TcpListener::bind(format!("0.0.0.0:{}", self.config.port)).await?;

        tracing::info!("ip2country server starting on port {}", self.config.port);
        tracing::info!("Lookup endpoint available at /v1/find-country");
        tracing::info!("Health check available at /health");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweeper = if self.config.cleanup_interval_secs > 0 {
            let period = Duration::from_secs(self.config.cleanup_interval_secs);
            Some(tokio::spawn(sweep_stale_clients(
                self.limiter.clone(),
                period,
                shutdown_rx,
            )))
        } else {
            None
        };

        // Run server with graceful shutdown
        axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        // The listener is down; stop the sweeper before returning.
        let _ = shutdown_tx.send(true);
        if let Some(sweeper) = sweeper {
            let _ = sweeper.await;
        }

        Ok(())
    }
}

/// Build the router for the given configuration. Exposed separately from
/// [`Server`] so tests can drive the app without binding a socket.
pub fn create_app(config: Config) -> Router {
    let limiter = RateLimiter::new(config.rate_limit);
    build_router(&config, limiter)
}

fn build_router(config: &Config, limiter: RateLimiter) -> Router {
    let state: SharedState = Arc::new(AppState {
        limiter,
        resolver: Resolver::new(RecordStore::new(config.ip2country_db.clone())),
    });

    Router::new()
        .route("/v1/find-country", get(find_country))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

/// Periodically drops rate-limit windows that have sat idle for longer
/// than `period`, until the shutdown flag flips.
async fn sweep_stale_clients(
    limiter: RateLimiter,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = limiter.prune_stale(period);
                if removed > 0 {
                    tracing::debug!("pruned {} idle client windows", removed);
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
