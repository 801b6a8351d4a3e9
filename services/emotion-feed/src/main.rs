// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Emotion Feed Service
//!
//! Serves the emotion feed over JSON and forwards submissions and likes to
//! the hosted backend.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file is
//! read first when present):
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `BACKEND_URL`: Hosted backend project URL (unset: in-process backend)
//! - `BACKEND_ANON_KEY`: Anonymous API key for the backend
//! - `IP_LOOKUP_URL`: IP-echo endpoint (default: https://api.ipify.org?format=json)
//! - `VIEWER_MODE`: `peer` or `ip-echo` (default: peer)
//! - `ALLOWED_ORIGINS`: Comma separated CORS origins
//! - `SUBMISSION_MAX_PER_MINUTE`: Submission budget (default: 5)
//! - `LIKE_MAX_PER_MINUTE`: Like budget per viewer (default: 20)
//! - `FEED_REFRESH_SECS`: Feed refresh interval (default: 30)
//! - `METRICS_ENABLED`: Expose `/metrics` (default: true)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use emotion_feed::{
    backend::{Backend, MemoryBackend, RestBackend},
    clock::SystemClock,
    config::{Config, LimitConfig, ViewerMode},
    handlers::{router, AppState},
    tasks::BackgroundTasks,
    viewer::{IpLookup, ViewerResolver},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_config();
    config.validate()?;
    info!(
        bind_addr = %config.bind_addr,
        backend = config.backend.url.as_deref().unwrap_or("in-process"),
        viewer_mode = ?config.viewer.mode,
        submission_max = config.limits.submission.max_requests,
        like_max = config.limits.like.max_requests,
        "Starting emotion feed"
    );

    let backend: Arc<dyn Backend> = match config.backend.url {
        Some(_) => Arc::new(RestBackend::new(&config.backend)?),
        None => {
            warn!("BACKEND_URL not set, using in-process backend; nothing will persist");
            Arc::new(MemoryBackend::new())
        }
    };

    let lookup = IpLookup::new(&config.ip_lookup)?;
    let viewer = ViewerResolver::for_mode(config.viewer.mode, &lookup).await;

    let state = Arc::new(AppState::new(
        config.clone(),
        backend,
        Arc::new(SystemClock),
        viewer,
    )?);

    // Initial load; failures are recorded in the feed and retried on schedule.
    match state.feed.refresh().await {
        Ok(posts) => info!(posts, "Feed loaded"),
        Err(e) => warn!(error = %e, "Initial feed load failed"),
    }

    let tasks = BackgroundTasks::spawn(&state);
    info!(tasks = tasks.len(), "Background tasks started");

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tasks.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    let defaults = Config::default();
    Config {
        bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        allowed_origins: std::env::var("ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|o| o.trim().to_string()).collect())
            .unwrap_or(defaults.allowed_origins),
        backend: emotion_feed::config::BackendConfig {
            url: std::env::var("BACKEND_URL").ok().filter(|v| !v.trim().is_empty()),
            anon_key: std::env::var("BACKEND_ANON_KEY").unwrap_or_default(),
            ..defaults.backend
        },
        ip_lookup: emotion_feed::config::IpLookupConfig {
            url: std::env::var("IP_LOOKUP_URL").unwrap_or(defaults.ip_lookup.url),
            ..defaults.ip_lookup
        },
        viewer: emotion_feed::config::ViewerConfig {
            mode: viewer_mode(),
        },
        limits: emotion_feed::config::LimitsConfig {
            submission: per_minute("SUBMISSION_MAX_PER_MINUTE", defaults.limits.submission),
            like: per_minute("LIKE_MAX_PER_MINUTE", defaults.limits.like),
            ..defaults.limits
        },
        feed: emotion_feed::config::FeedConfig {
            refresh_secs: std::env::var("FEED_REFRESH_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.feed.refresh_secs),
            ..defaults.feed
        },
        metrics: emotion_feed::config::MetricsConfig {
            enabled: std::env::var("METRICS_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.metrics.enabled),
            ..defaults.metrics
        },
    }
}

fn viewer_mode() -> ViewerMode {
    let Ok(raw) = std::env::var("VIEWER_MODE") else {
        return ViewerMode::Peer;
    };
    raw.parse().unwrap_or_else(|e: String| {
        warn!(error = %e, "Invalid VIEWER_MODE, using peer");
        ViewerMode::Peer
    })
}

fn per_minute(var: &str, default: LimitConfig) -> LimitConfig {
    LimitConfig {
        max_requests: std::env::var(var)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.max_requests),
        ..default
    }
}
