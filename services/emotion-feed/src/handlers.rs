// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the emotion feed service.

use crate::backend::Backend;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::AppError;
use crate::feed::{FeedService, FeedView};
use crate::likes::{LikeOutcome, LikeService};
use crate::limiter::RateLimiter;
use crate::metrics::Metrics;
use crate::share::{ShareRequest, ShareService};
use crate::viewer::ViewerResolver;
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::debug;

/// Content-Security-Policy attached to every response.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self'; \
    style-src 'self' 'unsafe-inline'; \
    img-src 'self' data: https:; \
    font-src 'self'; \
    connect-src 'self' https://api.ipify.org https://*.supabase.co; \
    frame-ancestors 'none'; \
    base-uri 'self'; \
    form-action 'self'";

/// Shared application state.
pub struct AppState {
    pub feed: Arc<FeedService>,
    pub likes: LikeService,
    pub share: ShareService,
    pub viewer: ViewerResolver,
    pub metrics: Metrics,
    pub config: Config,
}

impl AppState {
    /// Wire the services together over one backend and one clock.
    pub fn new(
        config: Config,
        backend: Arc<dyn Backend>,
        clock: Arc<dyn Clock>,
        viewer: ViewerResolver,
    ) -> prometheus::Result<Self> {
        let feed = Arc::new(FeedService::new(backend.clone(), config.feed.limit));
        let submission_limiter = Arc::new(RateLimiter::from_config(
            &config.limits.submission,
            clock.clone(),
        ));
        let like_limiter = Arc::new(RateLimiter::from_config(&config.limits.like, clock));

        Ok(Self {
            likes: LikeService::new(backend.clone(), feed.clone(), like_limiter),
            share: ShareService::new(backend, feed.clone(), submission_limiter),
            feed,
            viewer,
            metrics: Metrics::new()?,
            config,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Submission response.
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub status: &'static str,
    pub emotion: String,
}

/// Like response.
#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
}

impl From<LikeOutcome> for LikeResponse {
    fn from(outcome: LikeOutcome) -> Self {
        match outcome {
            LikeOutcome::Applied { liked, likes } => Self {
                applied: true,
                liked: Some(liked),
                likes: Some(likes),
            },
            _ => Self {
                applied: false,
                liked: None,
                likes: None,
            },
        }
    }
}

/// Build the router with tracing, CORS and security headers.
pub fn router(state: Arc<AppState>) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/feed", get(feed))
        .route("/api/emotions", post(share))
        .route("/api/emotions/:id/like", post(like));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(SetResponseHeaderLayer::if_not_present(
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_static(CONTENT_SECURITY_POLICY),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            )),
    )
    .with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "emotion-feed",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Recent emotions, personalized for the requesting viewer.
pub async fn feed(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Json<FeedView> {
    let viewer = state
        .viewer
        .resolve(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    Json(state.feed.view(&viewer).await)
}

/// Share an emotion.
pub async fn share(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ShareRequest>,
) -> Result<(StatusCode, Json<ShareResponse>), AppError> {
    match state.share.submit(&request).await {
        Ok(post) => {
            state.metrics.record_submission("shared");
            Ok((
                StatusCode::CREATED,
                Json(ShareResponse {
                    status: "shared",
                    emotion: post.emotion.to_string(),
                }),
            ))
        }
        Err(e) => {
            state.metrics.record_submission(e.code());
            Err(e)
        }
    }
}

/// Toggle the requesting viewer's like on a post.
///
/// Dropped requests (in flight, rate limited, bad id) answer 200 with
/// `applied: false`.
pub async fn like(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let viewer = state
        .viewer
        .resolve(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let outcome = state.likes.toggle(id, &viewer).await;
    debug!(id, viewer = %viewer, outcome = outcome.label(), "Like handled");
    state.metrics.record_like(outcome.label());
    Json(LikeResponse::from(outcome))
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
