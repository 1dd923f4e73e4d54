use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers::{self, AppState};

/// A lead form is a handful of short fields.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Builds the HTTP router.
///
/// The lead and docs routes are rate limited per client IP (taken from
/// `X-Forwarded-For`/`X-Real-IP`/`Forwarded`, falling back to the peer
/// address). `/health` bypasses the limiter.
pub fn build_app(state: Arc<AppState>) -> anyhow::Result<Router> {
    // One token replenished every 2s per IP, burst of 5
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(5)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?,
    );

    let protected_routes = Router::new()
        .route("/docs", get(handlers::serve_swagger_ui))
        .route("/api-docs/openapi.yml", get(handlers::serve_openapi_spec))
        .route("/api/v1/leads", post(handlers::submit_lead))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    Ok(Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
